use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use orbit_core::authz::{can_perform, Action, Resource};
use orbit_core::validate::{validate_department, CreateDepartmentRequest};

use super::error::ApiResult;
use super::extract::{json_body, Authenticated, ClientAddr};
use crate::app_state::AppState;
use crate::policy::{EndpointGroup, Identity};

pub async fn create_department(
    State(state): State<AppState>,
    auth: Authenticated,
    ClientAddr(ip): ClientAddr,
    body: std::result::Result<Json<CreateDepartmentRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    state.throttle(
        EndpointGroup::CreateDepartment,
        Identity::resolve(Some(auth.user.id), ip),
    )?;
    let action = Action::CreateDepartment;
    state.enforce(action, can_perform(&auth.principal(), action, &Resource::Department))?;

    let name = validate_department(json_body(body)?)?;
    let dept = state.identities().create_department(&name).await?;

    tracing::info!(department = %dept.id, name = %dept.name, "department created");
    Ok(Json(json!({
        "message": "Department created successfully!",
        "departmentId": dept.id,
    })))
}
