//! Accounts: organization/user registration, login, tokens and profile.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use orbit_core::authz::{can_perform, Action, Resource};
use orbit_core::error::{OrbitError, Result};
use orbit_core::model::{NewUser, Role, User};
use orbit_core::validate::{
    validate_organization, validate_registration, CreateOrganizationRequest, Registration,
    RegisterUserRequest,
};

use super::error::ApiResult;
use super::extract::{json_body, Authenticated, ClientAddr};
use crate::app_state::AppState;
use crate::auth::{password, TokenType};
use crate::policy::{EndpointGroup, Identity};
use crate::store::StoreError;

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

pub async fn create_organization(
    State(state): State<AppState>,
    auth: Authenticated,
    ClientAddr(ip): ClientAddr,
    body: std::result::Result<Json<CreateOrganizationRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    state.throttle(
        EndpointGroup::CreateOrganization,
        Identity::resolve(Some(auth.user.id), ip),
    )?;
    let action = Action::CreateOrganization;
    state.enforce(action, can_perform(&auth.principal(), action, &Resource::Organization))?;

    let reg = validate_organization(json_body(body)?)?;
    let user = create_account(&state, reg).await?;

    tracing::info!(admin = %auth.user.id, organization = %user.id, "organization created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Organization created successfully!",
            "organizationId": user.id,
        })),
    ))
}

pub async fn register_user(
    State(state): State<AppState>,
    auth: Authenticated,
    ClientAddr(ip): ClientAddr,
    body: std::result::Result<Json<RegisterUserRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    state.throttle(
        EndpointGroup::RegisterUser,
        Identity::resolve(Some(auth.user.id), ip),
    )?;
    let action = Action::RegisterUser;
    state.enforce(action, can_perform(&auth.principal(), action, &Resource::User))?;

    let reg = validate_registration(json_body(body)?)?;
    let role = reg.role;
    let user = create_account(&state, reg).await?;

    tracing::info!(admin = %auth.user.id, user = %user.id, %role, "user registered");
    Ok(Json(json!({
        "message": format!("{role} registered successfully!"),
        "userId": user.id,
    })))
}

/// Resolve references, hash the password and insert the user. The email
/// uniqueness conflict comes from the store.
async fn create_account(state: &AppState, reg: Registration) -> Result<User> {
    if let Some(dept) = reg.department {
        state.identities().get_department(dept).await?;
    }
    if let Some(org) = reg.organization {
        let found = match state.identities().get_user(org).await {
            Ok(user) => user.role == Role::Organization,
            Err(StoreError::NotFound(_)) => false,
            Err(e) => return Err(e.into()),
        };
        if !found {
            return Err(OrbitError::not_found("Organization not found"));
        }
    }

    let password_hash = password::hash_password_blocking(reg.password).await?;
    let user = state
        .identities()
        .create_user(NewUser {
            name: reg.name,
            email: reg.email,
            password_hash,
            role: reg.role,
            department: reg.department,
            organization: reg.organization,
        })
        .await?;
    Ok(user)
}

/// `POST /login/` and `POST /api/token/`.
pub async fn login(
    State(state): State<AppState>,
    ClientAddr(ip): ClientAddr,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    state.throttle(EndpointGroup::Login, Identity::resolve(None, ip))?;
    let req = json_body(body)?;

    let invalid = || OrbitError::AuthFailed("Invalid email or password".into());
    let (Some(email), Some(pw)) = (req.email, req.password) else {
        return Err(invalid().into());
    };

    let Some(user) = state.identities().find_by_email(&email).await? else {
        tracing::info!(%email, "login failed: unknown email");
        return Err(invalid().into());
    };
    if !password::verify_password_blocking(user.password_hash.clone(), pw).await {
        tracing::info!(user_id = %user.id, "login failed: bad password");
        return Err(invalid().into());
    }

    let pair = state.tokens().issue_pair(&user)?;
    tracing::info!(user_id = %user.id, role = %user.role, "login succeeded");
    Ok(Json(pair))
}

/// `POST /api/token/refresh/`: trade a refresh token for a new access token.
pub async fn refresh_token(
    State(state): State<AppState>,
    ClientAddr(ip): ClientAddr,
    body: std::result::Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    state.throttle(EndpointGroup::TokenRefresh, Identity::resolve(None, ip))?;
    let req = json_body(body)?;

    let token = req
        .refresh
        .filter(|t| !t.is_empty())
        .ok_or_else(|| OrbitError::validation("refresh is required"))?;
    let claims = state.tokens().verify(&token, TokenType::Refresh)?;

    let user = match state.identities().get_user(claims.user_id()?).await {
        Ok(user) => user,
        Err(StoreError::NotFound(_)) => {
            return Err(OrbitError::AuthFailed("User not found".into()).into());
        }
        Err(e) => return Err(e.into()),
    };

    let access = state.tokens().issue(user.id, user.role, TokenType::Access)?;
    Ok(Json(json!({ "access": access })))
}

pub async fn profile(
    State(state): State<AppState>,
    auth: Authenticated,
    ClientAddr(ip): ClientAddr,
) -> ApiResult<impl IntoResponse> {
    state.throttle(EndpointGroup::Profile, Identity::resolve(Some(auth.user.id), ip))?;
    let action = Action::ViewProfile;
    state.enforce(
        action,
        can_perform(&auth.principal(), action, &Resource::Profile(auth.user.id)),
    )?;

    let user = &auth.user;
    let department = match user.department {
        Some(id) => match state.identities().get_department(id).await {
            Ok(d) => Some(d.name),
            Err(StoreError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        },
        None => None,
    };

    Ok(Json(json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "role": user.role,
        "department": department,
        "organizationId": user.organization,
    })))
}
