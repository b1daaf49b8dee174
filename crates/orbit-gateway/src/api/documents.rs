//! Document upload and role-scoped reads.

use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde_json::json;

use orbit_core::authz::{can_perform, Action, Resource};
use orbit_core::error::{OrbitError, Result};
use orbit_core::model::{Document, DocumentId, NewDocument, Principal, Role};
use orbit_core::validate::{validate_upload, UploadForm};

use super::error::ApiResult;
use super::extract::{Authenticated, ClientAddr};
use crate::app_state::AppState;
use crate::policy::{EndpointGroup, Identity};
use crate::store::StoreError;

/// `POST /upload-document/` (multipart: `title`, `file`, `adviser_id`,
/// `department_id`).
pub async fn upload_document(
    State(state): State<AppState>,
    auth: Authenticated,
    ClientAddr(ip): ClientAddr,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    state.throttle(
        EndpointGroup::UploadDocument,
        Identity::resolve(Some(auth.user.id), ip),
    )?;
    let action = Action::UploadDocument;
    state.enforce(action, can_perform(&auth.principal(), action, &Resource::Document(None)))?;

    let multipart = multipart.map_err(|e| OrbitError::validation(e.body_text()))?;
    let (form, body) = read_upload_form(multipart).await?;
    let upload = validate_upload(form)?;
    let body = body.ok_or_else(|| OrbitError::validation("All fields are required"))?;

    let adviser_ok = match state.identities().get_user(upload.adviser).await {
        Ok(user) => user.role == Role::Adviser,
        Err(StoreError::NotFound(_)) => false,
        Err(e) => return Err(e.into()),
    };
    if !adviser_ok {
        return Err(OrbitError::not_found("Adviser not found").into());
    }
    state.identities().get_department(upload.department).await?;

    let path = state.files().put(&upload.file_name, body).await?;
    let doc = state
        .documents()
        .create_document(NewDocument {
            title: upload.title,
            file: path,
            uploaded_by: auth.user.id,
            adviser: upload.adviser,
            department: upload.department,
        })
        .await?;

    tracing::info!(
        document = %doc.id,
        uploaded_by = %doc.uploaded_by,
        adviser = %doc.adviser,
        department = %doc.department,
        "document uploaded"
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Document uploaded successfully!",
            "documentId": doc.id,
        })),
    ))
}

async fn read_upload_form(mut multipart: Multipart) -> Result<(UploadForm, Option<Bytes>)> {
    let mut form = UploadForm::default();
    let mut body = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                form.file_name = field.file_name().map(str::to_string);
                body = Some(field.bytes().await.map_err(multipart_error)?);
            }
            "title" | "adviser_id" | "department_id" => {
                let text = field.text().await.map_err(multipart_error)?;
                match name.as_str() {
                    "title" => form.title = Some(text),
                    "adviser_id" => form.adviser_id = Some(text),
                    _ => form.department_id = Some(text),
                }
            }
            // unknown parts are ignored
            _ => {}
        }
    }
    Ok((form, body))
}

/// Body-limit failures surface as 413, everything else as a bad request.
fn multipart_error(e: MultipartError) -> OrbitError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        OrbitError::PayloadTooLarge(e.body_text())
    } else {
        OrbitError::validation(e.body_text())
    }
}

/// `GET /documents/`: everything the caller's role lets them see.
pub async fn list_documents(
    State(state): State<AppState>,
    auth: Authenticated,
    ClientAddr(ip): ClientAddr,
) -> ApiResult<impl IntoResponse> {
    state.throttle(
        EndpointGroup::ListDocuments,
        Identity::resolve(Some(auth.user.id), ip),
    )?;
    let principal = auth.principal();
    let action = Action::ListDocuments;
    let filter = state.document_filter(action, &principal)?;
    state.enforce(action, can_perform(&principal, action, &Resource::DocumentCollection))?;

    let docs = state.documents().list_documents(&filter).await?;
    tracing::debug!(user_id = %principal.id, ?filter, count = docs.len(), "documents listed");
    Ok(Json(docs))
}

/// `GET /documents/{id}/`. Invisible documents read as absent.
pub async fn get_document(
    State(state): State<AppState>,
    auth: Authenticated,
    ClientAddr(ip): ClientAddr,
    Path(id): Path<u64>,
) -> ApiResult<impl IntoResponse> {
    state.throttle(
        EndpointGroup::ViewDocument,
        Identity::resolve(Some(auth.user.id), ip),
    )?;
    let doc = visible_document(&state, &auth.principal(), DocumentId(id)).await?;
    Ok(Json(doc))
}

/// `GET /documents/{id}/file/`: the stored upload, same visibility as the
/// record.
pub async fn download_document(
    State(state): State<AppState>,
    auth: Authenticated,
    ClientAddr(ip): ClientAddr,
    Path(id): Path<u64>,
) -> ApiResult<Response> {
    state.throttle(
        EndpointGroup::ViewDocument,
        Identity::resolve(Some(auth.user.id), ip),
    )?;
    let doc = visible_document(&state, &auth.principal(), DocumentId(id)).await?;
    let data = state.files().get(&doc.file).await?;

    let mut resp = (
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"))],
        data,
    )
        .into_response();
    let name = doc.file.rsplit('/').next().unwrap_or_default().replace('"', "_");
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{name}\"")) {
        resp.headers_mut().insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(resp)
}

/// Load a document the principal may read. A misconfigured principal is
/// forbidden; a document outside the filter reads as not found.
async fn visible_document(
    state: &AppState,
    principal: &Principal,
    id: DocumentId,
) -> Result<Document> {
    let action = Action::ViewDocument;
    let filter = state.document_filter(action, principal)?;
    let doc = state.documents().get_document(id).await?;
    if !filter.matches(&doc) {
        tracing::debug!(user_id = %principal.id, document = %id, "document outside visibility");
        return Err(OrbitError::not_found("Document not found"));
    }
    state.enforce(action, can_perform(principal, action, &Resource::Document(Some(&doc))))?;
    Ok(doc)
}
