//! HTTP mapping for [`OrbitError`].
//!
//! Every error body is `{"error": <message>, "code": <CODE>}`. Internal
//! details are logged server-side and replaced by a generic message.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use orbit_core::error::{ClientCode, OrbitError};

use crate::store::StoreError;

#[derive(Debug)]
pub struct ApiError(pub OrbitError);

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<OrbitError> for ApiError {
    fn from(err: OrbitError) -> Self {
        ApiError(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError(err.into())
    }
}

pub fn status_for(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::ValidationError => StatusCode::BAD_REQUEST,
        ClientCode::NotFound => StatusCode::NOT_FOUND,
        ClientCode::Conflict => StatusCode::CONFLICT,
        ClientCode::AuthFailed => StatusCode::UNAUTHORIZED,
        ClientCode::Forbidden => StatusCode::FORBIDDEN,
        ClientCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ClientCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let message = match &self.0 {
            OrbitError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "code": code.as_str(),
        }));
        let mut resp = (status_for(code), body).into_response();

        if let OrbitError::RateLimited { retry_after_secs } = self.0 {
            resp.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs.max(1)));
        }
        // read back by the error-counting middleware
        resp.extensions_mut().insert(code);
        resp
    }
}
