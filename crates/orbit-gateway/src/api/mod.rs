//! REST handlers.
//!
//! Each handler authenticates (when the route needs it), counts the request
//! against its endpoint group, asks the authorization evaluator, validates
//! input, and only then touches the stores.

pub mod accounts;
pub mod departments;
pub mod documents;
pub mod error;
pub mod extract;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use orbit_core::error::ClientCode;

use crate::app_state::AppState;

pub use error::{ApiError, ApiResult};

/// Count error responses by client code.
pub async fn track_errors(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let resp = next.run(req).await;
    if let Some(code) = resp.extensions().get::<ClientCode>() {
        state.metrics().api_errors.inc(&[("code", code.as_str())]);
    }
    resp
}
