//! Axum router wiring.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::api::{self, accounts, departments, documents};
use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.cfg().server.max_upload_bytes;

    Router::new()
        .route("/create-organization/", post(accounts::create_organization))
        .route("/register/", post(accounts::register_user))
        .route("/login/", post(accounts::login))
        .route("/profile/", get(accounts::profile))
        .route("/create-department/", post(departments::create_department))
        .route(
            "/upload-document/",
            post(documents::upload_document).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/documents/", get(documents::list_documents))
        .route("/documents/:id/", get(documents::get_document))
        .route("/documents/:id/file/", get(documents::download_document))
        .route("/api/token/", post(accounts::login))
        .route("/api/token/refresh/", post(accounts::refresh_token))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .layer(middleware::from_fn_with_state(state.clone(), api::track_errors))
        .with_state(state)
}
