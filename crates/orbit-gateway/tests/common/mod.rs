#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use orbit_gateway::app_state::{AppState, Backends};
use orbit_gateway::config::{self, GatewayConfig};
use orbit_gateway::policy::{EndpointGroup, InMemoryCounterStore, ManualClock, RateLimiter};
use orbit_gateway::router::build_router;
use orbit_gateway::store::{InMemoryFileStore, InMemoryStore};

pub const ADMIN_EMAIL: &str = "admin@orbit.test";
pub const ADMIN_PASSWORD: &str = "admin-pass";

const BASE_CONFIG: &str = r#"
version: 1
auth:
  jwt_secret: "orbit-test-secret-0123456789"
bootstrap_admin:
  name: "root"
  email: "admin@orbit.test"
  password: "admin-pass"
"#;

/// Config with every group unlimited except the listed overrides.
pub fn config(limits: &[(&str, &str)]) -> GatewayConfig {
    let mut cfg = config::load_from_str(BASE_CONFIG).expect("base config");
    for group in EndpointGroup::ALL {
        cfg.rate_limits.insert(group.as_str().to_string(), "off".to_string());
    }
    for (group, rate) in limits {
        cfg.rate_limits.insert(group.to_string(), rate.to_string());
    }
    cfg.validate().expect("valid config");
    cfg
}

pub struct TestApp {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub store: Arc<InMemoryStore>,
    pub files: Arc<InMemoryFileStore>,
    router: Router,
}

impl TestApp {
    pub async fn new(limits: &[(&str, &str)]) -> Self {
        Self::with_config(config(limits)).await
    }

    pub async fn with_config(cfg: GatewayConfig) -> Self {
        let clock = Arc::new(ManualClock::new());
        let store = Arc::new(InMemoryStore::new());
        let files = Arc::new(InMemoryFileStore::new());
        let backends = Backends {
            identities: store.clone(),
            documents: store.clone(),
            files: files.clone(),
            limiter: RateLimiter::new(Arc::new(InMemoryCounterStore::new()), clock.clone()),
        };

        let state = AppState::with_backends(cfg, backends).expect("state");
        state.seed_bootstrap_admin().await.expect("seed admin");
        let router = build_router(state.clone());
        Self {
            state,
            clock,
            store,
            files,
            router,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Reply {
        let resp = self.router.clone().oneshot(req).await.expect("response");
        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        Reply {
            status,
            json,
            text: String::from_utf8_lossy(&bytes).into_owned(),
            retry_after,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let reply = self
            .send(json_request(
                "POST",
                "/login/",
                None,
                serde_json::json!({ "email": email, "password": password }),
            ))
            .await;
        assert_eq!(reply.status, StatusCode::OK, "login {email}: {}", reply.text);
        reply.json["access"].as_str().expect("access").to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: serde_json::Value) -> Reply {
        self.send(json_request("POST", uri, Some(token), body)).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> Reply {
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .expect("request");
        self.send(req).await
    }

    pub async fn create_department(&self, admin: &str, name: &str) -> u64 {
        let body = serde_json::json!({ "name": name });
        let reply = self.post("/create-department/", admin, body).await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.text);
        reply.json["departmentId"].as_u64().expect("departmentId")
    }

    pub async fn create_organization(
        &self,
        admin: &str,
        name: &str,
        email: &str,
        dept: u64,
    ) -> u64 {
        let reply = self
            .post(
                "/create-organization/",
                admin,
                serde_json::json!({
                    "name": name, "email": email, "password": "org-pass", "departmentId": dept
                }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.text);
        reply.json["organizationId"].as_u64().expect("organizationId")
    }

    pub async fn register(&self, admin: &str, body: serde_json::Value) -> u64 {
        let reply = self.post("/register/", admin, body).await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.text);
        reply.json["userId"].as_u64().expect("userId")
    }

    pub async fn upload(
        &self,
        token: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &[u8])>,
    ) -> Reply {
        self.send(multipart_request("/upload-document/", token, fields, file))
            .await
    }
}

#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub json: serde_json::Value,
    pub text: String,
    pub retry_after: Option<String>,
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

const BOUNDARY: &str = "orbit-test-boundary";

pub fn multipart_request(
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .expect("request")
}
