#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use common::{json_request, TestApp};
use orbit_core::model::{DepartmentId, NewDocument, NewUser, Role, UserId};
use orbit_gateway::auth::password::hash_password;
use orbit_gateway::store::{DocumentStore, FileStore, IdentityStore};

fn error_of(reply: &common::Reply) -> (&str, &str) {
    (
        reply.json["error"].as_str().unwrap_or_default(),
        reply.json["code"].as_str().unwrap_or_default(),
    )
}

#[tokio::test]
async fn admin_sets_up_departments_and_organizations() {
    let app = TestApp::new(&[]).await;

    let anon = app
        .send(json_request("POST", "/create-department/", None, json!({ "name": "CS" })))
        .await;
    assert_eq!(anon.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        error_of(&anon),
        ("Authentication credentials were not provided", "AUTH_FAILED")
    );

    let admin = app.admin_token().await;
    assert_eq!(app.create_department(&admin, "CS").await, 1);

    let dup = app
        .post("/create-department/", &admin, json!({ "name": "CS" }))
        .await;
    assert_eq!(dup.status, StatusCode::CONFLICT);
    assert_eq!(error_of(&dup), ("Department already exists", "CONFLICT"));

    let blank = app
        .post("/create-department/", &admin, json!({ "name": "" }))
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_of(&blank), ("Department name is required", "VALIDATION_ERROR"));

    let no_dept = app
        .post(
            "/create-organization/",
            &admin,
            json!({
                "name": "Chess", "email": "chess@orbit.test", "password": "x", "departmentId": 99
            }),
        )
        .await;
    assert_eq!(no_dept.status, StatusCode::NOT_FOUND);
    assert_eq!(error_of(&no_dept), ("Department not found", "NOT_FOUND"));

    let missing = app
        .post("/create-organization/", &admin, json!({ "name": "Chess" }))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_of(&missing).0,
        "Organization name, email, password, and department are required"
    );

    let org = app
        .create_organization(&admin, "Chess", "chess@orbit.test", 1)
        .await;
    assert_eq!(org, 2);

    let taken = app
        .post(
            "/create-organization/",
            &admin,
            json!({
                "name": "Chess 2", "email": "chess@orbit.test", "password": "y", "departmentId": 1
            }),
        )
        .await;
    assert_eq!(taken.status, StatusCode::CONFLICT);
    assert_eq!(error_of(&taken), ("Email already exists", "CONFLICT"));

    let admin_with_dept = app
        .post(
            "/register/",
            &admin,
            json!({
                "name": "a", "email": "a@orbit.test", "password": "p",
                "role": "admin", "department": 1
            }),
        )
        .await;
    assert_eq!(admin_with_dept.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_of(&admin_with_dept).0, "Admins should not have a department");

    let orphan_adviser = app
        .post(
            "/register/",
            &admin,
            json!({
                "name": "b", "email": "b@orbit.test", "password": "p",
                "role": "adviser", "department": 1
            }),
        )
        .await;
    assert_eq!(orphan_adviser.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_of(&orphan_adviser).0,
        "Advisers must be assigned to an organization"
    );

    // user 1 is the admin, not an organization
    let wrong_org = app
        .post(
            "/register/",
            &admin,
            json!({
                "name": "c", "email": "c@orbit.test", "password": "p",
                "role": "adviser", "department": 1, "organizationId": 1
            }),
        )
        .await;
    assert_eq!(wrong_org.status, StatusCode::NOT_FOUND);
    assert_eq!(error_of(&wrong_org).0, "Organization not found");

    let org_token = app.login("chess@orbit.test", "org-pass").await;
    let forbidden = app
        .post("/create-department/", &org_token, json!({ "name": "Math" }))
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert_eq!(error_of(&forbidden).1, "FORBIDDEN");

    let metrics = app.get("/metrics", &admin).await;
    assert_eq!(metrics.status, StatusCode::OK);
    assert!(metrics
        .text
        .contains("orbit_authz_denials_total{action=\"create-department\"} 1"));
    assert!(metrics
        .text
        .contains("orbit_api_errors_total{code=\"CONFLICT\"} 2"));
    assert!(metrics.text.contains("orbit_uptime_seconds"));
}

#[tokio::test]
async fn documents_are_scoped_by_role() {
    let app = TestApp::new(&[]).await;
    let admin = app.admin_token().await;

    let cs = app.create_department(&admin, "CS").await;
    let math = app.create_department(&admin, "Math").await;
    let org = app
        .create_organization(&admin, "Robotics", "robotics@orbit.test", cs)
        .await;

    let adviser = |name: &str, email: &str| {
        json!({
            "name": name, "email": email, "password": "adv-pass",
            "role": "adviser", "department": cs, "organizationId": org
        })
    };
    let x = app.register(&admin, adviser("X", "x@orbit.test")).await;
    let _y = app.register(&admin, adviser("Y", "y@orbit.test")).await;
    app.register(
        &admin,
        json!({
            "name": "Dean CS", "email": "dcs@orbit.test", "password": "dean-pass",
            "role": "dean", "department": cs
        }),
    )
    .await;
    app.register(
        &admin,
        json!({
            "name": "Dean Math", "email": "dmath@orbit.test", "password": "dean-pass",
            "role": "dean", "department": math.to_string()
        }),
    )
    .await;

    let org_token = app.login("robotics@orbit.test", "org-pass").await;
    let x_id = x.to_string();
    let cs_id = cs.to_string();

    let incomplete = app
        .upload(
            &org_token,
            &[("adviser_id", &x_id), ("department_id", &cs_id)],
            Some(("thesis.pdf", b"%PDF-1.4")),
        )
        .await;
    assert_eq!(incomplete.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_of(&incomplete).0, "All fields are required");

    let org_id = org.to_string();
    let not_adviser = app
        .upload(
            &org_token,
            &[("title", "Thesis"), ("adviser_id", &org_id), ("department_id", &cs_id)],
            Some(("thesis.pdf", b"%PDF-1.4")),
        )
        .await;
    assert_eq!(not_adviser.status, StatusCode::NOT_FOUND);
    assert_eq!(error_of(&not_adviser).0, "Adviser not found");

    let uploaded = app
        .upload(
            &org_token,
            &[("title", "Thesis"), ("adviser_id", &x_id), ("department_id", &cs_id)],
            Some(("thesis.pdf", b"%PDF-1.4")),
        )
        .await;
    assert_eq!(uploaded.status, StatusCode::CREATED, "{}", uploaded.text);
    assert_eq!(uploaded.json["message"], "Document uploaded successfully!");
    assert_eq!(uploaded.json["documentId"], 1);
    assert_eq!(
        app.files.get("documents/thesis.pdf").await.unwrap().as_ref(),
        b"%PDF-1.4"
    );

    let again = app
        .upload(
            &org_token,
            &[("title", "Thesis v2"), ("adviser_id", &x_id), ("department_id", &cs_id)],
            Some(("thesis.pdf", b"%PDF-1.5")),
        )
        .await;
    assert_eq!(again.status, StatusCode::CREATED);

    let titles = |reply: &common::Reply| -> Vec<String> {
        reply
            .json
            .as_array()
            .expect("array")
            .iter()
            .map(|d| d["title"].as_str().unwrap().to_string())
            .collect()
    };

    let x_token = app.login("x@orbit.test", "adv-pass").await;
    let x_docs = app.get("/documents/", &x_token).await;
    assert_eq!(x_docs.status, StatusCode::OK);
    assert_eq!(titles(&x_docs), ["Thesis", "Thesis v2"]);
    let first = &x_docs.json[0];
    assert_eq!(first["file"], "documents/thesis.pdf");
    assert_eq!(first["status"], "pending");
    assert_eq!(first["uploaded_by"], org);
    assert_eq!(x_docs.json[1]["file"], "documents/thesis_1.pdf");

    let y_token = app.login("y@orbit.test", "adv-pass").await;
    assert!(titles(&app.get("/documents/", &y_token).await).is_empty());

    let dean_cs = app.login("dcs@orbit.test", "dean-pass").await;
    assert_eq!(titles(&app.get("/documents/", &dean_cs).await).len(), 2);
    let dean_math = app.login("dmath@orbit.test", "dean-pass").await;
    assert!(titles(&app.get("/documents/", &dean_math).await).is_empty());

    assert_eq!(titles(&app.get("/documents/", &admin).await).len(), 2);
    assert_eq!(titles(&app.get("/documents/", &org_token).await).len(), 2);

    let seen = app.get("/documents/1/", &x_token).await;
    assert_eq!(seen.status, StatusCode::OK);
    assert_eq!(seen.json["title"], "Thesis");

    let hidden = app.get("/documents/1/", &y_token).await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);
    assert_eq!(error_of(&hidden), ("Document not found", "NOT_FOUND"));
    assert_eq!(
        app.get("/documents/99/", &admin).await.status,
        StatusCode::NOT_FOUND
    );

    let download = app.get("/documents/1/file/", &x_token).await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.text, "%PDF-1.4");
    let hidden_file = app.get("/documents/1/file/", &y_token).await;
    assert_eq!(hidden_file.status, StatusCode::NOT_FOUND);
    assert_eq!(error_of(&hidden_file), ("Document not found", "NOT_FOUND"));

    let profile = app.get("/profile/", &x_token).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.json["name"], "X");
    assert_eq!(profile.json["role"], "adviser");
    assert_eq!(profile.json["department"], "CS");
    assert_eq!(profile.json["organizationId"], org);

    let admin_profile = app.get("/profile/", &admin).await;
    assert_eq!(admin_profile.json["department"], serde_json::Value::Null);
}

#[tokio::test]
async fn login_is_limited_per_source_address() {
    let app = TestApp::new(&[("login", "5/m")]).await;

    let attempt = |ip: &'static str| {
        let mut req = json_request(
            "POST",
            "/login/",
            None,
            json!({ "email": "nobody@orbit.test", "password": "guess" }),
        );
        req.headers_mut()
            .insert("x-forwarded-for", ip.parse().unwrap());
        req
    };

    for _ in 0..5 {
        let reply = app.send(attempt("203.0.113.7")).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_of(&reply).0, "Invalid email or password");
    }

    let limited = app.send(attempt("203.0.113.7")).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(error_of(&limited).1, "RATE_LIMITED");
    assert_eq!(limited.retry_after.as_deref(), Some("60"));

    let other = app.send(attempt("198.51.100.2")).await;
    assert_eq!(other.status, StatusCode::UNAUTHORIZED);

    app.clock.advance(Duration::from_secs(60));
    let fresh = app.send(attempt("203.0.113.7")).await;
    assert_eq!(fresh.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_bodies_count_against_login_quota() {
    let app = TestApp::new(&[("login", "5/m")]).await;

    let raw = |body: &'static str| {
        Request::builder()
            .method("POST")
            .uri("/login/")
            .header("content-type", "application/json")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::from(body))
            .unwrap()
    };

    for _ in 0..5 {
        let reply = app.send(raw("{not json")).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(error_of(&reply).1, "VALIDATION_ERROR");
    }

    let limited = app
        .send(raw(r#"{"email":"admin@orbit.test","password":"admin-pass"}"#))
        .await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.retry_after.as_deref(), Some("60"));
}

#[tokio::test]
async fn dean_without_department_is_forbidden() {
    let app = TestApp::new(&[]).await;
    let admin = app.admin_token().await;
    let cs = app.create_department(&admin, "CS").await;
    let org = app
        .create_organization(&admin, "Robotics", "robotics@orbit.test", cs)
        .await;
    let adviser = app
        .register(
            &admin,
            json!({
                "name": "X", "email": "x@orbit.test", "password": "adv-pass",
                "role": "adviser", "department": cs, "organizationId": org
            }),
        )
        .await;
    app.store
        .create_document(NewDocument {
            title: "Thesis".to_string(),
            file: "documents/thesis.pdf".to_string(),
            uploaded_by: UserId(org),
            adviser: UserId(adviser),
            department: DepartmentId(cs),
        })
        .await
        .unwrap();

    // registration refuses this shape, so it goes straight into the store
    app.store
        .create_user(NewUser {
            name: "Lost Dean".to_string(),
            email: "lost@orbit.test".to_string(),
            password_hash: hash_password("dean-pass").unwrap(),
            role: Role::Dean,
            department: None,
            organization: None,
        })
        .await
        .unwrap();
    let dean = app.login("lost@orbit.test", "dean-pass").await;

    for uri in ["/documents/", "/documents/1/", "/documents/1/file/"] {
        let reply = app.get(uri, &dean).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(
            error_of(&reply),
            ("Dean is not assigned to a department", "FORBIDDEN"),
            "{uri}"
        );
    }
}

#[tokio::test]
async fn oversized_upload_is_rejected_with_413() {
    let mut cfg = common::config(&[]);
    cfg.server.max_upload_bytes = 1024;
    let app = TestApp::with_config(cfg).await;
    let admin = app.admin_token().await;

    let cs = app.create_department(&admin, "CS").await;
    let org = app
        .create_organization(&admin, "Robotics", "robotics@orbit.test", cs)
        .await;
    let adviser = app
        .register(
            &admin,
            json!({
                "name": "X", "email": "x@orbit.test", "password": "adv-pass",
                "role": "adviser", "department": cs, "organizationId": org
            }),
        )
        .await;
    let org_token = app.login("robotics@orbit.test", "org-pass").await;

    let big = vec![b'a'; 4096];
    let reply = app
        .upload(
            &org_token,
            &[
                ("title", "Huge"),
                ("adviser_id", &adviser.to_string()),
                ("department_id", &cs.to_string()),
            ],
            Some(("huge.pdf", &big)),
        )
        .await;
    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE, "{}", reply.text);
    assert_eq!(error_of(&reply).1, "PAYLOAD_TOO_LARGE");

    let listed = app.get("/documents/", &admin).await;
    assert_eq!(listed.json, json!([]));
}

#[tokio::test]
async fn authenticated_routes_are_limited_per_user() {
    let app = TestApp::new(&[("list-documents", "2/m")]).await;
    let admin = app.admin_token().await;

    assert_eq!(app.get("/documents/", &admin).await.status, StatusCode::OK);
    assert_eq!(app.get("/documents/", &admin).await.status, StatusCode::OK);

    let limited = app.get("/documents/", &admin).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.retry_after.is_some());

    // other groups keep their own counters
    assert_eq!(app.get("/profile/", &admin).await.status, StatusCode::OK);

    let metrics = app.get("/metrics", &admin).await;
    assert!(metrics.text.contains(
        "orbit_rate_limit_decisions_total{decision=\"reject\",group=\"list-documents\"} 1"
    ));
    assert!(metrics
        .text
        .contains("orbit_api_errors_total{code=\"RATE_LIMITED\"} 1"));
}

#[tokio::test]
async fn refresh_token_issues_access_token() {
    let app = TestApp::new(&[]).await;

    let pair = app
        .send(json_request(
            "POST",
            "/api/token/",
            None,
            json!({ "email": common::ADMIN_EMAIL, "password": common::ADMIN_PASSWORD }),
        ))
        .await;
    assert_eq!(pair.status, StatusCode::OK);
    let refresh = pair.json["refresh"].as_str().unwrap().to_string();
    let access = pair.json["access"].as_str().unwrap().to_string();

    let renewed = app
        .send(json_request(
            "POST",
            "/api/token/refresh/",
            None,
            json!({ "refresh": refresh }),
        ))
        .await;
    assert_eq!(renewed.status, StatusCode::OK);
    let new_access = renewed.json["access"].as_str().unwrap();
    assert_eq!(app.get("/profile/", new_access).await.status, StatusCode::OK);

    let wrong_kind = app
        .send(json_request(
            "POST",
            "/api/token/refresh/",
            None,
            json!({ "refresh": access }),
        ))
        .await;
    assert_eq!(wrong_kind.status, StatusCode::UNAUTHORIZED);

    assert_eq!(
        app.get("/profile/", &refresh).await.status,
        StatusCode::UNAUTHORIZED
    );

    let missing = app
        .send(json_request("POST", "/api/token/refresh/", None, json!({})))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let bad_password = app
        .send(json_request(
            "POST",
            "/login/",
            None,
            json!({ "email": common::ADMIN_EMAIL, "password": "nope" }),
        ))
        .await;
    assert_eq!(bad_password.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn readiness_flips_when_draining() {
    let app = TestApp::new(&[]).await;
    let get = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();

    assert_eq!(app.send(get("/healthz")).await.status, StatusCode::OK);
    assert_eq!(app.send(get("/readyz")).await.status, StatusCode::OK);

    app.state.set_draining();
    let ready = app.send(get("/readyz")).await;
    assert_eq!(ready.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(ready.text, "draining");
    assert_eq!(app.send(get("/healthz")).await.status, StatusCode::OK);
}
