use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use configs::{AuthConfig, PasswordConfig};
use server::routes::{self, auth};
use service::auth::repository::{memory::InMemoryCredentialStore, CredentialStore};
use service::auth::AuthService;

fn build_app() -> Router {
    let cfg = AuthConfig {
        access_secret: "flow-access-secret".into(),
        refresh_secret: "flow-refresh-secret".into(),
        password: PasswordConfig { memory_kib: 1024, iterations: 1, parallelism: 1 },
        ..AuthConfig::default()
    };
    let store: Arc<dyn CredentialStore> = Arc::new(InMemoryCredentialStore::default());
    let svc = AuthService::new(store, &cfg).unwrap();
    routes::build_router(auth::ServerState::new(svc))
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

async fn get_with_token(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut req = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    send(app, req.body(Body::empty()).unwrap()).await
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

#[tokio::test]
async fn register_login_refresh_me_flow() {
    let app = build_app();

    let (status, reg) = post_json(
        &app,
        "/auth/register",
        json!({"name": "Ann", "email": "ann@x.com", "password": "secret123"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reg["user"]["role"], "employee");
    assert_eq!(reg["user"]["email"], "ann@x.com");
    assert!(reg["access_token"].as_str().is_some());
    assert!(reg["refresh_token"].as_str().is_some());
    assert!(reg["user"].get("password_hash").is_none());
    assert!(!reg.to_string().contains("secret123"));

    let (status, login) = post_json(&app, "/auth/login", json!({"email": "ANN@x.com", "password": "secret123"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["user"]["id"], reg["user"]["id"]);
    assert!(!login.to_string().contains("argon2"));

    let refresh_token = login["refresh_token"].as_str().unwrap();
    let (status, grant) = post_json(&app, "/auth/refresh", json!({"refresh_token": refresh_token})).await;
    assert_eq!(status, StatusCode::OK);
    let access = grant["access_token"].as_str().unwrap();
    assert!(grant.get("refresh_token").is_none());

    let (status, me) = get_with_token(&app, "/auth/me", Some(access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], reg["user"]["id"]);
    assert_eq!(me["name"], "Ann");
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = build_app();
    let (status, _) = post_json(
        &app,
        "/auth/register",
        json!({"name": "Ann", "email": "ann@x.com", "password": "secret123"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (s1, wrong) = post_json(&app, "/auth/login", json!({"email": "ann@x.com", "password": "nope"})).await;
    let (s2, unknown) = post_json(&app, "/auth/login", json!({"email": "ghost@x.com", "password": "nope"})).await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = build_app();
    let body = json!({"name": "Foo", "email": "foo@x.com", "password": "pw"});
    assert_eq!(post_json(&app, "/auth/register", body).await.0, StatusCode::CREATED);
    let (status, err) =
        post_json(&app, "/auth/register", json!({"name": "Foo", "email": "FOO@x.com", "password": "pw2"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], 1002);
}

#[tokio::test]
async fn bad_input_is_bad_request() {
    let app = build_app();
    let (status, err) = post_json(&app, "/auth/register", json!({"email": "a@b.co", "password": "pw"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().is_some());

    let (status, _) = post_json(&app, "/auth/login", json!({"email": "a@b.co"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(&app, "/auth/register", json!({"name": "A", "email": "a@b.co", "password": "pw", "role": "root"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    assert_eq!(send(&app, req).await.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tokens_are_not_interchangeable() {
    let app = build_app();
    let (_, reg) = post_json(
        &app,
        "/auth/register",
        json!({"name": "Ann", "email": "ann@x.com", "password": "secret123"}),
    )
    .await;
    let access = reg["access_token"].as_str().unwrap();
    let refresh = reg["refresh_token"].as_str().unwrap();

    let (status, _) = post_json(&app, "/auth/refresh", json!({"refresh_token": access})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = get_with_token(&app, "/auth/me", Some(refresh)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_requires_bearer_token() {
    let app = build_app();
    let (status, err) = get_with_token(&app, "/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["error"], "unauthorized");
    let (status, _) = get_with_token(&app, "/auth/me", Some("invalid.token.here")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_and_openapi_are_public() {
    let app = build_app();
    let (status, body) = get_with_token(&app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let (status, doc) = get_with_token(&app, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/auth/refresh"].is_object());
}
