use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use auth_cell::router::auth_routes;
use shared_database::{InMemoryStore, UserDirectory};
use shared_utils::test_utils::{seeded_store, JwtTestUtils, TestConfig, TestUser};

fn create_test_app(store: Arc<InMemoryStore>) -> Router {
    auth_routes(TestConfig::default().to_state(store))
}

fn token_for(user: &TestUser) -> String {
    JwtTestUtils::create_test_token(user, &TestConfig::default().token_secret, None)
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
    builder.body(body).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_login_returns_usable_token() {
    let app = create_test_app(seeded_store());

    let (status, body) = send(
        &app,
        request(Method::POST, "/login", None, Some(json!({ "email": "a@x.com" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let token = body["access_token"].as_str().unwrap();
    let (status, _) = send(&app, request(Method::GET, "/user", Some(token), None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_upsert_then_list_users() {
    let app = create_test_app(seeded_store());

    let (status, body) = send(
        &app,
        request(Method::PUT, "/user/a@x.com", None, Some(json!({ "name": "Ada" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["email"], "a@x.com");
    assert_eq!(body["result"]["role"], "none");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, users) = send(&app, request(Method::GET, "/user", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users, json!([{ "email": "a@x.com", "role": "none", "name": "Ada" }]));
}

#[tokio::test]
async fn test_list_users_requires_token() {
    let app = create_test_app(seeded_store());

    let (status, body) = send(&app, request(Method::GET, "/user", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing authorization header");

    let forged = JwtTestUtils::create_invalid_signature_token(&TestUser::default());
    let (status, _) = send(&app, request(Method::GET, "/user", Some(&forged), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_check_endpoint() {
    let store = seeded_store();
    TestUser::admin("admin@x.com").register(&store).await;
    let app = create_test_app(store);

    let (status, body) = send(&app, request(Method::GET, "/admin/admin@x.com", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "admin": true }));

    let (_, body) = send(&app, request(Method::GET, "/admin/nobody@x.com", None, None)).await;
    assert_eq!(body, json!({ "admin": false }));
}

#[tokio::test]
async fn test_only_admins_can_grant_admin() {
    let store = seeded_store();
    let admin = TestUser::admin("admin@x.com");
    let patient = TestUser::patient("pat@x.com");
    admin.register(&store).await;
    patient.register(&store).await;
    let app = create_test_app(store.clone());

    let (status, body) = send(
        &app,
        request(Method::PUT, "/user/admin/pat@x.com", Some(&token_for(&patient)), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "forbidden");
    assert!(!store.find_user("pat@x.com").await.unwrap().unwrap().is_admin());

    let (status, body) = send(
        &app,
        request(Method::PUT, "/user/admin/pat@x.com", Some(&token_for(&admin)), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
    assert!(store.find_user("pat@x.com").await.unwrap().unwrap().is_admin());
}

#[tokio::test]
async fn test_grant_admin_without_token_is_unauthorized() {
    let app = create_test_app(seeded_store());

    let (status, _) = send(&app, request(Method::PUT, "/user/admin/pat@x.com", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unparseable_login_body_gets_error_payload() {
    let app = create_test_app(seeded_store());
    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .unwrap();

    let (status, body) = send(&app, malformed).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "bad_request");
}
