mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tower::ServiceExt;

use common::{TestApp, TEST_JWT_SECRET};
use opsboard_api::auth::AuthService;
use opsboard_api::entities::user::UserRole;

fn login_request(email: &str, password: &str) -> Request<Body> {
    Request::builder()
        .uri("/api/v1/auth/login")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": email, "password": password }).to_string(),
        ))
        .expect("request")
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn login_accepts_the_right_password_and_rejects_the_wrong_one() {
    let app = TestApp::new().await;
    let (router, auth_service) = app.router();

    auth_service
        .register(
            "Nina New".to_string(),
            "nina@example.com".to_string(),
            "correct horse battery",
            UserRole::User,
        )
        .await
        .expect("register");

    let ok = router
        .clone()
        .oneshot(login_request("nina@example.com", "correct horse battery"))
        .await
        .expect("response");
    assert_eq!(ok.status(), StatusCode::OK);

    let wrong = router
        .clone()
        .oneshot(login_request("nina@example.com", "wrong password"))
        .await
        .expect("response");
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    // Unknown account answers exactly like a wrong password
    let unknown = router
        .oneshot(login_request("nobody@example.com", "correct horse battery"))
        .await
        .expect("response");
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn backend_outage_is_not_reported_as_bad_credentials() {
    let app = TestApp::new().await;
    let broken = Arc::new(AuthService::new(
        Arc::new(DatabaseConnection::Disconnected),
        TEST_JWT_SECRET.to_string(),
        3600,
    ));
    let router = app.router_with_auth(broken);

    let response = router
        .oneshot(login_request("alice@example.com", "whatever"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
