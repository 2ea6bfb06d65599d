// Bearer token handling and request validation on the HTTP surface.
// None of these requests reach the database.

mod common;

use axum::http::StatusCode;
use common::{error_code, fake_staff, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = TestApp::offline();

    let response = app.get("/v1/students").send().await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&response.json().await), "MISSING_TOKEN");
}

#[tokio::test]
async fn test_non_bearer_authorization_header() {
    let app = TestApp::offline();

    let response = app
        .get("/v1/auth/me")
        .header("authorization", "Basic YWRtaW46YWRtaW4=")
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&response.json().await), "MISSING_TOKEN");
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let app = TestApp::offline();

    let response = app.get("/v1/plans").bearer("not.a.jwt").send().await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&response.json().await), "INVALID_TOKEN");
}

#[tokio::test]
async fn test_token_from_another_deployment_rejected() {
    let app = TestApp::offline();
    let other = TestApp::offline_with(|config| {
        config.jwt.access_secret = "a-completely-different-secret-of-32-chars".to_string();
    });
    let token = other.token_for("administrador");

    let response = app.get("/v1/staff").bearer(&token).send().await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&response.json().await), "INVALID_TOKEN");
}

#[tokio::test]
async fn test_unknown_role_claim_rejected() {
    let app = TestApp::offline();
    let token = app.token_for_staff(&fake_staff("aluno"));

    let response = app.get("/v1/students").bearer(&token).send().await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&response.json().await), "INVALID_TOKEN");
}

#[tokio::test]
async fn test_refresh_token_cannot_authenticate_requests() {
    let app = TestApp::offline();
    let staff = fake_staff("administrador");
    let pair = app.state.jwt_service.issue_pair(&staff).unwrap();

    let response = app
        .get("/v1/auth/me")
        .bearer(&pair.refresh_token)
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_with_invalid_token() {
    let app = TestApp::offline();

    let response = app
        .post("/v1/auth/refresh")
        .json(&json!({ "refresh_token": "definitely-not-a-token" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&response.json().await), "INVALID_TOKEN");
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let app = TestApp::offline();
    let access = app.token_for("atendente");

    let response = app
        .post("/v1/auth/refresh")
        .json(&json!({ "refresh_token": access }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_validation_envelope() {
    let app = TestApp::offline();

    let response = app
        .post("/v1/auth/login")
        .json(&json!({ "email": "not-an-email", "password": "" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = response.json().await;
    assert_eq!(error_code(&body), "VALIDATION_ERROR");
    assert!(body["error"]["details"]["email"].is_array());
    assert!(body["error"]["details"]["password"].is_array());
}

#[tokio::test]
async fn test_login_malformed_json() {
    let app = TestApp::offline();

    let response = app
        .post("/v1/auth/login")
        .raw_json("{\"email\": \"admin@academy.test\",")
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response.json().await), "BAD_REQUEST");
}

#[tokio::test]
async fn test_login_missing_content_type() {
    let app = TestApp::offline();

    let response = app.post("/v1/auth/login").send().await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_change_password_too_short() {
    let app = TestApp::offline();

    let response = app
        .put("/v1/auth/password")
        .as_role("instrutor")
        .json(&json!({ "current_password": "old-password", "new_password": "short" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = response.json().await;
    assert!(body["error"]["details"]["new_password"].is_array());
}
