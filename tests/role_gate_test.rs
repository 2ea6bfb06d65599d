// Role groups per route. Rejections happen before any handler runs.

mod common;

use axum::http::StatusCode;
use common::{error_code, TestApp};
use serde_json::json;
use uuid::Uuid;

async fn assert_forbidden(app: &TestApp, method: &str, uri: &str, role: &str) {
    let request = match method {
        "GET" => app.get(uri),
        "POST" => app.post(uri).json(&json!({})),
        "PUT" => app.put(uri).json(&json!({})),
        "DELETE" => app.delete(uri),
        other => panic!("unsupported method {}", other),
    };
    let response = request.as_role(role).send().await;
    assert_eq!(
        response.status(),
        StatusCode::FORBIDDEN,
        "{} {} as {}",
        method,
        uri,
        role
    );
    assert_eq!(error_code(&response.json().await), "FORBIDDEN");
}

#[tokio::test]
async fn test_staff_management_is_admin_only() {
    let app = TestApp::offline();
    let id = Uuid::new_v4();

    for role in ["atendente", "instrutor"] {
        assert_forbidden(&app, "GET", "/v1/staff", role).await;
        assert_forbidden(&app, "POST", "/v1/staff", role).await;
        assert_forbidden(&app, "DELETE", &format!("/v1/staff/{}", id), role).await;
    }
}

#[tokio::test]
async fn test_instructor_cannot_manage_students() {
    let app = TestApp::offline();
    let id = Uuid::new_v4();

    assert_forbidden(&app, "POST", "/v1/students", "instrutor").await;
    assert_forbidden(&app, "PUT", &format!("/v1/students/{}", id), "instrutor").await;
    assert_forbidden(&app, "DELETE", &format!("/v1/students/{}", id), "instrutor").await;
    assert_forbidden(
        &app,
        "GET",
        &format!("/v1/students/{}/enrollment-term", id),
        "instrutor",
    )
    .await;
}

#[tokio::test]
async fn test_plan_changes_are_admin_only() {
    let app = TestApp::offline();
    let id = Uuid::new_v4();

    assert_forbidden(&app, "POST", "/v1/plans", "atendente").await;
    assert_forbidden(&app, "PUT", &format!("/v1/plans/{}", id), "atendente").await;
    assert_forbidden(&app, "DELETE", &format!("/v1/plans/{}", id), "instrutor").await;
}

#[tokio::test]
async fn test_payment_permissions() {
    let app = TestApp::offline();
    let id = Uuid::new_v4();

    assert_forbidden(&app, "POST", "/v1/payments", "instrutor").await;
    assert_forbidden(&app, "POST", &format!("/v1/payments/{}/cancel", id), "atendente").await;
}

#[tokio::test]
async fn test_training_routes_exclude_front_desk() {
    let app = TestApp::offline();
    let id = Uuid::new_v4();

    assert_forbidden(&app, "POST", "/v1/exercises", "atendente").await;
    assert_forbidden(&app, "DELETE", &format!("/v1/exercises/{}", id), "atendente").await;
    assert_forbidden(&app, "POST", "/v1/workout-templates", "atendente").await;
    assert_forbidden(&app, "PUT", &format!("/v1/workout-templates/{}", id), "atendente").await;
    assert_forbidden(&app, "DELETE", &format!("/v1/workout-logs/{}", id), "atendente").await;
}

#[tokio::test]
async fn test_notification_permissions() {
    let app = TestApp::offline();
    let id = Uuid::new_v4();

    assert_forbidden(&app, "GET", "/v1/notifications", "instrutor").await;
    assert_forbidden(&app, "POST", &format!("/v1/notifications/{}/resend", id), "instrutor").await;
    assert_forbidden(&app, "POST", "/v1/notifications/run-sweep", "atendente").await;
}

#[tokio::test]
async fn test_feedback_permissions() {
    let app = TestApp::offline();
    let id = Uuid::new_v4();

    assert_forbidden(&app, "PUT", &format!("/v1/feedback/{}/response", id), "instrutor").await;
    assert_forbidden(&app, "DELETE", &format!("/v1/feedback/{}", id), "atendente").await;
}

#[tokio::test]
async fn test_reports_are_admin_only() {
    let app = TestApp::offline();

    for path in [
        "/v1/reports/revenue",
        "/v1/reports/students",
        "/v1/reports/expiring",
        "/v1/reports/attendance",
    ] {
        assert_forbidden(&app, "GET", path, "atendente").await;
        assert_forbidden(&app, "GET", path, "instrutor").await;
    }
}

#[tokio::test]
async fn test_allowed_role_passes_gate_and_validation_runs() {
    let app = TestApp::offline();

    let response = app
        .post("/v1/students")
        .as_role("atendente")
        .json(&json!({ "full_name": "  ", "email": "nope" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = response.json().await;
    assert_eq!(error_code(&body), "VALIDATION_ERROR");
    assert!(body["error"]["details"]["email"].is_array());
    assert!(body["error"]["details"]["full_name"].is_array());
}

#[tokio::test]
async fn test_student_update_applies_create_rules() {
    let app = TestApp::offline();

    let response = app
        .put(&format!("/v1/students/{}", Uuid::new_v4()))
        .as_role("atendente")
        .json(&json!({ "phone": "call me" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = response.json().await;
    assert!(body["error"]["details"]["phone"].is_array());
}

#[tokio::test]
async fn test_instructor_may_log_workouts() {
    let app = TestApp::offline();

    let response = app
        .post("/v1/workout-logs")
        .as_role("instrutor")
        .json(&json!({
            "student_id": Uuid::new_v4(),
            "perceived_effort": 11,
            "entries": []
        }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = response.json().await;
    assert!(body["error"]["details"]["perceived_effort"].is_array());
}

#[tokio::test]
async fn test_plan_validation_for_admin() {
    let app = TestApp::offline();

    let response = app
        .post("/v1/plans")
        .as_role("administrador")
        .json(&json!({ "name": "Mensal", "price_cents": -1, "duration_months": 0 }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = response.json().await;
    assert!(body["error"]["details"]["price_cents"].is_array());
    assert!(body["error"]["details"]["duration_months"].is_array());
}

#[tokio::test]
async fn test_malformed_path_id() {
    let app = TestApp::offline();

    let response = app
        .get("/v1/students/not-a-uuid")
        .as_role("instrutor")
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response.json().await), "BAD_REQUEST");
}
