// Public endpoints, router fallback, CORS and query validation

mod common;

use axum::http::StatusCode;
use common::{error_code, TestApp};

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let app = TestApp::offline();

    let response = app.get("/v1/health").send().await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = response.json().await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["service"], "academy-backend");
    assert_eq!(body["components"]["postgresql"]["status"], "unhealthy");
}

#[tokio::test]
async fn test_openapi_document_is_public() {
    let app = TestApp::offline();

    let response = app.get("/v1/docs/openapi.json").send().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.header("content-type").as_deref(),
        Some("application/json")
    );

    let body = response.json().await;
    assert!(body["openapi"].as_str().unwrap().starts_with("3."));
    assert!(body["paths"]["/v1/payments"]["post"].is_object());
    assert!(body["paths"]["/v1/students/{id}/enrollment-term"]["get"].is_object());
    assert!(body["components"]["securitySchemes"]["bearerAuth"].is_object());
    assert_eq!(
        body["paths"]["/v1/students"]["get"]["responses"]["200"]["content"]["application/json"]
            ["schema"]["$ref"],
        "#/components/schemas/PaginatedStudents"
    );
    assert_eq!(
        body["paths"]["/v1/auth/login"]["post"]["responses"]["401"]["content"]["application/json"]
            ["schema"]["$ref"],
        "#/components/schemas/ErrorEnvelope"
    );
    assert_eq!(body["servers"][0]["url"], "http://localhost:0");
}

#[tokio::test]
async fn test_swagger_ui_disabled_by_default() {
    let app = TestApp::offline();

    let response = app.get("/v1/docs").send().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_swagger_ui_when_enabled() {
    let app = TestApp::offline_with(|config| config.features.enable_swagger_ui = true);

    let response = app.get("/v1/docs").send().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.contains("SwaggerUIBundle"));
}

#[tokio::test]
async fn test_unknown_route_uses_envelope() {
    let app = TestApp::offline();

    let response = app.get("/v1/does-not-exist").send().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response.json().await), "NOT_FOUND");

    let response = app.get("/students").send().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_origin_whitelist() {
    let app = TestApp::offline();

    let response = app
        .delete("/v1/students/00000000-0000-0000-0000-000000000000")
        .header("origin", "https://app.academy.test")
        .send()
        .await;
    assert_eq!(
        response.header("access-control-allow-origin").as_deref(),
        Some("https://app.academy.test")
    );

    let response = app
        .get("/v1/plans")
        .header("origin", "https://evil.example")
        .send()
        .await;
    assert!(response.header("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_options_request_short_circuits() {
    let app = TestApp::offline();

    let request = axum::http::Request::builder()
        .method("OPTIONS")
        .uri("/v1/payments")
        .header("origin", "https://app.academy.test")
        .header("access-control-request-method", "POST")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.app.clone(), request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-methods")
            .and_then(|v| v.to_str().ok()),
        Some("GET, POST, PUT, DELETE, OPTIONS")
    );
}

#[tokio::test]
async fn test_inverted_date_range_rejected() {
    let app = TestApp::offline();

    let response = app
        .get("/v1/reports/revenue?from=2024-05-01&to=2024-04-01")
        .as_role("administrador")
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json().await;
    assert!(body["error"]["details"]["from"].is_array());

    let response = app
        .get("/v1/payments?from=2024-05-01&to=2024-04-01")
        .as_role("atendente")
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_expiring_window_bounds() {
    let app = TestApp::offline();

    let response = app
        .get("/v1/reports/expiring?days=-3")
        .as_role("administrador")
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .get("/v1/reports/expiring?days=soon")
        .as_role("administrador")
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
