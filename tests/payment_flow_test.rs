// Payment lifecycle against a real database. Skipped unless TEST_DATABASE_URL is set.

mod common;

use axum::http::StatusCode;
use common::{error_code, persisted_staff, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_payment_extends_and_cancel_rolls_back() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let admin = app.token_for_staff(&persisted_staff(&app, "administrador").await);
    let desk = app.token_for_staff(&persisted_staff(&app, "atendente").await);

    let response = app
        .post("/v1/plans")
        .bearer(&admin)
        .json(&json!({
            "name": format!("Trimestral {}", Uuid::new_v4()),
            "price_cents": 27000,
            "duration_months": 3
        }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let plan: Value = response.json().await;
    let plan_id = plan["id"].as_str().unwrap().to_string();

    let response = app
        .post("/v1/students")
        .bearer(&desk)
        .json(&json!({
            "full_name": "Maria Souza",
            "email": format!("maria-{}@example.com", Uuid::new_v4())
        }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let student: Value = response.json().await;
    let student_id = student["id"].as_str().unwrap().to_string();
    assert!(student["plan_expires_at"].is_null());

    let response = app
        .post("/v1/payments")
        .bearer(&desk)
        .json(&json!({
            "student_id": student_id,
            "plan_id": plan_id,
            "method": "pix",
            "send_receipt": false
        }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let payment: Value = response.json().await;
    assert_eq!(payment["status"], "completed");
    assert_eq!(payment["amount_cents"], 27000);
    let payment_id = payment["id"].as_str().unwrap().to_string();

    let response = app
        .get(&format!("/v1/students/{}", student_id))
        .bearer(&desk)
        .send()
        .await;
    let student: Value = response.json().await;
    assert_eq!(student["status"], "active");
    assert_eq!(student["plan_expires_at"], payment["period_end"]);
    assert_eq!(student["plan"]["id"], plan["id"]);

    // Plan is now referenced
    let response = app
        .delete(&format!("/v1/plans/{}", plan_id))
        .bearer(&admin)
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(&response.json().await), "CONFLICT");

    let response = app
        .post(&format!("/v1/payments/{}/cancel", payment_id))
        .bearer(&admin)
        .json(&json!({}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json().await["status"], "cancelled");

    let response = app
        .get(&format!("/v1/students/{}", student_id))
        .bearer(&desk)
        .send()
        .await;
    let student: Value = response.json().await;
    assert!(student["plan_expires_at"].is_null());
    assert!(student["plan"].is_null());

    let response = app
        .post(&format!("/v1/payments/{}/cancel", payment_id))
        .bearer(&admin)
        .json(&json!({}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_payment_for_unknown_student() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let desk = app.token_for_staff(&persisted_staff(&app, "atendente").await);

    let response = app
        .post("/v1/payments")
        .bearer(&desk)
        .json(&json!({
            "student_id": Uuid::new_v4(),
            "plan_id": Uuid::new_v4(),
            "method": "cash",
            "send_receipt": false
        }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
