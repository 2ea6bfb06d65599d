// Workout templates and logs against a real database. Skipped unless TEST_DATABASE_URL is set.

mod common;

use axum::http::StatusCode;
use common::{error_code, persisted_staff, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

async fn create_exercise(app: &TestApp, token: &str, name: &str) -> String {
    let response = app
        .post("/v1/exercises")
        .bearer(token)
        .json(&json!({
            "name": format!("{} {}", name, Uuid::new_v4()),
            "muscle_group": "pernas"
        }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await["id"].as_str().unwrap().to_string()
}

fn item_exercises(template: &Value) -> Vec<(i64, String)> {
    template["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| {
            (
                item["position"].as_i64().unwrap(),
                item["exercise_id"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_template_update_replaces_items() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let coach = app.token_for_staff(&persisted_staff(&app, "instrutor").await);
    let squat = create_exercise(&app, &coach, "Agachamento").await;
    let press = create_exercise(&app, &coach, "Leg press").await;

    let response = app
        .post("/v1/workout-templates")
        .bearer(&coach)
        .json(&json!({
            "name": "Pernas A",
            "level": "beginner",
            "items": [
                {"exercise_id": squat, "sets": 4, "reps": "8-12"},
                {"exercise_id": press, "sets": 3, "reps": "10"}
            ]
        }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let template: Value = response.json().await;
    let template_id = template["id"].as_str().unwrap().to_string();
    assert_eq!(
        item_exercises(&template),
        vec![(1, squat.clone()), (2, press.clone())]
    );

    let response = app
        .put(&format!("/v1/workout-templates/{}", template_id))
        .bearer(&coach)
        .json(&json!({
            "items": [
                {"exercise_id": press, "sets": 5, "reps": "5"},
                {"exercise_id": squat, "sets": 3, "reps": "AMRAP", "rest_seconds": 90},
                {"exercise_id": press, "sets": 2, "reps": "15"}
            ]
        }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let template: Value = response.json().await;
    assert_eq!(template["name"], "Pernas A");
    assert_eq!(
        item_exercises(&template),
        vec![(1, press.clone()), (2, squat.clone()), (3, press.clone())]
    );
    assert_eq!(template["items"][1]["rest_seconds"], 90);

    // One unknown exercise rolls back the whole update
    let response = app
        .put(&format!("/v1/workout-templates/{}", template_id))
        .bearer(&coach)
        .json(&json!({
            "name": "Pernas B",
            "items": [
                {"exercise_id": squat, "sets": 4, "reps": "8"},
                {"exercise_id": Uuid::new_v4(), "sets": 4, "reps": "8"}
            ]
        }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await;
    assert_eq!(error_code(&body), "VALIDATION_ERROR");
    assert!(body["error"]["details"]["items"].is_array());

    let response = app
        .get(&format!("/v1/workout-templates/{}", template_id))
        .bearer(&coach)
        .send()
        .await;
    let template: Value = response.json().await;
    assert_eq!(template["name"], "Pernas A");
    assert_eq!(template["items"].as_array().unwrap().len(), 3);

    // Omitting items leaves them alone
    let response = app
        .put(&format!("/v1/workout-templates/{}", template_id))
        .bearer(&coach)
        .json(&json!({"goal": "força"}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let template: Value = response.json().await;
    assert_eq!(template["goal"], "força");
    assert_eq!(template["items"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_workout_log_with_entries() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let coach = app.token_for_staff(&persisted_staff(&app, "instrutor").await);
    let desk = app.token_for_staff(&persisted_staff(&app, "atendente").await);
    let row = create_exercise(&app, &coach, "Remada curvada").await;
    let curl = create_exercise(&app, &coach, "Rosca direta").await;

    let response = app
        .post("/v1/students")
        .bearer(&desk)
        .json(&json!({
            "full_name": "João Lima",
            "email": format!("joao-{}@example.com", Uuid::new_v4())
        }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let student_id = response.json().await["id"].as_str().unwrap().to_string();

    let response = app
        .post("/v1/workout-logs")
        .bearer(&coach)
        .json(&json!({
            "student_id": student_id,
            "duration_minutes": 50,
            "perceived_effort": 8,
            "notes": "  Boa sessão  ",
            "entries": [
                {"exercise_id": row, "sets_completed": 4, "reps_completed": 10, "weight_kg": 40.0},
                {"exercise_id": curl, "sets_completed": 3, "reps_completed": 12}
            ]
        }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let log: Value = response.json().await;
    assert_eq!(log["student_id"], student_id.as_str());
    assert_eq!(log["notes"], "Boa sessão");
    let entries = log["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["exercise_id"], row.as_str());
    assert_eq!(entries[0]["weight_kg"], 40.0);
    assert!(entries[0]["exercise_name"]
        .as_str()
        .unwrap()
        .starts_with("Remada curvada"));
    assert!(entries[1]["weight_kg"].is_null());

    let response = app
        .post("/v1/workout-logs")
        .bearer(&coach)
        .json(&json!({
            "student_id": student_id,
            "entries": [
                {"exercise_id": row, "sets_completed": 4},
                {"exercise_id": Uuid::new_v4(), "sets_completed": 4}
            ]
        }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await;
    assert_eq!(error_code(&body), "VALIDATION_ERROR");
    assert!(body["error"]["details"]["entries"].is_array());

    let response = app
        .get(&format!("/v1/students/{}/workout-logs", student_id))
        .bearer(&desk)
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page: Value = response.json().await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], log["id"]);
}

#[tokio::test]
async fn test_workout_log_for_unknown_template() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let coach = app.token_for_staff(&persisted_staff(&app, "instrutor").await);
    let desk = app.token_for_staff(&persisted_staff(&app, "atendente").await);

    let response = app
        .post("/v1/students")
        .bearer(&desk)
        .json(&json!({
            "full_name": "Ana Costa",
            "email": format!("ana-{}@example.com", Uuid::new_v4())
        }))
        .send()
        .await;
    let student_id = response.json().await["id"].as_str().unwrap().to_string();

    let response = app
        .post("/v1/workout-logs")
        .bearer(&coach)
        .json(&json!({
            "student_id": student_id,
            "template_id": Uuid::new_v4()
        }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response.json().await), "NOT_FOUND");
}
