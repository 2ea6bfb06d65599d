// HTTP handlers and route builders.
// Every builder returns paths relative to `/v1`; role gates are applied per
// group with `route_layer` so unmatched paths fall through to the 404 fallback.

pub mod auth;
pub mod docs;
pub mod exercises;
pub mod feedback;
pub mod health;
pub mod notifications;
pub mod payments;
pub mod plans;
pub mod reports;
pub mod staff;
pub mod students;
pub mod workouts;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{
    app::AppState,
    config::permissions::{ADMIN_ONLY, ALL_STAFF, FRONT_DESK, TRAINING},
    middleware::require_roles,
    models::staff::StaffRole,
};

fn gated(router: Router<AppState>, roles: &'static [StaffRole]) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(roles, require_roles))
}

/// Routes reachable without a bearer token
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh_token))
        .route("/health", get(health::health_check))
        .route("/docs", get(docs::serve_swagger_ui))
        .route("/docs/openapi.json", get(docs::serve_openapi_spec))
}

// Authentication routes for the signed-in staff member
pub fn auth_routes() -> Router<AppState> {
    gated(
        Router::new()
            .route("/auth/me", get(auth::me))
            .route("/auth/password", put(auth::change_password)),
        ALL_STAFF,
    )
}

pub fn staff_routes() -> Router<AppState> {
    gated(
        Router::new()
            .route("/staff", get(staff::list_staff).post(staff::create_staff))
            .route(
                "/staff/{id}",
                get(staff::get_staff)
                    .put(staff::update_staff)
                    .delete(staff::deactivate_staff),
            ),
        ADMIN_ONLY,
    )
}

pub fn student_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/students", get(students::list_students))
        .route("/students/{id}", get(students::get_student))
        .route("/students/{id}/payments", get(students::student_payments))
        .route("/students/{id}/workout-logs", get(students::student_workout_logs))
        .route("/students/{id}/feedback", get(students::student_feedback));

    let write = Router::new()
        .route("/students", post(students::create_student))
        .route(
            "/students/{id}",
            put(students::update_student).delete(students::delete_student),
        )
        .route("/students/{id}/enrollment-term", get(students::enrollment_term));

    gated(read, ALL_STAFF).merge(gated(write, FRONT_DESK))
}

pub fn plan_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/plans", get(plans::list_plans))
        .route("/plans/{id}", get(plans::get_plan));

    let write = Router::new()
        .route("/plans", post(plans::create_plan))
        .route("/plans/{id}", put(plans::update_plan).delete(plans::delete_plan));

    gated(read, ALL_STAFF).merge(gated(write, ADMIN_ONLY))
}

pub fn payment_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/payments", get(payments::list_payments))
        .route("/payments/{id}", get(payments::get_payment));

    let record = Router::new().route("/payments", post(payments::create_payment));
    let cancel = Router::new().route("/payments/{id}/cancel", post(payments::cancel_payment));

    gated(read, ALL_STAFF)
        .merge(gated(record, FRONT_DESK))
        .merge(gated(cancel, ADMIN_ONLY))
}

pub fn exercise_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/exercises", get(exercises::list_exercises))
        .route("/exercises/{id}", get(exercises::get_exercise));

    let write = Router::new()
        .route("/exercises", post(exercises::create_exercise))
        .route(
            "/exercises/{id}",
            put(exercises::update_exercise).delete(exercises::delete_exercise),
        );

    gated(read, ALL_STAFF).merge(gated(write, TRAINING))
}

pub fn workout_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/workout-templates", get(workouts::list_templates))
        .route("/workout-templates/{id}", get(workouts::get_template))
        .route(
            "/workout-logs",
            get(workouts::list_logs).post(workouts::create_log),
        )
        .route("/workout-logs/{id}", get(workouts::get_log));

    let write = Router::new()
        .route("/workout-templates", post(workouts::create_template))
        .route(
            "/workout-templates/{id}",
            put(workouts::update_template).delete(workouts::delete_template),
        )
        .route("/workout-logs/{id}", delete(workouts::delete_log));

    gated(read, ALL_STAFF).merge(gated(write, TRAINING))
}

pub fn notification_routes() -> Router<AppState> {
    let front_desk = Router::new()
        .route(
            "/notifications",
            get(notifications::list_notifications).post(notifications::create_notification),
        )
        .route(
            "/notifications/{id}",
            get(notifications::get_notification).delete(notifications::delete_notification),
        )
        .route(
            "/notifications/{id}/resend",
            post(notifications::resend_notification),
        );

    let sweep = Router::new().route("/notifications/run-sweep", post(notifications::run_sweep));

    gated(front_desk, FRONT_DESK).merge(gated(sweep, ADMIN_ONLY))
}

pub fn feedback_routes() -> Router<AppState> {
    let read = Router::new()
        .route(
            "/feedback",
            get(feedback::list_feedback).post(feedback::create_feedback),
        )
        .route("/feedback/{id}", get(feedback::get_feedback));

    let respond = Router::new().route("/feedback/{id}/response", put(feedback::respond_feedback));
    let remove = Router::new().route("/feedback/{id}", delete(feedback::delete_feedback));

    gated(read, ALL_STAFF)
        .merge(gated(respond, FRONT_DESK))
        .merge(gated(remove, ADMIN_ONLY))
}

pub fn report_routes() -> Router<AppState> {
    gated(
        Router::new()
            .route("/reports/revenue", get(reports::revenue))
            .route("/reports/students", get(reports::students))
            .route("/reports/expiring", get(reports::expiring))
            .route("/reports/attendance", get(reports::attendance)),
        ADMIN_ONLY,
    )
}

/// Every route that requires an authenticated staff member
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(staff_routes())
        .merge(student_routes())
        .merge(plan_routes())
        .merge(payment_routes())
        .merge(exercise_routes())
        .merge(workout_routes())
        .merge(notification_routes())
        .merge(feedback_routes())
        .merge(report_routes())
}
