// API documentation: generated OpenAPI document and the Swagger UI page
pub mod swagger_ui;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use utoipa::{
    openapi::{
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
        server::ServerBuilder,
    },
    Modify, OpenApi,
};

use crate::app::AppState;
use crate::app_config::AppConfig;
use crate::handlers::{
    auth, exercises, feedback, health, notifications, payments, plans, reports, staff, students,
    workouts,
};
use crate::models::{
    auth::{ChangePasswordRequest, LoginRequest, RefreshTokenRequest, TokenResponse},
    common::{
        CountResponse, PaginatedExercises, PaginatedFeedback, PaginatedNotifications,
        PaginatedPayments, PaginatedStaff, PaginatedStudents, PaginatedWorkoutLogs,
        PaginatedWorkoutTemplates,
    },
    exercise::{CreateExerciseRequest, Exercise, UpdateExerciseRequest},
    feedback::{
        CreateFeedbackRequest, Feedback, FeedbackCategory, FeedbackStatus, RespondFeedbackRequest,
    },
    notification::{
        CreateNotificationRequest, Notification, NotificationChannel, NotificationKind,
        NotificationStatus, SweepReport,
    },
    payment::{
        CancelPaymentRequest, CreatePaymentRequest, Payment, PaymentMethod, PaymentResponse,
        PaymentStatus,
    },
    plan::{CreatePlanRequest, Plan, PlanSummary, UpdatePlanRequest},
    report::{
        AttendanceRow, ExpiringStudent, MethodTotal, MonthTotal, PlanCount, RevenueReport,
        StatusCount, StudentsReport,
    },
    staff::{CreateStaffRequest, StaffResponse, StaffRole, UpdateStaffRequest},
    student::{CreateStudentRequest, StudentResponse, StudentStatus, UpdateStudentRequest},
    workout_log::{
        CreateWorkoutLogRequest, LogEntryDetail, LogEntryInput, WorkoutLog, WorkoutLogDetail,
    },
    workout_template::{
        CreateWorkoutTemplateRequest, TemplateItemDetail, TemplateItemInput, TemplateLevel,
        UpdateWorkoutTemplateRequest, WorkoutTemplate, WorkoutTemplateDetail,
    },
};
use crate::services::notification::NotificationBatch;
use crate::utils::{ErrorBody, ErrorEnvelope};

pub use swagger_ui::serve_swagger_ui;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Academy Backend API",
        description = "Gym and academy management: students, plans, payments, training and notifications"
    ),
    paths(
        health::health_check,
        auth::login,
        auth::refresh_token,
        auth::me,
        auth::change_password,
        staff::list_staff,
        staff::get_staff,
        staff::create_staff,
        staff::update_staff,
        staff::deactivate_staff,
        students::list_students,
        students::get_student,
        students::create_student,
        students::update_student,
        students::delete_student,
        students::student_payments,
        students::student_workout_logs,
        students::student_feedback,
        students::enrollment_term,
        plans::list_plans,
        plans::get_plan,
        plans::create_plan,
        plans::update_plan,
        plans::delete_plan,
        payments::list_payments,
        payments::get_payment,
        payments::create_payment,
        payments::cancel_payment,
        exercises::list_exercises,
        exercises::get_exercise,
        exercises::create_exercise,
        exercises::update_exercise,
        exercises::delete_exercise,
        workouts::list_templates,
        workouts::get_template,
        workouts::create_template,
        workouts::update_template,
        workouts::delete_template,
        workouts::list_logs,
        workouts::get_log,
        workouts::create_log,
        workouts::delete_log,
        notifications::list_notifications,
        notifications::get_notification,
        notifications::create_notification,
        notifications::resend_notification,
        notifications::delete_notification,
        notifications::run_sweep,
        feedback::list_feedback,
        feedback::get_feedback,
        feedback::create_feedback,
        feedback::respond_feedback,
        feedback::delete_feedback,
        reports::revenue,
        reports::students,
        reports::expiring,
        reports::attendance,
    ),
    components(schemas(
        ErrorEnvelope,
        ErrorBody,
        CountResponse,
        health::HealthResponse,
        health::HealthComponents,
        health::ComponentHealth,
        LoginRequest,
        RefreshTokenRequest,
        ChangePasswordRequest,
        TokenResponse,
        StaffRole,
        StaffResponse,
        CreateStaffRequest,
        UpdateStaffRequest,
        PaginatedStaff,
        StudentStatus,
        StudentResponse,
        CreateStudentRequest,
        UpdateStudentRequest,
        PaginatedStudents,
        Plan,
        PlanSummary,
        CreatePlanRequest,
        UpdatePlanRequest,
        PaymentMethod,
        PaymentStatus,
        Payment,
        PaymentResponse,
        CreatePaymentRequest,
        CancelPaymentRequest,
        PaginatedPayments,
        Exercise,
        CreateExerciseRequest,
        UpdateExerciseRequest,
        PaginatedExercises,
        TemplateLevel,
        WorkoutTemplate,
        WorkoutTemplateDetail,
        TemplateItemInput,
        TemplateItemDetail,
        CreateWorkoutTemplateRequest,
        UpdateWorkoutTemplateRequest,
        PaginatedWorkoutTemplates,
        WorkoutLog,
        WorkoutLogDetail,
        LogEntryInput,
        LogEntryDetail,
        CreateWorkoutLogRequest,
        PaginatedWorkoutLogs,
        NotificationKind,
        NotificationChannel,
        NotificationStatus,
        Notification,
        NotificationBatch,
        CreateNotificationRequest,
        SweepReport,
        PaginatedNotifications,
        FeedbackCategory,
        FeedbackStatus,
        Feedback,
        CreateFeedbackRequest,
        RespondFeedbackRequest,
        PaginatedFeedback,
        RevenueReport,
        MethodTotal,
        MonthTotal,
        StudentsReport,
        StatusCount,
        PlanCount,
        ExpiringStudent,
        AttendanceRow,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health checks"),
        (name = "Authentication", description = "Staff login, token refresh and password changes"),
        (name = "Staff", description = "Staff accounts (administrators only)"),
        (name = "Students", description = "Student records, history and enrollment terms"),
        (name = "Plans", description = "Subscription plans"),
        (name = "Payments", description = "Payments and plan renewals"),
        (name = "Exercises", description = "Exercise catalog"),
        (name = "Workout templates", description = "Reusable workout templates"),
        (name = "Workout logs", description = "Performed workouts"),
        (name = "Notifications", description = "Manual and automated student notifications"),
        (name = "Feedback", description = "Student feedback"),
        (name = "Reports", description = "Administrative reports")
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI document with the server list for the current environment
pub fn build_openapi_spec(config: &AppConfig) -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();
    spec.info.version = env!("CARGO_PKG_VERSION").to_string();

    let api_url = config
        .server
        .public_url
        .clone()
        .unwrap_or_else(|| format!("http://localhost:{}", config.server.port));
    spec.servers = Some(vec![ServerBuilder::new()
        .url(api_url)
        .description(Some(format!("Current server ({})", config.environment)))
        .build()]);
    spec
}

/// Serve OpenAPI JSON specification at /v1/docs/openapi.json
pub async fn serve_openapi_spec(State(app_state): State<AppState>) -> Response {
    let spec = build_openapi_spec(app_state.config.as_ref());

    match spec.to_json() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to serialize OpenAPI document: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_resource() {
        let spec = ApiDoc::openapi();
        let paths = &spec.paths.paths;

        for path in [
            "/v1/health",
            "/v1/auth/login",
            "/v1/students/{id}/enrollment-term",
            "/v1/payments/{id}/cancel",
            "/v1/workout-templates/{id}",
            "/v1/notifications/run-sweep",
            "/v1/feedback/{id}/response",
            "/v1/reports/expiring",
        ] {
            assert!(paths.contains_key(path), "missing path {}", path);
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("components");
        assert!(components.security_schemes.contains_key("bearerAuth"));
        assert!(components.schemas.contains_key("ErrorEnvelope"));
        assert!(components.schemas.contains_key("PaginatedStudents"));
    }
}
