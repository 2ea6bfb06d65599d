// Student records, their history and the enrollment term document

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use diesel_async::AsyncPgConnection;
use tracing::info;
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        common::{Paginated, Pagination},
        feedback::{Feedback, FeedbackFilter},
        payment::{Payment, PaymentFilter, PaymentResponse},
        plan::Plan,
        student::{
            CreateStudentRequest, NewStudent, Student, StudentFilter, StudentResponse,
            StudentStatus, StudentUpdate, UpdateStudentRequest,
        },
        workout_log::{WorkoutLog, WorkoutLogFilter},
    },
    services::enrollment_term::EnrollmentTermData,
    utils::{
        is_valid_cpf, normalize_cpf, normalize_email, trim_clearable_field, trim_optional_field,
        ApiError, ApiPath, ApiQuery, ApiResult, AuditAction, AuditLogger, ResourceType,
        ValidatedJson,
    },
};

async fn ensure_plan_exists(conn: &mut AsyncPgConnection, plan_id: Option<Uuid>) -> ApiResult<()> {
    if let Some(plan_id) = plan_id {
        Plan::find_by_id(conn, plan_id)
            .await?
            .ok_or(ApiError::NotFound("Plan"))?;
    }
    Ok(())
}

async fn ensure_student_exists(conn: &mut AsyncPgConnection, student_id: Uuid) -> ApiResult<()> {
    if Student::exists(conn, student_id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound("Student"))
    }
}

/// `Some("")` clears the CPF; anything else must be a valid CPF
fn cpf_change(cpf: Option<&String>) -> ApiResult<Option<Option<String>>> {
    match cpf.map(|c| c.trim()) {
        None => Ok(None),
        Some("") => Ok(Some(None)),
        Some(cpf) if is_valid_cpf(cpf) => Ok(Some(Some(normalize_cpf(cpf)))),
        Some(_) => Err(ApiError::field("cpf", "Invalid CPF")),
    }
}

/// GET /v1/students
#[utoipa::path(
    get,
    path = "/v1/students",
    tag = "Students",
    operation_id = "listStudents",
    params(StudentFilter, Pagination),
    responses(
        (status = 200, description = "Students", body = crate::models::common::PaginatedStudents)
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_students(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<StudentFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Json<Paginated<StudentResponse>>> {
    let mut conn = state.diesel_pool.get().await?;
    let (items, total) = Student::list(&mut conn, &filter, &pagination).await?;
    Ok(Json(Paginated::new(items, total, &pagination)))
}

/// GET /v1/students/{id}
#[utoipa::path(
    get,
    path = "/v1/students/{id}",
    tag = "Students",
    operation_id = "getStudent",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student with current plan", body = StudentResponse),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_student(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<Uuid>,
) -> ApiResult<Json<StudentResponse>> {
    let mut conn = state.diesel_pool.get().await?;
    let (student, plan) = Student::find_with_plan(&mut conn, student_id)
        .await?
        .ok_or(ApiError::NotFound("Student"))?;
    Ok(Json(student.into_response(plan.as_ref())))
}

/// POST /v1/students
#[utoipa::path(
    post,
    path = "/v1/students",
    tag = "Students",
    operation_id = "createStudent",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created", body = StudentResponse),
        (status = 404, description = "Plan not found", body = crate::utils::ErrorEnvelope),
        (status = 409, description = "Email or CPF already registered", body = crate::utils::ErrorEnvelope),
        (status = 422, description = "Validation failed", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_student(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateStudentRequest>,
) -> ApiResult<(StatusCode, Json<StudentResponse>)> {
    let mut conn = state.diesel_pool.get().await?;
    ensure_plan_exists(&mut conn, request.plan_id).await?;

    let student = Student::create(
        &mut conn,
        NewStudent {
            full_name: request.full_name.trim().to_string(),
            email: normalize_email(&request.email),
            phone: trim_optional_field(request.phone.as_ref()),
            cpf: request
                .cpf
                .as_deref()
                .map(normalize_cpf)
                .filter(|c| !c.is_empty()),
            birth_date: request.birth_date,
            address: trim_optional_field(request.address.as_ref()),
            emergency_contact: trim_optional_field(request.emergency_contact.as_ref()),
            plan_id: request.plan_id,
            status: StudentStatus::Active.as_str().to_string(),
            enrollment_date: request
                .enrollment_date
                .unwrap_or_else(|| Utc::now().date_naive()),
            notes: trim_optional_field(request.notes.as_ref()),
        },
    )
    .await?;

    AuditLogger::staff_action(
        AuditAction::Created,
        auth_user.staff_id,
        ResourceType::Student,
        student.id,
    );
    info!(student_id = %student.id, "Student created");

    let (student, plan) = Student::find_with_plan(&mut conn, student.id)
        .await?
        .ok_or(ApiError::NotFound("Student"))?;
    Ok((
        StatusCode::CREATED,
        Json(student.into_response(plan.as_ref())),
    ))
}

/// PUT /v1/students/{id}
#[utoipa::path(
    put,
    path = "/v1/students/{id}",
    tag = "Students",
    operation_id = "updateStudent",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Student updated", body = StudentResponse),
        (status = 404, description = "Student or plan not found", body = crate::utils::ErrorEnvelope),
        (status = 409, description = "Email or CPF already registered", body = crate::utils::ErrorEnvelope),
        (status = 422, description = "Validation failed", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_student(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(student_id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateStudentRequest>,
) -> ApiResult<Json<StudentResponse>> {
    let cpf = cpf_change(request.cpf.as_ref())?;

    let mut conn = state.diesel_pool.get().await?;
    if let Some(plan_id) = request.plan_id {
        ensure_plan_exists(&mut conn, plan_id).await?;
    }

    let changes = StudentUpdate {
        full_name: request.full_name.as_deref().map(|n| n.trim().to_string()),
        email: request.email.as_deref().map(normalize_email),
        phone: trim_clearable_field(request.phone.as_ref()),
        cpf,
        birth_date: request.birth_date,
        address: trim_clearable_field(request.address.as_ref()),
        emergency_contact: trim_clearable_field(request.emergency_contact.as_ref()),
        plan_id: request.plan_id,
        status: request.status.map(|s| s.as_str().to_string()),
        enrollment_date: request.enrollment_date,
        plan_expires_at: None,
        notes: trim_clearable_field(request.notes.as_ref()),
        updated_at: None,
    };
    Student::update(&mut conn, student_id, changes)
        .await?
        .ok_or(ApiError::NotFound("Student"))?;

    AuditLogger::staff_action(
        AuditAction::Updated,
        auth_user.staff_id,
        ResourceType::Student,
        student_id,
    );

    let (student, plan) = Student::find_with_plan(&mut conn, student_id)
        .await?
        .ok_or(ApiError::NotFound("Student"))?;
    Ok(Json(student.into_response(plan.as_ref())))
}

/// Hard delete; refused while the student has payments on record
/// DELETE /v1/students/{id}
#[utoipa::path(
    delete,
    path = "/v1/students/{id}",
    tag = "Students",
    operation_id = "deleteStudent",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope),
        (status = 409, description = "Student has payments", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_student(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(student_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.diesel_pool.get().await?;
    ensure_student_exists(&mut conn, student_id).await?;

    if Student::has_payments(&mut conn, student_id).await? {
        return Err(ApiError::Conflict(
            "Student has payments on record; set the status to inactive instead".to_string(),
        ));
    }

    Student::delete(&mut conn, student_id).await?;
    AuditLogger::staff_action(
        AuditAction::Deleted,
        auth_user.staff_id,
        ResourceType::Student,
        student_id,
    );
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/students/{id}/payments
#[utoipa::path(
    get,
    path = "/v1/students/{id}/payments",
    tag = "Students",
    operation_id = "listStudentPayments",
    params(("id" = Uuid, Path, description = "Student ID"), Pagination),
    responses(
        (status = 200, description = "Payment history", body = crate::models::common::PaginatedPayments),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn student_payments(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<Uuid>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Json<Paginated<PaymentResponse>>> {
    let mut conn = state.diesel_pool.get().await?;
    ensure_student_exists(&mut conn, student_id).await?;

    let filter = PaymentFilter {
        student_id: Some(student_id),
        ..Default::default()
    };
    let (items, total) = Payment::list(&mut conn, &filter, &pagination).await?;
    Ok(Json(Paginated::new(items, total, &pagination)))
}

/// GET /v1/students/{id}/workout-logs
#[utoipa::path(
    get,
    path = "/v1/students/{id}/workout-logs",
    tag = "Students",
    operation_id = "listStudentWorkoutLogs",
    params(("id" = Uuid, Path, description = "Student ID"), Pagination),
    responses(
        (status = 200, description = "Workout history", body = crate::models::common::PaginatedWorkoutLogs),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn student_workout_logs(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<Uuid>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Json<Paginated<WorkoutLog>>> {
    let mut conn = state.diesel_pool.get().await?;
    ensure_student_exists(&mut conn, student_id).await?;

    let filter = WorkoutLogFilter {
        student_id: Some(student_id),
        ..Default::default()
    };
    let (items, total) = WorkoutLog::list(&mut conn, &filter, &pagination).await?;
    Ok(Json(Paginated::new(items, total, &pagination)))
}

/// GET /v1/students/{id}/feedback
#[utoipa::path(
    get,
    path = "/v1/students/{id}/feedback",
    tag = "Students",
    operation_id = "listStudentFeedback",
    params(("id" = Uuid, Path, description = "Student ID"), Pagination),
    responses(
        (status = 200, description = "Feedback left by the student", body = crate::models::common::PaginatedFeedback),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn student_feedback(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<Uuid>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Json<Paginated<Feedback>>> {
    let mut conn = state.diesel_pool.get().await?;
    ensure_student_exists(&mut conn, student_id).await?;

    let filter = FeedbackFilter {
        student_id: Some(student_id),
        ..Default::default()
    };
    let (items, total) = Feedback::list(&mut conn, &filter, &pagination).await?;
    Ok(Json(Paginated::new(items, total, &pagination)))
}

/// Enrollment term as a PDF attachment
/// GET /v1/students/{id}/enrollment-term
#[utoipa::path(
    get,
    path = "/v1/students/{id}/enrollment-term",
    tag = "Students",
    operation_id = "getEnrollmentTerm",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf", body = Vec<u8>),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn enrollment_term(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(student_id): ApiPath<Uuid>,
) -> ApiResult<Response> {
    let (student, plan) = {
        let mut conn = state.diesel_pool.get().await?;
        Student::find_with_plan(&mut conn, student_id)
            .await?
            .ok_or(ApiError::NotFound("Student"))?
    };

    let terms = state.enrollment_terms.clone();
    let data = EnrollmentTermData::new(
        &student,
        plan.as_ref(),
        terms.academy(),
        &auth_user.name,
        Utc::now().date_naive(),
    );
    let pdf = tokio::task::spawn_blocking(move || terms.generate(&data))
        .await
        .map_err(|e| ApiError::Internal(format!("document task failed: {}", e)))??;

    AuditLogger::staff_action(
        AuditAction::DocumentIssued,
        auth_user.staff_id,
        ResourceType::EnrollmentTerm,
        student.id,
    );

    let disposition = format!(
        "attachment; filename=\"termo-matricula-{}.pdf\"",
        student.id
    );
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpf_change() {
        assert!(matches!(cpf_change(None), Ok(None)));
        assert!(matches!(cpf_change(Some(&" ".to_string())), Ok(Some(None))));
        assert_eq!(
            cpf_change(Some(&"529.982.247-25".to_string())).unwrap(),
            Some(Some("52998224725".to_string()))
        );
        assert!(matches!(
            cpf_change(Some(&"111.111.111-11".to_string())),
            Err(ApiError::Validation(_))
        ));
    }
}
