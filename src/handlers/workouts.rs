// Workout templates and workout logs

use axum::{extract::State, http::StatusCode, Extension, Json};
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        common::{Paginated, Pagination},
        workout_log::{CreateWorkoutLogRequest, WorkoutLog, WorkoutLogDetail, WorkoutLogFilter},
        workout_template::{
            CreateWorkoutTemplateRequest, UpdateWorkoutTemplateRequest, WorkoutTemplate,
            WorkoutTemplateDetail, WorkoutTemplateFilter,
        },
    },
    services::workout::WorkoutService,
    utils::{
        ApiError, ApiPath, ApiQuery, ApiResult, AuditAction, AuditLogger, ResourceType,
        ValidatedJson,
    },
};

// =============================================================================
// TEMPLATES
// =============================================================================

/// GET /v1/workout-templates
#[utoipa::path(
    get,
    path = "/v1/workout-templates",
    tag = "Workout templates",
    operation_id = "listWorkoutTemplates",
    params(WorkoutTemplateFilter, Pagination),
    responses((status = 200, description = "Templates", body = crate::models::common::PaginatedWorkoutTemplates)),
    security(("bearerAuth" = []))
)]
pub async fn list_templates(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<WorkoutTemplateFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Json<Paginated<WorkoutTemplate>>> {
    let mut conn = state.diesel_pool.get().await?;
    let (items, total) = WorkoutTemplate::list(&mut conn, &filter, &pagination).await?;
    Ok(Json(Paginated::new(items, total, &pagination)))
}

/// GET /v1/workout-templates/{id}
#[utoipa::path(
    get,
    path = "/v1/workout-templates/{id}",
    tag = "Workout templates",
    operation_id = "getWorkoutTemplate",
    params(("id" = Uuid, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Template with ordered items", body = WorkoutTemplateDetail),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_template(
    State(state): State<AppState>,
    ApiPath(template_id): ApiPath<Uuid>,
) -> ApiResult<Json<WorkoutTemplateDetail>> {
    let mut conn = state.diesel_pool.get().await?;
    Ok(Json(WorkoutService::template_detail(&mut conn, template_id).await?))
}

/// POST /v1/workout-templates
#[utoipa::path(
    post,
    path = "/v1/workout-templates",
    tag = "Workout templates",
    operation_id = "createWorkoutTemplate",
    request_body = CreateWorkoutTemplateRequest,
    responses(
        (status = 201, description = "Template created", body = WorkoutTemplateDetail),
        (status = 422, description = "Validation failed or unknown exercise", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_template(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateWorkoutTemplateRequest>,
) -> ApiResult<(StatusCode, Json<WorkoutTemplateDetail>)> {
    let detail =
        WorkoutService::create_template(&state.diesel_pool, request, auth_user.staff_id).await?;
    AuditLogger::staff_action(
        AuditAction::Created,
        auth_user.staff_id,
        ResourceType::WorkoutTemplate,
        detail.template.id,
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// PUT /v1/workout-templates/{id}
#[utoipa::path(
    put,
    path = "/v1/workout-templates/{id}",
    tag = "Workout templates",
    operation_id = "updateWorkoutTemplate",
    params(("id" = Uuid, Path, description = "Template ID")),
    request_body = UpdateWorkoutTemplateRequest,
    responses(
        (status = 200, description = "Template updated", body = WorkoutTemplateDetail),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope),
        (status = 422, description = "Validation failed or unknown exercise", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_template(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(template_id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateWorkoutTemplateRequest>,
) -> ApiResult<Json<WorkoutTemplateDetail>> {
    let detail = WorkoutService::update_template(&state.diesel_pool, template_id, request).await?;
    AuditLogger::staff_action(
        AuditAction::Updated,
        auth_user.staff_id,
        ResourceType::WorkoutTemplate,
        template_id,
    );
    Ok(Json(detail))
}

/// Logs that used the template keep their entries; only the link is cleared
/// DELETE /v1/workout-templates/{id}
#[utoipa::path(
    delete,
    path = "/v1/workout-templates/{id}",
    tag = "Workout templates",
    operation_id = "deleteWorkoutTemplate",
    params(("id" = Uuid, Path, description = "Template ID")),
    responses(
        (status = 204, description = "Template deleted"),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_template(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(template_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.diesel_pool.get().await?;
    if WorkoutTemplate::delete(&mut conn, template_id).await? == 0 {
        return Err(ApiError::NotFound("Workout template"));
    }
    AuditLogger::staff_action(
        AuditAction::Deleted,
        auth_user.staff_id,
        ResourceType::WorkoutTemplate,
        template_id,
    );
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// LOGS
// =============================================================================

/// GET /v1/workout-logs
#[utoipa::path(
    get,
    path = "/v1/workout-logs",
    tag = "Workout logs",
    operation_id = "listWorkoutLogs",
    params(WorkoutLogFilter, Pagination),
    responses(
        (status = 200, description = "Logs, most recent first", body = crate::models::common::PaginatedWorkoutLogs),
        (status = 422, description = "Invalid date range", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_logs(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<WorkoutLogFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Json<Paginated<WorkoutLog>>> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(ApiError::field("from", "`from` must not be after `to`"));
        }
    }
    let mut conn = state.diesel_pool.get().await?;
    let (items, total) = WorkoutLog::list(&mut conn, &filter, &pagination).await?;
    Ok(Json(Paginated::new(items, total, &pagination)))
}

/// GET /v1/workout-logs/{id}
#[utoipa::path(
    get,
    path = "/v1/workout-logs/{id}",
    tag = "Workout logs",
    operation_id = "getWorkoutLog",
    params(("id" = Uuid, Path, description = "Log ID")),
    responses(
        (status = 200, description = "Log with entries", body = WorkoutLogDetail),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_log(
    State(state): State<AppState>,
    ApiPath(log_id): ApiPath<Uuid>,
) -> ApiResult<Json<WorkoutLogDetail>> {
    let mut conn = state.diesel_pool.get().await?;
    Ok(Json(WorkoutService::log_detail(&mut conn, log_id).await?))
}

/// POST /v1/workout-logs
#[utoipa::path(
    post,
    path = "/v1/workout-logs",
    tag = "Workout logs",
    operation_id = "createWorkoutLog",
    request_body = CreateWorkoutLogRequest,
    responses(
        (status = 201, description = "Workout logged", body = WorkoutLogDetail),
        (status = 404, description = "Student or template not found", body = crate::utils::ErrorEnvelope),
        (status = 422, description = "Validation failed or unknown exercise", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_log(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateWorkoutLogRequest>,
) -> ApiResult<(StatusCode, Json<WorkoutLogDetail>)> {
    let detail = WorkoutService::create_log(&state.diesel_pool, request, auth_user.staff_id).await?;
    AuditLogger::staff_action(
        AuditAction::Created,
        auth_user.staff_id,
        ResourceType::WorkoutLog,
        detail.log.id,
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// DELETE /v1/workout-logs/{id}
#[utoipa::path(
    delete,
    path = "/v1/workout-logs/{id}",
    tag = "Workout logs",
    operation_id = "deleteWorkoutLog",
    params(("id" = Uuid, Path, description = "Log ID")),
    responses(
        (status = 204, description = "Log deleted"),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_log(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(log_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.diesel_pool.get().await?;
    if WorkoutLog::delete(&mut conn, log_id).await? == 0 {
        return Err(ApiError::NotFound("Workout log"));
    }
    AuditLogger::staff_action(
        AuditAction::Deleted,
        auth_user.staff_id,
        ResourceType::WorkoutLog,
        log_id,
    );
    Ok(StatusCode::NO_CONTENT)
}
