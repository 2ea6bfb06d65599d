// Exercise catalog

use axum::{extract::State, http::StatusCode, Extension, Json};
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        common::{Paginated, Pagination},
        exercise::{
            CreateExerciseRequest, Exercise, ExerciseFilter, ExerciseUpdate, NewExercise,
            UpdateExerciseRequest,
        },
    },
    utils::{
        trim_clearable_field, trim_optional_field, ApiError, ApiPath, ApiQuery, ApiResult,
        AuditAction, AuditLogger, ResourceType, ValidatedJson,
    },
};

/// GET /v1/exercises
#[utoipa::path(
    get,
    path = "/v1/exercises",
    tag = "Exercises",
    operation_id = "listExercises",
    params(ExerciseFilter, Pagination),
    responses((status = 200, description = "Exercises", body = crate::models::common::PaginatedExercises)),
    security(("bearerAuth" = []))
)]
pub async fn list_exercises(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ExerciseFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Json<Paginated<Exercise>>> {
    let mut conn = state.diesel_pool.get().await?;
    let (items, total) = Exercise::list(&mut conn, &filter, &pagination).await?;
    Ok(Json(Paginated::new(items, total, &pagination)))
}

/// GET /v1/exercises/{id}
#[utoipa::path(
    get,
    path = "/v1/exercises/{id}",
    tag = "Exercises",
    operation_id = "getExercise",
    params(("id" = Uuid, Path, description = "Exercise ID")),
    responses(
        (status = 200, description = "Exercise", body = Exercise),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_exercise(
    State(state): State<AppState>,
    ApiPath(exercise_id): ApiPath<Uuid>,
) -> ApiResult<Json<Exercise>> {
    let mut conn = state.diesel_pool.get().await?;
    let exercise = Exercise::find_by_id(&mut conn, exercise_id)
        .await?
        .ok_or(ApiError::NotFound("Exercise"))?;
    Ok(Json(exercise))
}

/// POST /v1/exercises
#[utoipa::path(
    post,
    path = "/v1/exercises",
    tag = "Exercises",
    operation_id = "createExercise",
    request_body = CreateExerciseRequest,
    responses(
        (status = 201, description = "Exercise created", body = Exercise),
        (status = 409, description = "Name already in use", body = crate::utils::ErrorEnvelope),
        (status = 422, description = "Validation failed", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_exercise(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateExerciseRequest>,
) -> ApiResult<(StatusCode, Json<Exercise>)> {
    let mut conn = state.diesel_pool.get().await?;
    let exercise = Exercise::create(
        &mut conn,
        NewExercise {
            name: request.name.trim().to_string(),
            muscle_group: request.muscle_group.trim().to_lowercase(),
            equipment: trim_optional_field(request.equipment.as_ref()),
            description: trim_optional_field(request.description.as_ref()),
            video_url: trim_optional_field(request.video_url.as_ref()),
        },
    )
    .await?;

    AuditLogger::staff_action(
        AuditAction::Created,
        auth_user.staff_id,
        ResourceType::Exercise,
        exercise.id,
    );
    Ok((StatusCode::CREATED, Json(exercise)))
}

/// PUT /v1/exercises/{id}
#[utoipa::path(
    put,
    path = "/v1/exercises/{id}",
    tag = "Exercises",
    operation_id = "updateExercise",
    params(("id" = Uuid, Path, description = "Exercise ID")),
    request_body = UpdateExerciseRequest,
    responses(
        (status = 200, description = "Exercise updated", body = Exercise),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope),
        (status = 409, description = "Name already in use", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_exercise(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(exercise_id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateExerciseRequest>,
) -> ApiResult<Json<Exercise>> {
    if let Some(url) = request.video_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        if url::Url::parse(url).is_err() {
            return Err(ApiError::field("video_url", "Invalid video URL"));
        }
    }

    let mut conn = state.diesel_pool.get().await?;
    let exercise = Exercise::update(
        &mut conn,
        exercise_id,
        ExerciseUpdate {
            name: request.name.as_deref().map(|n| n.trim().to_string()),
            muscle_group: request.muscle_group.as_deref().map(|g| g.trim().to_lowercase()),
            equipment: trim_clearable_field(request.equipment.as_ref()),
            description: trim_clearable_field(request.description.as_ref()),
            video_url: trim_clearable_field(request.video_url.as_ref()),
            updated_at: None,
        },
    )
    .await?
    .ok_or(ApiError::NotFound("Exercise"))?;

    AuditLogger::staff_action(
        AuditAction::Updated,
        auth_user.staff_id,
        ResourceType::Exercise,
        exercise.id,
    );
    Ok(Json(exercise))
}

/// DELETE /v1/exercises/{id}
#[utoipa::path(
    delete,
    path = "/v1/exercises/{id}",
    tag = "Exercises",
    operation_id = "deleteExercise",
    params(("id" = Uuid, Path, description = "Exercise ID")),
    responses(
        (status = 204, description = "Exercise deleted"),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope),
        (status = 409, description = "Exercise is used by templates or logs", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_exercise(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(exercise_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.diesel_pool.get().await?;
    Exercise::find_by_id(&mut conn, exercise_id)
        .await?
        .ok_or(ApiError::NotFound("Exercise"))?;

    if Exercise::is_in_use(&mut conn, exercise_id).await? {
        return Err(ApiError::Conflict(
            "Exercise is used by workout templates or logs".to_string(),
        ));
    }

    Exercise::delete(&mut conn, exercise_id).await?;
    AuditLogger::staff_action(
        AuditAction::Deleted,
        auth_user.staff_id,
        ResourceType::Exercise,
        exercise_id,
    );
    Ok(StatusCode::NO_CONTENT)
}
