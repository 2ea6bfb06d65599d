// Student feedback and staff responses

use axum::{extract::State, http::StatusCode, Extension, Json};
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        common::{Paginated, Pagination},
        feedback::{
            CreateFeedbackRequest, Feedback, FeedbackFilter, FeedbackStatus, NewFeedback,
            RespondFeedbackRequest,
        },
        student::Student,
    },
    utils::{
        ApiError, ApiPath, ApiQuery, ApiResult, AuditAction, AuditLogger, ResourceType,
        ValidatedJson,
    },
};

/// GET /v1/feedback
#[utoipa::path(
    get,
    path = "/v1/feedback",
    tag = "Feedback",
    operation_id = "listFeedback",
    params(FeedbackFilter, Pagination),
    responses((status = 200, description = "Feedback, newest first", body = crate::models::common::PaginatedFeedback)),
    security(("bearerAuth" = []))
)]
pub async fn list_feedback(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<FeedbackFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Json<Paginated<Feedback>>> {
    let mut conn = state.diesel_pool.get().await?;
    let (items, total) = Feedback::list(&mut conn, &filter, &pagination).await?;
    Ok(Json(Paginated::new(items, total, &pagination)))
}

/// GET /v1/feedback/{id}
#[utoipa::path(
    get,
    path = "/v1/feedback/{id}",
    tag = "Feedback",
    operation_id = "getFeedback",
    params(("id" = Uuid, Path, description = "Feedback ID")),
    responses(
        (status = 200, description = "Feedback", body = Feedback),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_feedback(
    State(state): State<AppState>,
    ApiPath(feedback_id): ApiPath<Uuid>,
) -> ApiResult<Json<Feedback>> {
    let mut conn = state.diesel_pool.get().await?;
    let feedback = Feedback::find_by_id(&mut conn, feedback_id)
        .await?
        .ok_or(ApiError::NotFound("Feedback"))?;
    Ok(Json(feedback))
}

/// POST /v1/feedback
#[utoipa::path(
    post,
    path = "/v1/feedback",
    tag = "Feedback",
    operation_id = "createFeedback",
    request_body = CreateFeedbackRequest,
    responses(
        (status = 201, description = "Feedback recorded", body = Feedback),
        (status = 404, description = "Student not found", body = crate::utils::ErrorEnvelope),
        (status = 422, description = "Validation failed", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_feedback(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateFeedbackRequest>,
) -> ApiResult<(StatusCode, Json<Feedback>)> {
    let mut conn = state.diesel_pool.get().await?;
    if !Student::exists(&mut conn, request.student_id).await? {
        return Err(ApiError::NotFound("Student"));
    }

    let feedback = Feedback::create(
        &mut conn,
        NewFeedback {
            student_id: request.student_id,
            category: request.category.as_str().to_string(),
            rating: request.rating,
            message: request.message.trim().to_string(),
            status: FeedbackStatus::Open.as_str().to_string(),
        },
    )
    .await?;

    AuditLogger::staff_action(
        AuditAction::Created,
        auth_user.staff_id,
        ResourceType::Feedback,
        feedback.id,
    );
    Ok((StatusCode::CREATED, Json(feedback)))
}

/// PUT /v1/feedback/{id}/response
#[utoipa::path(
    put,
    path = "/v1/feedback/{id}/response",
    tag = "Feedback",
    operation_id = "respondFeedback",
    params(("id" = Uuid, Path, description = "Feedback ID")),
    request_body = RespondFeedbackRequest,
    responses(
        (status = 200, description = "Response saved", body = Feedback),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope),
        (status = 422, description = "Validation failed", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn respond_feedback(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(feedback_id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<RespondFeedbackRequest>,
) -> ApiResult<Json<Feedback>> {
    let status = request.status.unwrap_or(FeedbackStatus::Reviewed);
    if status == FeedbackStatus::Open {
        return Err(ApiError::field(
            "status",
            "A responded feedback must be reviewed or resolved",
        ));
    }

    let mut conn = state.diesel_pool.get().await?;
    let feedback = Feedback::respond(
        &mut conn,
        feedback_id,
        request.response.trim().to_string(),
        status,
        auth_user.staff_id,
    )
    .await?
    .ok_or(ApiError::NotFound("Feedback"))?;

    AuditLogger::staff_action(
        AuditAction::Updated,
        auth_user.staff_id,
        ResourceType::Feedback,
        feedback.id,
    );
    Ok(Json(feedback))
}

/// DELETE /v1/feedback/{id}
#[utoipa::path(
    delete,
    path = "/v1/feedback/{id}",
    tag = "Feedback",
    operation_id = "deleteFeedback",
    params(("id" = Uuid, Path, description = "Feedback ID")),
    responses(
        (status = 204, description = "Feedback deleted"),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_feedback(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(feedback_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.diesel_pool.get().await?;
    if Feedback::delete(&mut conn, feedback_id).await? == 0 {
        return Err(ApiError::NotFound("Feedback"));
    }
    AuditLogger::staff_action(
        AuditAction::Deleted,
        auth_user.staff_id,
        ResourceType::Feedback,
        feedback_id,
    );
    Ok(StatusCode::NO_CONTENT)
}
