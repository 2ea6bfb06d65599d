// Notifications: manual sends, resends and the on-demand expiry sweep

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        common::{Paginated, Pagination},
        notification::{CreateNotificationRequest, Notification, NotificationFilter, SweepReport},
    },
    services::notification::NotificationBatch,
    utils::{
        ApiError, ApiPath, ApiQuery, ApiResult, AuditAction, AuditLogger, ResourceType,
        ValidatedJson,
    },
};

/// GET /v1/notifications
#[utoipa::path(
    get,
    path = "/v1/notifications",
    tag = "Notifications",
    operation_id = "listNotifications",
    params(NotificationFilter, Pagination),
    responses((status = 200, description = "Notifications, newest first", body = crate::models::common::PaginatedNotifications)),
    security(("bearerAuth" = []))
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<NotificationFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Json<Paginated<Notification>>> {
    let mut conn = state.diesel_pool.get().await?;
    let (items, total) = Notification::list(&mut conn, &filter, &pagination).await?;
    Ok(Json(Paginated::new(items, total, &pagination)))
}

/// GET /v1/notifications/{id}
#[utoipa::path(
    get,
    path = "/v1/notifications/{id}",
    tag = "Notifications",
    operation_id = "getNotification",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification", body = Notification),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_notification(
    State(state): State<AppState>,
    ApiPath(notification_id): ApiPath<Uuid>,
) -> ApiResult<Json<Notification>> {
    let mut conn = state.diesel_pool.get().await?;
    let notification = Notification::find_by_id(&mut conn, notification_id)
        .await?
        .ok_or(ApiError::NotFound("Notification"))?;
    Ok(Json(notification))
}

/// Without `student_id` the notification goes to every active student
/// POST /v1/notifications
#[utoipa::path(
    post,
    path = "/v1/notifications",
    tag = "Notifications",
    operation_id = "createNotification",
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification(s) created and delivered", body = NotificationBatch),
        (status = 404, description = "Student not found", body = crate::utils::ErrorEnvelope),
        (status = 422, description = "Validation failed", body = crate::utils::ErrorEnvelope),
        (status = 502, description = "Email delivery failed", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_notification(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateNotificationRequest>,
) -> ApiResult<(StatusCode, Json<NotificationBatch>)> {
    let batch = state
        .notification_service
        .create_manual(request, auth_user.staff_id)
        .await?;

    for notification in &batch.notifications {
        AuditLogger::staff_action(
            AuditAction::Sent,
            auth_user.staff_id,
            ResourceType::Notification,
            notification.id,
        );
    }
    Ok((StatusCode::CREATED, Json(batch)))
}

/// POST /v1/notifications/{id}/resend
#[utoipa::path(
    post,
    path = "/v1/notifications/{id}/resend",
    tag = "Notifications",
    operation_id = "resendNotification",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification delivered", body = Notification),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope),
        (status = 409, description = "Notification has not failed", body = crate::utils::ErrorEnvelope),
        (status = 502, description = "Email delivery failed again", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn resend_notification(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(notification_id): ApiPath<Uuid>,
) -> ApiResult<Json<Notification>> {
    let notification = state.notification_service.resend(notification_id).await?;
    AuditLogger::staff_action(
        AuditAction::Sent,
        auth_user.staff_id,
        ResourceType::Notification,
        notification.id,
    );
    Ok(Json(notification))
}

/// DELETE /v1/notifications/{id}
#[utoipa::path(
    delete,
    path = "/v1/notifications/{id}",
    tag = "Notifications",
    operation_id = "deleteNotification",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(notification_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.diesel_pool.get().await?;
    if Notification::delete(&mut conn, notification_id).await? == 0 {
        return Err(ApiError::NotFound("Notification"));
    }
    AuditLogger::staff_action(
        AuditAction::Deleted,
        auth_user.staff_id,
        ResourceType::Notification,
        notification_id,
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Runs the plan expiry sweep now instead of waiting for the scheduler
/// POST /v1/notifications/run-sweep
#[utoipa::path(
    post,
    path = "/v1/notifications/run-sweep",
    tag = "Notifications",
    operation_id = "runExpirySweep",
    responses(
        (status = 200, description = "Sweep counts", body = SweepReport),
        (status = 403, description = "Administrators only", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn run_sweep(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<SweepReport>> {
    let report = state
        .notification_service
        .run_expiry_sweep(Utc::now().date_naive())
        .await?;
    AuditLogger::log(
        AuditAction::Sent,
        Some(auth_user.staff_id),
        ResourceType::Notification,
        None,
        Some(format!(
            "expiry sweep: {} expiring, {} expired",
            report.expiring_notified, report.expired_deactivated
        )),
    );
    Ok(Json(report))
}
