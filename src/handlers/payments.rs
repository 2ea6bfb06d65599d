// Payment recording and cancellation

use axum::{extract::State, http::StatusCode, Extension, Json};
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        common::{Paginated, Pagination},
        payment::{
            CancelPaymentRequest, CreatePaymentRequest, Payment, PaymentFilter, PaymentResponse,
        },
    },
    services::payment::PaymentService,
    utils::{
        ApiError, ApiPath, ApiQuery, ApiResult, AuditAction, AuditLogger, ResourceType,
        ValidatedJson,
    },
};

/// GET /v1/payments
#[utoipa::path(
    get,
    path = "/v1/payments",
    tag = "Payments",
    operation_id = "listPayments",
    params(PaymentFilter, Pagination),
    responses(
        (status = 200, description = "Payments, newest first", body = crate::models::common::PaginatedPayments),
        (status = 422, description = "Invalid date range", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_payments(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<PaymentFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Json<Paginated<PaymentResponse>>> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(ApiError::field("from", "`from` must not be after `to`"));
        }
    }
    let mut conn = state.diesel_pool.get().await?;
    let (items, total) = Payment::list(&mut conn, &filter, &pagination).await?;
    Ok(Json(Paginated::new(items, total, &pagination)))
}

/// GET /v1/payments/{id}
#[utoipa::path(
    get,
    path = "/v1/payments/{id}",
    tag = "Payments",
    operation_id = "getPayment",
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment", body = PaymentResponse),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_payment(
    State(state): State<AppState>,
    ApiPath(payment_id): ApiPath<Uuid>,
) -> ApiResult<Json<PaymentResponse>> {
    let mut conn = state.diesel_pool.get().await?;
    let payment = Payment::find_by_id(&mut conn, payment_id)
        .await?
        .ok_or(ApiError::NotFound("Payment"))?;
    Ok(Json(payment))
}

/// Records a payment and renews the student's plan in one transaction.
/// The receipt email is sent in the background after commit.
/// POST /v1/payments
#[utoipa::path(
    post,
    path = "/v1/payments",
    tag = "Payments",
    operation_id = "createPayment",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentResponse),
        (status = 404, description = "Student or plan not found", body = crate::utils::ErrorEnvelope),
        (status = 422, description = "Validation failed or plan inactive", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreatePaymentRequest>,
) -> ApiResult<(StatusCode, Json<PaymentResponse>)> {
    let send_receipt = request.send_receipt.unwrap_or(true);
    let recorded = PaymentService::record(&state.diesel_pool, request, auth_user.staff_id).await?;

    AuditLogger::staff_action(
        AuditAction::Created,
        auth_user.staff_id,
        ResourceType::Payment,
        recorded.payment.id,
    );

    let response = PaymentResponse {
        payment: recorded.payment.clone(),
        plan_name: recorded.plan.name.clone(),
    };

    if send_receipt {
        let notifications = state.notification_service.clone();
        tokio::spawn(async move {
            notifications
                .send_payment_receipt(&recorded.student, &recorded.plan, &recorded.payment)
                .await;
        });
    }

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /v1/payments/{id}/cancel
#[utoipa::path(
    post,
    path = "/v1/payments/{id}/cancel",
    tag = "Payments",
    operation_id = "cancelPayment",
    params(("id" = Uuid, Path, description = "Payment ID")),
    request_body = CancelPaymentRequest,
    responses(
        (status = 200, description = "Payment cancelled", body = Payment),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope),
        (status = 409, description = "Payment already cancelled", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn cancel_payment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(payment_id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<CancelPaymentRequest>,
) -> ApiResult<Json<Payment>> {
    let details = request.reason.clone();
    let payment = PaymentService::cancel(&state.diesel_pool, payment_id, request).await?;

    AuditLogger::log(
        AuditAction::Cancelled,
        Some(auth_user.staff_id),
        ResourceType::Payment,
        Some(payment.id),
        details,
    );
    Ok(Json(payment))
}
