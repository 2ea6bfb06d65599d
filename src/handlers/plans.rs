// Subscription plan catalog

use axum::{extract::State, http::StatusCode, Extension, Json};
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::plan::{CreatePlanRequest, NewPlan, Plan, PlanFilter, PlanUpdate, UpdatePlanRequest},
    utils::{
        trim_clearable_field, trim_optional_field, ApiError, ApiPath, ApiQuery, ApiResult,
        AuditAction, AuditLogger, ResourceType, ValidatedJson,
    },
};

/// GET /v1/plans
#[utoipa::path(
    get,
    path = "/v1/plans",
    tag = "Plans",
    operation_id = "listPlans",
    params(PlanFilter),
    responses((status = 200, description = "Plans ordered by price", body = Vec<Plan>)),
    security(("bearerAuth" = []))
)]
pub async fn list_plans(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<PlanFilter>,
) -> ApiResult<Json<Vec<Plan>>> {
    let mut conn = state.diesel_pool.get().await?;
    Ok(Json(Plan::list(&mut conn, &filter).await?))
}

/// GET /v1/plans/{id}
#[utoipa::path(
    get,
    path = "/v1/plans/{id}",
    tag = "Plans",
    operation_id = "getPlan",
    params(("id" = Uuid, Path, description = "Plan ID")),
    responses(
        (status = 200, description = "Plan", body = Plan),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_plan(
    State(state): State<AppState>,
    ApiPath(plan_id): ApiPath<Uuid>,
) -> ApiResult<Json<Plan>> {
    let mut conn = state.diesel_pool.get().await?;
    let plan = Plan::find_by_id(&mut conn, plan_id)
        .await?
        .ok_or(ApiError::NotFound("Plan"))?;
    Ok(Json(plan))
}

/// POST /v1/plans
#[utoipa::path(
    post,
    path = "/v1/plans",
    tag = "Plans",
    operation_id = "createPlan",
    request_body = CreatePlanRequest,
    responses(
        (status = 201, description = "Plan created", body = Plan),
        (status = 409, description = "Name already in use", body = crate::utils::ErrorEnvelope),
        (status = 422, description = "Validation failed", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_plan(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreatePlanRequest>,
) -> ApiResult<(StatusCode, Json<Plan>)> {
    let mut conn = state.diesel_pool.get().await?;
    let plan = Plan::create(
        &mut conn,
        NewPlan {
            name: request.name.trim().to_string(),
            description: trim_optional_field(request.description.as_ref()),
            price_cents: request.price_cents,
            duration_months: request.duration_months,
            is_active: request.is_active,
        },
    )
    .await?;

    AuditLogger::staff_action(AuditAction::Created, auth_user.staff_id, ResourceType::Plan, plan.id);
    Ok((StatusCode::CREATED, Json(plan)))
}

/// PUT /v1/plans/{id}
#[utoipa::path(
    put,
    path = "/v1/plans/{id}",
    tag = "Plans",
    operation_id = "updatePlan",
    params(("id" = Uuid, Path, description = "Plan ID")),
    request_body = UpdatePlanRequest,
    responses(
        (status = 200, description = "Plan updated", body = Plan),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope),
        (status = 409, description = "Name already in use", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_plan(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(plan_id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdatePlanRequest>,
) -> ApiResult<Json<Plan>> {
    let mut conn = state.diesel_pool.get().await?;
    let plan = Plan::update(
        &mut conn,
        plan_id,
        PlanUpdate {
            name: request.name.as_deref().map(|n| n.trim().to_string()),
            description: trim_clearable_field(request.description.as_ref()),
            price_cents: request.price_cents,
            duration_months: request.duration_months,
            is_active: request.is_active,
            updated_at: None,
        },
    )
    .await?
    .ok_or(ApiError::NotFound("Plan"))?;

    AuditLogger::staff_action(AuditAction::Updated, auth_user.staff_id, ResourceType::Plan, plan.id);
    Ok(Json(plan))
}

/// DELETE /v1/plans/{id}
#[utoipa::path(
    delete,
    path = "/v1/plans/{id}",
    tag = "Plans",
    operation_id = "deletePlan",
    params(("id" = Uuid, Path, description = "Plan ID")),
    responses(
        (status = 204, description = "Plan deleted"),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope),
        (status = 409, description = "Plan is referenced by students or payments", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_plan(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(plan_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.diesel_pool.get().await?;
    Plan::find_by_id(&mut conn, plan_id)
        .await?
        .ok_or(ApiError::NotFound("Plan"))?;

    if Plan::is_referenced(&mut conn, plan_id).await? {
        return Err(ApiError::Conflict(
            "Plan is in use by students or payments; deactivate it instead".to_string(),
        ));
    }

    Plan::delete(&mut conn, plan_id).await?;
    AuditLogger::staff_action(AuditAction::Deleted, auth_user.staff_id, ResourceType::Plan, plan_id);
    Ok(StatusCode::NO_CONTENT)
}
