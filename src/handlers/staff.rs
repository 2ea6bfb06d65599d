// Staff account management (administrators only)

use axum::{extract::State, http::StatusCode, Extension, Json};
use tracing::info;
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        common::{Paginated, Pagination},
        staff::{
            CreateStaffRequest, NewStaff, Staff, StaffFilter, StaffResponse, StaffUpdate,
            UpdateStaffRequest,
        },
    },
    utils::{
        hash_password, normalize_email, ApiError, ApiPath, ApiQuery, ApiResult, AuditAction,
        AuditLogger, ResourceType, ValidatedJson,
    },
};

fn check_password_length(state: &AppState, password: &str) -> ApiResult<()> {
    let min_length = state.config.security.min_password_length;
    if password.len() < min_length {
        return Err(ApiError::field(
            "password",
            format!("Password must be at least {} characters", min_length),
        ));
    }
    Ok(())
}

/// GET /v1/staff
#[utoipa::path(
    get,
    path = "/v1/staff",
    tag = "Staff",
    operation_id = "listStaff",
    params(StaffFilter, Pagination),
    responses(
        (status = 200, description = "Staff accounts", body = crate::models::common::PaginatedStaff),
        (status = 403, description = "Administrators only", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_staff(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<StaffFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Json<Paginated<StaffResponse>>> {
    let mut conn = state.diesel_pool.get().await?;
    let (items, total) = Staff::list(&mut conn, &filter, &pagination).await?;
    Ok(Json(
        Paginated::new(items, total, &pagination).map(StaffResponse::from),
    ))
}

/// GET /v1/staff/{id}
#[utoipa::path(
    get,
    path = "/v1/staff/{id}",
    tag = "Staff",
    operation_id = "getStaff",
    params(("id" = Uuid, Path, description = "Staff ID")),
    responses(
        (status = 200, description = "Staff account", body = StaffResponse),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_staff(
    State(state): State<AppState>,
    ApiPath(staff_id): ApiPath<Uuid>,
) -> ApiResult<Json<StaffResponse>> {
    let mut conn = state.diesel_pool.get().await?;
    let staff = Staff::find_by_id(&mut conn, staff_id)
        .await?
        .ok_or(ApiError::NotFound("Staff"))?;
    Ok(Json(staff.into()))
}

/// POST /v1/staff
#[utoipa::path(
    post,
    path = "/v1/staff",
    tag = "Staff",
    operation_id = "createStaff",
    request_body = CreateStaffRequest,
    responses(
        (status = 201, description = "Staff account created", body = StaffResponse),
        (status = 409, description = "Email already in use", body = crate::utils::ErrorEnvelope),
        (status = 422, description = "Validation failed", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_staff(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateStaffRequest>,
) -> ApiResult<(StatusCode, Json<StaffResponse>)> {
    check_password_length(&state, &request.password)?;
    let password_hash = hash_password(&request.password, state.config.security.bcrypt_cost).await?;

    let mut conn = state.diesel_pool.get().await?;
    let staff = Staff::create(
        &mut conn,
        NewStaff {
            full_name: request.full_name.trim().to_string(),
            email: normalize_email(&request.email),
            password_hash,
            role: request.role.as_str().to_string(),
        },
    )
    .await?;

    AuditLogger::staff_action(
        AuditAction::Created,
        auth_user.staff_id,
        ResourceType::Staff,
        staff.id,
    );
    info!(staff_id = %staff.id, role = %staff.role, "Staff account created");
    Ok((StatusCode::CREATED, Json(staff.into())))
}

/// PUT /v1/staff/{id}
#[utoipa::path(
    put,
    path = "/v1/staff/{id}",
    tag = "Staff",
    operation_id = "updateStaff",
    params(("id" = Uuid, Path, description = "Staff ID")),
    request_body = UpdateStaffRequest,
    responses(
        (status = 200, description = "Staff account updated", body = StaffResponse),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope),
        (status = 409, description = "Email in use or self-deactivation", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_staff(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(staff_id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateStaffRequest>,
) -> ApiResult<Json<StaffResponse>> {
    if staff_id == auth_user.staff_id && request.is_active == Some(false) {
        return Err(ApiError::Conflict(
            "You cannot deactivate your own account".to_string(),
        ));
    }

    let password_hash = match request.password.as_deref() {
        Some(password) => {
            check_password_length(&state, password)?;
            Some(hash_password(password, state.config.security.bcrypt_cost).await?)
        },
        None => None,
    };

    let mut conn = state.diesel_pool.get().await?;
    let staff = Staff::update(
        &mut conn,
        staff_id,
        StaffUpdate {
            full_name: request.full_name.as_deref().map(|n| n.trim().to_string()),
            email: request.email.as_deref().map(normalize_email),
            password_hash,
            role: request.role.map(|r| r.as_str().to_string()),
            is_active: request.is_active,
            updated_at: None,
        },
    )
    .await?
    .ok_or(ApiError::NotFound("Staff"))?;

    AuditLogger::staff_action(
        AuditAction::Updated,
        auth_user.staff_id,
        ResourceType::Staff,
        staff.id,
    );
    Ok(Json(staff.into()))
}

/// Soft delete: the account is kept but can no longer log in
/// DELETE /v1/staff/{id}
#[utoipa::path(
    delete,
    path = "/v1/staff/{id}",
    tag = "Staff",
    operation_id = "deactivateStaff",
    params(("id" = Uuid, Path, description = "Staff ID")),
    responses(
        (status = 204, description = "Staff account deactivated"),
        (status = 404, description = "Not found", body = crate::utils::ErrorEnvelope),
        (status = 409, description = "Cannot deactivate yourself", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn deactivate_staff(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(staff_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    if staff_id == auth_user.staff_id {
        return Err(ApiError::Conflict(
            "You cannot deactivate your own account".to_string(),
        ));
    }

    let mut conn = state.diesel_pool.get().await?;
    Staff::update(
        &mut conn,
        staff_id,
        StaffUpdate {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await?
    .ok_or(ApiError::NotFound("Staff"))?;

    AuditLogger::staff_action(
        AuditAction::Deactivated,
        auth_user.staff_id,
        ResourceType::Staff,
        staff_id,
    );
    Ok(StatusCode::NO_CONTENT)
}
