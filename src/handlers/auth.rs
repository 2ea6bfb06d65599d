// Authentication handlers: login, token refresh, profile and password change

use axum::{extract::State, http::StatusCode, Extension, Json};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        auth::{ChangePasswordRequest, LoginRequest, RefreshTokenRequest, TokenResponse},
        staff::{Staff, StaffResponse, StaffUpdate},
    },
    utils::{
        hash_password, normalize_email, verify_password, ApiError, ApiResult, AuditAction,
        AuditLogger, ResourceType, ValidatedJson,
    },
};

fn token_response(state: &AppState, staff: Staff) -> ApiResult<TokenResponse> {
    let pair = state.jwt_service.issue_pair(&staff)?;
    Ok(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: pair.expires_in,
        staff: staff.into(),
    })
}

/// Authenticate a staff member
/// POST /v1/auth/login
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "Authentication",
    operation_id = "login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid email or password", body = crate::utils::ErrorEnvelope),
        (status = 403, description = "Account is inactive", body = crate::utils::ErrorEnvelope),
        (status = 422, description = "Validation failed", body = crate::utils::ErrorEnvelope)
    )
)]
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let email = normalize_email(&request.email);
    let mut conn = state.diesel_pool.get().await?;

    let Some(staff) = Staff::find_by_email(&mut conn, &email).await? else {
        warn!("Login attempt for unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&request.password, &staff.password_hash).await? {
        warn!(staff_id = %staff.id, "Login attempt with wrong password");
        return Err(ApiError::InvalidCredentials);
    }
    if !staff.is_active {
        return Err(ApiError::AccountInactive);
    }

    Staff::touch_last_login(&mut conn, staff.id).await?;
    AuditLogger::staff_action(AuditAction::LoggedIn, staff.id, ResourceType::Staff, staff.id);
    info!(staff_id = %staff.id, role = %staff.role, "Staff logged in");

    Ok(Json(token_response(&state, staff)?))
}

/// Exchange a refresh token for a new token pair
/// POST /v1/auth/refresh
#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    tag = "Authentication",
    operation_id = "refreshToken",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenResponse),
        (status = 401, description = "Invalid or expired refresh token", body = crate::utils::ErrorEnvelope),
        (status = 403, description = "Account is inactive", body = crate::utils::ErrorEnvelope)
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let claims = state
        .jwt_service
        .validate_refresh_token(&request.refresh_token)?;
    let staff_id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::InvalidToken)?;

    let mut conn = state.diesel_pool.get().await?;
    let staff = Staff::find_by_id(&mut conn, staff_id)
        .await?
        .ok_or(ApiError::InvalidToken)?;
    if !staff.is_active {
        return Err(ApiError::AccountInactive);
    }

    Ok(Json(token_response(&state, staff)?))
}

/// Profile of the authenticated staff member
/// GET /v1/auth/me
#[utoipa::path(
    get,
    path = "/v1/auth/me",
    tag = "Authentication",
    operation_id = "getCurrentStaff",
    responses(
        (status = 200, description = "Current staff profile", body = StaffResponse),
        (status = 401, description = "Missing or invalid token", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<StaffResponse>> {
    let mut conn = state.diesel_pool.get().await?;
    let staff = Staff::find_by_id(&mut conn, auth_user.staff_id)
        .await?
        .ok_or(ApiError::InvalidToken)?;
    Ok(Json(staff.into()))
}

/// Change the caller's own password
/// PUT /v1/auth/password
#[utoipa::path(
    put,
    path = "/v1/auth/password",
    tag = "Authentication",
    operation_id = "changePassword",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 401, description = "Current password is wrong", body = crate::utils::ErrorEnvelope),
        (status = 422, description = "Validation failed", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    let min_length = state.config.security.min_password_length;
    if request.new_password.len() < min_length {
        return Err(ApiError::field(
            "new_password",
            format!("Password must be at least {} characters", min_length),
        ));
    }

    let mut conn = state.diesel_pool.get().await?;
    let staff = Staff::find_by_id(&mut conn, auth_user.staff_id)
        .await?
        .ok_or(ApiError::InvalidToken)?;

    if !verify_password(&request.current_password, &staff.password_hash).await? {
        return Err(ApiError::InvalidCredentials);
    }

    let password_hash =
        hash_password(&request.new_password, state.config.security.bcrypt_cost).await?;
    Staff::update(
        &mut conn,
        staff.id,
        StaffUpdate {
            password_hash: Some(password_hash),
            ..Default::default()
        },
    )
    .await?;

    AuditLogger::staff_action(
        AuditAction::PasswordChanged,
        staff.id,
        ResourceType::Staff,
        staff.id,
    );
    Ok(StatusCode::NO_CONTENT)
}
