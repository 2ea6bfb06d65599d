// Authentication middleware for protected routes
// Validates JWT tokens and injects AuthenticatedUser into request extensions

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    app::AppState, middleware::auth::AuthenticatedUser, models::staff::StaffRole,
    utils::ApiError,
};

/// Other schemes (Basic, etc.) count as a missing token
fn bearer_token(request: &Request<Body>) -> Option<String> {
    request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Middleware function that validates JWT tokens and adds AuthenticatedUser to extensions
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request).ok_or(ApiError::MissingToken)?;

    let claims = app_state
        .jwt_service
        .validate_access_token(&token)
        .map_err(|e| {
            tracing::warn!("JWT validation failed: {}", e);
            ApiError::InvalidToken
        })?;

    let auth_user = AuthenticatedUser::try_from(claims)?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Role gate layered after `auth_middleware`; the allowed group is the state
pub async fn require_roles(
    State(allowed): State<&'static [StaffRole]>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or(ApiError::MissingToken)?;

    if !allowed.contains(&user.role) {
        tracing::warn!(
            staff_id = %user.staff_id,
            role = %user.role,
            path = %request.uri().path(),
            "Role not allowed for route"
        );
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(request).await)
}

/// Extractor for AuthenticatedUser from request extensions
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(ApiError::MissingToken)
    }
}
