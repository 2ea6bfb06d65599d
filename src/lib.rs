// Library exports for the Academy Backend
// The binary in main.rs and the integration tests both build the router from here

pub mod app;
pub mod app_config;
pub mod config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;

use std::any::Any;
use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info};

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, CONFIG};
pub use db::{DieselDatabaseConfig, DieselPool};
pub use middleware::{auth_middleware, require_roles, AuthenticatedUser};
pub use models::auth::{AccessTokenClaims, RefreshTokenClaims};
pub use services::{
    EmailService, EnrollmentTermService, JwtConfig, JwtError, JwtService, NotificationService,
};
pub use utils::{ApiError, ApiResult};

/// Wire services over an existing pool. Nothing here touches the network.
pub fn build_app_state(
    config: AppConfig,
    diesel_pool: DieselPool,
) -> Result<AppState, Box<dyn std::error::Error + Send + Sync>> {
    let max_connections = config.database.max_connections;

    let jwt_service = Arc::new(JwtService::new(JwtConfig::from_app_config(&config.jwt)));
    let email_service = Arc::new(EmailService::new(config.email.clone(), &config.academy)?);
    let notification_service = Arc::new(NotificationService::new(
        diesel_pool.clone(),
        email_service.clone(),
        config.notifications.days_before_expiry,
        config.academy.currency_symbol.clone(),
    ));
    let enrollment_terms = Arc::new(EnrollmentTermService::new(config.academy.clone())?);

    Ok(AppState {
        config: Arc::new(config),
        diesel_pool,
        jwt_service,
        email_service,
        notification_service,
        enrollment_terms,
        max_connections,
    })
}

/// Create the pool, apply migrations when enabled and build the state
pub async fn initialize_app_state(
    config: &AppConfig,
) -> Result<AppState, Box<dyn std::error::Error + Send + Sync>> {
    info!("Initializing database pool...");
    let db_config = DieselDatabaseConfig::from_app_config(config);
    let diesel_pool = db::create_diesel_pool(db_config)
        .await
        .map_err(|e| format!("Database initialization failed: {}", e))?;

    if migrations::should_run_migrations(config) {
        info!("Running embedded migrations...");
        migrations::run_all_migrations(migrations::MigrationConfig::from_app_config(config))
            .await
            .map_err(|e| format!("Migration failed: {}", e))?;
    } else {
        info!("Embedded migrations disabled");
    }

    build_app_state(config.clone(), diesel_pool)
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route")
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);
    ApiError::Internal("handler panicked".to_string()).into_response()
}

/// Full HTTP application: `/v1` routes, auth on protected routes, fallback and layers
pub fn build_router(state: AppState) -> Router {
    let protected = handlers::protected_routes().route_layer(
        axum_middleware::from_fn_with_state(state.clone(), auth_middleware),
    );

    let api = handlers::public_routes().merge(protected);

    Router::new()
        .nest("/v1", api)
        .fallback(route_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::dynamic_cors_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}
