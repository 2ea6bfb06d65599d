use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use academy_backend::{
    app_config::AppConfig, build_router, db::mask_connection_string, initialize_app_state,
    services::{ensure_initial_admin, start_notification_scheduler},
};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.rust_log.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Academy Backend ({}) on {}",
        config.environment, config.server.bind_address
    );
    info!("Database: {}", mask_connection_string(&config.database_url));

    let state = initialize_app_state(&config)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    match ensure_initial_admin(&state.diesel_pool, &config).await {
        Ok(Some(admin)) => info!("Created initial administrator {}", admin.email),
        Ok(None) => {},
        Err(e) => warn!("Initial administrator setup failed: {}", e),
    }

    // Held until shutdown
    let _scheduler = if config.notifications.scheduler_enabled {
        let scheduler = start_notification_scheduler(
            state.notification_service.clone(),
            &config.notifications.sweep_cron,
        )
        .await
        .context("Failed to start notification scheduler")?;
        Some(scheduler)
    } else {
        info!("Notification scheduler disabled");
        None
    };

    let app = build_router(state);
    let listener = TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;

    info!("Listening on {}", config.server.bind_address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}
