use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use community_hub_api::app::{create_app, AppState};
use community_hub_api::config::Config;
use community_hub_api::jobs::{BatchEmailJob, JobScheduler, PoolMetricsJob, RateLimitPruneJob};
use community_hub_api::middleware::{init_metrics, logging::init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config.logging).context("Failed to initialize logging")?;
    init_metrics().context("Failed to install Prometheus recorder")?;

    info!("Starting Community Hub API v{}", env!("CARGO_PKG_VERSION"));

    let db_config: persistence::db::DatabaseConfig = (&config.database).into();
    let pool = persistence::db::create_pool(&db_config)
        .await
        .context("Failed to connect to database")?;

    info!("Running database migrations");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let addr = config.socket_addr().context("Invalid server address")?;
    let state = AppState::new(config, pool.clone())?;

    let mut scheduler = JobScheduler::new();
    scheduler.register(PoolMetricsJob::new(pool, db_config.max_connections));
    if let Some(limiter) = &state.rate_limiter {
        scheduler.register(RateLimitPruneJob::new(Arc::clone(limiter)));
    }
    if state.config.jobs.enabled {
        scheduler.register(BatchEmailJob::new(
            state.batch_emailer(),
            state.config.jobs.interval_minutes,
        ));
    }
    scheduler.start();

    let app = create_app(state);

    info!(%addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
