//! Exam reservation HTTP server.

use anyhow::Context;
use exam_reservation_core::metrics::register_metrics;
use exam_reservation_server::{Config, bootstrap};
use exam_reservation_web::build_router;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,exam_reservation=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting exam reservation server");

    let config = Config::from_env();
    info!(
        http_addr = %config.http_addr(),
        metrics_addr = %config.metrics_addr(),
        "Configuration loaded"
    );

    register_metrics();
    let metrics_addr: SocketAddr = config
        .metrics_addr()
        .parse()
        .context("METRICS_HOST/METRICS_PORT is not a socket address")?;
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .context("Failed to install Prometheus exporter")?;
    info!(addr = %metrics_addr, "Metrics exporter listening");

    let store = bootstrap::connect(&config.database).await?;
    let pool = store.pool().clone();
    let app = build_router(bootstrap::build_state(&config, store)?);

    let addr = config.http_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(address = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, closing database pool");
    let drain = Duration::from_secs(config.server.shutdown_timeout);
    if tokio::time::timeout(drain, pool.close()).await.is_err() {
        warn!(timeout_secs = drain.as_secs(), "Database pool did not close in time");
    }

    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
///
/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (in production environments)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
