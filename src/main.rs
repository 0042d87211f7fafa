//! Sentinel Monitor: headless live-update client.
//!
//! Loads configuration, connects to the dashboard's WebSocket endpoint, and
//! logs every event until interrupted.

use tracing_subscriber::{EnvFilter, fmt};

use sentinel_core::config::AppConfig;
use sentinel_core::error::AppError;
use sentinel_realtime::handler::CLOSE_NORMAL;
use sentinel_realtime::message::payload::{NotificationView, TestResultRow};
use sentinel_realtime::{ClientConfig, HandlerSet, WebSocketClient};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Monitor error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration for the environment named by `SENTINEL_ENV`
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("SENTINEL_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.is_json() {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Run the client until a shutdown signal arrives
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Sentinel Monitor v{}", env!("CARGO_PKG_VERSION"));

    let client_config = ClientConfig::from(&config.client);
    let client = WebSocketClient::new(client_config, logging_handlers());
    tracing::info!(client_id = %client.id(), url = %client.url(), "Live-update client started");

    shutdown_signal().await?;

    tracing::info!("Shutdown signal received");
    client.close(CLOSE_NORMAL, "monitor shutting down").await;

    let metrics = client.metrics();
    tracing::info!(
        frames_received = metrics.frames_received,
        messages_sent = metrics.messages_sent,
        connections_opened = metrics.connections_opened,
        "Sentinel Monitor stopped"
    );
    Ok(())
}

fn logging_handlers() -> HandlerSet {
    HandlerSet::new()
        .on_connect(|| tracing::info!("Dashboard connection established"))
        .on_disconnect(|info| {
            tracing::info!(code = info.code, clean = info.was_clean, "Dashboard connection lost")
        })
        .on_test_results(|payload| {
            let rows = TestResultRow::rows(&payload);
            let failed = rows.iter().filter(|r| r.is_failure()).count();
            tracing::info!(total = rows.len(), failed, "Test results received");
            for row in rows.iter().filter(|r| r.is_failure()) {
                tracing::warn!(
                    test = %row.name,
                    error = row.error.as_deref().unwrap_or(""),
                    "Test failed"
                );
            }
        })
        .on_metrics_update(|payload| tracing::info!(metrics = %payload, "Metrics update"))
        .on_notification(|payload| {
            let view = NotificationView::from_value(&payload);
            tracing::info!(level = %view.level, title = ?view.title, "{}", view.message);
        })
        .on_error(|err| tracing::error!(error = %err, "Live-update client error"))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() -> Result<(), AppError> {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| AppError::internal(format!("Failed to install Ctrl+C handler: {e}")))
    };

    #[cfg(unix)]
    let terminate = async {
        let mut signal =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .map_err(|e| AppError::internal(format!("Failed to install SIGTERM handler: {e}")))?;
        signal.recv().await;
        Ok::<(), AppError>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<(), AppError>>();

    tokio::select! {
        result = ctrl_c => result,
        result = terminate => result,
    }
}
