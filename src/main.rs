use feedback_dashboard::api::{AppState, build_router};
use feedback_dashboard::config::AppConfig;
use feedback_dashboard::lifecycle::{ExitReason, flush_on_exit, shutdown_signal};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// One cooperative scheduler: handlers run to completion one at a time.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    if config.uses_default_password() {
        if config.is_production() {
            tracing::warn!("ADMIN_PASSWORD is not set; the built-in default is in use in production");
        } else {
            tracing::info!("Using the default admin password (set ADMIN_PASSWORD to change it)");
        }
    }

    // 1. Dataset:
    let store = Arc::new(config.data_store());
    let outcome = store.load();
    tracing::debug!("Initial load: {:?}", outcome);

    // 2. HTTP Router:
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let data_file = config.data_file.clone();
    let environment = config.environment.clone();
    let app = build_router(AppState::new(store.clone(), config));

    // 3. Start HTTP server:
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Feedback dashboard listening on {}", addr);
    tracing::info!("Dashboard URL: http://localhost:{}/dashboard.html", addr.port());
    tracing::info!("Health check: http://localhost:{}/health", addr.port());
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /api/data  - fetch data (search, offset, limit)");
    tracing::info!("  GET  /api/stats - dataset statistics");
    tracing::info!("  POST /api/save  - replace data");
    tracing::info!("  POST /save      - legacy replace endpoint");
    tracing::info!("Data file: {}", data_file.display());
    tracing::info!("Environment: {}", environment);

    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    // 4. Final flush, whichever way the server stopped:
    let reason = match server.await {
        Ok(Ok(())) => ExitReason::Signal,
        Ok(Err(e)) => {
            tracing::error!("Server error: {}", e);
            ExitReason::Fatal
        }
        Err(e) => {
            tracing::error!("Server task failed: {}", e);
            ExitReason::Fatal
        }
    };

    flush_on_exit(&store, reason);

    if reason == ExitReason::Fatal {
        std::process::exit(reason.exit_code());
    }
    Ok(())
}
