//! viewcount server
//!
//! - View endpoint: /api/views/{slug} (GET reads, POST counts)
//! - Per-client sliding-window rate limits, 1h dedup markers
//! - Store failures degrade to `{ views: 0, error }` instead of 5xx

use std::net::SocketAddr;
use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use viewcount_core::error::{Result, ViewError};
use viewcount_server::{app_state::AppState, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, code = e.client_code().as_str(), "viewcount-server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg = config::load_default()?;
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .map_err(|e| ViewError::Config(format!("server.listen must be a valid SocketAddr: {e}")))?;

    let state = AppState::from_config(cfg)?;
    let app = router::build_router(state.clone());

    tracing::info!(%listen, "viewcount-server starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| ViewError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(state))
    .await
    .map_err(|e| ViewError::Internal(format!("server failed: {e}")))
}

async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
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
    state.set_draining();
    tracing::info!("signal received, starting graceful shutdown");
}
