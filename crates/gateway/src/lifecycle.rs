//! Process lifecycle: bind, serve, and drain on shutdown (spec.md §4.5
//! "Graceful shutdown").

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use edgerouter_config::AppConfig;

use crate::router::build_router;
use crate::state::AppState;

/// Bound drain time once shutdown begins. In-flight requests get this long
/// to finish before the process exits anyway.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

pub async fn start(config: AppConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config);
    let app = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "gateway listening");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = shutdown_rx.await;
    });

    let handle = tokio::spawn(server);

    // Block here for as long as the server runs normally — the grace
    // period only starts once a signal actually arrives.
    shutdown_signal().await;
    info!("shutdown signal received, draining in-flight requests");
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
        Ok(Ok(Ok(()))) => {
            info!("gateway shut down cleanly");
            Ok(())
        }
        Ok(Ok(Err(err))) => Err(anyhow::anyhow!(err).context("server task failed")),
        Ok(Err(join_err)) => Err(anyhow::anyhow!(join_err).context("server task panicked")),
        Err(_) => {
            warn!(grace_seconds = SHUTDOWN_GRACE.as_secs(), "shutdown grace period elapsed, exiting");
            Ok(())
        }
    }
}

/// Resolves once either Ctrl-C or SIGTERM arrives, letting
/// `with_graceful_shutdown` stop accepting new connections.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl-C, starting graceful shutdown"),
        _ = terminate => info!("received SIGTERM, starting graceful shutdown"),
    }
}
