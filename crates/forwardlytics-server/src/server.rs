//! HTTP server lifecycle.
//!
//! [`start_server`] resolves the configured address, binds it, reports
//! which integrations the process will forward to, and serves the ingestion
//! API until `Ctrl-C`. The steps are also exposed on their own ([`bind`],
//! [`serve`]) so tests can run the API on an ephemeral port with their own
//! shutdown trigger.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use forwardlytics_core::IntegrationRegistry;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::{ConfigError, ServerConfig};
use crate::router::build_router;
use crate::state::AppState;

/// Errors that can occur when starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configured host and port do not form a socket address.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that was requested.
        addr: SocketAddr,
        /// Why the bind failed.
        #[source]
        source: io::Error,
    },

    /// Serving stopped on an I/O error.
    #[error("server stopped unexpectedly: {0}")]
    Serve(#[source] io::Error),
}

/// Resolve the configured address and bind a listener on it.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr = config.bind_address()?;
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Serve the ingestion API on `listener` until `shutdown` resolves, then
/// drain in-flight requests.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    log_integrations(state.registry());
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Forwardlytics server listening");
    }

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)?;

    info!("Forwardlytics server stopped");
    Ok(())
}

/// Bind the configured address and serve until `Ctrl-C`.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let listener = bind(config).await?;
    serve(listener, state, shutdown_signal()).await
}

/// One line per registered integration, so the log shows where events will
/// go and which integrations are currently switched off.
fn log_integrations(registry: &IntegrationRegistry) {
    let snapshot = registry.snapshot();
    if snapshot.is_empty() {
        warn!("No integrations registered, events will be dropped");
    }
    for (name, integration) in snapshot {
        if integration.enabled() {
            info!(integration = %name, "Integration enabled");
        } else {
            warn!(integration = %name, "Integration registered but disabled");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
    }
}
