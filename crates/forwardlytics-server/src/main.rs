//! Forwardlytics server entry point.
//!
//! Receives identify, track and page calls over HTTP and forwards each one
//! to every enabled analytics integration.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Initialize structured logging (tracing)
//! 3. Build the integration registry and register built-in integrations
//! 4. Bind, log the registered integrations and serve HTTP until `Ctrl-C`

use std::sync::Arc;

use forwardlytics_core::IntegrationRegistry;
use forwardlytics_server::{AppState, ServerConfig, start_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the server fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!(
        host = config.host,
        port = config.port,
        mixpanel_api_url = config.integrations.mixpanel.api_url,
        "forwardlytics starting"
    );

    let registry = Arc::new(IntegrationRegistry::new());
    forwardlytics_integrations::register_all(&registry, &config.integrations);

    let state = Arc::new(AppState::new(registry));
    start_server(&config, state).await?;

    Ok(())
}
