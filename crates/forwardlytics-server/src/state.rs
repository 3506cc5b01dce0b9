//! Shared application state for the HTTP API.

use std::sync::Arc;

use forwardlytics_core::{Dispatcher, IntegrationRegistry};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. Holds the
/// dispatcher, which in turn holds the process-wide registry.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Forwards events to the registered integrations.
    pub dispatcher: Dispatcher,
}

impl AppState {
    /// Create the application state over `registry`.
    pub const fn new(registry: Arc<IntegrationRegistry>) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry),
        }
    }

    /// The registry requests are dispatched against.
    pub const fn registry(&self) -> &Arc<IntegrationRegistry> {
        self.dispatcher.registry()
    }
}
