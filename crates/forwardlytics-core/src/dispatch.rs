//! Fan-out of one event to every enabled integration.
//!
//! [`Dispatcher::dispatch`] walks a snapshot of the registry and invokes
//! the capability matching the event on each enabled integration, one at a
//! time. The first error aborts the dispatch: integrations not yet reached
//! are skipped and only that one failure is reported. Because the
//! registry's enumeration order is unspecified, which integration is
//! reported when several would fail is unspecified too.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::{DispatchError, IntegrationError};
use crate::integration::Integration;
use crate::model::{Event, Identification, Page};
use crate::registry::IntegrationRegistry;

/// The capability a dispatch invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// [`Integration::identify`]
    Identify,
    /// [`Integration::track`]
    Track,
    /// [`Integration::page`]
    Page,
}

impl Operation {
    /// Short name used in success messages and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identify => "identify",
            Self::Track => "track",
            Self::Page => "page",
        }
    }

    /// Noun phrase used in failure messages.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Identify => "identification",
            Self::Track => "tracking",
            Self::Page => "page tracking",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event model paired with the capability that consumes it.
#[derive(Debug, Clone, Copy)]
pub enum DispatchEvent<'a> {
    /// Invoke [`Integration::identify`].
    Identify(&'a Identification),
    /// Invoke [`Integration::track`].
    Track(&'a Event),
    /// Invoke [`Integration::page`].
    Page(&'a Page),
}

impl DispatchEvent<'_> {
    /// The capability this event selects.
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Identify(_) => Operation::Identify,
            Self::Track(_) => Operation::Track,
            Self::Page(_) => Operation::Page,
        }
    }

    async fn deliver(self, integration: &dyn Integration) -> Result<(), IntegrationError> {
        match self {
            Self::Identify(identification) => integration.identify(identification).await,
            Self::Track(event) => integration.track(event).await,
            Self::Page(page) => integration.page(page).await,
        }
    }
}

/// Summary of a successful dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// The capability that was invoked.
    pub operation: Operation,
    /// How many enabled integrations were invoked.
    pub delivered: usize,
}

/// Forwards events to the integrations of a shared registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<IntegrationRegistry>,
}

impl Dispatcher {
    /// Create a dispatcher reading from `registry`.
    pub const fn new(registry: Arc<IntegrationRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this dispatcher reads from.
    pub const fn registry(&self) -> &Arc<IntegrationRegistry> {
        &self.registry
    }

    /// Deliver `event` to every enabled integration, stopping at the first
    /// failure.
    ///
    /// Disabled integrations are skipped without being invoked and are not
    /// counted in the report.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] carrying the name and error of the first
    /// integration that failed.
    pub async fn dispatch(
        &self,
        event: DispatchEvent<'_>,
    ) -> Result<DispatchReport, DispatchError> {
        let operation = event.operation();
        let mut delivered: usize = 0;

        for (name, integration) in self.registry.snapshot() {
            if !integration.enabled() {
                trace!(integration = %name, %operation, "Integration disabled, skipping");
                continue;
            }

            debug!(integration = %name, %operation, "Forwarding to integration");
            if let Err(source) = event.deliver(integration.as_ref()).await {
                warn!(
                    integration = %name,
                    %operation,
                    error = %source,
                    "Integration failed, aborting dispatch"
                );
                return Err(DispatchError {
                    integration: name,
                    source,
                });
            }
            delivered = delivered.saturating_add(1);
        }

        Ok(DispatchReport {
            operation,
            delivered,
        })
    }

    /// Deliver an identify call. See [`Dispatcher::dispatch`].
    ///
    /// # Errors
    ///
    /// Returns the first integration failure.
    pub async fn identify(
        &self,
        identification: &Identification,
    ) -> Result<DispatchReport, DispatchError> {
        self.dispatch(DispatchEvent::Identify(identification)).await
    }

    /// Deliver a tracked event. See [`Dispatcher::dispatch`].
    ///
    /// # Errors
    ///
    /// Returns the first integration failure.
    pub async fn track(&self, event: &Event) -> Result<DispatchReport, DispatchError> {
        self.dispatch(DispatchEvent::Track(event)).await
    }

    /// Deliver a page view. See [`Dispatcher::dispatch`].
    ///
    /// # Errors
    ///
    /// Returns the first integration failure.
    pub async fn page(&self, page: &Page) -> Result<DispatchReport, DispatchError> {
        self.dispatch(DispatchEvent::Page(page)).await
    }
}
