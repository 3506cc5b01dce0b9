//! The capability contract every downstream integration implements.

use async_trait::async_trait;

use crate::error::IntegrationError;
use crate::model::{Event, Identification, Page};

/// A downstream analytics service that events are forwarded to.
///
/// Implementations are registered by name in an
/// [`IntegrationRegistry`](crate::registry::IntegrationRegistry) and invoked
/// by the [`Dispatcher`](crate::dispatch::Dispatcher). Models are passed by
/// shared reference: an implementation that needs to reshape traits or
/// properties clones them first.
///
/// [`enabled`](Integration::enabled) is evaluated at the start of every
/// dispatch and must not have side effects. It usually checks live
/// configuration such as whether an API token is set.
#[async_trait]
pub trait Integration: Send + Sync {
    /// Forward an identify call.
    async fn identify(&self, identification: &Identification) -> Result<(), IntegrationError>;

    /// Forward a tracked event.
    async fn track(&self, event: &Event) -> Result<(), IntegrationError>;

    /// Forward a page view.
    async fn page(&self, page: &Page) -> Result<(), IntegrationError>;

    /// Whether this integration takes part in dispatches right now.
    fn enabled(&self) -> bool;
}
