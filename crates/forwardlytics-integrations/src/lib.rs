//! Downstream analytics integrations for Forwardlytics.
//!
//! Each integration lives in its own module and exposes a `register`
//! function that adds it to an
//! [`IntegrationRegistry`](forwardlytics_core::IntegrationRegistry) under a
//! fixed name. [`register_all`] is what the server calls at startup.
//!
//! | Name | Module | Enabled when |
//! |------|--------|--------------|
//! | `mixpanel` | [`mixpanel`] | the Mixpanel project token is non-empty |

pub mod mixpanel;

use forwardlytics_core::IntegrationRegistry;

pub use mixpanel::{Mixpanel, MixpanelConfig};

/// Configuration for every built-in integration.
#[derive(Debug, Clone, Default)]
pub struct IntegrationsConfig {
    /// Mixpanel settings.
    pub mixpanel: MixpanelConfig,
}

/// Register every built-in integration into `registry`.
///
/// Integrations are registered whether or not they are configured; an
/// unconfigured integration reports itself as disabled and is skipped at
/// dispatch time.
pub fn register_all(registry: &IntegrationRegistry, config: &IntegrationsConfig) {
    mixpanel::register(registry, &config.mixpanel);
}
