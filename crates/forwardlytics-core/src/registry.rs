//! Shared registry of integrations keyed by name.
//!
//! One [`IntegrationRegistry`] is built at process start and shared via
//! [`Arc`]. Each integration crate exposes a `register` function that puts
//! its adapter in; tests build their own registry and register fakes.
//!
//! Enumeration order is unspecified. Nothing may depend on which
//! integration a [`snapshot`](IntegrationRegistry::snapshot) yields first.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::integration::Integration;

/// One registry entry as seen by a dispatch.
pub type RegisteredIntegration = (String, Arc<dyn Integration>);

/// Thread-safe mapping from integration name to integration.
///
/// Registration and removal are rare administrative operations; reads
/// happen on every dispatch. The lock is only held long enough to copy the
/// entries out, never across a call into an integration.
#[derive(Default)]
pub struct IntegrationRegistry {
    integrations: RwLock<HashMap<String, Arc<dyn Integration>>>,
}

impl IntegrationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `integration` under `name`, replacing any previous entry.
    ///
    /// Returns the integration that was replaced, if there was one.
    pub fn register(
        &self,
        name: impl Into<String>,
        integration: Arc<dyn Integration>,
    ) -> Option<Arc<dyn Integration>> {
        let name = name.into();
        let previous = self
            .integrations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), integration);

        if previous.is_some() {
            info!(integration = %name, "Integration replaced");
        } else {
            info!(integration = %name, "Integration registered");
        }
        previous
    }

    /// Remove the integration registered under `name`.
    ///
    /// Removing a name that is not registered is not an error.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn Integration>> {
        let removed = self
            .integrations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        if removed.is_some() {
            debug!(integration = %name, "Integration removed");
        }
        removed
    }

    /// Look up a single integration.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Integration>> {
        self.integrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Whether an integration is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.integrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Copy out every current entry, in unspecified order.
    pub fn snapshot(&self) -> Vec<RegisteredIntegration> {
        self.integrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, entry)| (name.clone(), Arc::clone(entry)))
            .collect()
    }

    /// Registered names, sorted for display.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .integrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort_unstable();
        names
    }

    /// Number of registered integrations.
    pub fn len(&self) -> usize {
        self.integrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no integration is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for IntegrationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationRegistry")
            .field("integrations", &self.names())
            .finish()
    }
}
