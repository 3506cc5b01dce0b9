//! Core of the Forwardlytics event forwarder.
//!
//! Forwardlytics receives analytics calls (identify, track, page) and
//! forwards each one to every enabled downstream analytics integration.
//! This crate holds everything that is independent of the HTTP transport
//! and of any particular downstream service:
//!
//! - [`integration`] -- the [`Integration`] capability every adapter implements
//! - [`model`] -- canonical event models handed to integrations
//! - [`payload`] -- decoded request payloads and their validation
//! - [`registry`] -- the shared name-to-integration [`IntegrationRegistry`]
//! - [`dispatch`] -- the fail-fast [`Dispatcher`]
//! - [`error`] -- error types shared by all of the above
//!
//! # Architecture
//!
//! ```text
//! payload --validate--> model --Dispatcher--> registry snapshot --> Integration::{identify,track,page}
//! ```
//!
//! The registry is constructed once at startup and shared through an
//! [`Arc`](std::sync::Arc). Integrations register themselves into it; test
//! harnesses register fakes into a registry of their own.

pub mod dispatch;
pub mod error;
pub mod integration;
pub mod model;
pub mod payload;
pub mod registry;

// Re-export primary types for convenience.
pub use dispatch::{DispatchEvent, DispatchReport, Dispatcher, Operation};
pub use error::{DispatchError, IntegrationError, ValidationError};
pub use integration::Integration;
pub use model::{Event, Identification, Page, Properties, Traits};
pub use payload::{EventPayload, IdentifyPayload};
pub use registry::IntegrationRegistry;
