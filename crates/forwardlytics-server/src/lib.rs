//! HTTP API server for Forwardlytics.
//!
//! This crate binds the core dispatcher to HTTP with Axum:
//!
//! - **Ingestion endpoints** (`POST /identify`, `POST /track`, `POST /page`)
//!   that validate a JSON body, build the event model and forward it to
//!   every enabled integration
//! - **Health endpoint** (`GET /health`) listing registered integrations
//!
//! # Architecture
//!
//! The [`AppState`] owns a [`Dispatcher`](forwardlytics_core::Dispatcher)
//! over the process-wide
//! [`IntegrationRegistry`](forwardlytics_core::IntegrationRegistry). Each
//! request is handled independently; the registry is the only shared state.
//!
//! Every response except the 404 is JSON of the form
//! `{"message": "..."}`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
