//! HTTP endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/identify` | Forward an identify call |
//! | `POST` | `/track` | Forward a tracked event |
//! | `POST` | `/page` | Forward a page view |
//! | `GET` | `/health` | Liveness and registered integrations |
//!
//! The ingestion handlers take the raw body and decode it themselves so
//! that every decoding failure, including a missing or wrong content type,
//! is answered with the same `Invalid request.` message.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use forwardlytics_core::{DispatchEvent, EventPayload, IdentifyPayload};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::{ApiError, message_response};
use crate::state::AppState;

/// Body returned for unknown routes and non-POST ingestion requests.
pub const NOT_FOUND_BODY: &str = "404 page not found";

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(ApiError::InvalidRequest)
}

async fn forward(state: &AppState, event: DispatchEvent<'_>) -> Result<Response, ApiError> {
    let operation = event.operation();
    let report = state
        .dispatcher
        .dispatch(event)
        .await
        .map_err(|failure| ApiError::Dispatch { operation, failure })?;

    info!(%operation, delivered = report.delivered, "Event forwarded");
    Ok(message_response(
        StatusCode::OK,
        format!("Forwarding {operation} to integrations."),
    ))
}

// ---------------------------------------------------------------------------
// POST /identify
// ---------------------------------------------------------------------------

/// Validate an identify body and forward it to every enabled integration.
pub async fn identify(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let identification = decode::<IdentifyPayload>(&body)?.validate()?;
    forward(&state, DispatchEvent::Identify(&identification)).await
}

// ---------------------------------------------------------------------------
// POST /track
// ---------------------------------------------------------------------------

/// Validate a track body and forward it to every enabled integration.
pub async fn track(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let event = decode::<EventPayload>(&body)?.validate_event()?;
    forward(&state, DispatchEvent::Track(&event)).await
}

// ---------------------------------------------------------------------------
// POST /page
// ---------------------------------------------------------------------------

/// Validate a page body and forward it to every enabled integration.
pub async fn page(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let page = decode::<EventPayload>(&body)?.validate_page()?;
    forward(&state, DispatchEvent::Page(&page)).await
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Report liveness and the names of the registered integrations.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "integrations": state.registry().names(),
    }))
}

/// Fallback for unknown routes and unsupported methods.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}
