//! Axum router construction for the HTTP API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `POST /identify` -- forward an identify call
/// - `POST /track` -- forward a tracked event
/// - `POST /page` -- forward a page view
/// - `GET /health` -- liveness and registered integrations
///
/// Any other method on an ingestion path, including `OPTIONS`, and any
/// unknown path answers 404 with a plain-text body.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/identify",
            post(handlers::identify).fallback(handlers::not_found),
        )
        .route(
            "/track",
            post(handlers::track).fallback(handlers::not_found),
        )
        .route("/page", post(handlers::page).fallback(handlers::not_found))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
