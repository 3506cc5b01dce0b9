//! Error types for the HTTP API.
//!
//! [`ApiError`] covers every failure a request can end in and converts into
//! an Axum response via its [`IntoResponse`] implementation. The display
//! string of each variant is exactly the `message` returned to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use forwardlytics_core::{DispatchError, Operation, ValidationError};
use tracing::{debug, error};

/// Errors that end an ingestion request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The body was not a JSON object of the expected shape.
    #[error("Invalid request.")]
    InvalidRequest(#[source] serde_json::Error),

    /// Required fields were missing.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An integration failed while the event was being forwarded.
    #[error(
        "Fatal error during {} with an integration ({}): {}",
        .operation.description(),
        .failure.integration,
        .failure.source
    )]
    Dispatch {
        /// The capability that was being invoked.
        operation: Operation,
        /// The integration failure that aborted the dispatch.
        #[source]
        failure: DispatchError,
    },
}

impl ApiError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Dispatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A JSON `{"message": ...}` response.
pub fn message_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "message": message.into() });
    (status, axum::Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::InvalidRequest(e) => debug!(error = %e, "Rejected undecodable body"),
            Self::Validation(e) => debug!(error = %e, "Rejected incomplete body"),
            Self::Dispatch { operation, failure } => error!(
                %operation,
                integration = %failure.integration,
                error = %failure.source,
                "Forwarding failed"
            ),
        }
        message_response(status, self.to_string())
    }
}
