//! Error types for the Forwardlytics core.
//!
//! - [`IntegrationError`] is what an integration returns when it cannot
//!   deliver an event downstream.
//! - [`ValidationError`] is produced while turning a decoded payload into
//!   an event model.
//! - [`DispatchError`] wraps the first [`IntegrationError`] of a dispatch
//!   together with the name of the integration that produced it.

use std::fmt;

/// Errors an integration can report for a single delivery.
///
/// The dispatcher does not distinguish between variants: any error aborts
/// the dispatch. The variants exist so integrations can log and test their
/// own failure modes precisely.
#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    /// The outbound request could not be sent or its response not read.
    #[error("request failed: {0}")]
    Request(String),

    /// The downstream service answered but refused the payload.
    #[error("rejected by downstream service (HTTP {status}): {body}")]
    Rejected {
        /// HTTP status code returned by the service.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The payload could not be encoded for the downstream service.
    #[error("payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// Any other failure, reported with its message only.
    #[error("{0}")]
    Other(String),
}

impl IntegrationError {
    /// Build an [`IntegrationError::Other`] from any displayable message.
    pub fn other(message: impl fmt::Display) -> Self {
        Self::Other(message.to_string())
    }
}

/// A required request field, in canonical reporting order.
///
/// The derived [`Ord`] follows declaration order, which is the order
/// missing fields are listed in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RequiredField {
    /// `userID`
    UserId,
    /// `timestamp`
    Timestamp,
    /// `name`
    Name,
}

impl RequiredField {
    /// The field name as it appears in request bodies.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserId => "userID",
            Self::Timestamp => "timestamp",
            Self::Name => "name",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while validating a decoded request payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// One or more required fields were absent, empty or zero.
    #[error("Missing parameters: {}.", join_fields(.0))]
    MissingFields(Vec<RequiredField>),
}

fn join_fields(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The first integration failure of a dispatch.
///
/// Integrations that were never reached because of this failure are not
/// reported anywhere.
#[derive(Debug, thiserror::Error)]
#[error("integration {integration} failed: {source}")]
pub struct DispatchError {
    /// Registry name of the failing integration.
    pub integration: String,
    /// The error returned by the integration.
    #[source]
    pub source: IntegrationError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_message_lists_fields_in_order() {
        let fields = vec![RequiredField::UserId, RequiredField::Timestamp];
        let err = ValidationError::MissingFields(fields);
        assert_eq!(err.to_string(), "Missing parameters: userID, timestamp.");
    }

    #[test]
    fn missing_single_field_message() {
        let err = ValidationError::MissingFields(vec![RequiredField::Name]);
        assert_eq!(err.to_string(), "Missing parameters: name.");
    }

    #[test]
    fn required_fields_sort_canonically() {
        let mut fields = vec![
            RequiredField::Name,
            RequiredField::UserId,
            RequiredField::Timestamp,
        ];
        fields.sort();
        assert_eq!(
            fields,
            vec![
                RequiredField::UserId,
                RequiredField::Timestamp,
                RequiredField::Name
            ]
        );
    }

    #[test]
    fn other_error_displays_message_verbatim() {
        let err = IntegrationError::other("some random error");
        assert_eq!(err.to_string(), "some random error");
    }

    #[test]
    fn rejected_error_mentions_status_and_body() {
        let err = IntegrationError::Rejected {
            status: 200,
            body: String::from("0"),
        };
        assert_eq!(
            err.to_string(),
            "rejected by downstream service (HTTP 200): 0"
        );
    }
}
