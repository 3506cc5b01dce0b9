//! Decoded request payloads and their validation into event models.
//!
//! Payloads are the loosely-typed shape callers send. Every field is
//! optional at the decoding stage so that absent fields surface as a single
//! [`ValidationError::MissingFields`] listing all of them, rather than as a
//! decoding error about the first one. Field names follow the wire format
//! (`userID`, `timestamp`, `name`, `traits`, `properties`).
//!
//! `received_at` is never read from the payload. The `validate` methods
//! stamp the current time; the `validate_at` variants take it explicitly.

use serde::Deserialize;

use crate::error::{RequiredField, ValidationError};
use crate::model::{Event, Identification, Page, Properties, Traits, now_epoch_seconds};

/// Body of an identify request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IdentifyPayload {
    /// Caller's identifier for the user.
    #[serde(rename = "userID")]
    pub user_id: Option<String>,
    /// Event time in epoch seconds.
    pub timestamp: Option<i64>,
    /// User attributes.
    pub traits: Option<Traits>,
    /// Accepted as user attributes when `traits` is absent.
    pub properties: Option<Properties>,
}

/// Body of a track or page request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventPayload {
    /// Event or page name.
    pub name: Option<String>,
    /// Caller's identifier for the user.
    #[serde(rename = "userID")]
    pub user_id: Option<String>,
    /// Event time in epoch seconds.
    pub timestamp: Option<i64>,
    /// Event attributes.
    pub properties: Option<Properties>,
}

/// Take a non-empty string, or record the field as missing.
fn required_str(
    value: Option<String>,
    field: RequiredField,
    missing: &mut Vec<RequiredField>,
) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => {
            missing.push(field);
            String::new()
        }
    }
}

/// Take a non-zero timestamp, or record the field as missing.
fn required_timestamp(value: Option<i64>, missing: &mut Vec<RequiredField>) -> i64 {
    match value {
        Some(v) if v != 0 => v,
        _ => {
            missing.push(RequiredField::Timestamp);
            0
        }
    }
}

fn finish(mut missing: Vec<RequiredField>) -> Result<(), ValidationError> {
    if missing.is_empty() {
        return Ok(());
    }
    missing.sort_unstable();
    Err(ValidationError::MissingFields(missing))
}

impl IdentifyPayload {
    /// Validate and build an [`Identification`] received now.
    pub fn validate(self) -> Result<Identification, ValidationError> {
        self.validate_at(now_epoch_seconds())
    }

    /// Validate and build an [`Identification`] with an explicit receive time.
    pub fn validate_at(self, received_at: i64) -> Result<Identification, ValidationError> {
        let mut missing = Vec::new();
        let user_id = required_str(self.user_id, RequiredField::UserId, &mut missing);
        let timestamp = required_timestamp(self.timestamp, &mut missing);
        finish(missing)?;

        Ok(Identification {
            user_id,
            user_traits: self.traits.or(self.properties).unwrap_or_default(),
            timestamp,
            received_at,
        })
    }
}

impl EventPayload {
    /// Validate and build a tracked [`Event`] received now.
    pub fn validate_event(self) -> Result<Event, ValidationError> {
        self.validate_event_at(now_epoch_seconds())
    }

    /// Validate and build a tracked [`Event`] with an explicit receive time.
    pub fn validate_event_at(self, received_at: i64) -> Result<Event, ValidationError> {
        let mut missing = Vec::new();
        let user_id = required_str(self.user_id, RequiredField::UserId, &mut missing);
        let timestamp = required_timestamp(self.timestamp, &mut missing);
        let name = required_str(self.name, RequiredField::Name, &mut missing);
        finish(missing)?;

        Ok(Event {
            name,
            user_id,
            properties: self.properties.unwrap_or_default(),
            timestamp,
            received_at,
        })
    }

    /// Validate and build a [`Page`] received now.
    pub fn validate_page(self) -> Result<Page, ValidationError> {
        self.validate_event().map(Page::from)
    }

    /// Validate and build a [`Page`] with an explicit receive time.
    pub fn validate_page_at(self, received_at: i64) -> Result<Page, ValidationError> {
        self.validate_event_at(received_at).map(Page::from)
    }
}
