//! Canonical event models handed to integrations.
//!
//! A model is built once per request from a validated payload (see
//! [`crate::payload`]) and dropped when the dispatch finishes. Integrations
//! receive models by shared reference; an integration that wants to consume
//! fields out of [`Identification::user_traits`] or [`Event::properties`]
//! works on its own clone, so no integration can change what another one
//! observes during the same dispatch.
//!
//! All timestamps are Unix epoch seconds.

use serde::Serialize;
use serde_json::{Map, Value};

/// Open-ended user attributes attached to an identify call.
pub type Traits = Map<String, Value>;

/// Open-ended attributes attached to a track or page call.
pub type Properties = Map<String, Value>;

/// Current wall-clock time in Unix epoch seconds.
pub fn now_epoch_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}

/// An identify call: who the user is and what we know about them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identification {
    /// Caller's identifier for the user. Never empty.
    pub user_id: String,
    /// Free-form user attributes (`email`, `name`, ...).
    pub user_traits: Traits,
    /// When the caller says the identification happened.
    pub timestamp: i64,
    /// When this server accepted the request.
    pub received_at: i64,
}

/// A track call: something a user did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Event name, e.g. `account.created`. Never empty.
    pub name: String,
    /// Caller's identifier for the user. Never empty.
    pub user_id: String,
    /// Free-form event attributes.
    pub properties: Properties,
    /// When the caller says the event happened.
    pub timestamp: i64,
    /// When this server accepted the request.
    pub received_at: i64,
}

/// A page call: a user viewed a page.
///
/// Same shape as [`Event`], kept as its own type so integrations can treat
/// page views differently from tracked events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    /// Page name. Never empty.
    pub name: String,
    /// Caller's identifier for the user. Never empty.
    pub user_id: String,
    /// Free-form page attributes (`url`, `referrer`, ...).
    pub properties: Properties,
    /// When the caller says the page was viewed.
    pub timestamp: i64,
    /// When this server accepted the request.
    pub received_at: i64,
}

impl From<Event> for Page {
    fn from(event: Event) -> Self {
        Self {
            name: event.name,
            user_id: event.user_id,
            properties: event.properties,
            timestamp: event.timestamp,
            received_at: event.received_at,
        }
    }
}
