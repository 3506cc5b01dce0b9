//! Mixpanel integration.
//!
//! Identify calls become Mixpanel *engage* (people profile) updates; track
//! and page calls become Mixpanel *track* events. Mixpanel's ingestion API
//! takes the JSON payload base64-encoded in a `data` query parameter:
//!
//! ```text
//! GET http://api.mixpanel.com/engage?data=<base64(json)>
//! ```
//!
//! The project token is read on every call, so the integration switches
//! itself on or off as the token appears or disappears without a restart.
//! Mixpanel answers `200` with a body of `0` when it rejects a payload;
//! that is reported as [`IntegrationError::Rejected`].

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use forwardlytics_core::{
    Event, Identification, Integration, IntegrationError, IntegrationRegistry, Page, Properties,
    Traits,
};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

/// Registry name of the Mixpanel integration.
pub const NAME: &str = "mixpanel";

/// Production Mixpanel ingestion endpoint.
pub const DEFAULT_API_URL: &str = "http://api.mixpanel.com/";

/// Environment variable holding the Mixpanel project token.
pub const TOKEN_ENV_VAR: &str = "MIXPANEL_TOKEN";

/// Where the Mixpanel project token comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Read the named environment variable on every call.
    Env(String),
    /// A token fixed at construction time.
    Fixed(String),
}

impl TokenSource {
    /// The token as of now. Empty when unset.
    pub fn current(&self) -> String {
        match self {
            Self::Env(var) => std::env::var(var).unwrap_or_default(),
            Self::Fixed(token) => token.clone(),
        }
    }
}

impl Default for TokenSource {
    fn default() -> Self {
        Self::Env(TOKEN_ENV_VAR.to_owned())
    }
}

/// Mixpanel settings.
#[derive(Debug, Clone)]
pub struct MixpanelConfig {
    /// Base URL of the ingestion API, with trailing slash.
    pub api_url: String,
    /// Project token source.
    pub token: TokenSource,
}

impl Default for MixpanelConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            token: TokenSource::default(),
        }
    }
}

/// Transport to the Mixpanel ingestion API.
///
/// Split out from [`Mixpanel`] so tests can capture payloads instead of
/// sending them.
#[async_trait]
pub trait MixpanelApi: Send + Sync {
    /// Send a JSON `payload` to `endpoint` (`engage` or `track`).
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        payload: &[u8],
    ) -> Result<(), IntegrationError>;
}

/// [`MixpanelApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct MixpanelHttpApi {
    client: reqwest::Client,
    api_url: String,
}

impl MixpanelHttpApi {
    /// Create a client for the API rooted at `api_url`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
        }
    }

    fn build_request(
        &self,
        method: Method,
        endpoint: &str,
        payload: &[u8],
    ) -> Result<reqwest::Request, IntegrationError> {
        let url = format!("{}{endpoint}", self.api_url);
        self.client
            .request(method, url)
            .query(&[("data", STANDARD.encode(payload))])
            .build()
            .map_err(|e| {
                IntegrationError::Request(format!("invalid Mixpanel request: {e}"))
            })
    }
}

#[async_trait]
impl MixpanelApi for MixpanelHttpApi {
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        payload: &[u8],
    ) -> Result<(), IntegrationError> {
        let request = self.build_request(method.clone(), endpoint, payload)?;
        let payload = String::from_utf8_lossy(payload);

        let response = self.client.execute(request).await.map_err(|e| {
            error!(
                %method,
                endpoint,
                %payload,
                error = %e,
                "Error sending request to Mixpanel API"
            );
            IntegrationError::Request(format!("Mixpanel request failed: {e}"))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!(
                %method,
                endpoint,
                %payload,
                error = %e,
                "Error reading Mixpanel response body"
            );
            IntegrationError::Request(format!("Mixpanel response unreadable: {e}"))
        })?;

        if status != StatusCode::OK || body == "0" {
            error!(
                %method,
                endpoint,
                %payload,
                http_status = status.as_u16(),
                response = %body,
                "Mixpanel API returned errors"
            );
            return Err(IntegrationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            %method,
            endpoint,
            %payload,
            http_status = status.as_u16(),
            response = %body,
            "Sent payload to Mixpanel"
        );
        Ok(())
    }
}

/// Profile update sent to the `engage` endpoint.
#[derive(Debug, Serialize)]
struct EngagePayload<'a> {
    #[serde(rename = "$set")]
    custom_fields: Traits,
    #[serde(rename = "$distinct_id")]
    distinct_id: &'a str,
    #[serde(rename = "$token")]
    token: &'a str,
    #[serde(rename = "$name")]
    name: String,
    #[serde(rename = "$email")]
    email: String,
}

/// Event sent to the `track` endpoint.
#[derive(Debug, Serialize)]
struct TrackPayload<'a> {
    event: &'a str,
    properties: Properties,
}

/// Remove `key` from `map` and render it as a string.
fn take_string(map: &mut Traits, key: &str) -> String {
    match map.remove(key) {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// The Mixpanel integration.
#[derive(Clone)]
pub struct Mixpanel {
    api: Arc<dyn MixpanelApi>,
    token: TokenSource,
}

impl std::fmt::Debug for Mixpanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mixpanel")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl Mixpanel {
    /// Create the integration talking to the configured Mixpanel API.
    pub fn new(config: &MixpanelConfig) -> Self {
        Self::with_api(
            Arc::new(MixpanelHttpApi::new(config.api_url.clone())),
            config.token.clone(),
        )
    }

    /// Create the integration over a custom transport.
    pub fn with_api(api: Arc<dyn MixpanelApi>, token: TokenSource) -> Self {
        Self { api, token }
    }

    fn event_properties(
        properties: &Properties,
        user_id: &str,
        timestamp: i64,
        token: &str,
    ) -> Properties {
        let mut properties = properties.clone();
        properties.insert(String::from("time"), Value::from(timestamp));
        properties.insert(String::from("token"), Value::from(token));
        properties.insert(String::from("distinct_id"), Value::from(user_id));
        properties.remove("email");
        properties
    }

    async fn send_track(&self, payload: &TrackPayload<'_>) -> Result<(), IntegrationError> {
        let body = serde_json::to_vec(payload)?;
        self.api.request(Method::GET, "track", &body).await
    }
}

#[async_trait]
impl Integration for Mixpanel {
    async fn identify(&self, identification: &Identification) -> Result<(), IntegrationError> {
        let token = self.token.current();
        let mut custom_fields = identification.user_traits.clone();
        let email = take_string(&mut custom_fields, "email");
        let name = take_string(&mut custom_fields, "name");
        custom_fields.insert(
            String::from("forwardlyticsReceivedAt"),
            Value::from(identification.received_at),
        );
        custom_fields.insert(
            String::from("forwardlyticsTimestamp"),
            Value::from(identification.timestamp),
        );

        let payload = EngagePayload {
            custom_fields,
            distinct_id: &identification.user_id,
            token: &token,
            name,
            email,
        };
        let body = serde_json::to_vec(&payload)?;
        self.api.request(Method::GET, "engage", &body).await
    }

    async fn track(&self, event: &Event) -> Result<(), IntegrationError> {
        let token = self.token.current();
        let payload = TrackPayload {
            event: &event.name,
            properties: Self::event_properties(
                &event.properties,
                &event.user_id,
                event.timestamp,
                &token,
            ),
        };
        self.send_track(&payload).await
    }

    async fn page(&self, page: &Page) -> Result<(), IntegrationError> {
        let token = self.token.current();
        let mut properties =
            Self::event_properties(&page.properties, &page.user_id, page.timestamp, &token);
        properties.insert(String::from("forwardlyticsPageView"), Value::Bool(true));
        let payload = TrackPayload {
            event: &page.name,
            properties,
        };
        self.send_track(&payload).await
    }

    fn enabled(&self) -> bool {
        !self.token.current().is_empty()
    }
}

/// Register the Mixpanel integration under [`NAME`].
pub fn register(registry: &IntegrationRegistry, config: &MixpanelConfig) {
    registry.register(NAME, Arc::new(Mixpanel::new(config)));
}
