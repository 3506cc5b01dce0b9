//! Configuration for the Forwardlytics server.
//!
//! All configuration comes from environment variables and is read once at
//! startup, except the Mixpanel token which the integration re-reads on
//! every call so it can be enabled without a restart.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `FORWARDLYTICS_HOST` | `0.0.0.0` | Address to bind |
//! | `FORWARDLYTICS_PORT` | `3000` | Port to bind |
//! | `FORWARDLYTICS_LOG_JSON` | `false` | Emit logs as JSON lines |
//! | `MIXPANEL_API_URL` | `http://api.mixpanel.com/` | Mixpanel ingestion API |
//! | `MIXPANEL_TOKEN` | unset | Mixpanel project token (read live) |

use std::net::SocketAddr;

use forwardlytics_integrations::IntegrationsConfig;
use forwardlytics_integrations::mixpanel::{DEFAULT_API_URL, MixpanelConfig, TokenSource};

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 3000;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable was set to a value that could not be parsed.
    #[error("invalid {var}: {message}")]
    Invalid {
        /// The offending variable.
        var: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
    /// Whether logs are written as JSON lines.
    pub log_json: bool,
    /// Settings for the built-in integrations.
    pub integrations: IntegrationsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            log_json: false,
            integrations: IntegrationsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`, which returns the value of a
    /// variable or `None` when it is unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("FORWARDLYTICS_HOST")
            .unwrap_or_else(|| DEFAULT_HOST.to_owned());

        let port = match lookup("FORWARDLYTICS_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "FORWARDLYTICS_PORT",
                message: format!("{e}"),
            })?,
            None => DEFAULT_PORT,
        };

        let log_json = match lookup("FORWARDLYTICS_LOG_JSON") {
            Some(raw) => raw.parse::<bool>().map_err(|e| ConfigError::Invalid {
                var: "FORWARDLYTICS_LOG_JSON",
                message: format!("{e}"),
            })?,
            None => false,
        };

        let api_url = lookup("MIXPANEL_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());

        Ok(Self {
            host,
            port,
            log_json,
            integrations: IntegrationsConfig {
                mixpanel: MixpanelConfig {
                    api_url,
                    token: TokenSource::default(),
                },
            },
        })
    }

    /// The socket address to bind.
    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid {
                var: "FORWARDLYTICS_HOST",
                message: format!("{e}"),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert!(!config.log_json);
        assert_eq!(config.integrations.mixpanel.api_url, DEFAULT_API_URL);
        assert_eq!(
            config.integrations.mixpanel.token,
            TokenSource::Env(String::from("MIXPANEL_TOKEN"))
        );
    }

    #[test]
    fn values_are_read_from_lookup() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("FORWARDLYTICS_HOST", "127.0.0.1"),
            ("FORWARDLYTICS_PORT", "8080"),
            ("FORWARDLYTICS_LOG_JSON", "true"),
            ("MIXPANEL_API_URL", "http://localhost:9999/"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address().unwrap().to_string(), "127.0.0.1:8080");
        assert!(config.log_json);
        assert_eq!(
            config.integrations.mixpanel.api_url,
            "http://localhost:9999/"
        );
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[("FORWARDLYTICS_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().starts_with("invalid FORWARDLYTICS_PORT"));
    }

    #[test]
    fn invalid_host_is_rejected_at_bind_time() {
        let config = ServerConfig {
            host: String::from("not a host"),
            ..ServerConfig::default()
        };
        assert!(config.bind_address().is_err());
    }
}
