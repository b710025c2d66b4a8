//! Configuration management for the page relay
//!
//! Everything is read from the environment once at startup and handed to the
//! server; nothing in the request path touches the environment.

use std::time::Duration;

use secrecy::SecretString;

use crate::{Error, Result};

/// Default Messenger Send API endpoint
pub const DEFAULT_SEND_URL: &str = "https://graph.facebook.com/v18.0/me/messages";

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 3000;

/// Page relay configuration
#[derive(Debug)]
pub struct Config {
    /// Secret the platform must present during the webhook setup handshake
    pub verify_token: SecretString,

    /// Credential store connection settings
    pub database: DatabaseConfig,

    /// AI responder endpoint
    pub responder_url: String,

    /// Messenger Send API endpoint
    pub send_url: String,

    /// HTTP API server port
    pub port: u16,

    /// Bounds on each external call
    pub timeouts: TimeoutConfig,
}

/// Credential store (`PostgreSQL`) connection settings
#[derive(Debug)]
pub struct DatabaseConfig {
    /// Server host name
    pub host: String,

    /// Server port
    pub port: u16,

    /// Login role
    pub user: String,

    /// Login password
    pub password: SecretString,

    /// Database holding the `page_credentials` table
    pub database: String,

    /// Upper bound on pooled connections
    pub max_connections: u32,
}

/// Per-call timeouts for the external collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Credential lookup (acquire + query)
    pub credential: Duration,

    /// AI responder request
    pub responder: Duration,

    /// Send API request
    pub dispatch: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            credential: Duration::from_secs(5),
            responder: Duration::from_secs(30),
            dispatch: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a required variable is missing or a value fails to parse
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns error if a required variable is missing or a value fails to parse
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Config(format!("{key} must be set")))
        };

        let database = DatabaseConfig {
            host: required("DB_HOST")?,
            port: parse_or(&lookup, "DB_PORT", 5432)?,
            user: required("DB_USER")?,
            password: SecretString::from(required("DB_PASSWORD")?),
            database: required("DB_NAME")?,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
        };

        let defaults = TimeoutConfig::default();
        let timeouts = TimeoutConfig {
            credential: secs_or(&lookup, "CREDENTIAL_TIMEOUT_SECS", defaults.credential)?,
            responder: secs_or(&lookup, "RESPONDER_TIMEOUT_SECS", defaults.responder)?,
            dispatch: secs_or(&lookup, "DISPATCH_TIMEOUT_SECS", defaults.dispatch)?,
        };

        let port = match lookup("RELAY_PORT").or_else(|| lookup("PORT")) {
            Some(raw) => raw
                .parse()
                .map_err(|e| Error::Config(format!("invalid port {raw:?}: {e}")))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            verify_token: SecretString::from(required("VERIFY_TOKEN")?),
            database,
            responder_url: required("AI_RESPONDER_URL")?,
            send_url: lookup("MESSENGER_SEND_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_SEND_URL.to_string()),
            port,
            timeouts,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.parse()
            .map_err(|e| Error::Config(format!("invalid {key} {raw:?}: {e}")))
    })
}

fn secs_or<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, key, default.as_secs()).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("VERIFY_TOKEN", "s3cret"),
            ("DB_HOST", "db.internal"),
            ("DB_USER", "relay"),
            ("DB_PASSWORD", "hunter2"),
            ("DB_NAME", "pages"),
            ("AI_RESPONDER_URL", "http://ai.internal/reply"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<Config> {
        Config::from_lookup(|key| env.get(key).map(ToString::to_string))
    }

    #[test]
    fn loads_required_values_with_defaults() {
        let config = load(&base_env()).unwrap();

        assert_eq!(config.verify_token.expose_secret(), "s3cret");
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.responder_url, "http://ai.internal/reply");
        assert_eq!(config.send_url, DEFAULT_SEND_URL);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.timeouts, TimeoutConfig::default());
    }

    #[test]
    fn missing_verify_token_is_rejected() {
        let mut env = base_env();
        env.remove("VERIFY_TOKEN");

        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("VERIFY_TOKEN"));
    }

    #[test]
    fn empty_required_value_counts_as_missing() {
        let mut env = base_env();
        env.insert("DB_HOST", "");

        assert!(matches!(load(&env), Err(Error::Config(_))));
    }

    #[test]
    fn overrides_are_parsed() {
        let mut env = base_env();
        env.insert("DB_PORT", "6543");
        env.insert("PORT", "8080");
        env.insert("DISPATCH_TIMEOUT_SECS", "2");
        env.insert("MESSENGER_SEND_URL", "http://localhost:9999/send");

        let config = load(&env).unwrap();
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.port, 8080);
        assert_eq!(config.timeouts.dispatch, Duration::from_secs(2));
        assert_eq!(config.send_url, "http://localhost:9999/send");
    }

    #[test]
    fn relay_port_wins_over_port() {
        let mut env = base_env();
        env.insert("RELAY_PORT", "4000");
        env.insert("PORT", "8080");

        assert_eq!(load(&env).unwrap().port, 4000);
    }

    #[test]
    fn invalid_number_is_rejected() {
        let mut env = base_env();
        env.insert("DB_PORT", "not-a-port");

        assert!(matches!(load(&env), Err(Error::Config(_))));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = load(&base_env()).unwrap();
        let rendered = format!("{config:?}");

        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("hunter2"));
    }
}
