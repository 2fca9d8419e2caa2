//! Application configuration structs
//!
//! Loads configuration from environment variables and an optional `.env` file.

use chat_core::UserId;
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Minimum interval between outbound typing notifications
pub const TYPING_SEND_PERIOD: Duration = Duration::from_millis(1000);

/// Quiet period after which a peer's typing indicator clears
pub const TYPING_EXPIRY: Duration = Duration::from_millis(2000);

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub identity: IdentityConfig,
    pub presence: PresenceConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Local identity used when the transport does not supply one
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Stable id; a random one is generated when unset
    pub user_id: Option<UserId>,
    pub display_name: String,
}

/// Presence timing and event fan-out settings
///
/// The timings are fixed at [`TYPING_SEND_PERIOD`] and [`TYPING_EXPIRY`] and
/// are not read from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceConfig {
    /// Minimum interval between outbound typing notifications
    pub typing_send_period: Duration,
    /// Quiet period before a remote typing indicator expires
    pub typing_expiry: Duration,
    /// Capacity of the session event broadcast channel
    pub event_buffer: usize,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            typing_send_period: TYPING_SEND_PERIOD,
            typing_expiry: TYPING_EXPIRY,
            event_buffer: default_event_buffer(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "peer-chat".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_display_name() -> String {
    "anonymous".to_string()
}

fn default_event_buffer() -> usize {
    256
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparseable value
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("APP_ENV") {
            Some(s) => Environment::parse(&s).ok_or(ConfigError::InvalidValue("APP_ENV", s))?,
            None => default_env(),
        };

        let user_id = match lookup("CHAT_USER_ID") {
            Some(s) => Some(
                UserId::parse(&s).map_err(|_| ConfigError::InvalidValue("CHAT_USER_ID", s))?,
            ),
            None => None,
        };

        let event_buffer = match lookup("CHAT_EVENT_BUFFER") {
            Some(s) => match s.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidValue("CHAT_EVENT_BUFFER", s)),
            },
            None => default_event_buffer(),
        };

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            identity: IdentityConfig {
                user_id,
                display_name: lookup("CHAT_DISPLAY_NAME").unwrap_or_else(default_display_name),
            },
            presence: PresenceConfig {
                event_buffer,
                ..PresenceConfig::default()
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
