//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ConfigError, Environment, IdentityConfig, PresenceConfig,
    TYPING_EXPIRY, TYPING_SEND_PERIOD,
};
