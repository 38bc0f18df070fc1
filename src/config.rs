//! Configuration management for RAX WS Relay
//!
//! Layers built-in defaults, an optional `config.toml`, `RELAY_*` environment
//! variables and finally the bare `HOST` / `PORT` variables.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8765;

/// Listener configuration for the relay server
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Interface to bind. Environment: HOST or RELAY_HOST
    pub host: String,

    /// TCP port for WebSocket connections. Environment: PORT or RELAY_PORT
    pub port: u16,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl RelayConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Self::defaults()?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("RELAY"))
            .set_override_option("host", std::env::var("HOST").ok())?
            .set_override_option("port", std::env::var("PORT").ok())?;

        Self::from_config(builder.build()?)
    }

    /// Builder pre-seeded with the built-in defaults.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("host", DEFAULT_HOST)?
            .set_default("port", i64::from(DEFAULT_PORT))
    }

    /// Deserialize and validate an already-assembled configuration.
    pub fn from_config(settings: Config) -> Result<Self, ConfigError> {
        let config: RelayConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Message("host cannot be empty".into()));
        }

        if self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        Ok(())
    }

    /// Get bind address and port as a socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
