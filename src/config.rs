//! Deployment configuration for the webhook server.
//!
//! Loaded from a TOML file; the webhook secret may also be supplied through
//! the `GITHUB_WEBHOOK_SECRET` environment variable, which takes precedence
//! over the file so the secret can stay out of checked-in configuration.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::dispatcher::DEFAULT_WEBHOOK_ROUTE;

/// Environment variable overriding the configured webhook secret.
pub const SECRET_ENV_VAR: &str = "GITHUB_WEBHOOK_SECRET";

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Could not read the configuration file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML or is missing required fields.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// No secret in the file and no environment override.
    #[error("webhook secret is empty; set webhook_secret or GITHUB_WEBHOOK_SECRET")]
    MissingSecret,
}

/// Which scheduling strategy the dispatcher uses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SchedulerSettings {
    /// Execute handlers inline with the request.
    Sync,
    /// Spawn one task per delivery, unbounded.
    Async,
    /// Fixed worker pool over a bounded queue.
    Queue {
        /// Maximum pending dispatches; submissions beyond this are rejected.
        queue_capacity: usize,
        /// Number of worker tasks draining the queue.
        workers: usize,
    },
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        SchedulerSettings::Sync
    }
}

/// Top-level configuration for the webhook server.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_address")]
    pub address: String,

    /// Route the platform delivers webhooks to.
    #[serde(default = "default_route")]
    pub webhook_route: String,

    /// Shared secret used to verify delivery signatures.
    #[serde(default)]
    pub webhook_secret: String,

    /// Scheduling strategy for handler execution.
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

fn default_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_route() -> String {
    DEFAULT_WEBHOOK_ROUTE.to_string()
}

impl DispatchConfig {
    /// Parses configuration from TOML text and applies the environment
    /// override for the secret.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: DispatchConfig = toml::from_str(content)?;
        if let Ok(secret) = std::env::var(SECRET_ENV_VAR) {
            config.webhook_secret = secret;
        }
        if config.webhook_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(config)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}
