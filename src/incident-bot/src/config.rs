//! Bot configuration.
//!
//! Loaded from environment variables (after an optional `.env` file has been
//! read by the binary):
//!
//! Required:
//! - `SLACK_BOT_TOKEN` (or the older `SLACK_TOKEN`) - bot OAuth token (xoxb-...)
//! - `SLACK_SIGNING_SECRET` - signing secret for request verification
//!
//! Optional:
//! - `SLACK_API_BASE_URL` - Web API root, default `https://slack.com/api`
//! - `INCIDENT_LISTEN_ADDR` - listen address, default `0.0.0.0:50051`
//! - `INCIDENT_PRIVATE_CHANNELS` - create private incident channels
//! - `SLACK_REQUEST_MAX_AGE_SECS` - accepted request age, default 300
//! - `ENVIRONMENT` - deployment name, informational only

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:50051";
pub const DEFAULT_REQUEST_MAX_AGE_SECS: u64 = 300;

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset.
    #[error("{0} not set")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    /// A secret is present but empty.
    #[error("{0} is empty")]
    Empty(&'static str),
}

/// Runtime configuration of the bot.
#[derive(Clone)]
pub struct BotConfig {
    /// Bot OAuth token (xoxb-...).
    bot_token: SecretString,
    /// Signing secret for request verification.
    signing_secret: SecretString,
    /// Slack Web API root, without trailing slash.
    pub api_base_url: String,
    /// Address the HTTP server binds to.
    pub listen_addr: String,
    /// Create incident channels as private channels.
    pub private_channels: bool,
    /// Oldest request timestamp accepted by signature verification.
    pub request_max_age: Duration,
    /// Deployment environment name.
    pub environment: String,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token", &"[REDACTED]")
            .field("signing_secret", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("listen_addr", &self.listen_addr)
            .field("private_channels", &self.private_channels)
            .field("request_max_age", &self.request_max_age)
            .field("environment", &self.environment)
            .finish()
    }
}

impl BotConfig {
    /// Configuration with the given secrets and defaults for everything else.
    pub fn new(bot_token: impl Into<String>, signing_secret: impl Into<String>) -> Self {
        Self {
            bot_token: SecretString::new(bot_token.into().into()),
            signing_secret: SecretString::new(signing_secret.into().into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            private_channels: false,
            request_max_age: Duration::from_secs(DEFAULT_REQUEST_MAX_AGE_SECS),
            environment: "development".to_string(),
        }
    }

    /// Point the Slack client at another API root (used by tests).
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("SLACK_BOT_TOKEN")
            .or_else(|| lookup("SLACK_TOKEN"))
            .ok_or(ConfigError::Missing("SLACK_BOT_TOKEN"))?;
        let signing_secret =
            lookup("SLACK_SIGNING_SECRET").ok_or(ConfigError::Missing("SLACK_SIGNING_SECRET"))?;

        let mut config = Self::new(bot_token, signing_secret);

        if let Some(url) = lookup("SLACK_API_BASE_URL") {
            config = config.with_api_base_url(url);
        }
        if let Some(addr) = lookup("INCIDENT_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(value) = lookup("INCIDENT_PRIVATE_CHANNELS") {
            config.private_channels = parse_bool(&value).ok_or(ConfigError::Invalid {
                name: "INCIDENT_PRIVATE_CHANNELS",
                value,
            })?;
        }
        if let Some(value) = lookup("SLACK_REQUEST_MAX_AGE_SECS") {
            let secs = value.parse::<u64>().map_err(|_| ConfigError::Invalid {
                name: "SLACK_REQUEST_MAX_AGE_SECS",
                value: value.clone(),
            })?;
            config.request_max_age = Duration::from_secs(secs);
        }
        if let Some(env) = lookup("ENVIRONMENT") {
            config.environment = env;
        }

        Ok(config)
    }

    /// Get the bot token.
    pub fn bot_token(&self) -> &str {
        self.bot_token.expose_secret()
    }

    /// Get the signing secret.
    pub fn signing_secret(&self) -> &str {
        self.signing_secret.expose_secret()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.expose_secret().is_empty() {
            return Err(ConfigError::Empty("SLACK_BOT_TOKEN"));
        }
        if self.signing_secret.expose_secret().is_empty() {
            return Err(ConfigError::Empty("SLACK_SIGNING_SECRET"));
        }
        if !self.bot_token.expose_secret().starts_with("xoxb-") {
            warn!("Bot token doesn't start with 'xoxb-', this may be incorrect");
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
