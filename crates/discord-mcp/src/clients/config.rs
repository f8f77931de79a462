//! Discord client configuration.
//!
//! Configuration is loaded from environment variables with defaults that point
//! at the public Discord v10 REST API.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default Discord REST API base URL.
pub const DEFAULT_API_URL: &str = "https://discord.com/api/v10";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Configuration for the Discord client and tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// REST API endpoint and bot token.
    pub api: ServiceEndpoint,

    /// Guild used when a tool call omits `guildId`.
    pub default_guild_id: Option<String>,

    /// Request timeout in seconds.
    pub default_timeout_secs: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api: ServiceEndpoint {
                base_url: DEFAULT_API_URL.to_string(),
                api_key: None,
            },
            default_guild_id: None,
            default_timeout_secs: 30,
        }
    }
}

impl DiscordConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DISCORD_TOKEN`: Bot token (required at startup, see [`Self::validate`])
    /// - `DISCORD_GUILD_ID`: Default guild for guild-scoped tools
    /// - `DISCORD_API_URL`: REST API base URL (default: https://discord.com/api/v10)
    /// - `DISCORD_TIMEOUT_SECS`: Request timeout in seconds (default: 30)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            api: ServiceEndpoint {
                base_url: std::env::var("DISCORD_API_URL").unwrap_or(default.api.base_url),
                api_key: non_empty_env("DISCORD_TOKEN"),
            },
            default_guild_id: non_empty_env("DISCORD_GUILD_ID"),
            default_timeout_secs: std::env::var("DISCORD_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.default_timeout_secs),
        }
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// Check that everything needed to talk to Discord is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api.has_auth() {
            return Err(ConfigError::MissingEnvVar("DISCORD_TOKEN".to_string()));
        }
        if self.default_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DISCORD_TIMEOUT_SECS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// A REST endpoint with its credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    /// Base URL (e.g., "https://discord.com/api/v10").
    pub base_url: String,

    /// Bot token sent as `Authorization: Bot <token>`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl ServiceEndpoint {
    /// Build a full URL by appending a path to the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Check if token authentication is available.
    pub fn has_auth(&self) -> bool {
        self.api_key.is_some()
    }
}
