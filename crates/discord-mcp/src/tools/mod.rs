//! Discord MCP tools
//!
//! Tools are grouped by family:
//! - `logs`: read and scan game-server log channels
//! - `moderation`: kick, ban, timeout, and member lookups
//! - `roles`: role management and membership
//! - `threads`: thread lifecycle and membership
//! - `embeds`: rich embed messages and announcements
//! - `voice`: voice channels and members' voice state
//! - `permissions`: channel permission overwrites, lock and unlock
//! - `interactive`: buttons, select menus, and component panels
//!
//! Every tool validates its required parameters before making any remote call.

pub mod embeds;
pub mod interactive;
pub mod logs;
pub mod moderation;
pub mod permissions;
pub mod roles;
pub mod threads;
pub mod voice;

pub use embeds::embed_tools;
pub use interactive::interactive_tools;
pub use logs::log_tools;
pub use moderation::moderation_tools;
pub use permissions::permission_tools;
pub use roles::role_tools;
pub use threads::thread_tools;
pub use voice::voice_tools;

use crate::clients::models::{ApiChannel, ApiGuild, ApiMessage};
use crate::clients::{DiscordClient, DiscordError};
use crate::server::{McpServerError, McpServerResult, Tool};
use log_scan::{LogSource, PatternRegistry, SourceError};
use serde::de::DeserializeOwned;
use std::sync::Arc;

impl From<DiscordError> for McpServerError {
    fn from(error: DiscordError) -> Self {
        if error.is_not_found() {
            McpServerError::NotFound(error.to_string())
        } else {
            McpServerError::ExecutionError(error.to_string())
        }
    }
}

impl From<SourceError> for McpServerError {
    fn from(error: SourceError) -> Self {
        match error {
            SourceError::NotFound(message) => McpServerError::NotFound(message),
            SourceError::Remote(_) => McpServerError::ExecutionError(error.to_string()),
        }
    }
}

/// Client plus the guild used when a call omits `guildId`.
#[derive(Clone)]
pub struct DiscordHandle {
    pub client: Arc<DiscordClient>,
    pub default_guild_id: Option<String>,
}

impl DiscordHandle {
    pub fn new(client: Arc<DiscordClient>, default_guild_id: Option<String>) -> Self {
        Self {
            client,
            default_guild_id: default_guild_id.filter(|id| !id.is_empty()),
        }
    }

    /// The requested guild ID, or the configured default.
    pub fn guild_id(&self, requested: &Option<String>) -> McpServerResult<String> {
        optional(requested)
            .map(str::to_string)
            .or_else(|| self.default_guild_id.clone())
            .ok_or_else(|| McpServerError::InvalidParams("guildId cannot be null".to_string()))
    }

    /// Resolve and fetch the target guild.
    pub async fn guild(&self, requested: &Option<String>) -> McpServerResult<ApiGuild> {
        let guild_id = self.guild_id(requested)?;
        Ok(self.client.get_guild(&guild_id).await?)
    }

    /// Fetch a channel that messages and threads can be posted in.
    pub async fn text_channel(&self, channel_id: &str) -> McpServerResult<ApiChannel> {
        let channel = self.client.get_channel(channel_id).await?;
        if !channel.is_text() {
            return Err(DiscordError::ChannelNotFound(channel_id.to_string()).into());
        }
        Ok(channel)
    }

    /// Fetch any channel that belongs to a guild, returning it with its guild ID.
    pub async fn guild_channel(&self, channel_id: &str) -> McpServerResult<(ApiChannel, String)> {
        let channel = self.client.get_channel(channel_id).await?;
        match channel.guild_id.clone() {
            Some(guild_id) => Ok((channel, guild_id)),
            None => Err(DiscordError::ChannelNotFound(channel_id.to_string()).into()),
        }
    }

    /// Fetch a thread.
    pub async fn thread(&self, thread_id: &str) -> McpServerResult<ApiChannel> {
        Ok(self.client.get_thread(thread_id).await?)
    }
}

/// Jump link for a message posted in `channel`.
pub fn message_link(channel: &ApiChannel, message: &ApiMessage) -> String {
    crate::clients::models::permalink(channel.guild_id.as_deref(), &channel.id, &message.id)
}

/// Deserialize tool arguments.
pub fn parse_args<T: DeserializeOwned>(args: serde_json::Value) -> McpServerResult<T> {
    let args = if args.is_null() {
        serde_json::json!({})
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| McpServerError::InvalidParams(e.to_string()))
}

/// A required, non-empty string parameter.
pub fn required<'a>(value: &'a Option<String>, name: &str) -> McpServerResult<&'a str> {
    optional(value).ok_or_else(|| McpServerError::InvalidParams(format!("{} cannot be null", name)))
}

/// An optional string parameter; empty counts as absent.
pub fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Parse `#RRGGBB` or `RRGGBB`.
pub fn parse_color(hex: &str) -> McpServerResult<u32> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.is_empty() || digits.len() > 6 {
        return Err(McpServerError::InvalidParams(format!("Invalid hex color: {}", hex)));
    }
    u32::from_str_radix(digits, 16)
        .map_err(|_| McpServerError::InvalidParams(format!("Invalid hex color: {}", hex)))
}

/// Get all available MCP tools, in the order `tools/list` reports them.
///
/// # Example
///
/// ```rust,no_run
/// use discord_mcp::clients::{DiscordClient, DiscordConfig};
/// use discord_mcp::tools::{all_tools, DiscordHandle};
/// use log_scan::PatternRegistry;
/// use std::sync::Arc;
///
/// let config = DiscordConfig::from_env();
/// let client = Arc::new(DiscordClient::new(config.api.clone(), config.timeout()).unwrap());
/// let registry = Arc::new(PatternRegistry::builtin().unwrap());
///
/// let tools = all_tools(client.clone(), registry, DiscordHandle::new(client, config.default_guild_id));
/// println!("Available tools: {}", tools.len());
/// ```
pub fn all_tools(
    source: Arc<dyn LogSource>,
    registry: Arc<PatternRegistry>,
    discord: DiscordHandle,
) -> Vec<Arc<dyn Tool>> {
    let mut tools = Vec::new();

    // Log scanning (5)
    tools.extend(log_tools(source, registry));

    // Moderation (7)
    tools.extend(moderation_tools(discord.clone()));

    // Roles (8)
    tools.extend(role_tools(discord.clone()));

    // Threads (9)
    tools.extend(thread_tools(discord.clone()));

    // Embeds (4)
    tools.extend(embed_tools(discord.clone()));

    // Voice (7)
    tools.extend(voice_tools(discord.clone()));

    // Permissions (8)
    tools.extend(permission_tools(discord.clone()));

    // Interactive (7)
    tools.extend(interactive_tools(discord));

    tools
}
