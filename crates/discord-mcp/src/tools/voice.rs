//! Voice channel MCP tools
//!
//! Create, delete, and list voice channels, and move, disconnect, mute, or
//! deafen members in voice. Who is currently connected is only known over the
//! gateway, so these tools never report channel occupancy.

use super::moderation::member_schema;
use super::{optional, parse_args, required, DiscordHandle};
use crate::clients::models::{channel_kind, ApiChannel, ChannelPayload, MemberPayload};
use crate::clients::DiscordError;
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Largest user limit Discord accepts on a voice channel.
pub const MAX_USER_LIMIT: i64 = 99;

/// Bitrate bounds in kbps. Values under the minimum are ignored.
pub const MIN_BITRATE_KBPS: i64 = 8;
pub const MAX_BITRATE_KBPS: i64 = 384;

/// Get all voice tools.
pub fn voice_tools(discord: DiscordHandle) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CreateVoiceChannelTool(discord.clone())),
        Arc::new(DeleteVoiceChannelTool(discord.clone())),
        Arc::new(ListVoiceChannelsTool(discord.clone())),
        Arc::new(MoveMemberTool(discord.clone())),
        Arc::new(DisconnectMemberTool(discord.clone())),
        Arc::new(ServerMuteMemberTool(discord.clone())),
        Arc::new(ServerDeafenMemberTool(discord)),
    ]
}

/// Requested user limit, clamped to what Discord accepts. Negative means unset.
fn user_limit(requested: Option<i64>) -> Option<u32> {
    requested
        .filter(|limit| *limit >= 0)
        .map(|limit| limit.min(MAX_USER_LIMIT) as u32)
}

/// Requested bitrate in bits per second, capped at the maximum.
fn bitrate(requested_kbps: Option<i64>) -> Option<u32> {
    requested_kbps
        .filter(|kbps| *kbps >= MIN_BITRATE_KBPS)
        .map(|kbps| (kbps.min(MAX_BITRATE_KBPS) * 1000) as u32)
}

fn voice_line(channel: &ApiChannel) -> String {
    let limit = match channel.user_limit.unwrap_or(0) {
        0 => "∞".to_string(),
        n => n.to_string(),
    };
    format!(
        "- {} (ID: {}) [Limit: {}, Bitrate: {}kbps]",
        channel.name(),
        channel.id,
        limit,
        channel.bitrate.unwrap_or(0) / 1000
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateVoiceParams {
    guild_id: Option<String>,
    name: Option<String>,
    category_id: Option<String>,
    user_limit: Option<i64>,
    bitrate: Option<i64>,
}

/// Tool to create a voice channel.
pub struct CreateVoiceChannelTool(DiscordHandle);

#[async_trait]
impl Tool for CreateVoiceChannelTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("create_voice_channel", "Create a new voice channel")
            .with_category("voice")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "guildId": {
                        "type": "string",
                        "description": "Discord server ID (defaults to DISCORD_GUILD_ID)"
                    },
                    "name": {"type": "string", "description": "Voice channel name"},
                    "categoryId": {"type": "string", "description": "Category ID"},
                    "userLimit": {
                        "type": "integer",
                        "description": "User limit (0 = unlimited, max 99)",
                        "minimum": 0
                    },
                    "bitrate": {
                        "type": "integer",
                        "description": "Audio bitrate in kbps (8-384)",
                        "minimum": 8,
                        "maximum": 384
                    }
                },
                "required": ["name"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "create_voice_channel"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: CreateVoiceParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let name = required(&params.name, "name")?;

        let guild = self.0.client.get_guild(&guild_id).await?;

        let category = match optional(&params.category_id) {
            Some(category_id) => {
                let category = self.0.client.get_category(category_id).await?;
                if category.guild_id.as_deref() != Some(guild.id.as_str()) {
                    return Err(DiscordError::CategoryNotFound(category_id.to_string()).into());
                }
                Some(category)
            }
            None => None,
        };

        let payload = ChannelPayload {
            name: name.to_string(),
            kind: channel_kind::GUILD_VOICE,
            parent_id: category.as_ref().map(|c| c.id.clone()),
            user_limit: user_limit(params.user_limit),
            bitrate: bitrate(params.bitrate),
        };
        let created = self.0.client.create_channel(&guild.id, &payload).await?;
        info!("Created voice channel {} in {}", created.id, guild.name);

        let mut result = format!("Created voice channel: {} (ID: {})", created.name(), created.id);
        if let Some(category) = category {
            result.push_str(&format!(" in category: {}", category.name()));
        }
        Ok(ToolResult::text(result))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelParams {
    channel_id: Option<String>,
}

/// Tool to delete a voice channel.
pub struct DeleteVoiceChannelTool(DiscordHandle);

#[async_trait]
impl Tool for DeleteVoiceChannelTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("delete_voice_channel", "Delete a voice channel")
            .with_category("voice")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "channelId": {"type": "string", "description": "Discord voice channel ID"}
                },
                "required": ["channelId"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "delete_voice_channel"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ChannelParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;

        let channel = self.0.client.get_voice_channel(channel_id).await?;
        self.0.client.delete_channel(&channel.id).await?;

        Ok(ToolResult::text(format!("Deleted voice channel: {}", channel.name())))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuildParams {
    guild_id: Option<String>,
}

/// Tool to list the voice channels of a guild.
pub struct ListVoiceChannelsTool(DiscordHandle);

#[async_trait]
impl Tool for ListVoiceChannelsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_voice_channels", "List all voice channels in the server")
            .with_category("voice")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "guildId": {
                        "type": "string",
                        "description": "Discord server ID (defaults to DISCORD_GUILD_ID)"
                    }
                },
                "required": []
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "list_voice_channels"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: GuildParams = parse_args(args)?;
        let guild = self.0.guild(&params.guild_id).await?;

        let mut channels = self.0.client.list_guild_channels(&guild.id).await?;
        channels.retain(ApiChannel::is_voice);
        if channels.is_empty() {
            return Ok(ToolResult::text("No voice channels found in server"));
        }
        channels.sort_by_key(|c| c.position);

        let lines: Vec<String> = channels.iter().map(voice_line).collect();
        Ok(ToolResult::text(format!(
            "Retrieved {} voice channels:\n{}",
            channels.len(),
            lines.join("\n")
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveParams {
    guild_id: Option<String>,
    user_id: Option<String>,
    channel_id: Option<String>,
}

/// Tool to move a member to another voice channel.
pub struct MoveMemberTool(DiscordHandle);

#[async_trait]
impl Tool for MoveMemberTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("move_member", "Move a member to a different voice channel")
            .with_category("voice")
            .with_schema(member_schema(
                serde_json::json!({
                    "channelId": {"type": "string", "description": "Target voice channel ID"}
                }),
                &["channelId"],
            ))
    }

    #[instrument(skip(self, args, _context), fields(tool = "move_member"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: MoveParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let user_id = required(&params.user_id, "userId")?;
        let channel_id = required(&params.channel_id, "channelId")?;

        let guild = self.0.client.get_guild(&guild_id).await?;
        let member = self.0.client.get_member(&guild.id, user_id).await?;
        let channel = self.0.client.get_voice_channel(channel_id).await?;
        if channel.guild_id.as_deref() != Some(guild.id.as_str()) {
            return Err(DiscordError::VoiceChannelNotFound(channel_id.to_string()).into());
        }

        let payload = MemberPayload {
            channel_id: Some(Some(channel.id.clone())),
            ..MemberPayload::default()
        };
        self.0.client.modify_member(&guild.id, user_id, &payload).await?;

        Ok(ToolResult::text(format!(
            "Moved {} to {}",
            member.display_name(),
            channel.name()
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberParams {
    guild_id: Option<String>,
    user_id: Option<String>,
}

/// Tool to disconnect a member from voice.
pub struct DisconnectMemberTool(DiscordHandle);

#[async_trait]
impl Tool for DisconnectMemberTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("disconnect_member", "Disconnect a member from voice")
            .with_category("voice")
            .with_schema(member_schema(serde_json::json!({}), &[]))
    }

    #[instrument(skip(self, args, _context), fields(tool = "disconnect_member"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: MemberParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let user_id = required(&params.user_id, "userId")?;

        let guild = self.0.client.get_guild(&guild_id).await?;
        let member = self.0.client.get_member(&guild.id, user_id).await?;

        let payload = MemberPayload {
            channel_id: Some(None),
            ..MemberPayload::default()
        };
        self.0.client.modify_member(&guild.id, user_id, &payload).await?;

        Ok(ToolResult::text(format!(
            "Disconnected {} from voice",
            member.display_name()
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MuteParams {
    guild_id: Option<String>,
    user_id: Option<String>,
    mute: Option<bool>,
}

/// Tool to server mute or unmute a member.
pub struct ServerMuteMemberTool(DiscordHandle);

#[async_trait]
impl Tool for ServerMuteMemberTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("server_mute_member", "Server mute/unmute a member in voice")
            .with_category("voice")
            .with_schema(member_schema(
                serde_json::json!({
                    "mute": {"type": "boolean", "description": "Mute (true) or unmute (false)"}
                }),
                &["mute"],
            ))
    }

    #[instrument(skip(self, args, _context), fields(tool = "server_mute_member"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: MuteParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let user_id = required(&params.user_id, "userId")?;
        let mute = params
            .mute
            .ok_or_else(|| McpServerError::InvalidParams("mute cannot be null".to_string()))?;

        let guild = self.0.client.get_guild(&guild_id).await?;
        let member = self.0.client.get_member(&guild.id, user_id).await?;

        let payload = MemberPayload {
            mute: Some(mute),
            ..MemberPayload::default()
        };
        self.0.client.modify_member(&guild.id, user_id, &payload).await?;

        let action = if mute { "Server muted" } else { "Server unmuted" };
        Ok(ToolResult::text(format!("{} {}", action, member.display_name())))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeafenParams {
    guild_id: Option<String>,
    user_id: Option<String>,
    deafen: Option<bool>,
}

/// Tool to server deafen or undeafen a member.
pub struct ServerDeafenMemberTool(DiscordHandle);

#[async_trait]
impl Tool for ServerDeafenMemberTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("server_deafen_member", "Server deafen/undeafen a member in voice")
            .with_category("voice")
            .with_schema(member_schema(
                serde_json::json!({
                    "deafen": {"type": "boolean", "description": "Deafen (true) or undeafen (false)"}
                }),
                &["deafen"],
            ))
    }

    #[instrument(skip(self, args, _context), fields(tool = "server_deafen_member"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: DeafenParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let user_id = required(&params.user_id, "userId")?;
        let deafen = params
            .deafen
            .ok_or_else(|| McpServerError::InvalidParams("deafen cannot be null".to_string()))?;

        let guild = self.0.client.get_guild(&guild_id).await?;
        let member = self.0.client.get_member(&guild.id, user_id).await?;

        let payload = MemberPayload {
            deaf: Some(deafen),
            ..MemberPayload::default()
        };
        self.0.client.modify_member(&guild.id, user_id, &payload).await?;

        let action = if deafen { "Server deafened" } else { "Server undeafened" };
        Ok(ToolResult::text(format!("{} {}", action, member.display_name())))
    }
}
