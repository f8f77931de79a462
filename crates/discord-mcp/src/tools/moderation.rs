//! Moderation MCP tools
//!
//! Kick, ban, and timeout members, and look up members and bans. Guild-scoped
//! tools fall back to the configured default guild when `guildId` is omitted.

use super::{optional, parse_args, required, DiscordHandle};
use crate::clients::models::{snowflake_timestamp, ApiMember};
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use serde::Deserialize;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{info, instrument};

/// Longest timeout Discord accepts (28 days).
pub const MAX_TIMEOUT_MINUTES: i64 = 40_320;

/// Most days of history a ban may delete.
pub const MAX_DELETE_DAYS: i64 = 7;

const NO_REASON: &str = "No reason provided";

/// Get all moderation tools.
pub fn moderation_tools(discord: DiscordHandle) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(KickMemberTool(discord.clone())),
        Arc::new(BanMemberTool(discord.clone())),
        Arc::new(UnbanMemberTool(discord.clone())),
        Arc::new(TimeoutMemberTool(discord.clone())),
        Arc::new(RemoveTimeoutTool(discord.clone())),
        Arc::new(ListBansTool(discord.clone())),
        Arc::new(GetMemberInfoTool(discord)),
    ]
}

pub(super) fn member_schema(extra: serde_json::Value, extra_required: &[&str]) -> serde_json::Value {
    let mut properties = serde_json::json!({
        "guildId": {
            "type": "string",
            "description": "Discord server ID (defaults to DISCORD_GUILD_ID)"
        },
        "userId": {
            "type": "string",
            "description": "Discord user ID"
        }
    });
    if let (Some(target), Some(extra)) = (properties.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }

    let mut required = vec!["userId"];
    required.extend_from_slice(extra_required);

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

fn with_reason(message: String, reason: Option<&str>) -> String {
    match reason {
        Some(reason) => format!("{}. Reason: {}", message, reason),
        None => message,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberParams {
    guild_id: Option<String>,
    user_id: Option<String>,
    reason: Option<String>,
}

/// Tool to kick a member.
pub struct KickMemberTool(DiscordHandle);

#[async_trait]
impl Tool for KickMemberTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("kick_member", "Kick a member from the server")
            .with_category("moderation")
            .with_schema(member_schema(
                serde_json::json!({"reason": {"type": "string", "description": "Reason for kick"}}),
                &[],
            ))
    }

    #[instrument(skip(self, args, _context), fields(tool = "kick_member"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: MemberParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let user_id = required(&params.user_id, "userId")?;
        let reason = optional(&params.reason);

        let guild = self.0.client.get_guild(&guild_id).await?;
        let member = self.0.client.get_member(&guild.id, user_id).await?;

        self.0
            .client
            .kick_member(&guild.id, user_id, reason.unwrap_or(NO_REASON))
            .await?;
        info!("Kicked {} from {}", user_id, guild.name);

        Ok(ToolResult::text(with_reason(
            format!("Kicked {} from the server", member.display_name()),
            reason,
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BanParams {
    guild_id: Option<String>,
    user_id: Option<String>,
    reason: Option<String>,
    delete_messages: Option<i64>,
}

/// Tool to ban a user.
pub struct BanMemberTool(DiscordHandle);

#[async_trait]
impl Tool for BanMemberTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("ban_member", "Ban a user from the server")
            .with_category("moderation")
            .with_schema(member_schema(
                serde_json::json!({
                    "reason": {"type": "string", "description": "Reason for ban"},
                    "deleteMessages": {
                        "type": "integer",
                        "description": "Days of messages to delete (0-7)",
                        "minimum": 0,
                        "maximum": 7
                    }
                }),
                &[],
            ))
    }

    #[instrument(skip(self, args, _context), fields(tool = "ban_member"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: BanParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let user_id = required(&params.user_id, "userId")?;
        let reason = optional(&params.reason);

        let guild = self.0.client.get_guild(&guild_id).await?;

        // The user may already have left; fall back to the raw ID.
        let user_name = match self.0.client.get_member(&guild.id, user_id).await {
            Ok(member) => member.display_name().to_string(),
            Err(_) => format!("User {}", user_id),
        };

        let days = params.delete_messages.unwrap_or(0).clamp(0, MAX_DELETE_DAYS);
        let seconds = (days * 86_400) as u32;

        self.0
            .client
            .ban_member(&guild.id, user_id, seconds, reason.unwrap_or(NO_REASON))
            .await?;
        info!("Banned {} from {}", user_id, guild.name);

        Ok(ToolResult::text(with_reason(
            format!("Banned {} from the server", user_name),
            reason,
        )))
    }
}

/// Tool to lift a ban.
pub struct UnbanMemberTool(DiscordHandle);

#[async_trait]
impl Tool for UnbanMemberTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("unban_member", "Unban a user from the server")
            .with_category("moderation")
            .with_schema(member_schema(serde_json::json!({}), &[]))
    }

    #[instrument(skip(self, args, _context), fields(tool = "unban_member"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: MemberParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let user_id = required(&params.user_id, "userId")?;

        let guild = self.0.client.get_guild(&guild_id).await?;
        self.0.client.unban_member(&guild.id, user_id).await?;

        Ok(ToolResult::text(format!("Unbanned user {} from the server", user_id)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeoutParams {
    guild_id: Option<String>,
    user_id: Option<String>,
    duration: Option<i64>,
    reason: Option<String>,
}

/// Tool to time out a member.
pub struct TimeoutMemberTool(DiscordHandle);

#[async_trait]
impl Tool for TimeoutMemberTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "timeout_member",
            "Timeout a member (prevent them from sending messages)",
        )
        .with_category("moderation")
        .with_schema(member_schema(
            serde_json::json!({
                "duration": {
                    "type": "integer",
                    "description": "Timeout duration in minutes (max 40320 = 28 days)",
                    "minimum": 1
                },
                "reason": {"type": "string", "description": "Reason for timeout"}
            }),
            &["duration"],
        ))
    }

    #[instrument(skip(self, args, _context), fields(tool = "timeout_member"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: TimeoutParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let user_id = required(&params.user_id, "userId")?;
        let duration = params.duration.filter(|d| *d > 0).ok_or_else(|| {
            McpServerError::InvalidParams("duration must be a positive number".to_string())
        })?;
        let reason = optional(&params.reason);

        let guild = self.0.client.get_guild(&guild_id).await?;
        let member = self.0.client.get_member(&guild.id, user_id).await?;

        let minutes = duration.min(MAX_TIMEOUT_MINUTES);
        let until = Utc::now() + Duration::minutes(minutes);
        self.0
            .client
            .set_timeout(&guild.id, user_id, Some(until), Some(reason.unwrap_or(NO_REASON)))
            .await?;

        Ok(ToolResult::text(with_reason(
            format!("Timed out {} for {} minutes", member.display_name(), minutes),
            reason,
        )))
    }
}

/// Tool to clear a member's timeout.
pub struct RemoveTimeoutTool(DiscordHandle);

#[async_trait]
impl Tool for RemoveTimeoutTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("remove_timeout", "Remove timeout from a member")
            .with_category("moderation")
            .with_schema(member_schema(serde_json::json!({}), &[]))
    }

    #[instrument(skip(self, args, _context), fields(tool = "remove_timeout"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: MemberParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let user_id = required(&params.user_id, "userId")?;

        let guild = self.0.client.get_guild(&guild_id).await?;
        let member = self.0.client.get_member(&guild.id, user_id).await?;
        self.0.client.set_timeout(&guild.id, user_id, None, None).await?;

        Ok(ToolResult::text(format!(
            "Removed timeout from {}",
            member.display_name()
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuildParams {
    guild_id: Option<String>,
}

/// Tool to list banned users.
pub struct ListBansTool(DiscordHandle);

#[async_trait]
impl Tool for ListBansTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_bans", "List all banned users in the server")
            .with_category("moderation")
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

    #[instrument(skip(self, args, _context), fields(tool = "list_bans"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: GuildParams = parse_args(args)?;
        let guild = self.0.guild(&params.guild_id).await?;

        let bans = self.0.client.list_bans(&guild.id).await?;
        if bans.is_empty() {
            return Ok(ToolResult::text("No banned users in server"));
        }

        let lines: Vec<String> = bans
            .iter()
            .map(|ban| {
                format!(
                    "- {} (ID: {}) - Reason: {}",
                    ban.user.username,
                    ban.user.id,
                    ban.reason.as_deref().unwrap_or("No reason")
                )
            })
            .collect();

        Ok(ToolResult::text(format!(
            "Retrieved {} banned users:\n{}",
            bans.len(),
            lines.join("\n")
        )))
    }
}

/// Tool to describe a member.
pub struct GetMemberInfoTool(DiscordHandle);

#[async_trait]
impl Tool for GetMemberInfoTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_member_info", "Get detailed information about a member")
            .with_category("moderation")
            .with_schema(member_schema(serde_json::json!({}), &[]))
    }

    #[instrument(skip(self, args, _context), fields(tool = "get_member_info"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: MemberParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let user_id = required(&params.user_id, "userId")?;

        let guild = self.0.client.get_guild(&guild_id).await?;
        let member = self.0.client.get_member(&guild.id, user_id).await?;

        let mut roles = self.0.client.list_roles(&guild.id).await?;
        roles.retain(|role| member.roles.contains(&role.id));
        roles.sort_by(|a, b| b.position.cmp(&a.position));
        let role_names: Vec<&str> = roles.iter().map(|role| role.name.as_str()).collect();

        Ok(ToolResult::text(render_member_info(&member, &role_names)))
    }
}

fn render_member_info(member: &ApiMember, role_names: &[&str]) -> String {
    let iso = |ts: chrono::DateTime<Utc>| ts.to_rfc3339_opts(SecondsFormat::Secs, true);
    let unknown = || "unknown".to_string();

    let mut info = String::from("**Member Info:**\n");
    let _ = writeln!(info, "- Display Name: {}", member.display_name());
    let _ = writeln!(info, "- Username: {}", member.username());
    let _ = writeln!(info, "- ID: {}", member.id());
    let is_bot = member.user.as_ref().is_some_and(|u| u.bot);
    let _ = writeln!(info, "- Bot: {}", if is_bot { "Yes" } else { "No" });
    let _ = writeln!(
        info,
        "- Joined Server: {}",
        member.joined_at.map(iso).unwrap_or_else(unknown)
    );
    let _ = writeln!(
        info,
        "- Account Created: {}",
        snowflake_timestamp(member.id()).map(iso).unwrap_or_else(unknown)
    );
    let roles = if role_names.is_empty() {
        "None".to_string()
    } else {
        role_names.join(", ")
    };
    let _ = writeln!(info, "- Roles: {}", roles);
    if let Some(until) = member.timeout_until(Utc::now()) {
        let _ = writeln!(info, "- Timeout Until: {}", iso(until));
    }

    info
}
