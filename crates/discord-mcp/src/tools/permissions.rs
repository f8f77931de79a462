//! Channel permission MCP tools
//!
//! Permission overwrites for roles and members, presets for common staff and
//! member setups, category sync, and channel lock/unlock. Permissions are
//! addressed by their upper-case names (`VIEW_CHANNEL`, `MESSAGE_SEND`, ...).

use super::{optional, parse_args, required, DiscordHandle};
use crate::clients::models::{overwrite_kind, ApiChannel, ApiOverwrite};
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A channel permission: its name, bit, and display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    pub name: &'static str,
    pub bit: u8,
    pub display: &'static str,
}

impl Permission {
    const fn new(name: &'static str, bit: u8, display: &'static str) -> Self {
        Self { name, bit, display }
    }

    pub fn mask(self) -> u64 {
        1 << self.bit
    }
}

pub const CREATE_INSTANT_INVITE: Permission = Permission::new("CREATE_INSTANT_INVITE", 0, "Create Instant Invite");
pub const MANAGE_CHANNEL: Permission = Permission::new("MANAGE_CHANNEL", 4, "Manage Channels");
pub const MESSAGE_ADD_REACTION: Permission = Permission::new("MESSAGE_ADD_REACTION", 6, "Add Reactions");
pub const PRIORITY_SPEAKER: Permission = Permission::new("PRIORITY_SPEAKER", 8, "Priority Speaker");
pub const VOICE_STREAM: Permission = Permission::new("VOICE_STREAM", 9, "Video");
pub const VIEW_CHANNEL: Permission = Permission::new("VIEW_CHANNEL", 10, "View Channel");
pub const MESSAGE_SEND: Permission = Permission::new("MESSAGE_SEND", 11, "Send Messages");
pub const MESSAGE_TTS: Permission = Permission::new("MESSAGE_TTS", 12, "Send TTS Messages");
pub const MESSAGE_MANAGE: Permission = Permission::new("MESSAGE_MANAGE", 13, "Manage Messages");
pub const MESSAGE_EMBED_LINKS: Permission = Permission::new("MESSAGE_EMBED_LINKS", 14, "Embed Links");
pub const MESSAGE_ATTACH_FILES: Permission = Permission::new("MESSAGE_ATTACH_FILES", 15, "Attach Files");
pub const MESSAGE_HISTORY: Permission = Permission::new("MESSAGE_HISTORY", 16, "Read History");
pub const MESSAGE_MENTION_EVERYONE: Permission =
    Permission::new("MESSAGE_MENTION_EVERYONE", 17, "Mention Everyone");
pub const MESSAGE_EXT_EMOJI: Permission = Permission::new("MESSAGE_EXT_EMOJI", 18, "Use External Emojis");
pub const VOICE_CONNECT: Permission = Permission::new("VOICE_CONNECT", 20, "Connect");
pub const VOICE_SPEAK: Permission = Permission::new("VOICE_SPEAK", 21, "Speak");
pub const VOICE_MUTE_OTHERS: Permission = Permission::new("VOICE_MUTE_OTHERS", 22, "Mute Members");
pub const VOICE_DEAF_OTHERS: Permission = Permission::new("VOICE_DEAF_OTHERS", 23, "Deafen Members");
pub const VOICE_MOVE_OTHERS: Permission = Permission::new("VOICE_MOVE_OTHERS", 24, "Move Members");
pub const VOICE_USE_VAD: Permission = Permission::new("VOICE_USE_VAD", 25, "Use Voice Activity");
pub const MANAGE_PERMISSIONS: Permission = Permission::new("MANAGE_PERMISSIONS", 28, "Manage Permissions");
pub const MANAGE_WEBHOOKS: Permission = Permission::new("MANAGE_WEBHOOKS", 29, "Manage Webhooks");
pub const USE_APPLICATION_COMMANDS: Permission =
    Permission::new("USE_APPLICATION_COMMANDS", 31, "Use Application Commands");
pub const MANAGE_EVENTS: Permission = Permission::new("MANAGE_EVENTS", 33, "Manage Events");
pub const MANAGE_THREADS: Permission = Permission::new("MANAGE_THREADS", 34, "Manage Threads");
pub const CREATE_PUBLIC_THREADS: Permission =
    Permission::new("CREATE_PUBLIC_THREADS", 35, "Create Public Threads");
pub const CREATE_PRIVATE_THREADS: Permission =
    Permission::new("CREATE_PRIVATE_THREADS", 36, "Create Private Threads");
pub const MESSAGE_EXT_STICKER: Permission = Permission::new("MESSAGE_EXT_STICKER", 37, "Use External Stickers");
pub const MESSAGE_SEND_IN_THREADS: Permission =
    Permission::new("MESSAGE_SEND_IN_THREADS", 38, "Send Messages in Threads");
pub const VOICE_START_ACTIVITIES: Permission = Permission::new("VOICE_START_ACTIVITIES", 39, "Launch Activities");
pub const VOICE_USE_SOUNDBOARD: Permission = Permission::new("VOICE_USE_SOUNDBOARD", 42, "Use Soundboard");
pub const VOICE_USE_EXTERNAL_SOUNDS: Permission =
    Permission::new("VOICE_USE_EXTERNAL_SOUNDS", 45, "Use External Sounds");

/// Every permission this server can set, in bit order.
pub const ALL_PERMISSIONS: &[Permission] = &[
    CREATE_INSTANT_INVITE,
    MANAGE_CHANNEL,
    MESSAGE_ADD_REACTION,
    PRIORITY_SPEAKER,
    VOICE_STREAM,
    VIEW_CHANNEL,
    MESSAGE_SEND,
    MESSAGE_TTS,
    MESSAGE_MANAGE,
    MESSAGE_EMBED_LINKS,
    MESSAGE_ATTACH_FILES,
    MESSAGE_HISTORY,
    MESSAGE_MENTION_EVERYONE,
    MESSAGE_EXT_EMOJI,
    VOICE_CONNECT,
    VOICE_SPEAK,
    VOICE_MUTE_OTHERS,
    VOICE_DEAF_OTHERS,
    VOICE_MOVE_OTHERS,
    VOICE_USE_VAD,
    MANAGE_PERMISSIONS,
    MANAGE_WEBHOOKS,
    USE_APPLICATION_COMMANDS,
    MANAGE_EVENTS,
    MANAGE_THREADS,
    CREATE_PUBLIC_THREADS,
    CREATE_PRIVATE_THREADS,
    MESSAGE_EXT_STICKER,
    MESSAGE_SEND_IN_THREADS,
    VOICE_START_ACTIVITIES,
    VOICE_USE_SOUNDBOARD,
    VOICE_USE_EXTERNAL_SOUNDS,
];

const TEXT_PERMISSIONS: &[Permission] = &[
    VIEW_CHANNEL,
    MESSAGE_SEND,
    MESSAGE_SEND_IN_THREADS,
    CREATE_PUBLIC_THREADS,
    CREATE_PRIVATE_THREADS,
    MESSAGE_EMBED_LINKS,
    MESSAGE_ATTACH_FILES,
    MESSAGE_ADD_REACTION,
    MESSAGE_EXT_EMOJI,
    MESSAGE_EXT_STICKER,
    MESSAGE_MENTION_EVERYONE,
    MESSAGE_MANAGE,
    MESSAGE_HISTORY,
    MESSAGE_TTS,
    USE_APPLICATION_COMMANDS,
];

const VOICE_PERMISSIONS: &[Permission] = &[
    VOICE_CONNECT,
    VOICE_SPEAK,
    VOICE_STREAM,
    VOICE_USE_VAD,
    PRIORITY_SPEAKER,
    VOICE_MUTE_OTHERS,
    VOICE_DEAF_OTHERS,
    VOICE_MOVE_OTHERS,
    VOICE_USE_SOUNDBOARD,
    VOICE_USE_EXTERNAL_SOUNDS,
    VOICE_START_ACTIVITIES,
];

const MANAGEMENT_PERMISSIONS: &[Permission] = &[
    MANAGE_CHANNEL,
    MANAGE_PERMISSIONS,
    MANAGE_WEBHOOKS,
    MANAGE_THREADS,
    MANAGE_EVENTS,
];

/// Named permission presets, in listing order.
pub const PRESETS: &[(&str, &[Permission])] = &[
    (
        "staff_text",
        &[
            VIEW_CHANNEL,
            MESSAGE_SEND,
            MESSAGE_HISTORY,
            MESSAGE_ATTACH_FILES,
            MESSAGE_EMBED_LINKS,
            MESSAGE_MANAGE,
            MESSAGE_MENTION_EVERYONE,
        ],
    ),
    (
        "staff_voice",
        &[
            VIEW_CHANNEL,
            VOICE_CONNECT,
            VOICE_SPEAK,
            VOICE_STREAM,
            VOICE_MUTE_OTHERS,
            VOICE_DEAF_OTHERS,
            VOICE_MOVE_OTHERS,
        ],
    ),
    (
        "member_text",
        &[
            VIEW_CHANNEL,
            MESSAGE_SEND,
            MESSAGE_HISTORY,
            MESSAGE_ATTACH_FILES,
            MESSAGE_EMBED_LINKS,
            MESSAGE_ADD_REACTION,
        ],
    ),
    (
        "member_voice",
        &[VIEW_CHANNEL, VOICE_CONNECT, VOICE_SPEAK, VOICE_STREAM],
    ),
    ("readonly", &[VIEW_CHANNEL, MESSAGE_HISTORY]),
    ("hidden", &[]),
];

/// Bits denied on `@everyone` by `lock_channel`.
const LOCK_BITS: u64 = (1 << 11) | (1 << 6);

/// Look up a permission by name, ignoring case and surrounding whitespace.
pub fn permission(name: &str) -> Option<Permission> {
    let name = name.trim();
    ALL_PERMISSIONS
        .iter()
        .copied()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

fn mask_of(permissions: &[Permission]) -> u64 {
    permissions.iter().fold(0, |bits, p| bits | p.mask())
}

/// Parse a comma-separated permission list. Unknown names are returned
/// separately instead of failing the whole list.
pub fn parse_permissions(list: Option<&str>) -> (u64, Vec<String>) {
    let mut bits = 0;
    let mut ignored = Vec::new();
    for name in list.unwrap_or_default().split(',').map(str::trim) {
        if name.is_empty() {
            continue;
        }
        match permission(name) {
            Some(p) => bits |= p.mask(),
            None => ignored.push(name.to_string()),
        }
    }
    (bits, ignored)
}

/// Allow and deny bits of a named preset. `hidden` denies viewing the channel.
pub fn preset(requested: &str) -> McpServerResult<(u64, u64)> {
    let name = requested.to_lowercase();
    let (_, permissions) = PRESETS.iter().find(|(n, _)| *n == name).ok_or_else(|| {
        let available: Vec<&str> = PRESETS.iter().map(|(n, _)| *n).collect();
        McpServerError::InvalidParams(format!(
            "Unknown preset: {}. Available: {}",
            requested,
            available.join(", ")
        ))
    })?;
    let deny = if name == "hidden" { VIEW_CHANNEL.mask() } else { 0 };
    Ok((mask_of(permissions), deny))
}

/// Display names of the set bits, in bit order.
pub fn describe(bits: u64) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = ALL_PERMISSIONS
        .iter()
        .filter(|p| bits & p.mask() != 0)
        .map(|p| p.display)
        .collect();
    if bits & !mask_of(ALL_PERMISSIONS) != 0 {
        names.push("Unknown");
    }
    names
}

fn describe_or_none(bits: u64) -> String {
    if bits == 0 {
        "None".to_string()
    } else {
        describe(bits).join(", ")
    }
}

fn names(permissions: &[Permission]) -> String {
    permissions.iter().map(|p| p.name).collect::<Vec<_>>().join(", ")
}

fn permission_list_property(description: &str) -> serde_json::Value {
    serde_json::json!({"type": "string", "description": description})
}

/// The note appended when some permission names were not recognized.
fn ignored_note(ignored: &[String]) -> String {
    if ignored.is_empty() {
        String::new()
    } else {
        format!("\nIgnored: {}", ignored.join(", "))
    }
}

/// Get all permission tools.
pub fn permission_tools(discord: DiscordHandle) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(SetChannelPermissionsTool(discord.clone())),
        Arc::new(SetMemberChannelPermissionsTool(discord.clone())),
        Arc::new(ClearRolePermissionsTool(discord.clone())),
        Arc::new(GetChannelPermissionsTool(discord.clone())),
        Arc::new(SyncChannelPermissionsTool(discord.clone())),
        Arc::new(ListPermissionsTool),
        Arc::new(LockChannelTool(discord.clone())),
        Arc::new(UnlockChannelTool(discord)),
    ]
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetRolePermissionsParams {
    channel_id: Option<String>,
    role_id: Option<String>,
    preset: Option<String>,
    allow: Option<String>,
    deny: Option<String>,
}

/// Tool to set a role's overwrite on a channel.
pub struct SetChannelPermissionsTool(DiscordHandle);

#[async_trait]
impl Tool for SetChannelPermissionsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "set_channel_permissions",
            "Set channel permissions for a role (use presets or specific permissions)",
        )
        .with_category("permissions")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "channelId": {"type": "string", "description": "Discord channel ID"},
                "roleId": {"type": "string", "description": "Discord role ID"},
                "preset": {
                    "type": "string",
                    "description": "Preset: staff_text, staff_voice, member_text, member_voice, readonly, hidden"
                },
                "allow": permission_list_property(
                    "Comma-separated permissions to ALLOW (e.g., VIEW_CHANNEL,MESSAGE_SEND)"
                ),
                "deny": permission_list_property("Comma-separated permissions to DENY")
            },
            "required": ["channelId", "roleId"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "set_channel_permissions"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: SetRolePermissionsParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;
        let role_id = required(&params.role_id, "roleId")?;

        let (channel, guild_id) = self.0.guild_channel(channel_id).await?;
        let role = self.0.client.get_role(&guild_id, role_id).await?;

        let (mut allow, mut deny) = match optional(&params.preset) {
            Some(name) => preset(name)?,
            None => (0, 0),
        };
        let (extra_allow, mut ignored) = parse_permissions(optional(&params.allow));
        let (extra_deny, ignored_deny) = parse_permissions(optional(&params.deny));
        allow |= extra_allow;
        deny |= extra_deny;
        ignored.extend(ignored_deny);

        let overwrite = ApiOverwrite::new(&role.id, overwrite_kind::ROLE, allow, deny);
        self.0
            .client
            .edit_channel_permission(&channel.id, &overwrite, None)
            .await?;
        info!("Set overwrite for role {} on channel {}", role.id, channel.id);

        Ok(ToolResult::text(format!(
            "Set permissions for role {} in #{}\nAllowed: {}\nDenied: {}{}",
            role.name,
            channel.name(),
            describe_or_none(allow),
            describe_or_none(deny),
            ignored_note(&ignored)
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetMemberPermissionsParams {
    channel_id: Option<String>,
    user_id: Option<String>,
    allow: Option<String>,
    deny: Option<String>,
}

/// Tool to set a member's overwrite on a channel.
pub struct SetMemberChannelPermissionsTool(DiscordHandle);

#[async_trait]
impl Tool for SetMemberChannelPermissionsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "set_member_channel_permissions",
            "Set channel permissions for a specific member",
        )
        .with_category("permissions")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "channelId": {"type": "string", "description": "Discord channel ID"},
                "userId": {"type": "string", "description": "Discord user ID"},
                "allow": permission_list_property("Comma-separated permissions to ALLOW"),
                "deny": permission_list_property("Comma-separated permissions to DENY")
            },
            "required": ["channelId", "userId"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "set_member_channel_permissions"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: SetMemberPermissionsParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;
        let user_id = required(&params.user_id, "userId")?;

        let (channel, guild_id) = self.0.guild_channel(channel_id).await?;
        let member = self.0.client.get_member(&guild_id, user_id).await?;

        let (allow, mut ignored) = parse_permissions(optional(&params.allow));
        let (deny, ignored_deny) = parse_permissions(optional(&params.deny));
        ignored.extend(ignored_deny);

        let overwrite = ApiOverwrite::new(member.id(), overwrite_kind::MEMBER, allow, deny);
        self.0
            .client
            .edit_channel_permission(&channel.id, &overwrite, None)
            .await?;

        Ok(ToolResult::text(format!(
            "Set permissions for {} in #{}{}",
            member.display_name(),
            channel.name(),
            ignored_note(&ignored)
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleChannelParams {
    channel_id: Option<String>,
    role_id: Option<String>,
}

/// Tool to remove a role's overwrite from a channel.
pub struct ClearRolePermissionsTool(DiscordHandle);

#[async_trait]
impl Tool for ClearRolePermissionsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "clear_role_permissions",
            "Remove all permission overrides for a role from a channel",
        )
        .with_category("permissions")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "channelId": {"type": "string", "description": "Discord channel ID"},
                "roleId": {"type": "string", "description": "Discord role ID"}
            },
            "required": ["channelId", "roleId"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "clear_role_permissions"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: RoleChannelParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;
        let role_id = required(&params.role_id, "roleId")?;

        let (channel, guild_id) = self.0.guild_channel(channel_id).await?;
        let role = self.0.client.get_role(&guild_id, role_id).await?;

        if channel.overwrite(&role.id).is_none() {
            return Ok(ToolResult::text(format!(
                "No permission overrides found for role {} in #{}",
                role.name,
                channel.name()
            )));
        }

        self.0
            .client
            .delete_channel_permission(&channel.id, &role.id)
            .await?;

        Ok(ToolResult::text(format!(
            "Cleared permission overrides for role {} in #{}",
            role.name,
            channel.name()
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelParams {
    channel_id: Option<String>,
}

/// Tool to list a channel's overwrites.
pub struct GetChannelPermissionsTool(DiscordHandle);

#[async_trait]
impl Tool for GetChannelPermissionsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_channel_permissions",
            "Get current permission overrides for a channel",
        )
        .with_category("permissions")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "channelId": {"type": "string", "description": "Discord channel ID"}
            },
            "required": ["channelId"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "get_channel_permissions"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ChannelParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;

        let (channel, guild_id) = self.0.guild_channel(channel_id).await?;
        if channel.permission_overwrites.is_empty() {
            return Ok(ToolResult::text(format!(
                "No permission overrides for #{}",
                channel.name()
            )));
        }

        let role_names: HashMap<String, String> = self
            .0
            .client
            .list_roles(&guild_id)
            .await?
            .into_iter()
            .map(|role| (role.id, role.name))
            .collect();

        let mut result = format!("**Permission Overrides for #{}:**\n\n", channel.name());
        for overwrite in &channel.permission_overwrites {
            if overwrite.is_role() {
                let name = role_names
                    .get(&overwrite.id)
                    .map(String::as_str)
                    .unwrap_or(&overwrite.id);
                result.push_str(&format!("**Role: {}**\n", name));
            } else {
                // Members who left the guild keep their overwrite.
                let name = match self.0.client.get_member(&guild_id, &overwrite.id).await {
                    Ok(member) => member.display_name().to_string(),
                    Err(e) if e.is_not_found() => overwrite.id.clone(),
                    Err(e) => return Err(e.into()),
                };
                result.push_str(&format!("**Member: {}**\n", name));
            }

            if overwrite.allow_bits() != 0 {
                result.push_str(&format!(
                    "  ✅ Allowed: {}\n",
                    describe(overwrite.allow_bits()).join(", ")
                ));
            }
            if overwrite.deny_bits() != 0 {
                result.push_str(&format!(
                    "  ❌ Denied: {}\n",
                    describe(overwrite.deny_bits()).join(", ")
                ));
            }
            result.push('\n');
        }

        Ok(ToolResult::text(result))
    }
}

/// Tool to copy a category's overwrites onto one of its channels.
pub struct SyncChannelPermissionsTool(DiscordHandle);

#[async_trait]
impl Tool for SyncChannelPermissionsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "sync_channel_permissions",
            "Sync channel permissions with its parent category",
        )
        .with_category("permissions")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "channelId": {"type": "string", "description": "Discord channel ID"}
            },
            "required": ["channelId"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "sync_channel_permissions"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ChannelParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;

        let (channel, _) = self.0.guild_channel(channel_id).await?;
        if channel.is_category() || channel.is_thread() {
            return Err(McpServerError::InvalidParams(
                "This channel type does not support categories".to_string(),
            ));
        }
        let parent_id = channel.parent_id.as_deref().ok_or_else(|| {
            McpServerError::InvalidParams("Channel has no parent category to sync with".to_string())
        })?;

        let category = self.0.client.get_category(parent_id).await?;
        debug!(
            "Copying {} overwrites from category {}",
            category.permission_overwrites.len(),
            category.id
        );
        self.0
            .client
            .replace_overwrites(&channel.id, &category.permission_overwrites)
            .await?;

        Ok(ToolResult::text(format!(
            "Synced #{} permissions with category: {}",
            channel.name(),
            category.name()
        )))
    }
}

/// Render the permission reference shown by `list_permissions`.
pub fn permission_reference() -> String {
    let mut result = String::from("**Available Permissions:**\n\n");
    result.push_str(&format!("**Text Channels:**\n{}\n\n", names(TEXT_PERMISSIONS)));
    result.push_str(&format!("**Voice Channels:**\n{}\n\n", names(VOICE_PERMISSIONS)));
    result.push_str(&format!("**Management:**\n{}\n\n", names(MANAGEMENT_PERMISSIONS)));
    result.push_str("**Available Presets:**\n");
    for (name, permissions) in PRESETS {
        let display: Vec<&str> = permissions.iter().map(|p| p.display).collect();
        result.push_str(&format!("- **{}**: {}\n", name, display.join(", ")));
    }
    result
}

/// Tool to list permission names and presets.
pub struct ListPermissionsTool;

#[async_trait]
impl Tool for ListPermissionsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_permissions", "List all available Discord permission names")
            .with_category("permissions")
    }

    #[instrument(skip_all, fields(tool = "list_permissions"))]
    async fn execute(&self, _args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        Ok(ToolResult::text(permission_reference()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockParams {
    channel_id: Option<String>,
    reason: Option<String>,
}

/// `@everyone` overwrite after locking: the lock bits move from allow to deny.
fn locked(channel: &ApiChannel, everyone: &str) -> ApiOverwrite {
    let (allow, deny) = channel
        .overwrite(everyone)
        .map(|o| (o.allow_bits(), o.deny_bits()))
        .unwrap_or((0, 0));
    ApiOverwrite::new(everyone, overwrite_kind::ROLE, allow & !LOCK_BITS, deny | LOCK_BITS)
}

/// Tool to stop `@everyone` from sending messages in a channel.
pub struct LockChannelTool(DiscordHandle);

#[async_trait]
impl Tool for LockChannelTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "lock_channel",
            "Lock a channel (prevent @everyone from sending messages)",
        )
        .with_category("permissions")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "guildId": {"type": "string", "description": "Discord server ID"},
                "channelId": {"type": "string", "description": "Discord channel ID"},
                "reason": {"type": "string", "description": "Reason for lock"}
            },
            "required": ["channelId"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "lock_channel"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: LockParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;
        let reason = optional(&params.reason);

        // The @everyone role shares the guild's ID.
        let (channel, everyone) = self.0.guild_channel(channel_id).await?;
        let overwrite = locked(&channel, &everyone);
        self.0
            .client
            .edit_channel_permission(&channel.id, &overwrite, reason)
            .await?;
        info!("Locked channel {}", channel.id);

        let mut result = format!("🔒 Locked #{}", channel.name());
        if let Some(reason) = reason {
            result.push_str(&format!(" - {}", reason));
        }
        Ok(ToolResult::text(result))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnlockParams {
    channel_id: Option<String>,
}

/// Tool to let `@everyone` send messages in a locked channel again.
pub struct UnlockChannelTool(DiscordHandle);

#[async_trait]
impl Tool for UnlockChannelTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "unlock_channel",
            "Unlock a channel (allow @everyone to send messages)",
        )
        .with_category("permissions")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "guildId": {"type": "string", "description": "Discord server ID"},
                "channelId": {"type": "string", "description": "Discord channel ID"}
            },
            "required": ["channelId"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "unlock_channel"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: UnlockParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;

        let (channel, everyone) = self.0.guild_channel(channel_id).await?;
        if let Some(current) = channel.overwrite(&everyone) {
            let overwrite = ApiOverwrite::new(
                &everyone,
                overwrite_kind::ROLE,
                current.allow_bits() & !LOCK_BITS,
                current.deny_bits() & !LOCK_BITS,
            );
            self.0
                .client
                .edit_channel_permission(&channel.id, &overwrite, None)
                .await?;
        }

        Ok(ToolResult::text(format!("🔓 Unlocked #{}", channel.name())))
    }
}
