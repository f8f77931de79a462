//! Role MCP tools
//!
//! Create, edit, delete, and look up guild roles, and manage which members
//! hold them. Member counts come from one paginated member listing per call.

use super::{optional, parse_args, parse_color, required, DiscordHandle};
use crate::clients::models::{ApiMember, ApiRole, RolePayload};
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Get all role tools.
pub fn role_tools(discord: DiscordHandle) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CreateRoleTool(discord.clone())),
        Arc::new(DeleteRoleTool(discord.clone())),
        Arc::new(AssignRoleTool(discord.clone())),
        Arc::new(RemoveRoleTool(discord.clone())),
        Arc::new(ListRolesTool(discord.clone())),
        Arc::new(FindRoleTool(discord.clone())),
        Arc::new(UpdateRoleTool(discord.clone())),
        Arc::new(GetMembersByRoleTool(discord)),
    ]
}

/// Members holding `role`. The `@everyone` role shares the guild's ID and
/// is held by every member.
fn holders<'a>(guild_id: &str, role: &ApiRole, members: &'a [ApiMember]) -> Vec<&'a ApiMember> {
    members
        .iter()
        .filter(|m| role.id == guild_id || m.roles.contains(&role.id))
        .collect()
}

fn guild_property() -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": "Discord server ID (defaults to DISCORD_GUILD_ID)"
    })
}

fn role_flags(
    color: &Option<String>,
    hoisted: Option<bool>,
    mentionable: Option<bool>,
) -> McpServerResult<RolePayload> {
    Ok(RolePayload {
        name: None,
        color: optional(color).map(parse_color).transpose()?,
        hoist: hoisted,
        mentionable,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoleParams {
    guild_id: Option<String>,
    name: Option<String>,
    color_hex: Option<String>,
    hoisted: Option<bool>,
    mentionable: Option<bool>,
}

/// Tool to create a role.
pub struct CreateRoleTool(DiscordHandle);

#[async_trait]
impl Tool for CreateRoleTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("create_role", "Create a new role in the server")
            .with_category("roles")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "guildId": guild_property(),
                    "name": {"type": "string", "description": "Role name"},
                    "colorHex": {"type": "string", "description": "Hex color code (e.g., #FF5733)"},
                    "hoisted": {"type": "boolean", "description": "Display role separately in member list"},
                    "mentionable": {"type": "boolean", "description": "Allow role to be mentioned"}
                },
                "required": ["name"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "create_role"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: CreateRoleParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let name = required(&params.name, "name")?;
        let mut payload = role_flags(&params.color_hex, params.hoisted, params.mentionable)?;
        payload.name = Some(name.to_string());

        let guild = self.0.client.get_guild(&guild_id).await?;
        let role = self.0.client.create_role(&guild.id, &payload).await?;

        Ok(ToolResult::text(format!(
            "Created role: {} (ID: {})",
            role.name, role.id
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleParams {
    guild_id: Option<String>,
    role_id: Option<String>,
}

/// Tool to delete a role.
pub struct DeleteRoleTool(DiscordHandle);

#[async_trait]
impl Tool for DeleteRoleTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("delete_role", "Delete a role from the server")
            .with_category("roles")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "guildId": guild_property(),
                    "roleId": {"type": "string", "description": "Discord role ID"}
                },
                "required": ["roleId"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "delete_role"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: RoleParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let role_id = required(&params.role_id, "roleId")?;

        let guild = self.0.client.get_guild(&guild_id).await?;
        let role = self.0.client.get_role(&guild.id, role_id).await?;
        self.0.client.delete_role(&guild.id, &role.id).await?;

        Ok(ToolResult::text(format!("Deleted role: {}", role.name)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberRoleParams {
    guild_id: Option<String>,
    user_id: Option<String>,
    role_id: Option<String>,
}

fn member_role_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "guildId": guild_property(),
            "userId": {"type": "string", "description": "Discord user ID"},
            "roleId": {"type": "string", "description": "Discord role ID"}
        },
        "required": ["userId", "roleId"]
    })
}

/// Tool to grant a role.
pub struct AssignRoleTool(DiscordHandle);

#[async_trait]
impl Tool for AssignRoleTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("assign_role", "Assign a role to a member")
            .with_category("roles")
            .with_schema(member_role_schema())
    }

    #[instrument(skip(self, args, _context), fields(tool = "assign_role"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: MemberRoleParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let user_id = required(&params.user_id, "userId")?;
        let role_id = required(&params.role_id, "roleId")?;

        let guild = self.0.client.get_guild(&guild_id).await?;
        let member = self.0.client.get_member(&guild.id, user_id).await?;
        let role = self.0.client.get_role(&guild.id, role_id).await?;
        self.0.client.add_member_role(&guild.id, user_id, &role.id).await?;

        Ok(ToolResult::text(format!(
            "Assigned role {} to {}",
            role.name,
            member.display_name()
        )))
    }
}

/// Tool to take a role away.
pub struct RemoveRoleTool(DiscordHandle);

#[async_trait]
impl Tool for RemoveRoleTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("remove_role", "Remove a role from a member")
            .with_category("roles")
            .with_schema(member_role_schema())
    }

    #[instrument(skip(self, args, _context), fields(tool = "remove_role"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: MemberRoleParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let user_id = required(&params.user_id, "userId")?;
        let role_id = required(&params.role_id, "roleId")?;

        let guild = self.0.client.get_guild(&guild_id).await?;
        let member = self.0.client.get_member(&guild.id, user_id).await?;
        let role = self.0.client.get_role(&guild.id, role_id).await?;
        self.0
            .client
            .remove_member_role(&guild.id, user_id, &role.id)
            .await?;

        Ok(ToolResult::text(format!(
            "Removed role {} from {}",
            role.name,
            member.display_name()
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuildParams {
    guild_id: Option<String>,
}

/// Tool to list roles with member counts.
pub struct ListRolesTool(DiscordHandle);

#[async_trait]
impl Tool for ListRolesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_roles", "List all roles in the server")
            .with_category("roles")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {"guildId": guild_property()},
                "required": []
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "list_roles"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: GuildParams = parse_args(args)?;
        let guild = self.0.guild(&params.guild_id).await?;

        let mut roles = self.0.client.list_roles(&guild.id).await?;
        if roles.is_empty() {
            return Ok(ToolResult::text("No roles found in server"));
        }
        roles.sort_by(|a, b| b.position.cmp(&a.position));

        let members = self.0.client.list_members(&guild.id).await?;
        let lines: Vec<String> = roles
            .iter()
            .map(|role| {
                format!(
                    "- {} (ID: {}) [Members: {}, Color: {}]",
                    role.name,
                    role.id,
                    holders(&guild.id, role, &members).len(),
                    role.color_hex()
                )
            })
            .collect();

        Ok(ToolResult::text(format!(
            "Retrieved {} roles:\n{}",
            roles.len(),
            lines.join("\n")
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindRoleParams {
    guild_id: Option<String>,
    role_name: Option<String>,
}

/// Tool to find roles by name.
pub struct FindRoleTool(DiscordHandle);

#[async_trait]
impl Tool for FindRoleTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("find_role", "Find a role by name")
            .with_category("roles")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "guildId": guild_property(),
                    "roleName": {"type": "string", "description": "Role name to search for (case-insensitive)"}
                },
                "required": ["roleName"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "find_role"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: FindRoleParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let role_name = required(&params.role_name, "roleName")?;

        let guild = self.0.client.get_guild(&guild_id).await?;
        let wanted = role_name.to_lowercase();
        let roles: Vec<ApiRole> = self
            .0
            .client
            .list_roles(&guild.id)
            .await?
            .into_iter()
            .filter(|role| role.name.to_lowercase() == wanted)
            .collect();

        match roles.as_slice() {
            [] => Err(McpServerError::NotFound(format!(
                "No roles found with name: {}",
                role_name
            ))),
            [role] => {
                let members = self.0.client.list_members(&guild.id).await?;
                Ok(ToolResult::text(format!(
                    "Found role: {} (ID: {}) [Members: {}, Color: {}, Position: {}]",
                    role.name,
                    role.id,
                    holders(&guild.id, role, &members).len(),
                    role.color_hex(),
                    role.position
                )))
            }
            many => {
                let lines: Vec<String> = many
                    .iter()
                    .map(|role| format!("- {} (ID: {})", role.name, role.id))
                    .collect();
                Ok(ToolResult::text(format!(
                    "Found {} roles matching '{}':\n{}",
                    many.len(),
                    role_name,
                    lines.join("\n")
                )))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRoleParams {
    guild_id: Option<String>,
    role_id: Option<String>,
    name: Option<String>,
    color_hex: Option<String>,
    hoisted: Option<bool>,
    mentionable: Option<bool>,
}

/// Tool to change role properties.
pub struct UpdateRoleTool(DiscordHandle);

#[async_trait]
impl Tool for UpdateRoleTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "update_role",
            "Update a role's properties (name, color, hoisted, mentionable)",
        )
        .with_category("roles")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "guildId": guild_property(),
                "roleId": {"type": "string", "description": "Discord role ID"},
                "name": {"type": "string", "description": "New role name"},
                "colorHex": {"type": "string", "description": "New hex color code (e.g., #FF5733)"},
                "hoisted": {"type": "boolean", "description": "Display role separately in member list"},
                "mentionable": {"type": "boolean", "description": "Allow role to be mentioned"}
            },
            "required": ["roleId"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "update_role"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: UpdateRoleParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let role_id = required(&params.role_id, "roleId")?;
        let mut payload = role_flags(&params.color_hex, params.hoisted, params.mentionable)?;
        payload.name = optional(&params.name).map(str::to_string);

        let guild = self.0.client.get_guild(&guild_id).await?;
        let role = self.0.client.get_role(&guild.id, role_id).await?;

        let mut changes: Vec<String> = Vec::new();
        if let Some(ref name) = payload.name {
            changes.push(format!("name to '{}'", name));
        }
        if let Some(color) = optional(&params.color_hex) {
            changes.push(format!("color to {}", color));
        }
        if let Some(hoisted) = payload.hoist {
            changes.push(format!("hoisted to {}", hoisted));
        }
        if let Some(mentionable) = payload.mentionable {
            changes.push(format!("mentionable to {}", mentionable));
        }

        if changes.is_empty() {
            return Ok(ToolResult::text(format!(
                "No changes specified for role: {}",
                role.name
            )));
        }

        debug!("Updating role {}: {}", role.id, changes.join(", "));
        self.0.client.modify_role(&guild.id, &role.id, &payload).await?;

        Ok(ToolResult::text(format!(
            "Updated role {}: {}",
            role.name,
            changes.join(", ")
        )))
    }
}

/// Tool to list the holders of a role.
pub struct GetMembersByRoleTool(DiscordHandle);

#[async_trait]
impl Tool for GetMembersByRoleTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_members_by_role", "Get all members with a specific role")
            .with_category("roles")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "guildId": guild_property(),
                    "roleId": {"type": "string", "description": "Discord role ID"}
                },
                "required": ["roleId"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "get_members_by_role"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: RoleParams = parse_args(args)?;
        let guild_id = self.0.guild_id(&params.guild_id)?;
        let role_id = required(&params.role_id, "roleId")?;

        let guild = self.0.client.get_guild(&guild_id).await?;
        let role = self.0.client.get_role(&guild.id, role_id).await?;

        let members = self.0.client.list_members(&guild.id).await?;
        let holders = holders(&guild.id, &role, &members);
        if holders.is_empty() {
            return Ok(ToolResult::text(format!(
                "No members found with role: {}",
                role.name
            )));
        }

        let lines: Vec<String> = holders
            .iter()
            .map(|m| format!("- {} ({}) [ID: {}]", m.display_name(), m.username(), m.id()))
            .collect();

        Ok(ToolResult::text(format!(
            "Found {} members with role {}:\n{}",
            holders.len(),
            role.name,
            lines.join("\n")
        )))
    }
}
