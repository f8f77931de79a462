//! Interactive component MCP tools
//!
//! Post messages carrying buttons and select menus, role and ticket panels,
//! and strip or disable the components of an existing message. Clicks are
//! delivered as gateway interactions, which this server does not handle.

use super::{message_link, optional, parse_args, parse_color, required, DiscordHandle};
use crate::clients::models::{
    button_style, ApiComponent, ApiEmbed, ApiEmbedField, ComponentEmoji, EmbedFooter,
    MessagePayload, SelectOption,
};
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Buttons per action row.
pub const BUTTONS_PER_ROW: usize = 5;

/// Content sent when a component message has no text of its own.
const BLANK_CONTENT: &str = "\u{200B}";

const ROLE_PANEL_COLOR: u32 = 0x5865F2;
const TICKET_PANEL_COLOR: u32 = 0x2ECC71;

const HANDLER_NOTE: &str = "You'll need a bot with interaction handlers to process";

const DEFAULT_TICKET_DESCRIPTION: &str = "Need help? Click a button below to create a support ticket.\n\n\
**Please include:**\n\
• A clear description of your issue\n\
• Any relevant screenshots or evidence\n\
• Your in-game name if applicable";

/// Get all interactive tools.
pub fn interactive_tools(discord: DiscordHandle) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(SendButtonsTool(discord.clone())),
        Arc::new(SendEmbedWithButtonsTool(discord.clone())),
        Arc::new(SendSelectMenuTool(discord.clone())),
        Arc::new(SendRolePanelTool(discord.clone())),
        Arc::new(SendTicketPanelTool(discord.clone())),
        Arc::new(RemoveComponentsTool(discord.clone())),
        Arc::new(DisableButtonsTool(discord)),
    ]
}

/// Split `;`-separated entries into their `|`-separated, trimmed parts.
fn entries(spec: &str) -> impl Iterator<Item = Vec<&str>> {
    spec.split(';')
        .map(|entry| entry.split('|').map(str::trim).collect::<Vec<_>>())
}

/// Parse `Label|CustomId|Style` entries. A `link` (or `url`) button takes a
/// URL in place of the custom ID; an unknown style is secondary. Entries with
/// fewer than three parts are skipped.
pub fn parse_buttons(spec: &str) -> Vec<ApiComponent> {
    entries(spec)
        .filter(|parts| parts.len() >= 3)
        .map(|parts| {
            let (label, id_or_url) = (parts[0], parts[1]);
            let style = match parts[2].to_lowercase().as_str() {
                "primary" | "blurple" => button_style::PRIMARY,
                "success" | "green" => button_style::SUCCESS,
                "danger" | "red" => button_style::DANGER,
                "link" | "url" => return ApiComponent::link(label, id_or_url),
                _ => button_style::SECONDARY,
            };
            ApiComponent::button(style, label, id_or_url)
        })
        .collect()
}

/// Parse `Label|Value|Description` entries; the description is optional.
pub fn parse_options(spec: &str) -> Vec<SelectOption> {
    entries(spec)
        .filter(|parts| parts.len() >= 2)
        .map(|parts| SelectOption {
            label: parts[0].to_string(),
            value: parts[1].to_string(),
            description: parts
                .get(2)
                .filter(|d| !d.is_empty())
                .map(|d| d.to_string()),
            emoji: None,
        })
        .collect()
}

/// A panel entry: `Name|Id|Emoji`, emoji optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelEntry {
    pub name: String,
    pub id: String,
    pub emoji: Option<String>,
}

pub fn parse_panel_entries(spec: &str) -> Vec<PanelEntry> {
    entries(spec)
        .filter(|parts| parts.len() >= 2)
        .map(|parts| PanelEntry {
            name: parts[0].to_string(),
            id: parts[1].to_string(),
            emoji: parts.get(2).filter(|e| !e.is_empty()).map(|e| e.to_string()),
        })
        .collect()
}

impl PanelEntry {
    fn button(&self, style: u8, prefix: &str) -> ApiComponent {
        let button = ApiComponent::button(style, &self.name, format!("{}_{}", prefix, self.id));
        match &self.emoji {
            Some(emoji) => button.with_emoji(ComponentEmoji::parse(emoji)),
            None => button,
        }
    }
}

/// Lay buttons out in action rows of [`BUTTONS_PER_ROW`].
pub fn button_rows(buttons: Vec<ApiComponent>) -> Vec<ApiComponent> {
    buttons
        .chunks(BUTTONS_PER_ROW)
        .map(|chunk| ApiComponent::row(chunk.to_vec()))
        .collect()
}

fn content_or_blank(content: &Option<String>) -> String {
    optional(content).unwrap_or(BLANK_CONTENT).to_string()
}

fn color_or(color_hex: &Option<String>, default: u32) -> McpServerResult<u32> {
    Ok(optional(color_hex)
        .map(parse_color)
        .transpose()?
        .unwrap_or(default))
}

fn no_valid(what: &str) -> McpServerError {
    McpServerError::InvalidParams(format!("No valid {} provided", what))
}

fn channel_property() -> serde_json::Value {
    serde_json::json!({"type": "string", "description": "Discord channel ID"})
}

fn buttons_property() -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": "Buttons: 'Label|CustomId|Style' separated by semicolons. Styles: primary, secondary, success, danger, link (use the URL as CustomId)"
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendButtonsParams {
    channel_id: Option<String>,
    content: Option<String>,
    buttons: Option<String>,
}

/// Tool to send a message with buttons.
pub struct SendButtonsTool(DiscordHandle);

#[async_trait]
impl Tool for SendButtonsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("send_buttons", "Send a message with interactive buttons")
            .with_category("interactive")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "channelId": channel_property(),
                    "content": {"type": "string", "description": "Message content"},
                    "buttons": buttons_property()
                },
                "required": ["channelId", "buttons"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "send_buttons"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: SendButtonsParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;
        let spec = required(&params.buttons, "buttons")?;

        let channel = self.0.text_channel(channel_id).await?;
        let buttons = parse_buttons(spec);
        if buttons.is_empty() {
            return Err(no_valid("buttons"));
        }
        let count = buttons.len();

        let payload = MessagePayload::text(content_or_blank(&params.content))
            .with_components(button_rows(buttons));
        let message = self.0.client.send_message(&channel.id, &payload).await?;

        Ok(ToolResult::text(format!(
            "Message with {} buttons sent. Message link: {}",
            count,
            message_link(&channel, &message)
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbedButtonsParams {
    channel_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    color_hex: Option<String>,
    buttons: Option<String>,
}

/// Tool to send an embed with buttons beneath it.
pub struct SendEmbedWithButtonsTool(DiscordHandle);

#[async_trait]
impl Tool for SendEmbedWithButtonsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("send_embed_with_buttons", "Send an embed message with interactive buttons")
            .with_category("interactive")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "channelId": channel_property(),
                    "title": {"type": "string", "description": "Embed title"},
                    "description": {"type": "string", "description": "Embed description"},
                    "colorHex": {"type": "string", "description": "Hex color code (e.g., #FF5733)"},
                    "buttons": buttons_property()
                },
                "required": ["channelId", "buttons"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "send_embed_with_buttons"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: EmbedButtonsParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;
        let spec = required(&params.buttons, "buttons")?;

        let channel = self.0.text_channel(channel_id).await?;
        let embed = ApiEmbed {
            title: optional(&params.title).map(str::to_string),
            description: optional(&params.description).map(str::to_string),
            color: optional(&params.color_hex).map(parse_color).transpose()?,
            ..ApiEmbed::default()
        };
        let buttons = parse_buttons(spec);
        if buttons.is_empty() {
            return Err(no_valid("buttons"));
        }
        let count = buttons.len();

        let payload = MessagePayload::embed(embed).with_components(button_rows(buttons));
        let message = self.0.client.send_message(&channel.id, &payload).await?;

        Ok(ToolResult::text(format!(
            "Embed with {} buttons sent. Message link: {}",
            count,
            message_link(&channel, &message)
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectMenuParams {
    channel_id: Option<String>,
    content: Option<String>,
    menu_id: Option<String>,
    placeholder: Option<String>,
    options: Option<String>,
    min_values: Option<u8>,
    max_values: Option<u8>,
}

/// Tool to send a string select menu.
pub struct SendSelectMenuTool(DiscordHandle);

#[async_trait]
impl Tool for SendSelectMenuTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("send_select_menu", "Send a message with a dropdown select menu")
            .with_category("interactive")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "channelId": channel_property(),
                    "content": {"type": "string", "description": "Message content"},
                    "menuId": {"type": "string", "description": "Custom ID for the select menu"},
                    "placeholder": {"type": "string", "description": "Placeholder text"},
                    "options": {
                        "type": "string",
                        "description": "Options: 'Label|Value|Description' separated by semicolons"
                    },
                    "minValues": {"type": "integer", "description": "Minimum selections (default 1)"},
                    "maxValues": {"type": "integer", "description": "Maximum selections (default 1)"}
                },
                "required": ["channelId", "menuId", "options"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "send_select_menu"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: SelectMenuParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;
        let menu_id = required(&params.menu_id, "menuId")?;
        let spec = required(&params.options, "options")?;

        let channel = self.0.text_channel(channel_id).await?;
        let options = parse_options(spec);
        if options.is_empty() {
            return Err(no_valid("options"));
        }

        let mut menu = ApiComponent::string_select(
            menu_id,
            optional(&params.placeholder).unwrap_or("Select an option"),
            options,
        );
        menu.min_values = params.min_values;
        menu.max_values = params.max_values;

        let payload = MessagePayload::text(content_or_blank(&params.content))
            .with_components(vec![ApiComponent::row(vec![menu])]);
        let message = self.0.client.send_message(&channel.id, &payload).await?;

        Ok(ToolResult::text(format!(
            "Select menu sent. Message link: {}",
            message_link(&channel, &message)
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RolePanelParams {
    channel_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    roles: Option<String>,
    color_hex: Option<String>,
}

/// Embed listing the roles of a role panel.
fn role_panel_embed(
    title: Option<&str>,
    description: Option<&str>,
    color: u32,
    roles: &[PanelEntry],
) -> ApiEmbed {
    let listing: String = roles
        .iter()
        .map(|role| match &role.emoji {
            Some(emoji) => format!("{} **{}**\n", emoji, role.name),
            None => format!("**{}**\n", role.name),
        })
        .collect();

    ApiEmbed {
        title: Some(title.unwrap_or("Role Selection").to_string()),
        description: Some(description.unwrap_or("Click a button to toggle a role").to_string()),
        color: Some(color),
        timestamp: Some(Utc::now()),
        fields: vec![ApiEmbedField {
            name: "Available Roles".to_string(),
            value: listing,
            inline: false,
        }],
        ..ApiEmbed::default()
    }
}

/// Tool to send a self-assignable role panel.
pub struct SendRolePanelTool(DiscordHandle);

#[async_trait]
impl Tool for SendRolePanelTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "send_role_panel",
            "Send a role selection panel with buttons for self-assignable roles",
        )
        .with_category("interactive")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "channelId": channel_property(),
                "title": {"type": "string", "description": "Panel title"},
                "description": {"type": "string", "description": "Panel description/instructions"},
                "roles": {
                    "type": "string",
                    "description": "Roles: 'RoleName|RoleId|Emoji' separated by semicolons"
                },
                "colorHex": {"type": "string", "description": "Hex color code"}
            },
            "required": ["channelId", "roles"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "send_role_panel"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: RolePanelParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;
        let spec = required(&params.roles, "roles")?;

        let channel = self.0.text_channel(channel_id).await?;
        let roles = parse_panel_entries(spec);
        if roles.is_empty() {
            return Err(no_valid("roles"));
        }

        let embed = role_panel_embed(
            optional(&params.title),
            optional(&params.description),
            color_or(&params.color_hex, ROLE_PANEL_COLOR)?,
            &roles,
        );
        let buttons: Vec<ApiComponent> = roles
            .iter()
            .map(|role| role.button(button_style::SECONDARY, "role"))
            .collect();

        let payload = MessagePayload::embed(embed).with_components(button_rows(buttons));
        let message = self.0.client.send_message(&channel.id, &payload).await?;
        debug!("Role panel {} lists {} roles", message.id, roles.len());

        Ok(ToolResult::text(format!(
            "Role panel with {} roles sent. Message link: {}\n\nNote: {} role button clicks.",
            roles.len(),
            message_link(&channel, &message),
            HANDLER_NOTE
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TicketPanelParams {
    channel_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    categories: Option<String>,
    color_hex: Option<String>,
}

/// Ticket buttons: one primary button per category, or a single
/// "Create Ticket" button when no categories are given.
fn ticket_buttons(categories: &[PanelEntry]) -> Vec<ApiComponent> {
    if categories.is_empty() {
        return vec![
            ApiComponent::button(button_style::SUCCESS, "Create Ticket", "ticket_create")
                .with_emoji(ComponentEmoji::parse("🎫")),
        ];
    }
    categories
        .iter()
        .map(|category| category.button(button_style::PRIMARY, "ticket"))
        .collect()
}

/// Tool to send a support ticket panel.
pub struct SendTicketPanelTool(DiscordHandle);

#[async_trait]
impl Tool for SendTicketPanelTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("send_ticket_panel", "Send a support ticket creation panel")
            .with_category("interactive")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "channelId": channel_property(),
                    "title": {"type": "string", "description": "Panel title"},
                    "description": {"type": "string", "description": "Panel description"},
                    "categories": {
                        "type": "string",
                        "description": "Categories: 'Name|CustomId|Emoji' separated by semicolons"
                    },
                    "colorHex": {"type": "string", "description": "Hex color code"}
                },
                "required": ["channelId"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "send_ticket_panel"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: TicketPanelParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;

        let channel = self.0.text_channel(channel_id).await?;
        let categories = optional(&params.categories)
            .map(parse_panel_entries)
            .unwrap_or_default();

        let embed = ApiEmbed {
            title: Some(optional(&params.title).unwrap_or("🎫 Support Tickets").to_string()),
            description: Some(
                optional(&params.description)
                    .unwrap_or(DEFAULT_TICKET_DESCRIPTION)
                    .to_string(),
            ),
            color: Some(color_or(&params.color_hex, TICKET_PANEL_COLOR)?),
            footer: Some(EmbedFooter {
                text: "Support Team".to_string(),
                icon_url: None,
            }),
            ..ApiEmbed::default()
        };

        let payload =
            MessagePayload::embed(embed).with_components(button_rows(ticket_buttons(&categories)));
        let message = self.0.client.send_message(&channel.id, &payload).await?;

        Ok(ToolResult::text(format!(
            "Ticket panel sent. Message link: {}\n\nNote: {} ticket button clicks.",
            message_link(&channel, &message),
            HANDLER_NOTE
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageParams {
    channel_id: Option<String>,
    message_id: Option<String>,
}

fn message_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "channelId": channel_property(),
            "messageId": {"type": "string", "description": "Discord message ID"}
        },
        "required": ["channelId", "messageId"]
    })
}

/// Tool to strip every component from a message.
pub struct RemoveComponentsTool(DiscordHandle);

#[async_trait]
impl Tool for RemoveComponentsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "remove_components",
            "Remove all buttons and menus from a message",
        )
        .with_category("interactive")
        .with_schema(message_schema())
    }

    #[instrument(skip(self, args, _context), fields(tool = "remove_components"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: MessageParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;
        let message_id = required(&params.message_id, "messageId")?;

        let channel = self.0.text_channel(channel_id).await?;
        let message = self.0.client.get_message(&channel.id, message_id).await?;
        self.0
            .client
            .edit_message(&channel.id, &message.id, &MessagePayload::components(Vec::new()))
            .await?;

        Ok(ToolResult::text(format!(
            "Components removed from message. Message link: {}",
            message_link(&channel, &message)
        )))
    }
}

/// Tool to disable every button and menu on a message.
pub struct DisableButtonsTool(DiscordHandle);

#[async_trait]
impl Tool for DisableButtonsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("disable_buttons", "Disable all buttons on a message (gray them out)")
            .with_category("interactive")
            .with_schema(message_schema())
    }

    #[instrument(skip(self, args, _context), fields(tool = "disable_buttons"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: MessageParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;
        let message_id = required(&params.message_id, "messageId")?;

        let channel = self.0.text_channel(channel_id).await?;
        let message = self.0.client.get_message(&channel.id, message_id).await?;

        let mut components = message.components.clone();
        components.iter_mut().for_each(ApiComponent::disable);
        self.0
            .client
            .edit_message(&channel.id, &message.id, &MessagePayload::components(components))
            .await?;

        Ok(ToolResult::text(format!(
            "Buttons disabled on message. Message link: {}",
            message_link(&channel, &message)
        )))
    }
}
