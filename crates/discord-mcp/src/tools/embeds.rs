//! Embed MCP tools
//!
//! Send and edit rich embed messages, including preset announcement styles.

use super::{message_link, optional, parse_args, parse_color, required, DiscordHandle};
use crate::clients::models::{
    ApiEmbed, ApiEmbedField, EmbedAuthor, EmbedFooter, EmbedMedia, MessagePayload,
};
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Get all embed tools.
pub fn embed_tools(discord: DiscordHandle) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(SendEmbedTool(discord.clone())),
        Arc::new(SendEmbedWithFieldsTool(discord.clone())),
        Arc::new(SendAnnouncementTool(discord.clone())),
        Arc::new(EditEmbedTool(discord)),
    ]
}

/// Announcement presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnouncementKind {
    Info,
    Success,
    Warning,
    Error,
}

impl AnnouncementKind {
    /// Parse a preset name; anything unrecognized is `Info`.
    pub fn parse(kind: Option<&str>) -> Self {
        match kind.map(str::to_lowercase).as_deref() {
            Some("success") => Self::Success,
            Some("warning") => Self::Warning,
            Some("error") => Self::Error,
            _ => Self::Info,
        }
    }

    pub fn color(self) -> u32 {
        match self {
            Self::Info => 0x3498DB,
            Self::Success => 0x2ECC71,
            Self::Warning => 0xF39C12,
            Self::Error => 0xE74C3C,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Info => "ℹ️",
            Self::Success => "✅",
            Self::Warning => "⚠️",
            Self::Error => "❌",
        }
    }
}

/// Parse `Name|Value|Inline` entries separated by `;`. Entries with fewer
/// than two parts are skipped; a missing inline flag means not inline.
pub fn parse_fields(spec: &str) -> Vec<ApiEmbedField> {
    spec.split(';')
        .filter_map(|entry| {
            let parts: Vec<&str> = entry.split('|').collect();
            if parts.len() < 2 {
                return None;
            }
            Some(ApiEmbedField {
                name: parts[0].trim().to_string(),
                value: parts[1].trim().to_string(),
                inline: parts
                    .get(2)
                    .is_some_and(|flag| flag.trim().eq_ignore_ascii_case("true")),
            })
        })
        .collect()
}

fn owned(value: &Option<String>) -> Option<String> {
    optional(value).map(str::to_string)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendEmbedParams {
    channel_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    color_hex: Option<String>,
    author_name: Option<String>,
    author_icon: Option<String>,
    thumbnail: Option<String>,
    image_url: Option<String>,
    footer_text: Option<String>,
    footer_icon: Option<String>,
    timestamp: Option<bool>,
}

impl SendEmbedParams {
    fn build(&self) -> McpServerResult<ApiEmbed> {
        Ok(ApiEmbed {
            title: owned(&self.title),
            description: owned(&self.description),
            color: optional(&self.color_hex).map(parse_color).transpose()?,
            author: owned(&self.author_name).map(|name| EmbedAuthor {
                name,
                icon_url: owned(&self.author_icon),
            }),
            thumbnail: owned(&self.thumbnail).map(|url| EmbedMedia { url }),
            image: owned(&self.image_url).map(|url| EmbedMedia { url }),
            footer: owned(&self.footer_text).map(|text| EmbedFooter {
                text,
                icon_url: owned(&self.footer_icon),
            }),
            timestamp: self.timestamp.unwrap_or(false).then(Utc::now),
            ..ApiEmbed::default()
        })
    }
}

/// Tool to send a rich embed.
pub struct SendEmbedTool(DiscordHandle);

#[async_trait]
impl Tool for SendEmbedTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("send_embed", "Send a rich embed message to a channel")
            .with_category("embeds")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "channelId": {"type": "string", "description": "Discord channel ID"},
                    "title": {"type": "string", "description": "Embed title"},
                    "description": {"type": "string", "description": "Embed description/body"},
                    "colorHex": {"type": "string", "description": "Hex color code (e.g., #FF5733)"},
                    "authorName": {"type": "string", "description": "Author name"},
                    "authorIcon": {"type": "string", "description": "Author icon URL"},
                    "thumbnail": {"type": "string", "description": "Thumbnail URL (small image on right)"},
                    "imageUrl": {"type": "string", "description": "Large image URL"},
                    "footerText": {"type": "string", "description": "Footer text"},
                    "footerIcon": {"type": "string", "description": "Footer icon URL"},
                    "timestamp": {"type": "boolean", "description": "Add current timestamp"}
                },
                "required": ["channelId"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "send_embed"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: SendEmbedParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;

        let embed = params.build()?;
        if embed.is_empty() {
            return Err(McpServerError::InvalidParams(
                "Embed must have at least one of: title, description, author, image, or footer"
                    .to_string(),
            ));
        }

        let channel = self.0.text_channel(channel_id).await?;
        let message = self
            .0
            .client
            .send_message(&channel.id, &MessagePayload::embed(embed))
            .await?;

        Ok(ToolResult::text(format!(
            "Embed sent successfully. Message link: {}",
            message_link(&channel, &message)
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldsParams {
    channel_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    color_hex: Option<String>,
    fields: Option<String>,
    footer_text: Option<String>,
    timestamp: Option<bool>,
}

/// Tool to send an embed made of name/value fields.
pub struct SendEmbedWithFieldsTool(DiscordHandle);

#[async_trait]
impl Tool for SendEmbedWithFieldsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("send_embed_with_fields", "Send a rich embed with structured fields")
            .with_category("embeds")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "channelId": {"type": "string", "description": "Discord channel ID"},
                    "title": {"type": "string", "description": "Embed title"},
                    "description": {"type": "string", "description": "Embed description/body"},
                    "colorHex": {"type": "string", "description": "Hex color code (e.g., #FF5733)"},
                    "fields": {
                        "type": "string",
                        "description": "Fields: 'Name|Value|Inline' separated by semicolons (e.g., 'Status|Online|true;Players|64|true')"
                    },
                    "footerText": {"type": "string", "description": "Footer text"},
                    "timestamp": {"type": "boolean", "description": "Add current timestamp"}
                },
                "required": ["channelId", "fields"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "send_embed_with_fields"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: FieldsParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;
        let fields = required(&params.fields, "fields")?;

        let embed = ApiEmbed {
            title: owned(&params.title),
            description: owned(&params.description),
            color: optional(&params.color_hex).map(parse_color).transpose()?,
            footer: owned(&params.footer_text).map(|text| EmbedFooter {
                text,
                icon_url: None,
            }),
            timestamp: params.timestamp.unwrap_or(false).then(Utc::now),
            fields: parse_fields(fields),
            ..ApiEmbed::default()
        };
        debug!("Sending embed with {} fields", embed.fields.len());

        let channel = self.0.text_channel(channel_id).await?;
        let message = self
            .0
            .client
            .send_message(&channel.id, &MessagePayload::embed(embed))
            .await?;

        Ok(ToolResult::text(format!(
            "Embed with fields sent successfully. Message link: {}",
            message_link(&channel, &message)
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnouncementParams {
    channel_id: Option<String>,
    title: Option<String>,
    content: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    ping_role: Option<String>,
}

/// Tool to send a preset-styled announcement.
pub struct SendAnnouncementTool(DiscordHandle);

#[async_trait]
impl Tool for SendAnnouncementTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "send_announcement",
            "Send a standardized announcement embed (info/success/warning/error)",
        )
        .with_category("embeds")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "channelId": {"type": "string", "description": "Discord channel ID"},
                "title": {"type": "string", "description": "Announcement title"},
                "content": {"type": "string", "description": "Announcement content"},
                "type": {
                    "type": "string",
                    "description": "Type: info, success, warning, or error",
                    "enum": ["info", "success", "warning", "error"]
                },
                "pingRole": {"type": "string", "description": "Role ID to ping"}
            },
            "required": ["channelId", "title", "content"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "send_announcement"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: AnnouncementParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;
        let title = required(&params.title, "title")?;
        let content = required(&params.content, "content")?;
        let kind = AnnouncementKind::parse(optional(&params.kind));

        let channel = self.0.text_channel(channel_id).await?;

        let payload = MessagePayload {
            content: optional(&params.ping_role).map(|role| format!("<@&{}> ", role)),
            embeds: vec![ApiEmbed {
                title: Some(format!("{} {}", kind.emoji(), title)),
                description: Some(content.to_string()),
                color: Some(kind.color()),
                timestamp: Some(Utc::now()),
                ..ApiEmbed::default()
            }],
            ..MessagePayload::default()
        };
        let message = self.0.client.send_message(&channel.id, &payload).await?;

        Ok(ToolResult::text(format!(
            "Announcement sent successfully. Message link: {}",
            message_link(&channel, &message)
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditEmbedParams {
    channel_id: Option<String>,
    message_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    color_hex: Option<String>,
}

impl EditEmbedParams {
    /// Apply the requested edits. An empty title or description clears it.
    fn apply(&self, mut embed: ApiEmbed) -> McpServerResult<ApiEmbed> {
        if let Some(ref title) = self.title {
            embed.title = Some(title.clone()).filter(|t| !t.is_empty());
        }
        if let Some(ref description) = self.description {
            embed.description = Some(description.clone()).filter(|d| !d.is_empty());
        }
        if let Some(color) = optional(&self.color_hex) {
            embed.color = Some(parse_color(color)?);
        }
        Ok(embed)
    }
}

/// Tool to edit the first embed of a message.
pub struct EditEmbedTool(DiscordHandle);

#[async_trait]
impl Tool for EditEmbedTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("edit_embed", "Edit an existing embed message")
            .with_category("embeds")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "channelId": {"type": "string", "description": "Discord channel ID"},
                    "messageId": {"type": "string", "description": "Discord message ID"},
                    "title": {"type": "string", "description": "New embed title (empty string clears it)"},
                    "description": {"type": "string", "description": "New embed description (empty string clears it)"},
                    "colorHex": {"type": "string", "description": "New hex color code"}
                },
                "required": ["channelId", "messageId"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "edit_embed"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: EditEmbedParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;
        let message_id = required(&params.message_id, "messageId")?;
        if let Some(color) = optional(&params.color_hex) {
            parse_color(color)?;
        }

        let channel = self.0.text_channel(channel_id).await?;
        let message = self.0.client.get_message(&channel.id, message_id).await?;

        let original = message.embeds.first().cloned().ok_or_else(|| {
            McpServerError::InvalidParams("Message does not contain an embed".to_string())
        })?;
        let edited = params.apply(original)?;

        self.0
            .client
            .edit_message(&channel.id, &message.id, &MessagePayload::embed(edited))
            .await?;

        Ok(ToolResult::text(format!(
            "Embed edited successfully. Message link: {}",
            message_link(&channel, &message)
        )))
    }
}
