//! Discord REST API wire models.
//!
//! Only the fields the tools read or write are modelled; everything else in a
//! Discord payload is ignored on deserialization.

use chrono::{DateTime, TimeZone, Utc};
use log_scan::{Embed, LogEntry};
use serde::{Deserialize, Serialize};

/// Base of message deep links.
pub const PERMALINK_BASE: &str = "https://discord.com/channels";

/// Milliseconds between the Unix epoch and the Discord epoch (2015-01-01).
const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

/// Channel type codes.
pub mod channel_kind {
    pub const GUILD_TEXT: u8 = 0;
    pub const GUILD_VOICE: u8 = 2;
    pub const GUILD_CATEGORY: u8 = 4;
    pub const GUILD_ANNOUNCEMENT: u8 = 5;
    pub const ANNOUNCEMENT_THREAD: u8 = 10;
    pub const PUBLIC_THREAD: u8 = 11;
    pub const PRIVATE_THREAD: u8 = 12;
    pub const GUILD_STAGE_VOICE: u8 = 13;
}

/// Permission overwrite target codes.
pub mod overwrite_kind {
    pub const ROLE: u8 = 0;
    pub const MEMBER: u8 = 1;
}

/// Message component type codes.
pub mod component_kind {
    pub const ACTION_ROW: u8 = 1;
    pub const BUTTON: u8 = 2;
    pub const STRING_SELECT: u8 = 3;
}

/// Button style codes.
pub mod button_style {
    pub const PRIMARY: u8 = 1;
    pub const SECONDARY: u8 = 2;
    pub const SUCCESS: u8 = 3;
    pub const DANGER: u8 = 4;
    pub const LINK: u8 = 5;
}

/// Creation time encoded in a snowflake ID.
pub fn snowflake_timestamp(id: &str) -> Option<DateTime<Utc>> {
    let raw: u64 = id.parse().ok()?;
    let millis = (raw >> 22) as i64 + DISCORD_EPOCH_MS;
    Utc.timestamp_millis_opt(millis).single()
}

/// Deep link to a message.
pub fn permalink(guild_id: Option<&str>, channel_id: &str, message_id: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        PERMALINK_BASE,
        guild_id.unwrap_or("@me"),
        channel_id,
        message_id
    )
}

/// A Discord user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

/// Thread state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadMetadata {
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub locked: bool,
}

/// A guild channel or thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiChannel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub thread_metadata: Option<ThreadMetadata>,
    #[serde(default)]
    pub position: i32,
    /// Voice channels only; 0 means unlimited
    #[serde(default)]
    pub user_limit: Option<u32>,
    /// Voice channels only, in bits per second
    #[serde(default)]
    pub bitrate: Option<u32>,
    #[serde(default)]
    pub permission_overwrites: Vec<ApiOverwrite>,
}

impl ApiChannel {
    /// Channel name, empty if unnamed.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Whether the channel is a text or announcement channel.
    pub fn is_text(&self) -> bool {
        matches!(
            self.kind,
            channel_kind::GUILD_TEXT | channel_kind::GUILD_ANNOUNCEMENT
        )
    }

    /// Whether the channel is a thread.
    pub fn is_thread(&self) -> bool {
        matches!(
            self.kind,
            channel_kind::ANNOUNCEMENT_THREAD
                | channel_kind::PUBLIC_THREAD
                | channel_kind::PRIVATE_THREAD
        )
    }

    pub fn is_voice(&self) -> bool {
        self.kind == channel_kind::GUILD_VOICE
    }

    pub fn is_category(&self) -> bool {
        self.kind == channel_kind::GUILD_CATEGORY
    }

    /// The overwrite targeting `id`, if any.
    pub fn overwrite(&self, id: &str) -> Option<&ApiOverwrite> {
        self.permission_overwrites.iter().find(|o| o.id == id)
    }

    pub fn is_archived(&self) -> bool {
        self.thread_metadata.as_ref().is_some_and(|m| m.archived)
    }

    pub fn is_locked(&self) -> bool {
        self.thread_metadata.as_ref().is_some_and(|m| m.locked)
    }
}

/// A channel permission overwrite. Bit sets travel as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiOverwrite {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default = "zero_bits")]
    pub allow: String,
    #[serde(default = "zero_bits")]
    pub deny: String,
}

fn zero_bits() -> String {
    "0".to_string()
}

impl ApiOverwrite {
    pub fn new(id: impl Into<String>, kind: u8, allow: u64, deny: u64) -> Self {
        Self {
            id: id.into(),
            kind,
            allow: allow.to_string(),
            deny: deny.to_string(),
        }
    }

    pub fn allow_bits(&self) -> u64 {
        self.allow.parse().unwrap_or(0)
    }

    pub fn deny_bits(&self) -> u64 {
        self.deny.parse().unwrap_or(0)
    }

    pub fn is_role(&self) -> bool {
        self.kind == overwrite_kind::ROLE
    }
}

/// Emoji shown on a button or select option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentEmoji {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub animated: bool,
}

impl ComponentEmoji {
    /// Parse `<:name:id>`, `<a:name:id>`, or a unicode emoji.
    pub fn parse(raw: &str) -> Self {
        let custom = raw
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
            .map(|inner| inner.split(':').collect::<Vec<_>>());

        match custom.as_deref() {
            Some([flag, name, id]) if flag.is_empty() || *flag == "a" => Self {
                id: Some(id.to_string()),
                name: Some(name.to_string()),
                animated: *flag == "a",
            },
            _ => Self {
                id: None,
                name: Some(raw.to_string()),
                animated: false,
            },
        }
    }
}

/// One entry of a string select menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<ComponentEmoji>,
}

/// A message component: an action row, button, or select menu.
///
/// Fields this server does not model are kept in `extra`, so a component
/// read from a message can be written back unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiComponent {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<ComponentEmoji>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_values: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_values: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ApiComponent>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ApiComponent {
    pub fn row(components: Vec<ApiComponent>) -> Self {
        Self {
            kind: component_kind::ACTION_ROW,
            components,
            ..Self::default()
        }
    }

    /// An interactive button reporting `custom_id` when clicked.
    pub fn button(style: u8, label: impl Into<String>, custom_id: impl Into<String>) -> Self {
        Self {
            kind: component_kind::BUTTON,
            style: Some(style),
            label: Some(label.into()),
            custom_id: Some(custom_id.into()),
            ..Self::default()
        }
    }

    /// A button that opens `url`.
    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: component_kind::BUTTON,
            style: Some(button_style::LINK),
            label: Some(label.into()),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn string_select(
        custom_id: impl Into<String>,
        placeholder: impl Into<String>,
        options: Vec<SelectOption>,
    ) -> Self {
        Self {
            kind: component_kind::STRING_SELECT,
            custom_id: Some(custom_id.into()),
            placeholder: Some(placeholder.into()),
            options,
            ..Self::default()
        }
    }

    pub fn with_emoji(mut self, emoji: ComponentEmoji) -> Self {
        self.emoji = Some(emoji);
        self
    }

    /// Disable this component and everything nested in it.
    pub fn disable(&mut self) {
        if self.kind == component_kind::ACTION_ROW {
            self.components.iter_mut().for_each(ApiComponent::disable);
        } else {
            self.disabled = Some(true);
        }
    }
}

/// Embed author block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// Embed footer block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// Embed image or thumbnail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedMedia {
    pub url: String,
}

/// Embed field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// A rich embed, as read from and written to the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiEmbed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedMedia>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedMedia>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ApiEmbedField>,
}

impl ApiEmbed {
    /// Whether the embed has nothing Discord would display.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.author.is_none()
            && self.footer.is_none()
            && self.thumbnail.is_none()
            && self.image.is_none()
            && self.fields.is_empty()
    }
}

impl From<&ApiEmbed> for Embed {
    fn from(embed: &ApiEmbed) -> Self {
        let mut out = Embed {
            title: embed.title.clone(),
            description: embed.description.clone(),
            fields: Vec::new(),
        };
        for field in &embed.fields {
            out = out.with_field(field.name.clone(), field.value.clone());
        }
        out
    }
}

/// A channel message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub id: String,
    pub channel_id: String,
    #[serde(default)]
    pub content: String,
    pub author: ApiUser,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub embeds: Vec<ApiEmbed>,
    #[serde(default)]
    pub webhook_id: Option<String>,
    #[serde(default)]
    pub components: Vec<ApiComponent>,
}

impl ApiMessage {
    /// Convert into a scan entry, linking back through `guild_id`.
    pub fn into_log_entry(self, guild_id: Option<&str>) -> LogEntry {
        let permalink = permalink(guild_id, &self.channel_id, &self.id);
        let mut entry = LogEntry::new(self.timestamp, self.author.username, self.content, permalink);
        entry.embeds = self.embeds.iter().map(Embed::from).collect();
        entry.from_webhook = self.webhook_id.is_some();
        entry
    }
}

/// A guild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiGuild {
    pub id: String,
    pub name: String,
}

/// A guild member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMember {
    #[serde(default)]
    pub user: Option<ApiUser>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub communication_disabled_until: Option<DateTime<Utc>>,
}

impl ApiMember {
    pub fn id(&self) -> &str {
        self.user.as_ref().map(|u| u.id.as_str()).unwrap_or_default()
    }

    pub fn username(&self) -> &str {
        self.user.as_ref().map(|u| u.username.as_str()).unwrap_or_default()
    }

    /// Nickname, then global name, then username.
    pub fn display_name(&self) -> &str {
        self.nick
            .as_deref()
            .or_else(|| self.user.as_ref().and_then(|u| u.global_name.as_deref()))
            .unwrap_or_else(|| self.username())
    }

    /// End of an active timeout.
    pub fn timeout_until(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.communication_disabled_until.filter(|until| *until > now)
    }
}

/// A guild role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRole {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub mentionable: bool,
}

impl ApiRole {
    /// `#RRGGBB`, or `none` for the default (uncolored) role color.
    pub fn color_hex(&self) -> String {
        if self.color == 0 {
            "none".to_string()
        } else {
            format!("#{:06X}", self.color & 0xFF_FFFF)
        }
    }
}

/// A ban entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiBan {
    #[serde(default)]
    pub reason: Option<String>,
    pub user: ApiUser,
}

/// Active threads of a guild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveThreads {
    #[serde(default)]
    pub threads: Vec<ApiChannel>,
}

/// Body for creating or editing a message.
///
/// `components` is only sent when set; `Some(vec![])` strips every component
/// from an edited message.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<ApiEmbed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<ApiComponent>>,
}

impl MessagePayload {
    /// A text-only message.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// A message carrying one embed.
    pub fn embed(embed: ApiEmbed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }

    /// An edit that only replaces the components.
    pub fn components(components: Vec<ApiComponent>) -> Self {
        Self {
            components: Some(components),
            ..Self::default()
        }
    }

    pub fn with_components(mut self, components: Vec<ApiComponent>) -> Self {
        self.components = Some(components);
        self
    }
}

/// Body for creating a guild channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
}

/// Body for modifying a member's voice state. Unset fields are left unchanged;
/// `channel_id: Some(None)` disconnects the member from voice.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemberPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mute: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deaf: Option<bool>,
}

/// Body for creating or modifying a role. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RolePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentionable: Option<bool>,
}
