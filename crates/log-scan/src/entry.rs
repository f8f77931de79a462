//! Log entry types
//!
//! Immutable snapshots of retrieved channel messages. Entries are produced by a
//! [`LogSource`](crate::source::LogSource), consumed by a single scan, and dropped
//! once the report is rendered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resolved log channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel ID
    pub id: String,

    /// Channel name (rendered as `#name`)
    pub name: String,

    /// Owning guild, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
}

impl Channel {
    /// Create a channel handle.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            guild_id: None,
        }
    }

    /// Set the owning guild.
    pub fn with_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }
}

/// One name/value pair of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

/// Structured embed text attached to an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    /// Embed title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Embed description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Fields in display order
    #[serde(default)]
    pub fields: Vec<EmbedField>,
}

impl Embed {
    /// Create an empty embed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// One retrieved log message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the message was created
    pub timestamp: DateTime<Utc>,

    /// Author display name
    pub author: String,

    /// Primary message text
    pub raw_text: String,

    /// Attached embeds
    #[serde(default)]
    pub embeds: Vec<Embed>,

    /// Deep link back to the message
    pub permalink: String,

    /// Whether the message was posted by a webhook or automation
    #[serde(default)]
    pub from_webhook: bool,
}

impl LogEntry {
    /// Create an entry with no embeds.
    pub fn new(
        timestamp: DateTime<Utc>,
        author: impl Into<String>,
        raw_text: impl Into<String>,
        permalink: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            author: author.into(),
            raw_text: raw_text.into(),
            embeds: Vec::new(),
            permalink: permalink.into(),
            from_webhook: false,
        }
    }

    /// Attach an embed.
    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Mark the entry as webhook-originated.
    pub fn via_webhook(mut self) -> Self {
        self.from_webhook = true;
        self
    }

    /// Whether the entry carries at least one embed.
    pub fn has_embeds(&self) -> bool {
        !self.embeds.is_empty()
    }
}
