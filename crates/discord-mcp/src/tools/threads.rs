//! Thread MCP tools
//!
//! Create, archive, delete, and list threads, manage thread membership, and
//! post into threads.

use super::{message_link, optional, parse_args, required, DiscordHandle};
use crate::clients::models::{channel_kind, ApiChannel, MessagePayload};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Get all thread tools.
pub fn thread_tools(discord: DiscordHandle) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CreateThreadTool(discord.clone())),
        Arc::new(CreateThreadFromMessageTool(discord.clone())),
        Arc::new(ArchiveThreadTool(discord.clone())),
        Arc::new(UnarchiveThreadTool(discord.clone())),
        Arc::new(DeleteThreadTool(discord.clone())),
        Arc::new(ListThreadsTool(discord.clone())),
        Arc::new(AddThreadMemberTool(discord.clone())),
        Arc::new(RemoveThreadMemberTool(discord.clone())),
        Arc::new(SendThreadMessageTool(discord)),
    ]
}

fn thread_schema(properties: serde_json::Value, required: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// One line of the active thread listing.
fn thread_line(thread: &ApiChannel, parents: &HashMap<String, String>) -> String {
    let parent = thread
        .parent_id
        .as_ref()
        .and_then(|id| parents.get(id))
        .map(String::as_str)
        .unwrap_or("unknown");

    format!(
        "- {} (ID: {}) in #{} [{}{}]",
        thread.name(),
        thread.id,
        parent,
        if thread.is_archived() { "Archived" } else { "Active" },
        if thread.is_locked() { ", Locked" } else { "" }
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateThreadParams {
    channel_id: Option<String>,
    name: Option<String>,
    is_private: Option<bool>,
    message: Option<String>,
}

/// Tool to start a standalone thread.
pub struct CreateThreadTool(DiscordHandle);

#[async_trait]
impl Tool for CreateThreadTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("create_thread", "Create a new thread in a text channel")
            .with_category("threads")
            .with_schema(thread_schema(
                serde_json::json!({
                    "channelId": {"type": "string", "description": "Discord channel ID"},
                    "name": {"type": "string", "description": "Thread name"},
                    "isPrivate": {"type": "boolean", "description": "Create as private thread"},
                    "message": {"type": "string", "description": "Initial message content"}
                }),
                &["channelId", "name"],
            ))
    }

    #[instrument(skip(self, args, _context), fields(tool = "create_thread"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: CreateThreadParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;
        let name = required(&params.name, "name")?;

        let channel = self.0.text_channel(channel_id).await?;
        let kind = if params.is_private.unwrap_or(false) {
            channel_kind::PRIVATE_THREAD
        } else {
            channel_kind::PUBLIC_THREAD
        };
        let thread = self.0.client.create_thread(&channel.id, name, kind).await?;

        if let Some(message) = optional(&params.message) {
            self.0
                .client
                .send_message(&thread.id, &MessagePayload::text(message))
                .await?;
        }
        info!("Created thread {} in #{}", thread.id, channel.name());

        Ok(ToolResult::text(format!(
            "Created thread: {} (ID: {}) in #{}",
            thread.name(),
            thread.id,
            channel.name()
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FromMessageParams {
    channel_id: Option<String>,
    message_id: Option<String>,
    name: Option<String>,
}

/// Tool to start a thread on an existing message.
pub struct CreateThreadFromMessageTool(DiscordHandle);

#[async_trait]
impl Tool for CreateThreadFromMessageTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "create_thread_from_message",
            "Create a thread attached to an existing message",
        )
        .with_category("threads")
        .with_schema(thread_schema(
            serde_json::json!({
                "channelId": {"type": "string", "description": "Discord channel ID"},
                "messageId": {"type": "string", "description": "Discord message ID"},
                "name": {"type": "string", "description": "Thread name"}
            }),
            &["channelId", "messageId", "name"],
        ))
    }

    #[instrument(skip(self, args, _context), fields(tool = "create_thread_from_message"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: FromMessageParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;
        let message_id = required(&params.message_id, "messageId")?;
        let name = required(&params.name, "name")?;

        let channel = self.0.text_channel(channel_id).await?;
        let message = self.0.client.get_message(&channel.id, message_id).await?;
        let thread = self
            .0
            .client
            .create_thread_from_message(&channel.id, &message.id, name)
            .await?;

        Ok(ToolResult::text(format!(
            "Created thread: {} (ID: {}) from message",
            thread.name(),
            thread.id
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArchiveParams {
    thread_id: Option<String>,
    locked: Option<bool>,
}

/// Tool to archive a thread.
pub struct ArchiveThreadTool(DiscordHandle);

#[async_trait]
impl Tool for ArchiveThreadTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("archive_thread", "Archive a thread (optionally lock it)")
            .with_category("threads")
            .with_schema(thread_schema(
                serde_json::json!({
                    "threadId": {"type": "string", "description": "Discord thread ID"},
                    "locked": {"type": "boolean", "description": "Lock thread to prevent unarchiving"}
                }),
                &["threadId"],
            ))
    }

    #[instrument(skip(self, args, _context), fields(tool = "archive_thread"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ArchiveParams = parse_args(args)?;
        let thread_id = required(&params.thread_id, "threadId")?;
        let locked = params.locked.unwrap_or(false);

        let thread = self.0.thread(thread_id).await?;
        self.0
            .client
            .modify_thread(&thread.id, true, locked.then_some(true))
            .await?;

        Ok(ToolResult::text(format!(
            "Archived thread: {}{}",
            thread.name(),
            if locked { " (locked)" } else { "" }
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadParams {
    thread_id: Option<String>,
}

fn thread_id_schema() -> serde_json::Value {
    thread_schema(
        serde_json::json!({"threadId": {"type": "string", "description": "Discord thread ID"}}),
        &["threadId"],
    )
}

/// Tool to reopen an archived thread.
pub struct UnarchiveThreadTool(DiscordHandle);

#[async_trait]
impl Tool for UnarchiveThreadTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("unarchive_thread", "Unarchive a thread")
            .with_category("threads")
            .with_schema(thread_id_schema())
    }

    #[instrument(skip(self, args, _context), fields(tool = "unarchive_thread"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ThreadParams = parse_args(args)?;
        let thread_id = required(&params.thread_id, "threadId")?;

        let thread = self.0.thread(thread_id).await?;
        self.0.client.modify_thread(&thread.id, false, Some(false)).await?;

        Ok(ToolResult::text(format!("Unarchived thread: {}", thread.name())))
    }
}

/// Tool to delete a thread.
pub struct DeleteThreadTool(DiscordHandle);

#[async_trait]
impl Tool for DeleteThreadTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("delete_thread", "Delete a thread")
            .with_category("threads")
            .with_schema(thread_id_schema())
    }

    #[instrument(skip(self, args, _context), fields(tool = "delete_thread"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ThreadParams = parse_args(args)?;
        let thread_id = required(&params.thread_id, "threadId")?;

        let thread = self.0.thread(thread_id).await?;
        self.0.client.delete_channel(&thread.id).await?;

        Ok(ToolResult::text(format!("Deleted thread: {}", thread.name())))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuildParams {
    guild_id: Option<String>,
}

/// Tool to list the active threads of a guild.
pub struct ListThreadsTool(DiscordHandle);

#[async_trait]
impl Tool for ListThreadsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_threads", "List all active threads in the server")
            .with_category("threads")
            .with_schema(thread_schema(
                serde_json::json!({
                    "guildId": {
                        "type": "string",
                        "description": "Discord server ID (defaults to DISCORD_GUILD_ID)"
                    }
                }),
                &[],
            ))
    }

    #[instrument(skip(self, args, _context), fields(tool = "list_threads"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: GuildParams = parse_args(args)?;
        let guild = self.0.guild(&params.guild_id).await?;

        let threads = self.0.client.list_active_threads(&guild.id).await?;
        if threads.is_empty() {
            return Ok(ToolResult::text("No active threads found in server"));
        }

        let parents: HashMap<String, String> = self
            .0
            .client
            .list_guild_channels(&guild.id)
            .await?
            .into_iter()
            .map(|channel| {
                let name = channel.name().to_string();
                (channel.id, name)
            })
            .collect();

        let lines: Vec<String> = threads.iter().map(|t| thread_line(t, &parents)).collect();

        Ok(ToolResult::text(format!(
            "Retrieved {} active threads:\n{}",
            threads.len(),
            lines.join("\n")
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadMemberParams {
    thread_id: Option<String>,
    user_id: Option<String>,
}

fn thread_member_schema() -> serde_json::Value {
    thread_schema(
        serde_json::json!({
            "threadId": {"type": "string", "description": "Discord thread ID"},
            "userId": {"type": "string", "description": "Discord user ID"}
        }),
        &["threadId", "userId"],
    )
}

/// Tool to add a user to a thread.
pub struct AddThreadMemberTool(DiscordHandle);

#[async_trait]
impl Tool for AddThreadMemberTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("add_thread_member", "Add a member to a thread")
            .with_category("threads")
            .with_schema(thread_member_schema())
    }

    #[instrument(skip(self, args, _context), fields(tool = "add_thread_member"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ThreadMemberParams = parse_args(args)?;
        let thread_id = required(&params.thread_id, "threadId")?;
        let user_id = required(&params.user_id, "userId")?;

        let thread = self.0.thread(thread_id).await?;
        self.0.client.add_thread_member(&thread.id, user_id).await?;

        Ok(ToolResult::text(format!(
            "Added user {} to thread: {}",
            user_id,
            thread.name()
        )))
    }
}

/// Tool to remove a user from a thread.
pub struct RemoveThreadMemberTool(DiscordHandle);

#[async_trait]
impl Tool for RemoveThreadMemberTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("remove_thread_member", "Remove a member from a thread")
            .with_category("threads")
            .with_schema(thread_member_schema())
    }

    #[instrument(skip(self, args, _context), fields(tool = "remove_thread_member"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ThreadMemberParams = parse_args(args)?;
        let thread_id = required(&params.thread_id, "threadId")?;
        let user_id = required(&params.user_id, "userId")?;

        let thread = self.0.thread(thread_id).await?;
        self.0.client.remove_thread_member(&thread.id, user_id).await?;

        Ok(ToolResult::text(format!(
            "Removed user {} from thread: {}",
            user_id,
            thread.name()
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadMessageParams {
    thread_id: Option<String>,
    content: Option<String>,
}

/// Tool to post into a thread.
pub struct SendThreadMessageTool(DiscordHandle);

#[async_trait]
impl Tool for SendThreadMessageTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("send_thread_message", "Send a message to a thread")
            .with_category("threads")
            .with_schema(thread_schema(
                serde_json::json!({
                    "threadId": {"type": "string", "description": "Discord thread ID"},
                    "content": {"type": "string", "description": "Message content"}
                }),
                &["threadId", "content"],
            ))
    }

    #[instrument(skip(self, args, _context), fields(tool = "send_thread_message"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ThreadMessageParams = parse_args(args)?;
        let thread_id = required(&params.thread_id, "threadId")?;
        let content = required(&params.content, "content")?;

        let thread = self.0.thread(thread_id).await?;
        let message = self
            .0
            .client
            .send_message(&thread.id, &MessagePayload::text(content))
            .await?;

        Ok(ToolResult::text(format!(
            "Message sent to thread. Message link: {}",
            message_link(&thread, &message)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_line() {
        let thread: ApiChannel = serde_json::from_value(serde_json::json!({
            "id": "5",
            "type": 11,
            "name": "appeal-42",
            "parent_id": "2",
            "thread_metadata": {"archived": false, "locked": true}
        }))
        .unwrap();

        let mut parents = HashMap::new();
        parents.insert("2".to_string(), "appeals".to_string());

        assert_eq!(
            thread_line(&thread, &parents),
            "- appeal-42 (ID: 5) in #appeals [Active, Locked]"
        );
        assert_eq!(
            thread_line(&thread, &HashMap::new()),
            "- appeal-42 (ID: 5) in #unknown [Active, Locked]"
        );
    }
}
