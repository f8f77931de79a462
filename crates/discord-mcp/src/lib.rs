//! # Discord MCP
//!
//! An MCP (Model Context Protocol) server that lets AI assistants read and
//! scan Discord log channels and run everyday moderation tasks.
//!
//! ## Overview
//!
//! The discord-mcp crate handles:
//! - **JSON-RPC**: MCP protocol over newline-delimited stdin/stdout
//! - **Tools**: Tool definitions and execution, grouped by family
//! - **Clients**: The Discord REST client and its configuration
//!
//! Scanning itself lives in the `log-scan` crate; the tools here only fetch
//! entries through [`log_scan::LogSource`] and return the rendered reports.
//!
//! ## MCP Protocol
//!
//! Supported methods:
//! - `initialize`: Initialize the MCP session
//! - `ping`: Liveness check
//! - `tools/list`: List available tools
//! - `tools/call`: Execute a tool
//!
//! Notifications are accepted and ignored.
//!
//! ## Available Tools
//!
//! ### Logs
//! - `read_log_channel`, `scan_for_cheats`, `analyze_player_activity`,
//!   `search_logs`, `get_log_stats`
//!
//! ### Moderation
//! - `kick_member`, `ban_member`, `unban_member`, `timeout_member`,
//!   `remove_timeout`, `list_bans`, `get_member_info`
//!
//! ### Roles
//! - `create_role`, `delete_role`, `assign_role`, `remove_role`, `list_roles`,
//!   `find_role`, `update_role`, `get_members_by_role`
//!
//! ### Threads
//! - `create_thread`, `create_thread_from_message`, `archive_thread`,
//!   `unarchive_thread`, `delete_thread`, `list_threads`, `add_thread_member`,
//!   `remove_thread_member`, `send_thread_message`
//!
//! ### Embeds
//! - `send_embed`, `send_embed_with_fields`, `send_announcement`, `edit_embed`
//!
//! ### Voice
//! - `create_voice_channel`, `delete_voice_channel`, `list_voice_channels`,
//!   `move_member`, `disconnect_member`, `server_mute_member`,
//!   `server_deafen_member`
//!
//! ### Permissions
//! - `set_channel_permissions`, `set_member_channel_permissions`,
//!   `clear_role_permissions`, `get_channel_permissions`,
//!   `sync_channel_permissions`, `list_permissions`, `lock_channel`,
//!   `unlock_channel`
//!
//! ### Interactive
//! - `send_buttons`, `send_embed_with_buttons`, `send_select_menu`,
//!   `send_role_panel`, `send_ticket_panel`, `remove_components`,
//!   `disable_buttons`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use discord_mcp::{McpServer, Tool, ToolContext, ToolDefinition, ToolResult};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct MyTool;
//!
//! #[async_trait]
//! impl Tool for MyTool {
//!     fn definition(&self) -> ToolDefinition {
//!         ToolDefinition::new("my_tool", "Does something useful").with_category("custom")
//!     }
//!
//!     async fn execute(
//!         &self,
//!         args: serde_json::Value,
//!         context: &ToolContext,
//!     ) -> Result<ToolResult, discord_mcp::McpServerError> {
//!         Ok(ToolResult::text("Done!"))
//!     }
//! }
//!
//! async fn setup() {
//!     let server = McpServer::discord();
//!     server.register_tool(Arc::new(MyTool)).await;
//!
//!     let reply = server
//!         .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
//!         .await;
//!     println!("{:?}", reply);
//! }
//! ```

pub mod clients;
pub mod server;
pub mod tools;
pub mod transport;
pub mod types;

// Re-export main types
pub use server::{McpServer, McpServerError, McpServerResult, Tool, ToolContext};
pub use types::{
    ContentBlock, McpError, McpRequest, McpResponse, RequestId, ServerCapabilities, ServerInfo,
    ToolCall, ToolCapabilities, ToolDefinition, ToolResult, PROTOCOL_VERSION,
};

// Re-export tool collections
pub use tools::{
    all_tools, embed_tools, interactive_tools, log_tools, moderation_tools, permission_tools,
    role_tools, thread_tools, voice_tools, DiscordHandle,
};

// Re-export the Discord client
pub use clients::{ConfigError, DiscordClient, DiscordConfig, DiscordError, ServiceEndpoint};

pub use transport::{serve, serve_stdio};
