//! MCP server implementation
//!
//! Holds the tool registry and answers JSON-RPC requests. The registry is
//! filled once at startup; `tools/list` reports tools in registration order.

use crate::types::*;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info_span, warn, Instrument};

/// MCP server error types.
#[derive(Debug, Error)]
pub enum McpServerError {
    /// Tool not found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Caller input failed validation
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Addressed channel, message, role, member, or thread does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote call failed
    #[error("Tool execution failed: {0}")]
    ExecutionError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl McpServerError {
    /// JSON-RPC error object for this failure.
    pub fn to_rpc_error(&self) -> McpError {
        match self {
            Self::ToolNotFound(_) | Self::InvalidParams(_) | Self::NotFound(_) => {
                McpError::invalid_params(self.to_string())
            }
            Self::ExecutionError(_) | Self::Internal(_) => McpError::internal_error(self.to_string()),
        }
    }
}

/// Result type for MCP server operations.
pub type McpServerResult<T> = Result<T, McpServerError>;

/// Trait for tool implementations.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with given arguments.
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult>;
}

/// Context for tool execution.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Request correlation ID
    pub correlation_id: String,
}

impl ToolContext {
    /// Create a context with a fresh correlation ID.
    pub fn new() -> Self {
        Self {
            correlation_id: uuid::Uuid::now_v7().to_string(),
        }
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        Self::new()
    }
}

/// MCP server.
pub struct McpServer {
    /// Server info
    info: ServerInfo,

    /// Server capabilities
    capabilities: ServerCapabilities,

    /// Registered tools, in registration order
    tools: Arc<RwLock<IndexMap<String, Arc<dyn Tool>>>>,
}

impl McpServer {
    /// Create a new MCP server.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolCapabilities {
                    list_changed: false,
                }),
            },
            tools: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Create with the default server name.
    pub fn discord() -> Self {
        Self::new("discord-mcp", env!("CARGO_PKG_VERSION"))
    }

    /// Register a tool. A later tool with the same name replaces the earlier one.
    pub async fn register_tool(&self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        let mut tools = self.tools.write().await;
        if tools.insert(name.clone(), tool).is_some() {
            warn!("Tool {} registered twice; keeping the later one", name);
        }
    }

    /// Register multiple tools.
    pub async fn register_tools(&self, tools: Vec<Arc<dyn Tool>>) {
        for tool in tools {
            self.register_tool(tool).await;
        }
    }

    /// Get all tool definitions.
    pub async fn list_tools(&self) -> Vec<ToolDefinition> {
        let tools = self.tools.read().await;
        tools.values().map(|t| t.definition()).collect()
    }

    /// Get tools by category.
    pub async fn list_tools_by_category(&self, category: &str) -> Vec<ToolDefinition> {
        let tools = self.tools.read().await;
        tools
            .values()
            .map(|t| t.definition())
            .filter(|d| d.category.as_deref() == Some(category))
            .collect()
    }

    /// Categories in order of first registration.
    pub async fn list_categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for definition in self.list_tools().await {
            if let Some(category) = definition.category {
                if !categories.contains(&category) {
                    categories.push(category);
                }
            }
        }
        categories
    }

    /// Execute a tool.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let tool = {
            let tools = self.tools.read().await;
            tools
                .get(name)
                .cloned()
                .ok_or_else(|| McpServerError::ToolNotFound(name.to_string()))?
        };

        let span = info_span!("tool_call", tool = %name, correlation_id = %context.correlation_id);
        tool.execute(arguments, context).instrument(span).await
    }

    /// Handle one line of newline-delimited JSON-RPC.
    ///
    /// Returns the serialized response, or `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = match serde_json::from_str::<McpRequest>(line) {
            Ok(request) if request.is_notification() => {
                debug!("Ignoring notification {}", request.method);
                return None;
            }
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!("Unparseable request: {}", e);
                McpResponse::error(RequestId::Null, McpError::parse_error())
            }
        };

        match serde_json::to_string(&response) {
            Ok(serialized) => Some(serialized),
            Err(e) => {
                warn!("Failed to serialize response: {}", e);
                None
            }
        }
    }

    /// Handle an MCP request.
    pub async fn handle_request(&self, request: McpRequest) -> McpResponse {
        if request.jsonrpc != JSONRPC_VERSION {
            return McpResponse::error(
                request.id,
                McpError::invalid_request(format!("Unsupported jsonrpc version: {}", request.jsonrpc)),
            );
        }

        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "ping" => McpResponse::success(request.id, serde_json::json!({})),
            "tools/list" => self.handle_tools_list(request.id).await,
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            _ => McpResponse::error(request.id, McpError::method_not_found(&request.method)),
        }
    }

    fn handle_initialize(&self, id: RequestId) -> McpResponse {
        McpResponse::success(
            id,
            serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": self.capabilities,
                "serverInfo": self.info
            }),
        )
    }

    async fn handle_tools_list(&self, id: RequestId) -> McpResponse {
        let tools = self.list_tools().await;
        McpResponse::success(id, serde_json::json!({ "tools": tools }))
    }

    async fn handle_tools_call(
        &self,
        id: RequestId,
        params: Option<serde_json::Value>,
    ) -> McpResponse {
        let params = match params {
            Some(p) => p,
            None => return McpResponse::error(id, McpError::invalid_params("Missing params")),
        };

        let call: ToolCall = match serde_json::from_value(params) {
            Ok(c) => c,
            Err(e) => return McpResponse::error(id, McpError::invalid_params(e.to_string())),
        };

        let context = ToolContext::new();

        let result = self
            .call_tool(&call.name, call.arguments, &context)
            .await
            .and_then(|result| {
                serde_json::to_value(result).map_err(|e| McpServerError::Internal(e.to_string()))
            });

        match result {
            Ok(value) => McpResponse::success(id, value),
            Err(e) => {
                warn!(tool = %call.name, correlation_id = %context.correlation_id, "{}", e);
                McpResponse::error(id, e.to_rpc_error())
            }
        }
    }

    /// Get server info.
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Get server capabilities.
    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }
}
