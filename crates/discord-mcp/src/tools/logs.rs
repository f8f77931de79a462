//! Log channel MCP tools
//!
//! Read a game-server log channel and run the log-scan analyses over its most
//! recent messages. Each call fetches at most one page of history through the
//! [`LogSource`] seam and renders a text report.

use super::{parse_args, required};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use log_scan::{
    analyze_player, clamp_limit, collect_stats, render_cheat_report, render_player_report,
    render_search_results, render_stats, render_transcript, scan_for_cheats, search, Channel,
    LogEntry, LogSource, PatternRegistry, NO_MESSAGES,
};
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Default page size of `read_log_channel`.
pub const READ_DEFAULT_LIMIT: usize = 50;

/// Default page size of the analysis tools.
pub const SCAN_DEFAULT_LIMIT: usize = 100;

/// Get all log tools.
pub fn log_tools(source: Arc<dyn LogSource>, registry: Arc<PatternRegistry>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ReadLogChannelTool::new(source.clone())),
        Arc::new(ScanForCheatsTool::new(source.clone(), registry.clone())),
        Arc::new(AnalyzePlayerActivityTool::new(source.clone(), registry)),
        Arc::new(SearchLogsTool::new(source.clone())),
        Arc::new(GetLogStatsTool::new(source)),
    ]
}

/// Resolve the channel, then fetch up to the clamped limit of recent entries.
async fn fetch(
    source: &dyn LogSource,
    channel_id: &str,
    limit: Option<i64>,
    default_limit: usize,
) -> McpServerResult<(Channel, Vec<LogEntry>)> {
    let limit = clamp_limit(limit, default_limit);
    let channel = source.resolve_channel(channel_id).await?;

    debug!("Fetching {} entries from #{}", limit, channel.name);
    let entries = source.fetch_recent(&channel, limit).await?;

    Ok((channel, entries))
}

/// Read `limit` from any JSON number or numeric string. Values outside `i64`
/// saturate; anything else is treated as absent. Range clamping happens in
/// [`clamp_limit`].
fn lenient_limit<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(limit_from_value))
}

fn limit_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => limit_from_number(number),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(limit_from_float))
        }
        _ => None,
    }
}

fn limit_from_number(number: &Number) -> Option<i64> {
    if let Some(n) = number.as_i64() {
        Some(n)
    } else if number.as_u64().is_some() {
        Some(i64::MAX)
    } else {
        number.as_f64().and_then(limit_from_float)
    }
}

fn limit_from_float(n: f64) -> Option<i64> {
    // `as` saturates at the i64 bounds.
    (!n.is_nan()).then_some(n as i64)
}

fn schema(extra: Option<(&str, &str)>, limit_description: &str) -> serde_json::Value {
    let mut properties = serde_json::json!({
        "channelId": {
            "type": "string",
            "description": "Discord channel ID"
        },
        "limit": {
            "type": "integer",
            "description": limit_description,
            "minimum": 1,
            "maximum": 100
        }
    });
    let mut required = vec!["channelId".to_string()];

    if let Some((name, description)) = extra {
        properties[name] = serde_json::json!({
            "type": "string",
            "description": description
        });
        required.push(name.to_string());
    }

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelParams {
    channel_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_limit")]
    limit: Option<i64>,
}

/// Tool to read a log channel as a transcript.
pub struct ReadLogChannelTool {
    source: Arc<dyn LogSource>,
}

impl ReadLogChannelTool {
    pub fn new(source: Arc<dyn LogSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for ReadLogChannelTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("read_log_channel", "Read recent messages from a log channel")
            .with_category("logs")
            .with_schema(schema(None, "Number of messages (1-100, default 50)"))
    }

    #[instrument(skip(self, args, _context), fields(tool = "read_log_channel"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ChannelParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;

        let (channel, entries) =
            fetch(self.source.as_ref(), channel_id, params.limit, READ_DEFAULT_LIMIT).await?;

        Ok(ToolResult::text(render_transcript(&channel, &entries)))
    }
}

/// Tool to sweep a log channel for cheat patterns.
pub struct ScanForCheatsTool {
    source: Arc<dyn LogSource>,
    registry: Arc<PatternRegistry>,
}

impl ScanForCheatsTool {
    pub fn new(source: Arc<dyn LogSource>, registry: Arc<PatternRegistry>) -> Self {
        Self { source, registry }
    }
}

#[async_trait]
impl Tool for ScanForCheatsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "scan_for_cheats",
            "Scan a log channel for suspicious activity and cheat patterns",
        )
        .with_category("logs")
        .with_schema(schema(None, "Number of messages to scan (1-100, default 100)"))
    }

    #[instrument(skip(self, args, _context), fields(tool = "scan_for_cheats"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ChannelParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;

        let (channel, entries) =
            fetch(self.source.as_ref(), channel_id, params.limit, SCAN_DEFAULT_LIMIT).await?;
        if entries.is_empty() {
            return Ok(ToolResult::text(NO_MESSAGES));
        }

        let scan = scan_for_cheats(&self.registry, &entries);
        info!(
            "Scanned {} entries from #{}: {} findings",
            entries.len(),
            channel.name,
            scan.total()
        );

        Ok(ToolResult::text(render_cheat_report(&channel, entries.len(), &scan)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerParams {
    channel_id: Option<String>,
    player_search: Option<String>,
    #[serde(default, deserialize_with = "lenient_limit")]
    limit: Option<i64>,
}

/// Tool to summarize one player's activity.
pub struct AnalyzePlayerActivityTool {
    source: Arc<dyn LogSource>,
    registry: Arc<PatternRegistry>,
}

impl AnalyzePlayerActivityTool {
    pub fn new(source: Arc<dyn LogSource>, registry: Arc<PatternRegistry>) -> Self {
        Self { source, registry }
    }
}

#[async_trait]
impl Tool for AnalyzePlayerActivityTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "analyze_player_activity",
            "Analyze a specific player's activity in logs",
        )
        .with_category("logs")
        .with_schema(schema(
            Some(("playerSearch", "Player ID, name, or identifier")),
            "Number of messages to search (1-100, default 100)",
        ))
    }

    #[instrument(skip(self, args, _context), fields(tool = "analyze_player_activity"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: PlayerParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;
        let player = required(&params.player_search, "playerSearch")?;

        let (channel, entries) =
            fetch(self.source.as_ref(), channel_id, params.limit, SCAN_DEFAULT_LIMIT).await?;
        if entries.is_empty() {
            return Ok(ToolResult::text(NO_MESSAGES));
        }

        let activity = analyze_player(&self.registry, &entries, player);
        debug!("Player {} matched {} entries", player, activity.matched);

        Ok(ToolResult::text(render_player_report(
            &channel,
            player,
            entries.len(),
            &activity,
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    channel_id: Option<String>,
    query: Option<String>,
    #[serde(default, deserialize_with = "lenient_limit")]
    limit: Option<i64>,
}

/// Tool to search a log channel by regex or keyword.
pub struct SearchLogsTool {
    source: Arc<dyn LogSource>,
}

impl SearchLogsTool {
    pub fn new(source: Arc<dyn LogSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for SearchLogsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "search_logs",
            "Search log messages for specific keywords or patterns",
        )
        .with_category("logs")
        .with_schema(schema(
            Some((
                "query",
                "Search query (regex, case-insensitive; invalid patterns are matched literally)",
            )),
            "Number of messages to search (1-100, default 100)",
        ))
    }

    #[instrument(skip(self, args, _context), fields(tool = "search_logs"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: SearchParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;
        let query = required(&params.query, "query")?;

        let (_channel, entries) =
            fetch(self.source.as_ref(), channel_id, params.limit, SCAN_DEFAULT_LIMIT).await?;
        if entries.is_empty() {
            return Ok(ToolResult::text(NO_MESSAGES));
        }

        let hits = search(&entries, query);
        Ok(ToolResult::text(render_search_results(query, entries.len(), &hits)))
    }
}

/// Tool to summarize who and when a log channel is written.
pub struct GetLogStatsTool {
    source: Arc<dyn LogSource>,
}

impl GetLogStatsTool {
    pub fn new(source: Arc<dyn LogSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for GetLogStatsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_log_stats", "Get statistics about log channel activity")
            .with_category("logs")
            .with_schema(schema(None, "Number of messages to analyze (1-100, default 100)"))
    }

    #[instrument(skip(self, args, _context), fields(tool = "get_log_stats"))]
    async fn execute(&self, args: serde_json::Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ChannelParams = parse_args(args)?;
        let channel_id = required(&params.channel_id, "channelId")?;

        let (channel, entries) =
            fetch(self.source.as_ref(), channel_id, params.limit, SCAN_DEFAULT_LIMIT).await?;

        Ok(ToolResult::text(render_stats(&channel, &collect_stats(&entries))))
    }
}
