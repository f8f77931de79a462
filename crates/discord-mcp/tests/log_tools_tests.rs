//! Tests for the log channel tools.
//!
//! The tools are driven through [`McpServer`] against an in-memory
//! [`LogSource`], so every report is checked end to end without Discord.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use discord_mcp::{log_tools, McpError, McpRequest, McpServer, McpServerError, ToolContext};
use log_scan::{
    Channel, Embed, LogEntry, LogSource, PatternRegistry, SourceError, SourceResult, NO_MESSAGES,
};
use std::sync::{Arc, Mutex};

const CHANNEL_ID: &str = "100";

/// In-memory log channel that records every fetch.
struct FakeLogSource {
    entries: Vec<LogEntry>,
    fetch_error: Option<String>,
    resolved: Mutex<usize>,
    requested: Mutex<Vec<usize>>,
}

impl FakeLogSource {
    fn new(entries: Vec<LogEntry>) -> Arc<Self> {
        Arc::new(Self {
            entries,
            fetch_error: None,
            resolved: Mutex::new(0),
            requested: Mutex::new(Vec::new()),
        })
    }

    /// A channel that resolves but whose history cannot be read.
    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            entries: Vec::new(),
            fetch_error: Some(message.to_string()),
            resolved: Mutex::new(0),
            requested: Mutex::new(Vec::new()),
        })
    }

    fn resolve_count(&self) -> usize {
        *self.resolved.lock().unwrap()
    }

    fn requested(&self) -> Vec<usize> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogSource for FakeLogSource {
    async fn resolve_channel(&self, channel_id: &str) -> SourceResult<Channel> {
        *self.resolved.lock().unwrap() += 1;
        if channel_id == CHANNEL_ID {
            Ok(Channel::new(CHANNEL_ID, "server-logs").with_guild("1"))
        } else {
            Err(SourceError::NotFound("Channel not found by channelId".to_string()))
        }
    }

    async fn fetch_recent(&self, _channel: &Channel, limit: usize) -> SourceResult<Vec<LogEntry>> {
        self.requested.lock().unwrap().push(limit);
        if let Some(ref message) = self.fetch_error {
            return Err(SourceError::Remote(message.clone()));
        }
        Ok(self.entries.iter().take(limit).cloned().collect())
    }
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, hour, minute, 0).unwrap()
}

fn entry(hour: u32, minute: u32, author: &str, text: &str) -> LogEntry {
    LogEntry::new(
        at(hour, minute),
        author,
        text,
        format!("https://discord.com/channels/1/{}/{}{}", CHANNEL_ID, hour, minute),
    )
}

async fn server_with(source: Arc<FakeLogSource>) -> McpServer {
    let registry = Arc::new(PatternRegistry::builtin().unwrap());
    let server = McpServer::discord();
    server.register_tools(log_tools(source, registry)).await;
    server
}

async fn call(server: &McpServer, tool: &str, args: serde_json::Value) -> Result<String, McpServerError> {
    server
        .call_tool(tool, args, &ToolContext::new())
        .await
        .map(|result| result.as_text())
}

// ============================================================================
// scan_for_cheats
// ============================================================================

#[tokio::test]
async fn test_scan_groups_findings_by_category() {
    let source = FakeLogSource::new(vec![
        entry(14, 5, "Anticheat", "Player 12 teleported to Legion Square"),
        entry(14, 3, "Logger", "player: 7 deposited 50000 cash"),
        entry(14, 1, "Logger", "Server restarted"),
    ]);
    let server = server_with(source).await;

    let report = call(&server, "scan_for_cheats", serde_json::json!({ "channelId": CHANNEL_ID }))
        .await
        .unwrap();

    assert!(report.starts_with("⚠️ **Suspicious Activity Report** - #server-logs\nScanned: 3 messages"));
    assert!(report.contains("### 🚨 Movement Exploit (1 hits)"));
    assert!(report.contains("### 🚨 Money Exploit (1 hits)"));
    assert!(report.contains("Player: `7`"));
    assert!(report.ends_with("**Total Findings: 2**"));

    let movement = report.find("Movement Exploit").unwrap();
    let money = report.find("Money Exploit").unwrap();
    assert!(movement < money);
}

#[tokio::test]
async fn test_scan_three_entry_channel() {
    let source = FakeLogSource::new(vec![
        entry(10, 2, "Anticheat", "noclip detected"),
        entry(10, 1, "Logger", "paid 5000 cash"),
        entry(10, 0, "Logger", "hello"),
    ]);
    let server = server_with(source).await;

    let report = call(&server, "scan_for_cheats", serde_json::json!({ "channelId": CHANNEL_ID }))
        .await
        .unwrap();

    assert!(report.contains("### 🚨 Movement Exploit (1 hits)"));
    assert!(report.contains("Match: `noclip`"));
    assert!(report.contains("### 🚨 Money Exploit (1 hits)"));
    assert!(report.contains("Match: `5000 cash`"));
    assert!(!report.contains("hello"));
    assert!(report.ends_with("**Total Findings: 2**"));
}

#[tokio::test]
async fn test_scan_entry_matching_two_categories() {
    let source = FakeLogSource::new(vec![entry(9, 0, "Anticheat", "player: 7 used noclip and godmode")]);
    let server = server_with(source).await;

    let report = call(&server, "scan_for_cheats", serde_json::json!({ "channelId": CHANNEL_ID }))
        .await
        .unwrap();

    assert!(report.contains("### 🚨 Movement Exploit (1 hits)"));
    assert!(report.contains("### 🚨 Godmode/Invincibility (1 hits)"));
    assert!(report.contains("Match: `noclip`"));
    assert!(report.contains("Match: `godmode`"));
    assert!(report.ends_with("**Total Findings: 2**"));
}

#[tokio::test]
async fn test_scan_reads_embed_content() {
    let source = FakeLogSource::new(vec![LogEntry::new(at(10, 0), "txAdmin", "", "link-1")
        .with_embed(Embed::new().with_title("Detection").with_field("Reason", "Lua executor found"))
        .via_webhook()]);
    let server = server_with(source).await;

    let report = call(&server, "scan_for_cheats", serde_json::json!({ "channelId": CHANNEL_ID }))
        .await
        .unwrap();

    assert!(report.contains("### 🚨 Cheat Injection (1 hits)"));
    assert!(report.contains("[Jump to message](link-1)"));
}

#[tokio::test]
async fn test_scan_without_findings() {
    let source = FakeLogSource::new(vec![
        entry(8, 0, "Logger", "Server restarted"),
        entry(8, 1, "Logger", "Weather set to rain"),
    ]);
    let server = server_with(source).await;

    let report = call(&server, "scan_for_cheats", serde_json::json!({ "channelId": CHANNEL_ID }))
        .await
        .unwrap();

    assert_eq!(report, "✅ **No suspicious patterns detected** in 2 messages from #server-logs");
}

#[tokio::test]
async fn test_scan_empty_channel() {
    let server = server_with(FakeLogSource::new(Vec::new())).await;

    let report = call(&server, "scan_for_cheats", serde_json::json!({ "channelId": CHANNEL_ID }))
        .await
        .unwrap();

    assert_eq!(report, NO_MESSAGES);
}

// ============================================================================
// Limits
// ============================================================================

#[tokio::test]
async fn test_limits_are_clamped_and_defaulted() {
    let source = FakeLogSource::new(vec![entry(8, 0, "Logger", "hello")]);
    let server = server_with(source.clone()).await;

    call(&server, "scan_for_cheats", serde_json::json!({ "channelId": CHANNEL_ID, "limit": 500 }))
        .await
        .unwrap();
    call(&server, "scan_for_cheats", serde_json::json!({ "channelId": CHANNEL_ID, "limit": 0 }))
        .await
        .unwrap();
    call(&server, "read_log_channel", serde_json::json!({ "channelId": CHANNEL_ID }))
        .await
        .unwrap();
    call(&server, "get_log_stats", serde_json::json!({ "channelId": CHANNEL_ID }))
        .await
        .unwrap();

    assert_eq!(source.requested(), vec![100, 1, 50, 100]);
}

#[tokio::test]
async fn test_limit_never_rejected() {
    let source = FakeLogSource::new(vec![entry(8, 0, "Logger", "hello")]);
    let server = server_with(source.clone()).await;

    for limit in [
        serde_json::json!(500.0),
        serde_json::json!("500"),
        serde_json::json!(1e30),
        serde_json::json!(18446744073709551615u64),
        serde_json::json!(-1e30),
        serde_json::json!("lots"),
    ] {
        let report = call(
            &server,
            "scan_for_cheats",
            serde_json::json!({ "channelId": CHANNEL_ID, "limit": limit.clone() }),
        )
        .await;
        assert!(report.is_ok(), "limit {} was rejected: {:?}", limit, report);
    }

    assert_eq!(source.requested(), vec![100, 100, 100, 100, 1, 100]);
}

#[tokio::test]
async fn test_reports_count_fetched_entries_not_limit() {
    let source = FakeLogSource::new(vec![
        entry(13, 1, "Anticheat", "aimbot flagged on player: 3"),
        entry(13, 0, "Logger", "player: 3 joined"),
    ]);
    let server = server_with(source.clone()).await;

    let scan = call(
        &server,
        "scan_for_cheats",
        serde_json::json!({ "channelId": CHANNEL_ID, "limit": 100 }),
    )
    .await
    .unwrap();
    assert!(scan.contains("\nScanned: 2 messages\n"));

    let hits = call(
        &server,
        "search_logs",
        serde_json::json!({ "channelId": CHANNEL_ID, "query": "joined", "limit": 100 }),
    )
    .await
    .unwrap();
    assert!(hits.contains("Found 1 matches in 2 messages"));

    let player = call(
        &server,
        "analyze_player_activity",
        serde_json::json!({ "channelId": CHANNEL_ID, "playerSearch": "player: 3", "limit": 100 }),
    )
    .await
    .unwrap();
    assert!(player.contains("Entries Found: 2 / 2 messages scanned"));

    assert_eq!(source.requested(), vec![100, 100, 100]);
}

// ============================================================================
// Parameter validation and errors
// ============================================================================

#[tokio::test]
async fn test_missing_channel_rejected_before_fetch() {
    let source = FakeLogSource::new(vec![entry(8, 0, "Logger", "hello")]);
    let server = server_with(source.clone()).await;

    for tool in [
        "read_log_channel",
        "scan_for_cheats",
        "analyze_player_activity",
        "search_logs",
        "get_log_stats",
    ] {
        let err = call(&server, tool, serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, McpServerError::InvalidParams(_)), "{}: {:?}", tool, err);
    }

    let err = call(&server, "search_logs", serde_json::json!({ "channelId": CHANNEL_ID }))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid parameters: query cannot be null");

    assert_eq!(source.resolve_count(), 0);
    assert!(source.requested().is_empty());
}

#[tokio::test]
async fn test_unknown_channel_maps_to_invalid_params() {
    let server = server_with(FakeLogSource::new(Vec::new())).await;

    let request = McpRequest::new(7i64, "tools/call").with_params(serde_json::json!({
        "name": "get_log_stats",
        "arguments": { "channelId": "999" }
    }));
    let response = server.handle_request(request).await;

    let error = response.error.unwrap();
    assert_eq!(error.code, McpError::INVALID_PARAMS);
    assert!(error.message.contains("Channel not found by channelId"));
}

#[tokio::test]
async fn test_fetch_failure_is_execution_error() {
    let source = FakeLogSource::failing("Discord API error (500): upstream unavailable");
    let server = server_with(source.clone()).await;

    for (tool, args) in [
        ("read_log_channel", serde_json::json!({ "channelId": CHANNEL_ID })),
        ("scan_for_cheats", serde_json::json!({ "channelId": CHANNEL_ID })),
        (
            "analyze_player_activity",
            serde_json::json!({ "channelId": CHANNEL_ID, "playerSearch": "Bob" }),
        ),
        ("search_logs", serde_json::json!({ "channelId": CHANNEL_ID, "query": "kill" })),
        ("get_log_stats", serde_json::json!({ "channelId": CHANNEL_ID })),
    ] {
        let err = call(&server, tool, args.clone()).await.unwrap_err();
        assert!(matches!(err, McpServerError::ExecutionError(_)), "{}: {:?}", tool, err);
        assert!(err.to_string().contains("upstream unavailable"), "{}: {}", tool, err);

        let request = McpRequest::new(1i64, "tools/call")
            .with_params(serde_json::json!({ "name": tool, "arguments": args }));
        let response = server.handle_request(request).await;
        assert!(response.result.is_none(), "{} produced a report", tool);
        assert_eq!(response.error.unwrap().code, McpError::INTERNAL_ERROR);
    }

    assert_eq!(source.requested().len(), 10);
}

// ============================================================================
// analyze_player_activity
// ============================================================================

#[tokio::test]
async fn test_player_report() {
    let source = FakeLogSource::new(vec![
        entry(12, 3, "Logger", "player: 7 joined the server"),
        entry(12, 2, "Logger", "player: 7 spawned item weapon_pistol"),
        entry(12, 1, "Logger", "player: 8 bought a car"),
    ]);
    let server = server_with(source).await;

    let report = call(
        &server,
        "analyze_player_activity",
        serde_json::json!({ "channelId": CHANNEL_ID, "playerSearch": "player: 7" }),
    )
    .await
    .unwrap();

    assert!(report.starts_with("📊 **Player Activity Report: player: 7**"));
    assert!(report.contains("Entries Found: 2 / 3 messages scanned"));
    assert!(report.contains("- Connection Events: 1"));
    assert!(report.contains("- Item Activity: 1"));
    assert!(!report.contains("Vehicle Activity"));
    assert!(report.contains("### ⚠️ Suspicious Activity (1):"));
    assert!(report.contains("Item Spawn"));
}

#[tokio::test]
async fn test_player_without_activity() {
    let source = FakeLogSource::new(vec![entry(12, 0, "Logger", "player: 8 joined")]);
    let server = server_with(source).await;

    let report = call(
        &server,
        "analyze_player_activity",
        serde_json::json!({ "channelId": CHANNEL_ID, "playerSearch": "Bob" }),
    )
    .await
    .unwrap();

    assert_eq!(report, "No activity found for player: Bob");
}

// ============================================================================
// search_logs
// ============================================================================

#[tokio::test]
async fn test_search_invalid_regex_falls_back_to_literal() {
    let source = FakeLogSource::new(vec![
        entry(11, 2, "Logger", "kill (headshot) by player: 3"),
        entry(11, 1, "Logger", "kill by player: 4"),
    ]);
    let server = server_with(source).await;

    let report = call(
        &server,
        "search_logs",
        serde_json::json!({ "channelId": CHANNEL_ID, "query": "(" }),
    )
    .await
    .unwrap();

    assert!(report.starts_with("🔍 **Search Results for:** `(`\nFound 1 matches in 2 messages"));
    assert!(report.contains("headshot"));
}

#[tokio::test]
async fn test_search_is_deterministic() {
    let source = FakeLogSource::new(vec![
        entry(11, 2, "Logger", "Vehicle spawned: adder"),
        entry(11, 1, "Logger", "vehicle deleted"),
    ]);
    let server = server_with(source).await;
    let args = serde_json::json!({ "channelId": CHANNEL_ID, "query": "VEHICLE" });

    let first = call(&server, "search_logs", args.clone()).await.unwrap();
    let second = call(&server, "search_logs", args).await.unwrap();

    assert_eq!(first, second);
    assert!(first.contains("Found 2 matches in 2 messages"));
}

#[tokio::test]
async fn test_search_without_matches() {
    let source = FakeLogSource::new(vec![entry(11, 0, "Logger", "hello")]);
    let server = server_with(source).await;

    let report = call(
        &server,
        "search_logs",
        serde_json::json!({ "channelId": CHANNEL_ID, "query": "goodbye" }),
    )
    .await
    .unwrap();

    assert_eq!(report, "No matches found for: goodbye");
}

// ============================================================================
// get_log_stats / read_log_channel
// ============================================================================

#[tokio::test]
async fn test_stats_top_sources_and_hours() {
    let source = FakeLogSource::new(vec![
        entry(15, 30, "Anticheat", "a"),
        entry(15, 10, "Logger", "b"),
        entry(14, 50, "Anticheat", "c").via_webhook(),
    ]);
    let server = server_with(source).await;

    let report = call(&server, "get_log_stats", serde_json::json!({ "channelId": CHANNEL_ID }))
        .await
        .unwrap();

    assert!(report.starts_with("📈 **Log Channel Statistics: #server-logs**"));
    assert!(report.contains("**Messages Analyzed:** 3"));
    assert!(report.contains("**From Webhooks:** 1"));
    assert!(report.contains("- Anticheat: 2 messages\n- Logger: 1 messages"));
    assert!(report.contains("- 14:00: 1\n- 15:00: 2"));
}

#[tokio::test]
async fn test_read_transcript() {
    let source = FakeLogSource::new(vec![
        entry(9, 1, "Logger", "second"),
        entry(9, 0, "Logger", "first"),
    ]);
    let server = server_with(source).await;

    let transcript = call(&server, "read_log_channel", serde_json::json!({ "channelId": CHANNEL_ID }))
        .await
        .unwrap();

    assert!(transcript.starts_with("Retrieved 2 messages from #server-logs:"));
    assert!(transcript.find("second").unwrap() < transcript.find("first").unwrap());
}

#[tokio::test]
async fn test_read_and_stats_on_empty_channel() {
    let server = server_with(FakeLogSource::new(Vec::new())).await;
    let args = serde_json::json!({ "channelId": CHANNEL_ID });

    assert_eq!(call(&server, "read_log_channel", args.clone()).await.unwrap(), NO_MESSAGES);
    assert_eq!(call(&server, "get_log_stats", args).await.unwrap(), NO_MESSAGES);
}
