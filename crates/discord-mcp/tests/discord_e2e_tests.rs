//! End-to-End tests for the Discord-backed MCP tools.
//!
//! These tests verify that the tools issue the expected Discord REST calls and
//! render the expected text. We use wiremock to stand in for the Discord API.
//!
//! Covered flows:
//! 1. Client plumbing: bot authorization, status mapping, JSON error bodies
//! 2. Log tools against a real `DiscordClient` log source
//! 3. Moderation: kick, ban, unban
//! 4. Roles: list with member counts
//! 5. Threads: create, list
//! 6. Embeds: send, edit
//! 7. Voice: create, move, mute, disconnect, list
//! 8. Permissions: presets, lock, overwrite listing, category sync
//! 9. Interactive: button rows, disabling and removing components

use discord_mcp::clients::config::ServiceEndpoint;
use discord_mcp::{
    all_tools, DiscordClient, DiscordError, DiscordHandle, McpError, McpRequest, McpServer,
    McpServerError, ToolContext,
};
use log_scan::{LogSource, PatternRegistry, SourceError};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const GUILD_ID: &str = "1";
const TOKEN: &str = "test-token";

/// Test fixture providing a mock Discord API and a fully wired server.
struct TestFixture {
    /// Mock Discord API.
    discord: MockServer,
    /// Client pointed at the mock.
    client: Arc<DiscordClient>,
    /// MCP server with every tool registered.
    server: McpServer,
}

impl TestFixture {
    /// Create a fixture whose default guild is [`GUILD_ID`].
    async fn new() -> Self {
        Self::with_default_guild(Some(GUILD_ID.to_string())).await
    }

    async fn with_default_guild(default_guild_id: Option<String>) -> Self {
        let discord = MockServer::start().await;

        let endpoint = ServiceEndpoint {
            base_url: discord.uri(),
            api_key: Some(TOKEN.to_string()),
        };
        let client = Arc::new(DiscordClient::new(endpoint, Duration::from_secs(5)).unwrap());
        let registry = Arc::new(PatternRegistry::builtin().unwrap());

        let server = McpServer::discord();
        server
            .register_tools(all_tools(
                client.clone(),
                registry,
                DiscordHandle::new(client.clone(), default_guild_id),
            ))
            .await;

        Self {
            discord,
            client,
            server,
        }
    }

    /// Call a tool and return its text.
    async fn call(&self, tool: &str, args: serde_json::Value) -> Result<String, McpServerError> {
        self.server
            .call_tool(tool, args, &ToolContext::new())
            .await
            .map(|result| result.as_text())
    }

    /// Mount `GET /guilds/1`.
    async fn mount_guild(&self) {
        Mock::given(method("GET"))
            .and(path(format!("/guilds/{}", GUILD_ID)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": GUILD_ID, "name": "Los Santos RP"})),
            )
            .mount(&self.discord)
            .await;
    }

    /// Mount `GET /channels/{id}` for a guild text channel.
    async fn mount_text_channel(&self, id: &str, name: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/channels/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": id,
                "type": 0,
                "name": name,
                "guild_id": GUILD_ID
            })))
            .mount(&self.discord)
            .await;
    }

    /// Requests received with the given method and path.
    async fn requests(&self, http_method: &str, request_path: &str) -> Vec<Request> {
        self.discord
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.method.to_string() == http_method && r.url.path() == request_path)
            .collect()
    }
}

fn message(id: &str, channel_id: &str, content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "channel_id": channel_id,
        "content": content,
        "author": {"id": "900", "username": "txAdmin", "bot": true},
        "timestamp": "2024-03-09T14:05:00.000000+00:00",
        "embeds": []
    })
}

fn member(id: &str, username: &str, nick: Option<&str>, roles: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "user": {"id": id, "username": username},
        "nick": nick,
        "roles": roles,
        "joined_at": "2023-01-01T00:00:00+00:00"
    })
}

fn body(request: &Request) -> serde_json::Value {
    serde_json::from_slice(&request.body).unwrap()
}

// ============================================================================
// Client plumbing
// ============================================================================

#[tokio::test]
async fn test_client_sends_bot_authorization() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/channels/10"))
        .and(header("Authorization", "Bot test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "10", "type": 0, "name": "general", "guild_id": GUILD_ID
        })))
        .expect(1)
        .mount(&fixture.discord)
        .await;

    let channel = fixture.client.get_channel("10").await.unwrap();
    assert_eq!(channel.name(), "general");
    assert!(channel.is_text());
}

#[tokio::test]
async fn test_client_maps_statuses() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/channels/401"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&fixture.discord)
        .await;
    Mock::given(method("GET"))
        .and(path("/channels/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&fixture.discord)
        .await;
    Mock::given(method("GET"))
        .and(path("/channels/403"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "message": "Missing Access", "code": 50001
        })))
        .mount(&fixture.discord)
        .await;

    assert!(matches!(
        fixture.client.get_channel("401").await,
        Err(DiscordError::AuthenticationFailed)
    ));
    assert!(matches!(
        fixture.client.get_channel("404").await,
        Err(DiscordError::ChannelNotFound(id)) if id == "404"
    ));
    match fixture.client.get_channel("403").await {
        Err(DiscordError::ApiError { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "Missing Access (code 50001)");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_list_members_follows_pages() {
    let fixture = TestFixture::new().await;

    let first_page: Vec<serde_json::Value> = (1..=1000)
        .map(|i| member(&i.to_string(), &format!("user{}", i), None, &[]))
        .collect();

    Mock::given(method("GET"))
        .and(path("/guilds/1/members"))
        .and(query_param("after", "0"))
        .and(query_param("limit", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first_page))
        .expect(1)
        .mount(&fixture.discord)
        .await;
    Mock::given(method("GET"))
        .and(path("/guilds/1/members"))
        .and(query_param("after", "1000"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([member("1001", "late", None, &[])])),
        )
        .expect(1)
        .mount(&fixture.discord)
        .await;

    let members = fixture.client.list_members(GUILD_ID).await.unwrap();
    assert_eq!(members.len(), 1001);
    assert_eq!(members[1000].username(), "late");
}

// ============================================================================
// Log tools over the Discord log source
// ============================================================================

#[tokio::test]
async fn test_log_source_resolves_text_and_thread_channels_only() {
    let fixture = TestFixture::new().await;

    fixture.mount_text_channel("100", "server-logs").await;
    Mock::given(method("GET"))
        .and(path("/channels/200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "200", "type": 2, "name": "Voice", "guild_id": GUILD_ID
        })))
        .mount(&fixture.discord)
        .await;

    let channel = fixture.client.resolve_channel("100").await.unwrap();
    assert_eq!(channel.name, "server-logs");
    assert_eq!(channel.guild_id.as_deref(), Some(GUILD_ID));

    let voice = fixture.client.resolve_channel("200").await;
    assert!(matches!(voice, Err(SourceError::NotFound(m)) if m == "Channel not found by channelId"));
}

#[tokio::test]
async fn test_scan_for_cheats_over_discord() {
    let fixture = TestFixture::new().await;

    fixture.mount_text_channel("100", "server-logs").await;
    Mock::given(method("GET"))
        .and(path("/channels/100/messages"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            message("502", "100", "player: 7 used noclip"),
            message("501", "100", "Server restarted")
        ])))
        .expect(1)
        .mount(&fixture.discord)
        .await;

    let report = fixture
        .call("scan_for_cheats", serde_json::json!({ "channelId": "100" }))
        .await
        .unwrap();

    assert!(report.contains("Scanned: 2 messages"));
    assert!(report.contains("### 🚨 Movement Exploit (1 hits)"));
    assert!(report.contains("[Jump to message](https://discord.com/channels/1/100/502)"));
}

#[tokio::test]
async fn test_unknown_log_channel_is_invalid_params() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/channels/999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&fixture.discord)
        .await;

    let request = McpRequest::new(3i64, "tools/call").with_params(serde_json::json!({
        "name": "read_log_channel",
        "arguments": { "channelId": "999" }
    }));
    let response = fixture.server.handle_request(request).await;

    let error = response.error.unwrap();
    assert_eq!(error.code, McpError::INVALID_PARAMS);
}

#[tokio::test]
async fn test_hidden_log_channel_is_not_found() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/channels/403"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "message": "Missing Access", "code": 50001
        })))
        .mount(&fixture.discord)
        .await;

    let resolved = fixture.client.resolve_channel("403").await;
    assert!(matches!(resolved, Err(SourceError::NotFound(m)) if m == "Channel not found by channelId"));

    let request = McpRequest::new(4i64, "tools/call").with_params(serde_json::json!({
        "name": "scan_for_cheats",
        "arguments": { "channelId": "403" }
    }));
    let response = fixture.server.handle_request(request).await;

    let error = response.error.unwrap();
    assert_eq!(error.code, McpError::INVALID_PARAMS);
    assert!(error.message.contains("Channel not found by channelId"));
    assert!(fixture.requests("GET", "/channels/403/messages").await.is_empty());
}

// ============================================================================
// Moderation
// ============================================================================

#[tokio::test]
async fn test_kick_member_with_reason() {
    let fixture = TestFixture::new().await;
    fixture.mount_guild().await;

    Mock::given(method("GET"))
        .and(path("/guilds/1/members/42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(member("42", "griefer", Some("Griefer"), &[])),
        )
        .mount(&fixture.discord)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/guilds/1/members/42"))
        .and(header("X-Audit-Log-Reason", "spam%20bot"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fixture.discord)
        .await;

    let result = fixture
        .call("kick_member", serde_json::json!({ "userId": "42", "reason": "spam bot" }))
        .await
        .unwrap();

    assert_eq!(result, "Kicked Griefer from the server. Reason: spam bot");
}

#[tokio::test]
async fn test_ban_member_who_already_left() {
    let fixture = TestFixture::new().await;
    fixture.mount_guild().await;

    Mock::given(method("GET"))
        .and(path("/guilds/1/members/42"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&fixture.discord)
        .await;
    Mock::given(method("PUT"))
        .and(path("/guilds/1/bans/42"))
        .and(body_json(serde_json::json!({ "delete_message_seconds": 172800 })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fixture.discord)
        .await;

    let result = fixture
        .call("ban_member", serde_json::json!({ "userId": "42", "deleteMessages": 2 }))
        .await
        .unwrap();

    assert_eq!(result, "Banned User 42 from the server");
}

#[tokio::test]
async fn test_unban_in_explicit_guild() {
    let fixture = TestFixture::with_default_guild(None).await;
    fixture.mount_guild().await;

    Mock::given(method("DELETE"))
        .and(path("/guilds/1/bans/42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fixture.discord)
        .await;

    let result = fixture
        .call("unban_member", serde_json::json!({ "guildId": GUILD_ID, "userId": "42" }))
        .await
        .unwrap();

    assert_eq!(result, "Unbanned user 42 from the server");
}

#[tokio::test]
async fn test_missing_guild_rejected_without_requests() {
    let fixture = TestFixture::with_default_guild(None).await;

    let err = fixture
        .call("kick_member", serde_json::json!({ "userId": "42" }))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid parameters: guildId cannot be null");
    assert!(fixture.discord.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_unknown_guild_is_not_found() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/guilds/77"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&fixture.discord)
        .await;

    let err = fixture
        .call("list_bans", serde_json::json!({ "guildId": "77" }))
        .await
        .unwrap_err();

    assert!(matches!(err, McpServerError::NotFound(_)));
    assert!(err.to_string().contains("Discord server not found by guildId: 77"));
}

#[tokio::test]
async fn test_missing_permissions_is_execution_error() {
    let fixture = TestFixture::new().await;
    fixture.mount_guild().await;

    Mock::given(method("GET"))
        .and(path("/guilds/1/bans"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "message": "Missing Permissions", "code": 50013
        })))
        .mount(&fixture.discord)
        .await;

    let err = fixture.call("list_bans", serde_json::json!({})).await.unwrap_err();

    assert!(matches!(err, McpServerError::ExecutionError(_)));
    assert_eq!(err.to_rpc_error().code, McpError::INTERNAL_ERROR);
    assert!(err.to_string().contains("Missing Permissions (code 50013)"));
}

// ============================================================================
// Roles
// ============================================================================

#[tokio::test]
async fn test_list_roles_with_member_counts() {
    let fixture = TestFixture::new().await;
    fixture.mount_guild().await;

    Mock::given(method("GET"))
        .and(path("/guilds/1/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": GUILD_ID, "name": "@everyone", "position": 0},
            {"id": "r2", "name": "Mod", "position": 1},
            {"id": "r1", "name": "Admin", "color": 16711680, "position": 2}
        ])))
        .mount(&fixture.discord)
        .await;
    Mock::given(method("GET"))
        .and(path("/guilds/1/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            member("42", "alice", None, &["r1"]),
            member("43", "bob", None, &[])
        ])))
        .mount(&fixture.discord)
        .await;

    let result = fixture.call("list_roles", serde_json::json!({})).await.unwrap();

    assert_eq!(
        result,
        "Retrieved 3 roles:\n\
         - Admin (ID: r1) [Members: 1, Color: #FF0000]\n\
         - Mod (ID: r2) [Members: 0, Color: none]\n\
         - @everyone (ID: 1) [Members: 2, Color: none]"
    );
}

// ============================================================================
// Threads
// ============================================================================

#[tokio::test]
async fn test_create_thread_with_first_message() {
    let fixture = TestFixture::new().await;
    fixture.mount_text_channel("10", "general").await;

    Mock::given(method("POST"))
        .and(path("/channels/10/threads"))
        .and(body_json(serde_json::json!({ "name": "Raid planning", "type": 11 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "20", "type": 11, "name": "Raid planning", "guild_id": GUILD_ID, "parent_id": "10"
        })))
        .expect(1)
        .mount(&fixture.discord)
        .await;
    Mock::given(method("POST"))
        .and(path("/channels/20/messages"))
        .and(body_json(serde_json::json!({ "content": "Kickoff at 8" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(message("30", "20", "Kickoff at 8")))
        .expect(1)
        .mount(&fixture.discord)
        .await;

    let result = fixture
        .call(
            "create_thread",
            serde_json::json!({ "channelId": "10", "name": "Raid planning", "message": "Kickoff at 8" }),
        )
        .await
        .unwrap();

    assert_eq!(result, "Created thread: Raid planning (ID: 20) in #general");
}

#[tokio::test]
async fn test_list_threads_names_parents() {
    let fixture = TestFixture::new().await;
    fixture.mount_guild().await;

    Mock::given(method("GET"))
        .and(path("/guilds/1/threads/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "threads": [{
                "id": "20",
                "type": 11,
                "name": "Raid",
                "parent_id": "10",
                "thread_metadata": {"archived": false, "locked": true}
            }]
        })))
        .mount(&fixture.discord)
        .await;
    Mock::given(method("GET"))
        .and(path("/guilds/1/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "10", "type": 0, "name": "general"}
        ])))
        .mount(&fixture.discord)
        .await;

    let result = fixture.call("list_threads", serde_json::json!({})).await.unwrap();

    assert_eq!(
        result,
        "Retrieved 1 active threads:\n- Raid (ID: 20) in #general [Active, Locked]"
    );
}

// ============================================================================
// Embeds
// ============================================================================

#[tokio::test]
async fn test_send_embed() {
    let fixture = TestFixture::new().await;
    fixture.mount_text_channel("10", "announcements").await;

    Mock::given(method("POST"))
        .and(path("/channels/10/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message("55", "10", "")))
        .expect(1)
        .mount(&fixture.discord)
        .await;

    let result = fixture
        .call(
            "send_embed",
            serde_json::json!({
                "channelId": "10",
                "title": "Restart",
                "description": "Server restarts in 5 minutes",
                "colorHex": "#FF5733"
            }),
        )
        .await
        .unwrap();

    assert_eq!(
        result,
        "Embed sent successfully. Message link: https://discord.com/channels/1/10/55"
    );

    let sent = fixture.requests("POST", "/channels/10/messages").await;
    let embed = &body(&sent[0])["embeds"][0];
    assert_eq!(embed["title"], "Restart");
    assert_eq!(embed["color"], 0xFF5733);
}

#[tokio::test]
async fn test_send_empty_embed_rejected() {
    let fixture = TestFixture::new().await;

    let err = fixture
        .call("send_embed", serde_json::json!({ "channelId": "10", "colorHex": "#00FF00" }))
        .await
        .unwrap_err();

    assert!(matches!(err, McpServerError::InvalidParams(_)));
    assert!(fixture.discord.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_edit_embed_clears_description() {
    let fixture = TestFixture::new().await;
    fixture.mount_text_channel("10", "announcements").await;

    let mut original = message("55", "10", "");
    original["embeds"] = serde_json::json!([{ "title": "Old", "description": "Keep?", "color": 255 }]);

    Mock::given(method("GET"))
        .and(path("/channels/10/messages/55"))
        .respond_with(ResponseTemplate::new(200).set_body_json(original.clone()))
        .mount(&fixture.discord)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/channels/10/messages/55"))
        .respond_with(ResponseTemplate::new(200).set_body_json(original))
        .expect(1)
        .mount(&fixture.discord)
        .await;

    let result = fixture
        .call(
            "edit_embed",
            serde_json::json!({ "channelId": "10", "messageId": "55", "title": "New", "description": "" }),
        )
        .await
        .unwrap();

    assert_eq!(
        result,
        "Embed edited successfully. Message link: https://discord.com/channels/1/10/55"
    );

    let edits = fixture.requests("PATCH", "/channels/10/messages/55").await;
    let embed = &body(&edits[0])["embeds"][0];
    assert_eq!(embed["title"], "New");
    assert!(embed.get("description").is_none());
    assert_eq!(embed["color"], 255);
}

#[tokio::test]
async fn test_edit_message_without_embed() {
    let fixture = TestFixture::new().await;
    fixture.mount_text_channel("10", "announcements").await;

    Mock::given(method("GET"))
        .and(path("/channels/10/messages/55"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message("55", "10", "plain text")))
        .mount(&fixture.discord)
        .await;

    let err = fixture
        .call("edit_embed", serde_json::json!({ "channelId": "10", "messageId": "55", "title": "x" }))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid parameters: Message does not contain an embed");
}

// ============================================================================
// Voice
// ============================================================================

async fn mount_member(fixture: &TestFixture, id: &str, username: &str, nick: Option<&str>) {
    Mock::given(method("GET"))
        .and(path(format!("/guilds/{}/members/{}", GUILD_ID, id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(member(id, username, nick, &[])))
        .mount(&fixture.discord)
        .await;
}

#[tokio::test]
async fn test_create_voice_channel_clamps_limits() {
    let fixture = TestFixture::new().await;
    fixture.mount_guild().await;

    Mock::given(method("GET"))
        .and(path("/channels/30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "30", "type": 4, "name": "Patrol", "guild_id": GUILD_ID
        })))
        .mount(&fixture.discord)
        .await;
    Mock::given(method("POST"))
        .and(path("/guilds/1/channels"))
        .and(body_json(serde_json::json!({
            "name": "Unit 1",
            "type": 2,
            "parent_id": "30",
            "user_limit": 99,
            "bitrate": 384000
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "31", "type": 2, "name": "Unit 1", "guild_id": GUILD_ID, "parent_id": "30"
        })))
        .expect(1)
        .mount(&fixture.discord)
        .await;

    let result = fixture
        .call(
            "create_voice_channel",
            serde_json::json!({
                "name": "Unit 1",
                "categoryId": "30",
                "userLimit": 150,
                "bitrate": 500
            }),
        )
        .await
        .unwrap();

    assert_eq!(result, "Created voice channel: Unit 1 (ID: 31) in category: Patrol");
}

#[tokio::test]
async fn test_voice_state_changes() {
    let fixture = TestFixture::new().await;
    fixture.mount_guild().await;
    mount_member(&fixture, "42", "griefer", Some("Griefer")).await;

    Mock::given(method("GET"))
        .and(path("/channels/20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "20", "type": 2, "name": "Interrogation", "guild_id": GUILD_ID
        })))
        .mount(&fixture.discord)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/guilds/1/members/42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(member("42", "griefer", Some("Griefer"), &[])),
        )
        .expect(4)
        .mount(&fixture.discord)
        .await;

    let moved = fixture
        .call("move_member", serde_json::json!({ "userId": "42", "channelId": "20" }))
        .await
        .unwrap();
    assert_eq!(moved, "Moved Griefer to Interrogation");

    let unmuted = fixture
        .call("server_mute_member", serde_json::json!({ "userId": "42", "mute": false }))
        .await
        .unwrap();
    assert_eq!(unmuted, "Server unmuted Griefer");

    let deafened = fixture
        .call("server_deafen_member", serde_json::json!({ "userId": "42", "deafen": true }))
        .await
        .unwrap();
    assert_eq!(deafened, "Server deafened Griefer");

    let disconnected = fixture
        .call("disconnect_member", serde_json::json!({ "userId": "42" }))
        .await
        .unwrap();
    assert_eq!(disconnected, "Disconnected Griefer from voice");

    let bodies: Vec<serde_json::Value> = fixture
        .requests("PATCH", "/guilds/1/members/42")
        .await
        .iter()
        .map(body)
        .collect();
    assert_eq!(
        bodies,
        vec![
            serde_json::json!({ "channel_id": "20" }),
            serde_json::json!({ "mute": false }),
            serde_json::json!({ "deaf": true }),
            serde_json::json!({ "channel_id": null }),
        ]
    );
}

#[tokio::test]
async fn test_move_member_to_text_channel_is_not_found() {
    let fixture = TestFixture::new().await;
    fixture.mount_guild().await;
    mount_member(&fixture, "42", "griefer", None).await;
    fixture.mount_text_channel("10", "general").await;

    let err = fixture
        .call("move_member", serde_json::json!({ "userId": "42", "channelId": "10" }))
        .await
        .unwrap_err();

    assert!(matches!(err, McpServerError::NotFound(_)));
    assert!(err.to_string().contains("Voice channel not found by channelId: 10"));
    assert!(fixture.requests("PATCH", "/guilds/1/members/42").await.is_empty());
}

#[tokio::test]
async fn test_mute_requires_flag() {
    let fixture = TestFixture::new().await;

    let err = fixture
        .call("server_mute_member", serde_json::json!({ "userId": "42" }))
        .await
        .unwrap_err();

    assert!(matches!(err, McpServerError::InvalidParams(ref m) if m == "mute cannot be null"));
    assert!(fixture.discord.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_list_voice_channels_by_position() {
    let fixture = TestFixture::new().await;
    fixture.mount_guild().await;

    Mock::given(method("GET"))
        .and(path("/guilds/1/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "10", "type": 0, "name": "general", "guild_id": GUILD_ID, "position": 0},
            {"id": "21", "type": 2, "name": "Dispatch", "guild_id": GUILD_ID, "position": 2,
             "bitrate": 96000, "user_limit": 4},
            {"id": "20", "type": 2, "name": "Lobby", "guild_id": GUILD_ID, "position": 1,
             "bitrate": 64000, "user_limit": 0}
        ])))
        .mount(&fixture.discord)
        .await;

    let result = fixture.call("list_voice_channels", serde_json::json!({})).await.unwrap();

    assert_eq!(
        result,
        "Retrieved 2 voice channels:\n\
         - Lobby (ID: 20) [Limit: ∞, Bitrate: 64kbps]\n\
         - Dispatch (ID: 21) [Limit: 4, Bitrate: 96kbps]"
    );
}

// ============================================================================
// Permissions
// ============================================================================

async fn mount_roles(fixture: &TestFixture) {
    Mock::given(method("GET"))
        .and(path("/guilds/1/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": GUILD_ID, "name": "@everyone"},
            {"id": "5", "name": "Staff", "color": 0}
        ])))
        .mount(&fixture.discord)
        .await;
}

async fn mount_channel_with_overwrites(fixture: &TestFixture, overwrites: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/channels/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "10",
            "type": 0,
            "name": "general",
            "guild_id": GUILD_ID,
            "permission_overwrites": overwrites
        })))
        .mount(&fixture.discord)
        .await;
}

#[tokio::test]
async fn test_set_channel_permissions_with_preset() {
    let fixture = TestFixture::new().await;
    fixture.mount_text_channel("10", "general").await;
    mount_roles(&fixture).await;

    Mock::given(method("PUT"))
        .and(path("/channels/10/permissions/5"))
        .and(body_json(serde_json::json!({
            "allow": "257024",
            "deny": "4096",
            "type": 0
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fixture.discord)
        .await;

    let result = fixture
        .call(
            "set_channel_permissions",
            serde_json::json!({
                "channelId": "10",
                "roleId": "5",
                "preset": "staff_text",
                "deny": "MESSAGE_TTS,FLY"
            }),
        )
        .await
        .unwrap();

    assert_eq!(
        result,
        "Set permissions for role Staff in #general\n\
         Allowed: View Channel, Send Messages, Manage Messages, Embed Links, Attach Files, Read History, Mention Everyone\n\
         Denied: Send TTS Messages\n\
         Ignored: FLY"
    );
}

#[tokio::test]
async fn test_unknown_preset_rejected_before_writing() {
    let fixture = TestFixture::new().await;
    fixture.mount_text_channel("10", "general").await;
    mount_roles(&fixture).await;

    let err = fixture
        .call(
            "set_channel_permissions",
            serde_json::json!({ "channelId": "10", "roleId": "5", "preset": "admin" }),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, McpServerError::InvalidParams(_)));
    assert!(err.to_string().contains("Unknown preset: admin"));
    assert!(fixture.requests("PUT", "/channels/10/permissions/5").await.is_empty());
}

#[tokio::test]
async fn test_lock_and_unlock_channel() {
    let fixture = TestFixture::new().await;
    // @everyone may currently send (2048) and read history (65536).
    mount_channel_with_overwrites(
        &fixture,
        serde_json::json!([{"id": GUILD_ID, "type": 0, "allow": "67584", "deny": "0"}]),
    )
    .await;

    Mock::given(method("PUT"))
        .and(path("/channels/10/permissions/1"))
        .and(header("X-Audit-Log-Reason", "raid%20in%20progress"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fixture.discord)
        .await;
    Mock::given(method("PUT"))
        .and(path("/channels/10/permissions/1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&fixture.discord)
        .await;

    let locked = fixture
        .call(
            "lock_channel",
            serde_json::json!({ "channelId": "10", "reason": "raid in progress" }),
        )
        .await
        .unwrap();
    assert_eq!(locked, "🔒 Locked #general - raid in progress");

    let unlocked = fixture
        .call("unlock_channel", serde_json::json!({ "channelId": "10" }))
        .await
        .unwrap();
    assert_eq!(unlocked, "🔓 Unlocked #general");

    let bodies: Vec<serde_json::Value> = fixture
        .requests("PUT", "/channels/10/permissions/1")
        .await
        .iter()
        .map(body)
        .collect();
    assert_eq!(bodies[0], serde_json::json!({ "allow": "65536", "deny": "2112", "type": 0 }));
    assert_eq!(bodies[1], serde_json::json!({ "allow": "65536", "deny": "0", "type": 0 }));
}

#[tokio::test]
async fn test_get_channel_permissions() {
    let fixture = TestFixture::new().await;
    mount_channel_with_overwrites(
        &fixture,
        serde_json::json!([
            {"id": "5", "type": 0, "allow": "1024", "deny": "2048"},
            {"id": "42", "type": 1, "allow": "0", "deny": "1024"}
        ]),
    )
    .await;
    mount_roles(&fixture).await;
    mount_member(&fixture, "42", "griefer", Some("Griefer")).await;

    let result = fixture
        .call("get_channel_permissions", serde_json::json!({ "channelId": "10" }))
        .await
        .unwrap();

    assert_eq!(
        result,
        "**Permission Overrides for #general:**\n\n\
         **Role: Staff**\n  ✅ Allowed: View Channel\n  ❌ Denied: Send Messages\n\n\
         **Member: Griefer**\n  ❌ Denied: View Channel\n\n"
    );
}

#[tokio::test]
async fn test_clear_role_permissions_without_overwrite() {
    let fixture = TestFixture::new().await;
    mount_channel_with_overwrites(&fixture, serde_json::json!([])).await;
    mount_roles(&fixture).await;

    let result = fixture
        .call(
            "clear_role_permissions",
            serde_json::json!({ "channelId": "10", "roleId": "5" }),
        )
        .await
        .unwrap();

    assert_eq!(result, "No permission overrides found for role Staff in #general");
    assert!(fixture.requests("DELETE", "/channels/10/permissions/5").await.is_empty());
}

#[tokio::test]
async fn test_sync_copies_category_overwrites() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/channels/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "10", "type": 0, "name": "reports", "guild_id": GUILD_ID, "parent_id": "30",
            "permission_overwrites": [{"id": "5", "type": 0, "allow": "1024", "deny": "0"}]
        })))
        .mount(&fixture.discord)
        .await;
    Mock::given(method("GET"))
        .and(path("/channels/30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "30", "type": 4, "name": "Staff Area", "guild_id": GUILD_ID,
            "permission_overwrites": [{"id": GUILD_ID, "type": 0, "allow": "0", "deny": "1024"}]
        })))
        .mount(&fixture.discord)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/channels/10"))
        .and(body_json(serde_json::json!({
            "permission_overwrites": [{"id": GUILD_ID, "type": 0, "allow": "0", "deny": "1024"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "10", "type": 0, "name": "reports", "guild_id": GUILD_ID
        })))
        .expect(1)
        .mount(&fixture.discord)
        .await;

    let result = fixture
        .call("sync_channel_permissions", serde_json::json!({ "channelId": "10" }))
        .await
        .unwrap();

    assert_eq!(result, "Synced #reports permissions with category: Staff Area");
}

#[tokio::test]
async fn test_sync_without_category_rejected() {
    let fixture = TestFixture::new().await;
    fixture.mount_text_channel("10", "general").await;

    let err = fixture
        .call("sync_channel_permissions", serde_json::json!({ "channelId": "10" }))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        McpServerError::InvalidParams(ref m) if m == "Channel has no parent category to sync with"
    ));
}

// ============================================================================
// Interactive components
// ============================================================================

#[tokio::test]
async fn test_send_buttons_in_rows_of_five() {
    let fixture = TestFixture::new().await;
    fixture.mount_text_channel("10", "applications").await;

    Mock::given(method("POST"))
        .and(path("/channels/10/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message("60", "10", "")))
        .expect(1)
        .mount(&fixture.discord)
        .await;

    let result = fixture
        .call(
            "send_buttons",
            serde_json::json!({
                "channelId": "10",
                "buttons": "A|a|primary;B|b|green;C|c|red;D|d;E|e|grey;F|f|blurple;Rules|https://example.com/rules|link"
            }),
        )
        .await
        .unwrap();

    assert_eq!(
        result,
        "Message with 6 buttons sent. Message link: https://discord.com/channels/1/10/60"
    );

    let sent = body(&fixture.requests("POST", "/channels/10/messages").await[0]);
    assert_eq!(sent["content"], "\u{200B}");
    let rows = sent["components"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["type"], 1);
    assert_eq!(rows[0]["components"].as_array().unwrap().len(), 5);
    assert_eq!(rows[0]["components"][0]["custom_id"], "a");
    assert_eq!(rows[0]["components"][0]["style"], 1);
    assert_eq!(
        rows[1]["components"][0],
        serde_json::json!({
            "type": 2, "style": 5, "label": "Rules", "url": "https://example.com/rules"
        })
    );
}

#[tokio::test]
async fn test_send_buttons_without_valid_entries_rejected() {
    let fixture = TestFixture::new().await;
    fixture.mount_text_channel("10", "applications").await;

    let err = fixture
        .call(
            "send_buttons",
            serde_json::json!({ "channelId": "10", "buttons": "Apply|apply" }),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, McpServerError::InvalidParams(ref m) if m == "No valid buttons provided"));
    assert!(fixture.requests("POST", "/channels/10/messages").await.is_empty());
}

#[tokio::test]
async fn test_disable_buttons_keeps_layout() {
    let fixture = TestFixture::new().await;
    fixture.mount_text_channel("10", "applications").await;

    let mut panel = message("60", "10", "Apply here");
    panel["components"] = serde_json::json!([{
        "type": 1,
        "components": [
            {"type": 2, "style": 1, "label": "Apply", "custom_id": "apply"},
            {"type": 2, "style": 5, "label": "Rules", "url": "https://example.com/rules"}
        ]
    }]);
    Mock::given(method("GET"))
        .and(path("/channels/10/messages/60"))
        .respond_with(ResponseTemplate::new(200).set_body_json(panel))
        .mount(&fixture.discord)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/channels/10/messages/60"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message("60", "10", "Apply here")))
        .expect(2)
        .mount(&fixture.discord)
        .await;

    let disabled = fixture
        .call("disable_buttons", serde_json::json!({ "channelId": "10", "messageId": "60" }))
        .await
        .unwrap();
    assert_eq!(
        disabled,
        "Buttons disabled on message. Message link: https://discord.com/channels/1/10/60"
    );

    let removed = fixture
        .call("remove_components", serde_json::json!({ "channelId": "10", "messageId": "60" }))
        .await
        .unwrap();
    assert_eq!(
        removed,
        "Components removed from message. Message link: https://discord.com/channels/1/10/60"
    );

    let edits = fixture.requests("PATCH", "/channels/10/messages/60").await;
    assert_eq!(
        body(&edits[0]),
        serde_json::json!({
            "components": [{
                "type": 1,
                "components": [
                    {"type": 2, "style": 1, "label": "Apply", "custom_id": "apply", "disabled": true},
                    {"type": 2, "style": 5, "label": "Rules", "url": "https://example.com/rules", "disabled": true}
                ]
            }]
        })
    );
    assert_eq!(body(&edits[1]), serde_json::json!({ "components": [] }));
}

#[tokio::test]
async fn test_send_ticket_panel_defaults() {
    let fixture = TestFixture::new().await;
    fixture.mount_text_channel("10", "support").await;

    Mock::given(method("POST"))
        .and(path("/channels/10/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message("61", "10", "")))
        .mount(&fixture.discord)
        .await;

    let result = fixture
        .call("send_ticket_panel", serde_json::json!({ "channelId": "10" }))
        .await
        .unwrap();
    assert!(result.starts_with("Ticket panel sent. Message link: https://discord.com/channels/1/10/61"));
    assert!(result.ends_with("to process ticket button clicks."));

    let sent = body(&fixture.requests("POST", "/channels/10/messages").await[0]);
    assert_eq!(sent["embeds"][0]["title"], "🎫 Support Tickets");
    assert_eq!(sent["embeds"][0]["color"], 0x2ECC71);
    assert_eq!(sent["embeds"][0]["footer"]["text"], "Support Team");
    assert_eq!(sent["components"][0]["components"][0]["custom_id"], "ticket_create");
}
