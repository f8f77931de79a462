//! Discord REST client.
//!
//! Thin wrapper over the Discord v10 REST API covering the channel, message,
//! member, ban, role, thread, voice, and permission endpoints used by the
//! tools. Every call is a single request; nothing is retried or cached.

use super::config::ServiceEndpoint;
use super::models::{
    ActiveThreads, ApiBan, ApiChannel, ApiGuild, ApiMember, ApiMessage, ApiOverwrite, ApiRole,
    ChannelPayload, MemberPayload, MessagePayload, RolePayload,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log_scan::{Channel, LogEntry, LogSource, SourceError, SourceResult};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

/// Largest page the member list endpoint returns.
const MEMBER_PAGE_SIZE: usize = 1000;

/// Header carrying the audit log reason of a moderation action.
const AUDIT_LOG_REASON: &str = "X-Audit-Log-Reason";

/// Discord client errors.
#[derive(Debug, Error)]
pub enum DiscordError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("Discord API error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Discord server not found by guildId: {0}")]
    GuildNotFound(String),

    #[error("Channel not found by channelId: {0}")]
    ChannelNotFound(String),

    #[error("Message not found by messageId: {0}")]
    MessageNotFound(String),

    #[error("Member not found by userId: {0}")]
    MemberNotFound(String),

    #[error("Role not found by roleId: {0}")]
    RoleNotFound(String),

    #[error("Thread not found by threadId: {0}")]
    ThreadNotFound(String),

    #[error("Voice channel not found by channelId: {0}")]
    VoiceChannelNotFound(String),

    #[error("Category not found by categoryId: {0}")]
    CategoryNotFound(String),

    #[error("User is not banned: {0}")]
    BanNotFound(String),

    /// Authentication failed.
    #[error("Authentication failed")]
    AuthenticationFailed,
}

impl DiscordError {
    /// Whether the error means the addressed entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::GuildNotFound(_)
                | Self::ChannelNotFound(_)
                | Self::MessageNotFound(_)
                | Self::MemberNotFound(_)
                | Self::RoleNotFound(_)
                | Self::ThreadNotFound(_)
                | Self::VoiceChannelNotFound(_)
                | Self::CategoryNotFound(_)
                | Self::BanNotFound(_)
        )
    }
}

/// Discord REST API client.
#[derive(Clone)]
pub struct DiscordClient {
    /// HTTP client instance.
    client: Client,

    /// API endpoint and bot token.
    endpoint: ServiceEndpoint,
}

impl DiscordClient {
    /// Create a new Discord client.
    pub fn new(endpoint: ServiceEndpoint, timeout: Duration) -> Result<Self, DiscordError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("discord-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, endpoint })
    }

    /// Start an authorized request.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.endpoint.url(path);
        let mut request = self.client.request(method, &url);

        if let Some(ref token) = self.endpoint.api_key {
            request = request.header("Authorization", format!("Bot {}", token));
        }

        request
    }

    // ---------------------------------------------------------------------
    // Channels and messages
    // ---------------------------------------------------------------------

    /// Get a channel or thread.
    #[instrument(skip(self))]
    pub async fn get_channel(&self, channel_id: &str) -> Result<ApiChannel, DiscordError> {
        debug!("Fetching channel {}", channel_id);

        let response = self
            .request(Method::GET, &format!("/channels/{}", channel_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::ChannelNotFound(channel_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// Get up to `limit` of the most recent messages, newest first.
    #[instrument(skip(self))]
    pub async fn get_messages(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<ApiMessage>, DiscordError> {
        debug!("Fetching {} messages from channel {}", limit, channel_id);

        let response = self
            .request(Method::GET, &format!("/channels/{}/messages", channel_id))
            .query(&[("limit", limit)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::ChannelNotFound(channel_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// Get a single message.
    #[instrument(skip(self))]
    pub async fn get_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<ApiMessage, DiscordError> {
        let response = self
            .request(
                Method::GET,
                &format!("/channels/{}/messages/{}", channel_id, message_id),
            )
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::MessageNotFound(message_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// Post a message.
    #[instrument(skip(self, payload))]
    pub async fn send_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<ApiMessage, DiscordError> {
        debug!("Sending message to channel {}", channel_id);

        let response = self
            .request(Method::POST, &format!("/channels/{}/messages", channel_id))
            .json(payload)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::ChannelNotFound(channel_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// Replace the content or embeds of a message.
    #[instrument(skip(self, payload))]
    pub async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: &MessagePayload,
    ) -> Result<ApiMessage, DiscordError> {
        let response = self
            .request(
                Method::PATCH,
                &format!("/channels/{}/messages/{}", channel_id, message_id),
            )
            .json(payload)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::MessageNotFound(message_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// Delete a channel or thread.
    #[instrument(skip(self))]
    pub async fn delete_channel(&self, channel_id: &str) -> Result<(), DiscordError> {
        let response = self
            .request(Method::DELETE, &format!("/channels/{}", channel_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::ChannelNotFound(channel_id.to_string()));
        }

        self.handle_empty(response).await
    }

    /// Replace every permission overwrite of a channel.
    #[instrument(skip(self, overwrites))]
    pub async fn replace_overwrites(
        &self,
        channel_id: &str,
        overwrites: &[ApiOverwrite],
    ) -> Result<ApiChannel, DiscordError> {
        let response = self
            .request(Method::PATCH, &format!("/channels/{}", channel_id))
            .json(&json!({ "permission_overwrites": overwrites }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::ChannelNotFound(channel_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// Create or replace one permission overwrite.
    #[instrument(skip(self, overwrite), fields(overwrite_id = %overwrite.id))]
    pub async fn edit_channel_permission(
        &self,
        channel_id: &str,
        overwrite: &ApiOverwrite,
        reason: Option<&str>,
    ) -> Result<(), DiscordError> {
        let mut request = self
            .request(
                Method::PUT,
                &format!("/channels/{}/permissions/{}", channel_id, overwrite.id),
            )
            .json(&json!({
                "allow": overwrite.allow,
                "deny": overwrite.deny,
                "type": overwrite.kind
            }));

        if let Some(reason) = reason {
            request = request.header(AUDIT_LOG_REASON, encode_reason(reason));
        }

        let response = request.send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::ChannelNotFound(channel_id.to_string()));
        }

        self.handle_empty(response).await
    }

    /// Delete one permission overwrite.
    #[instrument(skip(self))]
    pub async fn delete_channel_permission(
        &self,
        channel_id: &str,
        overwrite_id: &str,
    ) -> Result<(), DiscordError> {
        let response = self
            .request(
                Method::DELETE,
                &format!("/channels/{}/permissions/{}", channel_id, overwrite_id),
            )
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::ChannelNotFound(channel_id.to_string()));
        }

        self.handle_empty(response).await
    }

    /// Get a voice channel, rejecting every other channel type.
    pub async fn get_voice_channel(&self, channel_id: &str) -> Result<ApiChannel, DiscordError> {
        match self.get_channel(channel_id).await {
            Ok(channel) if channel.is_voice() => Ok(channel),
            Ok(_) | Err(DiscordError::ChannelNotFound(_)) => {
                Err(DiscordError::VoiceChannelNotFound(channel_id.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Get a category, rejecting every other channel type.
    pub async fn get_category(&self, category_id: &str) -> Result<ApiChannel, DiscordError> {
        match self.get_channel(category_id).await {
            Ok(channel) if channel.is_category() => Ok(channel),
            Ok(_) | Err(DiscordError::ChannelNotFound(_)) => {
                Err(DiscordError::CategoryNotFound(category_id.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    // ---------------------------------------------------------------------
    // Guilds and members
    // ---------------------------------------------------------------------

    /// Get a guild.
    #[instrument(skip(self))]
    pub async fn get_guild(&self, guild_id: &str) -> Result<ApiGuild, DiscordError> {
        let response = self
            .request(Method::GET, &format!("/guilds/{}", guild_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::GuildNotFound(guild_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// List the channels of a guild (threads excluded).
    #[instrument(skip(self))]
    pub async fn list_guild_channels(&self, guild_id: &str) -> Result<Vec<ApiChannel>, DiscordError> {
        let response = self
            .request(Method::GET, &format!("/guilds/{}/channels", guild_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::GuildNotFound(guild_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// Create a channel in a guild.
    #[instrument(skip(self, payload), fields(channel_name = %payload.name))]
    pub async fn create_channel(
        &self,
        guild_id: &str,
        payload: &ChannelPayload,
    ) -> Result<ApiChannel, DiscordError> {
        let response = self
            .request(Method::POST, &format!("/guilds/{}/channels", guild_id))
            .json(payload)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::GuildNotFound(guild_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// Get a guild member.
    #[instrument(skip(self))]
    pub async fn get_member(&self, guild_id: &str, user_id: &str) -> Result<ApiMember, DiscordError> {
        let response = self
            .request(Method::GET, &format!("/guilds/{}/members/{}", guild_id, user_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::MemberNotFound(user_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// List every member of a guild, following pagination.
    #[instrument(skip(self))]
    pub async fn list_members(&self, guild_id: &str) -> Result<Vec<ApiMember>, DiscordError> {
        let mut members: Vec<ApiMember> = Vec::new();
        let mut after = String::from("0");

        loop {
            let response = self
                .request(Method::GET, &format!("/guilds/{}/members", guild_id))
                .query(&[("limit", MEMBER_PAGE_SIZE.to_string()), ("after", after.clone())])
                .send()
                .await?;

            if response.status() == StatusCode::NOT_FOUND {
                return Err(DiscordError::GuildNotFound(guild_id.to_string()));
            }

            let page: Vec<ApiMember> = self.handle_response(response).await?;
            let full_page = page.len() == MEMBER_PAGE_SIZE;
            members.extend(page);

            match members.last().map(|m| m.id().to_string()) {
                Some(last) if full_page && !last.is_empty() => after = last,
                _ => break,
            }
        }

        debug!("Listed {} members of guild {}", members.len(), guild_id);
        Ok(members)
    }

    /// Remove a member from a guild.
    #[instrument(skip(self))]
    pub async fn kick_member(
        &self,
        guild_id: &str,
        user_id: &str,
        reason: &str,
    ) -> Result<(), DiscordError> {
        let response = self
            .request(Method::DELETE, &format!("/guilds/{}/members/{}", guild_id, user_id))
            .header(AUDIT_LOG_REASON, encode_reason(reason))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::MemberNotFound(user_id.to_string()));
        }

        self.handle_empty(response).await
    }

    /// Set or clear a member's timeout.
    #[instrument(skip(self))]
    pub async fn set_timeout(
        &self,
        guild_id: &str,
        user_id: &str,
        until: Option<DateTime<Utc>>,
        reason: Option<&str>,
    ) -> Result<ApiMember, DiscordError> {
        let mut request = self
            .request(Method::PATCH, &format!("/guilds/{}/members/{}", guild_id, user_id))
            .json(&json!({ "communication_disabled_until": until }));

        if let Some(reason) = reason {
            request = request.header(AUDIT_LOG_REASON, encode_reason(reason));
        }

        let response = request.send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::MemberNotFound(user_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// Move, disconnect, mute, or deafen a member in voice.
    #[instrument(skip(self, payload))]
    pub async fn modify_member(
        &self,
        guild_id: &str,
        user_id: &str,
        payload: &MemberPayload,
    ) -> Result<ApiMember, DiscordError> {
        let response = self
            .request(Method::PATCH, &format!("/guilds/{}/members/{}", guild_id, user_id))
            .json(payload)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::MemberNotFound(user_id.to_string()));
        }

        self.handle_response(response).await
    }

    // ---------------------------------------------------------------------
    // Bans
    // ---------------------------------------------------------------------

    /// Ban a user, deleting `delete_message_seconds` of their history.
    #[instrument(skip(self))]
    pub async fn ban_member(
        &self,
        guild_id: &str,
        user_id: &str,
        delete_message_seconds: u32,
        reason: &str,
    ) -> Result<(), DiscordError> {
        let response = self
            .request(Method::PUT, &format!("/guilds/{}/bans/{}", guild_id, user_id))
            .header(AUDIT_LOG_REASON, encode_reason(reason))
            .json(&json!({ "delete_message_seconds": delete_message_seconds }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::GuildNotFound(guild_id.to_string()));
        }

        self.handle_empty(response).await
    }

    /// Lift a ban.
    #[instrument(skip(self))]
    pub async fn unban_member(&self, guild_id: &str, user_id: &str) -> Result<(), DiscordError> {
        let response = self
            .request(Method::DELETE, &format!("/guilds/{}/bans/{}", guild_id, user_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::BanNotFound(user_id.to_string()));
        }

        self.handle_empty(response).await
    }

    /// List banned users.
    #[instrument(skip(self))]
    pub async fn list_bans(&self, guild_id: &str) -> Result<Vec<ApiBan>, DiscordError> {
        let response = self
            .request(Method::GET, &format!("/guilds/{}/bans", guild_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::GuildNotFound(guild_id.to_string()));
        }

        self.handle_response(response).await
    }

    // ---------------------------------------------------------------------
    // Roles
    // ---------------------------------------------------------------------

    /// List the roles of a guild.
    #[instrument(skip(self))]
    pub async fn list_roles(&self, guild_id: &str) -> Result<Vec<ApiRole>, DiscordError> {
        let response = self
            .request(Method::GET, &format!("/guilds/{}/roles", guild_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::GuildNotFound(guild_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// Look up a single role.
    pub async fn get_role(&self, guild_id: &str, role_id: &str) -> Result<ApiRole, DiscordError> {
        self.list_roles(guild_id)
            .await?
            .into_iter()
            .find(|role| role.id == role_id)
            .ok_or_else(|| DiscordError::RoleNotFound(role_id.to_string()))
    }

    /// Create a role.
    #[instrument(skip(self, payload))]
    pub async fn create_role(
        &self,
        guild_id: &str,
        payload: &RolePayload,
    ) -> Result<ApiRole, DiscordError> {
        let response = self
            .request(Method::POST, &format!("/guilds/{}/roles", guild_id))
            .json(payload)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::GuildNotFound(guild_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// Modify a role. Unset payload fields are left unchanged.
    #[instrument(skip(self, payload))]
    pub async fn modify_role(
        &self,
        guild_id: &str,
        role_id: &str,
        payload: &RolePayload,
    ) -> Result<ApiRole, DiscordError> {
        let response = self
            .request(Method::PATCH, &format!("/guilds/{}/roles/{}", guild_id, role_id))
            .json(payload)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::RoleNotFound(role_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// Delete a role.
    #[instrument(skip(self))]
    pub async fn delete_role(&self, guild_id: &str, role_id: &str) -> Result<(), DiscordError> {
        let response = self
            .request(Method::DELETE, &format!("/guilds/{}/roles/{}", guild_id, role_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::RoleNotFound(role_id.to_string()));
        }

        self.handle_empty(response).await
    }

    /// Grant a role to a member.
    #[instrument(skip(self))]
    pub async fn add_member_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), DiscordError> {
        let response = self
            .request(
                Method::PUT,
                &format!("/guilds/{}/members/{}/roles/{}", guild_id, user_id, role_id),
            )
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::MemberNotFound(user_id.to_string()));
        }

        self.handle_empty(response).await
    }

    /// Take a role away from a member.
    #[instrument(skip(self))]
    pub async fn remove_member_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), DiscordError> {
        let response = self
            .request(
                Method::DELETE,
                &format!("/guilds/{}/members/{}/roles/{}", guild_id, user_id, role_id),
            )
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::MemberNotFound(user_id.to_string()));
        }

        self.handle_empty(response).await
    }

    // ---------------------------------------------------------------------
    // Threads
    // ---------------------------------------------------------------------

    /// Start a thread that is not attached to a message.
    #[instrument(skip(self))]
    pub async fn create_thread(
        &self,
        channel_id: &str,
        name: &str,
        kind: u8,
    ) -> Result<ApiChannel, DiscordError> {
        let response = self
            .request(Method::POST, &format!("/channels/{}/threads", channel_id))
            .json(&json!({ "name": name, "type": kind }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::ChannelNotFound(channel_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// Start a thread from an existing message.
    #[instrument(skip(self))]
    pub async fn create_thread_from_message(
        &self,
        channel_id: &str,
        message_id: &str,
        name: &str,
    ) -> Result<ApiChannel, DiscordError> {
        let response = self
            .request(
                Method::POST,
                &format!("/channels/{}/messages/{}/threads", channel_id, message_id),
            )
            .json(&json!({ "name": name }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::MessageNotFound(message_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// Get a thread, rejecting channels that are not threads.
    pub async fn get_thread(&self, thread_id: &str) -> Result<ApiChannel, DiscordError> {
        match self.get_channel(thread_id).await {
            Ok(channel) if channel.is_thread() => Ok(channel),
            Ok(_) | Err(DiscordError::ChannelNotFound(_)) => {
                Err(DiscordError::ThreadNotFound(thread_id.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Change the archived and locked flags of a thread.
    #[instrument(skip(self))]
    pub async fn modify_thread(
        &self,
        thread_id: &str,
        archived: bool,
        locked: Option<bool>,
    ) -> Result<ApiChannel, DiscordError> {
        let mut body = json!({ "archived": archived });
        if let Some(locked) = locked {
            body["locked"] = json!(locked);
        }

        let response = self
            .request(Method::PATCH, &format!("/channels/{}", thread_id))
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::ThreadNotFound(thread_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// List the active threads of a guild.
    #[instrument(skip(self))]
    pub async fn list_active_threads(&self, guild_id: &str) -> Result<Vec<ApiChannel>, DiscordError> {
        let response = self
            .request(Method::GET, &format!("/guilds/{}/threads/active", guild_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::GuildNotFound(guild_id.to_string()));
        }

        let active: ActiveThreads = self.handle_response(response).await?;
        Ok(active.threads)
    }

    /// Add a user to a thread.
    #[instrument(skip(self))]
    pub async fn add_thread_member(&self, thread_id: &str, user_id: &str) -> Result<(), DiscordError> {
        let response = self
            .request(
                Method::PUT,
                &format!("/channels/{}/thread-members/{}", thread_id, user_id),
            )
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::ThreadNotFound(thread_id.to_string()));
        }

        self.handle_empty(response).await
    }

    /// Remove a user from a thread.
    #[instrument(skip(self))]
    pub async fn remove_thread_member(
        &self,
        thread_id: &str,
        user_id: &str,
    ) -> Result<(), DiscordError> {
        let response = self
            .request(
                Method::DELETE,
                &format!("/channels/{}/thread-members/{}", thread_id, user_id),
            )
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscordError::ThreadNotFound(thread_id.to_string()));
        }

        self.handle_empty(response).await
    }

    // ---------------------------------------------------------------------
    // Response handling
    // ---------------------------------------------------------------------

    /// Handle API response and parse JSON.
    async fn handle_response<T>(&self, response: reqwest::Response) -> Result<T, DiscordError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self.check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| DiscordError::InvalidResponse(e.to_string()))
    }

    /// Handle a response whose body is ignored (usually 204).
    async fn handle_empty(&self, response: reqwest::Response) -> Result<(), DiscordError> {
        self.check_status(response).await.map(|_| ())
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, DiscordError> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            error!("Discord authentication failed");
            return Err(DiscordError::AuthenticationFailed);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            let message = api_error_message(&body);
            warn!("Discord API error ({}): {}", status.as_u16(), message);
            return Err(DiscordError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

/// Extract `message (code N)` from a Discord error body, or return the raw body.
fn api_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
        #[serde(default)]
        code: u64,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => format!("{} (code {})", parsed.message, parsed.code),
        Err(_) => body.to_string(),
    }
}

/// Percent-encode an audit log reason for use as a header value.
fn encode_reason(reason: &str) -> String {
    urlencoding::encode(reason).into_owned()
}

#[async_trait]
impl LogSource for DiscordClient {
    async fn resolve_channel(&self, channel_id: &str) -> SourceResult<Channel> {
        match self.get_channel(channel_id).await {
            Ok(channel) if channel.is_text() || channel.is_thread() => {
                let mut resolved = Channel::new(channel.id.clone(), channel.name());
                resolved.guild_id = channel.guild_id;
                Ok(resolved)
            }
            // A channel the bot cannot see is as absent as a missing one.
            Ok(_)
            | Err(DiscordError::ChannelNotFound(_))
            | Err(DiscordError::ApiError { status: 403, .. }) => Err(SourceError::NotFound(
                "Channel not found by channelId".to_string(),
            )),
            Err(e) => Err(SourceError::Remote(e.to_string())),
        }
    }

    async fn fetch_recent(&self, channel: &Channel, limit: usize) -> SourceResult<Vec<LogEntry>> {
        let messages = self
            .get_messages(&channel.id, limit)
            .await
            .map_err(|e| SourceError::Remote(e.to_string()))?;

        let guild_id = channel.guild_id.as_deref();
        Ok(messages
            .into_iter()
            .map(|message| message.into_log_entry(guild_id))
            .collect())
    }
}
