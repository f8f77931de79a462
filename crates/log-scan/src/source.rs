//! Message fetching seam
//!
//! The scanner never talks to the chat platform directly. Anything that can
//! resolve a channel by ID and hand back its most recent messages implements
//! [`LogSource`]: the Discord REST client in production, an in-memory fake in
//! tests.

use crate::entry::{Channel, LogEntry};
use async_trait::async_trait;
use thiserror::Error;

/// Smallest number of entries a scan may request.
pub const MIN_LIMIT: i64 = 1;

/// Largest number of entries a scan may request (one history page).
pub const MAX_LIMIT: i64 = 100;

/// Log source errors.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Channel could not be resolved
    #[error("{0}")]
    NotFound(String),

    /// Remote call failed
    #[error("Failed to fetch messages: {0}")]
    Remote(String),
}

/// Result type for log source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Capability to resolve a log channel and fetch its recent entries.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Resolve a channel by ID.
    async fn resolve_channel(&self, channel_id: &str) -> SourceResult<Channel>;

    /// Fetch up to `limit` of the most recent entries, newest first.
    async fn fetch_recent(&self, channel: &Channel, limit: usize) -> SourceResult<Vec<LogEntry>>;
}

/// Clamp a caller-supplied limit into `[MIN_LIMIT, MAX_LIMIT]`, using `default`
/// when none was given. Limits are never rejected.
pub fn clamp_limit(limit: Option<i64>, default: usize) -> usize {
    limit.map_or(default, |l| l.clamp(MIN_LIMIT, MAX_LIMIT) as usize)
}
