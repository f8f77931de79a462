//! # Log Scan
//!
//! Pattern scanning, search, and statistics over messages fetched from a chat
//! log channel (typically a FiveM / game-server log feed relayed into Discord).
//!
//! ## Overview
//!
//! The log-scan crate handles:
//! - **Patterns**: An ordered, immutable registry of cheat-keyword rules
//! - **Flattening**: One searchable string per entry, embed text included
//! - **Scanning**: Cheat sweeps, free-text search, player activity, statistics
//! - **Reports**: Text rendering of every scan result
//! - **Sources**: The [`LogSource`] seam that supplies entries
//!
//! ## Pipeline
//!
//! ```text
//! channel id + limit
//!     → LogSource::resolve_channel / fetch_recent
//!     → flatten
//!     → scan_for_cheats | search | analyze_player | collect_stats
//!     → render_*
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use chrono::Utc;
//! use log_scan::{render_cheat_report, scan_for_cheats, Channel, LogEntry, PatternRegistry};
//!
//! let registry = PatternRegistry::builtin().unwrap();
//! let entries = vec![
//!     LogEntry::new(Utc::now(), "txAdmin", "noclip detected", "https://discord.com/channels/1/2/3"),
//!     LogEntry::new(Utc::now(), "txAdmin", "hello", "https://discord.com/channels/1/2/4"),
//! ];
//!
//! let scan = scan_for_cheats(&registry, &entries);
//! assert_eq!(scan.total(), 1);
//!
//! let report = render_cheat_report(&Channel::new("2", "logs"), entries.len(), &scan);
//! assert!(report.contains("Movement Exploit"));
//! ```

pub mod entry;
pub mod flatten;
pub mod patterns;
pub mod report;
pub mod scanner;
pub mod source;
pub mod text;

// Re-export main types
pub use entry::{Channel, Embed, EmbedField, LogEntry};
pub use flatten::flatten;
pub use patterns::{builtin_rules, extract_player_id, PatternError, PatternRegistry, PatternRule};
pub use report::{
    render_cheat_report, render_player_report, render_search_results, render_stats,
    render_transcript, NO_MESSAGES,
};
pub use scanner::{
    analyze_player, collect_stats, scan_for_cheats, search, CheatScan, Finding, LogStats,
    PlayerActivity, QueryMatcher, SearchHit,
};
pub use source::{clamp_limit, LogSource, SourceError, SourceResult};
pub use text::truncate;
