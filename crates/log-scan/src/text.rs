//! Text helpers shared by the scanner and report renderer.

use chrono::{DateTime, Utc};

/// Timestamp layout used in every report line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Shorter layout used for the statistics time range.
pub const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Collapse newlines, trim, and cut to at most `max_chars` characters.
///
/// Text longer than the limit keeps its first `max_chars - 3` characters followed
/// by `...`. Counting is by `char`, so multi-byte text is never split mid code point.
pub fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.replace('\n', " ");
    let text = text.trim();

    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Format a timestamp for report lines.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}
