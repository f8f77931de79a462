//! Content flattening
//!
//! Pattern scanning, player search and free-text search all run against the same
//! single-string view of an entry: its raw text followed by every embed's title,
//! description and `name value` field pairs, space separated.

use crate::entry::LogEntry;

/// Flatten an entry into one searchable string.
pub fn flatten(entry: &LogEntry) -> String {
    let mut content = entry.raw_text.clone();

    for embed in &entry.embeds {
        if let Some(ref title) = embed.title {
            content.push(' ');
            content.push_str(title);
        }
        if let Some(ref description) = embed.description {
            content.push(' ');
            content.push_str(description);
        }
        for field in &embed.fields {
            content.push(' ');
            content.push_str(&field.name);
            content.push(' ');
            content.push_str(&field.value);
        }
    }

    content
}
