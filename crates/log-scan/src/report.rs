//! Report rendering
//!
//! Turns scan results into the markdown-flavored text returned to MCP callers.
//! The "nothing found" responses are fixed strings that automated callers match
//! on; each one is distinct from [`NO_MESSAGES`].

use crate::entry::{Channel, LogEntry};
use crate::scanner::{CheatScan, LogStats, PlayerActivity, SearchHit};
use crate::text::{format_timestamp, MINUTE_FORMAT};
use std::fmt::Write;

/// Response when the channel returned no entries at all.
pub const NO_MESSAGES: &str = "No messages found in channel";

/// Render a plain transcript of `entries`.
pub fn render_transcript(channel: &Channel, entries: &[LogEntry]) -> String {
    if entries.is_empty() {
        return NO_MESSAGES.to_string();
    }

    let mut out = format!(
        "Retrieved {} messages from #{}:\n\n",
        entries.len(),
        channel.name
    );

    for entry in entries {
        let _ = write!(out, "**[{}]** {}", format_timestamp(&entry.timestamp), entry.author);
        if !entry.raw_text.is_empty() {
            let _ = write!(out, ": {}", entry.raw_text);
        }

        for embed in &entry.embeds {
            if let Some(ref title) = embed.title {
                let _ = write!(out, "\n  📋 **{}**", title);
            }
            if let Some(ref description) = embed.description {
                let _ = write!(out, "\n  {}", description.replace('\n', "\n  "));
            }
            for field in &embed.fields {
                let _ = write!(out, "\n  • {}: {}", field.name, field.value);
            }
        }
        out.push_str("\n---\n");
    }

    out
}

/// Render a pattern sweep.
pub fn render_cheat_report(channel: &Channel, scanned: usize, scan: &CheatScan) -> String {
    if scan.is_empty() {
        return format!(
            "✅ **No suspicious patterns detected** in {} messages from #{}",
            scanned, channel.name
        );
    }

    let mut out = format!(
        "⚠️ **Suspicious Activity Report** - #{}\nScanned: {} messages\n\n",
        channel.name, scanned
    );

    for group in &scan.groups {
        let _ = writeln!(out, "### 🚨 {} ({} hits)", group.category, group.findings.len());
        for finding in &group.findings {
            let _ = write!(out, "- **{}**", format_timestamp(&finding.timestamp));
            if !finding.player_id.is_empty() {
                let _ = write!(out, " | Player: `{}`", finding.player_id);
            }
            let _ = writeln!(out, "\n  Match: `{}`", finding.matched_text);
            let _ = writeln!(out, "  Context: {}", finding.context);
            let _ = writeln!(out, "  [Jump to message]({})", finding.permalink);
        }
        out.push('\n');
    }

    let _ = write!(out, "---\n**Total Findings: {}**", scan.total());
    out
}

/// Render a player activity report.
pub fn render_player_report(
    channel: &Channel,
    player: &str,
    scanned: usize,
    activity: &PlayerActivity,
) -> String {
    if activity.is_empty() {
        return format!("No activity found for player: {}", player);
    }

    let mut out = format!(
        "📊 **Player Activity Report: {}**\nChannel: #{}\nEntries Found: {} / {} messages scanned\n\n",
        player, channel.name, activity.matched, scanned
    );

    if !activity.breakdown.is_empty() {
        out.push_str("### Activity Breakdown:\n");
        for (label, count) in &activity.breakdown {
            let _ = writeln!(out, "- {}: {}", label, count);
        }
        out.push('\n');
    }

    if activity.suspicious.is_empty() {
        out.push_str("✅ **No suspicious patterns detected for this player**\n");
    } else {
        let _ = writeln!(out, "### ⚠️ Suspicious Activity ({}):", activity.suspicious.len());
        for line in &activity.suspicious {
            let _ = writeln!(
                out,
                "- [{}] {}: {}",
                format_timestamp(&line.timestamp),
                line.category,
                line.snippet
            );
        }
    }

    out.push_str("\n### Recent Log Entries:\n");
    for line in &activity.recent {
        let _ = writeln!(out, "- [{}] {}", format_timestamp(&line.timestamp), line.snippet);
    }

    out
}

/// Render free-text search results.
pub fn render_search_results(query: &str, scanned: usize, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No matches found for: {}", query);
    }

    let mut out = format!(
        "🔍 **Search Results for:** `{}`\nFound {} matches in {} messages\n\n",
        query,
        hits.len(),
        scanned
    );

    for hit in hits {
        let _ = writeln!(out, "**[{}]**", format_timestamp(&hit.timestamp));
        let _ = writeln!(out, "{}", hit.context);
        let _ = writeln!(out, "[Jump]({})\n---", hit.permalink);
    }

    out
}

/// Render channel statistics.
pub fn render_stats(channel: &Channel, stats: &LogStats) -> String {
    if stats.analyzed == 0 {
        return NO_MESSAGES.to_string();
    }

    let mut out = format!("📈 **Log Channel Statistics: #{}**\n\n", channel.name);
    let _ = writeln!(out, "**Messages Analyzed:** {}", stats.analyzed);
    let _ = writeln!(out, "**With Embeds:** {}", stats.with_embeds);
    let _ = writeln!(out, "**From Webhooks:** {}", stats.from_webhooks);

    if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
        let _ = writeln!(
            out,
            "**Time Range:** {} to {}",
            oldest.format(MINUTE_FORMAT),
            newest.format(MINUTE_FORMAT)
        );
    }

    out.push_str("\n### Top Sources:\n");
    for (author, count) in stats.top_sources() {
        let _ = writeln!(out, "- {}: {} messages", author, count);
    }

    out.push_str("\n### Activity by Hour:\n");
    for (hour, count) in &stats.hours {
        let _ = writeln!(out, "- {}: {}", hour, count);
    }

    out
}
