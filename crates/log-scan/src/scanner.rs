//! Scanning over fetched log entries
//!
//! Every function here is a pure pass over a slice of entries in fetch order
//! (newest first). Nothing is cached between calls: findings, counters and maps
//! are rebuilt from scratch on every invocation.

use crate::entry::LogEntry;
use crate::flatten::flatten;
use crate::patterns::{extract_player_id, PatternRegistry};
use crate::text::truncate;
use chrono::{DateTime, Timelike, Utc};
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;

/// Maximum context length recorded on a finding.
pub const FINDING_CONTEXT_CHARS: usize = 150;

/// Maximum context length of a search hit.
pub const SEARCH_CONTEXT_CHARS: usize = 200;

/// Maximum snippet length in player activity reports.
pub const PLAYER_SNIPPET_CHARS: usize = 100;

/// Number of entries shown in a player activity preview.
pub const PLAYER_PREVIEW_ENTRIES: usize = 5;

/// Number of authors rendered under "Top Sources".
pub const TOP_SOURCES: usize = 10;

/// One recorded pattern match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub timestamp: DateTime<Utc>,
    pub permalink: String,
    /// Extracted player identifier, empty when none was found
    pub player_id: String,
    /// First matched text for the rule
    pub matched_text: String,
    /// Truncated, single-line context
    pub context: String,
}

/// Findings for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFindings {
    pub category: String,
    pub findings: Vec<Finding>,
}

/// Result of a pattern sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheatScan {
    /// Non-empty categories in registry order
    pub groups: Vec<CategoryFindings>,
}

impl CheatScan {
    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of findings across categories.
    pub fn total(&self) -> usize {
        self.groups.iter().map(|g| g.findings.len()).sum()
    }

    /// Findings for `category`, if any were recorded.
    pub fn category(&self, category: &str) -> Option<&[Finding]> {
        self.groups
            .iter()
            .find(|g| g.category == category)
            .map(|g| g.findings.as_slice())
    }
}

/// Sweep entries against the registry.
///
/// Each rule contributes at most one finding per entry (its first match). An
/// entry that matches several rules appears under each of their categories.
pub fn scan_for_cheats(registry: &PatternRegistry, entries: &[LogEntry]) -> CheatScan {
    let mut grouped: IndexMap<&str, Vec<Finding>> = registry
        .categories()
        .into_iter()
        .map(|category| (category, Vec::new()))
        .collect();

    for entry in entries {
        let content = flatten(entry);
        let matches = registry.matches(&content);
        if matches.is_empty() {
            continue;
        }

        let player_id = extract_player_id(&content);
        let context = truncate(&content, FINDING_CONTEXT_CHARS);

        for (rule, matched) in matches {
            if let Some(bucket) = grouped.get_mut(rule.category()) {
                bucket.push(Finding {
                    timestamp: entry.timestamp,
                    permalink: entry.permalink.clone(),
                    player_id: player_id.clone(),
                    matched_text: matched.to_string(),
                    context: context.clone(),
                });
            }
        }
    }

    let groups = grouped
        .into_iter()
        .filter(|(_, findings)| !findings.is_empty())
        .map(|(category, findings)| CategoryFindings {
            category: category.to_string(),
            findings,
        })
        .collect();

    CheatScan { groups }
}

/// Case-insensitive matcher for user-supplied queries.
#[derive(Debug, Clone)]
pub enum QueryMatcher {
    /// The query compiled as a regular expression.
    Pattern(Regex),
    /// The query escaped and matched literally.
    Literal(Regex),
    /// Lowercased substring match, used only if even the escaped form cannot compile.
    Substring(String),
}

impl QueryMatcher {
    /// Compile `query` as a regex, falling back to a literal match when the
    /// syntax is invalid. Never fails.
    pub fn new(query: &str) -> Self {
        match RegexBuilder::new(query).case_insensitive(true).build() {
            Ok(regex) => Self::Pattern(regex),
            Err(e) => {
                tracing::debug!(query, error = %e, "Query is not a valid regex, matching literally");
                Self::literal(query)
            }
        }
    }

    /// Match `query` literally, ignoring case.
    pub fn literal(query: &str) -> Self {
        match RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
        {
            Ok(regex) => Self::Literal(regex),
            Err(_) => Self::Substring(query.to_lowercase()),
        }
    }

    /// Whether the query matches anywhere in `content`.
    pub fn is_match(&self, content: &str) -> bool {
        match self {
            Self::Pattern(regex) | Self::Literal(regex) => regex.is_match(content),
            Self::Substring(needle) => content.to_lowercase().contains(needle.as_str()),
        }
    }

    /// Whether the literal fallback is in use.
    pub fn is_literal(&self) -> bool {
        !matches!(self, Self::Pattern(_))
    }
}

/// One entry matched by a free-text search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub timestamp: DateTime<Utc>,
    pub context: String,
    pub permalink: String,
}

/// Entries whose flattened content matches `query`, in fetch order.
pub fn search(entries: &[LogEntry], query: &str) -> Vec<SearchHit> {
    let matcher = QueryMatcher::new(query);

    entries
        .iter()
        .filter_map(|entry| {
            let content = flatten(entry);
            matcher.is_match(&content).then(|| SearchHit {
                timestamp: entry.timestamp,
                context: truncate(&content, SEARCH_CONTEXT_CHARS),
                permalink: entry.permalink.clone(),
            })
        })
        .collect()
}

/// Fixed activity categories and the lowercase keywords that count toward them.
const ACTIVITY_CATEGORIES: [(&str, &[&str]); 5] = [
    ("Kills/Deaths", &["kill", "death"]),
    ("Money Transactions", &["money", "cash", "bank"]),
    ("Item Activity", &["item", "inventory"]),
    ("Connection Events", &["join", "leave", "connect"]),
    ("Vehicle Activity", &["vehicle", "car"]),
];

/// A suspicious line in a player report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspiciousLine {
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub snippet: String,
}

/// A preview line in a player report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewLine {
    pub timestamp: DateTime<Utc>,
    pub snippet: String,
}

/// Activity summary for one player search token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerActivity {
    /// Number of entries mentioning the player
    pub matched: usize,
    /// Activity counters in order of first increment
    pub breakdown: IndexMap<&'static str, usize>,
    /// Registry hits among the player's entries, flat
    pub suspicious: Vec<SuspiciousLine>,
    /// First few matching entries
    pub recent: Vec<PreviewLine>,
}

impl PlayerActivity {
    /// Whether no entry mentioned the player.
    pub fn is_empty(&self) -> bool {
        self.matched == 0
    }
}

/// Summarize the entries that mention `player` (literal, case-insensitive).
pub fn analyze_player(
    registry: &PatternRegistry,
    entries: &[LogEntry],
    player: &str,
) -> PlayerActivity {
    let matcher = QueryMatcher::literal(player);
    let mut activity = PlayerActivity::default();

    for entry in entries {
        let content = flatten(entry);
        if !matcher.is_match(&content) {
            continue;
        }
        activity.matched += 1;

        let lowered = content.to_lowercase();
        for (label, keywords) in ACTIVITY_CATEGORIES {
            if keywords.iter().any(|k| lowered.contains(k)) {
                *activity.breakdown.entry(label).or_insert(0) += 1;
            }
        }

        for (rule, _) in registry.matches(&content) {
            activity.suspicious.push(SuspiciousLine {
                timestamp: entry.timestamp,
                category: rule.category().to_string(),
                snippet: truncate(&content, PLAYER_SNIPPET_CHARS),
            });
        }

        if activity.recent.len() < PLAYER_PREVIEW_ENTRIES {
            activity.recent.push(PreviewLine {
                timestamp: entry.timestamp,
                snippet: truncate(&content, PLAYER_SNIPPET_CHARS),
            });
        }
    }

    activity
}

/// Channel activity statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogStats {
    /// Entries analyzed
    pub analyzed: usize,
    /// Entries carrying at least one embed
    pub with_embeds: usize,
    /// Entries posted by webhooks
    pub from_webhooks: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
    /// Every author with its count, descending; ties keep first-appearance order
    pub authors: Vec<(String, usize)>,
    /// Counts keyed by `HH:00`, ascending
    pub hours: BTreeMap<String, usize>,
}

impl LogStats {
    /// The authors rendered under "Top Sources".
    pub fn top_sources(&self) -> &[(String, usize)] {
        &self.authors[..self.authors.len().min(TOP_SOURCES)]
    }
}

/// Gather statistics in a single pass.
pub fn collect_stats(entries: &[LogEntry]) -> LogStats {
    let mut authors: IndexMap<&str, usize> = IndexMap::new();
    let mut stats = LogStats {
        analyzed: entries.len(),
        ..LogStats::default()
    };

    for entry in entries {
        *authors.entry(entry.author.as_str()).or_insert(0) += 1;

        let hour = format!("{:02}:00", entry.timestamp.hour());
        *stats.hours.entry(hour).or_insert(0) += 1;

        if entry.has_embeds() {
            stats.with_embeds += 1;
        }
        if entry.from_webhook {
            stats.from_webhooks += 1;
        }

        stats.oldest = Some(stats.oldest.map_or(entry.timestamp, |t| t.min(entry.timestamp)));
        stats.newest = Some(stats.newest.map_or(entry.timestamp, |t| t.max(entry.timestamp)));
    }

    let mut authors: Vec<(String, usize)> = authors
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    // Stable: equal counts keep first-appearance order.
    authors.sort_by(|a, b| b.1.cmp(&a.1));
    stats.authors = authors;

    stats
}
