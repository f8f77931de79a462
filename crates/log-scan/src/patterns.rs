//! Cheat pattern registry
//!
//! An ordered table of regular expressions, each mapped to a human-readable
//! category. Insertion order is significant: it is the order in which rules are
//! evaluated against an entry and the order in which categories appear in a
//! report.
//!
//! All rules are compiled once, case-insensitively, when the registry is built.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

/// Pattern registry errors.
#[derive(Debug, Error)]
pub enum PatternError {
    /// A rule's expression failed to compile.
    #[error("Invalid pattern for category '{category}': {source}")]
    InvalidPattern {
        /// Category of the offending rule.
        category: String,
        /// Underlying compile error.
        #[source]
        source: regex::Error,
    },
}

/// A single scanning rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Regular expression (matched case-insensitively)
    pub regex: String,

    /// Category label used to group findings
    pub category: String,
}

impl PatternRule {
    /// Create a new rule.
    pub fn new(regex: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            category: category.into(),
        }
    }

    /// Compile the rule case-insensitively.
    pub fn compile(&self) -> Result<Regex, PatternError> {
        RegexBuilder::new(&self.regex)
            .case_insensitive(true)
            .build()
            .map_err(|source| PatternError::InvalidPattern {
                category: self.category.clone(),
                source,
            })
    }
}

/// Built-in rules for game-server (FiveM) log channels.
pub fn builtin_rules() -> Vec<PatternRule> {
    vec![
        // Movement / position
        PatternRule::new(r"(teleport|noclip|speedhack|fly\s*hack)", "Movement Exploit"),
        PatternRule::new(r"(godmode|god\s*mode|invincib)", "Godmode/Invincibility"),
        PatternRule::new(r"(aimbot|aim\s*bot|esp|wallhack)", "Aiming Exploit"),
        // Resources / money
        PatternRule::new(
            r"(money\s*hack|cash\s*exploit|duplication|dupe|[0-9]{4,}\s*(?:cash|bank))",
            "Money Exploit",
        ),
        PatternRule::new(r"(spawned\s*item|item\s*spawn|give\s*weapon)", "Item Spawn"),
        PatternRule::new(r"(vehicle\s*spawn|car\s*spawn|spawn\s*vehicle)", "Vehicle Spawn"),
        // Injection / executors
        PatternRule::new(r"(lua\s*executor|inject|cheat\s*engine|trainer)", "Cheat Injection"),
        PatternRule::new(r"(menu\s*detected|mod\s*menu|eulen|stand|kiddion)", "Mod Menu"),
        PatternRule::new(r"(resource\s*stop|resource\s*exploit)", "Resource Exploit"),
        // Anti-cheat triggers
        PatternRule::new(r"(anti.?cheat|violation|banned|kicked\s*for)", "Anti-Cheat Trigger"),
        PatternRule::new(r"(suspicious|abnormal|unusual|impossible)", "Suspicious Activity"),
        // Network
        PatternRule::new(r"(packet|desync|lag\s*switch)", "Network Manipulation"),
    ]
}

/// A rule together with its compiled expression.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: PatternRule,
    regex: Regex,
}

impl CompiledRule {
    /// The source rule.
    pub fn rule(&self) -> &PatternRule {
        &self.rule
    }

    /// Category label.
    pub fn category(&self) -> &str {
        &self.rule.category
    }

    /// First match of this rule in `content`, if any.
    pub fn find<'a>(&self, content: &'a str) -> Option<&'a str> {
        self.regex.find(content).map(|m| m.as_str())
    }

    /// Whether this rule matches anywhere in `content`.
    pub fn is_match(&self, content: &str) -> bool {
        self.regex.is_match(content)
    }
}

/// Immutable, ordered pattern registry.
///
/// Build once at startup and share by reference (`Arc<PatternRegistry>`); no
/// method takes `&mut self`.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    rules: Vec<CompiledRule>,
}

impl PatternRegistry {
    /// Build a registry from rules, preserving their order.
    pub fn new(rules: Vec<PatternRule>) -> Result<Self, PatternError> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let regex = rule.compile()?;
                Ok(CompiledRule { rule, regex })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;

        tracing::debug!(rules = rules.len(), "Pattern registry compiled");
        Ok(Self { rules })
    }

    /// Build the registry from [`builtin_rules`].
    pub fn builtin() -> Result<Self, PatternError> {
        Self::new(builtin_rules())
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Category labels in registry order.
    pub fn categories(&self) -> Vec<&str> {
        self.rules.iter().map(CompiledRule::category).collect()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the registry has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every rule matching `content`, in registry order, with its first match.
    pub fn matches<'r, 'c>(&'r self, content: &'c str) -> Vec<(&'r CompiledRule, &'c str)> {
        self.rules
            .iter()
            .filter_map(|rule| rule.find(content).map(|m| (rule, m)))
            .collect()
    }
}

const PLAYER_ID_PATTERN: &str = r"(?:player|id|source|src)[:\s#]*([0-9]+)|\[([0-9]+)\]|(?:license|steam|discord|fivem)[:\s]*([a-zA-Z0-9:]+)";

static PLAYER_ID: OnceLock<Option<Regex>> = OnceLock::new();

fn player_id_regex() -> Option<&'static Regex> {
    PLAYER_ID
        .get_or_init(|| {
            RegexBuilder::new(PLAYER_ID_PATTERN)
                .case_insensitive(true)
                .build()
                .map_err(|e| tracing::error!("Player id pattern failed to compile: {}", e))
                .ok()
        })
        .as_ref()
}

/// Extract a player identifier from flattened content.
///
/// Takes the leftmost match of the combined pattern and returns its first
/// participating capture group: a labeled numeric id (`player: 7`), a bracketed
/// number (`[42]`), or a labeled external id (`license:abc123`). Returns an
/// empty string when nothing matches.
pub fn extract_player_id(content: &str) -> String {
    player_id_regex()
        .and_then(|re| re.captures(content))
        .and_then(|caps| {
            caps.iter()
                .skip(1)
                .flatten()
                .next()
                .map(|m| m.as_str().to_string())
        })
        .unwrap_or_default()
}
