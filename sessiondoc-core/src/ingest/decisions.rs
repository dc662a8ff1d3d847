//! Decision statement extraction
//!
//! Narrative text is split into statements on `.`, `!`, `?` and newlines.
//! A statement is a decision when it contains decision language ("decided",
//! "chose", "will use", "the fix was ..."). Classification is a keyword
//! lookup; this is a best-effort heuristic.

use crate::types::{Decision, DecisionCategory, IdSequence};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

static STATEMENT_SPLIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?\n]").unwrap());

/// Decision-indicator patterns, matched against lowercased statements.
static DECISION_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"\b(?:decided|decision|chose|choosing|selected|opted|went with)\b").unwrap(),
        Regex::new(r"\b(?:will use|using|implemented|implementing)\b").unwrap(),
        Regex::new(r"\b(?:approach|strategy|solution|fix)\b.*\b(?:is|was|will be)\b").unwrap(),
    ]
});

static RATIONALE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:because|since|so that)\b\s*(.+)$").unwrap());

/// Category keyword families in priority order. Keywords are substrings, so
/// stems like `optimiz` cover "optimize" and "optimization".
const CATEGORY_KEYWORDS: &[(DecisionCategory, &[&str])] = &[
    (
        DecisionCategory::Architecture,
        &["architecture", "design", "structure", "pattern", "module"],
    ),
    (
        DecisionCategory::BugFix,
        &["fix", "bug", "error", "issue", "problem", "resolve"],
    ),
    (
        DecisionCategory::Optimization,
        &["optimiz", "performance", "speed", "efficien", "cach"],
    ),
    (
        DecisionCategory::Handoff,
        &["handoff", "hand-off", "transition", "switch", "pass to"],
    ),
    (
        DecisionCategory::Config,
        &["config", "setting", "environment", "variable"],
    ),
];

/// Whether a statement reads like a decision.
pub fn is_decision(statement: &str) -> bool {
    let lower = statement.to_lowercase();
    DECISION_PATTERNS.iter().any(|p| p.is_match(&lower))
}

/// Classify a decision statement; unmatched text is [`DecisionCategory::General`].
pub fn categorize_decision(statement: &str) -> DecisionCategory {
    let lower = statement.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(DecisionCategory::General)
}

/// Trailing "because ..." clause, if any.
fn rationale(statement: &str) -> String {
    RATIONALE_REGEX
        .captures(statement)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_default()
}

/// Extracts [`Decision`]s from narrative text.
///
/// Identifiers continue across calls on the same instance until
/// [`DecisionExtractor::reset`].
#[derive(Debug, Clone)]
pub struct DecisionExtractor {
    ids: IdSequence,
}

impl Default for DecisionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionExtractor {
    pub fn new() -> Self {
        Self {
            ids: IdSequence::new("DEC"),
        }
    }

    /// Extract decisions in statement order, stamped with `observed_at`.
    pub fn extract(&mut self, content: &str, observed_at: DateTime<Utc>) -> Vec<Decision> {
        let decisions: Vec<Decision> = STATEMENT_SPLIT_REGEX
            .split(content)
            .map(str::trim)
            .filter(|statement| !statement.is_empty() && is_decision(statement))
            .map_while(|statement| {
                let decision_id = self.ids.next_id();
                if decision_id.is_none() {
                    tracing::warn!("decision identifiers exhausted, dropping remaining statements");
                }
                Some((decision_id?, statement))
            })
            .map(|(decision_id, statement)| Decision {
                decision_id,
                description: statement.to_string(),
                timestamp: observed_at,
                category: categorize_decision(statement),
                rationale: rationale(statement),
                alternatives_considered: Vec::new(),
                related_files: Vec::new(),
                outcome: String::new(),
            })
            .collect();

        tracing::debug!(count = decisions.len(), "extracted decisions");
        decisions
    }

    /// Allocate an identifier for a manually inserted decision.
    pub fn next_id(&mut self) -> Option<String> {
        self.ids.next_id()
    }

    pub(crate) fn observe_id(&mut self, id: &str) {
        self.ids.observe(id);
    }

    pub fn reset(&mut self) {
        self.ids.reset();
    }
}
