//! Error signature extraction and classification
//!
//! Three pattern families are scanned independently and in order, each
//! across the whole text and case-insensitively:
//!
//! 1. multi-line failure blocks (`Traceback`, `Error`, `Exception`, `Failed`
//!    plus up to ten following non-empty lines)
//! 2. single `error:` / `FAILED:` lines
//! 3. non-zero `Exit code: N` mentions
//!
//! Every match becomes one [`ErrorEvent`]. A line can be reported by more
//! than one family.

use crate::types::{ErrorEvent, ErrorKind, IdSequence};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Pattern families in scan order.
static ERROR_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)(?:traceback|error|exception|failed)[^\n]*(?:\n[^\n]+){0,10}").unwrap(),
        Regex::new(r"(?i)(?:error|failed):\s*[^\n]+").unwrap(),
        Regex::new(r"(?i)exit code:\s*[1-9]\d*").unwrap(),
    ]
});

/// Keyword families checked in priority order; first hit wins.
const ERROR_KEYWORDS: &[(ErrorKind, &[&str])] = &[
    (
        ErrorKind::Dependency,
        &["import", "module", "package", "dependency", "pip"],
    ),
    (
        ErrorKind::Syntax,
        &["syntax", "parse", "unexpected token", "indent"],
    ),
    (
        ErrorKind::Build,
        &["build", "compile", "gradle", "npm run", "webpack"],
    ),
    (
        ErrorKind::Network,
        &["network", "connection", "timeout", "socket", "http"],
    ),
    (
        ErrorKind::Permission,
        &["permission", "access denied", "unauthorized"],
    ),
];

/// Classify an error message. Pure; unmatched text is [`ErrorKind::Runtime`].
pub fn categorize_error(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();
    ERROR_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(kind, _)| *kind)
        .unwrap_or(ErrorKind::Runtime)
}

/// Extracts [`ErrorEvent`]s from session text.
///
/// Identifiers continue across calls on the same instance (`ERR_0001`,
/// `ERR_0002`, ...) until [`ErrorExtractor::reset`]. Messages already seen by
/// this instance are flagged as recurred.
#[derive(Debug, Clone)]
pub struct ErrorExtractor {
    ids: IdSequence,
    seen: HashSet<String>,
}

impl Default for ErrorExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorExtractor {
    pub fn new() -> Self {
        Self {
            ids: IdSequence::new("ERR"),
            seen: HashSet::new(),
        }
    }

    /// Extract every error signature in `content`, stamped with `observed_at`.
    pub fn extract(&mut self, content: &str, observed_at: DateTime<Utc>) -> Vec<ErrorEvent> {
        let mut errors = Vec::new();

        'scan: for pattern in ERROR_PATTERNS.iter() {
            for m in pattern.find_iter(content) {
                let Some(error_id) = self.ids.next_id() else {
                    tracing::warn!("error identifiers exhausted, dropping remaining matches");
                    break 'scan;
                };
                let message = m.as_str().trim().to_string();
                let kind = categorize_error(&message);
                let recurred = !self.seen.insert(message.clone());

                tracing::trace!(kind = %kind, recurred, "matched error signature");

                errors.push(ErrorEvent {
                    error_id,
                    kind,
                    error_message: message,
                    timestamp: observed_at,
                    solution: String::new(),
                    solution_steps: Vec::new(),
                    effective: true,
                    recurred,
                    related_tools: Vec::new(),
                });
            }
        }

        tracing::debug!(count = errors.len(), "extracted errors");
        errors
    }

    /// Allocate an identifier for a manually inserted error.
    pub fn next_id(&mut self) -> Option<String> {
        self.ids.next_id()
    }

    pub(crate) fn observe_id(&mut self, id: &str) {
        self.ids.observe(id);
    }

    pub fn reset(&mut self) {
        self.ids.reset();
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_empty_content() {
        assert!(ErrorExtractor::new().extract("", at()).is_empty());
    }

    #[test]
    fn test_no_errors_in_clean_text() {
        let errors = ErrorExtractor::new().extract("All good.\nExit code: 0\nDone", at());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_python_traceback() {
        let content = "Running script...\nTraceback (most recent call last):\n    File \"test.py\", line 10\n        print(x\nSyntaxError: unexpected EOF\n";
        let errors = ErrorExtractor::new().extract(content, at());

        assert!(!errors.is_empty());
        assert!(errors[0].error_message.starts_with("Traceback"));
        assert!(errors[0].error_message.contains("SyntaxError"));
        assert_eq!(errors[0].kind, ErrorKind::Syntax);
    }

    #[test]
    fn test_exit_code() {
        let errors = ErrorExtractor::new().extract("Command ran\nExit code: 1\nDone", at());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_message, "Exit code: 1");
        assert_eq!(errors[0].kind, ErrorKind::Runtime);
    }

    #[test]
    fn test_single_line_reported_by_two_families() {
        // "error: ..." matches the block family and the single-line family
        let errors = ErrorExtractor::new().extract("error: linker failed", at());
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].error_id, "ERR_0001");
        assert_eq!(errors[1].error_id, "ERR_0002");
    }

    #[test]
    fn test_long_message_kept_in_memory_capped_on_output() {
        let content = format!("Error: {}", "x".repeat(2000));
        let errors = ErrorExtractor::new().extract(&content, at());
        assert_eq!(errors[0].error_message.chars().count(), 2007);

        let json = serde_json::to_value(&errors[0]).unwrap();
        assert_eq!(json["error_message"].as_str().unwrap().chars().count(), 500);
    }

    #[test]
    fn test_exhausted_ids_stop_extraction_without_panic() {
        let mut extractor = ErrorExtractor::new();
        extractor.observe_id("ERR_4294967295");
        assert!(extractor.extract("Exit code: 1", at()).is_empty());
        assert_eq!(extractor.next_id(), None);
    }

    #[test]
    fn test_ids_persist_across_calls() {
        let mut extractor = ErrorExtractor::new();
        let first = extractor.extract("Exit code: 2", at());
        let second = extractor.extract("Exit code: 3", at());
        assert_eq!(first[0].error_id, "ERR_0001");
        assert_eq!(second[0].error_id, "ERR_0002");

        extractor.reset();
        let third = extractor.extract("Exit code: 4", at());
        assert_eq!(third[0].error_id, "ERR_0001");
    }

    #[test]
    fn test_recurred_flag() {
        let mut extractor = ErrorExtractor::new();
        let first = extractor.extract("Exit code: 2", at());
        let second = extractor.extract("Exit code: 2", at());
        assert!(!first[0].recurred);
        assert!(second[0].recurred);
    }

    #[test]
    fn test_categorize_dependency() {
        assert_eq!(
            categorize_error("ModuleNotFoundError: No module named 'requests'"),
            ErrorKind::Dependency
        );
    }

    #[test]
    fn test_categorize_syntax() {
        assert_eq!(categorize_error("SyntaxError: invalid syntax"), ErrorKind::Syntax);
    }

    #[test]
    fn test_categorize_build() {
        assert_eq!(
            categorize_error("error: could not compile `app`"),
            ErrorKind::Build
        );
    }

    #[test]
    fn test_categorize_network() {
        assert_eq!(categorize_error("Connection timeout after 30s"), ErrorKind::Network);
    }

    #[test]
    fn test_categorize_permission() {
        assert_eq!(
            categorize_error("EACCES: permission denied, open '/etc/hosts'"),
            ErrorKind::Permission
        );
    }

    #[test]
    fn test_categorize_priority_order() {
        // Both dependency and network keywords: dependency wins
        assert_eq!(
            categorize_error("pip install failed: connection reset"),
            ErrorKind::Dependency
        );
    }

    #[test]
    fn test_categorize_is_deterministic() {
        let message = "Segmentation fault (core dumped)";
        assert_eq!(categorize_error(message), ErrorKind::Runtime);
        assert_eq!(categorize_error(message), categorize_error(message));
    }
}
