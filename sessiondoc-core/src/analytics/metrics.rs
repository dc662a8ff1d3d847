//! Session metrics aggregation
//!
//! ## Metrics Produced
//!
//! | Metric | Source |
//! |--------|--------|
//! | `duration_minutes` | explicit start/end, else first-to-last tool call, else 0 |
//! | `total_tool_calls` / `successful_tool_calls` | tool usages |
//! | `files_created` / `files_edited` / `files_deleted` | modification kinds |
//! | `total_lines_added` / `total_lines_removed` | summed line deltas |
//! | `unique_files_touched` | distinct file paths |
//! | `errors_encountered` / `errors_resolved` | errors, effective errors |
//! | `decisions_made` / `milestones_achieved` | collection sizes |

use crate::types::{
    Decision, ErrorEvent, FileModification, Milestone, ModificationKind, SessionMetrics, ToolUsage,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Borrowed view of everything the aggregator reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsInput<'a> {
    pub tool_usages: &'a [ToolUsage],
    pub file_modifications: &'a [FileModification],
    pub errors: &'a [ErrorEvent],
    pub decisions: &'a [Decision],
    pub milestones: &'a [Milestone],
    /// Explicit session start; used only together with `end`
    pub start: Option<DateTime<Utc>>,
    /// Explicit session end; used only together with `start`
    pub end: Option<DateTime<Utc>>,
}

/// Compute [`SessionMetrics`]. Side-effect free.
pub fn calculate_metrics(input: &MetricsInput<'_>) -> SessionMetrics {
    let mut metrics = SessionMetrics {
        duration_minutes: duration_minutes(input),
        total_tool_calls: input.tool_usages.len(),
        successful_tool_calls: input.tool_usages.iter().filter(|u| u.success).count(),
        errors_encountered: input.errors.len(),
        errors_resolved: input.errors.iter().filter(|e| e.effective).count(),
        decisions_made: input.decisions.len(),
        milestones_achieved: input.milestones.len(),
        ..Default::default()
    };

    let mut unique_files: HashSet<&str> = HashSet::new();
    for modification in input.file_modifications {
        match modification.kind {
            ModificationKind::Created => metrics.files_created += 1,
            ModificationKind::Edited => metrics.files_edited += 1,
            ModificationKind::Deleted => metrics.files_deleted += 1,
        }
        metrics.total_lines_added += modification.lines_added;
        metrics.total_lines_removed += modification.lines_removed;
        unique_files.insert(&modification.file_path);
    }
    metrics.unique_files_touched = unique_files.len();

    tracing::debug!(
        tool_calls = metrics.total_tool_calls,
        files = metrics.unique_files_touched,
        errors = metrics.errors_encountered,
        duration_minutes = metrics.duration_minutes,
        "calculated session metrics"
    );

    metrics
}

/// Duration in minutes, rounded to two decimals and never negative.
fn duration_minutes(input: &MetricsInput<'_>) -> f64 {
    let span = match (input.start, input.end) {
        (Some(start), Some(end)) => end - start,
        _ => {
            let first = input.tool_usages.iter().map(|u| u.timestamp).min();
            let last = input.tool_usages.iter().map(|u| u.timestamp).max();
            match (first, last) {
                (Some(first), Some(last)) => last - first,
                _ => return 0.0,
            }
        }
    };

    let minutes = span.num_milliseconds() as f64 / 60_000.0;
    ((minutes * 100.0).round() / 100.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Arguments, DecisionCategory, ErrorKind, Impact};
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn usage(offset_secs: i64, success: bool) -> ToolUsage {
        let mut usage = ToolUsage::new("read_file", t0() + Duration::seconds(offset_secs), Arguments::new());
        usage.success = success;
        usage
    }

    fn modification(path: &str, kind: ModificationKind, added: u64, removed: u64) -> FileModification {
        FileModification {
            file_path: path.to_string(),
            kind,
            timestamp: t0(),
            before_snippet: String::new(),
            after_snippet: String::new(),
            lines_added: added,
            lines_removed: removed,
            tool_used: "write".to_string(),
        }
    }

    fn error(id: &str, effective: bool) -> ErrorEvent {
        ErrorEvent {
            error_id: id.to_string(),
            kind: ErrorKind::Runtime,
            error_message: "boom".to_string(),
            timestamp: t0(),
            solution: String::new(),
            solution_steps: vec![],
            effective,
            recurred: false,
            related_tools: vec![],
        }
    }

    #[test]
    fn test_empty_input_is_zero() {
        let metrics = calculate_metrics(&MetricsInput::default());
        assert_eq!(metrics, SessionMetrics::default());
        assert_eq!(metrics.duration_minutes, 0.0);
    }

    #[test]
    fn test_tool_calls() {
        let usages = vec![usage(0, true), usage(1, false), usage(2, true)];
        let metrics = calculate_metrics(&MetricsInput {
            tool_usages: &usages,
            ..Default::default()
        });
        assert_eq!(metrics.total_tool_calls, 3);
        assert_eq!(metrics.successful_tool_calls, 2);
    }

    #[test]
    fn test_file_modifications_and_lines() {
        let mods = vec![
            modification("a.rs", ModificationKind::Created, 10, 0),
            modification("b.rs", ModificationKind::Edited, 5, 2),
            modification("c.rs", ModificationKind::Deleted, 0, 0),
            modification("b.rs", ModificationKind::Edited, 1, 1),
        ];
        let metrics = calculate_metrics(&MetricsInput {
            file_modifications: &mods,
            ..Default::default()
        });

        assert_eq!(metrics.files_created, 1);
        assert_eq!(metrics.files_edited, 2);
        assert_eq!(metrics.files_deleted, 1);
        assert_eq!(metrics.total_lines_added, 16);
        assert_eq!(metrics.total_lines_removed, 3);
        assert_eq!(metrics.unique_files_touched, 3);
    }

    #[test]
    fn test_unique_files_with_repeats() {
        let mods = vec![
            modification("same.rs", ModificationKind::Edited, 0, 0),
            modification("same.rs", ModificationKind::Edited, 0, 0),
            modification("same.rs", ModificationKind::Deleted, 0, 0),
        ];
        let metrics = calculate_metrics(&MetricsInput {
            file_modifications: &mods,
            ..Default::default()
        });
        assert_eq!(metrics.unique_files_touched, 1);
    }

    #[test]
    fn test_errors_and_counts() {
        let errors = vec![error("ERR_0001", true), error("ERR_0002", false)];
        let decisions = vec![Decision {
            decision_id: "DEC_0001".to_string(),
            description: "Chose SQLite".to_string(),
            timestamp: t0(),
            category: DecisionCategory::General,
            rationale: String::new(),
            alternatives_considered: vec![],
            related_files: vec![],
            outcome: String::new(),
        }];
        let milestones = vec![Milestone {
            milestone_id: "MS_0001".to_string(),
            title: "Shipped".to_string(),
            timestamp: t0(),
            description: String::new(),
            impact: Impact::Major,
            related_decisions: vec![],
        }];

        let metrics = calculate_metrics(&MetricsInput {
            errors: &errors,
            decisions: &decisions,
            milestones: &milestones,
            ..Default::default()
        });
        assert_eq!(metrics.errors_encountered, 2);
        assert_eq!(metrics.errors_resolved, 1);
        assert_eq!(metrics.decisions_made, 1);
        assert_eq!(metrics.milestones_achieved, 1);
    }

    #[test]
    fn test_duration_from_tool_timestamps() {
        // Out of order on purpose: min/max, not first/last element
        let usages = vec![usage(600, true), usage(0, true), usage(300, true)];
        let metrics = calculate_metrics(&MetricsInput {
            tool_usages: &usages,
            ..Default::default()
        });
        assert_eq!(metrics.duration_minutes, 10.0);
    }

    #[test]
    fn test_duration_explicit_range_wins() {
        let usages = vec![usage(0, true), usage(60, true)];
        let metrics = calculate_metrics(&MetricsInput {
            tool_usages: &usages,
            start: Some(t0()),
            end: Some(t0() + Duration::minutes(90)),
            ..Default::default()
        });
        assert_eq!(metrics.duration_minutes, 90.0);
    }

    #[test]
    fn test_duration_needs_both_bounds() {
        let usages = vec![usage(0, true), usage(120, true)];
        let metrics = calculate_metrics(&MetricsInput {
            tool_usages: &usages,
            start: Some(t0() - Duration::hours(5)),
            ..Default::default()
        });
        assert_eq!(metrics.duration_minutes, 2.0);
    }

    #[test]
    fn test_duration_rounded() {
        let metrics = calculate_metrics(&MetricsInput {
            start: Some(t0()),
            end: Some(t0() + Duration::seconds(10)),
            ..Default::default()
        });
        assert_eq!(metrics.duration_minutes, 0.17);
    }

    #[test]
    fn test_idempotent() {
        let usages = vec![usage(0, true), usage(45, false)];
        let mods = vec![modification("a.rs", ModificationKind::Created, 4, 0)];
        let input = MetricsInput {
            tool_usages: &usages,
            file_modifications: &mods,
            ..Default::default()
        };

        let first = calculate_metrics(&input);
        let second = calculate_metrics(&input);
        assert_eq!(first, second);
        assert_eq!(
            first.duration_minutes.to_bits(),
            second.duration_minutes.to_bits()
        );
    }
}
