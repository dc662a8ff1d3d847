//! Tool usage statistics
//!
//! Counts per tool name and per category, each with its share of all calls.
//! Rows are sorted by count (descending), ties broken by name so the output
//! is stable.

use crate::types::ToolUsage;
use serde::Serialize;
use std::collections::HashMap;

/// One row of a usage breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCount {
    pub name: String,
    pub count: usize,
    /// Share of all tool calls, 0.0 to 100.0
    pub percentage: f64,
}

/// Tool usage breakdown for a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToolStats {
    pub total_calls: usize,
    pub by_tool: Vec<ToolCount>,
    pub by_category: Vec<ToolCount>,
}

/// Build per-tool and per-category counts.
pub fn tool_stats(usages: &[ToolUsage]) -> ToolStats {
    let mut by_tool: HashMap<&str, usize> = HashMap::new();
    let mut by_category: HashMap<&str, usize> = HashMap::new();

    for usage in usages {
        *by_tool.entry(usage.tool_name.as_str()).or_insert(0) += 1;
        *by_category.entry(usage.category.as_str()).or_insert(0) += 1;
    }

    let total = usages.len();
    ToolStats {
        total_calls: total,
        by_tool: ranked(by_tool, total),
        by_category: ranked(by_category, total),
    }
}

fn ranked(counts: HashMap<&str, usize>, total: usize) -> Vec<ToolCount> {
    let mut rows: Vec<ToolCount> = counts
        .into_iter()
        .map(|(name, count)| ToolCount {
            name: name.to_string(),
            count,
            percentage: percentage(count, total),
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    rows
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Arguments;
    use chrono::Utc;

    fn usages(names: &[&str]) -> Vec<ToolUsage> {
        names
            .iter()
            .map(|name| ToolUsage::new(*name, Utc::now(), Arguments::new()))
            .collect()
    }

    #[test]
    fn test_empty() {
        let stats = tool_stats(&[]);
        assert_eq!(stats, ToolStats::default());
    }

    #[test]
    fn test_counts_and_order() {
        let stats = tool_stats(&usages(&["grep", "read_file", "grep", "write", "grep", "read_file"]));

        assert_eq!(stats.total_calls, 6);
        assert_eq!(stats.by_tool[0].name, "grep");
        assert_eq!(stats.by_tool[0].count, 3);
        assert_eq!(stats.by_tool[0].percentage, 50.0);
        assert_eq!(stats.by_tool[1].name, "read_file");
        assert_eq!(stats.by_tool[2].name, "write");
        assert_eq!(stats.by_tool[2].percentage, 16.7);
    }

    #[test]
    fn test_category_breakdown() {
        let stats = tool_stats(&usages(&["grep", "codebase_search", "list_dir", "mystery"]));

        assert_eq!(stats.by_category[0].name, "search");
        assert_eq!(stats.by_category[0].count, 2);
        // Ties sorted by name
        assert_eq!(stats.by_category[1].name, "other");
        assert_eq!(stats.by_category[2].name, "read");
    }
}
