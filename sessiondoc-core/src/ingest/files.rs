//! File modification derivation
//!
//! Two independent sources:
//!
//! - [`FileChangeDeriver::from_tool_usages`]: file-writing tool calls
//!   (`write`, `search_replace`, `delete_file`, plus configured extras)
//! - [`from_unified_diff`]: `diff --git a/<path> b/<path>` sections with
//!   `+`/`-` prefixed lines
//!
//! Both are total: malformed input yields fewer records, never an error.

use crate::types::{FileModification, ModificationKind, ToolUsage};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static DIFF_HEADER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^diff --git a/(.+?) b/(.+?)$").unwrap());

/// Path used when a tool call carries no usable path argument.
pub const UNKNOWN_PATH: &str = "unknown";

/// Tool tag for diff-derived records.
pub const GIT_TOOL: &str = "git";

/// What a file-writing tool does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileTool {
    /// Writes whole contents; created or edited depending on existence
    Write,
    /// Replaces a span; created or edited depending on existence
    Edit,
    /// Always deleted
    Delete,
}

/// Known file-mutating tools and the argument key holding their target path.
const FILE_TOOLS: &[(&str, &str, FileTool)] = &[
    ("write", "file_path", FileTool::Write),
    ("search_replace", "file_path", FileTool::Edit),
    ("delete_file", "target_file", FileTool::Delete),
];

/// Filesystem check used to tell created files from edited ones.
pub trait PathProbe {
    fn exists(&self, path: &str) -> bool;
}

/// [`PathProbe`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl PathProbe for FsProbe {
    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }
}

/// Derives [`FileModification`]s from tool calls.
#[derive(Debug, Clone, Default)]
pub struct FileChangeDeriver<P = FsProbe> {
    probe: P,
    extra_write_tools: Vec<String>,
}

impl FileChangeDeriver<FsProbe> {
    pub fn new() -> Self {
        Self::with_probe(FsProbe)
    }
}

impl<P: PathProbe> FileChangeDeriver<P> {
    pub fn with_probe(probe: P) -> Self {
        Self {
            probe,
            extra_write_tools: Vec::new(),
        }
    }

    /// Treat additional tool names as whole-file writers (path in `file_path`).
    pub fn with_extra_write_tools(mut self, tools: impl IntoIterator<Item = String>) -> Self {
        self.extra_write_tools.extend(tools);
        self
    }

    /// Look up how a tool mutates files, if it does.
    fn file_tool(&self, tool_name: &str) -> Option<(&'static str, FileTool)> {
        FILE_TOOLS
            .iter()
            .find(|(name, _, _)| *name == tool_name)
            .map(|(_, key, tool)| (*key, *tool))
            .or_else(|| {
                self.extra_write_tools
                    .iter()
                    .any(|t| t == tool_name)
                    .then_some(("file_path", FileTool::Write))
            })
    }

    /// Derive one modification per file-mutating tool call, in input order.
    pub fn from_tool_usages(&self, usages: &[ToolUsage]) -> Vec<FileModification> {
        let modifications: Vec<FileModification> = usages
            .iter()
            .filter_map(|usage| {
                let (path_key, tool) = self.file_tool(&usage.tool_name)?;
                Some(self.derive(usage, path_key, tool))
            })
            .collect();

        tracing::debug!(count = modifications.len(), "derived file modifications from tools");
        modifications
    }

    fn derive(&self, usage: &ToolUsage, path_key: &str, tool: FileTool) -> FileModification {
        let file_path = usage
            .argument_str(path_key)
            .filter(|p| !p.is_empty())
            .unwrap_or(UNKNOWN_PATH)
            .to_string();

        let kind = match tool {
            FileTool::Delete => ModificationKind::Deleted,
            FileTool::Write | FileTool::Edit if self.probe.exists(&file_path) => {
                ModificationKind::Edited
            }
            FileTool::Write | FileTool::Edit => ModificationKind::Created,
        };

        let (before_snippet, after_snippet) = snippets(usage, tool);
        let (lines_added, lines_removed) = line_changes(usage, tool);

        FileModification {
            file_path,
            kind,
            timestamp: usage.timestamp,
            before_snippet,
            after_snippet,
            lines_added,
            lines_removed,
            tool_used: usage.tool_name.clone(),
        }
    }
}

/// Written contents of a whole-file write, under either common key.
fn written_contents(usage: &ToolUsage) -> Option<&str> {
    usage
        .argument_str("contents")
        .or_else(|| usage.argument_str("content"))
}

fn snippets(usage: &ToolUsage, tool: FileTool) -> (String, String) {
    match tool {
        FileTool::Edit => (
            usage.argument_str("old_string").unwrap_or_default().to_string(),
            usage.argument_str("new_string").unwrap_or_default().to_string(),
        ),
        FileTool::Write => (
            String::new(),
            written_contents(usage).unwrap_or_default().to_string(),
        ),
        FileTool::Delete => (String::new(), String::new()),
    }
}

/// Line deltas from raw arguments.
///
/// Write: every content line is an addition. Edit: the difference between old
/// and new line counts. Delete: nothing is known about the removed content.
fn line_changes(usage: &ToolUsage, tool: FileTool) -> (u64, u64) {
    let count = |text: Option<&str>| text.map(|s| s.lines().count()).unwrap_or(0) as u64;
    match tool {
        FileTool::Write => (count(written_contents(usage)), 0),
        FileTool::Edit => {
            let old_lines = count(usage.argument_str("old_string"));
            let new_lines = count(usage.argument_str("new_string"));
            (
                new_lines.saturating_sub(old_lines),
                old_lines.saturating_sub(new_lines),
            )
        }
        FileTool::Delete => (0, 0),
    }
}

/// Running totals for the file currently being read from a diff.
struct DiffSection {
    path: String,
    added: u64,
    removed: u64,
}

impl DiffSection {
    fn into_modification(self, timestamp: DateTime<Utc>) -> FileModification {
        FileModification {
            file_path: self.path,
            kind: ModificationKind::Edited,
            timestamp,
            before_snippet: String::new(),
            after_snippet: String::new(),
            lines_added: self.added,
            lines_removed: self.removed,
            tool_used: GIT_TOOL.to_string(),
        }
    }
}

/// Reconstruct per-file line counts from a unified diff.
///
/// One record per `diff --git` header, using the destination (`b/`) path.
/// Lines before the first header are ignored; `+++`/`---` headers are not
/// counted.
pub fn from_unified_diff(diff: &str, timestamp: DateTime<Utc>) -> Vec<FileModification> {
    let mut modifications = Vec::new();
    let mut current: Option<DiffSection> = None;

    for line in diff.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(caps) = DIFF_HEADER_REGEX.captures(line) {
            if let Some(section) = current.take() {
                modifications.push(section.into_modification(timestamp));
            }
            current = Some(DiffSection {
                path: caps[2].to_string(),
                added: 0,
                removed: 0,
            });
            continue;
        }

        let Some(section) = current.as_mut() else {
            continue;
        };
        if line.starts_with('+') && !line.starts_with("+++") {
            section.added += 1;
        } else if line.starts_with('-') && !line.starts_with("---") {
            section.removed += 1;
        }
    }

    if let Some(section) = current {
        modifications.push(section.into_modification(timestamp));
    }

    tracing::debug!(files = modifications.len(), "parsed unified diff");
    modifications
}
