//! Core domain types for sessiondoc
//!
//! These records are the structured form of a work session transcript. They
//! are produced by the extractors in [`crate::ingest`] (or inserted manually
//! through [`crate::Session`]) and never mutated once appended.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Tool usage** | A recognized invocation of an external action (read, write, search, terminal) |
//! | **File modification** | A created/edited/deleted file, derived from tool usage or a unified diff |
//! | **Error** | An error, exception or failure signature found in session text |
//! | **Decision** | A sentence judged by keyword heuristics to describe a choice |
//! | **Milestone** | A caller-supplied marker of progress; never extracted |
//! | **Logical timestamp** | A synthesized ordering instant, one tick per extracted tool call |
//!
//! Free-text fields keep their full text in memory. The 200/500 character caps
//! are applied by the `serialize_with` helpers in [`crate::format`].

use crate::format::{cap_long, cap_short};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Tool arguments, keyed by parameter name.
pub type Arguments = serde_json::Map<String, serde_json::Value>;

// ============================================
// Tool Usage
// ============================================

/// Closed set of tool categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Read,
    Search,
    Write,
    Terminal,
    Browser,
    Web,
    Planning,
    Memory,
    /// Catch-all for unrecognized tool names
    Other,
}

/// Tool name to category lookup. Names not listed map to [`ToolCategory::Other`].
const TOOL_CATEGORIES: &[(&str, ToolCategory)] = &[
    ("read_file", ToolCategory::Read),
    ("list_dir", ToolCategory::Read),
    ("glob_file_search", ToolCategory::Search),
    ("grep", ToolCategory::Search),
    ("codebase_search", ToolCategory::Search),
    ("write", ToolCategory::Write),
    ("search_replace", ToolCategory::Write),
    ("edit_notebook", ToolCategory::Write),
    ("delete_file", ToolCategory::Write),
    ("run_terminal_cmd", ToolCategory::Terminal),
    ("mcp_cursor-ide-browser_browser_navigate", ToolCategory::Browser),
    ("mcp_cursor-ide-browser_browser_snapshot", ToolCategory::Browser),
    ("mcp_cursor-ide-browser_browser_click", ToolCategory::Browser),
    ("mcp_cursor-ide-browser_browser_type", ToolCategory::Browser),
    ("web_search", ToolCategory::Web),
    ("todo_write", ToolCategory::Planning),
    ("update_memory", ToolCategory::Memory),
];

impl ToolCategory {
    /// Look up the category for a tool name.
    pub fn for_tool(tool_name: &str) -> Self {
        TOOL_CATEGORIES
            .iter()
            .find(|(name, _)| *name == tool_name)
            .map(|(_, category)| *category)
            .unwrap_or(ToolCategory::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::Read => "read",
            ToolCategory::Search => "search",
            ToolCategory::Write => "write",
            ToolCategory::Terminal => "terminal",
            ToolCategory::Browser => "browser",
            ToolCategory::Web => "web",
            ToolCategory::Planning => "planning",
            ToolCategory::Memory => "memory",
            ToolCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single tool call recognized in session text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUsage {
    /// Tool name as written in the transcript (never empty)
    pub tool_name: String,
    /// Logical timestamp (one tick per extracted call)
    pub timestamp: DateTime<Utc>,
    /// Arguments captured alongside the call, if any
    #[serde(default)]
    pub arguments: Arguments,
    /// Free-text result of the call
    #[serde(default, serialize_with = "cap_short")]
    pub result: String,
    pub success: bool,
    #[serde(default)]
    pub duration_ms: u64,
    pub category: ToolCategory,
}

impl ToolUsage {
    /// Build a successful usage with the category looked up from the tool name.
    pub fn new(tool_name: impl Into<String>, timestamp: DateTime<Utc>, arguments: Arguments) -> Self {
        let tool_name = tool_name.into();
        let category = ToolCategory::for_tool(&tool_name);
        Self {
            tool_name,
            timestamp,
            arguments,
            result: String::new(),
            success: true,
            duration_ms: 0,
            category,
        }
    }

    /// String-valued argument, if present.
    pub fn argument_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

// ============================================
// File Modifications
// ============================================

/// How a file was touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationKind {
    Created,
    Edited,
    Deleted,
}

impl ModificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModificationKind::Created => "created",
            ModificationKind::Edited => "edited",
            ModificationKind::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ModificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A file modification event.
///
/// `kind` is decided when the record is built. Line counts are computed from
/// raw tool arguments or diff lines, never from the snippets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileModification {
    pub file_path: String,
    #[serde(rename = "modification_type")]
    pub kind: ModificationKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default, serialize_with = "cap_long")]
    pub before_snippet: String,
    #[serde(default, serialize_with = "cap_long")]
    pub after_snippet: String,
    #[serde(default)]
    pub lines_added: u64,
    #[serde(default)]
    pub lines_removed: u64,
    /// Tool that produced the change (`git` for diff-derived records)
    #[serde(default)]
    pub tool_used: String,
}

// ============================================
// Errors
// ============================================

/// Error classification. [`ErrorKind::Runtime`] is the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Build,
    Network,
    Dependency,
    Syntax,
    Runtime,
    Permission,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Build => "build",
            ErrorKind::Network => "network",
            ErrorKind::Dependency => "dependency",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Runtime => "runtime",
            ErrorKind::Permission => "permission",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "build" => Ok(ErrorKind::Build),
            "network" => Ok(ErrorKind::Network),
            "dependency" => Ok(ErrorKind::Dependency),
            "syntax" => Ok(ErrorKind::Syntax),
            "runtime" => Ok(ErrorKind::Runtime),
            "permission" => Ok(ErrorKind::Permission),
            _ => Err(format!("unknown error type: {}", s)),
        }
    }
}

/// An error found in session text, optionally paired with its solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// `ERR_0001`, `ERR_0002`, ... in extraction/insertion order
    pub error_id: String,
    #[serde(rename = "error_type")]
    pub kind: ErrorKind,
    #[serde(serialize_with = "cap_long")]
    pub error_message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub solution_steps: Vec<String>,
    /// Whether the solution worked; counts toward `errors_resolved`
    #[serde(default = "default_true")]
    pub effective: bool,
    /// Same message already seen earlier in the session
    #[serde(default)]
    pub recurred: bool,
    #[serde(default)]
    pub related_tools: Vec<String>,
}

fn default_true() -> bool {
    true
}

// ============================================
// Decisions
// ============================================

/// Decision classification. [`DecisionCategory::General`] is the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionCategory {
    Architecture,
    BugFix,
    Optimization,
    Handoff,
    Config,
    General,
}

impl DecisionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionCategory::Architecture => "architecture",
            DecisionCategory::BugFix => "bug_fix",
            DecisionCategory::Optimization => "optimization",
            DecisionCategory::Handoff => "handoff",
            DecisionCategory::Config => "config",
            DecisionCategory::General => "general",
        }
    }
}

impl std::fmt::Display for DecisionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DecisionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "architecture" => Ok(DecisionCategory::Architecture),
            "bug_fix" => Ok(DecisionCategory::BugFix),
            "optimization" => Ok(DecisionCategory::Optimization),
            "handoff" => Ok(DecisionCategory::Handoff),
            "config" => Ok(DecisionCategory::Config),
            "general" => Ok(DecisionCategory::General),
            _ => Err(format!("unknown decision category: {}", s)),
        }
    }
}

/// A decision made during the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// `DEC_0001`, `DEC_0002`, ...
    pub decision_id: String,
    #[serde(serialize_with = "cap_short")]
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub category: DecisionCategory,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub alternatives_considered: Vec<String>,
    #[serde(default)]
    pub related_files: Vec<String>,
    /// Free-form outcome (success, partial, reverted)
    #[serde(default)]
    pub outcome: String,
}

// ============================================
// Milestones
// ============================================

/// How much a milestone matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    #[default]
    Minor,
    Major,
    Critical,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Minor => "minor",
            Impact::Major => "major",
            Impact::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Impact {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minor" => Ok(Impact::Minor),
            "major" => Ok(Impact::Major),
            "critical" => Ok(Impact::Critical),
            _ => Err(format!("unknown impact: {}", s)),
        }
    }
}

/// A caller-supplied session milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    /// `MS_0001`, `MS_0002`, ...
    pub milestone_id: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub impact: Impact,
    #[serde(default)]
    pub related_decisions: Vec<String>,
}

// ============================================
// Metrics
// ============================================

/// Aggregated session metrics.
///
/// The zero value (all counts 0, duration 0.0) is what an empty session
/// produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub duration_minutes: f64,
    pub total_tool_calls: usize,
    pub successful_tool_calls: usize,
    pub files_created: usize,
    pub files_edited: usize,
    pub files_deleted: usize,
    pub total_lines_added: u64,
    pub total_lines_removed: u64,
    pub errors_encountered: usize,
    pub errors_resolved: usize,
    pub decisions_made: usize,
    pub milestones_achieved: usize,
    /// Number of distinct file paths, not the number of events
    pub unique_files_touched: usize,
}

// ============================================
// Identifiers and logical time
// ============================================

/// Sequential identifier generator (`ERR_0001`, `DEC_0001`, `MS_0001`).
///
/// Numbering persists across calls on one owner and restarts only on
/// [`IdSequence::reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSequence {
    prefix: &'static str,
    last: u32,
}

impl IdSequence {
    pub const fn new(prefix: &'static str) -> Self {
        Self { prefix, last: 0 }
    }

    /// Allocate the next identifier, or `None` once the numbering space is
    /// exhausted (only reachable after restoring a report with a huge id).
    pub fn next_id(&mut self) -> Option<String> {
        let next = self.last.checked_add(1)?;
        self.last = next;
        Some(format!("{}_{:04}", self.prefix, next))
    }

    /// Continue numbering after `id` if it belongs to this sequence and is
    /// higher than anything issued so far.
    pub fn observe(&mut self, id: &str) {
        let number = id
            .strip_prefix(self.prefix)
            .and_then(|rest| rest.strip_prefix('_'))
            .and_then(|n| n.parse::<u32>().ok());
        if let Some(n) = number {
            self.last = self.last.max(n);
        }
    }

    pub fn reset(&mut self) {
        self.last = 0;
    }
}

/// Synthesized clock for static transcripts: one second per tick.
///
/// Real wall-clock time is not recoverable from text, so only the relative
/// order of ticks is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalClock {
    origin: DateTime<Utc>,
    ticks: i64,
}

impl LogicalClock {
    pub fn new(origin: DateTime<Utc>) -> Self {
        Self { origin, ticks: 0 }
    }

    /// Return the current instant and advance by one tick.
    pub fn tick(&mut self) -> DateTime<Utc> {
        let ts = self.now();
        self.ticks += 1;
        ts
    }

    /// Current instant without advancing.
    pub fn now(&self) -> DateTime<Utc> {
        self.origin + Duration::seconds(self.ticks)
    }

    pub fn reset(&mut self) {
        self.ticks = 0;
    }
}
