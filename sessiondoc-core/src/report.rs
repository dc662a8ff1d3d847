//! Interchange form handed to renderers
//!
//! The core does not format reports. It exposes the structured
//! [`SessionReport`] (serializable, with free-text caps applied on
//! serialization), a compact [`SessionSummary`], and the [`ReportFormat`]
//! names renderers accept.

use crate::analytics::ToolStats;
use crate::error::Error;
use crate::types::{Decision, ErrorEvent, FileModification, Milestone, SessionMetrics, ToolUsage};
use serde::{Deserialize, Serialize};

/// Output formats a renderer can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Full [`SessionReport`] as JSON
    Json,
    /// [`SessionSummary`] only
    Summary,
    /// [`ToolStats`] only
    Stats,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Summary => "summary",
            ReportFormat::Stats => "stats",
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "summary" => Ok(ReportFormat::Summary),
            "stats" => Ok(ReportFormat::Stats),
            _ => Err(Error::UnknownFormat(s.to_string())),
        }
    }
}

/// Everything a renderer needs: the five collections plus metrics.
///
/// This is also the persisted form read back by [`crate::Session::restore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_name: String,
    pub metrics: SessionMetrics,
    pub tool_usages: Vec<ToolUsage>,
    pub file_modifications: Vec<FileModification>,
    pub errors: Vec<ErrorEvent>,
    pub decisions: Vec<Decision>,
    pub milestones: Vec<Milestone>,
}

impl SessionReport {
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Quick one-screen view of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_name: String,
    pub duration_minutes: f64,
    pub tool_calls: usize,
    pub files_touched: usize,
    pub errors: usize,
    pub errors_resolved: usize,
    pub decisions: usize,
    pub milestones: usize,
}

impl SessionSummary {
    pub fn new(session_name: &str, metrics: &SessionMetrics) -> Self {
        Self {
            session_name: session_name.to_string(),
            duration_minutes: metrics.duration_minutes,
            tool_calls: metrics.total_tool_calls,
            files_touched: metrics.unique_files_touched,
            errors: metrics.errors_encountered,
            errors_resolved: metrics.errors_resolved,
            decisions: metrics.decisions_made,
            milestones: metrics.milestones_achieved,
        }
    }
}

/// Rendered payload for a requested format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportPayload {
    Full(Box<SessionReport>),
    Summary(SessionSummary),
    Stats(ToolStats),
}
