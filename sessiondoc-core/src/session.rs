//! Session aggregate
//!
//! A [`Session`] exclusively owns the five event collections, the computed
//! metrics, and every identifier counter. Records are appended by extraction
//! passes or manual inserts and are never mutated afterwards; they are only
//! dropped by [`Session::reset`].
//!
//! ## Identifier numbering
//!
//! `ERR_`, `DEC_` and `MS_` numbering persists across repeated loads into one
//! session and is shared between extracted and manually inserted records, so
//! identifiers stay unique within a session. [`Session::reset`] restarts all
//! three at 1.

use crate::analytics::{calculate_metrics, tool_stats, MetricsInput, ToolStats};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::ingest::{
    self, from_unified_diff, DecisionExtractor, ErrorExtractor, FileChangeDeriver, FsProbe,
    Notation, PathProbe, ToolExtractor,
};
use crate::report::{ReportFormat, ReportPayload, SessionReport, SessionSummary};
use crate::types::{
    Decision, DecisionCategory, ErrorEvent, ErrorKind, FileModification, IdSequence, Impact,
    Milestone, SessionMetrics, ToolUsage,
};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

const DEFAULT_SESSION_NAME: &str = "Session";

/// Counts from one load call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadResult {
    /// Notation the tool calls were written in, if any matched
    pub notation: Option<Notation>,
    pub tool_usages: usize,
    pub file_modifications: usize,
    pub errors: usize,
    pub decisions: usize,
}

/// A work session being documented.
#[derive(Debug)]
pub struct Session<P = FsProbe> {
    name: String,
    default_name: String,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,

    tool_extractor: ToolExtractor,
    error_extractor: ErrorExtractor,
    decision_extractor: DecisionExtractor,
    milestone_ids: IdSequence,
    file_deriver: FileChangeDeriver<P>,

    tool_usages: Vec<ToolUsage>,
    file_modifications: Vec<FileModification>,
    errors: Vec<ErrorEvent>,
    decisions: Vec<Decision>,
    milestones: Vec<Milestone>,
    metrics: SessionMetrics,
}

impl Default for Session<FsProbe> {
    fn default() -> Self {
        Self::new()
    }
}

impl Session<FsProbe> {
    /// New session whose logical clock starts now.
    pub fn new() -> Self {
        Self::with_origin(Utc::now())
    }

    /// New session whose first tool call is stamped at `origin`.
    pub fn with_origin(origin: DateTime<Utc>) -> Self {
        Self::with_probe(origin, FsProbe)
    }

    /// New session using configured defaults.
    pub fn from_config(config: &Config) -> Self {
        let mut session = Self::new();
        session.apply_config(config);
        session.name = session.default_name.clone();
        session
    }

    /// Rebuild a session from a persisted report with default configuration.
    pub fn restore(report: SessionReport) -> Self {
        Self::restore_with_config(report, &Config::default())
    }

    /// Rebuild a session from a persisted report.
    ///
    /// Identifier counters resume after the highest id in each collection and
    /// the logical clock resumes one tick after the latest tool call. The
    /// configured name is what [`Session::reset`] falls back to, and
    /// configured extra file tools apply to later loads.
    pub fn restore_with_config(report: SessionReport, config: &Config) -> Self {
        let origin = report
            .tool_usages
            .iter()
            .map(|u| u.timestamp)
            .max()
            .map(|last| last + Duration::seconds(1))
            .unwrap_or_else(Utc::now);

        let mut session = Self::with_origin(origin);
        session.apply_config(config);
        for error in &report.errors {
            session.error_extractor.observe_id(&error.error_id);
        }
        for decision in &report.decisions {
            session.decision_extractor.observe_id(&decision.decision_id);
        }
        for milestone in &report.milestones {
            session.milestone_ids.observe(&milestone.milestone_id);
        }

        session.name = report.session_name;
        session.tool_usages = report.tool_usages;
        session.file_modifications = report.file_modifications;
        session.errors = report.errors;
        session.decisions = report.decisions;
        session.milestones = report.milestones;
        session.metrics = report.metrics;

        tracing::info!(
            session = %session.name,
            tool_usages = session.tool_usages.len(),
            errors = session.errors.len(),
            "restored session from report"
        );
        session
    }

    fn apply_config(&mut self, config: &Config) {
        self.default_name = config.session.name.clone();
        self.file_deriver = FileChangeDeriver::new()
            .with_extra_write_tools(config.extraction.extra_file_tools.iter().cloned());
    }
}

impl<P: PathProbe> Session<P> {
    /// New session with a custom filesystem probe for created/edited checks.
    pub fn with_probe(origin: DateTime<Utc>, probe: P) -> Self {
        Self {
            name: DEFAULT_SESSION_NAME.to_string(),
            default_name: DEFAULT_SESSION_NAME.to_string(),
            start_time: None,
            end_time: None,
            tool_extractor: ToolExtractor::new(origin),
            error_extractor: ErrorExtractor::new(),
            decision_extractor: DecisionExtractor::new(),
            milestone_ids: IdSequence::new("MS"),
            file_deriver: FileChangeDeriver::with_probe(probe),
            tool_usages: Vec::new(),
            file_modifications: Vec::new(),
            errors: Vec::new(),
            decisions: Vec::new(),
            milestones: Vec::new(),
            metrics: SessionMetrics::default(),
        }
    }

    // ============================================
    // Loading
    // ============================================

    /// Run every extractor over `content` and append the results.
    pub fn load_content(&mut self, content: &str) -> LoadResult {
        let extraction = self.tool_extractor.extract(content);
        let file_mods = self.file_deriver.from_tool_usages(&extraction.usages);

        let observed_at = self.tool_extractor.now();
        let errors = self.error_extractor.extract(content, observed_at);
        let decisions = self.decision_extractor.extract(content, observed_at);

        let result = LoadResult {
            notation: extraction.notation,
            tool_usages: extraction.usages.len(),
            file_modifications: file_mods.len(),
            errors: errors.len(),
            decisions: decisions.len(),
        };

        self.tool_usages.extend(extraction.usages);
        self.file_modifications.extend(file_mods);
        self.errors.extend(errors);
        self.decisions.extend(decisions);

        tracing::info!(
            session = %self.name,
            notation = ?result.notation,
            tool_usages = result.tool_usages,
            errors = result.errors,
            decisions = result.decisions,
            "loaded content"
        );
        result
    }

    /// Load a transcript file. A missing file is [`Error::LogNotFound`].
    pub fn load_log_file(&mut self, path: &Path) -> Result<LoadResult> {
        let content = ingest::read_text(path)?;
        Ok(self.load_content(&content))
    }

    /// Append per-file line counts from a unified diff.
    pub fn load_diff(&mut self, diff: &str) -> usize {
        let mods = from_unified_diff(diff, self.tool_extractor.now());
        let count = mods.len();
        self.file_modifications.extend(mods);
        count
    }

    /// Load a unified diff from a file.
    pub fn load_diff_file(&mut self, path: &Path) -> Result<usize> {
        let diff = ingest::read_text(path)?;
        Ok(self.load_diff(&diff))
    }

    // ============================================
    // Manual inserts
    // ============================================

    /// Insert a milestone, assigning it the next `MS_` id.
    pub fn insert_milestone(&mut self, mut milestone: Milestone) -> Result<String> {
        if milestone.title.trim().is_empty() {
            return Err(Error::InvalidRecord("milestone title must not be empty".to_string()));
        }
        milestone.milestone_id = self
            .milestone_ids
            .next_id()
            .ok_or_else(|| exhausted("milestone"))?;
        let id = milestone.milestone_id.clone();
        self.milestones.push(milestone);
        Ok(id)
    }

    /// Insert a decision, assigning it the next `DEC_` id.
    pub fn insert_decision(&mut self, mut decision: Decision) -> Result<String> {
        if decision.description.trim().is_empty() {
            return Err(Error::InvalidRecord("decision description must not be empty".to_string()));
        }
        decision.decision_id = self
            .decision_extractor
            .next_id()
            .ok_or_else(|| exhausted("decision"))?;
        let id = decision.decision_id.clone();
        self.decisions.push(decision);
        Ok(id)
    }

    /// Insert an error/solution pair, assigning it the next `ERR_` id.
    pub fn insert_error(&mut self, mut error: ErrorEvent) -> Result<String> {
        if error.error_message.trim().is_empty() {
            return Err(Error::InvalidRecord("error message must not be empty".to_string()));
        }
        error.error_id = self
            .error_extractor
            .next_id()
            .ok_or_else(|| exhausted("error"))?;
        let id = error.error_id.clone();
        self.errors.push(error);
        Ok(id)
    }

    /// Add a milestone; `timestamp` defaults to now.
    pub fn add_milestone(
        &mut self,
        title: &str,
        description: &str,
        impact: Impact,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<String> {
        self.insert_milestone(Milestone {
            milestone_id: String::new(),
            title: title.to_string(),
            timestamp: timestamp.unwrap_or_else(Utc::now),
            description: description.to_string(),
            impact,
            related_decisions: Vec::new(),
        })
    }

    /// Add a decision; `timestamp` defaults to now.
    pub fn add_decision(
        &mut self,
        description: &str,
        category: DecisionCategory,
        rationale: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<String> {
        self.insert_decision(Decision {
            decision_id: String::new(),
            description: description.to_string(),
            timestamp: timestamp.unwrap_or_else(Utc::now),
            category,
            rationale: rationale.to_string(),
            alternatives_considered: Vec::new(),
            related_files: Vec::new(),
            outcome: String::new(),
        })
    }

    /// Add an error with its solution. Non-empty solution lines become steps.
    pub fn add_error(
        &mut self,
        message: &str,
        kind: ErrorKind,
        solution: &str,
        effective: bool,
    ) -> Result<String> {
        let solution_steps = solution
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        self.insert_error(ErrorEvent {
            error_id: String::new(),
            kind,
            error_message: message.to_string(),
            timestamp: Utc::now(),
            solution: solution.to_string(),
            solution_steps,
            effective,
            recurred: false,
            related_tools: Vec::new(),
        })
    }

    // ============================================
    // Session info
    // ============================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Explicit session bounds; used for duration only when both are set.
    pub fn set_time_range(&mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) {
        self.start_time = start;
        self.end_time = end;
    }

    pub fn tool_usages(&self) -> &[ToolUsage] {
        &self.tool_usages
    }

    pub fn file_modifications(&self) -> &[FileModification] {
        &self.file_modifications
    }

    pub fn errors(&self) -> &[ErrorEvent] {
        &self.errors
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    /// Metrics from the last [`Session::calculate_metrics`] call.
    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    // ============================================
    // Aggregation
    // ============================================

    fn metrics_input(&self) -> MetricsInput<'_> {
        MetricsInput {
            tool_usages: &self.tool_usages,
            file_modifications: &self.file_modifications,
            errors: &self.errors,
            decisions: &self.decisions,
            milestones: &self.milestones,
            start: self.start_time,
            end: self.end_time,
        }
    }

    /// Recompute and store metrics.
    pub fn calculate_metrics(&mut self) -> SessionMetrics {
        self.metrics = calculate_metrics(&self.metrics_input());
        self.metrics.clone()
    }

    /// Snapshot of all records with freshly computed metrics.
    pub fn report(&self) -> SessionReport {
        SessionReport {
            session_name: self.name.clone(),
            metrics: calculate_metrics(&self.metrics_input()),
            tool_usages: self.tool_usages.clone(),
            file_modifications: self.file_modifications.clone(),
            errors: self.errors.clone(),
            decisions: self.decisions.clone(),
            milestones: self.milestones.clone(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary::new(&self.name, &calculate_metrics(&self.metrics_input()))
    }

    pub fn tool_stats(&self) -> ToolStats {
        tool_stats(&self.tool_usages)
    }

    /// Payload for a renderer in the requested format.
    pub fn payload(&self, format: ReportFormat) -> ReportPayload {
        match format {
            ReportFormat::Json => ReportPayload::Full(Box::new(self.report())),
            ReportFormat::Summary => ReportPayload::Summary(self.summary()),
            ReportFormat::Stats => ReportPayload::Stats(self.tool_stats()),
        }
    }

    /// Drop every record, zero the metrics, and restart all counters.
    pub fn reset(&mut self) {
        self.tool_usages.clear();
        self.file_modifications.clear();
        self.errors.clear();
        self.decisions.clear();
        self.milestones.clear();
        self.metrics = SessionMetrics::default();

        self.tool_extractor.reset();
        self.error_extractor.reset();
        self.decision_extractor.reset();
        self.milestone_ids.reset();

        self.name = self.default_name.clone();
        self.start_time = None;
        self.end_time = None;

        tracing::debug!("session reset");
    }
}

fn exhausted(kind: &str) -> Error {
    Error::InvalidRecord(format!("no {} identifiers left in this session", kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModificationKind;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    /// Probe where nothing exists, so writes are always "created".
    struct NothingExists;

    impl PathProbe for NothingExists {
        fn exists(&self, _path: &str) -> bool {
            false
        }
    }

    fn session() -> Session<NothingExists> {
        Session::with_probe(t0(), NothingExists)
    }

    const LOG: &str = r#"
Starting session...
<invoke name="read_file">
<parameter name="target_file">main.py</parameter>
</invoke>
<invoke name="write">
<parameter name="file_path">output.py</parameter>
<parameter name="contents">print("a")
print("b")</parameter>
</invoke>
ModuleNotFoundError: No module named 'requests'
We decided to pin the dependency version.
"#;

    #[test]
    fn test_new_session_is_empty() {
        let session = session();
        assert_eq!(session.name(), "Session");
        assert!(session.tool_usages().is_empty());
        assert_eq!(session.metrics(), &SessionMetrics::default());
    }

    #[test]
    fn test_load_content_pipeline() {
        let mut session = session();
        let result = session.load_content(LOG);

        assert_eq!(result.notation, Some(Notation::InvokeTag));
        assert_eq!(result.tool_usages, 2);
        assert_eq!(result.file_modifications, 1);
        assert!(result.errors >= 1);
        assert_eq!(result.decisions, 1);

        let modification = &session.file_modifications()[0];
        assert_eq!(modification.file_path, "output.py");
        assert_eq!(modification.kind, ModificationKind::Created);
        assert_eq!(modification.lines_added, 2);
        assert_eq!(session.errors()[0].kind, ErrorKind::Dependency);
    }

    #[test]
    fn test_ids_continue_across_loads_and_manual_inserts() {
        let mut session = session();
        session.load_content("Exit code: 1");
        let manual = session
            .add_error("disk full", ErrorKind::Runtime, "freed space", true)
            .unwrap();
        session.load_content("Exit code: 2");

        let ids: Vec<&str> = session.errors().iter().map(|e| e.error_id.as_str()).collect();
        assert_eq!(ids, vec!["ERR_0001", "ERR_0002", "ERR_0003"]);
        assert_eq!(manual, "ERR_0002");
    }

    #[test]
    fn test_manual_inserts() {
        let mut session = session();
        let ms = session.add_milestone("Tests green", "", Impact::Major, Some(t0())).unwrap();
        let dec = session
            .add_decision("Use SQLite", DecisionCategory::Architecture, "simple", None)
            .unwrap();
        let err = session
            .add_error("build failed", ErrorKind::Build, "cargo clean\n\ncargo build", false)
            .unwrap();

        assert_eq!(ms, "MS_0001");
        assert_eq!(dec, "DEC_0001");
        assert_eq!(err, "ERR_0001");
        assert_eq!(session.errors()[0].solution_steps, vec!["cargo clean", "cargo build"]);

        let metrics = session.calculate_metrics();
        assert_eq!(metrics.milestones_achieved, 1);
        assert_eq!(metrics.decisions_made, 1);
        assert_eq!(metrics.errors_encountered, 1);
        assert_eq!(metrics.errors_resolved, 0);
    }

    #[test]
    fn test_manual_insert_rejects_empty_text() {
        let mut session = session();
        let err = session.add_milestone("  ", "", Impact::Minor, None).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord(_)));
        assert!(session.milestones().is_empty());
    }

    #[test]
    fn test_load_diff() {
        let mut session = session();
        let count = session.load_diff("diff --git a/x b/x\n+a\n+b\n-c");
        assert_eq!(count, 1);

        let metrics = session.calculate_metrics();
        assert_eq!(metrics.total_lines_added, 2);
        assert_eq!(metrics.total_lines_removed, 1);
        assert_eq!(metrics.files_edited, 1);
    }

    #[test]
    fn test_load_log_file_missing() {
        let mut session = session();
        let err = session.load_log_file(Path::new("/nonexistent/log.txt")).unwrap_err();
        assert!(matches!(err, Error::LogNotFound(_)));
    }

    #[test]
    fn test_explicit_time_range() {
        let mut session = session();
        session.load_content(LOG);
        session.set_time_range(Some(t0()), Some(t0() + Duration::minutes(45)));
        assert_eq!(session.calculate_metrics().duration_minutes, 45.0);
    }

    #[test]
    fn test_reset() {
        let mut session = session();
        session.set_name("Busy");
        session.load_content(LOG);
        session.add_milestone("Done", "", Impact::Minor, None).unwrap();
        session.calculate_metrics();

        session.reset();

        assert_eq!(session.name(), "Session");
        assert!(session.tool_usages().is_empty());
        assert!(session.file_modifications().is_empty());
        assert!(session.errors().is_empty());
        assert!(session.decisions().is_empty());
        assert!(session.milestones().is_empty());
        assert_eq!(session.metrics(), &SessionMetrics::default());

        session.load_content("Exit code: 1");
        assert_eq!(session.errors()[0].error_id, "ERR_0001");
        assert_eq!(session.tool_extractor.now(), t0());
    }

    #[test]
    fn test_summary_and_payload() {
        let mut session = session();
        session.set_name("Demo");
        session.load_content(LOG);

        let summary = session.summary();
        assert_eq!(summary.session_name, "Demo");
        assert_eq!(summary.tool_calls, 2);
        assert_eq!(summary.files_touched, 1);

        match session.payload(ReportFormat::Stats) {
            ReportPayload::Stats(stats) => assert_eq!(stats.total_calls, 2),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_restore_resumes_counters() {
        let mut original = Session::with_origin(t0());
        original.load_content("Exit code: 1\nWe decided to ship.");
        original.add_milestone("Alpha", "", Impact::Minor, Some(t0())).unwrap();
        let report = original.report();

        let json = report.to_json().unwrap();
        let mut restored = Session::restore(SessionReport::from_json(&json).unwrap());

        assert_eq!(restored.errors().len(), 1);
        let ms = restored.add_milestone("Beta", "", Impact::Major, None).unwrap();
        assert_eq!(ms, "MS_0002");
        let err = restored.add_error("again", ErrorKind::Runtime, "", true).unwrap();
        assert_eq!(err, "ERR_0002");
    }

    #[test]
    fn test_restore_with_max_id_rejects_insert() {
        let mut original = Session::with_origin(t0());
        original.add_milestone("Alpha", "", Impact::Minor, Some(t0())).unwrap();
        let mut report = original.report();
        report.milestones[0].milestone_id = "MS_4294967295".to_string();

        let mut restored = Session::restore(report);
        let err = restored
            .add_milestone("next", "", Impact::Minor, None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRecord(_)));
        assert_eq!(restored.milestones().len(), 1);
        assert_eq!(restored.milestones()[0].milestone_id, "MS_4294967295");
    }

    #[test]
    fn test_restore_with_config_keeps_configured_defaults() {
        let mut config = Config::default();
        config.session.name = "Sprint 12".to_string();
        config.extraction.extra_file_tools = vec!["apply_patch".to_string()];

        let mut original = Session::with_origin(t0());
        original.set_name("Saved");
        let mut restored = Session::restore_with_config(original.report(), &config);
        assert_eq!(restored.name(), "Saved");

        restored.load_content(
            r#"<invoke name="apply_patch"><parameter name="file_path">no/such/dir/new.rs</parameter></invoke>"#,
        );
        assert_eq!(restored.file_modifications().len(), 1);
        assert_eq!(restored.file_modifications()[0].tool_used, "apply_patch");

        restored.reset();
        assert_eq!(restored.name(), "Sprint 12");
    }
}
