//! sessiondoc - CLI tool to document AI coding sessions
//!
//! This tool provides commands for:
//! - Parsing session transcripts (and optional git diffs) into a report
//! - Appending milestones to a saved report
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/sessiondoc/config.toml (~/.config/sessiondoc/config.toml)
//! - Logs: $XDG_STATE_HOME/sessiondoc/ (~/.local/state/sessiondoc/)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use sessiondoc_core::analytics::ToolStats;
use sessiondoc_core::format::format_minutes;
use sessiondoc_core::{
    Config, Error, Impact, ReportFormat, ReportPayload, Session, SessionReport, SessionSummary,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sessiondoc")]
#[command(about = "Document AI coding sessions from their transcripts")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract tool calls, file changes, errors and decisions from logs
    Parse {
        /// Session transcript files, loaded in order
        #[arg(required = true)]
        logs: Vec<PathBuf>,

        /// Unified diff (e.g. `git diff` output) with the session's changes
        #[arg(long)]
        git_diff: Option<PathBuf>,

        /// Session name (default: from config)
        #[arg(short, long)]
        name: Option<String>,

        /// Output format: json, summary or stats (default: from config)
        #[arg(short, long)]
        format: Option<String>,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Session start (RFC 3339); used with --end for the duration
        #[arg(long, requires = "end")]
        start: Option<DateTime<Utc>>,

        /// Session end (RFC 3339)
        #[arg(long, requires = "start")]
        end: Option<DateTime<Utc>>,
    },

    /// Add a milestone to a saved JSON report
    Milestone {
        /// Report written by `sessiondoc parse --format json`
        report: PathBuf,

        /// Milestone title
        title: String,

        /// Longer description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Impact: minor, major or critical
        #[arg(short, long, default_value = "minor")]
        impact: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        sessiondoc_core::logging::init(&config.logging).context("failed to initialize logging")?;

    match args.command {
        Command::Parse {
            logs,
            git_diff,
            name,
            format,
            output,
            start,
            end,
        } => cmd_parse(
            &config,
            ParseOptions {
                logs,
                git_diff,
                name,
                format,
                output,
                start,
                end,
            },
        ),
        Command::Milestone {
            report,
            title,
            description,
            impact,
        } => cmd_milestone(&config, &report, &title, &description, &impact),
    }
}

struct ParseOptions {
    logs: Vec<PathBuf>,
    git_diff: Option<PathBuf>,
    name: Option<String>,
    format: Option<String>,
    output: Option<PathBuf>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

fn cmd_parse(config: &Config, opts: ParseOptions) -> Result<()> {
    let format = match opts.format {
        Some(ref f) => f.parse::<ReportFormat>()?,
        None => config.session.report_format()?,
    };

    let mut session = Session::from_config(config);
    if let Some(name) = opts.name {
        session.set_name(name);
    }
    session.set_time_range(opts.start, opts.end);

    for path in &opts.logs {
        let result = session
            .load_log_file(path)
            .with_context(|| format!("failed to load log {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            tool_usages = result.tool_usages,
            "parsed log"
        );
    }

    if let Some(ref diff) = opts.git_diff {
        session
            .load_diff_file(diff)
            .with_context(|| format!("failed to load diff {}", diff.display()))?;
    }

    session.calculate_metrics();
    let rendered = render(&session.payload(format))?;

    match opts.output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {} report to {}", format, path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn cmd_milestone(
    config: &Config,
    report_path: &Path,
    title: &str,
    description: &str,
    impact: &str,
) -> Result<()> {
    let impact: Impact = impact.parse().map_err(Error::InvalidRecord)?;

    let json = std::fs::read_to_string(report_path)
        .with_context(|| format!("failed to read report {}", report_path.display()))?;
    let report = SessionReport::from_json(&json).context("failed to parse report")?;

    let mut session = Session::restore_with_config(report, config);
    let id = session.add_milestone(title, description, impact, None)?;
    session.calculate_metrics();

    std::fs::write(report_path, session.report().to_json()?)
        .with_context(|| format!("failed to write report {}", report_path.display()))?;

    println!("Added milestone {}: {}", id, title);
    Ok(())
}

fn render(payload: &ReportPayload) -> Result<String> {
    Ok(match payload {
        ReportPayload::Full(report) => report.to_json()?,
        ReportPayload::Summary(summary) => render_summary(summary),
        ReportPayload::Stats(stats) => render_stats(stats),
    })
}

fn render_summary(summary: &SessionSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Session: {}\n", summary.session_name));
    out.push_str(&"=".repeat(9 + summary.session_name.chars().count()));
    out.push('\n');
    out.push_str(&format!(
        "Duration:        {}\n",
        format_minutes(summary.duration_minutes)
    ));
    out.push_str(&format!("Tool calls:      {}\n", summary.tool_calls));
    out.push_str(&format!("Files touched:   {}\n", summary.files_touched));
    out.push_str(&format!(
        "Errors:          {} ({} resolved)\n",
        summary.errors, summary.errors_resolved
    ));
    out.push_str(&format!("Decisions:       {}\n", summary.decisions));
    out.push_str(&format!("Milestones:      {}", summary.milestones));
    out
}

fn render_stats(stats: &ToolStats) -> String {
    let mut out = format!("Tool usage ({} calls)\n", stats.total_calls);
    if stats.total_calls == 0 {
        out.push_str("  No tool calls found.");
        return out;
    }

    for row in &stats.by_tool {
        out.push_str(&format!(
            "  {:<28} {:>5}  {:>5.1}%\n",
            row.name, row.count, row.percentage
        ));
    }
    out.push_str("\nBy category\n");
    let rows: Vec<String> = stats
        .by_category
        .iter()
        .map(|row| {
            format!(
                "  {:<28} {:>5}  {:>5.1}%",
                row.name, row.count, row.percentage
            )
        })
        .collect();
    out.push_str(&rows.join("\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(name: &str) -> SessionSummary {
        SessionSummary {
            session_name: name.to_string(),
            duration_minutes: 59.97,
            tool_calls: 3,
            files_touched: 1,
            errors: 0,
            errors_resolved: 0,
            decisions: 2,
            milestones: 0,
        }
    }

    #[test]
    fn test_summary_underline_matches_title_width() {
        let rendered = render_summary(&summary("Überarbeitung"));
        let mut lines = rendered.lines();
        let title = lines.next().unwrap();
        let underline = lines.next().unwrap();
        assert_eq!(title, "Session: Überarbeitung");
        assert_eq!(underline.chars().count(), title.chars().count());
    }

    #[test]
    fn test_summary_rounds_up_to_hours() {
        let rendered = render_summary(&summary("Demo"));
        assert!(rendered.contains("Duration:        1h 00m"), "got:\n{rendered}");
    }

    #[test]
    fn test_stats_without_calls() {
        let rendered = render_stats(&ToolStats::default());
        assert!(rendered.contains("No tool calls found."));
    }
}
