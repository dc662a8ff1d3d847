//! # sessiondoc-core
//!
//! Core library for sessiondoc - turns AI coding-session transcripts into
//! structured documentation records.
//!
//! This library provides:
//! - Domain types for tool calls, file changes, errors, decisions and milestones
//! - Text extractors that recognize those events in raw transcripts and diffs
//! - Session metrics and tool usage statistics
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Source text:** transcript and diff files on disk (never modified)
//! - **Events:** records produced by the extractors and owned by a [`Session`]
//! - **Derived:** metrics and statistics computed on demand (regenerable)
//!
//! ## Example
//!
//! ```rust,no_run
//! use sessiondoc_core::{Config, Session};
//! use std::path::Path;
//!
//! let config = Config::load().expect("failed to load config");
//! let mut session = Session::from_config(&config);
//! session
//!     .load_log_file(Path::new("session.log"))
//!     .expect("failed to load log");
//!
//! let report = session.report();
//! println!("{}", report.to_json().expect("failed to serialize"));
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use report::{ReportFormat, ReportPayload, SessionReport, SessionSummary};
pub use session::{LoadResult, Session};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod error;
pub mod format;
pub mod ingest;
pub mod logging;
pub mod report;
pub mod session;
pub mod types;
