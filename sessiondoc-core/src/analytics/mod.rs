//! Analytics module for sessiondoc
//!
//! Aggregate views over extracted events:
//! - [`metrics`]: the session-level [`SessionMetrics`](crate::types::SessionMetrics)
//! - [`stats`]: per-tool and per-category usage counts
//!
//! Everything here is a pure function of its inputs. Calling it twice on the
//! same events gives identical results.

pub mod metrics;
pub mod stats;

pub use metrics::{calculate_metrics, MetricsInput};
pub use stats::{tool_stats, ToolCount, ToolStats};
