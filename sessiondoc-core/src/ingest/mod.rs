//! Extraction layer for session transcripts
//!
//! Raw transcript text (and optionally a unified diff) is fed independently
//! into four extractors. Only the tool-derived file modifications depend on
//! another extractor's output.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌────────────────────┐
//! │  Session text   │ ──► │ ToolExtractor      │ ──► FileChangeDeriver
//! │  (read_text)    │ ──► │ ErrorExtractor     │
//! │                 │ ──► │ DecisionExtractor  │
//! └─────────────────┘     └────────────────────┘
//! ┌─────────────────┐
//! │  Unified diff   │ ──► from_unified_diff
//! └─────────────────┘
//! ```
//!
//! Every extractor is total: malformed or adversarial text yields fewer
//! records, never an error. Only [`read_text`] can fail.

pub mod decisions;
pub mod errors;
pub mod files;
pub mod tools;

pub use decisions::{categorize_decision, is_decision, DecisionExtractor};
pub use errors::{categorize_error, ErrorExtractor};
pub use files::{from_unified_diff, FileChangeDeriver, FsProbe, PathProbe};
pub use tools::{Notation, ToolExtraction, ToolExtractor};

use crate::error::{Error, Result};
use std::path::Path;

/// Read a transcript or diff file as text.
///
/// Invalid UTF-8 is replaced rather than rejected. A missing file is
/// [`Error::LogNotFound`].
pub fn read_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::LogNotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path)?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                valid_up_to = e.utf8_error().valid_up_to(),
                "file is not valid UTF-8, replacing invalid bytes"
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };

    tracing::info!(path = %path.display(), bytes = text.len(), "loaded text");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_text_missing_file() {
        let err = read_text(Path::new("/nonexistent/path/log.txt")).unwrap_err();
        assert!(matches!(err, Error::LogNotFound(_)));
    }

    #[test]
    fn test_read_text_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.log");
        std::fs::write(&path, "<invoke name=\"list_dir\"></invoke>").unwrap();

        let text = read_text(&path).unwrap();
        assert!(text.contains("list_dir"));
    }

    #[test]
    fn test_read_text_replaces_invalid_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary.log");
        std::fs::write(&path, b"ok \xff\xfe done").unwrap();

        let text = read_text(&path).unwrap();
        assert!(text.starts_with("ok "));
        assert!(text.ends_with(" done"));
        assert!(text.contains('\u{FFFD}'));
    }
}
