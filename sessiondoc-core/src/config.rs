//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/sessiondoc/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/sessiondoc/` (~/.config/sessiondoc/)
//! - State/Logs: `$XDG_STATE_HOME/sessiondoc/` (~/.local/state/sessiondoc/)

use crate::error::{Error, Result};
use crate::report::ReportFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Session defaults
    #[serde(default)]
    pub session: SessionConfig,

    /// Extraction tweaks
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Defaults applied to new sessions and reports
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    /// Session name used when none is given
    #[serde(default = "default_session_name")]
    pub name: String,

    /// Default output format (json, summary, stats)
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: default_session_name(),
            format: default_format(),
        }
    }
}

impl SessionConfig {
    /// Parse the configured default format.
    pub fn report_format(&self) -> Result<ReportFormat> {
        self.format.parse()
    }
}

fn default_session_name() -> String {
    "Session".to_string()
}

fn default_format() -> String {
    "json".to_string()
}

/// Extraction configuration
#[derive(Debug, Deserialize, Default)]
pub struct ExtractionConfig {
    /// Extra tool names treated as whole-file writers (path in `file_path`)
    #[serde(default)]
    pub extra_file_tools: Vec<String>,
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values that serde cannot check
    pub fn validate(&self) -> Result<()> {
        self.session
            .report_format()
            .map_err(|e| Error::Config(format!("session.format: {}", e)))?;
        if self.session.name.trim().is_empty() {
            return Err(Error::Config("session.name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/sessiondoc/config.toml` (~/.config/sessiondoc/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("sessiondoc").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/sessiondoc/` (~/.local/state/sessiondoc/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("sessiondoc")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.session.name, "Session");
        assert_eq!(config.session.report_format().unwrap(), ReportFormat::Json);
        assert!(config.extraction.extra_file_tools.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[logging]
level = "debug"

[session]
name = "Sprint 12"
format = "summary"

[extraction]
extra_file_tools = ["apply_patch", "create_file"]
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.max_files, 5);
        assert_eq!(config.session.name, "Sprint 12");
        assert_eq!(config.session.report_format().unwrap(), ReportFormat::Summary);
        assert_eq!(config.extraction.extra_file_tools.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_format_rejected() {
        let config: Config = toml::from_str("[session]\nformat = \"pdf\"\n").unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\nname = \"From file\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.session.name, "From file");
    }

    #[test]
    fn test_load_from_bad_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session\nname = ").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
