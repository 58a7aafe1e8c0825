//! Engine configuration.
//!
//! Every section has a `Default` and deserializes with `#[serde(default)]`, so a config file only
//! needs to name the values it overrides:
//!
//! ```rust
//! use doc_engine::EngineConfig;
//!
//! let json = r#"{ "tokenizer": { "max_run_length": 64 } }"#;
//! let config = EngineConfig::from_json_str(json).unwrap();
//! assert_eq!(config.tokenizer.max_run_length, 64);
//! assert_eq!(config.tokenizer.max_scan_columns, 10_000);
//! assert_eq!(config.runtime.tick_interval_ms, 10);
//! ```

use crate::buffer::DEFAULT_MAX_UNDO;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration shared by the runtime and every document it hosts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Runtime thread and event loop.
    pub runtime: RuntimeConfig,
    /// Syntax token extraction bounds.
    pub tokenizer: TokenizerConfig,
    /// Fold-region scan bounds.
    pub folding: FoldingConfig,
    /// Indentation widths.
    pub indent: IndentConfig,
    /// Undo history.
    pub history: HistoryConfig,
}

/// Runtime thread settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Interval between posted-event drains, in milliseconds.
    pub tick_interval_ms: u64,
    /// How long `initialize()` waits for the runtime to report running, in milliseconds.
    pub start_timeout_ms: u64,
    /// Name given to the runtime thread.
    pub thread_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
            start_timeout_ms: 5_000,
            thread_name: "doc-engine-runtime".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Tick interval as a `Duration`.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Start timeout as a `Duration`.
    pub fn start_timeout(&self) -> Duration {
        Duration::from_millis(self.start_timeout_ms)
    }
}

/// Bounds for [`Tokenizer`](crate::Tokenizer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Columns scanned per line; the rest of a longer line produces no tokens.
    pub max_scan_columns: usize,
    /// Longest token emitted; longer runs are split.
    pub max_run_length: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            max_scan_columns: 10_000,
            max_run_length: 1_000,
        }
    }
}

/// Bounds for [`FoldScanner`](crate::FoldScanner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldingConfig {
    /// Lines scanned for fold starts.
    pub max_lines: usize,
}

impl Default for FoldingConfig {
    fn default() -> Self {
        Self { max_lines: 50_000 }
    }
}

/// Indentation widths used by [`IndentManager`](crate::IndentManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndentConfig {
    /// Columns a tab counts for when measuring indentation.
    pub tab_width: usize,
    /// Columns per structural indent level.
    pub indent_width: usize,
}

impl Default for IndentConfig {
    fn default() -> Self {
        Self {
            tab_width: 4,
            indent_width: 4,
        }
    }
}

/// Undo history limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum undo steps (edit groups); the oldest whole groups are dropped first.
    pub max_undo: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_undo: DEFAULT_MAX_UNDO,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            (self.runtime.tick_interval_ms, "runtime.tick_interval_ms"),
            (self.runtime.start_timeout_ms, "runtime.start_timeout_ms"),
            (
                self.tokenizer.max_scan_columns as u64,
                "tokenizer.max_scan_columns",
            ),
            (
                self.tokenizer.max_run_length as u64,
                "tokenizer.max_run_length",
            ),
            (self.indent.tab_width as u64, "indent.tab_width"),
            (self.indent.indent_width as u64, "indent.indent_width"),
            (self.history.max_undo as u64, "history.max_undo"),
        ];
        for (value, name) in checks {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be greater than 0")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.runtime.tick_interval(), Duration::from_millis(10));
        assert_eq!(config.tokenizer.max_scan_columns, 10_000);
        assert_eq!(config.tokenizer.max_run_length, 1_000);
        assert_eq!(config.folding.max_lines, 50_000);
        assert_eq!(config.indent.tab_width, 4);
        assert_eq!(config.history.max_undo, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{ "runtime": { "tick_interval_ms": 25 } }"#).unwrap();
        assert_eq!(config.runtime.tick_interval_ms, 25);
        assert_eq!(config.runtime.start_timeout_ms, 5_000);
        assert_eq!(config.folding, FoldingConfig::default());
    }

    #[test]
    fn test_zero_values_are_rejected() {
        let err = EngineConfig::from_json_str(r#"{ "indent": { "tab_width": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("indent.tab_width")));

        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        let mut config = EngineConfig::default();
        config.folding.max_lines = 10;
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        assert_eq!(EngineConfig::from_path(&path).unwrap(), config);
    }
}
