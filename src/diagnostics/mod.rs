//! Structured diagnostics log.
//!
//! Every degraded fetch, dropped sample, failed prediction request and
//! discarded stale result is recorded as one JSON line in the configured
//! diagnostics file (default `~/.tunedash/diagnostics.jsonl`). Writing is
//! best-effort: an unwritable log never affects the caller.
//!
//! Warnings and errors are additionally echoed to stderr as
//! `[tunedash] <source>: <message>` when `logging.echo_stderr` is set.

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{self, schema::LoggingConfig};

pub use crate::config::schema::LogLevel;

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// One line of the diagnostics log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    pub timestamp: String,
    pub level: LogLevel,
    /// Component that produced the entry (e.g. `"activity"`, `"predict"`).
    pub source: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// Level-filtered JSONL writer.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    enabled: bool,
    min_level: LogLevel,
    echo_stderr: bool,
    path: Option<PathBuf>,
}

impl Diagnostics {
    pub fn from_config(cfg: &LoggingConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            min_level: cfg.level,
            echo_stderr: cfg.echo_stderr,
            path: config::expand_home(&cfg.path),
        }
    }

    /// A logger that records nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            min_level: LogLevel::Error,
            echo_stderr: false,
            path: None,
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    fn accepts(&self, level: LogLevel) -> bool {
        self.enabled && level >= self.min_level
    }

    /// Record an entry at `level`. Best-effort.
    pub fn record(
        &self,
        level: LogLevel,
        source: &str,
        message: &str,
        detail: Option<serde_json::Value>,
    ) {
        if !self.accepts(level) {
            return;
        }

        if self.echo_stderr && level >= LogLevel::Warn {
            eprintln!("[tunedash] {source}: {message}");
        }

        let entry = DiagnosticEntry {
            timestamp: Utc::now().to_rfc3339(),
            level,
            source: source.to_string(),
            message: message.to_string(),
            detail,
        };
        let _ = self.append(&entry);
    }

    pub fn debug(&self, source: &str, message: &str) {
        self.record(LogLevel::Debug, source, message, None);
    }

    pub fn info(&self, source: &str, message: &str) {
        self.record(LogLevel::Info, source, message, None);
    }

    pub fn warn(&self, source: &str, message: &str) {
        self.record(LogLevel::Warn, source, message, None);
    }

    pub fn error(&self, source: &str, message: &str) {
        self.record(LogLevel::Error, source, message, None);
    }

    /// Read back every parseable entry. Malformed lines are skipped.
    pub fn read_entries(&self) -> Vec<DiagnosticEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<DiagnosticEntry>(&line).ok())
            .collect()
    }

    fn append(&self, entry: &DiagnosticEntry) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }
}

/// Process-wide logger built from the loaded config on first use.
pub fn global() -> &'static Diagnostics {
    static GLOBAL: OnceLock<Diagnostics> = OnceLock::new();
    GLOBAL.get_or_init(|| Diagnostics::from_config(&config::load().logging))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_logger(name: &str, level: LogLevel) -> Diagnostics {
        let path = std::env::temp_dir().join(format!(
            "tunedash-diag-{name}-{}.jsonl",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        Diagnostics {
            enabled: true,
            min_level: level,
            echo_stderr: false,
            path: Some(path),
        }
    }

    #[test]
    fn records_entries_at_or_above_level() {
        let log = temp_logger("levels", LogLevel::Warn);
        log.info("activity", "ignored");
        log.warn("activity", "dropped 2 samples");
        log.error("predict", "both requests failed");

        let entries = log.read_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, LogLevel::Warn);
        assert_eq!(entries[0].source, "activity");
        assert_eq!(entries[1].message, "both requests failed");

        let _ = fs::remove_file(log.path().unwrap());
    }

    #[test]
    fn detail_round_trips() {
        let log = temp_logger("detail", LogLevel::Debug);
        log.record(
            LogLevel::Info,
            "overview",
            "fetched",
            Some(serde_json::json!({ "rows": 10 })),
        );

        let entries = log.read_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].detail.as_ref().unwrap()["rows"], 10);

        let _ = fs::remove_file(log.path().unwrap());
    }

    #[test]
    fn debug_entries_need_debug_level() {
        let log = temp_logger("debug", LogLevel::Info);
        log.debug("predict", "filtered");
        assert!(log.read_entries().is_empty());

        let log = temp_logger("debug-on", LogLevel::Debug);
        log.debug("predict", "submission 1 dispatched");
        let entries = log.read_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Debug);

        let _ = fs::remove_file(log.path().unwrap());
    }

    #[test]
    fn disabled_logger_writes_nothing() {
        let log = Diagnostics::disabled();
        log.error("web", "boom");
        assert!(log.read_entries().is_empty());
    }
}
