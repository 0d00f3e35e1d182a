/// Configuration schema and defaults for tunedash.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[backend]`, `[web]`, `[predict]`, and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level tunedash configuration.
///
/// Maps directly to the `~/.tunedash/config.toml` and `.tunedash.toml` file
/// schemas. Missing sections and fields fall back to built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TunedashConfig {
    pub backend: BackendConfig,
    pub web: WebConfig,
    pub predict: PredictConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Connection settings for the statistics / prediction backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend HTTP API, without a trailing `/api`.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Embedded dashboard server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address for `tunedash serve`.
    pub addr: String,
    /// Open the dashboard in the default browser on startup.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [predict]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictConfig {
    /// Platform sent when the form leaves it blank.
    pub default_platform: String,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            default_platform: "Spotify".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Diagnostic log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Diagnostic logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether diagnostics are written at all.
    pub enabled: bool,
    /// Path to the JSONL diagnostics file. `~` is expanded to the home directory.
    pub path: String,
    /// Minimum level that gets recorded.
    pub level: LogLevel,
    /// Echo warnings and errors to stderr.
    pub echo_stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.tunedash/diagnostics.jsonl".to_string(),
            level: LogLevel::Info,
            echo_stderr: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl TunedashConfig {
    /// Generate the annotated default TOML config file content.
    ///
    /// Used by `tunedash config init` to create a starting config file with
    /// all settings documented.
    pub fn default_toml() -> String {
        r#"# tunedash Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (TUNEDASH_*)
#   2. Project config (.tunedash.toml in current directory)
#   3. User global config (~/.tunedash/config.toml)
#   4. Built-in defaults

[backend]
base_url = "http://localhost:5000"   # Statistics + prediction API
timeout_ms = 10000

[web]
addr = "127.0.0.1:9747"
open_browser = true

[predict]
default_platform = "Spotify"

[logging]
enabled = true
path = "~/.tunedash/diagnostics.jsonl"
level = "info"                       # debug | info | warn | error
echo_stderr = true
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
