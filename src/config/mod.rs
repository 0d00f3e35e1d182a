/// Configuration system for tunedash.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — hardcoded in [`schema::TunedashConfig::default()`]
/// 2. **User global config** — `~/.tunedash/config.toml`
/// 3. **Project local config** — `.tunedash.toml` in the current working directory
/// 4. **Environment variables** — `TUNEDASH_*` overrides (highest precedence)
///
/// File layers merge key by key, so a project file only needs the keys it
/// changes; environment variables then override individual fields.
///
/// # Usage
///
/// ```rust,ignore
/// use tunedash::config;
///
/// let cfg = config::load();
/// let client = BackendClient::from_config(&cfg.backend);
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::TunedashConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved tunedash configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> TunedashConfig {
    let mut merged = toml::Value::Table(toml::Table::new());

    // Layers 2 and 3: ~/.tunedash/config.toml, then ./.tunedash.toml
    for path in [global_config_path(), project_config_path()] {
        if let Some(layer) = read_layer(path) {
            merge_values(&mut merged, layer);
        }
    }

    let mut config: TunedashConfig = merged.try_into().unwrap_or_default();

    // Layer 4: environment variable overrides
    apply_env_overrides(&mut config);

    config
}

/// Read one TOML layer as a raw value tree.
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content doesn't fit the schema. A broken config file must not stop the
/// dashboard from starting.
fn read_layer(path: Option<PathBuf>) -> Option<toml::Value> {
    let content = fs::read_to_string(path?).ok()?;
    let value: toml::Value = toml::from_str(&content).ok()?;
    value.clone().try_into::<TunedashConfig>().ok()?;
    Some(value)
}

/// Overlay `overlay` onto `base` key by key, descending into tables.
///
/// Keys the overlay doesn't mention keep their value from `base`.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) if existing.is_table() && value.is_table() => {
                        merge_values(existing, value)
                    }
                    _ => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.tunedash/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".tunedash").join("config.toml"))
}

/// Path to the project local config: `.tunedash.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".tunedash.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

/// Expand a leading `~` in a configured path to the home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~") {
        Some(rest) => {
            let home = dirs::home_dir()?;
            let rest = rest.trim_start_matches(['/', '\\']);
            Some(if rest.is_empty() { home } else { home.join(rest) })
        }
        None => Some(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `TUNEDASH_BACKEND_URL` — backend base URL
/// - `TUNEDASH_TIMEOUT_MS` — per-request timeout
/// - `TUNEDASH_WEB_ADDR` — dashboard listen address
/// - `TUNEDASH_LOGGING` — diagnostics on/off (`1`/`true`/`yes`/`on`)
/// - `TUNEDASH_LOG_LEVEL` — `debug`, `info`, `warn`, `error`
fn apply_env_overrides(config: &mut TunedashConfig) {
    if let Ok(val) = std::env::var("TUNEDASH_BACKEND_URL")
        && !val.is_empty()
    {
        config.backend.base_url = val;
    }
    if let Ok(val) = std::env::var("TUNEDASH_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.backend.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("TUNEDASH_WEB_ADDR")
        && !val.is_empty()
    {
        config.web.addr = val;
    }
    if let Ok(val) = std::env::var("TUNEDASH_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("TUNEDASH_LOG_LEVEL")
        && let Some(level) = parse_level(&val)
    {
        config.logging.level = level;
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parse a log level string.
fn parse_level(val: &str) -> Option<schema::LogLevel> {
    match val.to_ascii_lowercase().as_str() {
        "debug" | "trace" => Some(schema::LogLevel::Debug),
        "info" => Some(schema::LogLevel::Info),
        "warn" | "warning" => Some(schema::LogLevel::Warn),
        "error" => Some(schema::LogLevel::Error),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.tunedash/config.toml`.
///
/// Creates the `~/.tunedash/` directory if it doesn't exist. Returns an
/// error if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.tunedash/ directory")?;
    }

    fs::write(&path, TunedashConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Reads the current global config layered over the defaults, updates the
/// specified key, and writes the result back. Supports dotted keys like `backend.base_url`.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    // Start from the defaults so keys the file omits can still be set
    let mut value_table =
        toml::Value::try_from(TunedashConfig::default()).context("failed to serialize defaults")?;
    if path.exists() {
        let content = fs::read_to_string(&path).context("failed to read config file")?;
        let file: toml::Value =
            toml::from_str(&content).context("failed to parse config as TOML value")?;
        merge_values(&mut value_table, file);
    }
    set_toml_value(&mut value_table, key, value)?;

    // Reject updates that would no longer deserialize (e.g. an unknown level)
    let updated =
        toml::to_string_pretty(&value_table).context("failed to serialize updated config")?;
    toml::from_str::<TunedashConfig>(&updated)
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, updated).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("empty config key segment in '{key}'");
    }

    // Navigate to the parent table
    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    // The existing value decides how the raw string is parsed
    let new_value = match table.get(leaf) {
        None => anyhow::bail!("config key not found: '{key}'"),
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_keys_the_overlay_omits() {
        let mut base: toml::Value = toml::from_str(
            "[backend]\nbase_url = \"http://a:5000\"\ntimeout_ms = 100\n[web]\nopen_browser = false\n",
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str("[backend]\ntimeout_ms = 900\n").unwrap();

        merge_values(&mut base, overlay);
        let cfg: TunedashConfig = base.try_into().unwrap();

        assert_eq!(cfg.backend.base_url, "http://a:5000");
        assert_eq!(cfg.backend.timeout_ms, 900);
        assert!(!cfg.web.open_browser);
    }

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn parse_level_handles_variants() {
        assert_eq!(parse_level("debug"), Some(schema::LogLevel::Debug));
        assert_eq!(parse_level("INFO"), Some(schema::LogLevel::Info));
        assert_eq!(parse_level("warning"), Some(schema::LogLevel::Warn));
        assert_eq!(parse_level("error"), Some(schema::LogLevel::Error));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn set_toml_value_updates_string() {
        let toml_str = r#"
[backend]
base_url = "http://localhost:5000"
"#;
        let mut root: toml::Value = toml::from_str(toml_str).unwrap();
        set_toml_value(&mut root, "backend.base_url", "http://10.0.0.2:5000").unwrap();

        let backend = root["backend"].as_table().unwrap();
        assert_eq!(backend["base_url"].as_str(), Some("http://10.0.0.2:5000"));
    }

    #[test]
    fn set_toml_value_updates_bool_and_integer() {
        let toml_str = r#"
[backend]
timeout_ms = 10000

[web]
open_browser = true
"#;
        let mut root: toml::Value = toml::from_str(toml_str).unwrap();
        set_toml_value(&mut root, "backend.timeout_ms", "2500").unwrap();
        set_toml_value(&mut root, "web.open_browser", "off").unwrap();

        assert_eq!(root["backend"]["timeout_ms"].as_integer(), Some(2500));
        assert_eq!(root["web"]["open_browser"].as_bool(), Some(false));
    }

    #[test]
    fn set_toml_value_rejects_non_numeric_integer() {
        let mut root: toml::Value = toml::from_str("[backend]\ntimeout_ms = 10\n").unwrap();
        assert!(set_toml_value(&mut root, "backend.timeout_ms", "soon").is_err());
    }

    #[test]
    fn set_toml_value_rejects_unknown_keys() {
        let mut root: toml::Value = toml::from_str("[web]\naddr = \"x\"\n").unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "value").is_err());
        assert!(set_toml_value(&mut root, "web.port", "80").is_err());
        assert!(set_toml_value(&mut root, "web..addr", "x").is_err());
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        assert_eq!(
            expand_home("/var/log/tunedash.jsonl"),
            Some(PathBuf::from("/var/log/tunedash.jsonl"))
        );
    }

    #[test]
    fn expand_home_resolves_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_home("~/.tunedash/diagnostics.jsonl"),
                Some(home.join(".tunedash").join("diagnostics.jsonl"))
            );
        }
    }

    #[test]
    fn show_effective_config_returns_toml() {
        let toml_str = show_effective_config().unwrap();
        let _: TunedashConfig = toml::from_str(&toml_str).unwrap();
    }
}
