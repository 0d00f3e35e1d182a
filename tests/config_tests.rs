/// Configuration tests.
///
/// Environment overrides mutate process-wide state, so every env-dependent
/// assertion lives in a single test to avoid races with parallel tests.
use tunedash::config::{self, schema::LogLevel, schema::TunedashConfig};
use tunedash::diagnostics::Diagnostics;

#[test]
fn env_overrides_take_precedence() {
    let vars = [
        ("TUNEDASH_BACKEND_URL", "http://stats.internal:8080"),
        ("TUNEDASH_TIMEOUT_MS", "2500"),
        ("TUNEDASH_WEB_ADDR", "0.0.0.0:9000"),
        ("TUNEDASH_LOGGING", "off"),
        ("TUNEDASH_LOG_LEVEL", "warning"),
    ];
    for (k, v) in vars {
        // SAFETY: only this test touches TUNEDASH_* variables.
        unsafe { std::env::set_var(k, v) };
    }

    let cfg = config::load();
    assert_eq!(cfg.backend.base_url, "http://stats.internal:8080");
    assert_eq!(cfg.backend.timeout_ms, 2500);
    assert_eq!(cfg.web.addr, "0.0.0.0:9000");
    assert!(!cfg.logging.enabled);
    assert_eq!(cfg.logging.level, LogLevel::Warn);

    // Unparseable values leave the lower layers alone.
    unsafe {
        std::env::set_var("TUNEDASH_TIMEOUT_MS", "soon");
        std::env::set_var("TUNEDASH_LOG_LEVEL", "loud");
    }
    let cfg = config::load();
    assert_ne!(cfg.backend.timeout_ms, 0);
    assert_ne!(cfg.backend.timeout_ms, 2500);

    for (k, _) in vars {
        unsafe { std::env::remove_var(k) };
    }
}

#[test]
fn default_toml_round_trips() {
    let text = TunedashConfig::default_toml();
    let parsed: TunedashConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed.backend.base_url, "http://localhost:5000");
    assert_eq!(parsed.backend.timeout_ms, 10_000);
    assert_eq!(parsed.web.addr, "127.0.0.1:9747");
    assert_eq!(parsed.predict.default_platform, "Spotify");
    assert_eq!(parsed.logging.level, LogLevel::Info);
}

#[test]
fn partial_file_falls_back_to_defaults() {
    let parsed: TunedashConfig = toml::from_str("[backend]\ntimeout_ms = 500\n").unwrap();
    assert_eq!(parsed.backend.timeout_ms, 500);
    assert_eq!(parsed.backend.base_url, "http://localhost:5000");
    assert!(parsed.web.open_browser);
}

#[test]
fn disabled_logging_writes_nothing() {
    let mut cfg = TunedashConfig::default().logging;
    let path = std::env::temp_dir().join(format!(
        "tunedash-config-test-{}.jsonl",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    cfg.enabled = false;
    cfg.path = path.display().to_string();

    let log = Diagnostics::from_config(&cfg);
    log.error("test", "should not be written");
    assert!(!path.exists());
    assert!(log.read_entries().is_empty());
}
