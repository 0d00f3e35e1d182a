//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `tunedash activity`: day × hour listening grid
//! - `tunedash overview`: total plays, top tracks, artist playtime
//! - `tunedash skips`: most-skipped tracks
//! - `tunedash predict ...`: one prediction cycle
//! - `tunedash health`: backend reachability, config and log files
//! - `tunedash config show|init|set|reset`: configuration management

use anyhow::{Result, bail};
use colored::Colorize;

use crate::activity::HOURS_PER_DAY;
use crate::api::BackendClient;
use crate::config::{self, schema::TunedashConfig};
use crate::diagnostics::{self, Diagnostics};
use crate::overview::{self, ActivityReport, Overview, SkipTable};
use crate::predict::{Orchestrator, Resolution, SkipLikelihood, TrackQuery, format_probability};

/// Output format for data commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Effective config and a client built from it.
fn connect() -> (TunedashConfig, BackendClient) {
    let cfg = config::load();
    let client = BackendClient::from_config(&cfg.backend);
    (cfg, client)
}

// ---------------------------------------------------------------------------
// tunedash activity
// ---------------------------------------------------------------------------

/// Print plays per weekday and hour of day.
pub fn run_activity(format: OutputFormat) -> Result<()> {
    let (_, client) = connect();
    let report = overview::load_activity(&client, diagnostics::global());

    match format {
        OutputFormat::Json => print_activity_json(&report)?,
        OutputFormat::Csv => print_activity_csv(&report),
        OutputFormat::Table => print_activity_table(&report),
    }

    Ok(())
}

fn print_activity_table(report: &ActivityReport) {
    let matrix = &report.matrix;

    println!("{}", "Listening Activity by Day and Hour".bold().cyan());
    println!("{}", "=".repeat(112));

    if matrix.total() == 0 {
        println!("{}", "No listening activity recorded.".yellow());
        return;
    }

    let header: String = (0..HOURS_PER_DAY).map(|h| format!("{h:>4}")).collect();
    println!("  {:<4}{} {:>8}", "", header, "Total");
    println!("  {}", "-".repeat(110));

    let day_totals = matrix.day_totals();
    let max = matrix.max_cell();
    for ((day, row), total) in matrix.rows().zip(day_totals) {
        let cells: String = row.iter().map(|&plays| shade_cell(plays, max)).collect();
        println!("  {:<4}{} {:>8}", day.to_string(), cells, format_number(total));
    }

    println!();
    println!("  {} {}", "Total plays:".bold(), format_number(matrix.total()));
    if let Some(peak) = matrix.peak() {
        println!(
            "  {} {} {:02}:00 ({} plays)",
            "Busiest hour:".bold(),
            peak.day,
            peak.hour,
            format_number(peak.plays)
        );
    }
    if report.dropped() > 0 {
        println!(
            "  {}",
            format!("{} malformed rows skipped", report.dropped()).dimmed()
        );
    }
}

/// Fixed-width cell, brighter the closer it is to the busiest cell.
fn shade_cell(plays: u64, max: u64) -> String {
    let text = format!("{plays:>4}");
    if plays == 0 {
        return text.dimmed().to_string();
    }
    if max > 0 && plays * 4 >= max * 3 {
        text.green().bold().to_string()
    } else if max > 0 && plays * 2 >= max {
        text.green().to_string()
    } else {
        text
    }
}

fn print_activity_json(report: &ActivityReport) -> Result<()> {
    let matrix = &report.matrix;
    let value = serde_json::json!({
        "chart": matrix.chart_data(),
        "day_totals": matrix.day_totals(),
        "hour_totals": matrix.hour_totals(),
        "total": matrix.total(),
        "peak": matrix.peak().map(|p| serde_json::json!({
            "day": p.day.to_string(),
            "hour": p.hour,
            "plays": p.plays,
        })),
        "dropped": report.dropped(),
    });

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_activity_csv(report: &ActivityReport) {
    println!("day,hour,plays");
    for (day, row) in report.matrix.rows() {
        for (hour, plays) in row.iter().enumerate() {
            println!("{day},{hour},{plays}");
        }
    }
}

// ---------------------------------------------------------------------------
// tunedash overview
// ---------------------------------------------------------------------------

pub fn run_overview(format: OutputFormat) -> Result<()> {
    let (_, client) = connect();
    let stats = overview::load_overview(&client, diagnostics::global());

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Csv => print_overview_csv(&stats),
        OutputFormat::Table => print_overview_table(&stats),
    }

    Ok(())
}

fn print_overview_table(stats: &Overview) {
    println!("{}", "Listening Overview".bold().cyan());
    println!("{}", "=".repeat(60));
    println!();
    println!(
        "  {} {}",
        "Total plays:".bold(),
        format_number(stats.total_plays)
    );
    println!();

    if !stats.top_tracks.is_empty() {
        println!("{}", "Most Played Tracks".bold().cyan());
        println!("  {:<30} {:<20} {:>6}", "Track", "Artist", "Plays");
        println!("  {}", "-".repeat(58));
        for (i, track) in stats.top_tracks.iter().enumerate() {
            let line = format!(
                "  {:<30} {:<20} {:>6}",
                truncate(&track.track_name, 30),
                truncate(&track.artist, 20),
                format_number(track.play_count),
            );
            print_striped(i, &line);
        }
        println!();
    }

    if !stats.artists.is_empty() {
        println!("{}", "Artist Playtime".bold().cyan());
        println!("  {:<30} {:>10} {:>10}", "Artist", "Plays", "Hours");
        println!("  {}", "-".repeat(52));
        for (i, artist) in stats.artists.iter().enumerate() {
            let line = format!(
                "  {:<30} {:>10} {:>10.1}",
                truncate(&artist.artist, 30),
                format_number(artist.total_plays),
                artist.total_hours_played,
            );
            print_striped(i, &line);
        }
    }
}

fn print_overview_csv(stats: &Overview) {
    println!("section,name,artist,plays,hours");
    println!("total,,,{},", stats.total_plays);
    for t in &stats.top_tracks {
        println!(
            "track,{},{},{},",
            csv_field(&t.track_name),
            csv_field(&t.artist),
            t.play_count
        );
    }
    for a in &stats.artists {
        println!(
            "artist,,{},{},{:.2}",
            csv_field(&a.artist),
            a.total_plays,
            a.total_hours_played
        );
    }
}

// ---------------------------------------------------------------------------
// tunedash skips
// ---------------------------------------------------------------------------

pub fn run_skips(format: OutputFormat) -> Result<()> {
    let (_, client) = connect();
    let table = overview::load_skips(&client, diagnostics::global());

    if table.rows.is_empty() {
        println!("{}", "No skip data available.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&table)?),
        OutputFormat::Csv => print_skips_csv(&table),
        OutputFormat::Table => print_skips_table(&table),
    }

    Ok(())
}

fn print_skips_table(table: &SkipTable) {
    println!("{}", "Most Skipped Tracks".bold().cyan());
    println!("{}", "=".repeat(76));
    println!(
        "  {:<28} {:<20} {:>8} {:>7} {:>8}",
        "Track", "Artist", "Plays", "Skips", "Rate"
    );
    println!("  {}", "-".repeat(74));

    for (i, row) in table.rows.iter().enumerate() {
        let line = format!(
            "  {:<28} {:<20} {:>8} {:>7} {:>7.1}%",
            truncate(&row.track_name, 28),
            truncate(&row.artist, 20),
            format_number(row.total_plays),
            format_number(row.skips),
            row.skip_rate,
        );
        print_striped(i, &line);
    }

    println!();
    println!(
        "  {}",
        format!("{} tracks with enough plays to rank", table.count).dimmed()
    );
}

fn print_skips_csv(table: &SkipTable) {
    println!("track_name,artist,total_plays,skips,skip_rate");
    for r in &table.rows {
        println!(
            "{},{},{},{},{:.1}",
            csv_field(&r.track_name),
            csv_field(&r.artist),
            r.total_plays,
            r.skips,
            r.skip_rate
        );
    }
}

// ---------------------------------------------------------------------------
// tunedash predict
// ---------------------------------------------------------------------------

/// Run one prediction cycle. Fails when no prediction could be produced.
pub fn run_predict(query: TrackQuery, format: OutputFormat) -> Result<()> {
    let (cfg, client) = connect();
    let diagnostics = diagnostics::global().clone();
    let orchestrator = Orchestrator::new(client).with_diagnostics(diagnostics);

    let query = query.with_default_platform(&cfg.predict.default_platform);
    let settled = orchestrator.submit(&query);
    let resolution = settled.resolution();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&resolution.view())?)
        }
        OutputFormat::Csv => print_prediction_csv(resolution),
        OutputFormat::Table => print_prediction_table(resolution),
    }

    if let Some(err) = resolution.error() {
        bail!("{err}");
    }
    Ok(())
}

fn print_prediction_table(resolution: &Resolution) {
    if resolution.error().is_some() {
        return;
    }

    println!("{}", "Track Predictions".bold().cyan());
    println!("{}", "=".repeat(40));

    match (resolution.skip_probability(), resolution.skip_error()) {
        (Some(p), _) => {
            let likelihood = SkipLikelihood::from_probability(p);
            println!(
                "  {} {} {}",
                "Skip probability:".bold(),
                format_probability(p),
                format!("({})", likelihood.describe()).dimmed()
            );
        }
        (None, Some(err)) => println!("  {} {}", "Skip probability:".bold(), err.to_string().red()),
        (None, None) => {}
    }

    match (
        resolution.session_duration_minutes(),
        resolution.duration_error(),
    ) {
        (Some(m), _) => println!("  {} {m:.2} minutes", "Session duration:".bold()),
        (None, Some(err)) => println!("  {} {}", "Session duration:".bold(), err.to_string().red()),
        (None, None) => {}
    }

    if resolution.status() == "partial" {
        println!();
        println!("  {}", "One of the two predictions failed.".yellow());
    }
}

fn print_prediction_csv(resolution: &Resolution) {
    let opt = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    let err = resolution
        .error()
        .map(|e| e.to_string())
        .or_else(|| resolution.skip_error().map(|e| e.to_string()))
        .or_else(|| resolution.duration_error().map(|e| e.to_string()))
        .unwrap_or_default();

    println!("status,skip_probability,session_duration_minutes,error");
    println!(
        "{},{},{},{}",
        resolution.status(),
        opt(resolution.skip_probability()),
        opt(resolution.session_duration_minutes()),
        csv_field(&err)
    );
}

// ---------------------------------------------------------------------------
// tunedash health
// ---------------------------------------------------------------------------

/// Check backend reachability, config files and the diagnostic log.
pub fn run_health() -> Result<()> {
    println!("{}", "tunedash Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.tunedash/config.toml found"
        } else {
            "not found (run `tunedash config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".tunedash.toml found"
        } else {
            "none (optional)"
        },
    );

    let (cfg, client) = connect();
    let backend_ok = client.is_healthy();
    let backend_detail = if backend_ok {
        format!("reachable at {}", client.base_url())
    } else {
        format!("not reachable at {} (is it running?)", client.base_url())
    };
    print_health_item("Backend", backend_ok, &backend_detail);

    let log = Diagnostics::from_config(&cfg.logging);
    let log_exists = log.path().is_some_and(|p| p.exists());
    print_health_item(
        "Diagnostic log",
        log_exists,
        &if !cfg.logging.enabled {
            "disabled".to_string()
        } else if log_exists {
            format!("{} entries", log.read_entries().len())
        } else {
            "no log file yet".to_string()
        },
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<20} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// tunedash config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective tunedash Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let sources = [
        (
            "~/.tunedash/config.toml",
            config::global_config_file().is_some_and(|p| p.exists()),
        ),
        (
            ".tunedash.toml",
            config::project_config_file().is_some_and(|p| p.exists()),
        ),
    ];
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    for (name, exists) in sources {
        if exists {
            println!("  {} {}", "✓".green(), name.dimmed());
        } else {
            println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
        }
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "TUNEDASH_* environment variables".dimmed()
    );

    Ok(())
}

pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a number with comma separators for readability.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Quote a CSV field when it contains a separator, quote or newline.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn print_striped(i: usize, line: &str) {
    if i % 2 == 0 {
        println!("{line}");
    } else {
        println!("{}", line.dimmed());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("Sigur Rós", 9), "Sigur Rós");
        assert_eq!(truncate("Björk Guðmundsdóttir", 6), "Björk…");
    }

    #[test]
    fn test_csv_field() {
        assert_eq!(csv_field("Radiohead"), "Radiohead");
        assert_eq!(csv_field("Crosby, Stills & Nash"), "\"Crosby, Stills & Nash\"");
        assert_eq!(csv_field("12\" Mix"), "\"12\"\" Mix\"");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Table
        );
    }

    #[test]
    fn test_shade_cell_keeps_width() {
        colored::control::set_override(false);
        assert_eq!(shade_cell(0, 10), "   0");
        assert_eq!(shade_cell(10, 10), "  10");
        assert_eq!(shade_cell(1234, 2000), "1234");
    }
}
