use anyhow::Result;
use clap::{Parser, Subcommand};

use tunedash::cli::{self, OutputFormat};
use tunedash::predict::TrackQuery;
use tunedash::{config, diagnostics, web};

#[derive(Debug, Parser)]
#[command(name = "tunedash")]
#[command(about = "Listening-history dashboard with skip and session-length predictions")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the web dashboard
    Serve {
        /// Listen address (default: web.addr from config)
        #[arg(long)]
        addr: Option<String>,
        /// Don't open the dashboard in a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Plays per weekday and hour of day
    Activity {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Total plays, most played tracks and artist playtime
    Overview {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Most skipped tracks
    Skips {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Predict skip probability and session duration for a track
    Predict {
        /// When the track is played, e.g. 2024-03-01T14:30 (local time) or RFC 3339
        #[arg(long)]
        timestamp: String,
        #[arg(long)]
        artist: String,
        #[arg(long)]
        track: String,
        #[arg(long)]
        album: String,
        /// Defaults to predict.default_platform from config
        #[arg(long, default_value = "")]
        platform: String,
        /// Track length as M:SS or MM:SS
        #[arg(long)]
        duration: String,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Check backend reachability, config and diagnostic log
    Health,
    /// Show or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective merged configuration
    Show,
    /// Write a default ~/.tunedash/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `backend.base_url http://stats:5000`
    Set { key: String, value: String },
    /// Reset the global config file to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Serve { addr, no_browser } => {
            let cfg = config::load();
            let addr = addr.unwrap_or_else(|| cfg.web.addr.clone());
            let open = cfg.web.open_browser && !no_browser;
            let state = web::AppState::new(cfg, diagnostics::global().clone());
            web::serve(state, &addr, open)
        }
        Commands::Activity { format } => cli::run_activity(OutputFormat::from_str_opt(Some(&format))),
        Commands::Overview { format } => cli::run_overview(OutputFormat::from_str_opt(Some(&format))),
        Commands::Skips { format } => cli::run_skips(OutputFormat::from_str_opt(Some(&format))),
        Commands::Predict {
            timestamp,
            artist,
            track,
            album,
            platform,
            duration,
            format,
        } => {
            let query = TrackQuery {
                timestamp,
                artist,
                track_name: track,
                album,
                platform,
                duration,
            };
            cli::run_predict(query, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Health => cli::run_health(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
