//! Attribute grid query tool.
//!
//! Loads the attribute tables of the feature layers listed in a session
//! config and filters them the way the map's attribute grid does:
//! - Paged download of every layer's attribute table
//! - Extent filtering through the feature service's spatial query
//! - Free-text search over the grid's visible fields or all fields

mod config;
mod session;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use filter_engine::FilterOptions;
use map_common::{Extent, GridMode};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::SessionConfig;
use session::Session;

#[derive(Parser, Debug)]
#[command(name = "grid-query")]
#[command(about = "Load and filter feature layer attribute tables")]
struct Cli {
    /// Session configuration (YAML)
    #[arg(long, env = "GRID_QUERY_CONFIG", default_value = "grid-query.yaml", global = true)]
    config: PathBuf,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the attribute tables and report record counts
    Load {
        /// Layer to load (repeatable; default: all configured)
        #[arg(short, long)]
        layer: Vec<String>,
    },

    /// Download the attribute tables, then filter them
    Filter {
        /// Layer to filter (repeatable; default: all configured)
        #[arg(short, long)]
        layer: Vec<String>,

        /// Extent as minx,miny,maxx,maxy
        #[arg(long, value_parser = Extent::parse, allow_hyphen_values = true)]
        extent: Option<Extent>,

        /// Spatial reference of --extent
        #[arg(long)]
        wkid: Option<u32>,

        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,

        /// Active grid: summary or full
        #[arg(long, default_value = "summary")]
        grid_mode: GridMode,

        /// Search every attribute field instead of the grid's visible ones
        #[arg(long)]
        all_fields: bool,
    },
}

fn init_tracing(level: &str, json: bool) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries the JSON report
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json)?;

    let config = SessionConfig::from_file(&cli.config)?;
    info!(
        config = %cli.config.display(),
        layers = config.layers.len(),
        "Starting grid query session"
    );

    let session = Session::new(&config)?;
    let logger = session.spawn_event_logger();

    match cli.command {
        Commands::Load { layer } => {
            let layers = config.select_layers(&layer)?;
            let reports = session.load_all(&layers).await;
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Commands::Filter {
            layer,
            extent,
            wkid,
            search,
            grid_mode,
            all_fields,
        } => {
            let layers = config.select_layers(&layer)?;
            session.load_all(&layers).await;

            let options = FilterOptions {
                extent: match (extent, wkid) {
                    (Some(e), Some(wkid)) => Some(e.with_wkid(wkid)),
                    (e, _) => e,
                },
                grid_mode,
                text_search: search,
                visible_attribs_only: !all_fields,
            };
            let results = session.filter(&layers, &options).await;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    drop(session);
    logger.await.ok();
    Ok(())
}
