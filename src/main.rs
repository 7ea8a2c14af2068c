//! srpminfo - SRPM metadata lookup service
//!
//! Binary entry point: parses flags, loads configuration, starts the
//! HTTP server.

use clap::Parser;
use srpminfo::config::ConfigManager;
use srpminfo::error::SrpmResult;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "srpminfo",
    version,
    about = "Caching lookup service for SRPM metadata and upstream source digests"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, overriding the configuration file
    #[arg(long, env = "SRPMINFO_BIND")]
    bind: Option<String>,

    /// Increase log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> SrpmResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load().await?;

    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    // 0 = info, 1 = debug for the service, 2+ = debug everywhere
    let filter = match cli.verbose {
        0 => EnvFilter::new("srpminfo=info,tower_http=warn"),
        1 => EnvFilter::new("srpminfo=debug,tower_http=info"),
        _ => EnvFilter::new("debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    srpminfo::server::serve(&config).await
}
