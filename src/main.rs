//! buildcache - build artifact cache client
//!
//! CLI entry point that dispatches to subcommands.

use buildcache::cli::{Cli, Commands};
use buildcache::config::{BackendKind, ConfigManager};
use buildcache::error::CacheResult;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CacheResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load().await?;

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("buildcache=warn"),
        1 => EnvFilter::new("buildcache=info"),
        _ => EnvFilter::new("buildcache=debug"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    if let Some(root) = cli.http_root {
        debug!("Using HTTP cache root from command line: {}", root);
        config.cache.backend = BackendKind::Http;
        config.cache.http.root = Some(root);
    }

    match cli.command {
        Commands::Get(args) => buildcache::cli::commands::get(args, &config).await,
        Commands::Put(args) => buildcache::cli::commands::put(args, &config).await,
        Commands::Info(args) => buildcache::cli::commands::info(args, &config).await,
        Commands::Config(args) => {
            buildcache::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
