//! Rugwatch - real-time pump.fun rug-pull detector
//!
//! # WARNING
//! - Heuristic checks only: a SAFER verdict is not an endorsement.
//! - Public RPC endpoints are rate limited; use a dedicated provider
//!   for sustained watching.
//! - Always DYOR before trading.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

// Use the library crate
use rugwatch::cli::commands;
use rugwatch::config::Config;

/// Rugwatch - real-time pump.fun launch monitor with risk scoring
#[derive(Parser)]
#[command(name = "rugwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch for new token launches and score them
    Watch,

    /// Show current configuration (secrets masked)
    Config,

    /// Check RPC reachability
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rugwatch=info".parse().unwrap()),
        )
        .with_target(true)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration; invalid configuration halts before subscribing
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Watch => commands::watch(&config).await,
        Commands::Config => commands::show_config(&config),
        Commands::Health => commands::health(&config).await,
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
