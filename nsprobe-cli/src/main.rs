//! nsprobe CLI
//!
//! Reads the TCP/UDP socket tables of other processes by briefly switching a
//! dedicated thread into their network namespace.

use clap::Parser;
use std::process;
use tracing::Level;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod run;

use cli::Cli;
use config::ProbeConfig;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Setup logging based on verbosity, RUST_LOG wins when set
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Execute the inspection
    let result = match ProbeConfig::try_from(&cli) {
        Ok(config) => run::execute(config).await,
        Err(e) => Err(e.into()),
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("❌ Error: {e:#}");
        process::exit(1);
    }
}
