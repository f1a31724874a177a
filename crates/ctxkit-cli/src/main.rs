//! Command-line front end for ctxkit
//!
//! Runs work under signal-aware contexts and reports how it ended.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use commands::watch::{handle_watch_command, WatchCommand};
use config::WatchConfig;
use ctxkit_effects::OsSignalSource;

#[derive(Parser)]
#[command(name = "ctxkit")]
#[command(about = "ctxkit - signal-aware contexts and value composition", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = "ctxkit.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait until a signal arrives or the timeout elapses
    Watch(WatchCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = WatchConfig::load(&cli.config)?;

    let log_level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    match cli.command {
        Commands::Watch(cmd) => {
            let outcome = handle_watch_command(cmd, config, &OsSignalSource::new()).await?;
            println!("{outcome}");
        }
    }

    Ok(())
}
