//! Backtesting engine CLI application.

mod cli;

use anyhow::{Context, Result};
use barlab_config::{AppConfig, LogFormat};
use barlab_monitor::setup_logging;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Only a backtest needs the configuration before logging starts
    let config = match &cli.command {
        Commands::Backtest(_) => cli::load_app_config(cli.config.as_deref())?,
        _ => AppConfig::default(),
    };

    // Setup logging
    let logging = &config.logging;
    let log_level = match cli.log_level {
        Some(level) => level.as_str(),
        None => logging.level.as_str(),
    };
    let json = cli.json_logs || logging.format == LogFormat::Json;
    let _guard = setup_logging(log_level, json, logging.file.as_deref()).context("Failed to set up logging")?;

    // Execute command
    match cli.command {
        Commands::Backtest(args) => cli::commands::backtest::run(args, config),
        Commands::Strategies { json } => cli::commands::strategies::run(json),
        Commands::ValidateConfig { print } => cli::commands::validate::run(cli.config.as_deref(), print),
    }
}
