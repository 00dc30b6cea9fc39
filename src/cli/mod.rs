//! CLI definitions.

pub mod commands;

use anyhow::{Context, Result};
use barlab_config::{load_config, AppConfig};
use barlab_core::types::FillPrice;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

/// Used when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG: &str = "config/default.toml";

#[derive(Parser)]
#[command(name = "barlab")]
#[command(author, version, about = "Single-asset event-driven backtesting engine")]
pub struct Cli {
    /// Configuration file path [default: config/default.toml when present]
    #[arg(short, long, global = true, env = "BARLAB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level, overrides the configuration file
    #[arg(short, long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a backtest over a CSV file of bars
    Backtest(BacktestArgs),
    /// List available strategy presets
    Strategies {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate configuration
    ValidateConfig {
        /// Print the effective configuration as TOML
        #[arg(long)]
        print: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FillPriceArg {
    Close,
    NextOpen,
}

impl From<FillPriceArg> for FillPrice {
    fn from(arg: FillPriceArg) -> Self {
        match arg {
            FillPriceArg::Close => FillPrice::Close,
            FillPriceArg::NextOpen => FillPrice::NextOpen,
        }
    }
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    /// Data file (CSV), overrides `[data] path`
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// chrono format of the CSV date column (e.g. %d.%m.%Y)
    #[arg(long)]
    pub date_format: Option<String>,

    /// Strategy preset; replaces the configured strategy with the preset's defaults
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Initial cash
    #[arg(long)]
    pub cash: Option<Decimal>,

    /// Commission rate on traded notional (0.001 = 0.1%)
    #[arg(long)]
    pub commission: Option<Decimal>,

    /// Execution price for market orders
    #[arg(long, value_enum)]
    pub fill_price: Option<FillPriceArg>,

    /// Size buys as this fraction of cash
    #[arg(long, conflicts_with = "shares")]
    pub percent: Option<Decimal>,

    /// Size buys as a fixed number of units
    #[arg(long)]
    pub shares: Option<Decimal>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Save the full report as JSON
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Write the equity curve as CSV
    #[arg(long)]
    pub equity_csv: Option<PathBuf>,

    /// Write the execution log as CSV
    #[arg(long)]
    pub executions_csv: Option<PathBuf>,

    /// Record indicators and write them as CSV
    #[arg(long)]
    pub indicators_csv: Option<PathBuf>,
}

/// Load the configuration named on the command line, or the default file
/// when present, or built-in defaults.
pub fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG).exists() => Path::new(DEFAULT_CONFIG),
        None => return Ok(AppConfig::default()),
    };
    load_config(path).with_context(|| format!("Failed to load configuration from {}", path.display()))
}
