//! Backtest command implementation.

use anyhow::{bail, Context, Result};
use barlab_backtest::{BacktestConfig, BacktestEngine, BacktestReport};
use barlab_config::AppConfig;
use barlab_data::CsvDataSource;
use barlab_risk::PositionSizingMethod;
use barlab_strategies::StrategyRegistry;
use std::path::Path;
use tracing::info;

use crate::cli::{BacktestArgs, OutputFormat};

pub fn run(args: BacktestArgs, config: AppConfig) -> Result<()> {
    let report = execute(&args, config)?;

    // Output results
    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    write_outputs(&args, &report)
}

/// Load the bars and run the configured backtest.
fn execute(args: &BacktestArgs, config: AppConfig) -> Result<BacktestReport> {
    let data_path = match args.data.as_ref().or(config.data.path.as_ref()) {
        Some(path) => path.clone(),
        None => bail!("Please provide a data file with --data (e.g. --data datas/STM.csv) or set [data] path"),
    };
    if !data_path.exists() {
        bail!("Data file '{}' does not exist", data_path.display());
    }

    let backtest_config = apply_overrides(args, config.backtest)?;
    info!(
        strategy = backtest_config.strategy.rules.name(),
        data = %data_path.display(),
        "Starting backtest"
    );

    let mut source = CsvDataSource::new(&data_path)?;
    if let Some(format) = args.date_format.as_ref().or(config.data.date_format.as_ref()) {
        source = source.with_date_format(format.clone());
    }

    let engine = BacktestEngine::new(backtest_config).context("Invalid backtest configuration")?;
    let report = engine
        .run_source(&source)
        .with_context(|| format!("Backtest over {} failed", data_path.display()))?;
    Ok(report)
}

/// Command-line flags win over the configuration file.
fn apply_overrides(args: &BacktestArgs, mut config: BacktestConfig) -> Result<BacktestConfig> {
    if let Some(name) = &args.strategy {
        config.strategy = StrategyRegistry::new()
            .default_config(name)
            .with_context(|| format!("Available presets: {}", StrategyRegistry::new().names().join(", ")))?;
    }
    if let Some(cash) = args.cash {
        config.initial_cash = cash;
    }
    if let Some(commission) = args.commission {
        config.commission_rate = commission;
    }
    if let Some(fill_price) = args.fill_price {
        config.fill_price = fill_price.into();
    }
    if let Some(percent) = args.percent {
        config.sizer = PositionSizingMethod::PercentOfCash { percent };
    }
    if let Some(shares) = args.shares {
        config.sizer = PositionSizingMethod::Fixed { shares };
    }
    if args.indicators_csv.is_some() {
        config.record_indicators = true;
    }
    Ok(config)
}

fn write_outputs(args: &BacktestArgs, report: &BacktestReport) -> Result<()> {
    if let Some(path) = &args.save {
        write(path, report.to_json()?)?;
        info!("Results saved to {:?}", path);
    }
    if let Some(path) = &args.equity_csv {
        write(path, report.equity_to_csv())?;
    }
    if let Some(path) = &args.executions_csv {
        write(path, report.executions_to_csv()?)?;
    }
    if let Some(path) = &args.indicators_csv {
        let series = match &report.indicators {
            Some(series) => series.to_csv()?,
            None => String::new(),
        };
        write(path, series)?;
    }
    Ok(())
}

fn write(path: &Path, contents: String) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
