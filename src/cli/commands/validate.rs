//! Validate configuration command.

use anyhow::Result;
use std::path::Path;

use crate::cli::{load_app_config, DEFAULT_CONFIG};

pub fn run(config_path: Option<&Path>, print: bool) -> Result<()> {
    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG));
    println!("Validating configuration: {:?}", path);

    match load_app_config(Some(path)) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("Strategy: {}", config.backtest.strategy.rules.name());
            println!("Sizer: {}", config.backtest.sizer.name());
            println!("Initial cash: {}", config.backtest.initial_cash);
            println!("Commission rate: {}", config.backtest.commission_rate);
            if print {
                println!();
                println!("{}", config.to_toml()?);
            }
        }
        Err(e) => {
            println!("Configuration error: {:#}", e);
            return Err(e);
        }
    }

    Ok(())
}
