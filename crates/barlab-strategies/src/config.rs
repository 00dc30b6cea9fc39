//! Strategy configuration.

use barlab_core::error::ConfigError;
use barlab_indicators::IndicatorSettings;
use serde::{Deserialize, Serialize};

use crate::presets::StrategyRules;

/// Configuration for the decision engine and the indicators it reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Fast SMA period
    pub fast_period: usize,
    /// Slow SMA period, must exceed the fast period
    pub slow_period: usize,
    pub rsi_period: usize,
    /// RSI level used by the entry rule of the preset
    pub rsi_entry_threshold: f64,
    /// Exit when RSI reaches this level
    pub rsi_exit_threshold: f64,
    /// Optional oversold level that triggers an entry on its own
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_oversold: Option<f64>,
    /// Long trend SMA (e.g. 200)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_period: Option<usize>,
    /// Enables the ATR volatility gate on entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atr_period: Option<usize>,
    /// Lower bound of ATR / close (defaults to 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atr_min_pct: Option<f64>,
    /// Upper bound of ATR / close (unbounded when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atr_max_pct: Option<f64>,
    pub rules: StrategyRules,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            fast_period: 5,
            slow_period: 20,
            rsi_period: 14,
            rsi_entry_threshold: 45.0,
            rsi_exit_threshold: 70.0,
            rsi_oversold: Some(35.0),
            trend_period: None,
            atr_period: None,
            atr_min_pct: None,
            atr_max_pct: None,
            rules: StrategyRules::default(),
        }
    }
}

impl StrategyConfig {
    /// Indicators the engine must maintain for this configuration.
    pub fn indicator_settings(&self) -> IndicatorSettings {
        IndicatorSettings {
            fast_period: self.fast_period,
            slow_period: self.slow_period,
            rsi_period: self.rsi_period,
            trend_period: self.trend_period,
            atr_period: self.atr_period,
        }
    }

    /// Builder-style preset selection.
    pub fn with_rules(mut self, rules: StrategyRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fast_period == 0 {
            return Err(ConfigError::invalid("fast_period", "must be greater than 0"));
        }
        if self.slow_period <= self.fast_period {
            return Err(ConfigError::invalid(
                "slow_period",
                format!(
                    "must be greater than fast_period ({} <= {})",
                    self.slow_period, self.fast_period
                ),
            ));
        }
        if self.rsi_period == 0 {
            return Err(ConfigError::invalid("rsi_period", "must be greater than 0"));
        }

        check_percent("rsi_entry_threshold", self.rsi_entry_threshold)?;
        check_percent("rsi_exit_threshold", self.rsi_exit_threshold)?;
        if let Some(oversold) = self.rsi_oversold {
            check_percent("rsi_oversold", oversold)?;
        }

        if self.trend_period == Some(0) {
            return Err(ConfigError::invalid("trend_period", "must be greater than 0"));
        }
        if self.atr_period == Some(0) {
            return Err(ConfigError::invalid("atr_period", "must be greater than 0"));
        }

        self.validate_atr_band()?;

        self.rules.validate(self)?;
        let settings = self.indicator_settings();
        self.rules.entry(self).validate(&settings)?;
        self.rules.exit(self).validate(&settings)?;
        Ok(())
    }

    fn validate_atr_band(&self) -> Result<(), ConfigError> {
        let bounds = [("atr_min_pct", self.atr_min_pct), ("atr_max_pct", self.atr_max_pct)];
        for (name, value) in bounds {
            let Some(value) = value else { continue };
            if self.atr_period.is_none() {
                return Err(ConfigError::invalid(name, "requires atr_period"));
            }
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(name, format!("must be a non-negative ratio, got {value}")));
            }
        }
        if let (Some(min), Some(max)) = (self.atr_min_pct, self.atr_max_pct) {
            if min > max {
                return Err(ConfigError::invalid(
                    "atr_min_pct",
                    format!("must not exceed atr_max_pct ({min} > {max})"),
                ));
            }
        }
        Ok(())
    }
}

fn check_percent(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(name, format!("must be in [0, 100], got {value}")))
    }
}
