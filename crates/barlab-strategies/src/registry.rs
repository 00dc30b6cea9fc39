//! Strategy registry for selecting presets by name.

use barlab_core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::StrategyConfig;
use crate::presets::StrategyRules;
use crate::rules::RuleSpec;

/// Information about a registered strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Preset key
    pub name: String,
    /// Strategy description
    pub description: String,
    /// Entry rule with default thresholds, human readable
    pub entry: String,
    /// Exit rule with default thresholds, human readable
    pub exit: String,
    /// Default configuration as JSON
    pub default_config: serde_json::Value,
}

/// Registry of the available strategy presets.
pub struct StrategyRegistry {
    strategies: BTreeMap<String, (StrategyInfo, StrategyConfig)>,
}

impl StrategyRegistry {
    /// Create a new strategy registry with all built-in presets.
    pub fn new() -> Self {
        let mut registry = Self {
            strategies: BTreeMap::new(),
        };

        registry.register(
            "cross_rsi",
            "Buys a golden cross while RSI is not stretched, or any oversold RSI; sells on overbought RSI",
            StrategyConfig::default(),
        );

        registry.register(
            "cross_or_rsi_floor",
            "Buys a golden cross or RSI at/above the entry level; sells on overbought RSI",
            StrategyConfig {
                rsi_entry_threshold: 35.0,
                rsi_oversold: None,
                ..StrategyConfig::default()
            }
            .with_rules(StrategyRules::CrossOrRsiFloor),
        );

        registry.register(
            "trend_atr",
            "Buys a golden cross, a close above the 200 SMA or deeply oversold RSI, \
             only while ATR is a large enough share of price; sells on overbought RSI",
            StrategyConfig {
                rsi_oversold: Some(30.0),
                trend_period: Some(200),
                atr_period: Some(14),
                atr_min_pct: Some(0.01),
                ..StrategyConfig::default()
            }
            .with_rules(StrategyRules::TrendAtr),
        );

        registry.register(
            "custom",
            "Entry and exit given as rule trees (example: golden cross in, death cross out)",
            StrategyConfig::default().with_rules(StrategyRules::Custom {
                entry: RuleSpec::GoldenCross,
                exit: RuleSpec::DeathCross,
            }),
        );

        registry
    }

    fn register(&mut self, name: &str, description: &str, config: StrategyConfig) {
        let info = StrategyInfo {
            name: name.to_string(),
            description: description.to_string(),
            entry: config.rules.entry(&config).to_string(),
            exit: config.rules.exit(&config).to_string(),
            default_config: serde_json::to_value(&config).unwrap_or_default(),
        };
        self.strategies.insert(name.to_string(), (info, config));
    }

    /// List all available strategies, sorted by name.
    pub fn list(&self) -> Vec<&StrategyInfo> {
        self.strategies.values().map(|(info, _)| info).collect()
    }

    /// Get strategy info by name.
    pub fn get(&self, name: &str) -> Option<&StrategyInfo> {
        self.strategies.get(name).map(|(info, _)| info)
    }

    /// Check if a strategy exists.
    pub fn exists(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Get all strategy names.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    /// Default configuration of a preset.
    pub fn default_config(&self, name: &str) -> Result<StrategyConfig, ConfigError> {
        self.strategies
            .get(name)
            .map(|(_, config)| config.clone())
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
