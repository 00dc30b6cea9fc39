//! Named strategy presets.

use barlab_core::error::ConfigError;
use serde::{Deserialize, Serialize};

use crate::config::StrategyConfig;
use crate::rules::RuleSpec;

/// Which entry/exit logic the decision engine runs.
///
/// Presets expand into [`RuleSpec`] trees using the thresholds of the
/// surrounding [`StrategyConfig`]; `custom` carries its own trees.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "preset", rename_all = "snake_case")]
pub enum StrategyRules {
    /// (golden cross AND rsi <= entry) OR rsi <= oversold; exit rsi >= exit
    #[default]
    CrossRsi,
    /// golden cross OR rsi >= entry; exit rsi >= exit
    CrossOrRsiFloor,
    /// golden cross OR close > trend OR rsi < oversold; exit rsi >= exit
    TrendAtr,
    Custom { entry: RuleSpec, exit: RuleSpec },
}

impl StrategyRules {
    /// Preset names selectable without extra parameters.
    pub const PRESETS: [&'static str; 3] = ["cross_rsi", "cross_or_rsi_floor", "trend_atr"];

    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name {
            "cross_rsi" => Ok(StrategyRules::CrossRsi),
            "cross_or_rsi_floor" => Ok(StrategyRules::CrossOrRsiFloor),
            "trend_atr" => Ok(StrategyRules::TrendAtr),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyRules::CrossRsi => "cross_rsi",
            StrategyRules::CrossOrRsiFloor => "cross_or_rsi_floor",
            StrategyRules::TrendAtr => "trend_atr",
            StrategyRules::Custom { .. } => "custom",
        }
    }

    /// Entry rule tree for this preset.
    pub fn entry(&self, config: &StrategyConfig) -> RuleSpec {
        let oversold = config
            .rsi_oversold
            .map(|threshold| RuleSpec::RsiAtMost { threshold });

        match self {
            StrategyRules::CrossRsi => {
                let cross = RuleSpec::all([
                    RuleSpec::GoldenCross,
                    RuleSpec::RsiAtMost {
                        threshold: config.rsi_entry_threshold,
                    },
                ]);
                match oversold {
                    Some(oversold) => RuleSpec::any([cross, oversold]),
                    None => cross,
                }
            }
            StrategyRules::CrossOrRsiFloor => RuleSpec::any([
                RuleSpec::GoldenCross,
                RuleSpec::RsiAtLeast {
                    threshold: config.rsi_entry_threshold,
                },
            ]),
            StrategyRules::TrendAtr => {
                let mut rules = vec![RuleSpec::GoldenCross, RuleSpec::CloseAboveTrend];
                if let Some(threshold) = config.rsi_oversold {
                    rules.push(RuleSpec::RsiBelow { threshold });
                }
                RuleSpec::any(rules)
            }
            StrategyRules::Custom { entry, .. } => entry.clone(),
        }
    }

    /// Exit rule tree for this preset.
    pub fn exit(&self, config: &StrategyConfig) -> RuleSpec {
        match self {
            StrategyRules::Custom { exit, .. } => exit.clone(),
            _ => RuleSpec::RsiAtLeast {
                threshold: config.rsi_exit_threshold,
            },
        }
    }

    /// Indicator requirements beyond what the rule trees reference.
    pub(crate) fn validate(&self, config: &StrategyConfig) -> Result<(), ConfigError> {
        if matches!(self, StrategyRules::TrendAtr) && config.atr_period.is_none() {
            return Err(ConfigError::MissingIndicator {
                rule: "trend_atr",
                indicator: "atr_period",
            });
        }
        Ok(())
    }
}
