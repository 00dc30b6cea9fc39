//! Entry and exit predicates.
//!
//! A [`Rule`] looks at the current bar and indicator snapshot and answers
//! yes or no. Any indicator that is still warming up makes the rule false;
//! it is never an error. Rules are built from a serializable [`RuleSpec`]
//! tree so strategies can be composed from configuration.

use std::cmp::Ordering;
use std::fmt;

use barlab_core::error::ConfigError;
use barlab_core::types::Bar;
use barlab_indicators::{tolerant_cmp, CrossDirection, IndicatorSettings, IndicatorSnapshot};
use serde::{Deserialize, Serialize};

/// What a rule gets to look at on each bar.
#[derive(Debug, Clone, Copy)]
pub struct MarketContext<'a> {
    pub bar: &'a Bar,
    pub indicators: &'a IndicatorSnapshot,
}

impl<'a> MarketContext<'a> {
    pub fn new(bar: &'a Bar, indicators: &'a IndicatorSnapshot) -> Self {
        Self { bar, indicators }
    }
}

/// Boolean predicate over the market context.
pub trait Rule: Send + Sync + fmt::Debug {
    fn evaluate(&self, ctx: &MarketContext<'_>) -> bool;
}

/// Fast SMA crossing the slow SMA in the given direction on this bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cross(pub CrossDirection);

impl Rule for Cross {
    fn evaluate(&self, ctx: &MarketContext<'_>) -> bool {
        ctx.indicators.crossover == Some(self.0)
    }
}

/// Comparison used by threshold rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdOp {
    AtMost,
    Below,
    AtLeast,
    Above,
}

impl ThresholdOp {
    pub fn compare(self, value: f64, threshold: f64) -> bool {
        match self {
            ThresholdOp::AtMost => value <= threshold,
            ThresholdOp::Below => value < threshold,
            ThresholdOp::AtLeast => value >= threshold,
            ThresholdOp::Above => value > threshold,
        }
    }
}

/// RSI compared against a fixed level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiThreshold {
    pub op: ThresholdOp,
    pub threshold: f64,
}

impl RsiThreshold {
    pub fn new(op: ThresholdOp, threshold: f64) -> Self {
        Self { op, threshold }
    }
}

impl Rule for RsiThreshold {
    fn evaluate(&self, ctx: &MarketContext<'_>) -> bool {
        ctx.indicators
            .rsi
            .is_some_and(|rsi| self.op.compare(rsi, self.threshold))
    }
}

/// Close strictly above (or below) the trend SMA, beyond rounding noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseVsTrend {
    pub above: bool,
}

impl Rule for CloseVsTrend {
    fn evaluate(&self, ctx: &MarketContext<'_>) -> bool {
        let wanted = if self.above { Ordering::Greater } else { Ordering::Less };
        ctx.indicators
            .sma_trend
            .is_some_and(|trend| tolerant_cmp(ctx.bar.close, trend) == wanted)
    }
}

/// True when every inner rule is true.
#[derive(Debug)]
pub struct AllOf(pub Vec<Box<dyn Rule>>);

impl Rule for AllOf {
    fn evaluate(&self, ctx: &MarketContext<'_>) -> bool {
        self.0.iter().all(|rule| rule.evaluate(ctx))
    }
}

/// True when at least one inner rule is true.
#[derive(Debug)]
pub struct AnyOf(pub Vec<Box<dyn Rule>>);

impl Rule for AnyOf {
    fn evaluate(&self, ctx: &MarketContext<'_>) -> bool {
        self.0.iter().any(|rule| rule.evaluate(ctx))
    }
}

/// Serializable description of a rule tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleSpec {
    GoldenCross,
    DeathCross,
    RsiAtMost { threshold: f64 },
    RsiBelow { threshold: f64 },
    RsiAtLeast { threshold: f64 },
    RsiAbove { threshold: f64 },
    CloseAboveTrend,
    CloseBelowTrend,
    All { rules: Vec<RuleSpec> },
    Any { rules: Vec<RuleSpec> },
}

impl RuleSpec {
    pub fn all(rules: impl IntoIterator<Item = RuleSpec>) -> Self {
        RuleSpec::All {
            rules: rules.into_iter().collect(),
        }
    }

    pub fn any(rules: impl IntoIterator<Item = RuleSpec>) -> Self {
        RuleSpec::Any {
            rules: rules.into_iter().collect(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            RuleSpec::GoldenCross => "golden_cross",
            RuleSpec::DeathCross => "death_cross",
            RuleSpec::RsiAtMost { .. } => "rsi_at_most",
            RuleSpec::RsiBelow { .. } => "rsi_below",
            RuleSpec::RsiAtLeast { .. } => "rsi_at_least",
            RuleSpec::RsiAbove { .. } => "rsi_above",
            RuleSpec::CloseAboveTrend => "close_above_trend",
            RuleSpec::CloseBelowTrend => "close_below_trend",
            RuleSpec::All { .. } => "all",
            RuleSpec::Any { .. } => "any",
        }
    }

    fn rsi_threshold(&self) -> Option<f64> {
        match *self {
            RuleSpec::RsiAtMost { threshold }
            | RuleSpec::RsiBelow { threshold }
            | RuleSpec::RsiAtLeast { threshold }
            | RuleSpec::RsiAbove { threshold } => Some(threshold),
            _ => None,
        }
    }

    /// Check thresholds and that every referenced indicator is configured.
    pub fn validate(&self, settings: &IndicatorSettings) -> Result<(), ConfigError> {
        if let Some(threshold) = self.rsi_threshold() {
            if !(0.0..=100.0).contains(&threshold) {
                return Err(ConfigError::invalid(
                    self.name(),
                    format!("threshold must be in [0, 100], got {threshold}"),
                ));
            }
            return Ok(());
        }

        match self {
            RuleSpec::CloseAboveTrend | RuleSpec::CloseBelowTrend if settings.trend_period.is_none() => {
                Err(ConfigError::MissingIndicator {
                    rule: self.name(),
                    indicator: "trend_period",
                })
            }
            RuleSpec::All { rules } | RuleSpec::Any { rules } => {
                if rules.is_empty() {
                    return Err(ConfigError::invalid(self.name(), "needs at least one rule"));
                }
                rules.iter().try_for_each(|rule| rule.validate(settings))
            }
            _ => Ok(()),
        }
    }

    /// Turn the description into an executable rule.
    pub fn build(&self) -> Box<dyn Rule> {
        match self {
            RuleSpec::GoldenCross => Box::new(Cross(CrossDirection::Up)),
            RuleSpec::DeathCross => Box::new(Cross(CrossDirection::Down)),
            RuleSpec::RsiAtMost { threshold } => Box::new(RsiThreshold::new(ThresholdOp::AtMost, *threshold)),
            RuleSpec::RsiBelow { threshold } => Box::new(RsiThreshold::new(ThresholdOp::Below, *threshold)),
            RuleSpec::RsiAtLeast { threshold } => Box::new(RsiThreshold::new(ThresholdOp::AtLeast, *threshold)),
            RuleSpec::RsiAbove { threshold } => Box::new(RsiThreshold::new(ThresholdOp::Above, *threshold)),
            RuleSpec::CloseAboveTrend => Box::new(CloseVsTrend { above: true }),
            RuleSpec::CloseBelowTrend => Box::new(CloseVsTrend { above: false }),
            RuleSpec::All { rules } => Box::new(AllOf(rules.iter().map(RuleSpec::build).collect())),
            RuleSpec::Any { rules } => Box::new(AnyOf(rules.iter().map(RuleSpec::build).collect())),
        }
    }
}

impl fmt::Display for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSpec::GoldenCross => write!(f, "golden cross"),
            RuleSpec::DeathCross => write!(f, "death cross"),
            RuleSpec::RsiAtMost { threshold } => write!(f, "rsi <= {threshold}"),
            RuleSpec::RsiBelow { threshold } => write!(f, "rsi < {threshold}"),
            RuleSpec::RsiAtLeast { threshold } => write!(f, "rsi >= {threshold}"),
            RuleSpec::RsiAbove { threshold } => write!(f, "rsi > {threshold}"),
            RuleSpec::CloseAboveTrend => write!(f, "close > trend sma"),
            RuleSpec::CloseBelowTrend => write!(f, "close < trend sma"),
            RuleSpec::All { rules } => write_joined(f, rules, " AND "),
            RuleSpec::Any { rules } => write_joined(f, rules, " OR "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, rules: &[RuleSpec], joiner: &str) -> fmt::Result {
    let parts: Vec<String> = rules.iter().map(RuleSpec::to_string).collect();
    write!(f, "({})", parts.join(joiner))
}
