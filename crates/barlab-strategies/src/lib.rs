//! Strategy logic for the backtesting engine.
//!
//! Strategies are not separate types. One [`DecisionEngine`] runs a
//! flat/long state machine whose entry and exit predicates are
//! [`Rule`] policy objects built from configuration:
//! - Presets mirroring common crossover + RSI systems
//! - Custom rule trees (`all` / `any` of primitive rules)
//! - Optional [`SignalFilter`]s gating entries (ATR volatility band)

mod config;
mod decision;
mod filter;
mod presets;
mod registry;
mod rules;

pub use config::StrategyConfig;
pub use decision::{DecisionEngine, PositionState};
pub use filter::{AtrBandFilter, SignalFilter};
pub use presets::StrategyRules;
pub use registry::{StrategyInfo, StrategyRegistry};
pub use rules::{
    AllOf, AnyOf, CloseVsTrend, Cross, MarketContext, RsiThreshold, Rule, RuleSpec, ThresholdOp,
};
