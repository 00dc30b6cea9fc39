//! Streaming technical indicators.
//!
//! Every indicator here is updated one bar at a time in O(1) amortized work
//! and reports `None` while it is warming up:
//! - Moving averages (SMA)
//! - Momentum indicators (RSI, Wilder smoothing)
//! - Volatility indicators (ATR, Wilder smoothing)
//! - Crossover detection between two series
//!
//! [`IndicatorEngine`] bundles the set a strategy needs and produces one
//! [`IndicatorSnapshot`] per bar.

pub mod crossover;
pub mod engine;
pub mod momentum;
pub mod moving_average;
pub mod volatility;

pub use crossover::{tolerant_cmp, CrossDirection, CrossOver};
pub use engine::{IndicatorEngine, IndicatorSeries, IndicatorSettings, IndicatorSnapshot};
pub use momentum::Rsi;
pub use moving_average::Sma;
pub use volatility::Atr;
