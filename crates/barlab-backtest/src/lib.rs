//! Backtesting engine.
//!
//! [`Simulation`] drives one bar at a time through indicators, the
//! decision engine and the broker. [`BacktestEngine`] runs a whole bar
//! sequence and produces a [`BacktestReport`].

mod engine;
mod report;
mod statistics;

pub use engine::{BacktestConfig, BacktestEngine, Simulation};
pub use report::BacktestReport;
pub use statistics::{BacktestStats, TradeRecord};
