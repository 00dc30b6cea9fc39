//! Risk management for the backtesting engine.
//!
//! Provides position sizing: how many whole units a buy should request.

mod position_sizer;

pub use position_sizer::{PositionSizer, PositionSizingMethod};
