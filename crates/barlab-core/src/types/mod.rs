//! Core data types for the backtesting engine.

mod ohlcv;
mod order;
mod position;

pub use ohlcv::{price_to_decimal, validate_series, Bar};
pub use order::{
    ExecutionRecord, Fill, FillPrice, OrderId, OrderIntent, OrderOutcome, OrderRequest,
    OrderStatus, Rejection, Side,
};
pub use position::{Portfolio, Position};
