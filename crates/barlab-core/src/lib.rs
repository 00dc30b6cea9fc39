//! Core types and traits for the backtesting engine.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar)
//! - Order intents, requests, fills and rejections
//! - Single-asset position and portfolio accounting types
//! - Core traits for streaming indicators and data sources

pub mod types;
pub mod traits;
pub mod error;

pub use error::{BarlabError, BarlabResult, ConfigError, DataError, OrderRejection};
pub use types::*;
pub use traits::*;
