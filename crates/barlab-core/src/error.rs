//! Error types for the backtesting engine.

use rust_decimal::Decimal;
use thiserror::Error;

/// Top-level error. Every variant is fatal to a run.
#[derive(Error, Debug)]
pub enum BarlabError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Invalid run parameters. Raised before the first bar is processed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Rule `{rule}` requires the `{indicator}` indicator to be configured")]
    MissingIndicator {
        rule: &'static str,
        indicator: &'static str,
    },

    #[error("Unknown strategy preset: {0}")]
    UnknownPreset(String),

    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl ConfigError {
    /// Shorthand for an invalid parameter.
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Data feed errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Bar {index}: timestamp {timestamp} does not follow previous timestamp {previous}")]
    NonMonotonicTimestamp {
        index: usize,
        previous: i64,
        timestamp: i64,
    },

    #[error("Bar {index} is malformed: {reason}")]
    MalformedBar { index: usize, reason: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("No data available")]
    NoDataAvailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Index of the offending bar, when the error is tied to one.
    pub fn bar_index(&self) -> Option<usize> {
        match self {
            DataError::NonMonotonicTimestamp { index, .. } | DataError::MalformedBar { index, .. } => {
                Some(*index)
            }
            _ => None,
        }
    }
}

/// Reasons the broker refuses an order.
///
/// Rejections are not fatal: the strategy clears its pending flag and
/// may try again on a later bar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderRejection {
    #[error("Order quantity is zero")]
    ZeroQuantity,

    #[error("Insufficient cash: required {required}, available {available}")]
    InsufficientCash { required: Decimal, available: Decimal },

    #[error("No position to close")]
    NoPosition,

    #[error("Another order is already in flight")]
    OrderInFlight,

    #[error("Order value {quantity} x {price} is outside the accounting range")]
    ValueOutOfRange { quantity: Decimal, price: Decimal },
}

/// Result type alias for fallible engine operations.
pub type BarlabResult<T> = Result<T, BarlabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_error_bar_index() {
        let err = DataError::NonMonotonicTimestamp {
            index: 7,
            previous: 20,
            timestamp: 10,
        };
        assert_eq!(err.bar_index(), Some(7));
        assert_eq!(DataError::NoDataAvailable.bar_index(), None);
    }

    #[test]
    fn test_config_error_wraps_into_top_level() {
        let err: BarlabError = ConfigError::invalid("slow_period", "must exceed fast_period").into();
        assert!(err.to_string().contains("slow_period"));
    }
}
