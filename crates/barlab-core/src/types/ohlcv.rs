//! OHLCV (Open, High, Low, Close, Volume) data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// A single OHLCV observation.
/// Uses f64 for fast indicator calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume
    pub volume: f64,
    /// Open interest (futures feeds only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_interest: Option<f64>,
}

impl Bar {
    /// Create a new bar.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            open_interest: None,
        }
    }

    /// Attach open interest.
    pub fn with_open_interest(mut self, open_interest: f64) -> Self {
        self.open_interest = Some(open_interest);
        self
    }

    /// Get the timestamp as a DateTime.
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }

    /// Close price as a Decimal for accounting.
    ///
    /// Always exact for a bar that passed [`validate`](Self::validate).
    pub fn close_decimal(&self) -> Decimal {
        price_to_decimal(self.close).unwrap_or_default()
    }

    /// Open price as a Decimal for accounting.
    pub fn open_decimal(&self) -> Decimal {
        price_to_decimal(self.open).unwrap_or_default()
    }

    /// Calculate the true range (used for ATR).
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        match prev_close {
            Some(pc) => {
                let hl = self.high - self.low;
                let hc = (self.high - pc).abs();
                let lc = (self.low - pc).abs();
                hl.max(hc).max(lc)
            }
            None => self.high - self.low,
        }
    }

    /// Check that the bar is internally consistent.
    ///
    /// Prices must be finite, positive and representable as a non-zero
    /// Decimal; `low <= open, close <= high`; volume must be finite and
    /// non-negative.
    pub fn validate(&self, index: usize) -> Result<(), DataError> {
        let malformed = |reason: String| DataError::MalformedBar { index, reason };

        for (name, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(malformed(format!("{name} price {value} is not a positive number")));
            }
            if price_to_decimal(value).is_none() {
                return Err(malformed(format!("{name} price {value} is outside the accounting range")));
            }
        }
        if self.high < self.low {
            return Err(malformed(format!("high {} below low {}", self.high, self.low)));
        }
        if self.open > self.high || self.open < self.low {
            return Err(malformed(format!("open {} outside [{}, {}]", self.open, self.low, self.high)));
        }
        if self.close > self.high || self.close < self.low {
            return Err(malformed(format!("close {} outside [{}, {}]", self.close, self.low, self.high)));
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(malformed(format!("volume {} is negative or not finite", self.volume)));
        }
        Ok(())
    }

    /// Check that this bar strictly follows a bar stamped `previous`.
    pub fn check_follows(&self, previous: Option<i64>, index: usize) -> Result<(), DataError> {
        match previous {
            Some(previous) if self.timestamp <= previous => Err(DataError::NonMonotonicTimestamp {
                index,
                previous,
                timestamp: self.timestamp,
            }),
            _ => Ok(()),
        }
    }
}

/// Convert a price to Decimal.
///
/// `None` when the value is beyond Decimal's range or rounds to zero at
/// Decimal's 28-digit scale.
pub fn price_to_decimal(value: f64) -> Option<Decimal> {
    Decimal::try_from(value).ok().filter(|price| !price.is_zero())
}

/// Validate a whole sequence: every bar well-formed, timestamps strictly increasing.
pub fn validate_series(bars: &[Bar]) -> Result<(), DataError> {
    let mut previous = None;
    for (index, bar) in bars.iter().enumerate() {
        bar.validate(index)?;
        bar.check_follows(previous, index)?;
        previous = Some(bar.timestamp);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bar_true_range() {
        let bar = Bar::new(1000, 100.0, 110.0, 95.0, 105.0, 1000000.0);

        // Without previous close
        assert!((bar.true_range(None) - 15.0).abs() < 0.001);

        // With previous close that creates gap
        assert!((bar.true_range(Some(90.0)) - 20.0).abs() < 0.001);
        assert!((bar.true_range(Some(118.0)) - 23.0).abs() < 0.001);
    }

    #[test]
    fn test_bar_decimal_prices() {
        let bar = Bar::new(1, 100.5, 101.0, 99.0, 100.25, 10.0);
        assert_eq!(bar.open_decimal(), dec!(100.5));
        assert_eq!(bar.close_decimal(), dec!(100.25));
    }

    #[test]
    fn test_bar_validation() {
        assert!(Bar::new(1, 100.0, 101.0, 99.0, 100.5, 10.0).validate(0).is_ok());

        let inverted = Bar::new(1, 100.0, 99.0, 101.0, 100.0, 10.0);
        assert!(matches!(inverted.validate(3), Err(DataError::MalformedBar { index: 3, .. })));

        let nan_close = Bar::new(1, 100.0, 101.0, 99.0, f64::NAN, 10.0);
        assert!(nan_close.validate(0).is_err());

        let negative_volume = Bar::new(1, 100.0, 101.0, 99.0, 100.0, -1.0);
        assert!(negative_volume.validate(0).is_err());
    }

    #[test]
    fn test_prices_outside_decimal_range_are_malformed() {
        let huge = Bar::new(1, 1e30, 1e30, 1e30, 1e30, 10.0);
        match huge.validate(4) {
            Err(DataError::MalformedBar { index, reason }) => {
                assert_eq!(index, 4);
                assert!(reason.contains("accounting range"), "{reason}");
            }
            other => panic!("expected malformed bar, got {other:?}"),
        }

        let tiny = Bar::new(1, 1e-30, 1e-30, 1e-30, 1e-30, 10.0);
        assert!(matches!(tiny.validate(0), Err(DataError::MalformedBar { index: 0, .. })));

        assert_eq!(price_to_decimal(1e30), None);
        assert_eq!(price_to_decimal(0.0), None);
        assert_eq!(price_to_decimal(24.5), Some(dec!(24.5)));
    }

    #[test]
    fn test_series_rejects_duplicate_timestamp() {
        let bars = vec![
            Bar::new(1, 100.0, 101.0, 99.0, 100.5, 10.0),
            Bar::new(2, 100.5, 102.0, 100.0, 101.5, 10.0),
            Bar::new(2, 101.5, 103.0, 101.0, 102.5, 10.0),
        ];
        match validate_series(&bars) {
            Err(DataError::NonMonotonicTimestamp { index, previous, timestamp }) => {
                assert_eq!((index, previous, timestamp), (2, 2, 2));
            }
            other => panic!("expected non-monotonic error, got {other:?}"),
        }
    }

    #[test]
    fn test_open_interest_roundtrips_through_json() {
        let bar = Bar::new(5, 10.0, 11.0, 9.0, 10.5, 100.0).with_open_interest(42.0);
        let json = serde_json::to_string(&bar).unwrap();
        let back: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(back.open_interest, Some(42.0));
    }
}
