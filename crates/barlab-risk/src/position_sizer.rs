//! Position sizing algorithms.

use barlab_core::error::ConfigError;
use barlab_core::types::Side;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Position sizing method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PositionSizingMethod {
    /// Spend a fraction of available cash, `percent` in (0, 1]
    PercentOfCash { percent: Decimal },
    /// Fixed number of units, regardless of price or cash
    Fixed { shares: Decimal },
}

impl Default for PositionSizingMethod {
    fn default() -> Self {
        PositionSizingMethod::PercentOfCash { percent: dec!(0.5) }
    }
}

impl PositionSizingMethod {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            PositionSizingMethod::PercentOfCash { percent } => {
                if *percent <= Decimal::ZERO || *percent > Decimal::ONE {
                    return Err(ConfigError::invalid(
                        "sizer.percent",
                        format!("must be in (0, 1], got {percent}"),
                    ));
                }
            }
            PositionSizingMethod::Fixed { shares } => {
                if *shares <= Decimal::ZERO || !shares.fract().is_zero() {
                    return Err(ConfigError::invalid(
                        "sizer.shares",
                        format!("must be a positive whole number, got {shares}"),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        match self {
            PositionSizingMethod::PercentOfCash { .. } => "percent_of_cash",
            PositionSizingMethod::Fixed { .. } => "fixed",
        }
    }
}

/// Position sizer calculates the order quantity for an intent.
///
/// Affordability is not checked here; the broker rejects orders the
/// portfolio cannot pay for.
#[derive(Debug, Clone, Default)]
pub struct PositionSizer {
    method: PositionSizingMethod,
}

impl PositionSizer {
    /// Create a new position sizer.
    pub fn new(method: PositionSizingMethod) -> Self {
        Self { method }
    }

    pub fn method(&self) -> &PositionSizingMethod {
        &self.method
    }

    /// Calculate position size in whole units (never negative).
    ///
    /// The percent-of-cash sizer only sizes buys: for a sell it returns the
    /// whole current position. The fixed sizer returns its constant for both.
    pub fn size(&self, cash: Decimal, price: Decimal, side: Side, current_position: Decimal) -> Decimal {
        let size = match (&self.method, side) {
            (PositionSizingMethod::Fixed { shares }, _) => *shares,
            (PositionSizingMethod::PercentOfCash { .. }, Side::Sell) => current_position,
            (PositionSizingMethod::PercentOfCash { percent }, Side::Buy) => {
                if price <= Decimal::ZERO || cash <= Decimal::ZERO {
                    Decimal::ZERO
                } else {
                    // A quotient beyond Decimal's range cannot be traded; size it as zero
                    cash.checked_mul(*percent)
                        .and_then(|budget| budget.checked_div(price))
                        .unwrap_or(Decimal::ZERO)
                }
            }
        };

        // Round down to whole shares
        let size = size.floor().max(Decimal::ZERO);
        trace!(method = self.method.name(), %side, %cash, %price, %size, "sized order");
        size
    }
}
