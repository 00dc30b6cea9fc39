//! Position and portfolio types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The single-asset position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Number of units (positive for long, zero when flat)
    pub quantity: Decimal,
    /// Average entry price
    pub avg_entry_price: Decimal,
    /// Commission paid on the fills that built the position
    pub entry_commission: Decimal,
    /// Last mark price
    pub current_price: Decimal,
    /// Market value (quantity * current_price)
    pub market_value: Decimal,
    /// Unrealized profit/loss, before commissions
    pub unrealized_pnl: Decimal,
}

impl Position {
    /// A flat position.
    pub fn flat() -> Self {
        Self::default()
    }

    /// Check if this is a long position.
    pub fn is_long(&self) -> bool {
        self.quantity > Decimal::ZERO
    }

    /// Check if the position is flat (no units).
    pub fn is_flat(&self) -> bool {
        self.quantity == Decimal::ZERO
    }

    /// Cost basis (quantity * avg_entry_price).
    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.avg_entry_price
    }

    /// Update the current market price and recalculate values.
    ///
    /// Market value saturates at `Decimal::MAX` rather than overflowing.
    pub fn update_price(&mut self, price: Decimal) {
        self.current_price = price;
        self.market_value = self.quantity.saturating_mul(price);
        self.unrealized_pnl = self.market_value.saturating_sub(self.cost_basis());
    }

    /// Add to the position, re-weighting the average entry price.
    pub fn add(&mut self, quantity: Decimal, price: Decimal, commission: Decimal) {
        let new_quantity = self.quantity + quantity;
        if new_quantity != Decimal::ZERO {
            self.avg_entry_price = (self.cost_basis() + quantity * price) / new_quantity;
        }
        self.quantity = new_quantity;
        self.entry_commission += commission;
        self.update_price(price);
    }

    /// Close the whole position at `price`.
    ///
    /// Returns the realized P&L net of both entry and exit commissions.
    pub fn close(&mut self, price: Decimal, exit_commission: Decimal) -> Decimal {
        let gross = (price - self.avg_entry_price) * self.quantity;
        let realized = gross - self.entry_commission - exit_commission;
        *self = Self::flat();
        self.update_price(price);
        realized
    }
}

/// Cash, the position and derived equity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// Available cash
    pub cash: Decimal,
    /// Total equity (cash + market value of the position)
    pub equity: Decimal,
    /// The single position held
    pub position: Position,
    /// Realized P&L across all closed trades
    pub realized_pnl: Decimal,
    /// Commission paid so far
    pub total_commission: Decimal,
    /// Initial capital (for calculating returns)
    pub initial_capital: Decimal,
    /// Highest equity reached (for drawdown calculation)
    pub peak_equity: Decimal,
}

impl Portfolio {
    /// Create a new portfolio with initial cash.
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            cash: initial_capital,
            equity: initial_capital,
            position: Position::flat(),
            realized_pnl: Decimal::ZERO,
            total_commission: Decimal::ZERO,
            initial_capital,
            peak_equity: initial_capital,
        }
    }

    /// Revalue the position at `price` and recompute equity.
    pub fn mark_to_market(&mut self, price: Decimal) -> Decimal {
        self.position.update_price(price);
        self.update_equity();
        self.equity
    }

    /// Update the equity and related calculations.
    pub fn update_equity(&mut self) {
        self.equity = self.cash.saturating_add(self.position.market_value);

        // Update peak equity for drawdown calculation
        if self.equity > self.peak_equity {
            self.peak_equity = self.equity;
        }
    }

    /// Calculate current drawdown from peak, in percent.
    pub fn drawdown(&self) -> Decimal {
        if self.peak_equity == Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.peak_equity - self.equity)
            .checked_div(self.peak_equity)
            .map_or(Decimal::ZERO, |ratio| ratio * Decimal::from(100))
    }

    /// Calculate total return percentage.
    pub fn total_return(&self) -> Decimal {
        if self.initial_capital == Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.equity - self.initial_capital)
            .checked_div(self.initial_capital)
            .and_then(|ratio| ratio.checked_mul(Decimal::from(100)))
            .unwrap_or(Decimal::MAX)
    }
}
