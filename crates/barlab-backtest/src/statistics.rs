//! Backtest statistics.

use chrono::{DateTime, Utc};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use barlab_core::types::{Fill, Portfolio, Side};

/// Bars per year used to annualize returns (daily bars).
const PERIODS_PER_YEAR: f64 = 252.0;

/// Record of a single fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub commission: Decimal,
    pub bar_index: usize,
    pub timestamp: DateTime<Utc>,
    /// Realized P&L net of commissions, on closing fills
    pub pnl: Option<Decimal>,
}

impl From<&Fill> for TradeRecord {
    fn from(fill: &Fill) -> Self {
        Self {
            side: fill.side,
            quantity: fill.quantity,
            price: fill.price,
            commission: fill.commission,
            bar_index: fill.bar_index,
            timestamp: DateTime::from_timestamp_millis(fill.timestamp).unwrap_or_default(),
            pnl: fill.realized_pnl,
        }
    }
}

/// Backtest statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestStats {
    /// Initial capital
    pub initial_capital: Decimal,
    /// Final equity
    pub final_equity: Decimal,
    /// Final cash
    pub final_cash: Decimal,
    /// Total return percentage
    pub total_return_pct: Decimal,
    /// Annualized return percentage
    pub annualized_return_pct: Decimal,
    /// Maximum drawdown percentage
    pub max_drawdown_pct: Decimal,
    /// Sharpe ratio (assuming risk-free rate of 0)
    pub sharpe_ratio: f64,
    /// Sortino ratio
    pub sortino_ratio: f64,
    /// Number of closed round trips
    pub total_trades: usize,
    /// Number of winning trades
    pub winning_trades: usize,
    /// Number of losing trades
    pub losing_trades: usize,
    /// Trades closed at exactly zero net P&L
    pub breakeven_trades: usize,
    /// Win rate percentage
    pub win_rate_pct: Decimal,
    /// Average profit per winning trade
    pub avg_win: Decimal,
    /// Average loss per losing trade
    pub avg_loss: Decimal,
    /// Profit factor (gross profit / gross loss)
    pub profit_factor: Decimal,
    /// Commission paid over the run
    pub total_commission: Decimal,
    /// Orders refused by the broker
    pub rejected_orders: usize,
    /// Orders dropped without execution
    pub canceled_orders: usize,
    /// Number of bars processed
    pub bars_processed: usize,
    /// Equity curve, one point per bar
    pub equity_curve: Vec<(i64, Decimal)>,
    /// All fills
    pub trades: Vec<TradeRecord>,
    /// Peak equity (for drawdown)
    #[serde(skip)]
    peak_equity: Decimal,
    /// Per-bar returns for Sharpe calculation
    #[serde(skip)]
    returns: Vec<f64>,
}

impl BacktestStats {
    /// Create new stats tracker.
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            final_equity: initial_capital,
            final_cash: initial_capital,
            total_return_pct: Decimal::ZERO,
            annualized_return_pct: Decimal::ZERO,
            max_drawdown_pct: Decimal::ZERO,
            sharpe_ratio: 0.0,
            sortino_ratio: 0.0,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            breakeven_trades: 0,
            win_rate_pct: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            profit_factor: Decimal::ZERO,
            total_commission: Decimal::ZERO,
            rejected_orders: 0,
            canceled_orders: 0,
            bars_processed: 0,
            equity_curve: Vec::new(),
            trades: Vec::new(),
            peak_equity: initial_capital,
            returns: Vec::new(),
        }
    }

    /// Record equity at a timestamp.
    pub fn record_equity(&mut self, timestamp: i64, equity: Decimal) {
        // Track per-bar return
        if let Some((_, prev_equity)) = self.equity_curve.last() {
            if *prev_equity > Decimal::ZERO {
                let ret = (equity - *prev_equity)
                    .checked_div(*prev_equity)
                    .and_then(|ret| ret.to_f64())
                    .unwrap_or(0.0);
                self.returns.push(ret);
            }
        }

        self.equity_curve.push((timestamp, equity));

        // Update peak and drawdown
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }

        if self.peak_equity > Decimal::ZERO {
            let drawdown = (self.peak_equity - equity) / self.peak_equity * dec!(100);
            if drawdown > self.max_drawdown_pct {
                self.max_drawdown_pct = drawdown;
            }
        }

        self.bars_processed += 1;
    }

    /// Add a fill.
    pub fn add_fill(&mut self, fill: &Fill) {
        self.trades.push(TradeRecord::from(fill));
        if fill.realized_pnl.is_some() {
            self.total_trades += 1;
        }
    }

    pub fn add_rejection(&mut self) {
        self.rejected_orders += 1;
    }

    pub fn add_cancellation(&mut self) {
        self.canceled_orders += 1;
    }

    /// Calculate final statistics.
    pub fn finalize(&mut self, portfolio: &Portfolio) {
        self.final_equity = portfolio.equity;
        self.final_cash = portfolio.cash;
        self.total_commission = portfolio.total_commission;

        // Total return
        if self.initial_capital > Decimal::ZERO {
            self.total_return_pct = (self.final_equity - self.initial_capital)
                .checked_div(self.initial_capital)
                .and_then(|ratio| ratio.checked_mul(dec!(100)))
                .unwrap_or(Decimal::MAX);
        }

        // Annualized return (assuming daily bars)
        if !self.equity_curve.is_empty() {
            let periods = self.equity_curve.len() as f64;
            let total_return = self.total_return_pct.to_f64().unwrap_or(0.0) / 100.0;
            let annualized = ((1.0 + total_return).powf(PERIODS_PER_YEAR / periods) - 1.0) * 100.0;
            self.annualized_return_pct = Decimal::try_from(annualized).unwrap_or(Decimal::ZERO);
        }

        // Calculate trade statistics
        let mut total_profit = Decimal::ZERO;
        let mut total_loss = Decimal::ZERO;

        for pnl in self.trades.iter().filter_map(|t| t.pnl) {
            if pnl > Decimal::ZERO {
                self.winning_trades += 1;
                total_profit = total_profit.saturating_add(pnl);
            } else if pnl < Decimal::ZERO {
                self.losing_trades += 1;
                total_loss = total_loss.saturating_add(pnl.abs());
            } else {
                self.breakeven_trades += 1;
            }
        }

        // Win rate
        if self.total_trades > 0 {
            self.win_rate_pct = Decimal::from(self.winning_trades * 100) / Decimal::from(self.total_trades);
        }

        // Average win/loss
        if self.winning_trades > 0 {
            self.avg_win = total_profit / Decimal::from(self.winning_trades);
        }
        if self.losing_trades > 0 {
            self.avg_loss = total_loss / Decimal::from(self.losing_trades);
        }

        // Profit factor
        if total_loss > Decimal::ZERO {
            self.profit_factor = total_profit.checked_div(total_loss).unwrap_or(Decimal::MAX);
        }

        self.compute_ratios();
    }

    fn compute_ratios(&mut self) {
        if self.returns.is_empty() {
            return;
        }

        let n = self.returns.len() as f64;
        let mean: f64 = self.returns.iter().sum::<f64>() / n;
        let variance: f64 = self.returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        if std_dev > 0.0 {
            self.sharpe_ratio = (mean * PERIODS_PER_YEAR.sqrt()) / std_dev;
        }

        // Sortino ratio (only downside deviation)
        let negative: Vec<f64> = self.returns.iter().filter(|&&r| r < 0.0).copied().collect();
        if !negative.is_empty() {
            let downside_variance: f64 = negative.iter().map(|r| r.powi(2)).sum::<f64>() / negative.len() as f64;
            let downside_dev = downside_variance.sqrt();

            if downside_dev > 0.0 {
                self.sortino_ratio = (mean * PERIODS_PER_YEAR.sqrt()) / downside_dev;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barlab_core::types::OrderId;

    fn fill(side: Side, pnl: Option<Decimal>) -> Fill {
        Fill {
            order_id: OrderId(1),
            side,
            quantity: dec!(10),
            price: dec!(100),
            commission: dec!(1),
            realized_pnl: pnl,
            bar_index: 0,
            timestamp: 0,
        }
    }

    #[test]
    fn test_drawdown_tracking() {
        let mut stats = BacktestStats::new(dec!(1000));
        stats.record_equity(0, dec!(1000));
        stats.record_equity(1, dec!(1200));
        stats.record_equity(2, dec!(900));
        stats.record_equity(3, dec!(1100));

        assert_eq!(stats.max_drawdown_pct, dec!(25));
        assert_eq!(stats.bars_processed, 4);
        assert_eq!(stats.equity_curve.len(), 4);
    }

    #[test]
    fn test_trade_statistics() {
        let mut stats = BacktestStats::new(dec!(1000));
        stats.add_fill(&fill(Side::Buy, None));
        stats.add_fill(&fill(Side::Sell, Some(dec!(30))));
        stats.add_fill(&fill(Side::Buy, None));
        stats.add_fill(&fill(Side::Sell, Some(dec!(-10))));
        stats.add_fill(&fill(Side::Buy, None));
        stats.add_fill(&fill(Side::Sell, Some(dec!(10))));

        let mut portfolio = Portfolio::new(dec!(1000));
        portfolio.equity = dec!(1030);
        stats.finalize(&portfolio);

        assert_eq!(stats.trades.len(), 6);
        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.losing_trades, 1);
        assert_eq!(stats.avg_win, dec!(20));
        assert_eq!(stats.avg_loss, dec!(10));
        assert_eq!(stats.profit_factor, dec!(4));
        assert_eq!(stats.total_return_pct, dec!(3));
    }

    #[test]
    fn test_flat_equity_has_zero_ratios() {
        let mut stats = BacktestStats::new(dec!(1000));
        for ts in 0..10 {
            stats.record_equity(ts, dec!(1000));
        }
        stats.finalize(&Portfolio::new(dec!(1000)));

        assert_eq!(stats.sharpe_ratio, 0.0);
        assert_eq!(stats.sortino_ratio, 0.0);
        assert_eq!(stats.max_drawdown_pct, Decimal::ZERO);
        assert_eq!(stats.total_return_pct, Decimal::ZERO);
    }

    #[test]
    fn test_sharpe_sign() {
        let mut stats = BacktestStats::new(dec!(1000));
        for (ts, equity) in [dec!(1000), dec!(1010), dec!(1005), dec!(1020), dec!(1030)].into_iter().enumerate() {
            stats.record_equity(ts as i64, equity);
        }
        stats.finalize(&Portfolio::new(dec!(1030)));
        assert!(stats.sharpe_ratio > 0.0);
        assert!(stats.sortino_ratio > 0.0);
    }
}
