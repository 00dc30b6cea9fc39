//! Backtest report generation.

use barlab_core::types::{ExecutionRecord, OrderStatus, Portfolio};
use barlab_indicators::IndicatorSeries;
use serde::{Deserialize, Serialize};

use crate::{BacktestConfig, BacktestStats};

/// Complete backtest report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Configuration used
    pub config: BacktestConfig,
    /// Statistics
    pub stats: BacktestStats,
    /// Final portfolio state
    pub final_portfolio: Portfolio,
    /// Every order resolution, in order
    pub executions: Vec<ExecutionRecord>,
    /// Per-bar indicator values, when recording was enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicators: Option<IndicatorSeries>,
}

impl BacktestReport {
    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                     BACKTEST REPORT                        \n");
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str("STRATEGY\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        let strategy = &self.config.strategy;
        s.push_str(&format!("  Preset:              {}\n", strategy.rules.name()));
        s.push_str(&format!(
            "  SMA fast/slow:       {}/{}\n",
            strategy.fast_period, strategy.slow_period
        ));
        s.push_str(&format!("  RSI period:          {}\n", strategy.rsi_period));
        s.push_str(&format!("  Sizer:               {}\n", self.config.sizer.name()));
        s.push_str(&format!("  Commission Rate:     {}\n", self.config.commission_rate));
        s.push('\n');

        s.push_str("PERFORMANCE\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Starting Value:      ${:.2}\n",
            self.stats.initial_capital
        ));
        s.push_str(&format!("  Final Value:         ${:.2}\n", self.stats.final_equity));
        s.push_str(&format!("  Final Cash:          ${:.2}\n", self.stats.final_cash));
        s.push_str(&format!("  Total Return:        {:.2}%\n", self.stats.total_return_pct));
        s.push_str(&format!(
            "  Annualized Return:   {:.2}%\n",
            self.stats.annualized_return_pct
        ));
        s.push_str(&format!("  Max Drawdown:        {:.2}%\n", self.stats.max_drawdown_pct));
        s.push('\n');

        s.push_str("RISK METRICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Sharpe Ratio:        {:.2}\n", self.stats.sharpe_ratio));
        s.push_str(&format!("  Sortino Ratio:       {:.2}\n", self.stats.sortino_ratio));
        s.push_str(&format!("  Profit Factor:       {:.2}\n", self.stats.profit_factor));
        s.push('\n');

        s.push_str("TRADE STATISTICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Closed Trades:       {}\n", self.stats.total_trades));
        s.push_str(&format!("  Winning Trades:      {}\n", self.stats.winning_trades));
        s.push_str(&format!("  Losing Trades:       {}\n", self.stats.losing_trades));
        s.push_str(&format!("  Breakeven Trades:    {}\n", self.stats.breakeven_trades));
        s.push_str(&format!("  Win Rate:            {:.2}%\n", self.stats.win_rate_pct));
        s.push_str(&format!("  Avg Win:             ${:.2}\n", self.stats.avg_win));
        s.push_str(&format!("  Avg Loss:            ${:.2}\n", self.stats.avg_loss));
        s.push_str(&format!(
            "  Open Position:       {}\n",
            self.final_portfolio.position.quantity
        ));
        s.push('\n');

        s.push_str("EXECUTION\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Bars Processed:      {}\n", self.stats.bars_processed));
        s.push_str(&format!("  Fills:               {}\n", self.count(OrderStatus::Filled)));
        s.push_str(&format!("  Rejected Orders:     {}\n", self.stats.rejected_orders));
        s.push_str(&format!("  Canceled Orders:     {}\n", self.stats.canceled_orders));
        s.push_str(&format!("  Commission Paid:     ${:.2}\n", self.stats.total_commission));
        s.push('\n');

        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    fn count(&self, status: OrderStatus) -> usize {
        self.executions.iter().filter(|e| e.status == status).count()
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV (equity curve only).
    pub fn equity_to_csv(&self) -> String {
        let mut csv = String::from("timestamp,equity\n");
        for (ts, equity) in &self.stats.equity_curve {
            csv.push_str(&format!("{},{}\n", ts, equity));
        }
        csv
    }

    /// Execution log as CSV.
    pub fn executions_to_csv(&self) -> csv::Result<String> {
        let opt = |value: Option<String>| value.unwrap_or_default();
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.write_record([
            "order_id",
            "status",
            "side",
            "quantity",
            "price",
            "commission",
            "realized_pnl",
            "bar_index",
            "reason",
        ])?;
        for e in &self.executions {
            writer.write_record([
                e.order_id.0.to_string(),
                format!("{:?}", e.status),
                e.side.to_string(),
                e.quantity.to_string(),
                opt(e.price.map(|p| p.to_string())),
                e.commission.to_string(),
                opt(e.realized_pnl.map(|p| p.to_string())),
                opt(e.bar_index.map(|i| i.to_string())),
                opt(e.reason.clone()),
            ])?;
        }
        let data = writer.into_inner().map_err(|err| err.into_error())?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}
