//! Backtesting engine.

use barlab_broker::SimulatedBroker;
use barlab_core::error::{BarlabResult, ConfigError, DataError};
use barlab_core::traits::DataSource;
use barlab_core::types::{Bar, ExecutionRecord, FillPrice, OrderIntent, OrderOutcome, Side};
use barlab_indicators::{IndicatorEngine, IndicatorSeries};
use barlab_risk::{PositionSizer, PositionSizingMethod};
use barlab_strategies::{DecisionEngine, MarketContext, StrategyConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::report::BacktestReport;
use crate::statistics::BacktestStats;

/// Backtest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Starting cash
    pub initial_cash: Decimal,
    /// Proportional commission on entry and exit notional
    pub commission_rate: Decimal,
    /// Execution price policy
    pub fill_price: FillPrice,
    /// Keep every bar's indicator snapshot in the report
    pub record_indicators: bool,
    pub strategy: StrategyConfig,
    pub sizer: PositionSizingMethod,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_cash: dec!(10000),
            commission_rate: dec!(0.001),
            fill_price: FillPrice::Close,
            record_indicators: false,
            strategy: StrategyConfig::default(),
            sizer: PositionSizingMethod::default(),
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_cash <= Decimal::ZERO {
            return Err(ConfigError::invalid(
                "initial_cash",
                format!("must be greater than 0, got {}", self.initial_cash),
            ));
        }
        if self.commission_rate < Decimal::ZERO || self.commission_rate >= Decimal::ONE {
            return Err(ConfigError::invalid(
                "commission_rate",
                format!("must be in [0, 1), got {}", self.commission_rate),
            ));
        }
        self.strategy.validate()?;
        self.sizer.validate()?;
        Ok(())
    }
}

/// One backtest run in progress.
///
/// Owns every component exclusively. Each [`step`](Self::step) fully
/// resolves the bar (orders included) before returning.
#[derive(Debug)]
pub struct Simulation {
    config: BacktestConfig,
    indicators: IndicatorEngine,
    decision: DecisionEngine,
    broker: SimulatedBroker,
    sizer: PositionSizer,
    stats: BacktestStats,
    executions: Vec<ExecutionRecord>,
    series: Option<IndicatorSeries>,
    last_timestamp: Option<i64>,
    bar_index: usize,
}

impl Simulation {
    /// Validate the configuration and assemble the components.
    pub fn new(config: BacktestConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let indicators = IndicatorEngine::new(config.strategy.indicator_settings());
        let decision = DecisionEngine::from_config(&config.strategy)?;
        let broker = SimulatedBroker::new(config.initial_cash, config.commission_rate)
            .with_fill_price(config.fill_price);

        Ok(Self {
            indicators,
            decision,
            broker,
            sizer: PositionSizer::new(config.sizer.clone()),
            stats: BacktestStats::new(config.initial_cash),
            executions: Vec::new(),
            series: config.record_indicators.then(IndicatorSeries::new),
            last_timestamp: None,
            bar_index: 0,
            config,
        })
    }

    /// Bars processed so far.
    pub fn bars_processed(&self) -> usize {
        self.bar_index
    }

    pub fn broker(&self) -> &SimulatedBroker {
        &self.broker
    }

    pub fn decision(&self) -> &DecisionEngine {
        &self.decision
    }

    pub fn executions(&self) -> &[ExecutionRecord] {
        &self.executions
    }

    /// Equity curve up to the last processed bar.
    pub fn equity_curve(&self) -> &[(i64, Decimal)] {
        &self.stats.equity_curve
    }

    /// Process one bar: queued open fill, indicators, decision, order, mark.
    pub fn step(&mut self, bar: &Bar) -> Result<(), DataError> {
        let index = self.bar_index;
        bar.validate(index)?;
        bar.check_follows(self.last_timestamp, index)?;

        if let Some(outcome) = self.broker.on_bar_open(index, bar) {
            self.resolve(outcome);
        }

        let snapshot = self.indicators.update(bar);
        let ctx = MarketContext::new(bar, &snapshot);

        if let Some(intent) = self.decision.on_bar(&ctx) {
            let quantity = self.order_quantity(&intent, bar);
            if let Some(outcome) = self.broker.submit(intent.side, quantity, index, bar) {
                self.resolve(outcome);
            }
        }

        let equity = self.broker.mark_to_market(bar);
        self.stats.record_equity(bar.timestamp, equity);
        debug!(bar_index = index, close = bar.close, %equity, "bar processed");

        if let Some(series) = self.series.as_mut() {
            series.push(snapshot);
        }
        self.last_timestamp = Some(bar.timestamp);
        self.bar_index += 1;
        Ok(())
    }

    /// End the run: cancel anything still queued and build the report.
    pub fn finish(mut self) -> BacktestReport {
        if let Some(outcome) = self.broker.cancel_pending("end of data") {
            self.resolve(outcome);
        }

        let final_portfolio = self.broker.portfolio().clone();
        self.stats.finalize(&final_portfolio);

        BacktestReport {
            config: self.config,
            stats: self.stats,
            final_portfolio,
            executions: self.executions,
            indicators: self.series,
        }
    }

    /// Buys use the explicit size or ask the sizer; closes take the whole position.
    fn order_quantity(&self, intent: &OrderIntent, bar: &Bar) -> Decimal {
        let position = self.broker.position_quantity();
        match intent.side {
            Side::Buy => intent.size.unwrap_or_else(|| {
                self.sizer
                    .size(self.broker.cash(), bar.close_decimal(), Side::Buy, position)
            }),
            Side::Sell => position,
        }
    }

    fn resolve(&mut self, outcome: OrderOutcome) {
        self.decision.on_outcome(&outcome);
        match &outcome {
            OrderOutcome::Filled(fill) => self.stats.add_fill(fill),
            OrderOutcome::Rejected(_) => self.stats.add_rejection(),
            OrderOutcome::Canceled { .. } => self.stats.add_cancellation(),
        }
        self.executions.push(ExecutionRecord::from(&outcome));
    }
}

/// Backtesting engine.
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    /// Create a new backtest engine. Fails on an invalid configuration.
    pub fn new(config: BacktestConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run a backtest over bars in timestamp order.
    ///
    /// A malformed or out-of-order bar aborts the run.
    pub fn run(&self, bars: &[Bar]) -> BarlabResult<BacktestReport> {
        let mut simulation = Simulation::new(self.config.clone())?;
        info!(
            bars = bars.len(),
            strategy = self.config.strategy.rules.name(),
            initial_cash = %self.config.initial_cash,
            "starting backtest"
        );

        for bar in bars {
            simulation.step(bar)?;
        }

        let report = simulation.finish();
        info!(
            final_equity = %report.stats.final_equity,
            trades = report.stats.total_trades,
            rejected = report.stats.rejected_orders,
            "backtest complete"
        );
        Ok(report)
    }

    /// Load bars from a source and run.
    pub fn run_source(&self, source: &dyn DataSource) -> BarlabResult<BacktestReport> {
        let bars = source.load()?;
        info!(source = source.name(), bars = bars.len(), "loaded data");
        self.run(&bars)
    }
}
