//! Strategy decision engine.
//!
//! Evaluated once per bar after indicators update. While an order is in
//! flight nothing else is emitted, so intents and outcomes pair up 1:1.

use barlab_core::error::ConfigError;
use barlab_core::types::{OrderIntent, OrderOutcome, Side};
use tracing::{debug, warn};

use crate::config::StrategyConfig;
use crate::filter::{AtrBandFilter, SignalFilter};
use crate::rules::{MarketContext, Rule};

/// Position as seen by the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Long,
}

/// Flat/long state machine with a pending-order guard.
#[derive(Debug)]
pub struct DecisionEngine {
    entry: Box<dyn Rule>,
    exit: Box<dyn Rule>,
    entry_filters: Vec<Box<dyn SignalFilter>>,
    state: PositionState,
    /// Side of the order awaiting resolution
    pending: Option<Side>,
    intents_emitted: usize,
    outcomes_received: usize,
}

impl DecisionEngine {
    /// Build the engine described by a validated configuration.
    pub fn from_config(config: &StrategyConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut engine = Self::new(
            config.rules.entry(config).build(),
            config.rules.exit(config).build(),
        );
        if config.atr_period.is_some() {
            engine = engine.with_entry_filter(AtrBandFilter::new(
                config.atr_min_pct.unwrap_or(0.0),
                config.atr_max_pct,
            ));
        }
        Ok(engine)
    }

    /// Engine from explicit entry and exit rules, no filters.
    pub fn new(entry: Box<dyn Rule>, exit: Box<dyn Rule>) -> Self {
        Self {
            entry,
            exit,
            entry_filters: Vec::new(),
            state: PositionState::Flat,
            pending: None,
            intents_emitted: 0,
            outcomes_received: 0,
        }
    }

    /// Add a gate that every entry must pass.
    pub fn with_entry_filter(mut self, filter: impl SignalFilter + 'static) -> Self {
        self.entry_filters.push(Box::new(filter));
        self
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn intents_emitted(&self) -> usize {
        self.intents_emitted
    }

    pub fn outcomes_received(&self) -> usize {
        self.outcomes_received
    }

    /// Decide what to do on this bar.
    pub fn on_bar(&mut self, ctx: &MarketContext<'_>) -> Option<OrderIntent> {
        let bar_index = ctx.indicators.bar_index;
        if let Some(side) = self.pending {
            debug!(bar_index, %side, "order in flight, skipping bar");
            return None;
        }

        let intent = match self.state {
            PositionState::Flat => {
                if !self.entry.evaluate(ctx) {
                    return None;
                }
                if let Some(filter) = self.entry_filters.iter().find(|f| !f.allows(ctx)) {
                    debug!(bar_index, filter = filter.name(), "entry blocked by filter");
                    return None;
                }
                OrderIntent::buy()
            }
            PositionState::Long => {
                if !self.exit.evaluate(ctx) {
                    return None;
                }
                OrderIntent::close()
            }
        };

        debug!(
            bar_index,
            side = %intent.side,
            close = ctx.bar.close,
            rsi = ?ctx.indicators.rsi,
            "emitting order intent"
        );
        self.pending = Some(intent.side);
        self.intents_emitted += 1;
        Some(intent)
    }

    /// Apply the broker's resolution of the pending order.
    ///
    /// Fills move the state; rejections and cancellations leave it as it was
    /// before the intent.
    pub fn on_outcome(&mut self, outcome: &OrderOutcome) {
        if self.pending.take().is_none() {
            warn!(order_id = %outcome.order_id(), "outcome received with no order in flight");
        }
        self.outcomes_received += 1;

        match outcome {
            OrderOutcome::Filled(fill) => {
                self.state = match fill.side {
                    Side::Buy => PositionState::Long,
                    Side::Sell => PositionState::Flat,
                };
                debug!(order_id = %fill.order_id, state = ?self.state, "order filled");
            }
            OrderOutcome::Rejected(rejection) => {
                debug!(order_id = %rejection.order_id, reason = %rejection.reason, "order rejected, state kept");
            }
            OrderOutcome::Canceled { order_id, reason, .. } => {
                debug!(%order_id, %reason, "order canceled, state kept");
            }
        }
    }
}
