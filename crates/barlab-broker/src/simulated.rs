//! Simulated broker for backtesting.

use barlab_core::error::OrderRejection;
use barlab_core::types::{
    Bar, Fill, FillPrice, OrderId, OrderOutcome, OrderRequest, Portfolio, Rejection, Side,
};
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Single-asset broker simulation.
///
/// With [`FillPrice::Close`] an order resolves inside [`submit`](Self::submit).
/// With [`FillPrice::NextOpen`] it is queued and resolves in
/// [`on_bar_open`](Self::on_bar_open) of the following bar.
#[derive(Debug, Clone)]
pub struct SimulatedBroker {
    portfolio: Portfolio,
    commission_rate: Decimal,
    fill_price: FillPrice,
    next_order_id: u64,
    queued: Option<OrderRequest>,
}

impl SimulatedBroker {
    /// Create a broker with initial cash and a proportional commission rate.
    pub fn new(initial_cash: Decimal, commission_rate: Decimal) -> Self {
        Self {
            portfolio: Portfolio::new(initial_cash),
            commission_rate,
            fill_price: FillPrice::Close,
            next_order_id: 1,
            queued: None,
        }
    }

    /// Set the execution price policy.
    pub fn with_fill_price(mut self, fill_price: FillPrice) -> Self {
        self.fill_price = fill_price;
        self
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn cash(&self) -> Decimal {
        self.portfolio.cash
    }

    pub fn position_quantity(&self) -> Decimal {
        self.portfolio.position.quantity
    }

    pub fn commission_rate(&self) -> Decimal {
        self.commission_rate
    }

    pub fn fill_price(&self) -> FillPrice {
        self.fill_price
    }

    /// Whether an order is waiting for the next bar's open.
    pub fn has_queued(&self) -> bool {
        self.queued.is_some()
    }

    /// Submit a market order placed on `bar`.
    ///
    /// Returns the outcome when the order resolves immediately, `None` when
    /// it was queued for the next open.
    pub fn submit(&mut self, side: Side, quantity: Decimal, bar_index: usize, bar: &Bar) -> Option<OrderOutcome> {
        let request = OrderRequest {
            id: OrderId(self.next_order_id),
            side,
            quantity,
            bar_index,
            timestamp: bar.timestamp,
        };
        self.next_order_id += 1;

        match self.fill_price {
            FillPrice::Close => Some(self.execute(&request, bar.close_decimal(), bar_index, bar.timestamp)),
            FillPrice::NextOpen if self.queued.is_some() => Some(self.reject(
                &request,
                bar.close_decimal(),
                OrderRejection::OrderInFlight,
                bar_index,
                bar.timestamp,
            )),
            FillPrice::NextOpen => {
                self.queued = Some(request);
                None
            }
        }
    }

    /// Execute a queued order at this bar's open.
    pub fn on_bar_open(&mut self, bar_index: usize, bar: &Bar) -> Option<OrderOutcome> {
        let request = self.queued.take()?;
        Some(self.execute(&request, bar.open_decimal(), bar_index, bar.timestamp))
    }

    /// Drop a queued order without executing it.
    pub fn cancel_pending(&mut self, reason: &str) -> Option<OrderOutcome> {
        let request = self.queued.take()?;
        warn!(order_id = %request.id, side = %request.side, %reason, "order canceled");
        Some(OrderOutcome::Canceled {
            order_id: request.id,
            side: request.side,
            quantity: request.quantity,
            reason: reason.to_string(),
        })
    }

    /// Revalue the position at the bar's close and return equity.
    pub fn mark_to_market(&mut self, bar: &Bar) -> Decimal {
        self.portfolio.mark_to_market(bar.close_decimal())
    }

    fn execute(&mut self, request: &OrderRequest, price: Decimal, bar_index: usize, timestamp: i64) -> OrderOutcome {
        match request.side {
            Side::Buy => self.buy(request, price, bar_index, timestamp),
            Side::Sell => self.close(request, price, bar_index, timestamp),
        }
    }

    fn buy(&mut self, request: &OrderRequest, price: Decimal, bar_index: usize, timestamp: i64) -> OrderOutcome {
        let quantity = request.quantity;
        if quantity <= Decimal::ZERO {
            return self.reject(request, price, OrderRejection::ZeroQuantity, bar_index, timestamp);
        }

        let Some((notional, commission)) = self.notional_and_commission(quantity, price) else {
            let reason = OrderRejection::ValueOutOfRange { quantity, price };
            return self.reject(request, price, reason, bar_index, timestamp);
        };
        let required = notional + commission;
        if required > self.portfolio.cash {
            let reason = OrderRejection::InsufficientCash {
                required,
                available: self.portfolio.cash,
            };
            return self.reject(request, price, reason, bar_index, timestamp);
        }

        self.portfolio.cash -= required;
        self.portfolio.total_commission += commission;
        self.portfolio.position.add(quantity, price, commission);
        self.portfolio.update_equity();

        info!(
            order_id = %request.id,
            %quantity,
            %price,
            %commission,
            cash = %self.portfolio.cash,
            bar_index,
            "BUY filled"
        );

        OrderOutcome::Filled(Fill {
            order_id: request.id,
            side: Side::Buy,
            quantity,
            price,
            commission,
            realized_pnl: None,
            bar_index,
            timestamp,
        })
    }

    fn close(&mut self, request: &OrderRequest, price: Decimal, bar_index: usize, timestamp: i64) -> OrderOutcome {
        let quantity = self.portfolio.position.quantity;
        if quantity <= Decimal::ZERO {
            return self.reject(request, price, OrderRejection::NoPosition, bar_index, timestamp);
        }

        let settled = self
            .notional_and_commission(quantity, price)
            .and_then(|(proceeds, commission)| {
                let cash = self.portfolio.cash.checked_add(proceeds - commission)?;
                Some((cash, commission))
            });
        let Some((cash, commission)) = settled else {
            let reason = OrderRejection::ValueOutOfRange { quantity, price };
            return self.reject(request, price, reason, bar_index, timestamp);
        };
        self.portfolio.cash = cash;
        self.portfolio.total_commission += commission;
        let realized = self.portfolio.position.close(price, commission);
        self.portfolio.realized_pnl += realized;
        self.portfolio.update_equity();

        info!(
            order_id = %request.id,
            %quantity,
            %price,
            %commission,
            pnl = %realized,
            cash = %self.portfolio.cash,
            bar_index,
            "SELL filled"
        );

        OrderOutcome::Filled(Fill {
            order_id: request.id,
            side: Side::Sell,
            quantity,
            price,
            commission,
            realized_pnl: Some(realized),
            bar_index,
            timestamp,
        })
    }

    /// Notional and commission, or `None` if they leave Decimal's range.
    fn notional_and_commission(&self, quantity: Decimal, price: Decimal) -> Option<(Decimal, Decimal)> {
        let notional = quantity.checked_mul(price)?;
        let commission = notional.checked_mul(self.commission_rate)?;
        notional.checked_add(commission).map(|_| (notional, commission))
    }

    fn reject(
        &self,
        request: &OrderRequest,
        price: Decimal,
        reason: OrderRejection,
        bar_index: usize,
        timestamp: i64,
    ) -> OrderOutcome {
        warn!(
            order_id = %request.id,
            side = %request.side,
            quantity = %request.quantity,
            %price,
            %reason,
            bar_index,
            "order rejected"
        );
        OrderOutcome::Rejected(Rejection {
            order_id: request.id,
            side: request.side,
            quantity: request.quantity,
            price,
            reason,
            bar_index,
            timestamp,
        })
    }
}
