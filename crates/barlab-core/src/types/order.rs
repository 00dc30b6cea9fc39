//! Order intents, requests and their resolutions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::OrderRejection;

/// Order side. `Sell` always closes the open long position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Which price a market order executes at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPrice {
    /// Same bar's close
    #[default]
    Close,
    /// Following bar's open
    NextOpen,
}

/// What the strategy wants to do on this bar.
///
/// Lives for one bar only: it is turned into an [`OrderRequest`] and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub side: Side,
    /// `None` lets the sizer decide (buys) or closes the full position (sells).
    pub size: Option<Decimal>,
}

impl OrderIntent {
    /// Open a long position sized by the configured sizer.
    pub fn buy() -> Self {
        Self {
            side: Side::Buy,
            size: None,
        }
    }

    /// Open a long position of an explicit size.
    pub fn buy_exact(size: Decimal) -> Self {
        Self {
            side: Side::Buy,
            size: Some(size),
        }
    }

    /// Close the whole position.
    pub fn close() -> Self {
        Self {
            side: Side::Sell,
            size: None,
        }
    }
}

/// Monotonic order identifier, unique within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A sized market order handed to the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub id: OrderId,
    pub side: Side,
    pub quantity: Decimal,
    /// Index of the bar on which the intent was emitted
    pub bar_index: usize,
    /// Timestamp (ms) of that bar
    pub timestamp: i64,
}

/// An executed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    /// Commission charged on this fill
    pub commission: Decimal,
    /// Realized P&L net of entry and exit commissions (closing fills only)
    pub realized_pnl: Option<Decimal>,
    /// Index of the bar the fill happened on
    pub bar_index: usize,
    pub timestamp: i64,
}

impl Fill {
    /// Notional value (quantity * price).
    pub fn notional(&self) -> Decimal {
        self.quantity * self.price
    }
}

/// A refused order.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub order_id: OrderId,
    pub side: Side,
    pub quantity: Decimal,
    /// Price the order would have executed at
    pub price: Decimal,
    pub reason: OrderRejection,
    pub bar_index: usize,
    pub timestamp: i64,
}

/// Final status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Filled,
    Rejected,
    Canceled,
}

/// Resolution of a submitted order, reported back to the strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    Filled(Fill),
    Rejected(Rejection),
    /// Dropped without execution (e.g. still queued when the data ran out)
    Canceled {
        order_id: OrderId,
        side: Side,
        quantity: Decimal,
        reason: String,
    },
}

impl OrderOutcome {
    pub fn status(&self) -> OrderStatus {
        match self {
            OrderOutcome::Filled(_) => OrderStatus::Filled,
            OrderOutcome::Rejected(_) => OrderStatus::Rejected,
            OrderOutcome::Canceled { .. } => OrderStatus::Canceled,
        }
    }

    pub fn side(&self) -> Side {
        match self {
            OrderOutcome::Filled(fill) => fill.side,
            OrderOutcome::Rejected(rejection) => rejection.side,
            OrderOutcome::Canceled { side, .. } => *side,
        }
    }

    pub fn order_id(&self) -> OrderId {
        match self {
            OrderOutcome::Filled(fill) => fill.order_id,
            OrderOutcome::Rejected(rejection) => rejection.order_id,
            OrderOutcome::Canceled { order_id, .. } => *order_id,
        }
    }

    pub fn is_fill(&self) -> bool {
        matches!(self, OrderOutcome::Filled(_))
    }
}

/// One line of the execution log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub commission: Decimal,
    pub realized_pnl: Option<Decimal>,
    pub bar_index: Option<usize>,
    pub timestamp: Option<DateTime<Utc>>,
    /// Rejection or cancellation reason
    pub reason: Option<String>,
}

impl From<&OrderOutcome> for ExecutionRecord {
    fn from(outcome: &OrderOutcome) -> Self {
        let datetime = |ts: i64| DateTime::from_timestamp_millis(ts);
        match outcome {
            OrderOutcome::Filled(fill) => Self {
                order_id: fill.order_id,
                status: OrderStatus::Filled,
                side: fill.side,
                quantity: fill.quantity,
                price: Some(fill.price),
                commission: fill.commission,
                realized_pnl: fill.realized_pnl,
                bar_index: Some(fill.bar_index),
                timestamp: datetime(fill.timestamp),
                reason: None,
            },
            OrderOutcome::Rejected(rejection) => Self {
                order_id: rejection.order_id,
                status: OrderStatus::Rejected,
                side: rejection.side,
                quantity: rejection.quantity,
                price: Some(rejection.price),
                commission: Decimal::ZERO,
                realized_pnl: None,
                bar_index: Some(rejection.bar_index),
                timestamp: datetime(rejection.timestamp),
                reason: Some(rejection.reason.to_string()),
            },
            OrderOutcome::Canceled {
                order_id,
                side,
                quantity,
                reason,
            } => Self {
                order_id: *order_id,
                status: OrderStatus::Canceled,
                side: *side,
                quantity: *quantity,
                price: None,
                commission: Decimal::ZERO,
                realized_pnl: None,
                bar_index: None,
                timestamp: None,
                reason: Some(reason.clone()),
            },
        }
    }
}
