//! Order model: sides, types, lifecycle states and the `Order` record itself.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    /// Applies the side's sign to a quantity: positive for BUY, negative for SELL.
    pub fn signed(self, quantity: i64) -> i64 {
        match self {
            OrderSide::Buy => quantity,
            OrderSide::Sell => -quantity,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit(f64),
}

/// Lifecycle state of an order.
///
/// `New` may advance to any other state; `PartiallyFilled` may repeat or
/// advance to `Filled`/`Cancelled`. `Filled`, `Rejected` and `Cancelled` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    Acknowledged,
    PartiallyFilled,
    Filled,
    Rejected,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Rejected | OrderStatus::Cancelled
        )
    }

    /// Whether a cancel request can still succeed in this state.
    pub fn is_cancelable(self) -> bool {
        matches!(
            self,
            OrderStatus::New | OrderStatus::Acknowledged | OrderStatus::PartiallyFilled
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::New => "NEW",
            OrderStatus::Acknowledged => "ACKNOWLEDGED",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// An instruction to buy or sell an instrument.
///
/// `order_id` is zero until the order manager assigns one; after that the
/// record is mutated only by the order manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Internal id, assigned by the order manager. Strictly increasing per process.
    pub order_id: u64,
    /// Caller-chosen id, unique per strategy instance.
    pub client_order_id: String,
    pub instrument_id: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: i64,
    /// Limit price; 0.0 for market orders.
    pub price: f64,
    pub status: OrderStatus,
    /// Cumulative filled quantity, `0 <= filled_quantity <= quantity`.
    pub filled_quantity: i64,
    /// Quantity-weighted average of fill prices so far.
    pub average_filled_price: f64,
    /// Time of the last state transition (Unix millis).
    pub timestamp: i64,
}

impl Order {
    pub fn market(
        client_order_id: impl Into<String>,
        instrument_id: impl Into<String>,
        side: OrderSide,
        quantity: i64,
    ) -> Self {
        Self {
            order_id: 0,
            client_order_id: client_order_id.into(),
            instrument_id: instrument_id.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            price: 0.0,
            status: OrderStatus::New,
            filled_quantity: 0,
            average_filled_price: 0.0,
            timestamp: 0,
        }
    }

    pub fn limit(
        client_order_id: impl Into<String>,
        instrument_id: impl Into<String>,
        side: OrderSide,
        quantity: i64,
        price: f64,
    ) -> Self {
        Self {
            order_id: 0,
            client_order_id: client_order_id.into(),
            instrument_id: instrument_id.into(),
            side,
            order_type: OrderType::Limit(price),
            quantity,
            price,
            status: OrderStatus::New,
            filled_quantity: 0,
            average_filled_price: 0.0,
            timestamp: 0,
        }
    }

    /// Quantity still open on this order.
    pub fn remaining_quantity(&self) -> i64 {
        self.quantity - self.filled_quantity
    }
}
