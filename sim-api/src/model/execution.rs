//! Execution reports: one per order state transition or fill event.

use crate::model::order::{Order, OrderStatus};
use serde::{Deserialize, Serialize};

/// A status notification for one order lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub order_id: u64,
    pub client_order_id: String,
    pub instrument_id: String,
    /// Resulting status after this event.
    pub status: OrderStatus,
    /// Quantity filled in this specific event (delta, not cumulative).
    pub filled_quantity: i64,
    /// Price of this specific fill.
    pub filled_price: f64,
    /// Total quantity filled so far for the order.
    pub cumulative_filled_quantity: i64,
    /// Quantity-weighted average price of fills so far.
    pub average_filled_price: f64,
    /// Time of the event (Unix millis).
    pub timestamp: i64,
    /// Empty unless `status` is `Rejected`.
    pub reject_reason: String,
}

impl ExecutionReport {
    /// Builds a report carrying the order's identity, with no fill attached.
    pub fn new(order: &Order, status: OrderStatus, timestamp: i64) -> Self {
        Self {
            order_id: order.order_id,
            client_order_id: order.client_order_id.clone(),
            instrument_id: order.instrument_id.clone(),
            status,
            filled_quantity: 0,
            filled_price: 0.0,
            cumulative_filled_quantity: order.filled_quantity,
            average_filled_price: order.average_filled_price,
            timestamp,
            reject_reason: String::new(),
        }
    }

    pub fn with_fill(
        mut self,
        last_quantity: i64,
        last_price: f64,
        cumulative_quantity: i64,
        average_price: f64,
    ) -> Self {
        self.filled_quantity = last_quantity;
        self.filled_price = last_price;
        self.cumulative_filled_quantity = cumulative_quantity;
        self.average_filled_price = average_price;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reject_reason = reason.into();
        self
    }
}
