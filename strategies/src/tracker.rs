//! Shared strategy plumbing: client order id allocation and the
//! single-order-in-flight discipline.

use sim_api::{ExecutionReport, OrderSide, OrderStatus};

/// Tracks the one outstanding client order a strategy instance may have,
/// plus the strategy's simplified view of its own position.
///
/// The authoritative position lives in the order manager; a strategy only
/// remembers whether it is in the market and on which side. New signals are
/// suppressed while an order id sits in the slot; the slot clears on any
/// terminal report for that id, and on partial fills as well (the order is
/// no longer actively managed by new signals).
#[derive(Debug)]
pub struct OrderTracker {
    client_order_id_base: String,
    order_counter: u64,
    active_client_order_id: Option<String>,
    has_open_position: bool,
    position_side: Option<OrderSide>,
}

impl OrderTracker {
    pub fn new(strategy_name: &str, instrument_id: &str) -> Self {
        Self {
            client_order_id_base: format!("{}_{}_", strategy_name, instrument_id),
            order_counter: 0,
            active_client_order_id: None,
            has_open_position: false,
            position_side: None,
        }
    }

    /// Whether a new signal may be acted on.
    pub fn can_send(&self) -> bool {
        self.active_client_order_id.is_none()
    }

    pub fn has_open_position(&self) -> bool {
        self.has_open_position
    }

    /// Side of the open position, while one exists.
    pub fn position_side(&self) -> Option<OrderSide> {
        self.position_side
    }

    /// Allocates the next client order id and marks it in flight. An opening
    /// order records the intended position side; a closing order leaves the
    /// recorded side untouched (the order's side is the opposite).
    pub fn begin_order(&mut self, side: OrderSide) -> String {
        let client_order_id = format!("{}{}", self.client_order_id_base, self.order_counter);
        self.order_counter += 1;
        if !self.has_open_position {
            self.position_side = Some(side);
        }
        self.active_client_order_id = Some(client_order_id.clone());
        client_order_id
    }

    /// Whether this report was produced by an order of this instance.
    pub fn owns(&self, report: &ExecutionReport) -> bool {
        report.client_order_id.starts_with(&self.client_order_id_base)
    }

    /// Folds an execution report into the tracker. Returns `true` when this
    /// report cleared the in-flight slot.
    pub fn on_execution_report(&mut self, report: &ExecutionReport, order_quantity: i64) -> bool {
        if self.active_client_order_id.as_deref() != Some(report.client_order_id.as_str()) {
            return false;
        }

        match report.status {
            OrderStatus::Filled | OrderStatus::PartiallyFilled => {
                if report.cumulative_filled_quantity >= order_quantity {
                    // A complete fill toggles the position intent.
                    self.has_open_position = !self.has_open_position;
                    if !self.has_open_position {
                        self.position_side = None;
                    }
                } else if !self.has_open_position {
                    // Partially opened; the remembered side was set on send.
                    self.has_open_position = true;
                }
                self.active_client_order_id = None;
                true
            }
            OrderStatus::Rejected | OrderStatus::Cancelled => {
                // The position intent reverts to whatever held before the
                // attempt; only the slot clears.
                self.active_client_order_id = None;
                true
            }
            OrderStatus::New | OrderStatus::Acknowledged => false,
        }
    }
}
