//! Order lifecycle management: the book of record for orders and positions.
//!
//! `OrderManager` validates incoming orders, allocates internal ids, mediates
//! the pre-trade risk check, applies the exchange outcome, publishes one
//! execution report per state transition, and keeps positions with realized
//! PnL.
//!
//! Locking discipline: `orders` may be locked before `positions`, never the
//! reverse; the risk engine's lock is a leaf; the execution-report callback
//! is always invoked with no locks held.

use crate::exchange::{Exchange, ExchangeOutcome};
use crate::risk::RiskEngine;
use chrono::Utc;
use log::{debug, error, info, warn};
use sim_api::{
    ExecutionReport, ExecutionReportCallback, Order, OrderSide, OrderStatus, OrderType, Position,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[cfg(test)]
mod tests;

/// Book-of-record entry. The running filled notional lives alongside the
/// order so the published average price is always `notional / filled_qty`,
/// no matter how many partial fills contributed.
#[derive(Debug, Clone)]
struct ActiveOrder {
    order: Order,
    filled_notional: f64,
}

pub struct OrderManager {
    next_order_id: AtomicU64,
    orders: Mutex<HashMap<u64, ActiveOrder>>,
    positions: Mutex<HashMap<String, Position>>,
    callback: Mutex<Option<ExecutionReportCallback>>,
    risk: Arc<RiskEngine>,
    exchange: Box<dyn Exchange>,
}

impl OrderManager {
    pub fn new(risk: Arc<RiskEngine>, exchange: Box<dyn Exchange>) -> Self {
        Self {
            next_order_id: AtomicU64::new(1),
            orders: Mutex::new(HashMap::new()),
            positions: Mutex::new(HashMap::new()),
            callback: Mutex::new(None),
            risk,
            exchange,
        }
    }

    /// Registers the execution-report callback, replacing any previous one.
    /// A host driving several strategies registers one closure that fans out.
    pub fn set_execution_report_callback(&self, callback: ExecutionReportCallback) {
        *self.callback.lock().unwrap() = Some(callback);
    }

    /// Validates, risk-checks and executes an order.
    ///
    /// The caller's `Order` is updated in place (assigned id, final status,
    /// fill fields). Returns `false` on any rejection (validation, risk or
    /// venue) with a terminal `Rejected` report already emitted; `true` on
    /// any acceptance, including partial fills and pure acknowledgement.
    pub fn send_order(&self, order: &mut Order) -> bool {
        if order.instrument_id.is_empty() || order.quantity <= 0 {
            return self.reject(order, "Invalid parameters: instrument or quantity");
        }
        if let OrderType::Limit(price) = order.order_type {
            if price <= 0.0 {
                return self.reject(order, "Invalid parameters: price for LIMIT order");
            }
        }

        let now = Utc::now().timestamp_millis();
        {
            let mut orders = self.orders.lock().unwrap();
            order.order_id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
            order.status = OrderStatus::New;
            order.timestamp = now;
            order.filled_quantity = 0;
            order.average_filled_price = 0.0;
            orders.insert(
                order.order_id,
                ActiveOrder {
                    order: order.clone(),
                    filled_notional: 0.0,
                },
            );
        }
        info!(
            "order received: cloid={} oid={} {} {} {} qty={} px={}",
            order.client_order_id,
            order.order_id,
            order.instrument_id,
            order.side,
            match order.order_type {
                OrderType::Market => "MARKET",
                OrderType::Limit(_) => "LIMIT",
            },
            order.quantity,
            order.price
        );

        let current_position = self
            .position(&order.instrument_id)
            .unwrap_or_else(|| Position::new(&order.instrument_id));
        let verdict = self.risk.check_order_pre_send(order, &current_position);
        if !verdict.is_approved() {
            let reason = verdict.to_string();
            warn!("order {} rejected by risk engine: {}", order.order_id, reason);
            return self.reject(order, &reason);
        }

        match self.exchange.execute(order) {
            ExchangeOutcome::Filled { price, quantity } => {
                self.apply_fill(order, price, quantity);
                true
            }
            ExchangeOutcome::Acknowledged => {
                let now = Utc::now().timestamp_millis();
                {
                    let mut orders = self.orders.lock().unwrap();
                    if let Some(active) = orders.get_mut(&order.order_id) {
                        active.order.status = OrderStatus::Acknowledged;
                        active.order.timestamp = now;
                    }
                }
                order.status = OrderStatus::Acknowledged;
                order.timestamp = now;
                info!("order {} acknowledged, resting", order.order_id);
                self.emit(ExecutionReport::new(order, OrderStatus::Acknowledged, now));
                true
            }
            ExchangeOutcome::Rejected(reason) => {
                warn!("order {} rejected by venue: {}", order.order_id, reason);
                self.reject(order, &reason)
            }
        }
    }

    /// Cancels an order by internal id (if the string parses as `u64`) or by
    /// client id. Succeeds only from a cancelable state; lookup misses and
    /// terminal orders return `false` without emitting a report.
    pub fn cancel_order(&self, order_id: &str, client_order_id: Option<&str>) -> bool {
        let now = Utc::now().timestamp_millis();
        let report = {
            let mut orders = self.orders.lock().unwrap();

            let key = order_id
                .parse::<u64>()
                .ok()
                .filter(|id| orders.contains_key(id))
                .or_else(|| {
                    client_order_id.and_then(|cloid| {
                        orders
                            .iter()
                            .find(|(_, active)| active.order.client_order_id == cloid)
                            .map(|(id, _)| *id)
                    })
                });

            let Some(key) = key else {
                warn!(
                    "cancel request failed: no order with id '{}' or client id {:?}",
                    order_id, client_order_id
                );
                return false;
            };

            let active = orders.get_mut(&key).expect("key looked up above");
            if !active.order.status.is_cancelable() {
                info!(
                    "order {} not cancelable in state {}",
                    key, active.order.status
                );
                return false;
            }

            active.order.status = OrderStatus::Cancelled;
            active.order.timestamp = now;
            info!(
                "order cancelled: oid={} cloid={}",
                key, active.order.client_order_id
            );
            ExecutionReport::new(&active.order, OrderStatus::Cancelled, now)
        };

        self.emit(report);
        true
    }

    /// Snapshot of the position for one instrument, if any fills happened.
    pub fn position(&self, instrument_id: &str) -> Option<Position> {
        self.positions.lock().unwrap().get(instrument_id).cloned()
    }

    /// Snapshot of all positions.
    pub fn positions(&self) -> Vec<Position> {
        self.positions.lock().unwrap().values().cloned().collect()
    }

    /// Snapshot of an order by internal id.
    pub fn order(&self, order_id: u64) -> Option<Order> {
        self.orders
            .lock()
            .unwrap()
            .get(&order_id)
            .map(|active| active.order.clone())
    }

    /// Marks the order rejected (in the book, if it made it there), updates
    /// the caller's copy, and emits the terminal report. Always `false`.
    fn reject(&self, order: &mut Order, reason: &str) -> bool {
        let now = Utc::now().timestamp_millis();
        {
            let mut orders = self.orders.lock().unwrap();
            if let Some(active) = orders.get_mut(&order.order_id) {
                active.order.status = OrderStatus::Rejected;
                active.order.timestamp = now;
            }
        }
        order.status = OrderStatus::Rejected;
        order.timestamp = now;
        self.emit(ExecutionReport::new(order, OrderStatus::Rejected, now).with_reason(reason));
        false
    }

    /// Applies one fill event: cumulative fill and state transition under the
    /// orders lock, then, outside any lock and in this order: report emission,
    /// risk engine notification, position update. Strategies can therefore
    /// observe a fill before the books have moved.
    fn apply_fill(&self, order: &mut Order, fill_price: f64, fill_quantity: i64) {
        let now = Utc::now().timestamp_millis();

        let report = {
            let mut orders = self.orders.lock().unwrap();
            let Some(active) = orders.get_mut(&order.order_id) else {
                error!("fill for unknown order {}, dropped", order.order_id);
                return;
            };

            active.order.filled_quantity += fill_quantity;
            active.filled_notional += fill_price * fill_quantity as f64;
            active.order.average_filled_price =
                active.filled_notional / active.order.filled_quantity as f64;
            active.order.status = if active.order.filled_quantity >= active.order.quantity {
                OrderStatus::Filled
            } else {
                OrderStatus::PartiallyFilled
            };
            active.order.timestamp = now;

            *order = active.order.clone();
            ExecutionReport::new(&active.order, active.order.status, now).with_fill(
                fill_quantity,
                fill_price,
                active.order.filled_quantity,
                active.order.average_filled_price,
            )
        };

        info!(
            "order {} {}: {} x{} @ {:.2} ({}/{} filled, avg {:.4})",
            order.order_id,
            order.status,
            order.instrument_id,
            fill_quantity,
            fill_price,
            order.filled_quantity,
            order.quantity,
            order.average_filled_price
        );

        self.emit(report.clone());
        self.risk.update_on_fill(&report, order.side);
        self.update_position(&report);
    }

    /// Folds a fill into the positions book. The fill's side comes from the
    /// book of record; the orders lock is released before the positions lock
    /// is taken (lock order: orders before positions).
    fn update_position(&self, report: &ExecutionReport) {
        if report.filled_quantity == 0 {
            return;
        }

        let side = {
            let orders = self.orders.lock().unwrap();
            match orders.get(&report.order_id) {
                Some(active) => active.order.side,
                None => {
                    error!(
                        "position update skipped: order {} not found",
                        report.order_id
                    );
                    return;
                }
            }
        };

        let mut positions = self.positions.lock().unwrap();
        let position = positions
            .entry(report.instrument_id.clone())
            .or_insert_with(|| Position::new(&report.instrument_id));

        let old_quantity = position.quantity;
        let old_average = position.average_entry_price;
        let fill_quantity = report.filled_quantity;
        let fill_price = report.filled_price;

        // Realize PnL on the closing portion of the fill.
        match side {
            OrderSide::Buy if old_quantity < 0 => {
                let closed = fill_quantity.min(-old_quantity);
                position.realized_pnl += (old_average - fill_price) * closed as f64;
            }
            OrderSide::Sell if old_quantity > 0 => {
                let closed = fill_quantity.min(old_quantity);
                position.realized_pnl += (fill_price - old_average) * closed as f64;
            }
            _ => {}
        }

        let signed_fill = side.signed(fill_quantity);
        position.quantity = old_quantity + signed_fill;
        if position.quantity == 0 {
            position.average_entry_price = 0.0;
        } else {
            position.average_entry_price = (old_average * old_quantity as f64
                + fill_price * signed_fill as f64)
                / position.quantity as f64;
        }

        info!(
            "position updated: {} qty={} avg={:.4} realized_pnl={:.2}",
            position.instrument_id,
            position.quantity,
            position.average_entry_price,
            position.realized_pnl
        );
    }

    /// Hands a report to the registered callback, if any, with no locks held.
    fn emit(&self, report: ExecutionReport) {
        let callback = self.callback.lock().unwrap().clone();
        debug!(
            "exec report: oid={} status={} last={}@{:.2} cum={} avg={:.4} reason='{}'",
            report.order_id,
            report.status,
            report.filled_quantity,
            report.filled_price,
            report.cumulative_filled_quantity,
            report.average_filled_price,
            report.reject_reason
        );
        if let Some(callback) = callback {
            callback(&report);
        }
    }
}
