//! Mean reversion over Bollinger-style bands.
//!
//! Keeps a bounded window of the last N trade prices. Once the window is
//! full it computes the SMA and population standard deviation; prices above
//! `sma + k * sigma` open a short, prices below `sma - k * sigma` open a
//! long, and the position closes when the price reverts through the SMA.

use crate::stats::{mean, population_std_dev};
use crate::tracker::OrderTracker;
use execution_engine::OrderManager;
use log::{debug, info, warn};
use sim_api::{
    ExecutionReport, MarketDataSource, Order, OrderSide, OrderStatus, Strategy, Tick,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

struct MeanReversionState {
    prices: VecDeque<f64>,
    tracker: OrderTracker,
}

pub struct MeanReversionStrategy {
    name: String,
    instrument_id: String,
    window: usize,
    num_std_devs: f64,
    order_quantity: i64,
    active: AtomicBool,
    state: Mutex<MeanReversionState>,
    order_manager: Arc<OrderManager>,
    market_data: Arc<dyn MarketDataSource>,
}

impl MeanReversionStrategy {
    pub fn new(
        name: impl Into<String>,
        instrument_id: impl Into<String>,
        window: usize,
        num_std_devs: f64,
        order_quantity: i64,
        order_manager: Arc<OrderManager>,
        market_data: Arc<dyn MarketDataSource>,
    ) -> Self {
        let name = name.into();
        let instrument_id = instrument_id.into();
        info!(
            "[{}] created for {} with window={} k={} qty={}",
            name, instrument_id, window, num_std_devs, order_quantity
        );
        Self {
            state: Mutex::new(MeanReversionState {
                prices: VecDeque::with_capacity(window + 1),
                tracker: OrderTracker::new(&name, &instrument_id),
            }),
            name,
            instrument_id,
            window,
            num_std_devs,
            order_quantity,
            active: AtomicBool::new(false),
            order_manager,
            market_data,
        }
    }

    fn send_market_order(&self, side: OrderSide, client_order_id: String) {
        info!(
            "[{}] sending {} {} x{} (cloid={})",
            self.name, side, self.instrument_id, self.order_quantity, client_order_id
        );
        let mut order = Order::market(client_order_id, &self.instrument_id, side, self.order_quantity);
        if !self.order_manager.send_order(&mut order) {
            warn!("[{}] order {} was rejected", self.name, order.client_order_id);
        }
    }
}

impl Strategy for MeanReversionStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_market_data(&self, tick: &Tick) {
        if !self.active.load(Ordering::SeqCst) || tick.instrument_id != self.instrument_id {
            return;
        }
        if !tick.is_trade() || tick.price <= 0.0 {
            return;
        }

        // Decide under the state lock, send after releasing it: the fill
        // report re-enters `on_execution_report` on this same thread.
        let decision = {
            let mut state = self.state.lock().unwrap();

            state.prices.push_back(tick.price);
            if state.prices.len() > self.window {
                state.prices.pop_front();
            }
            if state.prices.len() < self.window {
                return;
            }

            let sma = mean(&state.prices);
            let std_dev = population_std_dev(&state.prices, sma);
            if std_dev == 0.0 {
                return;
            }
            let upper_band = sma + self.num_std_devs * std_dev;
            let lower_band = sma - self.num_std_devs * std_dev;

            debug!(
                "[{}] {} px={:.2} sma={:.2} sd={:.2} ub={:.2} lb={:.2} pos={} in_flight={}",
                self.name,
                self.instrument_id,
                tick.price,
                sma,
                std_dev,
                upper_band,
                lower_band,
                state.tracker.has_open_position(),
                !state.tracker.can_send()
            );

            if !state.tracker.can_send() {
                return;
            }

            let side = if !state.tracker.has_open_position() {
                if tick.price > upper_band {
                    // Fade the spike.
                    Some(OrderSide::Sell)
                } else if tick.price < lower_band {
                    Some(OrderSide::Buy)
                } else {
                    None
                }
            } else {
                match state.tracker.position_side() {
                    Some(OrderSide::Sell) if tick.price <= sma => Some(OrderSide::Buy),
                    Some(OrderSide::Buy) if tick.price >= sma => Some(OrderSide::Sell),
                    _ => None,
                }
            };

            side.map(|side| (side, state.tracker.begin_order(side)))
        };

        if let Some((side, client_order_id)) = decision {
            self.send_market_order(side, client_order_id);
        }
    }

    fn on_execution_report(&self, report: &ExecutionReport) {
        let mut state = self.state.lock().unwrap();
        if !state.tracker.owns(report) {
            return;
        }

        if state.tracker.on_execution_report(report, self.order_quantity) {
            match report.status {
                OrderStatus::Rejected => warn!(
                    "[{}] order {} rejected: {}",
                    self.name, report.client_order_id, report.reject_reason
                ),
                OrderStatus::Cancelled => {
                    info!("[{}] order {} cancelled", self.name, report.client_order_id)
                }
                _ => info!(
                    "[{}] position {} for {}",
                    self.name,
                    if state.tracker.has_open_position() {
                        "opened"
                    } else {
                        "closed"
                    },
                    self.instrument_id
                ),
            }
        }
    }

    fn start(&self) {
        self.active.store(true, Ordering::SeqCst);
        self.market_data.subscribe(&self.instrument_id);
        info!("[{}] started, subscribed to {}", self.name, self.instrument_id);
    }

    fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.market_data.unsubscribe(&self.instrument_id);
        info!("[{}] stopped, unsubscribed from {}", self.name, self.instrument_id);
    }
}
