//! Momentum via a dual-SMA crossover.
//!
//! Two bounded windows (short inside long) track the last trade prices. A
//! bullish crossover (the short SMA moving from at-or-below to above the
//! long SMA between consecutive samples) opens a long; a bearish crossover
//! opens a short; the opposite crossover closes the position.

use crate::error::StrategyError;
use crate::stats::mean;
use crate::tracker::OrderTracker;
use execution_engine::OrderManager;
use log::{debug, info, warn};
use sim_api::{
    ExecutionReport, MarketDataSource, Order, OrderSide, OrderStatus, Strategy, Tick,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

struct MomentumState {
    short_prices: VecDeque<f64>,
    long_prices: VecDeque<f64>,
    prev_short_sma: f64,
    prev_long_sma: f64,
    tracker: OrderTracker,
}

pub struct MomentumStrategy {
    name: String,
    instrument_id: String,
    short_window: usize,
    long_window: usize,
    order_quantity: i64,
    active: AtomicBool,
    state: Mutex<MomentumState>,
    order_manager: Arc<OrderManager>,
    market_data: Arc<dyn MarketDataSource>,
}

impl MomentumStrategy {
    /// Fails when `short_window >= long_window`: the crossover is undefined
    /// and the strategy refuses to exist, let alone start.
    pub fn new(
        name: impl Into<String>,
        instrument_id: impl Into<String>,
        short_window: usize,
        long_window: usize,
        order_quantity: i64,
        order_manager: Arc<OrderManager>,
        market_data: Arc<dyn MarketDataSource>,
    ) -> Result<Self, StrategyError> {
        if short_window >= long_window {
            return Err(StrategyError::InvalidWindows {
                short: short_window,
                long: long_window,
            });
        }

        let name = name.into();
        let instrument_id = instrument_id.into();
        info!(
            "[{}] created for {} with short={} long={} qty={}",
            name, instrument_id, short_window, long_window, order_quantity
        );
        Ok(Self {
            state: Mutex::new(MomentumState {
                short_prices: VecDeque::with_capacity(short_window + 1),
                long_prices: VecDeque::with_capacity(long_window + 1),
                prev_short_sma: 0.0,
                prev_long_sma: 0.0,
                tracker: OrderTracker::new(&name, &instrument_id),
            }),
            name,
            instrument_id,
            short_window,
            long_window,
            order_quantity,
            active: AtomicBool::new(false),
            order_manager,
            market_data,
        })
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

impl Strategy for MomentumStrategy {
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

        let decision = {
            let mut state = self.state.lock().unwrap();

            state.short_prices.push_back(tick.price);
            if state.short_prices.len() > self.short_window {
                state.short_prices.pop_front();
            }
            state.long_prices.push_back(tick.price);
            if state.long_prices.len() > self.long_window {
                state.long_prices.pop_front();
            }
            if state.short_prices.len() < self.short_window
                || state.long_prices.len() < self.long_window
            {
                return;
            }

            let current_short = mean(&state.short_prices);
            let current_long = mean(&state.long_prices);
            let prev_short = state.prev_short_sma;
            let prev_long = state.prev_long_sma;

            debug!(
                "[{}] {} px={:.2} sma_s({})={:.2} sma_l({})={:.2} pos={} in_flight={}",
                self.name,
                self.instrument_id,
                tick.price,
                self.short_window,
                current_short,
                self.long_window,
                current_long,
                state.tracker.has_open_position(),
                !state.tracker.can_send()
            );

            if !state.tracker.can_send() {
                // The previous SMA pair is deliberately not advanced while an
                // order is in flight.
                return;
            }

            let bullish = prev_short <= prev_long && current_short > current_long;
            let bearish = prev_short >= prev_long && current_short < current_long;

            let mut side = None;
            // The first evaluations, before a previous pair exists, never trade.
            if prev_short > 0.0001 && prev_long > 0.0001 {
                if !state.tracker.has_open_position() {
                    if bullish {
                        side = Some(OrderSide::Buy);
                    } else if bearish {
                        side = Some(OrderSide::Sell);
                    }
                } else {
                    match state.tracker.position_side() {
                        Some(OrderSide::Buy) if bearish => side = Some(OrderSide::Sell),
                        Some(OrderSide::Sell) if bullish => side = Some(OrderSide::Buy),
                        _ => {}
                    }
                }
            }

            state.prev_short_sma = current_short;
            state.prev_long_sma = current_long;

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
        {
            // Stale crossover context must not survive a stop/start cycle.
            let mut state = self.state.lock().unwrap();
            state.prev_short_sma = 0.0;
            state.prev_long_sma = 0.0;
        }
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
