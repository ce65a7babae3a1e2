//! Shared fixtures for the strategy tests.

use execution_engine::{Exchange, ExchangeOutcome, OrderManager};
use sim_api::{
    ExecutionReport, MarketDataCallback, MarketDataSource, Order, Strategy, Tick, UpdateType,
};
use std::sync::{Arc, Mutex};

/// A market data source that only records subscriptions; tests feed ticks to
/// strategies directly.
#[derive(Default)]
pub(crate) struct StubMarketData {
    pub subscriptions: Mutex<Vec<String>>,
}

impl MarketDataSource for StubMarketData {
    fn set_market_data_callback(&self, _callback: MarketDataCallback) {}

    fn start(&self) {}

    fn stop(&self) {}

    fn subscribe(&self, instrument_id: &str) {
        self.subscriptions
            .lock()
            .unwrap()
            .push(instrument_id.to_string());
    }

    fn unsubscribe(&self, instrument_id: &str) {
        self.subscriptions
            .lock()
            .unwrap()
            .retain(|known| known != instrument_id);
    }
}

/// A venue that acknowledges everything and never fills, for pinning orders
/// in the in-flight slot.
pub(crate) struct AckAllExchange;

impl Exchange for AckAllExchange {
    fn execute(&self, _order: &Order) -> ExchangeOutcome {
        ExchangeOutcome::Acknowledged
    }
}

/// Wires the order manager's report callback straight into the strategy, the
/// way a host's fan-out closure would, and collects every report.
pub(crate) fn wire<S: Strategy + 'static>(
    order_manager: &Arc<OrderManager>,
    strategy: &Arc<S>,
) -> Arc<Mutex<Vec<ExecutionReport>>> {
    let reports: Arc<Mutex<Vec<ExecutionReport>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reports);
    let consumer = Arc::clone(strategy);
    order_manager.set_execution_report_callback(Arc::new(move |report: &ExecutionReport| {
        sink.lock().unwrap().push(report.clone());
        consumer.on_execution_report(report);
    }));
    reports
}

/// A well-formed trade print for `instrument_id` at `price`.
pub(crate) fn trade_tick(instrument_id: &str, price: f64) -> Tick {
    Tick {
        instrument_id: instrument_id.to_string(),
        timestamp: 0,
        bid_price: price - 0.05,
        ask_price: price + 0.05,
        last_price: price,
        update_type: UpdateType::Trade,
        price,
        quantity: 5,
        volume: 5,
    }
}
