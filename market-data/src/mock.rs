//! A mock `MarketDataSource` driven by a dedicated producer thread.
//!
//! Each subscribed instrument gets one tick per scheduler pass: the mid price
//! takes a small random walk, a spread is drawn around it, and the event type
//! is drawn as 10% bid update / 10% ask update / 80% trade. The walk order
//! over instruments is deterministic (sorted), the per-instrument pacing
//! comes from the configured tick rate.

use chrono::Utc;
use log::{debug, error, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sim_api::{MarketDataCallback, MarketDataSource, Tick, UpdateType};
use std::collections::{BTreeSet, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Last known top-of-book per instrument, used to seed the next tick.
#[derive(Debug, Clone, PartialEq)]
struct InstrumentState {
    bid_price: f64,
    ask_price: f64,
    last_trade_price: f64,
}

#[derive(Default)]
struct FeedState {
    subscriptions: BTreeSet<String>,
    instruments: HashMap<String, InstrumentState>,
}

/// Synthetic tick generator with a bounded scheduler.
///
/// `start` spawns the producer thread; `stop` (also run on drop) requests
/// shutdown and joins it. The callback slot holds exactly one callback and is
/// invoked on the producer thread with no internal locks held.
pub struct MockMarketDataSource {
    tick_interval: Duration,
    state: Arc<Mutex<FeedState>>,
    callback: Arc<Mutex<Option<MarketDataCallback>>>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl MockMarketDataSource {
    /// Creates a source emitting roughly `tick_rate_hz_per_instrument` ticks
    /// per second per subscribed instrument. A non-positive rate is coerced
    /// to 1 Hz.
    pub fn new(tick_rate_hz_per_instrument: f64) -> Self {
        let interval_secs = if tick_rate_hz_per_instrument <= 0.0 {
            1.0
        } else {
            1.0 / tick_rate_hz_per_instrument
        };
        info!(
            "MockMarketDataSource created, tick interval {:.3}s per instrument",
            interval_secs
        );
        Self {
            tick_interval: Duration::from_secs_f64(interval_secs),
            state: Arc::new(Mutex::new(FeedState::default())),
            callback: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }
}

impl MarketDataSource for MockMarketDataSource {
    fn set_market_data_callback(&self, callback: MarketDataCallback) {
        *self.callback.lock().unwrap() = Some(callback);
    }

    fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("mock feed already running");
            return;
        }

        let state = Arc::clone(&self.state);
        let callback = Arc::clone(&self.callback);
        let running = Arc::clone(&self.running);
        let tick_interval = self.tick_interval;

        let handle = thread::spawn(move || {
            producer_loop(state, callback, running, tick_interval);
        });
        *self.handle.lock().unwrap() = Some(handle);
        info!("mock feed started");
    }

    fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            debug!("mock feed not running");
            return;
        }
        if let Some(handle) = self.handle.lock().unwrap().take() {
            let _ = handle.join();
        }
        info!("mock feed stopped");
    }

    fn subscribe(&self, instrument_id: &str) {
        let mut state = self.state.lock().unwrap();
        state.subscriptions.insert(instrument_id.to_string());
        state
            .instruments
            .entry(instrument_id.to_string())
            .or_insert_with(|| seed_state(instrument_id));
        info!("subscribed to {}", instrument_id);
    }

    fn unsubscribe(&self, instrument_id: &str) {
        let mut state = self.state.lock().unwrap();
        state.subscriptions.remove(instrument_id);
        state.instruments.remove(instrument_id);
        info!("unsubscribed from {}", instrument_id);
    }
}

impl Drop for MockMarketDataSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Initial top-of-book for a freshly subscribed instrument.
fn seed_state(instrument_id: &str) -> InstrumentState {
    let (bid, ask, last) = match instrument_id {
        "AAPL" => (150.00, 150.05, 150.03),
        "SPY" => (100.00, 100.05, 100.02),
        _ => (50.00, 50.05, 50.02),
    };
    InstrumentState {
        bid_price: bid,
        ask_price: ask,
        last_trade_price: last,
    }
}

/// Fallback mid when the stored prices are unusable.
fn default_mid(instrument_id: &str) -> f64 {
    match instrument_id {
        "AAPL" => 150.0,
        "SPY" => 500.0,
        _ => 100.0,
    }
}

fn producer_loop(
    state: Arc<Mutex<FeedState>>,
    callback: Arc<Mutex<Option<MarketDataCallback>>>,
    running: Arc<AtomicBool>,
    tick_interval: Duration,
) {
    // One generator for the lifetime of the producer thread.
    let mut rng = StdRng::from_entropy();
    info!("market data producer thread started");

    while running.load(Ordering::SeqCst) {
        let instruments: Vec<String> = {
            let state = state.lock().unwrap();
            state.subscriptions.iter().cloned().collect()
        };

        if instruments.is_empty() {
            thread::sleep(Duration::from_millis(100));
            continue;
        }

        for instrument_id in instruments {
            if !running.load(Ordering::SeqCst) {
                break;
            }

            let tick = {
                let mut state = state.lock().unwrap();
                // The instrument may have been unsubscribed since the snapshot.
                state
                    .instruments
                    .get_mut(&instrument_id)
                    .map(|instrument| generate_tick(&instrument_id, instrument, &mut rng))
            };

            if let Some(tick) = tick {
                dispatch(&callback, &tick);
            }

            thread::sleep(tick_interval);
        }
    }

    info!("market data producer thread exiting");
}

/// Invokes the registered callback, if any, isolating panics so the producer
/// thread survives misbehaving consumers.
fn dispatch(callback: &Mutex<Option<MarketDataCallback>>, tick: &Tick) {
    let cb = callback.lock().unwrap().clone();
    let Some(cb) = cb else {
        // No consumer registered: ticks are dropped silently.
        return;
    };
    if catch_unwind(AssertUnwindSafe(|| cb(tick))).is_err() {
        error!(
            "market data callback panicked on {} tick for {}",
            tick.update_type, tick.instrument_id
        );
    }
}

/// Generates one tick and advances the stored instrument state.
fn generate_tick(instrument_id: &str, state: &mut InstrumentState, rng: &mut StdRng) -> Tick {
    let mut mid = state.last_trade_price;
    if mid <= 0.0001 {
        mid = (state.bid_price + state.ask_price) / 2.0;
    }
    if mid <= 0.0001 {
        mid = default_mid(instrument_id);
    }

    let new_mid = mid * rng.gen_range(0.98..1.02);
    let spread = (new_mid * rng.gen_range(0.001..0.005)).max(0.01);

    let bid_price = new_mid - spread / 2.0;
    let mut ask_price = new_mid + spread / 2.0;
    if ask_price <= bid_price {
        ask_price = bid_price + 0.01;
    }

    // 10% bid update, 10% ask update, 80% trade.
    let (update_type, price, quantity) = match rng.gen_range(0..10) {
        0 => {
            state.bid_price = bid_price;
            (UpdateType::Bid, bid_price, rng.gen_range(1..=10) * 10)
        }
        1 => {
            state.ask_price = ask_price;
            (UpdateType::Ask, ask_price, rng.gen_range(1..=10) * 10)
        }
        _ => {
            // Trade prints at the bid 25% of the time, at the ask 25%, near
            // the mid otherwise.
            let selector: f64 = rng.gen();
            let price = if selector < 0.25 {
                bid_price
            } else if selector < 0.5 {
                ask_price
            } else {
                new_mid * (1.0 + rng.gen_range(-0.0005..0.0005))
            };
            state.last_trade_price = price;
            // Quotes retighten around the print.
            state.bid_price = price * (1.0 - rng.gen_range(0.001..0.005) / 1.5);
            state.ask_price = price * (1.0 + rng.gen_range(0.001..0.005) / 1.5);
            if state.ask_price <= state.bid_price {
                state.ask_price = state.bid_price + 0.01;
            }
            (UpdateType::Trade, price, rng.gen_range(1..=10))
        }
    };

    Tick {
        instrument_id: instrument_id.to_string(),
        timestamp: Utc::now().timestamp_millis(),
        bid_price,
        ask_price,
        last_price: state.last_trade_price,
        update_type,
        price,
        quantity,
        volume: quantity,
    }
}
