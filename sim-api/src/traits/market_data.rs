//! Market data source capability.

use crate::model::tick::Tick;
use std::sync::Arc;

/// Single-slot callback for market data ticks. Invoked on the source's
/// producer thread; a later `set_market_data_callback` replaces it.
pub type MarketDataCallback = Arc<dyn Fn(&Tick) + Send + Sync>;

/// A producer of market data ticks.
///
/// Implementations run their own producer thread (or translate an external
/// feed) and push every event for subscribed instruments into the registered
/// callback. All methods take `&self`: sources are shared as
/// `Arc<dyn MarketDataSource>` between the host and strategies, so mutation
/// happens behind interior synchronization.
///
/// This trait is the extension seam at the data-source boundary: a live feed
/// implements `start`/`stop` by connecting and disconnecting its transport
/// and translating wire messages into `Tick`s.
pub trait MarketDataSource: Send + Sync {
    /// Registers the tick callback, replacing any previous one.
    fn set_market_data_callback(&self, callback: MarketDataCallback);

    /// Starts publishing. No-op if already running.
    fn start(&self);

    /// Stops publishing and waits for in-flight work to finish.
    fn stop(&self);

    /// Adds an instrument to the subscription set. Idempotent.
    fn subscribe(&self, instrument_id: &str);

    /// Removes an instrument from the subscription set. Idempotent.
    fn unsubscribe(&self, instrument_id: &str);
}

impl MarketDataSource for Arc<dyn MarketDataSource> {
    fn set_market_data_callback(&self, callback: MarketDataCallback) {
        (**self).set_market_data_callback(callback)
    }

    fn start(&self) {
        (**self).start()
    }

    fn stop(&self) {
        (**self).stop()
    }

    fn subscribe(&self, instrument_id: &str) {
        (**self).subscribe(instrument_id)
    }

    fn unsubscribe(&self, instrument_id: &str) {
        (**self).unsubscribe(instrument_id)
    }
}
