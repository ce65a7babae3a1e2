//! Synthetic market data generation.
//!
//! `MockMarketDataSource` produces plausible-looking per-instrument ticks on
//! a dedicated producer thread. It implements the `MarketDataSource`
//! capability, so a host can swap it for a live feed without touching the
//! rest of the pipeline.

pub mod mock;

pub use mock::MockMarketDataSource;
