//! Indicator-driven strategies.
//!
//! Both strategies follow the same discipline: they watch trade prints for a
//! single instrument, hold at most one client order in flight at a time, and
//! at most one open position (long or short) which they enter and exit with
//! fixed-size market orders.

pub mod error;
pub mod mean_reversion;
pub mod momentum;
pub mod tracker;

mod stats;

#[cfg(test)]
mod testing;

pub use error::StrategyError;
pub use mean_reversion::MeanReversionStrategy;
pub use momentum::MomentumStrategy;
