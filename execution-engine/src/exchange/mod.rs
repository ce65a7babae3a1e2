//! The exchange seam: where fills come from.
//!
//! The order manager consults exactly one `Exchange` implementation after the
//! pre-trade risk check passes. The simulated venue below fills everything
//! instantly; a real matching engine or broker link would plug in here.

use sim_api::Order;

pub mod simulated;

pub use simulated::SimulatedExchange;

/// Result of presenting an order to the venue.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    /// The order traded (possibly partially).
    Filled { price: f64, quantity: i64 },
    /// Accepted without trading; the order rests on the book.
    Acknowledged,
    /// Turned away by the venue.
    Rejected(String),
}

/// Interface for executing orders against a market, real or simulated.
pub trait Exchange: Send + Sync {
    /// Presents an order and returns the synchronous outcome.
    fn execute(&self, order: &Order) -> ExchangeOutcome;
}
