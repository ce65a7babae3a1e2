//! Market data events.
//!
//! A `Tick` is a single top-of-book event for one instrument: a bid update,
//! an ask update, or a trade print.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of order book event a tick describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateType {
    Bid,
    Ask,
    Trade,
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateType::Bid => write!(f, "BID"),
            UpdateType::Ask => write!(f, "ASK"),
            UpdateType::Trade => write!(f, "TRADE"),
        }
    }
}

/// A single market data event.
///
/// Every published tick satisfies `ask_price > bid_price > 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tick {
    /// The instrument this event belongs to.
    pub instrument_id: String,
    /// Producer-assigned wall-clock time (Unix millis).
    pub timestamp: i64,
    /// Current best bid.
    pub bid_price: f64,
    /// Current best ask.
    pub ask_price: f64,
    /// Last observed trade price for this instrument.
    pub last_price: f64,
    /// What this event is.
    pub update_type: UpdateType,
    /// Price of this event: the quoted side for BID/ASK, the print for TRADE.
    pub price: f64,
    /// Size of this event.
    pub quantity: i64,
    /// Event-scoped volume (equal to `quantity` in the mock feed).
    pub volume: i64,
}

impl Tick {
    /// Midpoint of the current quote.
    pub fn mid(&self) -> f64 {
        (self.bid_price + self.ask_price) / 2.0
    }

    pub fn is_trade(&self) -> bool {
        self.update_type == UpdateType::Trade
    }
}
