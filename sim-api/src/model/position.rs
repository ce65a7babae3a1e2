//! Net signed holdings per instrument.

use serde::{Deserialize, Serialize};

/// Net position for one instrument, with cost basis and realized PnL.
///
/// A flat position (`quantity == 0`) always has `average_entry_price == 0`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Position {
    pub instrument_id: String,
    /// Signed quantity: positive is long, negative is short.
    pub quantity: i64,
    /// Average entry price of the open quantity; 0 when flat.
    pub average_entry_price: f64,
    /// PnL realized by closing fills, accumulated over the session.
    pub realized_pnl: f64,
}

impl Position {
    pub fn new(instrument_id: impl Into<String>) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            ..Default::default()
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0
    }
}
