use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Limits enforced by the risk engine before an order is released.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Largest quantity a single order may carry.
    pub max_order_size: i64,
    /// Cap on |net position| for any single instrument.
    pub max_open_contracts_per_instrument: i64,
    /// Cap on the sum of |net position| across all instruments.
    pub max_total_contracts_across_all_instruments: i64,
    /// Cap on total traded volume (buys + sells) per instrument per session.
    pub max_daily_volume_per_instrument: i64,
    /// Whitelist of tradable instruments. Empty means all are allowed.
    pub allowed_instruments: HashSet<String>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_order_size: 1_000_000,
            max_open_contracts_per_instrument: 5_000,
            max_total_contracts_across_all_instruments: 20_000,
            max_daily_volume_per_instrument: 100_000,
            allowed_instruments: HashSet::new(),
        }
    }
}

/// Per-instrument state the risk engine accumulates from fills.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentRiskState {
    /// Signed net position as observed through fills.
    pub net_position: i64,
    /// Sum of absolute filled quantities in the current session.
    pub daily_traded_volume: i64,
}
