use super::config::{InstrumentRiskState, RiskConfig};
use super::RiskCheckResult;
use log::{debug, info};
use sim_api::{ExecutionReport, Order, OrderSide, OrderStatus, Position};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct RiskState {
    config: RiskConfig,
    instruments: HashMap<String, InstrumentRiskState>,
    /// Cached sum of |net_position| across all instruments.
    total_open_contracts: i64,
}

/// Stateful pre-trade risk checks plus post-fill bookkeeping.
///
/// All state sits behind a single mutex. The lock is a leaf: it is never held
/// while calling into any other component, so the engine can be consulted
/// from whichever thread drives the order manager.
pub struct RiskEngine {
    state: Mutex<RiskState>,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            state: Mutex::new(RiskState {
                config,
                ..Default::default()
            }),
        }
    }

    /// Replaces the active configuration. Accumulated per-instrument state
    /// (net positions, daily volume) is preserved.
    pub fn load_configuration(&self, config: RiskConfig) {
        let mut state = self.state.lock().unwrap();
        info!(
            "risk configuration loaded: max_order_size={} per_instrument_cap={} total_cap={} daily_volume_cap={} whitelist={}",
            config.max_order_size,
            config.max_open_contracts_per_instrument,
            config.max_total_contracts_across_all_instruments,
            config.max_daily_volume_per_instrument,
            if config.allowed_instruments.is_empty() {
                "any".to_string()
            } else {
                format!("{} instruments", config.allowed_instruments.len())
            }
        );
        state.config = config;
    }

    /// Runs the fixed check sequence; the first failing limit wins.
    ///
    /// `current_position` is the order manager's authoritative view of the
    /// instrument's position. The aggregate check (last) uses this engine's
    /// own mirrored nets instead; the two agree once fills have propagated.
    pub fn check_order_pre_send(
        &self,
        order: &Order,
        current_position: &Position,
    ) -> RiskCheckResult {
        let state = self.state.lock().unwrap();

        if order.quantity > state.config.max_order_size {
            return RiskCheckResult::RejectedMaxOrderSize;
        }

        if !state.config.allowed_instruments.is_empty()
            && !state.config.allowed_instruments.contains(&order.instrument_id)
        {
            return RiskCheckResult::RejectedInstrumentNotAllowed;
        }

        let instrument = state
            .instruments
            .get(&order.instrument_id)
            .copied()
            .unwrap_or_default();

        if instrument.daily_traded_volume + order.quantity
            > state.config.max_daily_volume_per_instrument
        {
            return RiskCheckResult::RejectedMaxDailyVolumeInstrument;
        }

        let potential_net = current_position.quantity + order.side.signed(order.quantity);
        if potential_net.abs() > state.config.max_open_contracts_per_instrument {
            return RiskCheckResult::RejectedMaxOpenContractsInstrument;
        }

        let mirrored_net_after = instrument.net_position + order.side.signed(order.quantity);
        let potential_total = state.total_open_contracts - instrument.net_position.abs()
            + mirrored_net_after.abs();
        if potential_total > state.config.max_total_contracts_across_all_instruments {
            return RiskCheckResult::RejectedMaxOpenContractsTotal;
        }

        RiskCheckResult::Approved
    }

    /// Folds a fill into the per-instrument state and the cached aggregate.
    /// Only fill events move state; acks, cancels and rejects are ignored.
    pub fn update_on_fill(&self, report: &ExecutionReport, side: OrderSide) {
        if !matches!(
            report.status,
            OrderStatus::Filled | OrderStatus::PartiallyFilled
        ) || report.filled_quantity == 0
        {
            return;
        }

        let mut state = self.state.lock().unwrap();
        let instrument = state
            .instruments
            .entry(report.instrument_id.clone())
            .or_default();

        instrument.daily_traded_volume += report.filled_quantity;
        let old_abs = instrument.net_position.abs();
        instrument.net_position += side.signed(report.filled_quantity);
        let new_net = instrument.net_position;
        let new_volume = instrument.daily_traded_volume;

        state.total_open_contracts += new_net.abs() - old_abs;
        debug!(
            "risk state updated: {} net={} daily_volume={} total_open={}",
            report.instrument_id, new_net, new_volume, state.total_open_contracts
        );
    }

    /// Snapshot of one instrument's risk state.
    pub fn instrument_state(&self, instrument_id: &str) -> InstrumentRiskState {
        self.state
            .lock()
            .unwrap()
            .instruments
            .get(instrument_id)
            .copied()
            .unwrap_or_default()
    }

    /// Current aggregate exposure: sum of |net position| across instruments.
    pub fn total_open_contracts(&self) -> i64 {
        self.state.lock().unwrap().total_open_contracts
    }
}
