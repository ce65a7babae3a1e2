use super::{Exchange, ExchangeOutcome};
use sim_api::{Order, OrderSide, OrderType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LimitFillMode {
    /// Aggressive-take assumption: limit orders fill fully at their price.
    FillAtLimit,
    /// Limit orders rest on a notional book and are only acknowledged.
    Book,
}

/// The mock venue.
///
/// Market orders fill in full at an instrument-specific nominal price (buys
/// slightly above the reference, sells slightly below). Limit orders either
/// take at their limit price (default) or rest as acknowledged when booking
/// is enabled, which lets hosts exercise the cancel path.
pub struct SimulatedExchange {
    limit_mode: LimitFillMode,
}

impl SimulatedExchange {
    pub fn new() -> Self {
        Self {
            limit_mode: LimitFillMode::FillAtLimit,
        }
    }

    /// A venue where limit orders rest instead of filling.
    pub fn with_limit_booking() -> Self {
        Self {
            limit_mode: LimitFillMode::Book,
        }
    }
}

impl Default for SimulatedExchange {
    fn default() -> Self {
        Self::new()
    }
}

/// Nominal execution prices for market orders, keyed by instrument.
fn nominal_price(instrument_id: &str, side: OrderSide) -> f64 {
    match (instrument_id, side) {
        ("AAPL", OrderSide::Buy) => 150.10,
        ("AAPL", OrderSide::Sell) => 149.90,
        ("SPY", OrderSide::Buy) => 500.10,
        ("SPY", OrderSide::Sell) => 499.90,
        (_, OrderSide::Buy) => 101.0,
        (_, OrderSide::Sell) => 99.0,
    }
}

impl Exchange for SimulatedExchange {
    fn execute(&self, order: &Order) -> ExchangeOutcome {
        match order.order_type {
            OrderType::Market => ExchangeOutcome::Filled {
                price: nominal_price(&order.instrument_id, order.side),
                quantity: order.remaining_quantity(),
            },
            OrderType::Limit(price) => {
                if price <= 0.0 {
                    return ExchangeOutcome::Rejected("Invalid limit price".to_string());
                }
                match self.limit_mode {
                    LimitFillMode::FillAtLimit => ExchangeOutcome::Filled {
                        price,
                        quantity: order.remaining_quantity(),
                    },
                    LimitFillMode::Book => ExchangeOutcome::Acknowledged,
                }
            }
        }
    }
}
