//! The execution side of the simulator: order lifecycle management, fill
//! simulation behind the `Exchange` seam, and centralized pre-trade risk.

pub mod exchange;
pub mod oms;
pub mod risk;

pub use exchange::{Exchange, ExchangeOutcome, SimulatedExchange};
pub use oms::OrderManager;
pub use risk::{RiskCheckResult, RiskConfig, RiskEngine};
