pub mod model;
pub mod traits;

pub use model::execution::ExecutionReport;
pub use model::order::{Order, OrderSide, OrderStatus, OrderType};
pub use model::position::Position;
pub use model::tick::{Tick, UpdateType};
pub use traits::market_data::{MarketDataCallback, MarketDataSource};
pub use traits::strategy::Strategy;
pub use traits::ExecutionReportCallback;
