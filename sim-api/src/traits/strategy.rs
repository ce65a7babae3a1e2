//! Strategy hosting contract.

use crate::model::execution::ExecutionReport;
use crate::model::tick::Tick;

/// A trading strategy: consumes ticks and execution reports, emits orders
/// through the order manager it was constructed with.
///
/// Handlers take `&self` because the execution-report callback can re-enter a
/// strategy while its own `on_market_data` frame is still on the stack (fills
/// are synthesized inline with the tick that triggered the order).
/// Implementations keep mutable state behind a short-lived internal lock that
/// is never held across a `send_order` call.
///
/// Tick handlers run on the data source's producer thread; report handlers on
/// whichever thread invoked the order manager.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Called for every tick the host fans out. Strategies filter to their
    /// own instrument and ignore everything while stopped.
    fn on_market_data(&self, tick: &Tick);

    /// Called for every execution report the host fans out.
    fn on_execution_report(&self, report: &ExecutionReport);

    /// Activates the strategy; expected to subscribe to its instrument.
    fn start(&self);

    /// Deactivates the strategy and unsubscribes. Late-arriving ticks are
    /// discarded by the active-flag guard.
    fn stop(&self);
}
