pub mod market_data;
pub mod strategy;

use crate::model::execution::ExecutionReport;
use std::sync::Arc;

/// Single-slot callback for execution reports.
///
/// The order manager holds exactly one; a host that drives several strategies
/// registers one closure that fans out to all of them.
pub type ExecutionReportCallback = Arc<dyn Fn(&ExecutionReport) + Send + Sync>;
