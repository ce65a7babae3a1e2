use thiserror::Error;

/// Configuration errors caught at strategy construction.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// A crossover strategy needs the short window strictly inside the long one.
    #[error("short MA window ({short}) must be less than long MA window ({long})")]
    InvalidWindows { short: usize, long: usize },
}
