pub mod execution;
pub mod order;
pub mod position;
pub mod tick;

pub use execution::*;
pub use order::*;
pub use position::*;
pub use tick::*;
