//! Application layer - trade dispatch and background cycles

pub mod cycles;
pub mod dispatcher;

pub use dispatcher::{decide, DispatchError, DispatchOutcome, TradeAction, TradeDispatcher, TradeSettings};
