//! Curvemirror - pump.fun bonding-curve copy trader
//! Built with Domain-Driven Design principles

pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export main types for convenience
pub use application::TradeDispatcher;
pub use domain::execution::{PumpFunInstructionBuilder, TransactionAssembler};
pub use domain::fees::FeeOracle;
pub use domain::orders::OrderBook;
pub use domain::risk::RiskGovernor;
pub use infrastructure::blockchain::Submitter;
