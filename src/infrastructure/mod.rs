//! Infrastructure layer - ledger, relay, feed and notification adapters

pub mod blockchain;
pub mod feed;
pub mod notify;
pub mod relay;
