//! Inbound trade event feed

pub mod trade_feed_server;

pub use trade_feed_server::{parse_trade_event, TradeFeedServer};
