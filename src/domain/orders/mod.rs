//! Orders domain - per-asset position lifecycle

mod order_book;

pub use order_book::{MarketSummary, MintVolume, OrderBook, TradeObservation};

use crate::shared::types::{Origin, PoolRefs};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gain (in percent) an organically observed sell needs before a position closes.
pub const TAKE_PROFIT_THRESHOLD_PCT: f64 = 20.0;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Intent registered, no confirmed fill.
    Pending,
    /// Confirmed entry.
    Open,
    /// Terminal, realized PnL recorded.
    Closed,
}

impl OrderStatus {
    pub fn is_live(&self) -> bool {
        !matches!(self, OrderStatus::Closed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Open => write!(f, "OPEN"),
            OrderStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

/// One tracked position, keyed by mint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub mint: String,
    pub status: OrderStatus,
    pub amount_bought: f64,
    pub amount_sold: f64,
    pub price_bought: f64,
    pub price_sold: f64,
    pub timestamp_bought: i64,
    pub timestamp_sold: i64,
    pub pnl: f64,
    pub origin: Origin,
    pub pool_refs: PoolRefs,
}

impl Order {
    /// PnL in percent of the entry price for a hypothetical exit at `price`.
    pub fn pnl_percentage(&self, price: f64) -> f64 {
        crate::shared::utils::calculate_percentage_change(self.price_bought, price)
    }
}
