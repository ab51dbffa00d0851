//! Per-asset order state machine

use std::collections::HashMap;

use tracing::{debug, info};

use super::{Order, OrderStatus, TAKE_PROFIT_THRESHOLD_PCT};
use crate::shared::types::{Origin, PoolRefs, Side};
use crate::shared::utils::solscan_link;

/// A single observed trade, already normalized from the feed.
#[derive(Debug, Clone)]
pub struct TradeObservation {
    pub mint: String,
    pub side: Side,
    pub price: f64,
    pub amount: f64,
    pub origin: Origin,
    pub signature: String,
    pub pool_refs: Option<PoolRefs>,
}

/// Notional volume recorded for a mint
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MintVolume {
    pub buy_volume: f64,
    pub sell_volume: f64,
}

/// Market view of a mint built from its orders
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSummary {
    pub mint: String,
    pub highest_bid: f64,
    pub lowest_ask: f64,
    pub spread: f64,
    pub volume: MintVolume,
}

/// Owns the mint -> order mapping.
///
/// At most one live (non-closed) order exists per mint. A closed order stays in
/// its slot until a new buy for the same mint reopens it, at which point the
/// closed record moves into `closed_history`.
#[derive(Debug, Default)]
pub struct OrderBook {
    orders: HashMap<String, Order>,
    closed_history: Vec<Order>,
}

impl OrderBook {
    pub fn new() -> Self {
        info!("Order book initialized");
        Self::default()
    }

    /// Apply one observed trade. Returns the order when the call produced an
    /// order the caller may act on, `None` otherwise.
    pub fn process_trade(&mut self, trade: &TradeObservation) -> Option<Order> {
        let now = chrono::Utc::now().timestamp_millis();
        let existing_status = self.orders.get(&trade.mint).map(|order| order.status);

        match (existing_status, trade.side) {
            (None, Side::Buy) | (Some(OrderStatus::Closed), Side::Buy) => {
                let pool_refs = trade.pool_refs?;
                if let Some(closed) = self.orders.remove(&trade.mint) {
                    self.closed_history.push(closed);
                }
                info!(
                    "[{}] BUY => {} => {} SOL => {} TOTAL",
                    trade.mint,
                    trade.amount,
                    trade.price,
                    trade.price * trade.amount
                );
                info!("{}", solscan_link(&trade.signature));
                let order = Order {
                    mint: trade.mint.clone(),
                    status: OrderStatus::Pending,
                    amount_bought: trade.amount,
                    amount_sold: 0.0,
                    price_bought: trade.price,
                    price_sold: 0.0,
                    timestamp_bought: now,
                    timestamp_sold: 0,
                    pnl: 0.0,
                    origin: trade.origin.clone(),
                    pool_refs,
                };
                self.orders.insert(trade.mint.clone(), order.clone());
                Some(order)
            }
            (Some(OrderStatus::Pending), Side::Buy) => {
                let order = self.orders.get_mut(&trade.mint)?;
                order.status = OrderStatus::Open;
                order.amount_bought = trade.amount;
                order.price_bought = trade.price;
                order.timestamp_bought = now;
                debug!("[{}] position OPEN at {}", order.mint, order.price_bought);
                Some(order.clone())
            }
            (Some(OrderStatus::Open), Side::Sell) => {
                let order = self.orders.get_mut(&trade.mint)?;
                let price_diff = trade.price - order.price_bought;
                let pnl = price_diff * order.amount_bought;
                let pnl_percentage = order.pnl_percentage(trade.price);

                let should_close = match &trade.origin {
                    Origin::Normal => pnl_percentage >= TAKE_PROFIT_THRESHOLD_PCT,
                    origin => origin.is_risk_exit(),
                };
                if !should_close {
                    return None;
                }

                order.amount_sold += order.amount_bought;
                order.price_sold = trade.price;
                order.timestamp_sold = now;
                order.pnl = pnl;
                order.status = OrderStatus::Closed;
                order.origin = trade.origin.clone();
                info!(
                    "[{}] PNL: {:.2} ({:.4}%) POSITION CLOSED",
                    order.mint, pnl, pnl_percentage
                );
                info!("{}", solscan_link(&trade.signature));
                Some(order.clone())
            }
            _ => self.orders.get(&trade.mint).cloned(),
        }
    }

    pub fn get(&self, mint: &str) -> Option<Order> {
        self.orders.get(mint).cloned()
    }

    pub fn order_status(&self, mint: &str) -> Option<OrderStatus> {
        self.orders.get(mint).map(|order| order.status)
    }

    /// Put back the order a failed action was based on.
    ///
    /// `previous` is the slot content captured before `process_trade`; `None`
    /// removes the slot. Undoing a reopen also drops the closed record that the
    /// reopen moved into history.
    pub fn restore(&mut self, mint: &str, previous: Option<Order>) {
        match previous {
            Some(order) => {
                if order.status == OrderStatus::Closed {
                    if let Some(idx) = self
                        .closed_history
                        .iter()
                        .rposition(|closed| closed == &order)
                    {
                        self.closed_history.remove(idx);
                    }
                }
                self.orders.insert(mint.to_string(), order);
            }
            None => {
                self.orders.remove(mint);
            }
        }
    }

    /// Every live order.
    pub fn snapshot(&self) -> Vec<Order> {
        self.orders
            .values()
            .filter(|order| order.status.is_live())
            .cloned()
            .collect()
    }

    /// Every closed order, including those whose slot has since been reopened.
    pub fn closed_orders(&self) -> Vec<Order> {
        self.closed_history
            .iter()
            .chain(
                self.orders
                    .values()
                    .filter(|order| order.status == OrderStatus::Closed),
            )
            .cloned()
            .collect()
    }

    pub fn executed_count(&self) -> usize {
        self.closed_history.len()
            + self
                .orders
                .values()
                .filter(|order| order.status == OrderStatus::Closed)
                .count()
    }

    pub fn mint_volume(&self, mint: &str) -> MintVolume {
        self.orders_for_mint(mint)
            .fold(MintVolume::default(), |mut volume, order| {
                volume.buy_volume += order.amount_bought * order.price_bought;
                volume.sell_volume += order.amount_sold * order.price_sold;
                volume
            })
    }

    pub fn market_summary(&self, mint: &str) -> MarketSummary {
        let mut highest_bid: f64 = 0.0;
        let mut lowest_ask = f64::MAX;

        for order in self.orders_for_mint(mint) {
            highest_bid = highest_bid.max(order.price_bought);
            if order.price_sold > 0.0 && order.price_sold < lowest_ask {
                lowest_ask = order.price_sold;
            }
        }

        let (lowest_ask, spread) = if lowest_ask == f64::MAX {
            (0.0, 0.0)
        } else {
            (lowest_ask, lowest_ask - highest_bid)
        };

        MarketSummary {
            mint: mint.to_string(),
            highest_bid,
            lowest_ask,
            spread,
            volume: self.mint_volume(mint),
        }
    }

    fn orders_for_mint<'a>(&'a self, mint: &'a str) -> impl Iterator<Item = &'a Order> + 'a {
        self.closed_history
            .iter()
            .filter(move |order| order.mint == mint)
            .chain(self.orders.get(mint))
    }
}
