//! Periodic background loops

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, warn};

use super::dispatcher::DispatchError;
use crate::domain::fees::{FeeOracle, TipFloorSource};
use crate::domain::orders::OrderBook;
use crate::domain::risk::{BalanceSource, RiskGovernor};
use crate::infrastructure::notify::{SummaryNotifier, TradingSummary};
use crate::shared::errors::AppError;

/// Refresh the wallet balance and the risk floor every `period`.
pub fn spawn_balance_cycle(
    risk: Arc<RiskGovernor>,
    source: Arc<dyn BalanceSource>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = risk.refresh(source.as_ref()).await {
                warn!("Balance refresh failed: {}", e);
            }
        }
    })
}

/// Refresh the tip recommendation every `period`.
pub fn spawn_tip_cycle(
    fees: Arc<FeeOracle>,
    source: Arc<dyn TipFloorSource>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            fees.refresh_or_keep(source.as_ref()).await;
        }
    })
}

/// Send one summary if at least one order has been executed.
pub async fn send_summary_once(
    order_book: &Mutex<OrderBook>,
    risk: &RiskGovernor,
    notifier: &dyn SummaryNotifier,
) -> Result<Option<TradingSummary>, AppError> {
    let executed_count = order_book.lock().await.executed_count();
    if executed_count == 0 {
        return Ok(None);
    }

    let state = risk.snapshot().await;
    let summary = TradingSummary {
        initial_balance: state.initial_balance.unwrap_or(state.current_balance),
        current_balance: state.current_balance,
        executed_count,
    };
    notifier.send_summary(&summary).await?;
    Ok(Some(summary))
}

pub fn spawn_summary_cycle(
    order_book: Arc<Mutex<OrderBook>>,
    risk: Arc<RiskGovernor>,
    notifier: Arc<dyn SummaryNotifier>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match send_summary_once(&order_book, &risk, notifier.as_ref()).await {
                Ok(Some(summary)) => debug!("Summary sent: {:?}", summary),
                Ok(None) => {}
                Err(e) => warn!("Summary notification failed: {}", e),
            }
        }
    })
}

/// Log dispatch failures as they arrive.
pub fn spawn_error_drain(mut errors: mpsc::UnboundedReceiver<DispatchError>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(failure) = errors.recv().await {
            error!(mint = %failure.mint, side = %failure.side, "Trade failed: {}", failure.message);
        }
    })
}
