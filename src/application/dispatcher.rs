//! Turns trade events into order transitions and swaps

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::domain::execution::{
    constants::DEFAULT_TOKEN_DECIMALS, FeeParams, PumpFunInstructionBuilder, SwapRequest,
    TransactionAssembler,
};
use crate::domain::fees::FeeOracle;
use crate::domain::orders::{Order, OrderBook, OrderStatus, TradeObservation};
use crate::domain::risk::RiskGovernor;
use crate::infrastructure::blockchain::{LedgerRpc, SubmitResult, Submitter};
use crate::shared::errors::{ExecutionError, InstructionError};
use crate::shared::types::{Side, TradeEvent};
use crate::shared::utils::{generate_id, solscan_link, sol_to_lamports};

/// Idle lanes stop their worker after this long.
const LANE_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

type Lanes = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<TradeEvent>>>>;

#[derive(Debug, Clone)]
pub struct TradeSettings {
    pub buy_amount_sol: f64,
    pub slippage_pct: f64,
    pub priority_fee_sol: f64,
    /// Ceiling applied to the oracle's tip.
    pub max_tip_sol: f64,
    /// Creators whose trades are our own positions.
    pub tracked_creators: HashSet<String>,
}

impl Default for TradeSettings {
    fn default() -> Self {
        Self {
            buy_amount_sol: 0.1,
            slippage_pct: 50.0,
            priority_fee_sol: 0.005,
            max_tip_sol: 0.005,
            tracked_creators: HashSet::new(),
        }
    }
}

/// Swap to run after a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TradeAction {
    Buy { amount_sol: f64 },
    Sell { amount_tokens: f64 },
}

impl TradeAction {
    pub fn side(&self) -> Side {
        match self {
            TradeAction::Buy { .. } => Side::Buy,
            TradeAction::Sell { .. } => Side::Sell,
        }
    }

    fn amount(&self) -> f64 {
        match self {
            TradeAction::Buy { amount_sol } => *amount_sol,
            TradeAction::Sell { amount_tokens } => *amount_tokens,
        }
    }
}

/// Pick the action for a transition from `previous` to `order`.
///
/// Own trades only act on closing. Other creators open a copy position when a
/// buy creates a pending order and exit it when a sell closes the order.
pub fn decide(
    previous: Option<OrderStatus>,
    order: Option<&Order>,
    event_is_buy: bool,
    own_trade: bool,
    buy_amount_sol: f64,
) -> Option<TradeAction> {
    let order = order?;
    if previous == Some(order.status) {
        return None;
    }

    match (order.status, own_trade, event_is_buy) {
        (OrderStatus::Closed, true, _) | (OrderStatus::Closed, false, false) => {
            Some(TradeAction::Sell {
                amount_tokens: order.amount_bought,
            })
        }
        (OrderStatus::Pending, false, true) => Some(TradeAction::Buy {
            amount_sol: buy_amount_sol,
        }),
        _ => None,
    }
}

/// Failure reported on the error channel.
#[derive(Debug, Clone)]
pub struct DispatchError {
    pub mint: String,
    pub side: Side,
    pub message: String,
}

/// Result of handling one event.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// No transition worth acting on.
    Ignored,
    /// Buy blocked by the balance floor. The transition was undone.
    Suppressed,
    /// The swap ran. Failed swaps had their transition undone.
    Executed(SubmitResult),
    /// Building or simulating failed. The transition was undone.
    Aborted(ExecutionError),
}

struct DispatchCore {
    order_book: Arc<Mutex<OrderBook>>,
    risk: Arc<RiskGovernor>,
    fees: Arc<FeeOracle>,
    rpc: Arc<dyn LedgerRpc>,
    submitter: Arc<Submitter>,
    payer: Arc<Keypair>,
    settings: TradeSettings,
    errors: mpsc::UnboundedSender<DispatchError>,
}

/// Routes events into per-mint lanes. Events for one mint run strictly in
/// arrival order; different mints run concurrently.
pub struct TradeDispatcher {
    core: Arc<DispatchCore>,
    lanes: Lanes,
}

impl TradeDispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_book: Arc<Mutex<OrderBook>>,
        risk: Arc<RiskGovernor>,
        fees: Arc<FeeOracle>,
        rpc: Arc<dyn LedgerRpc>,
        submitter: Arc<Submitter>,
        payer: Arc<Keypair>,
        settings: TradeSettings,
        errors: mpsc::UnboundedSender<DispatchError>,
    ) -> Self {
        Self {
            core: Arc::new(DispatchCore {
                order_book,
                risk,
                fees,
                rpc,
                submitter,
                payer,
                settings,
                errors,
            }),
            lanes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Queue `event` on its mint's lane. Returns immediately.
    pub async fn dispatch(&self, event: TradeEvent) {
        let mut lanes = self.lanes.lock().await;

        let event = match lanes.get(&event.mint) {
            Some(lane) => match lane.send(event) {
                Ok(()) => return,
                Err(mpsc::error::SendError(event)) => event,
            },
            None => event,
        };

        lanes.retain(|_, lane| !lane.is_closed());

        let (tx, rx) = mpsc::unbounded_channel();
        let mint = event.mint.clone();
        if tx.send(event).is_err() {
            return;
        }
        tokio::spawn(run_lane(
            Arc::clone(&self.core),
            Arc::clone(&self.lanes),
            mint.clone(),
            rx,
        ));
        lanes.insert(mint, tx);
    }

    #[cfg(test)]
    async fn process(&self, event: TradeEvent) -> DispatchOutcome {
        self.core.handle(event).await
    }

    pub async fn active_lanes(&self) -> usize {
        self.lanes
            .lock()
            .await
            .values()
            .filter(|lane| !lane.is_closed())
            .count()
    }
}

/// Serve one mint's queue until it stays idle.
///
/// `dispatch` sends while holding the lane map, so an empty queue observed
/// under that lock stays empty until the entry is gone. A replacement lane
/// can only start once this worker has nothing left to run.
async fn run_lane(
    core: Arc<DispatchCore>,
    lanes: Lanes,
    mint: String,
    mut rx: mpsc::UnboundedReceiver<TradeEvent>,
) {
    debug!("[{}] lane started", mint);
    loop {
        let event = match tokio::time::timeout(LANE_IDLE_TIMEOUT, rx.recv()).await {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(_) => {
                let mut lanes = lanes.lock().await;
                match rx.try_recv() {
                    Ok(event) => event,
                    Err(_) => {
                        lanes.remove(&mint);
                        break;
                    }
                }
            }
        };
        core.handle(event).await;
    }
    debug!("[{}] lane idle, stopped", mint);
}

impl DispatchCore {
    async fn handle(&self, event: TradeEvent) -> DispatchOutcome {
        let (price, amount) = match (event.price(), event.token_amount()) {
            (Some(price), Some(amount)) if price > 0.0 && amount > 0.0 => (price, amount),
            _ => {
                debug!("[{}] event without usable price/amount dropped", event.mint);
                return DispatchOutcome::Ignored;
            }
        };

        let observation = TradeObservation {
            mint: event.mint.clone(),
            side: event.side(),
            price,
            amount,
            origin: event.origin(),
            signature: event.signature.clone(),
            pool_refs: event.pool_refs(),
        };

        let (previous, order) = {
            let mut book = self.order_book.lock().await;
            let previous = book.get(&event.mint);
            let order = book.process_trade(&observation);
            (previous, order)
        };

        let own_trade = self.settings.tracked_creators.contains(&event.creator);
        let action = match decide(
            previous.as_ref().map(|order| order.status),
            order.as_ref(),
            event.is_buy,
            own_trade,
            self.settings.buy_amount_sol,
        ) {
            Some(action) => action,
            None => return DispatchOutcome::Ignored,
        };
        let order = match order {
            Some(order) => order,
            None => return DispatchOutcome::Ignored,
        };

        if !self.risk.permits(action.side()).await {
            warn!("[{}] {} suppressed by balance floor", event.mint, action.side());
            self.rollback(&event.mint, previous).await;
            return DispatchOutcome::Suppressed;
        }

        let attempt = generate_id();
        info!(attempt = %attempt, "[{}] executing {} of {}", event.mint, action.side(), action.amount());
        match self.execute(action, &event, price, &order).await {
            Ok(result) if result.success => {
                info!(attempt = %attempt, "[{}] {} landed: {}", event.mint, action.side(), solscan_link(&result.signature));
                if action.side() == Side::Sell {
                    let summary = self.order_book.lock().await.market_summary(&event.mint);
                    info!(
                        bought_sol = summary.volume.buy_volume,
                        sold_sol = summary.volume.sell_volume,
                        spread = summary.spread,
                        "[{}] position closed",
                        event.mint
                    );
                }
                DispatchOutcome::Executed(result)
            }
            Ok(result) => {
                let message = result.error.clone().unwrap_or_else(|| "unknown failure".to_string());
                self.report(&event.mint, action.side(), message);
                self.rollback(&event.mint, previous).await;
                DispatchOutcome::Executed(result)
            }
            Err(e) => {
                self.report(&event.mint, action.side(), e.to_string());
                self.rollback(&event.mint, previous).await;
                DispatchOutcome::Aborted(e)
            }
        }
    }

    async fn execute(
        &self,
        action: TradeAction,
        event: &TradeEvent,
        price: f64,
        order: &Order,
    ) -> Result<SubmitResult, ExecutionError> {
        let side = action.side();
        let owner = self.payer.pubkey();
        let mint = Pubkey::from_str(&event.mint)
            .map_err(|e| InstructionError::Encoding(format!("invalid mint {}: {}", event.mint, e)))?;

        let built = PumpFunInstructionBuilder::build(&SwapRequest {
            side,
            price,
            amount: action.amount(),
            decimals: event.decimals.unwrap_or(DEFAULT_TOKEN_DECIMALS),
            slippage_pct: self.settings.slippage_pct,
            owner,
            mint,
            pool_refs: event.pool_refs().unwrap_or(order.pool_refs),
        })?;

        let tip_lamports = match side {
            Side::Buy => sol_to_lamports(self.fees.recommended_tip(self.settings.max_tip_sol).await),
            Side::Sell => 0,
        };

        let instructions = TransactionAssembler::instructions(
            &owner,
            &built,
            FeeParams {
                priority_fee_sol: self.settings.priority_fee_sol,
                tip_lamports,
            },
        )?;

        let blockhash = self
            .rpc
            .latest_blockhash()
            .await
            .map_err(|e| ExecutionError::NetworkError(e.to_string()))?;
        let tx = TransactionAssembler::assemble(&self.payer, &instructions, blockhash)?;

        self.submitter.submit(&tx, tip_lamports, built.quote).await
    }

    async fn rollback(&self, mint: &str, previous: Option<Order>) {
        self.order_book.lock().await.restore(mint, previous);
        debug!("[{}] order transition rolled back", mint);
    }

    fn report(&self, mint: &str, side: Side, message: String) {
        error!("[{}] {} failed: {}", mint, side, message);
        let _ = self.errors.send(DispatchError {
            mint: mint.to_string(),
            side,
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::risk::RiskConfig;
    use crate::infrastructure::blockchain::{SignatureState, SimulationOutcome, SubmitterConfig};
    use crate::infrastructure::relay::{RelayReceipt, RelayTransport, RetryPolicy};
    use crate::shared::errors::AppError;
    use crate::shared::types::Origin;
    use async_trait::async_trait;
    use solana_sdk::{hash::Hash, signature::Signature, transaction::VersionedTransaction};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    struct FakeLedger {
        fail_simulation: AtomicBool,
        confirms: AtomicBool,
        sends: AtomicU32,
    }

    #[async_trait]
    impl LedgerRpc for FakeLedger {
        async fn latest_blockhash(&self) -> Result<Hash, AppError> {
            Ok(Hash::new_unique())
        }

        async fn simulate(&self, _tx: &VersionedTransaction) -> Result<SimulationOutcome, AppError> {
            if self.fail_simulation.load(Ordering::SeqCst) {
                return Ok(SimulationOutcome {
                    err: Some("custom".to_string()),
                    logs: vec!["custom program error: 0xbc4".to_string()],
                    units_consumed: None,
                });
            }
            Ok(SimulationOutcome::default())
        }

        async fn send_raw(&self, tx: &VersionedTransaction) -> Result<Signature, AppError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            Ok(tx.signatures[0])
        }

        async fn balance(&self, _owner: &Pubkey) -> Result<u64, AppError> {
            Ok(10_000_000_000)
        }

        async fn signature_status(
            &self,
            _signature: &Signature,
        ) -> Result<Option<SignatureState>, AppError> {
            if self.confirms.load(Ordering::SeqCst) {
                Ok(Some(SignatureState::Confirmed))
            } else {
                Ok(None)
            }
        }
    }

    struct FakeRelay {
        lands: AtomicBool,
        submissions: AtomicU32,
    }

    #[async_trait]
    impl RelayTransport for FakeRelay {
        async fn submit(&self, _encoded_tx: &str) -> Result<RelayReceipt, AppError> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            Ok(RelayReceipt {
                result: "b1".to_string(),
                bundle_id: Some("b1".to_string()),
            })
        }

        async fn bundle_status(&self, _bundle_id: &str) -> Result<Option<String>, AppError> {
            if self.lands.load(Ordering::SeqCst) {
                Ok(Some("finalized".to_string()))
            } else {
                Ok(None)
            }
        }
    }

    struct Harness {
        dispatcher: TradeDispatcher,
        order_book: Arc<Mutex<OrderBook>>,
        risk: Arc<RiskGovernor>,
        ledger: Arc<FakeLedger>,
        relay: Arc<FakeRelay>,
        errors: mpsc::UnboundedReceiver<DispatchError>,
    }

    const OWN_CREATOR: &str = "744ZryTiFQ1LDySKUikc93M7MT7ZdB3DnFGsrT1gYhNW";

    async fn harness() -> Harness {
        let order_book = Arc::new(Mutex::new(OrderBook::new()));
        let risk = Arc::new(RiskGovernor::new(RiskConfig::default()));
        risk.observe_balance(10.0).await;
        let ledger = Arc::new(FakeLedger {
            fail_simulation: AtomicBool::new(false),
            confirms: AtomicBool::new(true),
            sends: AtomicU32::new(0),
        });
        let relay = Arc::new(FakeRelay {
            lands: AtomicBool::new(true),
            submissions: AtomicU32::new(0),
        });
        let submitter = Arc::new(Submitter::new(
            ledger.clone(),
            relay.clone(),
            SubmitterConfig {
                bundle_poll: RetryPolicy::new(2, Duration::ZERO),
                signature_poll: RetryPolicy::new(2, Duration::ZERO),
                confirm_direct: true,
                dry_run: false,
            },
        ));
        let (errors_tx, errors) = mpsc::unbounded_channel();
        let settings = TradeSettings {
            tracked_creators: [OWN_CREATOR.to_string()].into_iter().collect(),
            ..TradeSettings::default()
        };

        let dispatcher = TradeDispatcher::new(
            order_book.clone(),
            risk.clone(),
            Arc::new(FeeOracle::new()),
            ledger.clone(),
            submitter,
            Arc::new(Keypair::new()),
            settings,
            errors_tx,
        );

        Harness {
            dispatcher,
            order_book,
            risk,
            ledger,
            relay,
            errors,
        }
    }

    fn event(mint: &Pubkey, creator: &str, is_buy: bool, amount: &str, sol: &str, origin: &str) -> TradeEvent {
        TradeEvent {
            creator: creator.to_string(),
            mint: mint.to_string(),
            amount: amount.to_string(),
            sol_amount: sol.to_string(),
            bonding_curve: Some(Pubkey::new_unique().to_string()),
            associated_bonding_curve: Some(Pubkey::new_unique().to_string()),
            decimals: Some(6),
            is_buy,
            origin: origin.to_string(),
            timestamp: 0.0,
            signature: "sig".to_string(),
        }
    }

    async fn wait_for_status(h: &Harness, mint: &Pubkey, status: OrderStatus) {
        for _ in 0..200 {
            if h.order_book.lock().await.order_status(&mint.to_string()) == Some(status) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("{} never reached {:?}", mint, status);
    }

    fn order(status: OrderStatus) -> Order {
        Order {
            mint: "m".to_string(),
            status,
            amount_bought: 100.0,
            amount_sold: 0.0,
            price_bought: 0.01,
            price_sold: 0.0,
            timestamp_bought: 0,
            timestamp_sold: 0,
            pnl: 0.0,
            origin: Origin::Normal,
            pool_refs: crate::shared::types::PoolRefs {
                bonding_curve: Pubkey::new_unique(),
                associated_bonding_curve: Pubkey::new_unique(),
            },
        }
    }

    #[test]
    fn test_decide_rules() {
        let pending = order(OrderStatus::Pending);
        let closed = order(OrderStatus::Closed);
        let open = order(OrderStatus::Open);

        assert_eq!(decide(None, Some(&pending), true, false, 0.1), Some(TradeAction::Buy { amount_sol: 0.1 }));
        assert_eq!(decide(None, Some(&pending), true, true, 0.1), None);
        assert_eq!(
            decide(Some(OrderStatus::Open), Some(&closed), false, false, 0.1),
            Some(TradeAction::Sell { amount_tokens: 100.0 })
        );
        assert_eq!(
            decide(Some(OrderStatus::Open), Some(&closed), false, true, 0.1),
            Some(TradeAction::Sell { amount_tokens: 100.0 })
        );
        assert_eq!(decide(Some(OrderStatus::Pending), Some(&open), true, false, 0.1), None);
        assert_eq!(decide(Some(OrderStatus::Closed), Some(&closed), false, false, 0.1), None);
        assert_eq!(decide(None, None, true, false, 0.1), None);
    }

    #[tokio::test]
    async fn test_copy_buy_executes_through_relay() {
        let h = harness().await;
        let mint = Pubkey::new_unique();

        let outcome = h
            .dispatcher
            .process(event(&mint, "someone", true, "1000", "10", "normal"))
            .await;

        match outcome {
            DispatchOutcome::Executed(result) => assert!(result.success),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(h.relay.submissions.load(Ordering::SeqCst), 1);
        let status = h.order_book.lock().await.order_status(&mint.to_string());
        assert_eq!(status, Some(OrderStatus::Pending));
    }

    #[tokio::test]
    async fn test_simulation_abort_rolls_back() {
        let mut h = harness().await;
        h.ledger.fail_simulation.store(true, Ordering::SeqCst);
        let mint = Pubkey::new_unique();

        let outcome = h
            .dispatcher
            .process(event(&mint, "someone", true, "1000", "10", "normal"))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Aborted(ExecutionError::SimulationAbort(_))));
        assert_eq!(h.order_book.lock().await.order_status(&mint.to_string()), None);
        let reported = h.errors.recv().await.unwrap();
        assert_eq!(reported.message, "Simulation aborted: Network occupied, try again later.");
    }

    #[tokio::test]
    async fn test_buy_suppressed_below_floor() {
        let h = harness().await;
        h.risk.observe_balance(1.0).await;
        let mint = Pubkey::new_unique();

        let outcome = h
            .dispatcher
            .process(event(&mint, "someone", true, "1000", "10", "normal"))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Suppressed));
        assert_eq!(h.order_book.lock().await.order_status(&mint.to_string()), None);
        assert_eq!(h.relay.submissions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_own_close_sells_directly() {
        let h = harness().await;
        let mint = Pubkey::new_unique();

        for e in [
            event(&mint, OWN_CREATOR, true, "100", "1", "normal"),
            event(&mint, OWN_CREATOR, true, "100", "1", "normal"),
        ] {
            assert!(matches!(h.dispatcher.process(e).await, DispatchOutcome::Ignored));
        }

        let outcome = h
            .dispatcher
            .process(event(&mint, OWN_CREATOR, false, "100", "0.5", "stop_loss"))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Executed(ref r) if r.success));
        assert_eq!(h.ledger.sends.load(Ordering::SeqCst), 1);
        assert_eq!(h.relay.submissions.load(Ordering::SeqCst), 0);
        assert_eq!(h.order_book.lock().await.executed_count(), 1);
    }

    #[tokio::test]
    async fn test_lanes_preserve_order() {
        let h = harness().await;
        let mint = Pubkey::new_unique();

        h.dispatcher.dispatch(event(&mint, OWN_CREATOR, true, "100", "1", "normal")).await;
        h.dispatcher.dispatch(event(&mint, OWN_CREATOR, true, "100", "1", "normal")).await;
        h.dispatcher.dispatch(event(&mint, OWN_CREATOR, false, "100", "0.5", "stop_loss")).await;
        assert_eq!(h.dispatcher.active_lanes().await, 1);

        for _ in 0..200 {
            if h.order_book.lock().await.executed_count() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(h.order_book.lock().await.executed_count(), 1);
        assert_eq!(h.ledger.sends.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unlanded_bundle_rolls_back_copy_buy() {
        let mut h = harness().await;
        h.relay.lands.store(false, Ordering::SeqCst);
        let mint = Pubkey::new_unique();

        let outcome = h
            .dispatcher
            .process(event(&mint, "someone", true, "1000", "10", "normal"))
            .await;

        match outcome {
            DispatchOutcome::Executed(result) => {
                assert!(!result.success);
                assert_eq!(result.bundle_id.as_deref(), Some("b1"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(h.order_book.lock().await.order_status(&mint.to_string()), None);
        let reported = h.errors.recv().await.unwrap();
        assert_eq!(reported.side, Side::Buy);
        assert_eq!(reported.message, "Confirmation not observed after 2 attempts");
    }

    #[tokio::test]
    async fn test_unconfirmed_sell_restores_open_order() {
        let mut h = harness().await;
        let mint = Pubkey::new_unique();

        let first = h
            .dispatcher
            .process(event(&mint, "someone", true, "1000", "10", "normal"))
            .await;
        assert!(matches!(first, DispatchOutcome::Executed(ref r) if r.success));
        h.dispatcher
            .process(event(&mint, "someone", true, "1000", "10", "normal"))
            .await;
        assert_eq!(
            h.order_book.lock().await.order_status(&mint.to_string()),
            Some(OrderStatus::Open)
        );

        h.ledger.confirms.store(false, Ordering::SeqCst);
        let outcome = h
            .dispatcher
            .process(event(&mint, "someone", false, "1000", "20", "normal"))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Executed(ref r) if !r.success));
        let book = h.order_book.lock().await;
        assert_eq!(book.order_status(&mint.to_string()), Some(OrderStatus::Open));
        assert_eq!(book.executed_count(), 0);
        drop(book);
        let reported = h.errors.recv().await.unwrap();
        assert_eq!(reported.side, Side::Sell);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_lane_is_removed_then_respawned() {
        let h = harness().await;
        let mint = Pubkey::new_unique();

        h.dispatcher.dispatch(event(&mint, OWN_CREATOR, true, "100", "1", "normal")).await;
        wait_for_status(&h, &mint, OrderStatus::Pending).await;

        tokio::time::sleep(LANE_IDLE_TIMEOUT + Duration::from_secs(1)).await;
        assert!(h.dispatcher.lanes.lock().await.is_empty());

        h.dispatcher.dispatch(event(&mint, OWN_CREATOR, true, "100", "1", "normal")).await;
        assert_eq!(h.dispatcher.active_lanes().await, 1);
        wait_for_status(&h, &mint, OrderStatus::Open).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_queued_at_idle_timeout_keeps_lane_alive() {
        let h = harness().await;
        let mint = Pubkey::new_unique();
        let key = mint.to_string();

        h.dispatcher.dispatch(event(&mint, OWN_CREATOR, true, "100", "1", "normal")).await;
        wait_for_status(&h, &mint, OrderStatus::Pending).await;

        {
            // The worker times out and waits on the lane map held here.
            let lanes = h.dispatcher.lanes.lock().await;
            tokio::time::sleep(LANE_IDLE_TIMEOUT + Duration::from_secs(1)).await;
            lanes[&key]
                .send(event(&mint, OWN_CREATOR, true, "100", "1", "normal"))
                .unwrap();
        }

        wait_for_status(&h, &mint, OrderStatus::Open).await;
        assert_eq!(h.dispatcher.active_lanes().await, 1);
    }
}
