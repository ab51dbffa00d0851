// src/app.rs
use anyhow::{anyhow, bail, Context, Result};
use solana_sdk::signature::{read_keypair_file, Keypair, Signer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::application::cycles::{
    spawn_balance_cycle, spawn_error_drain, spawn_summary_cycle, spawn_tip_cycle,
};
use crate::application::{TradeDispatcher, TradeSettings};
use crate::config::{Config, FeeOracleCfg, NotifierCfg, RelayCfg, RiskCfg};
use crate::domain::fees::FeeOracle;
use crate::domain::orders::OrderBook;
use crate::domain::risk::{BalanceSource, RiskConfig, RiskGovernor};
use crate::infrastructure::blockchain::{
    LedgerRpc, SolanaRpcClient, Submitter, SubmitterConfig, WalletBalance,
};
use crate::infrastructure::feed::TradeFeedServer;
use crate::infrastructure::notify::DiscordWebhookNotifier;
use crate::infrastructure::relay::{JitoRelayClient, JitoTipFloorClient, RetryPolicy};
use crate::shared::types::TradeEvent;

const FEED_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub simulate_only: bool,
    pub rpc_url: String,
    pub keypair_path: Option<String>,
    pub private_key: Option<String>,
    pub feed_bind: String,
    pub trade: TradeSettings,
    pub relay: RelayCfg,
    pub risk: RiskCfg,
    pub fee_oracle: FeeOracleCfg,
    pub notifier: NotifierCfg,
}

impl AppCfg {
    pub fn from_config(cfg: Config, override_simulate: bool) -> Result<Self> {
        cfg.validate()?;

        Ok(Self {
            simulate_only: if override_simulate { true } else { cfg.trade.simulate_only.unwrap_or(false) },
            rpc_url: cfg.rpc.url,
            keypair_path: cfg.wallet.keypair,
            private_key: cfg.wallet.private_key,
            feed_bind: cfg.feed.bind,
            trade: TradeSettings {
                buy_amount_sol: cfg.trade.buy_amount_sol,
                slippage_pct: cfg.trade.slippage_pct,
                priority_fee_sol: cfg.trade.priority_fee_sol,
                max_tip_sol: cfg.trade.max_tip_sol,
                tracked_creators: cfg.trade.tracked_creators.into_iter().collect(),
            },
            relay: cfg.relay,
            risk: cfg.risk,
            fee_oracle: cfg.fee_oracle,
            notifier: cfg.notifier,
        })
    }

    fn submitter_config(&self) -> SubmitterConfig {
        let delay = Duration::from_millis(self.relay.poll_delay_ms);
        let jitter = Duration::from_millis(self.relay.poll_jitter_ms);
        SubmitterConfig {
            bundle_poll: RetryPolicy::new(self.relay.bundle_poll_attempts, delay).with_jitter(jitter),
            signature_poll: RetryPolicy::new(self.relay.signature_poll_attempts, delay).with_jitter(jitter),
            confirm_direct: self.relay.confirm_direct,
            dry_run: self.simulate_only,
        }
    }
}

/// Load the signing keypair from a keypair file or a base58 secret key.
pub fn load_keypair(path: Option<&str>, private_key: Option<&str>) -> Result<Keypair> {
    if let Some(path) = path {
        return read_keypair_file(path).map_err(|e| anyhow!("Failed to load keypair {}: {}", path, e));
    }
    if let Some(encoded) = private_key {
        let bytes = bs58::decode(encoded.trim())
            .into_vec()
            .context("private key is not valid base58")?;
        return Keypair::from_bytes(&bytes).map_err(|e| anyhow!("Invalid private key: {}", e));
    }
    bail!("no wallet configured: set wallet.keypair or wallet.private_key")
}

fn period(secs: u64) -> Duration {
    Duration::from_secs(secs.max(1))
}

pub async fn run(app_cfg: AppCfg) -> Result<()> {
    info!("Starting bonding-curve copy trader");
    info!(
        rpc = %app_cfg.rpc_url,
        feed = %app_cfg.feed_bind,
        buy_amount_sol = app_cfg.trade.buy_amount_sol,
        slippage_pct = app_cfg.trade.slippage_pct,
        "Configuration loaded"
    );

    let payer = Arc::new(load_keypair(
        app_cfg.keypair_path.as_deref(),
        app_cfg.private_key.as_deref(),
    )?);
    info!("Loaded keypair: {}", payer.pubkey());
    if app_cfg.simulate_only {
        warn!("Simulation mode - transactions are simulated but never sent");
    }

    let rpc: Arc<dyn LedgerRpc> = Arc::new(SolanaRpcClient::new(app_cfg.rpc_url.clone()));
    let http_timeout = Duration::from_secs(app_cfg.relay.timeout_secs.max(1));

    let relay = Arc::new(JitoRelayClient::new(
        app_cfg.relay.regions.clone(),
        app_cfg.relay.mode,
        app_cfg.relay.auth_token.clone(),
        http_timeout,
    )?);
    let submitter = Arc::new(Submitter::new(rpc.clone(), relay, app_cfg.submitter_config()));

    let risk = Arc::new(RiskGovernor::new(RiskConfig {
        profit_lock_pct: app_cfg.risk.profit_lock_pct,
        min_balance_pct: app_cfg.risk.min_balance_pct,
    }));
    let fees = Arc::new(FeeOracle::with_initial(app_cfg.fee_oracle.initial_tip_sol));
    let order_book = Arc::new(Mutex::new(OrderBook::new()));

    let (error_tx, error_rx) = mpsc::unbounded_channel();
    let dispatcher = Arc::new(TradeDispatcher::new(
        order_book.clone(),
        risk.clone(),
        fees.clone(),
        rpc.clone(),
        submitter,
        payer.clone(),
        app_cfg.trade.clone(),
        error_tx,
    ));

    let mut handles = vec![spawn_error_drain(error_rx)];

    let balance_source: Arc<dyn BalanceSource> = Arc::new(WalletBalance::new(rpc.clone(), payer.pubkey()));
    handles.push(spawn_balance_cycle(risk.clone(), balance_source, period(app_cfg.risk.refresh_secs)));

    let tip_source = Arc::new(JitoTipFloorClient::new(app_cfg.fee_oracle.url.clone(), http_timeout)?);
    handles.push(spawn_tip_cycle(fees.clone(), tip_source, period(app_cfg.fee_oracle.refresh_secs)));

    match app_cfg.notifier.discord_webhook_url.clone() {
        Some(url) => {
            let notifier = Arc::new(DiscordWebhookNotifier::new(
                url,
                app_cfg.notifier.username.clone(),
                http_timeout,
            )?);
            handles.push(spawn_summary_cycle(
                order_book.clone(),
                risk.clone(),
                notifier,
                period(app_cfg.notifier.interval_secs),
            ));
        }
        None => info!("No Discord webhook configured, PNL summaries disabled"),
    }

    let (event_tx, mut event_rx) = mpsc::channel::<TradeEvent>(FEED_CHANNEL_CAPACITY);
    handles.push({
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                dispatcher.dispatch(event).await;
            }
        })
    });

    let server = TradeFeedServer::new(app_cfg.feed_bind.clone(), event_tx);
    let result = tokio::select! {
        res = server.run() => res,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
    };

    for handle in handles {
        handle.abort();
    }

    let book = order_book.lock().await;
    let state = risk.snapshot().await;
    info!(
        executed = book.executed_count(),
        tracked = book.snapshot().len(),
        closed = book.closed_orders().len(),
        balance = state.current_balance,
        floor = state.min_balance_floor,
        "Stopped"
    );

    result
}
