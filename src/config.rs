use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::infrastructure::relay::{Region, RelayMode, DEFAULT_TIP_FLOOR_URL};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RpcCfg {
    pub url: String,
}

impl Default for RpcCfg {
    fn default() -> Self {
        Self {
            url: "https://api.mainnet-beta.solana.com".to_string(),
        }
    }
}

/// Either a keypair file or a base58 secret key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WalletCfg {
    pub keypair: Option<String>,
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradeCfg {
    pub buy_amount_sol: f64,
    pub slippage_pct: f64,
    pub priority_fee_sol: f64,
    pub max_tip_sol: f64,
    pub tracked_creators: Vec<String>,
    pub simulate_only: Option<bool>,
}

impl Default for TradeCfg {
    fn default() -> Self {
        Self {
            buy_amount_sol: 0.1,
            slippage_pct: 50.0,
            priority_fee_sol: 0.005,
            max_tip_sol: 0.005,
            tracked_creators: Vec::new(),
            simulate_only: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayCfg {
    pub mode: RelayMode,
    pub regions: Vec<Region>,
    pub auth_token: Option<String>,
    pub timeout_secs: u64,
    pub bundle_poll_attempts: u32,
    pub signature_poll_attempts: u32,
    pub poll_delay_ms: u64,
    pub poll_jitter_ms: u64,
    pub confirm_direct: bool,
}

impl Default for RelayCfg {
    fn default() -> Self {
        Self {
            mode: RelayMode::Transaction,
            regions: Region::ROTATION.to_vec(),
            auth_token: None,
            timeout_secs: 10,
            bundle_poll_attempts: 20,
            signature_poll_attempts: 30,
            poll_delay_ms: 1_000,
            poll_jitter_ms: 0,
            confirm_direct: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskCfg {
    pub profit_lock_pct: f64,
    pub min_balance_pct: f64,
    pub refresh_secs: u64,
}

impl Default for RiskCfg {
    fn default() -> Self {
        Self {
            profit_lock_pct: 0.8,
            min_balance_pct: 80.0,
            refresh_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeeOracleCfg {
    pub url: String,
    pub refresh_secs: u64,
    pub initial_tip_sol: f64,
}

impl Default for FeeOracleCfg {
    fn default() -> Self {
        Self {
            url: DEFAULT_TIP_FLOOR_URL.to_string(),
            refresh_secs: 10,
            initial_tip_sol: 0.001,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifierCfg {
    pub discord_webhook_url: Option<String>,
    pub username: String,
    pub interval_secs: u64,
}

impl Default for NotifierCfg {
    fn default() -> Self {
        Self {
            discord_webhook_url: None,
            username: "curvemirror".to_string(),
            interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedCfg {
    pub bind: String,
}

impl Default for FeedCfg {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3012".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rpc: RpcCfg,
    pub wallet: WalletCfg,
    pub trade: TradeCfg,
    pub relay: RelayCfg,
    pub risk: RiskCfg,
    pub fee_oracle: FeeOracleCfg,
    pub notifier: NotifierCfg,
    pub feed: FeedCfg,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read {}", path.as_ref().display()))?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s).context("parse Config.toml")?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.trade.slippage_pct) {
            bail!("trade.slippage_pct must be within 0..=100, got {}", self.trade.slippage_pct);
        }
        if !(self.trade.buy_amount_sol > 0.0) {
            bail!("trade.buy_amount_sol must be positive, got {}", self.trade.buy_amount_sol);
        }
        if self.trade.priority_fee_sol < 0.0 || self.trade.max_tip_sol < 0.0 {
            bail!("trade fees must not be negative");
        }
        if !(0.0..=1.0).contains(&self.risk.profit_lock_pct) {
            bail!("risk.profit_lock_pct must be within 0..=1, got {}", self.risk.profit_lock_pct);
        }
        if !(0.0..=100.0).contains(&self.risk.min_balance_pct) {
            bail!("risk.min_balance_pct must be within 0..=100, got {}", self.risk.min_balance_pct);
        }
        Ok(())
    }
}
