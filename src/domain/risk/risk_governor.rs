//! Balance-based risk governor

use tokio::sync::RwLock;
use tracing::{info, warn};

use super::BalanceSource;
use crate::shared::errors::AppError;
use crate::shared::types::Side;
use crate::shared::utils::lamports_to_sol;

/// Risk management configuration
#[derive(Debug, Clone)]
pub struct RiskConfig {
    /// Fraction (0..=1) of realized profit folded into the protected baseline.
    pub profit_lock_pct: f64,
    /// Percent of the baseline kept out of the floor: `floor = baseline * (1 - pct/100)`.
    pub min_balance_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            profit_lock_pct: 0.8,
            min_balance_pct: 80.0,
        }
    }
}

/// Snapshot of the governor's state, balances in SOL.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskState {
    pub current_balance: f64,
    pub initial_balance: Option<f64>,
    pub high_watermark: f64,
    pub min_balance_floor: f64,
    pub profit_lock_pct: f64,
    pub min_balance_pct: f64,
}

impl RiskState {
    fn new(config: &RiskConfig) -> Self {
        Self {
            current_balance: 0.0,
            initial_balance: None,
            high_watermark: 0.0,
            min_balance_floor: 0.0,
            profit_lock_pct: config.profit_lock_pct,
            min_balance_pct: config.min_balance_pct,
        }
    }

    fn floor_for(&self, baseline: f64) -> f64 {
        baseline * (1.0 - self.min_balance_pct / 100.0)
    }

    /// Fold one balance observation into the state.
    fn observe(&mut self, balance: f64) {
        self.current_balance = balance;

        let initial = match self.initial_balance {
            Some(initial) => initial,
            None => {
                self.initial_balance = Some(balance);
                self.high_watermark = balance;
                self.min_balance_floor = self.floor_for(balance);
                return;
            }
        };

        if balance > self.high_watermark {
            self.high_watermark = balance;
            if balance > initial {
                let locked_profit = (balance - initial) * self.profit_lock_pct;
                let baseline = initial + locked_profit;
                self.min_balance_floor = self.min_balance_floor.max(self.floor_for(baseline));
            }
        }
    }

    /// Buys need a known floor and a balance at or above it. Sells always pass.
    pub fn permits(&self, side: Side) -> bool {
        match side {
            Side::Sell => true,
            Side::Buy => {
                self.initial_balance.is_some() && self.current_balance >= self.min_balance_floor
            }
        }
    }
}

/// Owns the process-wide risk state. Written only by the balance refresh cycle.
pub struct RiskGovernor {
    state: RwLock<RiskState>,
}

impl RiskGovernor {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            state: RwLock::new(RiskState::new(&config)),
        }
    }

    /// Record a balance observation (in SOL) and return the resulting state.
    pub async fn observe_balance(&self, balance_sol: f64) -> RiskState {
        let mut state = self.state.write().await;
        let previous_floor = state.min_balance_floor;
        let first_read = state.initial_balance.is_none();
        state.observe(balance_sol);

        if first_read {
            info!(
                "Initial balance {:.4} SOL | floor {:.4} SOL",
                balance_sol, state.min_balance_floor
            );
        } else if state.min_balance_floor > previous_floor {
            info!(
                "Floor raised {:.4} -> {:.4} SOL (balance {:.4} SOL)",
                previous_floor, state.min_balance_floor, balance_sol
            );
        }
        if state.current_balance < state.min_balance_floor {
            warn!(
                "Balance {:.4} SOL below floor {:.4} SOL, buys suspended",
                state.current_balance, state.min_balance_floor
            );
        }
        state.clone()
    }

    /// Read the balance from `source` and fold it in.
    pub async fn refresh(&self, source: &dyn BalanceSource) -> Result<RiskState, AppError> {
        let lamports = source.wallet_balance().await?;
        Ok(self.observe_balance(lamports_to_sol(lamports)).await)
    }

    pub async fn permits(&self, side: Side) -> bool {
        self.state.read().await.permits(side)
    }

    pub async fn snapshot(&self) -> RiskState {
        self.state.read().await.clone()
    }
}
