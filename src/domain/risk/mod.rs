//! Risk domain - balance floor and buy gating

mod risk_governor;

pub use risk_governor::{RiskConfig, RiskGovernor, RiskState};

use async_trait::async_trait;
use crate::shared::errors::AppError;

/// Source of the wallet's native balance, in lamports.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn wallet_balance(&self) -> Result<u64, AppError>;
}
