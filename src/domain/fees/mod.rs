//! Fee domain - MEV tip recommendation

mod fee_oracle;

pub use fee_oracle::{FeeOracle, TipQuote, DEFAULT_TIP_SOL, TIP_MULTIPLIER};

use async_trait::async_trait;
use serde::Deserialize;

use crate::shared::errors::AppError;

/// One entry of the relay's landed-tip distribution, values in SOL.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TipFloorRecord {
    #[serde(default)]
    pub time: Option<String>,
    pub landed_tips_25th_percentile: f64,
    pub landed_tips_50th_percentile: f64,
    pub landed_tips_75th_percentile: f64,
    pub landed_tips_95th_percentile: f64,
    pub landed_tips_99th_percentile: f64,
    pub ema_landed_tips_50th_percentile: f64,
}

#[async_trait]
pub trait TipFloorSource: Send + Sync {
    async fn fetch_tip_floor(&self) -> Result<Vec<TipFloorRecord>, AppError>;
}
