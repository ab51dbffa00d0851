//! Tip oracle backed by the relay's tip-floor distribution

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::TipFloorSource;
use crate::shared::errors::AppError;

/// Tip used until the first successful refresh.
pub const DEFAULT_TIP_SOL: f64 = 0.001;
/// Markup over the 95th landed-tip percentile.
pub const TIP_MULTIPLIER: f64 = 1.2;

#[derive(Debug, Clone, PartialEq)]
pub struct TipQuote {
    /// Recommended tip in SOL.
    pub value: f64,
    pub observed_at: DateTime<Utc>,
}

pub struct FeeOracle {
    quote: RwLock<TipQuote>,
}

impl Default for FeeOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl FeeOracle {
    pub fn new() -> Self {
        Self::with_initial(DEFAULT_TIP_SOL)
    }

    pub fn with_initial(value: f64) -> Self {
        Self {
            quote: RwLock::new(TipQuote {
                value,
                observed_at: Utc::now(),
            }),
        }
    }

    /// Pull the tip floor and replace the quote. On failure the previous quote stays.
    pub async fn refresh(&self, source: &dyn TipFloorSource) -> Result<TipQuote, AppError> {
        let records = source.fetch_tip_floor().await?;
        let record = records
            .first()
            .ok_or_else(|| AppError::FeeMarketError("empty tip floor response".to_string()))?;

        let value = record.landed_tips_95th_percentile * TIP_MULTIPLIER;
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::FeeMarketError(format!(
                "invalid tip floor value: {}",
                record.landed_tips_95th_percentile
            )));
        }

        let quote = TipQuote {
            value,
            observed_at: Utc::now(),
        };
        *self.quote.write().await = quote.clone();
        debug!("Tip floor refreshed: {:.9} SOL", value);
        Ok(quote)
    }

    /// Refresh, logging and swallowing failures.
    pub async fn refresh_or_keep(&self, source: &dyn TipFloorSource) -> TipQuote {
        match self.refresh(source).await {
            Ok(quote) => quote,
            Err(e) => {
                warn!("Tip floor refresh failed, keeping previous value: {}", e);
                self.current().await
            }
        }
    }

    pub async fn current(&self) -> TipQuote {
        self.quote.read().await.clone()
    }

    /// Current tip clamped to `ceiling` (SOL).
    pub async fn recommended_tip(&self, ceiling: f64) -> f64 {
        self.quote.read().await.value.min(ceiling).max(0.0)
    }
}
