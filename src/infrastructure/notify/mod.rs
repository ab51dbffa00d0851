//! Outbound trading summaries

pub mod discord_webhook;

pub use discord_webhook::DiscordWebhookNotifier;

use async_trait::async_trait;

use crate::shared::errors::AppError;

/// Figures reported by the periodic summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradingSummary {
    pub initial_balance: f64,
    pub current_balance: f64,
    pub executed_count: usize,
}

impl TradingSummary {
    pub fn total_pnl(&self) -> f64 {
        self.current_balance - self.initial_balance
    }
}

#[async_trait]
pub trait SummaryNotifier: Send + Sync {
    async fn send_summary(&self, summary: &TradingSummary) -> Result<(), AppError>;
}
