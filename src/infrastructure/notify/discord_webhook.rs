//! Discord webhook delivery of PnL summaries

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

use super::{SummaryNotifier, TradingSummary};
use crate::shared::errors::AppError;

const COLOR_PROFIT: u32 = 0x00FF00;
const COLOR_LOSS: u32 = 0xFF0000;

#[derive(Debug, Serialize)]
struct WebhookPayload {
    username: String,
    embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    description: String,
    color: u32,
    fields: Vec<EmbedField>,
    footer: EmbedFooter,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct EmbedField {
    name: String,
    value: String,
    inline: bool,
}

#[derive(Debug, Serialize)]
struct EmbedFooter {
    text: String,
}

pub struct DiscordWebhookNotifier {
    http_client: Client,
    webhook_url: String,
    username: String,
}

impl DiscordWebhookNotifier {
    pub fn new(webhook_url: String, username: String, timeout: Duration) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build webhook client: {}", e)))?;
        Ok(Self {
            http_client,
            webhook_url,
            username,
        })
    }

    fn payload(&self, summary: &TradingSummary) -> WebhookPayload {
        let pnl = summary.total_pnl();
        let sign = if pnl >= 0.0 { "+" } else { "" };
        let field = |name: &str, value: String| EmbedField {
            name: name.to_string(),
            value,
            inline: false,
        };

        WebhookPayload {
            username: self.username.clone(),
            embeds: vec![Embed {
                title: "PNL Summary".to_string(),
                description: format!("**Total PNL: {}{:.4}**", sign, pnl),
                color: if pnl >= 0.0 { COLOR_PROFIT } else { COLOR_LOSS },
                fields: vec![
                    field("Current Balance", format!("{:.4} SOL", summary.current_balance)),
                    field("Initial Balance", format!("{:.4} SOL", summary.initial_balance)),
                    field("Executed Orders", summary.executed_count.to_string()),
                ],
                footer: EmbedFooter {
                    text: env!("CARGO_PKG_NAME").to_string(),
                },
                timestamp: Utc::now().to_rfc3339(),
            }],
        }
    }
}

#[async_trait]
impl SummaryNotifier for DiscordWebhookNotifier {
    async fn send_summary(&self, summary: &TradingSummary) -> Result<(), AppError> {
        let response = self
            .http_client
            .post(&self.webhook_url)
            .json(&self.payload(summary))
            .send()
            .await
            .map_err(|e| AppError::NotificationError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::NotificationError(format!(
                "Webhook returned status: {}",
                response.status()
            )));
        }

        info!("PnL summary sent ({} executed orders)", summary.executed_count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier() -> DiscordWebhookNotifier {
        DiscordWebhookNotifier::new(
            "https://discord.invalid/webhook".to_string(),
            "curvemirror".to_string(),
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn test_profit_payload() {
        let summary = TradingSummary {
            initial_balance: 10.0,
            current_balance: 12.5,
            executed_count: 3,
        };
        let payload = serde_json::to_value(notifier().payload(&summary)).unwrap();
        let embed = &payload["embeds"][0];

        assert_eq!(embed["description"], "**Total PNL: +2.5000**");
        assert_eq!(embed["color"], COLOR_PROFIT);
        assert_eq!(embed["fields"][2]["value"], "3");
    }

    #[test]
    fn test_loss_payload_is_red() {
        let summary = TradingSummary {
            initial_balance: 10.0,
            current_balance: 9.0,
            executed_count: 1,
        };
        let payload = serde_json::to_value(notifier().payload(&summary)).unwrap();
        assert_eq!(payload["embeds"][0]["color"], COLOR_LOSS);
        assert_eq!(payload["embeds"][0]["description"], "**Total PNL: -1.0000**");
    }
}
