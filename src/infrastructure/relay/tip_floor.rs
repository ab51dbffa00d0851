//! HTTP source for the relay's landed-tip distribution

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::domain::fees::{TipFloorRecord, TipFloorSource};
use crate::shared::errors::AppError;

pub const DEFAULT_TIP_FLOOR_URL: &str = "https://bundles.jito.wtf/api/v1/bundles/tip_floor";

pub struct JitoTipFloorClient {
    http_client: Client,
    url: String,
}

impl JitoTipFloorClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build tip floor client: {}", e)))?;
        Ok(Self { http_client, url })
    }
}

#[async_trait]
impl TipFloorSource for JitoTipFloorClient {
    async fn fetch_tip_floor(&self) -> Result<Vec<TipFloorRecord>, AppError> {
        let response = self.http_client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::FeeMarketError(format!(
                "Tip floor request failed with status: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}
