//! Jito block-engine JSON-RPC client

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::retry_policy::{Region, RegionRotation};
use crate::shared::errors::AppError;

const TRANSACTIONS_PATH: &str = "/api/v1/transactions";
const BUNDLES_PATH: &str = "/api/v1/bundles";
const BUNDLE_ID_HEADER: &str = "x-bundle-id";

/// Which relay method carries the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    /// `sendTransaction` on the transactions endpoint.
    #[default]
    Transaction,
    /// `sendBundle` with a single-transaction bundle.
    Bundle,
}

/// Relay acceptance of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReceipt {
    /// The JSON-RPC `result`: a bundle id, or a signature for `sendTransaction`.
    pub result: String,
    /// Bundle to poll, when the relay reported one.
    pub bundle_id: Option<String>,
}

#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Submit a base58-encoded serialized transaction.
    async fn submit(&self, encoded_tx: &str) -> Result<RelayReceipt, AppError>;

    /// Confirmation status of a bundle, `None` while unknown to the relay.
    async fn bundle_status(&self, bundle_id: &str) -> Result<Option<String>, AppError>;
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

impl<'a> JsonRpcRequest<'a> {
    fn new(method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct BundleStatuses {
    #[serde(default)]
    value: Option<Vec<BundleStatusEntry>>,
}

#[derive(Debug, Deserialize)]
struct BundleStatusEntry {
    #[serde(default)]
    confirmation_status: Option<String>,
}

pub struct JitoRelayClient {
    http_client: Client,
    rotation: RegionRotation,
    mode: RelayMode,
    auth_token: Option<String>,
}

impl JitoRelayClient {
    pub fn new(
        regions: Vec<Region>,
        mode: RelayMode,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build relay HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            rotation: RegionRotation::new(regions),
            mode,
            auth_token: auth_token.filter(|token| !token.is_empty()),
        })
    }

    fn endpoint(&self, region: Region, path: &str) -> String {
        match &self.auth_token {
            Some(token) => format!("{}{}?uuid={}", region.base_url(), path, token),
            None => format!("{}{}", region.base_url(), path),
        }
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        request: &JsonRpcRequest<'_>,
    ) -> Result<(T, Option<String>), AppError> {
        let response = self.http_client.post(url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(AppError::BlockchainError(format!(
                "Relay {} failed with status: {}",
                request.method,
                response.status()
            )));
        }

        let bundle_id = response
            .headers()
            .get(BUNDLE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body: JsonRpcResponse<T> = response.json().await?;
        if let Some(error) = body.error {
            return Err(AppError::BlockchainError(format!(
                "Relay {} error {}: {}",
                request.method, error.code, error.message
            )));
        }

        let result = body.result.ok_or_else(|| {
            AppError::BlockchainError(format!("Relay {} returned no result", request.method))
        })?;
        Ok((result, bundle_id))
    }
}

#[async_trait]
impl RelayTransport for JitoRelayClient {
    async fn submit(&self, encoded_tx: &str) -> Result<RelayReceipt, AppError> {
        let region = self.rotation.next();

        let receipt = match self.mode {
            RelayMode::Transaction => {
                let request = JsonRpcRequest::new("sendTransaction", json!([encoded_tx]));
                let (signature, header_bundle_id) = self
                    .post::<String>(&self.endpoint(region, TRANSACTIONS_PATH), &request)
                    .await?;
                RelayReceipt {
                    result: signature,
                    bundle_id: header_bundle_id,
                }
            }
            RelayMode::Bundle => {
                let request = JsonRpcRequest::new("sendBundle", json!([[encoded_tx]]));
                let (bundle_id, _) = self
                    .post::<String>(&self.endpoint(region, BUNDLES_PATH), &request)
                    .await?;
                RelayReceipt {
                    result: bundle_id.clone(),
                    bundle_id: Some(bundle_id),
                }
            }
        };

        debug!("Relay accepted submission via {}: {}", region, receipt.result);
        Ok(receipt)
    }

    async fn bundle_status(&self, bundle_id: &str) -> Result<Option<String>, AppError> {
        let region = self.rotation.next();
        let request = JsonRpcRequest::new("getBundleStatuses", json!([[bundle_id]]));
        let (statuses, _) = self
            .post::<BundleStatuses>(&self.endpoint(region, BUNDLES_PATH), &request)
            .await?;

        Ok(statuses
            .value
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|entry| entry.confirmation_status))
    }
}
