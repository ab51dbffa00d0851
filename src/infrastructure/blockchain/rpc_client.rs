//! Solana RPC client

use async_trait::async_trait;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig},
};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::VersionedTransaction,
};
use solana_transaction_status::TransactionConfirmationStatus;
use std::sync::Arc;

use super::{LedgerRpc, SignatureState, SimulationOutcome};
use crate::domain::risk::BalanceSource;
use crate::shared::errors::AppError;

/// Solana RPC client wrapper
pub struct SolanaRpcClient {
    client: RpcClient,
}

impl SolanaRpcClient {
    pub fn new(rpc_url: String) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url, CommitmentConfig::processed()),
        }
    }
}

#[async_trait]
impl LedgerRpc for SolanaRpcClient {
    async fn latest_blockhash(&self) -> Result<Hash, AppError> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| AppError::BlockchainError(format!("Failed to get latest blockhash: {}", e)))
    }

    async fn simulate(&self, tx: &VersionedTransaction) -> Result<SimulationOutcome, AppError> {
        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: true,
            commitment: Some(CommitmentConfig::processed()),
            ..Default::default()
        };

        let response = self
            .client
            .simulate_transaction_with_config(tx, config)
            .await
            .map_err(|e| AppError::BlockchainError(format!("Simulation request failed: {}", e)))?;

        Ok(SimulationOutcome {
            err: response.value.err.map(|e| e.to_string()),
            logs: response.value.logs.unwrap_or_default(),
            units_consumed: response.value.units_consumed,
        })
    }

    async fn send_raw(&self, tx: &VersionedTransaction) -> Result<Signature, AppError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            ..Default::default()
        };

        self.client
            .send_transaction_with_config(tx, config)
            .await
            .map_err(|e| AppError::BlockchainError(format!("Failed to send transaction: {}", e)))
    }

    async fn balance(&self, owner: &Pubkey) -> Result<u64, AppError> {
        self.client
            .get_balance(owner)
            .await
            .map_err(|e| AppError::BlockchainError(format!("Failed to get balance: {}", e)))
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureState>, AppError> {
        let response = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|e| {
                AppError::BlockchainError(format!("Failed to get signature status: {}", e))
            })?;

        let status = match response.value.into_iter().next().flatten() {
            Some(status) => status,
            None => return Ok(None),
        };

        if let Some(err) = status.err {
            return Ok(Some(SignatureState::Failed(err.to_string())));
        }

        Ok(Some(match status.confirmation_status {
            Some(TransactionConfirmationStatus::Finalized) => SignatureState::Finalized,
            Some(TransactionConfirmationStatus::Confirmed) => SignatureState::Confirmed,
            _ => SignatureState::Processed,
        }))
    }
}

/// Reads the native balance of one wallet through any ledger client.
pub struct WalletBalance {
    rpc: Arc<dyn LedgerRpc>,
    owner: Pubkey,
}

impl WalletBalance {
    pub fn new(rpc: Arc<dyn LedgerRpc>, owner: Pubkey) -> Self {
        Self { rpc, owner }
    }
}

#[async_trait]
impl BalanceSource for WalletBalance {
    async fn wallet_balance(&self) -> Result<u64, AppError> {
        self.rpc.balance(&self.owner).await
    }
}
