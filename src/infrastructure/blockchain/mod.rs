//! Ledger access and transaction submission

pub mod rpc_client;
pub mod submitter;

pub use rpc_client::{SolanaRpcClient, WalletBalance};
pub use submitter::{SubmitResult, Submitter, SubmitterConfig};

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash, pubkey::Pubkey, signature::Signature, transaction::VersionedTransaction,
};

use crate::shared::errors::AppError;

/// Outcome of a transaction simulation.
#[derive(Debug, Clone, Default)]
pub struct SimulationOutcome {
    pub err: Option<String>,
    pub logs: Vec<String>,
    pub units_consumed: Option<u64>,
}

/// Ledger view of a submitted signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureState {
    Processed,
    Confirmed,
    Finalized,
    Failed(String),
}

impl SignatureState {
    pub fn is_landed(&self) -> bool {
        matches!(self, SignatureState::Confirmed | SignatureState::Finalized)
    }
}

/// The ledger RPC calls the bot depends on.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    async fn latest_blockhash(&self) -> Result<Hash, AppError>;

    /// Simulate at processed commitment, replacing the blockhash.
    async fn simulate(&self, tx: &VersionedTransaction) -> Result<SimulationOutcome, AppError>;

    /// Send without preflight.
    async fn send_raw(&self, tx: &VersionedTransaction) -> Result<Signature, AppError>;

    async fn balance(&self, owner: &Pubkey) -> Result<u64, AppError>;

    /// `None` while the ledger has not seen the signature.
    async fn signature_status(&self, signature: &Signature)
        -> Result<Option<SignatureState>, AppError>;
}
