//! Simulate-then-send transaction submission

use serde::Serialize;
use solana_sdk::{signature::Signature, transaction::VersionedTransaction};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{LedgerRpc, SignatureState};
use crate::domain::execution::{describe_simulation_failure, SwapQuote};
use crate::infrastructure::relay::{RelayTransport, RetryPolicy};
use crate::shared::errors::ExecutionError;
use crate::shared::utils::solscan_link;

const LANDED_STATUSES: [&str; 2] = ["confirmed", "finalized"];

#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    pub bundle_poll: RetryPolicy,
    pub signature_poll: RetryPolicy,
    /// Wait for confirmation of direct (untipped) sends.
    pub confirm_direct: bool,
    /// Simulate only, never send.
    pub dry_run: bool,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            bundle_poll: RetryPolicy::bundle_status(),
            signature_poll: RetryPolicy::signature_status(),
            confirm_direct: true,
            dry_run: false,
        }
    }
}

/// Uniform result of one submission attempt.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResult {
    pub success: bool,
    pub signature: String,
    pub bundle_id: Option<String>,
    pub quote: SwapQuote,
    pub error: Option<String>,
}

impl SubmitResult {
    fn failed(signature: String, bundle_id: Option<String>, quote: SwapQuote, error: String) -> Self {
        Self {
            success: false,
            signature,
            bundle_id,
            quote,
            error: Some(error),
        }
    }
}

pub struct Submitter {
    rpc: Arc<dyn LedgerRpc>,
    relay: Arc<dyn RelayTransport>,
    config: SubmitterConfig,
}

impl Submitter {
    pub fn new(rpc: Arc<dyn LedgerRpc>, relay: Arc<dyn RelayTransport>, config: SubmitterConfig) -> Self {
        Self { rpc, relay, config }
    }

    /// Run a simulation. Any failure aborts the attempt without retry.
    pub async fn simulate(&self, tx: &VersionedTransaction) -> Result<(), ExecutionError> {
        let outcome = self
            .rpc
            .simulate(tx)
            .await
            .map_err(|e| ExecutionError::SimulationAbort(e.to_string()))?;

        if let Some(err) = outcome.err {
            let message = describe_simulation_failure(&outcome.logs);
            error!("Simulation failed: {} ({})", message, err);
            debug!("Simulation logs: {:?}", outcome.logs);
            return Err(ExecutionError::SimulationAbort(message));
        }

        debug!("Simulation ok, units consumed: {:?}", outcome.units_consumed);
        Ok(())
    }

    /// Simulate, then send directly (zero tip) or through the relay.
    ///
    /// Only a simulation abort is returned as `Err`. Everything after it is
    /// reported through [`SubmitResult`].
    pub async fn submit(
        &self,
        tx: &VersionedTransaction,
        tip_lamports: u64,
        quote: SwapQuote,
    ) -> Result<SubmitResult, ExecutionError> {
        self.simulate(tx).await?;

        let signature = tx.signatures.first().copied().unwrap_or_default();

        if self.config.dry_run {
            info!("Simulate-only mode, not sending {}", signature);
            return Ok(SubmitResult {
                success: true,
                signature: signature.to_string(),
                bundle_id: None,
                quote,
                error: None,
            });
        }

        if tip_lamports == 0 {
            return Ok(self.send_direct(tx, quote).await);
        }
        Ok(self.send_via_relay(tx, signature, quote).await)
    }

    async fn send_direct(&self, tx: &VersionedTransaction, quote: SwapQuote) -> SubmitResult {
        let signature = match self.rpc.send_raw(tx).await {
            Ok(signature) => signature,
            Err(e) => {
                let signature = tx.signatures.first().copied().unwrap_or_default();
                warn!("Direct send failed: {}", e);
                return SubmitResult::failed(
                    signature.to_string(),
                    None,
                    quote,
                    ExecutionError::SubmissionFailure(e.to_string()).to_string(),
                );
            }
        };
        info!("Sent {}", solscan_link(&signature.to_string()));

        if self.config.confirm_direct {
            if let Err(e) = self.await_signature(&signature).await {
                return SubmitResult::failed(signature.to_string(), None, quote, e.to_string());
            }
        }

        SubmitResult {
            success: true,
            signature: signature.to_string(),
            bundle_id: None,
            quote,
            error: None,
        }
    }

    async fn send_via_relay(
        &self,
        tx: &VersionedTransaction,
        signature: Signature,
        quote: SwapQuote,
    ) -> SubmitResult {
        let encoded = match bincode::serialize(tx) {
            Ok(bytes) => bs58::encode(bytes).into_string(),
            Err(e) => {
                return SubmitResult::failed(
                    signature.to_string(),
                    None,
                    quote,
                    ExecutionError::Assembly(format!("serialize transaction: {}", e)).to_string(),
                )
            }
        };

        let receipt = match self.relay.submit(&encoded).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!("Relay rejected submission: {}", e);
                return SubmitResult::failed(
                    signature.to_string(),
                    None,
                    quote,
                    ExecutionError::SubmissionFailure(e.to_string()).to_string(),
                );
            }
        };
        info!("Relayed {}", solscan_link(&signature.to_string()));

        let confirmation = match &receipt.bundle_id {
            Some(bundle_id) => self.poll_bundle(bundle_id).await,
            None => self.await_signature(&signature).await,
        };

        match confirmation {
            Ok(()) => SubmitResult {
                success: true,
                signature: signature.to_string(),
                bundle_id: receipt.bundle_id,
                quote,
                error: None,
            },
            Err(e) => SubmitResult::failed(signature.to_string(), receipt.bundle_id, quote, e.to_string()),
        }
    }

    /// Poll the relay until the bundle lands or the attempts run out.
    pub async fn poll_bundle(&self, bundle_id: &str) -> Result<(), ExecutionError> {
        let policy = self.config.bundle_poll;

        for attempt in 1..=policy.max_attempts {
            match self.relay.bundle_status(bundle_id).await {
                Ok(Some(status)) if LANDED_STATUSES.contains(&status.as_str()) => {
                    info!("Bundle {} {} after {} attempts", bundle_id, status, attempt);
                    return Ok(());
                }
                Ok(status) => debug!("Bundle {} status {:?} (attempt {})", bundle_id, status, attempt),
                Err(e) => warn!("Bundle status check failed (attempt {}): {}", attempt, e),
            }
            tokio::time::sleep(policy.next_delay()).await;
        }

        Err(ExecutionError::PollTimeout {
            attempts: policy.max_attempts,
        })
    }

    /// Poll the ledger until `signature` is confirmed, fails, or attempts run out.
    pub async fn await_signature(&self, signature: &Signature) -> Result<(), ExecutionError> {
        let policy = self.config.signature_poll;

        for attempt in 1..=policy.max_attempts {
            tokio::time::sleep(policy.next_delay()).await;

            match self.rpc.signature_status(signature).await {
                Ok(Some(SignatureState::Failed(err))) => {
                    return Err(ExecutionError::SubmissionFailure(format!(
                        "transaction failed on-chain: {}",
                        err
                    )));
                }
                Ok(Some(state)) if state.is_landed() => {
                    debug!("{} landed after {} attempts", signature, attempt);
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => warn!("Signature status check failed (attempt {}): {}", attempt, e),
            }
        }

        Err(ExecutionError::PollTimeout {
            attempts: policy.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::blockchain::SimulationOutcome;
    use crate::infrastructure::relay::RelayReceipt;
    use crate::shared::errors::AppError;
    use async_trait::async_trait;
    use solana_sdk::{
        hash::Hash,
        pubkey::Pubkey,
        signature::{Keypair, Signer},
        system_instruction,
    };
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use crate::domain::execution::TransactionAssembler;

    struct FakeLedger {
        simulation: SimulationOutcome,
        statuses: Mutex<VecDeque<Option<SignatureState>>>,
        sends: AtomicU32,
    }

    impl FakeLedger {
        fn new(simulation: SimulationOutcome, statuses: Vec<Option<SignatureState>>) -> Self {
            Self {
                simulation,
                statuses: Mutex::new(statuses.into()),
                sends: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl LedgerRpc for FakeLedger {
        async fn latest_blockhash(&self) -> Result<Hash, AppError> {
            Ok(Hash::new_unique())
        }

        async fn simulate(&self, _tx: &VersionedTransaction) -> Result<SimulationOutcome, AppError> {
            Ok(self.simulation.clone())
        }

        async fn send_raw(&self, tx: &VersionedTransaction) -> Result<Signature, AppError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            Ok(tx.signatures[0])
        }

        async fn balance(&self, _owner: &Pubkey) -> Result<u64, AppError> {
            Ok(0)
        }

        async fn signature_status(
            &self,
            _signature: &Signature,
        ) -> Result<Option<SignatureState>, AppError> {
            Ok(self.statuses.lock().unwrap().pop_front().flatten())
        }
    }

    struct FakeRelay {
        bundle_id: Option<String>,
        statuses: Mutex<VecDeque<Option<String>>>,
        submissions: AtomicU32,
        status_calls: AtomicU32,
    }

    impl FakeRelay {
        fn new(bundle_id: Option<&str>, statuses: Vec<Option<&str>>) -> Self {
            Self {
                bundle_id: bundle_id.map(str::to_string),
                statuses: Mutex::new(statuses.into_iter().map(|s| s.map(str::to_string)).collect()),
                submissions: AtomicU32::new(0),
                status_calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl RelayTransport for FakeRelay {
        async fn submit(&self, encoded_tx: &str) -> Result<RelayReceipt, AppError> {
            assert!(bs58::decode(encoded_tx).into_vec().is_ok());
            self.submissions.fetch_add(1, Ordering::SeqCst);
            Ok(RelayReceipt {
                result: "sig".to_string(),
                bundle_id: self.bundle_id.clone(),
            })
        }

        async fn bundle_status(&self, _bundle_id: &str) -> Result<Option<String>, AppError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.statuses.lock().unwrap().pop_front().flatten())
        }
    }

    fn fast_config() -> SubmitterConfig {
        SubmitterConfig {
            bundle_poll: RetryPolicy::new(3, Duration::ZERO),
            signature_poll: RetryPolicy::new(3, Duration::ZERO),
            confirm_direct: true,
            dry_run: false,
        }
    }

    fn signed_tx() -> VersionedTransaction {
        let payer = Keypair::new();
        let ix = system_instruction::transfer(&payer.pubkey(), &Pubkey::new_unique(), 1);
        TransactionAssembler::assemble(&payer, &[ix], Hash::new_unique()).unwrap()
    }

    fn quote() -> SwapQuote {
        SwapQuote { in_amount: 100, out_amount: 5 }
    }

    fn failed_simulation(log: &str) -> SimulationOutcome {
        SimulationOutcome {
            err: Some("InstructionError(3, Custom(6005))".to_string()),
            logs: vec![log.to_string()],
            units_consumed: None,
        }
    }

    #[tokio::test]
    async fn test_simulation_failure_aborts() {
        let ledger = Arc::new(FakeLedger::new(
            failed_simulation("Program x failed: custom program error: 0x1775"),
            vec![],
        ));
        let relay = Arc::new(FakeRelay::new(Some("b1"), vec![]));
        let submitter = Submitter::new(ledger.clone(), relay.clone(), fast_config());

        let err = submitter.submit(&signed_tx(), 1_000, quote()).await.unwrap_err();
        match err {
            ExecutionError::SimulationAbort(message) => assert_eq!(message, "Token migrated to Raydium."),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(ledger.sends.load(Ordering::SeqCst), 0);
        assert_eq!(relay.submissions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_tip_sends_directly() {
        let ledger = Arc::new(FakeLedger::new(
            SimulationOutcome::default(),
            vec![None, Some(SignatureState::Confirmed)],
        ));
        let relay = Arc::new(FakeRelay::new(None, vec![]));
        let submitter = Submitter::new(ledger.clone(), relay.clone(), fast_config());

        let tx = signed_tx();
        let result = submitter.submit(&tx, 0, quote()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.signature, tx.signatures[0].to_string());
        assert_eq!(ledger.sends.load(Ordering::SeqCst), 1);
        assert_eq!(relay.submissions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bundle_confirmed_within_budget() {
        let ledger = Arc::new(FakeLedger::new(SimulationOutcome::default(), vec![]));
        let relay = Arc::new(FakeRelay::new(Some("b1"), vec![None, Some("processed"), Some("confirmed")]));
        let submitter = Submitter::new(ledger, relay.clone(), fast_config());

        let result = submitter.submit(&signed_tx(), 1_000, quote()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.bundle_id.as_deref(), Some("b1"));
        assert_eq!(relay.status_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_bundle_poll_exhaustion_is_failure() {
        let ledger = Arc::new(FakeLedger::new(SimulationOutcome::default(), vec![]));
        let relay = Arc::new(FakeRelay::new(Some("b1"), vec![]));
        let submitter = Submitter::new(ledger, relay.clone(), fast_config());

        let result = submitter.submit(&signed_tx(), 1_000, quote()).await.unwrap();
        assert!(!result.success);
        assert_eq!(relay.status_calls.load(Ordering::SeqCst), 3);
        assert!(result.error.unwrap().contains("3 attempts"));
    }

    #[tokio::test]
    async fn test_on_chain_failure_reported() {
        let ledger = Arc::new(FakeLedger::new(
            SimulationOutcome::default(),
            vec![Some(SignatureState::Failed("custom program error".to_string()))],
        ));
        let relay = Arc::new(FakeRelay::new(None, vec![]));
        let submitter = Submitter::new(ledger, relay, fast_config());

        let result = submitter.submit(&signed_tx(), 0, quote()).await.unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_dry_run_never_sends() {
        let ledger = Arc::new(FakeLedger::new(SimulationOutcome::default(), vec![]));
        let relay = Arc::new(FakeRelay::new(Some("b1"), vec![]));
        let config = SubmitterConfig { dry_run: true, ..fast_config() };
        let submitter = Submitter::new(ledger.clone(), relay.clone(), config);

        let result = submitter.submit(&signed_tx(), 1_000, quote()).await.unwrap();
        assert!(result.success);
        assert_eq!(ledger.sends.load(Ordering::SeqCst), 0);
        assert_eq!(relay.submissions.load(Ordering::SeqCst), 0);
    }
}
