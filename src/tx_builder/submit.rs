//! Sign, submit and confirm a mint transaction
//!
//! One attempt follows a fixed protocol:
//! 1. Fetch a checkpoint immediately before signing
//! 2. Sign locally with the mint identity
//! 3. Ask the wallet for the payer signature, exactly once
//! 4. Submit once
//! 5. Wait for confirmation, retrying only on checkpoint expiry with a
//!    fresh checkpoint for the same signature
//! 6. Settle the outcome with a direct status lookup
//!
//! The signed transaction is never re-submitted and never re-signed.

use crate::metrics::{metrics, Timer};
use crate::observability::TraceContext;
use crate::rpc_manager::{
    render_transaction_error, retry_fixed, Checkpoint, FixedRetryPolicy, NetworkClient,
    NetworkError,
};
use crate::structured_logging::{MintLogger, SubmissionStage};
use crate::tx_builder::context::{ExecutionContext, MintIdentity};
use crate::tx_builder::errors::TransactionBuilderError;
use crate::tx_builder::instructions::{sanity_check_plan_order, MintTransactionPlan};
use crate::tx_builder::output::SubmissionOutput;
use crate::wallet::WalletSigner;
use solana_sdk::signature::Signature;
use std::sync::Arc;
use tracing::{debug, warn};

/// Drives one mint transaction from plan to terminal status
#[derive(Clone)]
pub struct TransactionSubmitter {
    network: Arc<dyn NetworkClient>,
    retry: FixedRetryPolicy,
}

impl std::fmt::Debug for TransactionSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionSubmitter")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl TransactionSubmitter {
    pub fn new(network: Arc<dyn NetworkClient>, retry: FixedRetryPolicy) -> Self {
        Self { network, retry }
    }

    /// Sign, submit and confirm `plan`
    ///
    /// The mint identity is consumed; a failed attempt needs a new one.
    pub async fn submit(
        &self,
        plan: &MintTransactionPlan,
        mint: MintIdentity,
        wallet: &dyn WalletSigner,
        logger: &MintLogger,
        trace: &TraceContext,
    ) -> Result<SubmissionOutput, TransactionBuilderError> {
        sanity_check_plan_order(plan)?;

        let checkpoint = self
            .network
            .get_latest_checkpoint()
            .await
            .map_err(TransactionBuilderError::Blockhash)?;

        let ctx = ExecutionContext::new(checkpoint, wallet.pubkey(), trace.stage("submit"));
        let tx = ctx.prepare_transaction(plan, &mint)?;
        drop(mint);
        logger.log_stage(SubmissionStage::Built, None);

        let expected_message = tx.message.clone();
        let signed = wallet.sign_transaction(tx).await.map_err(|e| {
            metrics().signature_rejections.inc();
            TransactionBuilderError::SignatureRejected(e.to_string())
        })?;
        if signed.message != expected_message {
            return Err(TransactionBuilderError::SignatureRejected(
                "Wallet altered the transaction message".to_string(),
            ));
        }
        if !signed.is_signed() {
            return Err(TransactionBuilderError::SignatureRejected(
                "Wallet returned an incompletely signed transaction".to_string(),
            ));
        }
        logger.log_stage(SubmissionStage::Signed, None);

        let signature = self
            .network
            .send_transaction(&signed)
            .await
            .map_err(|e| {
                warn!(category = e.category(), error = %e, "Node did not accept the transaction");
                TransactionBuilderError::Submission(e)
            })?;
        let signature_str = signature.to_string();
        logger.log_stage(SubmissionStage::Submitted, Some(&signature_str));

        let timer = Timer::new();
        logger.log_stage(SubmissionStage::Confirming, Some(&signature_str));
        let (confirmed, confirm_retries) = self
            .confirm_with_fresh_checkpoints(&signature, checkpoint, logger)
            .await;
        timer.observe_duration(&metrics().confirm_latency);

        let final_checkpoint = self.settle(&signature, confirmed, checkpoint, logger).await?;
        logger.log_stage(SubmissionStage::Finalized, Some(&signature_str));

        Ok(SubmissionOutput {
            signature,
            checkpoint: final_checkpoint,
            confirm_retries,
        })
    }

    /// Bounded confirmation wait for an already submitted signature
    ///
    /// Returns the checkpoint that confirmed, or the last confirmation error.
    async fn confirm_with_fresh_checkpoints(
        &self,
        signature: &Signature,
        initial: Checkpoint,
        logger: &MintLogger,
    ) -> (Result<Checkpoint, NetworkError>, u32) {
        let signature = *signature;
        let signature_str = signature.to_string();
        let max_retries = self.retry.max_retries;

        let outcome = retry_fixed(
            "confirm_transaction",
            &self.retry,
            initial,
            |cp: Checkpoint| {
                let network = Arc::clone(&self.network);
                async move {
                    let result = network
                        .confirm_transaction(&signature, &cp)
                        .await
                        .map(|_| cp);
                    (result, cp)
                }
            },
            NetworkError::is_expired,
            |retry, previous: Checkpoint| {
                let network = Arc::clone(&self.network);
                let signature_str = signature_str.clone();
                async move {
                    metrics().confirm_retries.inc();
                    match network.get_latest_checkpoint().await {
                        Ok(fresh) => {
                            logger.log_confirm_retry(
                                &signature_str,
                                retry,
                                max_retries,
                                Some(fresh.last_valid_block_height),
                            );
                            fresh
                        }
                        Err(e) => {
                            logger.log_confirm_retry(&signature_str, retry, max_retries, None);
                            warn!(
                                signature = %signature_str,
                                error = %e,
                                "Failed to refresh checkpoint, keeping previous one"
                            );
                            previous
                        }
                    }
                }
            },
        )
        .await;

        (outcome.result, outcome.retries)
    }

    /// Decide the terminal outcome from the confirmation result and a
    /// direct status lookup. The lookup wins whenever it has an answer.
    async fn settle(
        &self,
        signature: &Signature,
        confirmed: Result<Checkpoint, NetworkError>,
        signing_checkpoint: Checkpoint,
        logger: &MintLogger,
    ) -> Result<Checkpoint, TransactionBuilderError> {
        let on_chain = |error: &solana_sdk::transaction::TransactionError| {
            TransactionBuilderError::OnChain {
                signature: signature.to_string(),
                error: render_transaction_error(error),
            }
        };

        if let Err(NetworkError::OnChain(error)) = &confirmed {
            return Err(on_chain(error));
        }

        match self.network.get_signature_status(signature).await {
            Ok(Some(status)) => {
                if let Some(error) = &status.err {
                    return Err(on_chain(error));
                }
                debug!(signature = %signature, slot = status.slot, "Status lookup found transaction");
                Ok(confirmed.unwrap_or(signing_checkpoint))
            }
            Ok(None) => match confirmed {
                Ok(cp) => {
                    logger.warn("Confirmed transaction not visible in status lookup");
                    Ok(cp)
                }
                Err(e) => Err(TransactionBuilderError::Unconfirmed {
                    signature: signature.to_string(),
                    reason: e.to_string(),
                }),
            },
            Err(lookup_err) => match confirmed {
                Ok(cp) => {
                    logger.warn(&format!(
                        "Status lookup failed after confirmation: {}",
                        lookup_err
                    ));
                    Ok(cp)
                }
                Err(e) => Err(TransactionBuilderError::Unconfirmed {
                    signature: signature.to_string(),
                    reason: format!("{}; status lookup failed: {}", e, lookup_err),
                }),
            },
        }
    }
}
