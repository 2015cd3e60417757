//! Execution context for transaction building
//!
//! Holds the per-attempt state needed to turn a plan into a signable
//! transaction: the fresh mint identity, the checkpoint it is anchored to
//! and the trace context used for log correlation.

use crate::observability::TraceContext;
use crate::rpc_manager::Checkpoint;
use crate::tx_builder::errors::TransactionBuilderError;
use crate::tx_builder::instructions::MintTransactionPlan;
use solana_sdk::{
    message::Message,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};

/// Freshly generated keypair that becomes the mint address
///
/// Its secret never leaves this process. It signs exactly one transaction
/// and is dropped with the attempt, so it is intentionally not `Clone`.
pub struct MintIdentity {
    keypair: Keypair,
}

impl MintIdentity {
    pub fn generate() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub(crate) fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl std::fmt::Debug for MintIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MintIdentity")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}

/// Execution context for building a transaction
///
/// The checkpoint is fetched immediately before signing. The context is
/// consumed by [`ExecutionContext::prepare_transaction`] so one checkpoint
/// is never reused for a second signed transaction.
pub struct ExecutionContext {
    /// Checkpoint the transaction is anchored to
    pub checkpoint: Checkpoint,

    /// Payer and fee payer of the transaction
    pub fee_payer: Pubkey,

    pub trace_context: TraceContext,
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("blockhash", &self.checkpoint.blockhash)
            .field(
                "last_valid_block_height",
                &self.checkpoint.last_valid_block_height,
            )
            .field("fee_payer", &self.fee_payer)
            .field("correlation_id", &self.trace_context.correlation_id())
            .field("stage", &self.trace_context.stage_name())
            .field("span_id", &self.trace_context.span_id())
            .finish()
    }
}

impl ExecutionContext {
    pub fn new(checkpoint: Checkpoint, fee_payer: Pubkey, trace_context: TraceContext) -> Self {
        Self {
            checkpoint,
            fee_payer,
            trace_context,
        }
    }

    /// Build the transaction for `plan` and add the mint signature
    ///
    /// The payer slot is left empty for the external wallet.
    pub fn prepare_transaction(
        self,
        plan: &MintTransactionPlan,
        mint: &MintIdentity,
    ) -> Result<Transaction, TransactionBuilderError> {
        if plan.payer != self.fee_payer {
            return Err(TransactionBuilderError::internal(format!(
                "Plan payer {} does not match fee payer {}",
                plan.payer, self.fee_payer
            )));
        }
        if plan.mint != mint.pubkey() {
            return Err(TransactionBuilderError::internal(format!(
                "Plan mint {} does not match mint identity {}",
                plan.mint,
                mint.pubkey()
            )));
        }

        let message = Message::new_with_blockhash(
            &plan.instructions,
            Some(&self.fee_payer),
            &self.checkpoint.blockhash,
        );
        let mut tx = Transaction::new_unsigned(message);
        tx.try_partial_sign(&[mint.keypair()], self.checkpoint.blockhash)
            .map_err(|e| TransactionBuilderError::Signing(e.to_string()))?;

        tracing::debug!(
            correlation_id = %self.trace_context.correlation_id(),
            span_id = %self.trace_context.span_id(),
            parent_span_id = ?self.trace_context.parent_span_id(),
            mint = %plan.mint,
            last_valid_block_height = self.checkpoint.last_valid_block_height,
            "Transaction prepared and signed by mint identity"
        );
        Ok(tx)
    }
}
