//! Structured logging for mint pipeline events

use crate::observability::{CorrelationId, TraceContext};
use crate::types::FeeOption;
use uuid::Uuid;

/// Pipeline stage of one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Built,
    Signed,
    Submitted,
    Confirming,
    Finalized,
}

impl SubmissionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStage::Built => "built",
            SubmissionStage::Signed => "signed",
            SubmissionStage::Submitted => "submitted",
            SubmissionStage::Confirming => "confirming",
            SubmissionStage::Finalized => "finalized",
        }
    }
}

/// Structured logger bound to one mint attempt
#[derive(Debug, Clone)]
pub struct MintLogger {
    correlation_id: CorrelationId,
    span_id: Uuid,
    fee_option: FeeOption,
}

impl MintLogger {
    pub fn new(trace: &TraceContext) -> Self {
        Self {
            correlation_id: trace.correlation_id(),
            span_id: trace.span_id(),
            fee_option: trace.fee_option(),
        }
    }

    pub fn log_mint_attempt(&self, payer: &str, symbol: &str) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            span_id = %self.span_id,
            payer = %payer,
            symbol = %symbol,
            fee_option = %self.fee_option,
            "Attempting token mint"
        );
    }

    pub fn log_plan_built(&self, mint: &str, instruction_count: usize, space: usize, rent_lamports: u64) {
        tracing::debug!(
            correlation_id = %self.correlation_id,
            mint = %mint,
            instruction_count,
            space,
            rent_lamports,
            "Mint transaction plan built"
        );
    }

    pub fn log_stage(&self, stage: SubmissionStage, signature: Option<&str>) {
        tracing::debug!(
            correlation_id = %self.correlation_id,
            stage = stage.as_str(),
            signature = ?signature,
            "Submission stage"
        );
    }

    pub fn log_confirm_retry(&self, signature: &str, retry: u32, max_retries: u32, last_valid_block_height: Option<u64>) {
        tracing::warn!(
            correlation_id = %self.correlation_id,
            signature = %signature,
            retry,
            max_retries,
            last_valid_block_height = ?last_valid_block_height,
            "Checkpoint expired before confirmation, retrying"
        );
    }

    pub fn log_mint_success(&self, mint: &str, signature: &str, confirm_retries: u32, latency_ms: u64) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            mint = %mint,
            signature = %signature,
            fee_option = %self.fee_option,
            confirm_retries,
            latency_ms,
            "Token mint successful"
        );
    }

    pub fn log_mint_failure(&self, category: &str, error: &str, latency_ms: u64) {
        tracing::warn!(
            correlation_id = %self.correlation_id,
            category = %category,
            error = %error,
            latency_ms,
            "Token mint failed"
        );
    }

    pub fn log_persist_failure(&self, mint: &str, category: &str, error: &str) {
        tracing::error!(
            correlation_id = %self.correlation_id,
            mint = %mint,
            category = %category,
            error = %error,
            "Token minted but record could not be saved"
        );
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(
            correlation_id = %self.correlation_id,
            message = %message,
            "Warning"
        );
    }
}
