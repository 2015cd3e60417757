//! Error types for the mint transaction pipeline
//!
//! Covers instruction construction, checkpoint handling, signing,
//! submission and confirmation. Network failures keep their tagged
//! [`NetworkError`] so callers can still match on the cause.

use crate::rpc_manager::NetworkError;
use thiserror::Error;

/// Error type for building and submitting a mint transaction
#[derive(Error, Debug)]
pub enum TransactionBuilderError {
    /// Failed to build an instruction for a specific program
    #[error("Instruction build error (program={program}): {reason}")]
    InstructionBuild {
        /// The program the instruction targets
        program: String,
        /// Detailed reason for the failure
        reason: String,
    },

    /// Failed to fetch a checkpoint before signing
    #[error("Blockhash error: {0}")]
    Blockhash(NetworkError),

    /// Local signing with the mint identity failed
    #[error("Signing failed: {0}")]
    Signing(String),

    /// The wallet holder declined, or the wallet failed to sign
    #[error("{0}")]
    SignatureRejected(String),

    /// The node did not accept the transaction
    #[error("Submission failed: {0}")]
    Submission(NetworkError),

    /// The transaction executed and failed
    #[error("Transaction {signature} failed on-chain: {error}")]
    OnChain {
        signature: String,
        /// Serialized on-chain error
        error: String,
    },

    /// No terminal status could be established for a submitted transaction
    #[error("Transaction {signature} was not confirmed: {reason}")]
    Unconfirmed { signature: String, reason: String },

    /// Plan does not respect the fixed instruction order
    #[error("Invalid instruction order: {0}")]
    InvalidInstructionOrder(String),

    /// RPC failure outside submission (rent lookup, balances)
    #[error("RPC error: {0}")]
    Rpc(#[from] NetworkError),

    /// Internal invariant violation or unexpected state
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransactionBuilderError {
    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::InstructionBuild { .. } => "instruction",
            Self::Blockhash(_) => "blockhash",
            Self::Signing(_) => "signing",
            Self::SignatureRejected(_) => "wallet",
            Self::Submission(_) => "submission",
            Self::OnChain { .. } => "on_chain",
            Self::Unconfirmed { .. } => "unconfirmed",
            Self::InvalidInstructionOrder(_) => "validation",
            Self::Rpc(_) => "rpc",
            Self::Internal(_) => "internal",
        }
    }
}

// Convenience constructors for common error scenarios
impl TransactionBuilderError {
    /// Create an instruction build error for a specific program
    pub fn instruction_failed(program: impl Into<String>, reason: impl ToString) -> Self {
        Self::InstructionBuild {
            program: program.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid instruction order error
    pub fn invalid_order(reason: impl Into<String>) -> Self {
        Self::InvalidInstructionOrder(reason.into())
    }

    /// Create an internal error
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal(reason.into())
    }
}
