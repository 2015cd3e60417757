//! Result of a confirmed submission

use crate::rpc_manager::Checkpoint;
use solana_sdk::signature::Signature;

/// A transaction that reached a successful terminal status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutput {
    pub signature: Signature,

    /// Checkpoint the final confirmation ran against; differs from the
    /// signing checkpoint when confirmation was retried
    pub checkpoint: Checkpoint,

    /// Confirmation retries after the initial wait
    pub confirm_retries: u32,
}

impl SubmissionOutput {
    pub fn signature_string(&self) -> String {
        self.signature.to_string()
    }
}
