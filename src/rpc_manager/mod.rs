//! RPC Manager Module
//!
//! Network access for the mint pipeline: the [`NetworkClient`] seam, its
//! Solana RPC implementation, tagged network errors and the bounded
//! fixed-delay retry used for confirmation.

pub mod rpc_client;
pub mod rpc_errors;
pub mod rpc_retry;

// Re-exports for convenience
pub use rpc_client::{Checkpoint, NetworkClient, SolanaRpcNetwork};
pub use rpc_errors::{render_transaction_error, NetworkError};
pub use rpc_retry::{retry_fixed, FixedRetryPolicy, RetryOutcome};
