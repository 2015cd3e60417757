use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::rpc_request::RpcError;
use solana_sdk::transaction::TransactionError;
use thiserror::Error;

/// Tagged network error returned by every [`NetworkClient`](super::NetworkClient) call
///
/// Classification happens once, at the client boundary, so callers decide
/// retries by matching on the variant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    /// The checkpoint's validity window closed before confirmation
    #[error("Block height exceeded: checkpoint valid through {last_valid_block_height}, current height {current_block_height}")]
    Expired {
        last_valid_block_height: u64,
        current_block_height: u64,
    },

    /// The node refused the request (preflight failure, bad params)
    #[error("Request rejected by node (code {code}): {message}")]
    Rejected { code: i64, message: String },

    /// The transaction executed and failed
    #[error("Transaction failed on-chain: {}", render_transaction_error(.0))]
    OnChain(TransactionError),

    /// Network, timeout or serialization failure
    #[error("Transport error: {0}")]
    Transport(String),
}

impl NetworkError {
    /// Classify a client error
    pub fn from_client_error(err: ClientError) -> Self {
        match err.kind() {
            ClientErrorKind::TransactionError(tx_err) => NetworkError::OnChain(tx_err.clone()),
            ClientErrorKind::RpcError(RpcError::RpcResponseError { code, message, .. }) => {
                NetworkError::Rejected {
                    code: *code,
                    message: message.clone(),
                }
            }
            _ => NetworkError::Transport(err.to_string()),
        }
    }

    /// Whether waiting on a fresh checkpoint may still observe the transaction
    pub fn is_expired(&self) -> bool {
        matches!(self, NetworkError::Expired { .. })
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            NetworkError::Expired { .. } => "expired",
            NetworkError::Rejected { .. } => "rejected",
            NetworkError::OnChain(_) => "on_chain",
            NetworkError::Transport(_) => "transport",
        }
    }
}

impl From<ClientError> for NetworkError {
    fn from(err: ClientError) -> Self {
        Self::from_client_error(err)
    }
}

/// Serialize an on-chain error for diagnostics, e.g. `{"InstructionError":[6,{"Custom":1}]}`
pub fn render_transaction_error(err: &TransactionError) -> String {
    serde_json::to_string(err).unwrap_or_else(|_| format!("{:?}", err))
}
