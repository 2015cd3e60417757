//! Network client abstraction and its Solana RPC implementation

use super::rpc_errors::NetworkError;
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use solana_transaction_status::TransactionStatus;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Recent blockhash plus the last block height at which it is still valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// Network operations consumed by the mint pipeline
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Lamport balance of an account
    async fn get_balance(&self, address: &Pubkey) -> Result<u64, NetworkError>;

    /// Latest checkpoint at the configured commitment
    async fn get_latest_checkpoint(&self) -> Result<Checkpoint, NetworkError>;

    /// Submit a fully signed transaction
    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, NetworkError>;

    /// Wait for the signature to reach the configured commitment
    ///
    /// Fails with [`NetworkError::Expired`] once the block height passes the
    /// checkpoint's validity height without confirmation.
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        checkpoint: &Checkpoint,
    ) -> Result<(), NetworkError>;

    /// Direct status lookup, including history. `None` if the cluster has never seen it.
    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<TransactionStatus>, NetworkError>;

    /// Minimum balance for an account of `size` bytes to be rent exempt
    async fn get_minimum_balance_for_rent_exemption(&self, size: usize)
        -> Result<u64, NetworkError>;
}

/// [`NetworkClient`] backed by the nonblocking Solana RPC client
pub struct SolanaRpcNetwork {
    client: Arc<RpcClient>,
    commitment: CommitmentConfig,
    poll_interval: Duration,
}

impl std::fmt::Debug for SolanaRpcNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaRpcNetwork")
            .field("url", &self.client.url())
            .field("commitment", &self.commitment)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl SolanaRpcNetwork {
    pub fn new(
        url: String,
        timeout: Duration,
        commitment: CommitmentConfig,
        poll_interval: Duration,
    ) -> Self {
        let client = RpcClient::new_with_timeout_and_commitment(url, timeout, commitment);
        Self {
            client: Arc::new(client),
            commitment,
            poll_interval,
        }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

#[async_trait]
impl NetworkClient for SolanaRpcNetwork {
    async fn get_balance(&self, address: &Pubkey) -> Result<u64, NetworkError> {
        Ok(self
            .client
            .get_balance_with_commitment(address, self.commitment)
            .await?
            .value)
    }

    async fn get_latest_checkpoint(&self) -> Result<Checkpoint, NetworkError> {
        let (blockhash, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await?;
        Ok(Checkpoint {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, NetworkError> {
        Ok(self.client.send_transaction(tx).await?)
    }

    #[instrument(skip(self, checkpoint), fields(last_valid = checkpoint.last_valid_block_height))]
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        checkpoint: &Checkpoint,
    ) -> Result<(), NetworkError> {
        loop {
            let statuses = self.client.get_signature_statuses(&[*signature]).await?;
            if let Some(Some(status)) = statuses.value.into_iter().next() {
                if let Some(err) = &status.err {
                    return Err(NetworkError::OnChain(err.clone()));
                }
                if status.satisfies_commitment(self.commitment) {
                    return Ok(());
                }
            }

            let current_block_height = self
                .client
                .get_block_height_with_commitment(self.commitment)
                .await?;
            if current_block_height > checkpoint.last_valid_block_height {
                return Err(NetworkError::Expired {
                    last_valid_block_height: checkpoint.last_valid_block_height,
                    current_block_height,
                });
            }

            debug!(current_block_height, "Signature not yet confirmed");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<TransactionStatus>, NetworkError> {
        let statuses = self
            .client
            .get_signature_statuses_with_history(&[*signature])
            .await?;
        Ok(statuses.value.into_iter().next().flatten())
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        size: usize,
    ) -> Result<u64, NetworkError> {
        Ok(self
            .client
            .get_minimum_balance_for_rent_exemption(size)
            .await?)
    }
}
