//! Test Utilities Module
//!
//! Scripted stand-ins for the network client, the wallet and the token
//! store, used to drive the mint pipeline deterministically.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use crate::rpc_manager::{Checkpoint, NetworkClient, NetworkError};
use crate::token_store::{StoreError, TokenStore};
use crate::types::CreatedToken;
use crate::wallet::{WalletError, WalletSigner};
use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::{Transaction, TransactionError},
};
use solana_transaction_status::{TransactionConfirmationStatus, TransactionStatus};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Lamports per byte used by [`MockNetwork`] for rent quotes
pub const MOCK_RENT_PER_BYTE: u64 = 6_960;

/// What the direct status lookup of [`MockNetwork`] reports
#[derive(Debug, Clone)]
pub enum MockStatus {
    /// Transaction found, optionally with an execution error
    Found(Option<TransactionError>),
    NotFound,
    Error(NetworkError),
}

/// Mock network client for testing
///
/// Every call is counted. Balance and confirmation results are consumed
/// from scripts; once a script is empty the default applies (the last
/// scripted balance, or a successful confirmation).
#[derive(Clone)]
pub struct MockNetwork {
    balances: Arc<Mutex<VecDeque<Result<u64, NetworkError>>>>,
    last_balance: Arc<Mutex<u64>>,
    confirm_script: Arc<Mutex<VecDeque<Result<(), NetworkError>>>>,
    send_result: Arc<Mutex<Option<NetworkError>>>,
    status: Arc<Mutex<MockStatus>>,
    fail_checkpoint_after: Arc<Mutex<Option<usize>>>,

    /// Checkpoints handed to `confirm_transaction`, in call order
    pub confirmed_against: Arc<Mutex<Vec<Checkpoint>>>,
    /// Transactions handed to `send_transaction`
    pub sent: Arc<Mutex<Vec<Transaction>>>,
    /// Sizes quoted by `get_minimum_balance_for_rent_exemption`
    pub rent_queries: Arc<Mutex<Vec<usize>>>,

    pub balance_calls: Arc<AtomicUsize>,
    pub checkpoint_calls: Arc<AtomicUsize>,
    pub confirm_calls: Arc<AtomicUsize>,
    pub status_calls: Arc<AtomicUsize>,
    pub send_calls: Arc<AtomicUsize>,
    pub rent_calls: Arc<AtomicUsize>,

    /// Deterministic signature returned on submission
    pub mock_signature: Signature,
}

impl MockNetwork {
    /// Create a network that confirms everything with a 10 SOL payer
    pub fn new() -> Self {
        Self {
            balances: Arc::new(Mutex::new(VecDeque::new())),
            last_balance: Arc::new(Mutex::new(10_000_000_000)),
            confirm_script: Arc::new(Mutex::new(VecDeque::new())),
            send_result: Arc::new(Mutex::new(None)),
            status: Arc::new(Mutex::new(MockStatus::Found(None))),
            fail_checkpoint_after: Arc::new(Mutex::new(None)),
            confirmed_against: Arc::new(Mutex::new(Vec::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            rent_queries: Arc::new(Mutex::new(Vec::new())),
            balance_calls: Arc::new(AtomicUsize::new(0)),
            checkpoint_calls: Arc::new(AtomicUsize::new(0)),
            confirm_calls: Arc::new(AtomicUsize::new(0)),
            status_calls: Arc::new(AtomicUsize::new(0)),
            send_calls: Arc::new(AtomicUsize::new(0)),
            rent_calls: Arc::new(AtomicUsize::new(0)),
            mock_signature: Signature::from([7u8; 64]),
        }
    }

    /// Queue balance results, consumed one per `get_balance` call
    pub async fn script_balances(&self, balances: impl IntoIterator<Item = Result<u64, NetworkError>>) {
        self.balances.lock().await.extend(balances);
    }

    /// Queue confirmation results, consumed one per `confirm_transaction` call
    pub async fn script_confirmations(
        &self,
        results: impl IntoIterator<Item = Result<(), NetworkError>>,
    ) {
        self.confirm_script.lock().await.extend(results);
    }

    pub async fn set_send_error(&self, error: NetworkError) {
        *self.send_result.lock().await = Some(error);
    }

    pub async fn set_status(&self, status: MockStatus) {
        *self.status.lock().await = status;
    }

    /// Fail every checkpoint fetch after the first `n`
    pub async fn fail_checkpoints_after(&self, n: usize) {
        *self.fail_checkpoint_after.lock().await = Some(n);
    }

    /// Calls made to any [`NetworkClient`] method, failed ones included
    pub fn network_calls(&self) -> usize {
        [
            &self.balance_calls,
            &self.checkpoint_calls,
            &self.send_calls,
            &self.confirm_calls,
            &self.status_calls,
            &self.rent_calls,
        ]
        .iter()
        .map(|counter| counter.load(Ordering::SeqCst))
        .sum()
    }

    /// Transactions accepted by `send_transaction`
    pub async fn send_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self::new()
    }
}

/// Expiry error as reported by the confirmation wait
pub fn expired(last_valid_block_height: u64) -> NetworkError {
    NetworkError::Expired {
        last_valid_block_height,
        current_block_height: last_valid_block_height + 1,
    }
}

#[async_trait]
impl NetworkClient for MockNetwork {
    async fn get_balance(&self, _address: &Pubkey) -> Result<u64, NetworkError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        match self.balances.lock().await.pop_front() {
            Some(Ok(balance)) => {
                *self.last_balance.lock().await = balance;
                Ok(balance)
            }
            Some(Err(e)) => Err(e),
            None => Ok(*self.last_balance.lock().await),
        }
    }

    async fn get_latest_checkpoint(&self) -> Result<Checkpoint, NetworkError> {
        let n = self.checkpoint_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = *self.fail_checkpoint_after.lock().await {
            if n >= limit {
                return Err(NetworkError::Transport("checkpoint unavailable".to_string()));
            }
        }
        Ok(Checkpoint {
            blockhash: Hash::new_unique(),
            last_valid_block_height: 1_000 + 150 * n as u64,
        })
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, NetworkError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.send_result.lock().await.clone() {
            return Err(err);
        }
        self.sent.lock().await.push(tx.clone());
        Ok(self.mock_signature)
    }

    async fn confirm_transaction(
        &self,
        _signature: &Signature,
        checkpoint: &Checkpoint,
    ) -> Result<(), NetworkError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        self.confirmed_against.lock().await.push(*checkpoint);
        self.confirm_script.lock().await.pop_front().unwrap_or(Ok(()))
    }

    async fn get_signature_status(
        &self,
        _signature: &Signature,
    ) -> Result<Option<TransactionStatus>, NetworkError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match self.status.lock().await.clone() {
            MockStatus::Found(err) => Ok(Some(TransactionStatus {
                slot: 42,
                confirmations: None,
                status: err.clone().map_or(Ok(()), Err),
                err,
                confirmation_status: Some(TransactionConfirmationStatus::Finalized),
            })),
            MockStatus::NotFound => Ok(None),
            MockStatus::Error(e) => Err(e),
        }
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        size: usize,
    ) -> Result<u64, NetworkError> {
        self.rent_calls.fetch_add(1, Ordering::SeqCst);
        self.rent_queries.lock().await.push(size);
        Ok(890_880 + MOCK_RENT_PER_BYTE * size as u64)
    }
}

/// How [`MockWallet`] answers signature requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletBehavior {
    Approve,
    Reject,
    /// Returns the transaction without adding a signature
    SkipSigning,
}

/// Mock wallet holding a real keypair
#[derive(Clone)]
pub struct MockWallet {
    keypair: Arc<Keypair>,
    behavior: WalletBehavior,
    pub sign_requests: Arc<AtomicUsize>,
}

impl MockWallet {
    pub fn new(behavior: WalletBehavior) -> Self {
        Self {
            keypair: Arc::new(Keypair::new()),
            behavior,
            sign_requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn approving() -> Self {
        Self::new(WalletBehavior::Approve)
    }

    pub fn rejecting() -> Self {
        Self::new(WalletBehavior::Reject)
    }

    pub fn sign_count(&self) -> usize {
        self.sign_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletSigner for MockWallet {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(&self, mut tx: Transaction) -> Result<Transaction, WalletError> {
        self.sign_requests.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            WalletBehavior::Approve => {
                let blockhash = tx.message.recent_blockhash;
                tx.try_partial_sign(&[self.keypair.as_ref()], blockhash)
                    .map_err(|e| WalletError::Unavailable(e.to_string()))?;
                Ok(tx)
            }
            WalletBehavior::Reject => Err(WalletError::Rejected(
                "signature request declined".to_string(),
            )),
            WalletBehavior::SkipSigning => Ok(tx),
        }
    }
}

/// Token store whose every operation fails, counting save attempts
#[derive(Debug, Default)]
pub struct FailingStore {
    pub save_attempts: AtomicUsize,
}

#[async_trait]
impl TokenStore for FailingStore {
    async fn list_tokens(&self) -> Result<Vec<CreatedToken>, StoreError> {
        Err(StoreError::Backend("store offline".to_string()))
    }

    async fn save_token(&self, _token: &CreatedToken) -> Result<(), StoreError> {
        self.save_attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Backend("store offline".to_string()))
    }

    async fn list_tokens_by_creator(&self, _creator: &str) -> Result<Vec<CreatedToken>, StoreError> {
        Err(StoreError::Backend("store offline".to_string()))
    }

    async fn get_token(&self, _id: &str) -> Result<Option<CreatedToken>, StoreError> {
        Err(StoreError::Backend("store offline".to_string()))
    }

    async fn delete_token(&self, _id: &str) -> Result<bool, StoreError> {
        Err(StoreError::Backend("store offline".to_string()))
    }
}
