//! Transaction submitter protocol tests
//!
//! Signing order, single wallet call, single submission and the bounded
//! confirmation retry with fresh checkpoints. Backoff runs on a paused
//! clock.

use super::test_helpers::*;
use crate::observability::TraceContext;
use crate::rpc_manager::{FixedRetryPolicy, NetworkError};
use crate::structured_logging::MintLogger;
use crate::test_utils::{expired, MockNetwork, MockStatus, MockWallet, WalletBehavior};
use crate::tx_builder::{TransactionBuilderError, TransactionSubmitter};
use crate::types::FeeOption;
use crate::wallet::WalletSigner;
use solana_sdk::{pubkey::Pubkey, transaction::TransactionError};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

async fn run(
    network: &MockNetwork,
    wallet: &MockWallet,
) -> Result<crate::tx_builder::SubmissionOutput, TransactionBuilderError> {
    let (plan, mint) = plan_for(
        &wallet.pubkey(),
        &Pubkey::new_unique(),
        &foo_metadata(),
        FeeOption::Paid,
    );
    let submitter = TransactionSubmitter::new(Arc::new(network.clone()), FixedRetryPolicy::default());
    let trace = TraceContext::for_attempt(FeeOption::Paid);
    let logger = MintLogger::new(&trace);
    submitter.submit(&plan, mint, wallet, &logger, &trace).await
}

#[tokio::test(start_paused = true)]
async fn test_happy_path_signs_and_submits_once() {
    let network = MockNetwork::new();
    let wallet = MockWallet::approving();

    let output = run(&network, &wallet).await.unwrap();

    assert_eq!(output.signature, network.mock_signature);
    assert_eq!(output.confirm_retries, 0);
    assert_eq!(wallet.sign_count(), 1);
    assert_eq!(network.send_count().await, 1);
    assert_eq!(network.confirm_calls.load(Ordering::SeqCst), 1);
    assert_eq!(network.status_calls.load(Ordering::SeqCst), 1);

    let sent = network.sent.lock().await;
    assert!(sent[0].is_signed());
    assert_eq!(sent[0].message.account_keys[0], wallet.pubkey());
    assert_eq!(sent[0].message.recent_blockhash, output.checkpoint.blockhash);
}

#[tokio::test(start_paused = true)]
async fn test_wallet_rejection_is_terminal() {
    let network = MockNetwork::new();
    let wallet = MockWallet::rejecting();

    let err = run(&network, &wallet).await.unwrap_err();

    match &err {
        TransactionBuilderError::SignatureRejected(msg) => {
            assert!(msg.contains("User rejected the request"));
        }
        other => panic!("Expected SignatureRejected, got {:?}", other),
    }
    assert_eq!(err.category(), "wallet");
    assert_eq!(wallet.sign_count(), 1);
    assert_eq!(network.send_calls.load(Ordering::SeqCst), 0);
    assert_eq!(network.confirm_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unsigned_wallet_response_is_rejected() {
    let network = MockNetwork::new();
    let wallet = MockWallet::new(WalletBehavior::SkipSigning);

    let err = run(&network, &wallet).await.unwrap_err();

    assert!(matches!(err, TransactionBuilderError::SignatureRejected(_)));
    assert_eq!(network.send_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_submission_error_is_not_retried() {
    let network = MockNetwork::new();
    network
        .set_send_error(NetworkError::Rejected {
            code: -32002,
            message: "Transaction simulation failed".to_string(),
        })
        .await;
    let wallet = MockWallet::approving();

    let err = run(&network, &wallet).await.unwrap_err();

    assert!(matches!(
        err,
        TransactionBuilderError::Submission(NetworkError::Rejected { code: -32002, .. })
    ));
    assert_eq!(network.confirm_calls.load(Ordering::SeqCst), 0);
    assert_eq!(wallet.sign_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_e_two_expiries_then_success() {
    let network = MockNetwork::new();
    network
        .script_confirmations([Err(expired(1_000)), Err(expired(1_150))])
        .await;
    let wallet = MockWallet::approving();

    let start = tokio::time::Instant::now();
    let output = run(&network, &wallet).await.unwrap();

    assert_eq!(output.confirm_retries, 2);
    assert_eq!(start.elapsed(), Duration::from_secs(2));
    assert_eq!(network.send_count().await, 1);
    assert_eq!(wallet.sign_count(), 1);
    assert_eq!(network.confirm_calls.load(Ordering::SeqCst), 3);
    // Signing checkpoint plus one fresh checkpoint per retry
    assert_eq!(network.checkpoint_calls.load(Ordering::SeqCst), 3);

    let checkpoints = network.confirmed_against.lock().await;
    assert_eq!(checkpoints[0].last_valid_block_height, 1_000);
    assert_eq!(checkpoints[1].last_valid_block_height, 1_150);
    assert_eq!(checkpoints[2].last_valid_block_height, 1_300);
    assert_eq!(output.checkpoint, checkpoints[2]);
}

#[tokio::test(start_paused = true)]
async fn test_retry_bound_then_status_lookup_succeeds() {
    let network = MockNetwork::new();
    network
        .script_confirmations((0..10).map(|i| Err(expired(1_000 + i))))
        .await;
    let wallet = MockWallet::approving();

    let output = run(&network, &wallet).await.unwrap();

    // Initial wait plus at most five retries
    assert_eq!(network.confirm_calls.load(Ordering::SeqCst), 6);
    assert_eq!(output.confirm_retries, 5);
    assert_eq!(network.status_calls.load(Ordering::SeqCst), 1);
    assert_eq!(network.send_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_bound_then_unknown_status_fails() {
    let network = MockNetwork::new();
    network
        .script_confirmations((0..10).map(|i| Err(expired(1_000 + i))))
        .await;
    network.set_status(MockStatus::NotFound).await;
    let wallet = MockWallet::approving();

    let err = run(&network, &wallet).await.unwrap_err();

    match err {
        TransactionBuilderError::Unconfirmed { signature, reason } => {
            assert_eq!(signature, network.mock_signature.to_string());
            assert!(reason.contains("Block height exceeded"));
        }
        other => panic!("Expected Unconfirmed, got {:?}", other),
    }
    assert_eq!(network.confirm_calls.load(Ordering::SeqCst), 6);
}

#[tokio::test(start_paused = true)]
async fn test_on_chain_error_from_status_lookup() {
    let network = MockNetwork::new();
    network
        .set_status(MockStatus::Found(Some(TransactionError::InsufficientFundsForFee)))
        .await;
    let wallet = MockWallet::approving();

    let err = run(&network, &wallet).await.unwrap_err();

    match err {
        TransactionBuilderError::OnChain { error, .. } => {
            assert!(error.contains("InsufficientFundsForFee"));
        }
        other => panic!("Expected OnChain, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_on_chain_error_from_confirmation_skips_retry() {
    let network = MockNetwork::new();
    network
        .script_confirmations([Err(NetworkError::OnChain(TransactionError::AccountInUse))])
        .await;
    let wallet = MockWallet::approving();

    let err = run(&network, &wallet).await.unwrap_err();

    assert!(matches!(err, TransactionBuilderError::OnChain { .. }));
    assert_eq!(network.confirm_calls.load(Ordering::SeqCst), 1);
    assert_eq!(network.status_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_checkpoint_refresh_failure_keeps_previous() {
    let network = MockNetwork::new();
    network.fail_checkpoints_after(1).await;
    network.script_confirmations([Err(expired(1_000))]).await;
    let wallet = MockWallet::approving();

    let output = run(&network, &wallet).await.unwrap();

    assert_eq!(output.confirm_retries, 1);
    let checkpoints = network.confirmed_against.lock().await;
    assert_eq!(checkpoints.len(), 2);
    assert_eq!(checkpoints[0], checkpoints[1]);
}

#[tokio::test(start_paused = true)]
async fn test_missing_status_after_confirmation_is_success() {
    let network = MockNetwork::new();
    network.set_status(MockStatus::NotFound).await;
    let wallet = MockWallet::approving();

    assert!(run(&network, &wallet).await.is_ok());

    network
        .set_status(MockStatus::Error(NetworkError::Transport("reset".into())))
        .await;
    assert!(run(&network, &wallet).await.is_ok());
}
