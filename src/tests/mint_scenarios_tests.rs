//! End-to-end mint scenarios through the engine
//!
//! Each scenario runs against the scripted network and wallet and checks
//! the structured response, the receipt and what reached the store.

use super::test_helpers::*;
use crate::metrics::metrics;
use crate::rpc_manager::NetworkError;
use crate::test_utils::{expired, FailingStore, MockNetwork, MockWallet, MOCK_RENT_PER_BYTE};
use crate::token_store::{MemoryTokenStore, TokenStore};
use crate::types::{BalanceAnomaly, FeeOption, Network};
use crate::wallet::WalletSigner;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[tokio::test(start_paused = true)]
async fn test_scenario_a_paid_mint() {
    let network = MockNetwork::new();
    network
        .script_balances([Ok(1_000_000_000), Ok(960_000_000)])
        .await;
    let store = Arc::new(MemoryTokenStore::new());
    let (engine, service) = engine(&network, store.clone());
    let wallet = MockWallet::approving();

    let response = engine
        .create_token(Some(&wallet), foo_metadata(), FeeOption::Paid)
        .await;

    assert!(response.success, "{:?}", response.error);
    assert_eq!(response.error, None);
    assert_eq!(response.persistence_error, None);

    let token = response.token.unwrap();
    assert_eq!(token.id, token.mint_address);
    assert_eq!(token.creator, wallet.pubkey().to_string());
    assert_eq!(token.network, Network::Devnet);
    assert_eq!(Some(token.tx_signature.clone()), response.signature);

    let receipt = response.transaction_details.unwrap();
    assert_eq!(receipt.service_fee, SERVICE_FEE);
    assert_eq!(receipt.total_cost, 40_000_000);
    assert_eq!(receipt.network_fee, 10_000_000);
    assert_eq!(receipt.to_address, service.to_string());
    assert_eq!(receipt.donation_amount, None);
    assert_eq!(receipt.anomaly, None);

    let sent = network.sent.lock().await;
    assert_eq!(sent[0].message.instructions.len(), 7);

    let stored = store.list_tokens().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], token);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_b_donation_mint() {
    let network = MockNetwork::new();
    network
        .script_balances([Ok(1_000_000_000), Ok(995_000_000)])
        .await;
    let store = Arc::new(MemoryTokenStore::new());
    let (engine, _) = engine(&network, store.clone());
    let wallet = MockWallet::approving();

    let response = engine
        .create_token(Some(&wallet), foo_metadata(), FeeOption::Donation)
        .await;

    assert!(response.success, "{:?}", response.error);
    let receipt = response.transaction_details.unwrap();
    assert_eq!(receipt.fee_option, FeeOption::Donation);
    assert_eq!(receipt.service_fee, 0);
    assert_eq!(receipt.network_fee, 5_000_000);
    assert_eq!(receipt.donation_amount, Some(50_000.0));
    assert_eq!(receipt.token_symbol.as_deref(), Some("FOO"));

    let sent = network.sent.lock().await;
    assert_eq!(sent[0].message.instructions.len(), 8);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_c_validation_makes_no_network_call() {
    let network = MockNetwork::new();
    let store = Arc::new(MemoryTokenStore::new());
    let (engine, _) = engine(&network, store.clone());
    let wallet = MockWallet::approving();
    let mut metadata = foo_metadata();
    metadata.symbol = "TOOLONGSYM1".to_string();

    let response = engine
        .create_token(Some(&wallet), metadata, FeeOption::Paid)
        .await;

    assert!(!response.success);
    let error = response.error.unwrap();
    assert!(error.starts_with("Validation failed:"), "{}", error);
    assert!(error.contains("10 characters or less"));
    assert_eq!(network.network_calls(), 0);
    assert_eq!(network.send_count().await, 0);
    assert_eq!(wallet.sign_count(), 0);
    assert!(store.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_d_wallet_rejection() {
    let network = MockNetwork::new();
    let store = Arc::new(MemoryTokenStore::new());
    let (engine, _) = engine(&network, store.clone());
    let wallet = MockWallet::rejecting();
    let wallet_failures = metrics().mint_failed.with_label_values(&["wallet"]);
    let before = wallet_failures.get();

    let response = engine
        .create_token(Some(&wallet), foo_metadata(), FeeOption::Paid)
        .await;

    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("Transaction failed: User rejected the request: signature request declined")
    );
    assert!(response.signature.is_none());
    assert_eq!(wallet.sign_count(), 1);
    assert_eq!(network.send_calls.load(Ordering::SeqCst), 0);
    assert!(store.is_empty().await);
    assert!(wallet_failures.get() > before);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_e_confirmation_retries() {
    let network = MockNetwork::new();
    network
        .script_confirmations([Err(expired(1_000)), Err(expired(1_150))])
        .await;
    let store = Arc::new(MemoryTokenStore::new());
    let (engine, _) = engine(&network, store.clone());
    let wallet = MockWallet::approving();

    let response = engine
        .create_token(Some(&wallet), foo_metadata(), FeeOption::Paid)
        .await;

    assert!(response.success, "{:?}", response.error);
    assert_eq!(network.confirm_calls.load(Ordering::SeqCst), 3);
    assert_eq!(network.checkpoint_calls.load(Ordering::SeqCst), 3);
    assert_eq!(network.send_count().await, 1);
    assert_eq!(wallet.sign_count(), 1);
    assert_eq!(store.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_donation_with_zero_service_share_keeps_service_instructions() {
    let network = MockNetwork::new();
    let store = Arc::new(MemoryTokenStore::new());
    let (engine, _) = engine(&network, store.clone());
    let wallet = MockWallet::approving();
    let mut metadata = foo_metadata();
    metadata.decimals = 0;
    metadata.total_supply = 19;

    let response = engine
        .create_token(Some(&wallet), metadata, FeeOption::Donation)
        .await;

    assert!(response.success, "{:?}", response.error);
    let receipt = response.transaction_details.unwrap();
    assert_eq!(receipt.fee_option, FeeOption::Donation);
    assert_eq!(receipt.donation_amount, Some(0.0));

    // No fee transfer, service account and zero mint-to still present
    let sent = network.sent.lock().await;
    assert_eq!(sent[0].message.instructions.len(), 8);
}

#[tokio::test]
async fn test_wallet_not_connected() {
    let network = MockNetwork::new();
    let (engine, _) = engine(&network, Arc::new(MemoryTokenStore::new()));

    let response = engine
        .create_token(None, foo_metadata(), FeeOption::Paid)
        .await;

    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("Please connect your wallet first")
    );
    assert_eq!(network.network_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_persistence_failure_is_not_fatal() {
    let network = MockNetwork::new();
    let store = Arc::new(FailingStore::default());
    let (engine, _) = engine(&network, store.clone());
    let wallet = MockWallet::approving();
    let backend_failures = metrics().persist_failures.with_label_values(&["backend"]);
    let before = backend_failures.get();

    let response = engine
        .create_token(Some(&wallet), foo_metadata(), FeeOption::Paid)
        .await;

    assert!(response.success);
    assert!(response.token.is_some());
    assert!(response
        .persistence_error
        .as_deref()
        .unwrap()
        .contains("store offline"));
    assert_eq!(store.save_attempts.load(Ordering::SeqCst), 1);
    assert!(backend_failures.get() > before);
}

#[tokio::test(start_paused = true)]
async fn test_post_mint_balance_failure_omits_receipt() {
    let network = MockNetwork::new();
    network
        .script_balances([
            Ok(1_000_000_000),
            Err(NetworkError::Transport("connection reset".to_string())),
        ])
        .await;
    let store = Arc::new(MemoryTokenStore::new());
    let (engine, _) = engine(&network, store.clone());
    let wallet = MockWallet::approving();

    let response = engine
        .create_token(Some(&wallet), foo_metadata(), FeeOption::Paid)
        .await;

    assert!(response.success);
    assert!(response.transaction_details.is_none());
    assert_eq!(store.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_balance_race_is_flagged_not_negative() {
    let network = MockNetwork::new();
    network
        .script_balances([Ok(1_000_000_000), Ok(1_500_000_000)])
        .await;
    let (engine, _) = engine(&network, Arc::new(MemoryTokenStore::new()));
    let wallet = MockWallet::approving();

    let response = engine
        .create_token(Some(&wallet), foo_metadata(), FeeOption::Paid)
        .await;

    let receipt = response.transaction_details.unwrap();
    assert_eq!(receipt.total_cost, -500_000_000);
    assert_eq!(receipt.network_fee, 0);
    assert_eq!(receipt.anomaly, Some(BalanceAnomaly::BalanceIncreased));
}

#[tokio::test(start_paused = true)]
async fn test_rent_quoted_for_final_account_size() {
    let network = MockNetwork::new();
    let (engine, _) = engine(&network, Arc::new(MemoryTokenStore::new()));
    let wallet = MockWallet::approving();

    let response = engine
        .create_token(Some(&wallet), foo_metadata(), FeeOption::Paid)
        .await;
    assert!(response.success);

    let mint = response.token.unwrap().mint_address;
    let layout = crate::tx_builder::MintAccountLayout::for_metadata(
        &foo_metadata(),
        &mint.parse().unwrap(),
    )
    .unwrap();
    let queries = network.rent_queries.lock().await;
    assert_eq!(queries.as_slice(), &[layout.funded_space()]);

    // CreateAccount lamports cover the final size, space covers the mint only
    let sent = network.sent.lock().await;
    let create = &sent[0].message.instructions[1];
    let lamports = u64::from_le_bytes(create.data[4..12].try_into().unwrap());
    let space = u64::from_le_bytes(create.data[12..20].try_into().unwrap());
    assert_eq!(lamports, 890_880 + MOCK_RENT_PER_BYTE * layout.funded_space() as u64);
    assert_eq!(space as usize, layout.mint_space);
}

#[tokio::test(start_paused = true)]
async fn test_input_is_normalized_before_persisting() {
    let network = MockNetwork::new();
    let store = Arc::new(MemoryTokenStore::new());
    let (engine, _) = engine(&network, store.clone());
    let wallet = MockWallet::approving();
    let mut metadata = foo_metadata();
    metadata.name = "  Foo  ".to_string();
    metadata.symbol = "foo".to_string();
    metadata.description = Some("   ".to_string());

    let response = engine
        .create_token(Some(&wallet), metadata, FeeOption::Paid)
        .await;

    let token = response.token.unwrap();
    assert_eq!(token.metadata.name, "Foo");
    assert_eq!(token.metadata.symbol, "FOO");
    assert_eq!(token.metadata.description, None);
}
