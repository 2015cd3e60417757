//! Integration tests for the mint pipeline through the public API
//!
//! Requires the `test_utils` feature for the scripted network and wallet.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use token_minter::config::Config;
use token_minter::test_utils::{expired, MockNetwork, MockWallet};
use token_minter::token_store::{SledTokenStore, TokenStore};
use token_minter::types::{FeeOption, TokenMetadata};
use token_minter::wallet::WalletSigner;
use token_minter::MintEngine;

const SERVICE: &str = "CRXVZZ4vG1MT2RpFBcKgqLe13tm893vCEDbMRrLxqiKN";

fn metadata(symbol: &str, revoke: bool) -> TokenMetadata {
    TokenMetadata {
        name: format!("{} Token", symbol),
        symbol: symbol.to_string(),
        description: None,
        decimals: 6,
        total_supply: 21_000_000,
        image_url: None,
        revoke_mint: revoke,
        revoke_freeze: revoke,
    }
}

fn engine_from_toml(network: &MockNetwork, store: Arc<dyn TokenStore>) -> MintEngine {
    let config = Config::from_toml_str(&format!(
        r#"
        network = "devnet"

        [fees]
        service_account = "{}"
        service_fee_lamports = 30000000

        [confirmation]
        max_retries = 5
        backoff_ms = 1000
        "#,
        SERVICE
    ))
    .expect("config parses");
    let mint_config = config.validate().expect("config validates");
    MintEngine::new(Arc::new(mint_config), Arc::new(network.clone()), store)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_mints_are_persisted_and_listed_by_creator() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn TokenStore> =
        Arc::new(SledTokenStore::open(dir.path().join("tokens.db")).unwrap());
    let network = MockNetwork::new();
    let engine = engine_from_toml(&network, Arc::clone(&store));
    let alice = MockWallet::approving();
    let bob = MockWallet::approving();

    let first = engine
        .create_token(Some(&alice), metadata("ALC", false), FeeOption::Paid)
        .await;
    let second = engine
        .create_token(Some(&bob), metadata("BOB", true), FeeOption::Donation)
        .await;
    let third = engine
        .create_token(Some(&alice), metadata("ALC2", true), FeeOption::Donation)
        .await;
    assert!(first.success && second.success && third.success);

    let all = store.list_tokens().await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));

    let by_alice = store
        .list_tokens_by_creator(&alice.pubkey().to_string())
        .await
        .unwrap();
    assert_eq!(by_alice.len(), 2);
    assert!(by_alice
        .iter()
        .all(|t| t.creator == alice.pubkey().to_string()));

    let bob_mint = second.token.unwrap().mint_address;
    let stored = store.get_token(&bob_mint).await.unwrap().unwrap();
    assert!(stored.metadata.revoke_mint);
    assert_eq!(stored.metadata.symbol, "BOB");

    // One submission and one signature per mint
    assert_eq!(network.send_count().await, 3);
    assert_eq!(alice.sign_count(), 2);
    assert_eq!(bob.sign_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_response_json_shape() {
    let network = MockNetwork::new();
    network.script_confirmations([Err(expired(1_000))]).await;
    let store: Arc<dyn TokenStore> = Arc::new(token_minter::token_store::MemoryTokenStore::new());
    let engine = engine_from_toml(&network, store);
    let wallet = MockWallet::approving();

    let response = engine
        .create_token(Some(&wallet), metadata("JSON", false), FeeOption::Donation)
        .await;
    assert!(response.success);
    assert_eq!(network.confirm_calls.load(Ordering::SeqCst), 2);

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["success"], true);
    assert!(json["token"]["mintAddress"].is_string());
    assert_eq!(json["transactionDetails"]["feeOption"], "donation");
    assert_eq!(json["transactionDetails"]["tokenSymbol"], "JSON");
    assert_eq!(json["transactionDetails"]["toAddress"], SERVICE);
    assert!(json.get("error").is_none());
    assert!(json.get("persistenceError").is_none());
}

#[tokio::test]
async fn test_failure_response_shape() {
    let network = MockNetwork::new();
    let store: Arc<dyn TokenStore> = Arc::new(token_minter::token_store::MemoryTokenStore::new());
    let engine = engine_from_toml(&network, store);

    let response = engine
        .create_token(Some(&MockWallet::approving()), metadata("", false), FeeOption::Paid)
        .await;

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Validation failed: token symbol is required");
    assert!(json.get("token").is_none());
    assert_eq!(network.network_calls(), 0);
}
