//! Mint orchestration
//!
//! Runs one mint attempt end to end: validation, fee split, planning,
//! submission, reconciliation and persistence. Every failure is converted
//! into a structured [`TokenCreationResponse`] at this boundary.

use crate::config::MintConfig;
use crate::metrics::{metrics, Timer};
use crate::observability::TraceContext;
use crate::rpc_manager::NetworkClient;
use crate::structured_logging::MintLogger;
use crate::token_store::TokenStore;
use crate::tx_builder::{
    plan_mint_instructions, reconcile, FeePolicy, MintAccountLayout, MintIdentity,
    MintPlanRequest, ReconcileInput, TransactionBuilderError, TransactionSubmitter,
};
use crate::types::{CreatedToken, FeeOption, TokenCreationResponse, TokenMetadata, TransactionReceipt};
use crate::validation::{validate_metadata, ValidationError};
use crate::wallet::WalletSigner;
use std::sync::Arc;
use thiserror::Error;

/// Terminal failure of a mint attempt, rendered into the response `error`
#[derive(Error, Debug)]
pub enum MintError {
    #[error("Please connect your wallet first")]
    WalletNotConnected,

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transaction failed: {0}")]
    Transaction(TransactionBuilderError),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl From<TransactionBuilderError> for MintError {
    fn from(err: TransactionBuilderError) -> Self {
        match err {
            TransactionBuilderError::Internal(reason) => MintError::Unexpected(anyhow::anyhow!(reason)),
            other => MintError::Transaction(other),
        }
    }
}

impl MintError {
    pub fn category(&self) -> &'static str {
        match self {
            MintError::WalletNotConnected => "wallet_not_connected",
            MintError::Validation(_) => "validation",
            MintError::Transaction(err) => err.category(),
            MintError::Unexpected(_) => "unexpected",
        }
    }
}

/// Outcome of a confirmed mint before it is rendered
#[derive(Debug)]
struct MintSuccess {
    token: CreatedToken,
    receipt: Option<TransactionReceipt>,
    persistence_error: Option<String>,
    confirm_retries: u32,
}

/// Token creation service
pub struct MintEngine {
    config: Arc<MintConfig>,
    network: Arc<dyn NetworkClient>,
    store: Arc<dyn TokenStore>,
    fee_policy: FeePolicy,
    submitter: TransactionSubmitter,
}

impl std::fmt::Debug for MintEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MintEngine")
            .field("config", &self.config)
            .field("fee_policy", &self.fee_policy)
            .finish_non_exhaustive()
    }
}

impl MintEngine {
    pub fn new(
        config: Arc<MintConfig>,
        network: Arc<dyn NetworkClient>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        let fee_policy = FeePolicy::new(config.service_fee_lamports);
        let submitter = TransactionSubmitter::new(Arc::clone(&network), config.confirm_retry);
        Self {
            config,
            network,
            store,
            fee_policy,
            submitter,
        }
    }

    /// Create a token and report the outcome
    ///
    /// `wallet` is `None` when no wallet is connected.
    pub async fn create_token(
        &self,
        wallet: Option<&dyn WalletSigner>,
        metadata: TokenMetadata,
        fee_option: FeeOption,
    ) -> TokenCreationResponse {
        let m = metrics();
        m.mint_attempts.inc();
        let timer = Timer::new();
        let trace = TraceContext::for_attempt(fee_option);
        let logger = MintLogger::new(&trace);

        match self
            .try_create_token(wallet, metadata, fee_option, &trace, &logger)
            .await
        {
            Ok(success) => {
                m.mint_success.inc();
                timer.observe_duration(&m.mint_latency);
                logger.log_mint_success(
                    &success.token.mint_address,
                    &success.token.tx_signature,
                    success.confirm_retries,
                    timer.elapsed_ms(),
                );
                TokenCreationResponse {
                    success: true,
                    signature: Some(success.token.tx_signature.clone()),
                    token: Some(success.token),
                    transaction_details: success.receipt,
                    error: None,
                    persistence_error: success.persistence_error,
                }
            }
            Err(err) => {
                m.mint_failed.with_label_values(&[err.category()]).inc();
                if matches!(err, MintError::Validation(_)) {
                    m.validation_failures.inc();
                }
                logger.log_mint_failure(err.category(), &err.to_string(), timer.elapsed_ms());
                TokenCreationResponse::failure(err.to_string())
            }
        }
    }

    async fn try_create_token(
        &self,
        wallet: Option<&dyn WalletSigner>,
        metadata: TokenMetadata,
        fee_option: FeeOption,
        trace: &TraceContext,
        logger: &MintLogger,
    ) -> Result<MintSuccess, MintError> {
        let wallet = wallet.ok_or(MintError::WalletNotConnected)?;
        let metadata = validate_metadata(metadata)?;
        let payer = wallet.pubkey();
        logger.log_mint_attempt(&payer.to_string(), &metadata.symbol);

        let raw_supply = metadata.raw_supply().ok_or_else(|| {
            TransactionBuilderError::internal("validated supply does not fit raw units")
        })?;
        let split = self.fee_policy.decide_fee_split(fee_option, raw_supply);

        let balance_before = self
            .network
            .get_balance(&payer)
            .await
            .map_err(TransactionBuilderError::Rpc)?;

        let mint = MintIdentity::generate();
        let mint_address = mint.pubkey();
        let layout = MintAccountLayout::for_metadata(&metadata, &mint_address)?;
        let mint_rent_lamports = self
            .network
            .get_minimum_balance_for_rent_exemption(layout.funded_space())
            .await
            .map_err(TransactionBuilderError::Rpc)?;

        let plan = plan_mint_instructions(MintPlanRequest {
            payer: &payer,
            mint: &mint_address,
            service_account: &self.config.service_account,
            metadata: &metadata,
            fee_option,
            split,
            layout,
            mint_rent_lamports,
        })?;
        logger.log_plan_built(
            &mint_address.to_string(),
            plan.instructions.len(),
            layout.funded_space(),
            mint_rent_lamports,
        );

        let output = self
            .submitter
            .submit(&plan, mint, wallet, logger, trace)
            .await?;
        let signature = output.signature_string();

        let receipt = match self.network.get_balance(&payer).await {
            Ok(balance_after) => {
                let receipt = reconcile(ReconcileInput {
                    payer: &payer,
                    service_account: &self.config.service_account,
                    balance_before,
                    balance_after,
                    fee_option,
                    split,
                    signature: &signature,
                    symbol: &metadata.symbol,
                    decimals: metadata.decimals,
                });
                if receipt.anomaly.is_some() {
                    metrics().balance_anomalies.inc();
                }
                Some(receipt)
            }
            Err(e) => {
                logger.warn(&format!("Could not read balance after mint, omitting receipt: {}", e));
                None
            }
        };

        let token = CreatedToken {
            id: mint_address.to_string(),
            mint_address: mint_address.to_string(),
            metadata,
            creator: payer.to_string(),
            network: self.config.network,
            created_at: chrono::Utc::now().timestamp_millis(),
            tx_signature: signature,
        };

        let persistence_error = match self.store.save_token(&token).await {
            Ok(()) => None,
            Err(e) => {
                metrics()
                    .persist_failures
                    .with_label_values(&[e.category()])
                    .inc();
                logger.log_persist_failure(&token.mint_address, e.category(), &e.to_string());
                Some(format!("Token was created but could not be saved: {}", e))
            }
        };

        Ok(MintSuccess {
            token,
            receipt,
            persistence_error,
            confirm_retries: output.confirm_retries,
        })
    }
}
