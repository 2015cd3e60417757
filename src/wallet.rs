//! Wallet signer seam and the keypair-file wallet used by the CLI

use anyhow::{Context, Result};
use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use std::io::{BufRead, Write};
use std::sync::Arc;
use thiserror::Error;

/// Failures reported by an external wallet
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// The holder declined to sign
    #[error("User rejected the request: {0}")]
    Rejected(String),

    /// The wallet could not produce a signature
    #[error("Wallet unavailable: {0}")]
    Unavailable(String),
}

/// Externally held signer for the payer
///
/// `sign_transaction` is a single-use capability per mint attempt; the
/// pipeline never calls it more than once for the same transaction.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Add the payer signature to a partially signed transaction
    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError>;
}

/// Wallet backed by a local keypair file, optionally asking for approval
pub struct KeypairWallet {
    keypair: Arc<Keypair>,
    require_approval: bool,
}

impl KeypairWallet {
    /// Create a new wallet from a keypair file (JSON array or raw 64 bytes)
    pub fn from_file(path: &str, require_approval: bool) -> Result<Self> {
        let path = expand_home(path);
        let keypair_bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read keypair file: {}", path))?;

        let keypair = if keypair_bytes.len() == 64 {
            if keypair_bytes.iter().all(|&b| b == 0) {
                anyhow::bail!("Invalid keypair: all-zero key rejected");
            }
            Keypair::try_from(keypair_bytes.as_slice()).context("Invalid keypair bytes")?
        } else {
            let json: Vec<u8> = serde_json::from_slice(&keypair_bytes)
                .context("Failed to parse keypair JSON")?;
            if json.len() != 64 {
                anyhow::bail!("Invalid keypair length: expected 64 bytes, got {}", json.len());
            }
            if json.iter().all(|&b| b == 0) {
                anyhow::bail!("Invalid keypair: all-zero key rejected");
            }
            Keypair::try_from(json.as_slice()).context("Invalid keypair from JSON")?
        };

        Ok(Self::from_keypair(keypair, require_approval))
    }

    pub fn from_keypair(keypair: Keypair, require_approval: bool) -> Self {
        Self {
            keypair: Arc::new(keypair),
            require_approval,
        }
    }

    async fn approve(&self, tx: &Transaction) -> Result<bool, WalletError> {
        let summary = format!(
            "Sign mint transaction as {} ({} instructions)? [y/N] ",
            self.keypair.pubkey(),
            tx.message.instructions.len()
        );

        // stdout carries the JSON response
        tokio::task::spawn_blocking(move || {
            ask_approval(&summary, std::io::stdin().lock(), std::io::stderr())
        })
        .await
        .map_err(|e| WalletError::Unavailable(format!("approval prompt failed: {}", e)))?
        .map_err(|e| WalletError::Unavailable(format!("approval prompt failed: {}", e)))
    }
}

#[async_trait]
impl WalletSigner for KeypairWallet {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(&self, mut tx: Transaction) -> Result<Transaction, WalletError> {
        if self.require_approval && !self.approve(&tx).await? {
            return Err(WalletError::Rejected("signature declined at prompt".to_string()));
        }

        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&[self.keypair.as_ref()], blockhash)
            .map_err(|e| WalletError::Unavailable(e.to_string()))?;
        Ok(tx)
    }
}

fn ask_approval(summary: &str, mut input: impl BufRead, mut prompt: impl Write) -> std::io::Result<bool> {
    prompt.write_all(summary.as_bytes())?;
    prompt.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home, rest),
        _ => path.to_string(),
    }
}
