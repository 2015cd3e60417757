//! Configuration module for the token minter
//!
//! Configuration is loaded from a TOML file, overridden by environment
//! variables (a `.env` file is honoured), and then validated once into an
//! immutable [`MintConfig`] that is threaded through the mint pipeline.

use crate::rpc_manager::FixedRetryPolicy;
use crate::types::Network;
use serde::{Deserialize, Serialize};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Lamports per SOL, used for the default service fee
const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Configuration errors detected at startup
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Cluster tag recorded on created tokens
    #[serde(default)]
    pub network: Network,

    /// RPC endpoint configuration
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Wallet configuration
    #[serde(default)]
    pub wallet: WalletConfig,

    /// Service fee configuration
    #[serde(default)]
    pub fees: FeeConfig,

    /// Confirmation polling and retry
    #[serde(default)]
    pub confirmation: ConfirmationConfig,

    /// Token record storage
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// RPC endpoint URL
    #[serde(default = "default_rpc_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,

    /// Commitment used for reads and confirmation
    #[serde(default)]
    pub commitment: Commitment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Path to keypair file
    #[serde(default = "default_keypair_path")]
    pub keypair_path: String,

    /// Ask for approval on the terminal before signing
    #[serde(default = "default_true")]
    pub require_approval: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Base58 address receiving service fees and donations
    #[serde(default)]
    pub service_account: String,

    /// Fixed fee charged for paid mints
    #[serde(default = "default_service_fee")]
    pub service_fee_lamports: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    /// Retries allowed when the checkpoint expires during confirmation
    #[serde(default = "default_confirm_retries")]
    pub max_retries: u32,

    /// Fixed delay between confirmation retries
    #[serde(default = "default_confirm_backoff")]
    pub backoff_ms: u64,

    /// Interval between signature status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory of the embedded token database
    #[serde(default = "default_store_path")]
    pub path: String,
}

/// Commitment level accepted in configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn to_commitment_config(self) -> CommitmentConfig {
        match self {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }
}

// Default value functions
fn default_rpc_url() -> String { "https://api.devnet.solana.com".to_string() }
fn default_rpc_timeout() -> u64 { 30 }
fn default_keypair_path() -> String { "~/.config/solana/id.json".to_string() }
fn default_true() -> bool { true }
fn default_service_fee() -> u64 { 3 * LAMPORTS_PER_SOL / 100 }
fn default_confirm_retries() -> u32 { 5 }
fn default_confirm_backoff() -> u64 { 1_000 }
fn default_poll_interval() -> u64 { 500 }
fn default_store_path() -> String { "tokens.db".to_string() }

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            timeout_secs: default_rpc_timeout(),
            commitment: Commitment::default(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            keypair_path: default_keypair_path(),
            require_approval: default_true(),
        }
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            max_retries: default_confirm_retries(),
            backoff_ms: default_confirm_backoff(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: Network::default(),
            rpc: RpcConfig::default(),
            wallet: WalletConfig::default(),
            fees: FeeConfig {
                service_account: String::new(),
                service_fee_lamports: default_service_fee(),
            },
            confirmation: ConfirmationConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration with environment variable overrides
    ///
    /// A missing file falls back to defaults; overrides are still applied.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let mut config = if std::path::Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `MINTER_*` overrides from the given lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MINTER_RPC_URL") {
            self.rpc.url = url;
        }
        if let Some(path) = lookup("MINTER_KEYPAIR_PATH") {
            self.wallet.keypair_path = path;
        }
        if let Some(account) = lookup("MINTER_SERVICE_ACCOUNT") {
            self.fees.service_account = account;
        }
        if let Some(fee) = lookup("MINTER_SERVICE_FEE_LAMPORTS") {
            self.fees.service_fee_lamports = fee.parse().map_err(|_| ConfigError::Invalid {
                key: "MINTER_SERVICE_FEE_LAMPORTS",
                reason: format!("'{}' is not a lamport amount", fee),
            })?;
        }
        if let Some(network) = lookup("MINTER_NETWORK") {
            self.network = network.parse().map_err(|reason| ConfigError::Invalid {
                key: "MINTER_NETWORK",
                reason,
            })?;
        }
        if let Some(path) = lookup("MINTER_STORE_PATH") {
            self.store.path = path;
        }
        Ok(())
    }

    /// Validate once at startup and freeze the mint settings
    pub fn validate(&self) -> Result<MintConfig, ConfigError> {
        let account = self.fees.service_account.trim();
        if account.is_empty() {
            return Err(ConfigError::Missing("fees.service_account"));
        }
        let service_account = Pubkey::from_str(account).map_err(|e| ConfigError::Invalid {
            key: "fees.service_account",
            reason: e.to_string(),
        })?;

        if self.fees.service_fee_lamports == 0 {
            return Err(ConfigError::Missing("fees.service_fee_lamports"));
        }

        if self.confirmation.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "confirmation.poll_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.rpc.url.trim().is_empty() {
            return Err(ConfigError::Missing("rpc.url"));
        }

        Ok(MintConfig {
            service_account,
            service_fee_lamports: self.fees.service_fee_lamports,
            network: self.network,
            commitment: self.rpc.commitment.to_commitment_config(),
            confirm_retry: FixedRetryPolicy {
                max_retries: self.confirmation.max_retries,
                delay: Duration::from_millis(self.confirmation.backoff_ms),
            },
        })
    }
}

/// Validated, immutable settings shared by the mint pipeline
#[derive(Debug, Clone)]
pub struct MintConfig {
    /// Receives the paid fee and the donated supply share
    pub service_account: Pubkey,

    /// Fixed fee for [`FeeOption::Paid`](crate::types::FeeOption::Paid)
    pub service_fee_lamports: u64,

    /// Cluster tag written to token records
    pub network: Network,

    pub commitment: CommitmentConfig,

    /// Retry policy for checkpoint expiry during confirmation
    pub confirm_retry: FixedRetryPolicy,
}
