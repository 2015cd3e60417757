//! Common types used throughout the application

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum symbol length accepted for a new token
pub const MAX_SYMBOL_LEN: usize = 10;

/// Maximum number of decimals a mint may be initialized with
pub const MAX_DECIMALS: u8 = 9;

/// User supplied description of the token to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    /// Display name
    pub name: String,

    /// Ticker symbol (uppercased, at most 10 characters)
    pub symbol: String,

    /// Free-form description (off-chain only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Mint decimals (0-9)
    pub decimals: u8,

    /// Total supply in whole-token units
    pub total_supply: u64,

    /// Image URI written into the on-chain metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Revoke mint authority after the initial supply is minted
    #[serde(default)]
    pub revoke_mint: bool,

    /// Revoke freeze authority at the end of the transaction
    #[serde(default)]
    pub revoke_freeze: bool,
}

impl TokenMetadata {
    /// Total supply expressed in raw units (`total_supply * 10^decimals`)
    ///
    /// Returns `None` when the result does not fit the on-chain amount type.
    pub fn raw_supply(&self) -> Option<u64> {
        10u64
            .checked_pow(u32::from(self.decimals))
            .and_then(|scale| self.total_supply.checked_mul(scale))
    }

    /// URI to store in the metadata record (empty when no image was given)
    pub fn uri(&self) -> &str {
        self.image_url.as_deref().unwrap_or("")
    }
}

/// How the service is compensated for a mint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeOption {
    /// Fixed native fee to the service account, full supply to the creator
    Paid,
    /// No native fee, 5% of supply minted to the service account
    Donation,
}

impl fmt::Display for FeeOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeOption::Paid => write!(f, "paid"),
            FeeOption::Donation => write!(f, "donation"),
        }
    }
}

impl FromStr for FeeOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "paid" => Ok(FeeOption::Paid),
            "donation" => Ok(FeeOption::Donation),
            other => Err(format!("unknown fee option '{}', expected paid or donation", other)),
        }
    }
}

/// Cluster a token was created on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    #[default]
    #[serde(rename = "devnet")]
    Devnet,
    #[serde(rename = "mainnet-beta")]
    MainnetBeta,
    #[serde(rename = "gor")]
    Gor,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Devnet => "devnet",
            Network::MainnetBeta => "mainnet-beta",
            Network::Gor => "gor",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "devnet" => Ok(Network::Devnet),
            "mainnet-beta" | "mainnet" => Ok(Network::MainnetBeta),
            "gor" => Ok(Network::Gor),
            other => Err(format!("unknown network '{}'", other)),
        }
    }
}

/// Irregular balance movement observed while reconciling a mint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BalanceAnomaly {
    /// The payer balance went up across the mint
    BalanceIncreased,
    /// The balance delta was smaller than the service fee
    NegativeNetworkFee,
}

/// Receipt derived from the balance samples around a confirmed mint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub from_address: String,
    pub to_address: String,
    /// Lamports transferred to the service account (0 for donations)
    pub service_fee: u64,
    /// Lamports attributed to network processing and rent
    pub network_fee: u64,
    /// `balance_before - balance_after`, negative if the balance grew
    pub total_cost: i64,
    pub balance_before: u64,
    pub balance_after: u64,
    pub signature: String,
    pub fee_option: FeeOption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donation_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<BalanceAnomaly>,
}

/// Persisted record of a successfully minted token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedToken {
    /// Record id, equal to the mint address
    pub id: String,
    pub mint_address: String,
    pub metadata: TokenMetadata,
    pub creator: String,
    pub network: Network,
    /// Creation time in epoch milliseconds
    pub created_at: i64,
    pub tx_signature: String,
}

/// Result handed back to the caller for one mint attempt
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCreationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<CreatedToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_details: Option<TransactionReceipt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when the mint landed on-chain but the record could not be stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence_error: Option<String>,
}

impl TokenCreationResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}
