//! Token Minter - Token-2022 mint creation library
//!
//! Creates a fungible Token-2022 mint with on-chain metadata, distributes
//! its initial supply and optionally revokes its authorities, all in one
//! atomic transaction signed by an external wallet.
//!
//! ## Pipeline
//!
//! - **validation**: input normalization, rejected before any network call
//! - **tx_builder**: fee policy, instruction planning, submission, reconciliation
//! - **rpc_manager**: network client seam, tagged errors, bounded retry
//! - **token_store**: persisted records of created tokens
//! - **mint_engine**: orchestration into a structured response

pub mod config;
pub mod metrics;
pub mod mint_engine;
pub mod observability;
pub mod rpc_manager;
pub mod structured_logging;
pub mod token_store;
pub mod tx_builder;
pub mod types;
pub mod validation;
pub mod wallet;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

// Re-export commonly used types
pub use mint_engine::{MintEngine, MintError};
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
pub use types::{FeeOption, TokenCreationResponse, TokenMetadata};
