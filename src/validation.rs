//! Metadata validation performed before any network interaction

use crate::types::{TokenMetadata, MAX_DECIMALS, MAX_SYMBOL_LEN};
use thiserror::Error;

/// Reasons a token description is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("token name is required")]
    EmptyName,

    #[error("token symbol is required")]
    EmptySymbol,

    #[error("symbol must be {max} characters or less (got {len})")]
    SymbolTooLong { len: usize, max: usize },

    #[error("decimals must be between 0 and {max} (got {decimals})")]
    DecimalsOutOfRange { decimals: u8, max: u8 },

    #[error("total supply must be greater than zero")]
    ZeroSupply,

    #[error("total supply {total_supply} with {decimals} decimals exceeds the maximum mintable amount")]
    SupplyOverflow { total_supply: u64, decimals: u8 },
}

/// Normalize and validate user input
///
/// Trims name and symbol, uppercases the symbol and drops blank optional
/// fields. The returned metadata is what the instruction builder expects.
pub fn validate_metadata(metadata: TokenMetadata) -> Result<TokenMetadata, ValidationError> {
    let metadata = normalize(metadata);

    if metadata.name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if metadata.symbol.is_empty() {
        return Err(ValidationError::EmptySymbol);
    }

    let symbol_len = metadata.symbol.chars().count();
    if symbol_len > MAX_SYMBOL_LEN {
        return Err(ValidationError::SymbolTooLong {
            len: symbol_len,
            max: MAX_SYMBOL_LEN,
        });
    }

    if metadata.decimals > MAX_DECIMALS {
        return Err(ValidationError::DecimalsOutOfRange {
            decimals: metadata.decimals,
            max: MAX_DECIMALS,
        });
    }

    if metadata.total_supply == 0 {
        return Err(ValidationError::ZeroSupply);
    }

    if metadata.raw_supply().is_none() {
        return Err(ValidationError::SupplyOverflow {
            total_supply: metadata.total_supply,
            decimals: metadata.decimals,
        });
    }

    Ok(metadata)
}

fn normalize(mut metadata: TokenMetadata) -> TokenMetadata {
    metadata.name = metadata.name.trim().to_string();
    metadata.symbol = metadata.symbol.trim().to_uppercase();
    metadata.description = non_blank(metadata.description);
    metadata.image_url = non_blank(metadata.image_url);
    metadata
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
