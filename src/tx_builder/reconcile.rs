//! Receipt derivation from balance samples around a confirmed mint

use crate::tx_builder::fee_policy::FeeSplit;
use crate::types::{BalanceAnomaly, FeeOption, TransactionReceipt};
use solana_sdk::pubkey::Pubkey;
use tracing::warn;

/// Inputs sampled around one confirmed mint
#[derive(Debug, Clone)]
pub struct ReconcileInput<'a> {
    pub payer: &'a Pubkey,
    pub service_account: &'a Pubkey,
    /// Payer lamports sampled before the plan was built
    pub balance_before: u64,
    /// Payer lamports sampled after confirmation
    pub balance_after: u64,
    pub fee_option: FeeOption,
    pub split: FeeSplit,
    pub signature: &'a str,
    pub symbol: &'a str,
    pub decimals: u8,
}

/// Derive the receipt for a confirmed mint
///
/// Concurrent activity on the payer account can make the observed cost
/// smaller than the service fee or even negative. Such receipts keep the
/// signed `total_cost`, clamp `network_fee` to zero and carry an anomaly
/// flag instead of reporting a negative fee.
pub fn reconcile(input: ReconcileInput<'_>) -> TransactionReceipt {
    let total_cost = i128::from(input.balance_before) - i128::from(input.balance_after);
    let service_fee = input.split.fee_lamports;
    let residual = total_cost - i128::from(service_fee);

    let anomaly = if total_cost < 0 {
        Some(BalanceAnomaly::BalanceIncreased)
    } else if residual < 0 {
        Some(BalanceAnomaly::NegativeNetworkFee)
    } else {
        None
    };
    if let Some(anomaly) = anomaly {
        warn!(
            signature = %input.signature,
            balance_before = input.balance_before,
            balance_after = input.balance_after,
            service_fee,
            anomaly = ?anomaly,
            "Balance delta does not cover the service fee"
        );
    }

    let (donation_amount, token_symbol) = match input.fee_option {
        FeeOption::Donation => (
            Some(input.split.service_raw_units as f64 / 10f64.powi(i32::from(input.decimals))),
            Some(input.symbol.to_string()),
        ),
        FeeOption::Paid => (None, None),
    };

    TransactionReceipt {
        from_address: input.payer.to_string(),
        to_address: input.service_account.to_string(),
        service_fee,
        network_fee: u64::try_from(residual.max(0)).unwrap_or(u64::MAX),
        total_cost: clamp_i64(total_cost),
        balance_before: input.balance_before,
        balance_after: input.balance_after,
        signature: input.signature.to_string(),
        fee_option: input.fee_option,
        donation_amount,
        token_symbol,
        anomaly,
    }
}

fn clamp_i64(value: i128) -> i64 {
    value.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}
