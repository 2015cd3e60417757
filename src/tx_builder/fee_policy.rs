//! Service fee and supply split

use crate::types::FeeOption;

/// Share of supply minted to the service account for donations (5%)
pub const DONATION_BPS: u64 = 500;

const BPS_DENOMINATOR: u64 = 10_000;

/// Lamport fee and raw-unit split decided for one mint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    pub fee_lamports: u64,
    pub creator_raw_units: u64,
    pub service_raw_units: u64,
}

/// Fee policy built from the validated configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    service_fee_lamports: u64,
}

impl FeePolicy {
    pub fn new(service_fee_lamports: u64) -> Self {
        Self {
            service_fee_lamports,
        }
    }

    pub fn service_fee_lamports(&self) -> u64 {
        self.service_fee_lamports
    }

    /// Decide the native fee and the creator/service split of `total_raw_units`
    ///
    /// The service share is floored and the creator receives the exact
    /// complement, so the two always sum to the total.
    pub fn decide_fee_split(&self, fee_option: FeeOption, total_raw_units: u64) -> FeeSplit {
        match fee_option {
            FeeOption::Paid => FeeSplit {
                fee_lamports: self.service_fee_lamports,
                creator_raw_units: total_raw_units,
                service_raw_units: 0,
            },
            FeeOption::Donation => {
                let service_raw_units = (u128::from(total_raw_units) * u128::from(DONATION_BPS)
                    / u128::from(BPS_DENOMINATOR)) as u64;
                FeeSplit {
                    fee_lamports: 0,
                    creator_raw_units: total_raw_units - service_raw_units,
                    service_raw_units,
                }
            }
        }
    }
}
