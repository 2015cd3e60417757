//! Mint transaction pipeline
//!
//! The pipeline is split into focused modules:
//! - **fee_policy**: native fee and supply split per fee option
//! - **instructions**: account sizing, instruction planning and order validation
//! - **context**: mint identity and checkpoint-stamped transaction assembly
//! - **submit**: wallet signing, submission and bounded confirmation
//! - **output**: confirmed submission result
//! - **reconcile**: receipt derivation from balance samples
//! - **errors**: error taxonomy shared by all stages
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use token_minter::tx_builder::FeePolicy;
//! use token_minter::types::{FeeOption, TokenMetadata};
//! # fn example(metadata: TokenMetadata) {
//! let split = FeePolicy::new(30_000_000)
//!     .decide_fee_split(FeeOption::Donation, metadata.raw_supply().unwrap_or_default());
//! assert_eq!(split.fee_lamports, 0);
//! # }
//! ```

pub mod errors;
pub use errors::TransactionBuilderError;

mod context;
mod fee_policy;
mod instructions;
mod output;
mod reconcile;
mod submit;

pub use context::{ExecutionContext, MintIdentity};
pub use fee_policy::{FeePolicy, FeeSplit, DONATION_BPS};
pub use instructions::{
    plan_mint_instructions, sanity_check_plan_order, MintAccountLayout, MintPlanRequest,
    MintTransactionPlan, PlanStep, METADATA_SAFETY_BUFFER,
};
pub use output::SubmissionOutput;
pub use reconcile::{reconcile, ReconcileInput};
pub use submit::TransactionSubmitter;
