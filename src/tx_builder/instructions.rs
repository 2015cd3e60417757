//! Instruction planning and ordering validation
//!
//! Builds the single atomic transaction that creates a Token-2022 mint with
//! self-referencing metadata and mints its initial supply:
//! 1. Service fee transfer (paid mints only)
//! 2. Mint account creation, metadata pointer, mint and metadata init
//! 3. Creator associated account + mint to creator
//! 4. Service associated account + mint to service (donations only)
//! 5. Authority revocations (always last)
//!
//! Revocation must come after every mint-to: once the mint authority is
//! gone, any later mint-to in the same transaction fails.

use crate::tx_builder::errors::TransactionBuilderError;
use crate::tx_builder::fee_policy::FeeSplit;
use crate::types::{FeeOption, TokenMetadata};
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, system_instruction};
use spl_associated_token_account::{
    get_associated_token_address_with_program_id,
    instruction::create_associated_token_account,
};
use spl_token_2022::{
    extension::{metadata_pointer, ExtensionType},
    instruction::{initialize_mint2, mint_to, set_authority, AuthorityType},
    state::Mint,
};
use spl_token_metadata_interface::state::TokenMetadata as OnChainMetadata;

/// Extra bytes reserved on top of the encoded metadata record
pub const METADATA_SAFETY_BUFFER: usize = 100;

const TOKEN_PROGRAM: &str = "spl-token-2022";
const METADATA_PROGRAM: &str = "spl-token-metadata";

fn token_err(err: impl ToString) -> TransactionBuilderError {
    TransactionBuilderError::instruction_failed(TOKEN_PROGRAM, err)
}

/// Label of each instruction in a plan, in plan order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStep {
    FeeTransfer,
    CreateMintAccount,
    InitializeMetadataPointer,
    InitializeMint,
    InitializeMetadata,
    CreateCreatorAccount,
    MintToCreator,
    CreateServiceAccount,
    MintToService,
    RevokeMintAuthority,
    RevokeFreezeAuthority,
}

impl PlanStep {
    pub fn is_mint_to(&self) -> bool {
        matches!(self, PlanStep::MintToCreator | PlanStep::MintToService)
    }

    pub fn is_revocation(&self) -> bool {
        matches!(
            self,
            PlanStep::RevokeMintAuthority | PlanStep::RevokeFreezeAuthority
        )
    }
}

/// Storage sizing of the mint account
///
/// The account is allocated for the mint plus the metadata-pointer
/// extension, and funded for the final size after the metadata record is
/// written, so metadata initialization can grow it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintAccountLayout {
    /// Bytes allocated at creation
    pub mint_space: usize,
    /// Bytes the metadata record adds, including TLV header and buffer
    pub metadata_space: usize,
}

impl MintAccountLayout {
    /// Compute the layout for a mint carrying `metadata`
    pub fn for_metadata(
        metadata: &TokenMetadata,
        mint: &Pubkey,
    ) -> Result<Self, TransactionBuilderError> {
        let mint_space =
            ExtensionType::try_calculate_account_len::<Mint>(&[ExtensionType::MetadataPointer])
                .map_err(token_err)?;

        let record = OnChainMetadata {
            mint: *mint,
            name: metadata.name.clone(),
            symbol: metadata.symbol.clone(),
            uri: metadata.uri().to_string(),
            ..Default::default()
        };
        let record_space = record
            .tlv_size_of()
            .map_err(|e| TransactionBuilderError::instruction_failed(METADATA_PROGRAM, e))?;

        Ok(Self {
            mint_space,
            metadata_space: record_space + METADATA_SAFETY_BUFFER,
        })
    }

    /// Size the rent-exempt balance must cover
    pub fn funded_space(&self) -> usize {
        self.mint_space + self.metadata_space
    }
}

/// Inputs for [`plan_mint_instructions`]
#[derive(Debug, Clone, Copy)]
pub struct MintPlanRequest<'a> {
    pub payer: &'a Pubkey,
    pub mint: &'a Pubkey,
    pub service_account: &'a Pubkey,
    /// Validated metadata; not re-checked here
    pub metadata: &'a TokenMetadata,
    pub fee_option: FeeOption,
    pub split: FeeSplit,
    pub layout: MintAccountLayout,
    /// Rent-exempt minimum for `layout.funded_space()`
    pub mint_rent_lamports: u64,
}

/// Ordered instructions for one mint attempt
#[derive(Debug, Clone)]
pub struct MintTransactionPlan {
    /// The ordered list of instructions for the transaction
    pub instructions: Vec<Instruction>,

    /// One label per instruction, same order
    pub steps: Vec<PlanStep>,

    pub payer: Pubkey,
    pub mint: Pubkey,
    pub fee_option: FeeOption,
    pub split: FeeSplit,
    pub layout: MintAccountLayout,
    pub mint_rent_lamports: u64,
    pub creator_token_account: Pubkey,
    /// Present for donations only
    pub service_token_account: Option<Pubkey>,
}

impl MintTransactionPlan {
    pub fn count(&self, step: PlanStep) -> usize {
        self.steps.iter().filter(|s| **s == step).count()
    }

    pub fn position(&self, step: PlanStep) -> Option<usize> {
        self.steps.iter().position(|s| *s == step)
    }

    fn push(&mut self, step: PlanStep, ix: Instruction) {
        self.steps.push(step);
        self.instructions.push(ix);
    }
}

/// Build the ordered instruction list for a token mint
///
/// Only the fee transfer (paid), the service account pair (donation) and
/// the two revocations (on request) are conditional.
pub fn plan_mint_instructions(
    request: MintPlanRequest<'_>,
) -> Result<MintTransactionPlan, TransactionBuilderError> {
    let MintPlanRequest {
        payer,
        mint,
        service_account,
        metadata,
        fee_option,
        split,
        layout,
        mint_rent_lamports,
    } = request;
    let token_program = spl_token_2022::id();

    let creator_token_account =
        get_associated_token_address_with_program_id(payer, mint, &token_program);

    let mut plan = MintTransactionPlan {
        instructions: Vec::with_capacity(11),
        steps: Vec::with_capacity(11),
        payer: *payer,
        mint: *mint,
        fee_option,
        split,
        layout,
        mint_rent_lamports,
        creator_token_account,
        service_token_account: None,
    };

    // 1. Service fee
    if fee_option == FeeOption::Paid {
        plan.push(
            PlanStep::FeeTransfer,
            system_instruction::transfer(payer, service_account, split.fee_lamports),
        );
    }

    // 2. Mint account, funded for its final size
    plan.push(
        PlanStep::CreateMintAccount,
        system_instruction::create_account(
            payer,
            mint,
            mint_rent_lamports,
            layout.mint_space as u64,
            &token_program,
        ),
    );

    // 3. Metadata lives in the mint itself
    plan.push(
        PlanStep::InitializeMetadataPointer,
        metadata_pointer::instruction::initialize(&token_program, mint, Some(*payer), Some(*mint))
            .map_err(token_err)?,
    );

    // 4. Payer holds both authorities until revocation
    plan.push(
        PlanStep::InitializeMint,
        initialize_mint2(&token_program, mint, payer, Some(payer), metadata.decimals)
            .map_err(token_err)?,
    );

    // 5. Metadata record
    plan.push(
        PlanStep::InitializeMetadata,
        spl_token_metadata_interface::instruction::initialize(
            &token_program,
            mint,
            payer,
            mint,
            payer,
            metadata.name.clone(),
            metadata.symbol.clone(),
            metadata.uri().to_string(),
        ),
    );

    // 6-7. Creator supply
    plan.push(
        PlanStep::CreateCreatorAccount,
        create_associated_token_account(payer, payer, mint, &token_program),
    );
    plan.push(
        PlanStep::MintToCreator,
        mint_to(
            &token_program,
            mint,
            &creator_token_account,
            payer,
            &[],
            split.creator_raw_units,
        )
        .map_err(token_err)?,
    );

    // 8. Donated share, present even when the share rounds down to zero
    if fee_option == FeeOption::Donation {
        let service_token_account =
            get_associated_token_address_with_program_id(service_account, mint, &token_program);
        plan.push(
            PlanStep::CreateServiceAccount,
            create_associated_token_account(payer, service_account, mint, &token_program),
        );
        plan.push(
            PlanStep::MintToService,
            mint_to(
                &token_program,
                mint,
                &service_token_account,
                payer,
                &[],
                split.service_raw_units,
            )
            .map_err(token_err)?,
        );
        plan.service_token_account = Some(service_token_account);
    }

    // 9-10. Revocations last
    if metadata.revoke_mint {
        plan.push(
            PlanStep::RevokeMintAuthority,
            set_authority(
                &token_program,
                mint,
                None,
                AuthorityType::MintTokens,
                payer,
                &[],
            )
            .map_err(token_err)?,
        );
    }
    if metadata.revoke_freeze {
        plan.push(
            PlanStep::RevokeFreezeAuthority,
            set_authority(
                &token_program,
                mint,
                None,
                AuthorityType::FreezeAccount,
                payer,
                &[],
            )
            .map_err(token_err)?,
        );
    }

    Ok(plan)
}

/// Validate the fixed ordering of a mint plan
///
/// Checks that labels and instructions line up, the fee transfer is first
/// and present exactly for paid mints, the service pair is present exactly
/// for donations, the mint is created and initialized in order before any
/// account or supply instruction, and no revocation precedes a mint-to.
pub fn sanity_check_plan_order(plan: &MintTransactionPlan) -> Result<(), TransactionBuilderError> {
    let steps = &plan.steps;

    if steps.is_empty() {
        return Err(TransactionBuilderError::invalid_order("Instruction list is empty"));
    }
    if steps.len() != plan.instructions.len() {
        return Err(TransactionBuilderError::invalid_order(format!(
            "{} step labels for {} instructions",
            steps.len(),
            plan.instructions.len()
        )));
    }

    if let Some(idx) = steps
        .iter()
        .enumerate()
        .skip(1)
        .find_map(|(idx, s)| (*s == PlanStep::FeeTransfer).then_some(idx))
    {
        return Err(TransactionBuilderError::invalid_order(format!(
            "Fee transfer found at position {}, only position 0 allowed",
            idx
        )));
    }

    let expected_fee_transfers = usize::from(plan.fee_option == FeeOption::Paid);
    if plan.count(PlanStep::FeeTransfer) != expected_fee_transfers {
        return Err(TransactionBuilderError::invalid_order(format!(
            "{} fee transfers in a {} plan",
            plan.count(PlanStep::FeeTransfer),
            plan.fee_option
        )));
    }
    let expected_service_pair = usize::from(plan.fee_option == FeeOption::Donation);
    for step in [PlanStep::CreateServiceAccount, PlanStep::MintToService] {
        if plan.count(step) != expected_service_pair {
            return Err(TransactionBuilderError::invalid_order(format!(
                "{} {:?} steps in a {} plan",
                plan.count(step),
                step,
                plan.fee_option
            )));
        }
    }

    let setup = [
        PlanStep::CreateMintAccount,
        PlanStep::InitializeMetadataPointer,
        PlanStep::InitializeMint,
        PlanStep::InitializeMetadata,
        PlanStep::CreateCreatorAccount,
        PlanStep::MintToCreator,
    ];
    let mut last = None;
    for step in setup {
        let pos = plan.position(step).ok_or_else(|| {
            TransactionBuilderError::invalid_order(format!("Missing required step {:?}", step))
        })?;
        if plan.count(step) != 1 {
            return Err(TransactionBuilderError::invalid_order(format!(
                "Step {:?} appears more than once",
                step
            )));
        }
        if last.is_some_and(|prev| pos < prev) {
            return Err(TransactionBuilderError::invalid_order(format!(
                "Step {:?} at position {} is out of order",
                step, pos
            )));
        }
        last = Some(pos);
    }

    if let (Some(create), Some(mint_to)) = (
        plan.position(PlanStep::CreateServiceAccount),
        plan.position(PlanStep::MintToService),
    ) {
        if mint_to < create {
            return Err(TransactionBuilderError::invalid_order(
                "Mint to service precedes creation of the service account",
            ));
        }
    } else if plan.position(PlanStep::MintToService).is_some() {
        return Err(TransactionBuilderError::invalid_order(
            "Mint to service without a service account",
        ));
    }

    let last_mint_to = steps.iter().rposition(PlanStep::is_mint_to);
    let first_revocation = steps.iter().position(PlanStep::is_revocation);
    if let (Some(mint_to), Some(revoke)) = (last_mint_to, first_revocation) {
        if revoke < mint_to {
            return Err(TransactionBuilderError::invalid_order(format!(
                "Authority revocation at position {} precedes mint-to at position {}",
                revoke, mint_to
            )));
        }
    }

    Ok(())
}
