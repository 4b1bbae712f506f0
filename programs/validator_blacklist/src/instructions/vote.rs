use anchor_lang::prelude::Pubkey;
use tracing::info;

use crate::authority_checks::check_authority;
use crate::context::Context;
use crate::error::{Error, Result, ValidatorBlacklistError};
use crate::pda;
use crate::stake_pool_helpers::validate_stake_pool_config;
use crate::state::{Config, VoteIntent, VoteRecord, MAX_REASON_LENGTH};

#[derive(Clone, Debug)]
pub struct Vote {
    pub config: Pubkey,
    /// The stake pool casting the vote
    pub stake_pool: Pubkey,
    /// Derived from `["blacklist", config, validator]`
    pub blacklist: Pubkey,
    /// Derived from `[intent seed, config, stake_pool, validator]`
    pub vote: Pubkey,
    /// Optional delegation; required when `authority` is not the manager
    pub delegation: Option<Pubkey>,
    /// Manager or delegate; pays rent for the vote record
    pub authority: Pubkey,
}

/// Checks that `blacklist` and `vote` are the addresses derived for
/// `validator` and intent `I`.
pub(crate) fn require_vote_addresses<I: VoteIntent>(
    program_id: &Pubkey,
    config: &Pubkey,
    stake_pool: &Pubkey,
    blacklist: &Pubkey,
    vote: &Pubkey,
    validator: &Pubkey,
) -> Result<()> {
    pda::require_derived(blacklist, pda::blacklist_address(program_id, config, validator))?;
    pda::require_derived(vote, pda::vote_address::<I>(program_id, config, stake_pool, validator))
}

/// Record a vote of intent `I` on `validator_identity_address`.
pub fn vote<I: VoteIntent>(
    ctx: &mut Context<'_>,
    accounts: &Vote,
    validator_identity_address: Pubkey,
    reason: String,
) -> Result<()> {
    if reason.len() > MAX_REASON_LENGTH {
        return Err(ValidatorBlacklistError::ReasonTooLong.into());
    }

    let config: Config = ctx.load(&accounts.config)?;

    require_vote_addresses::<I>(
        ctx.program_id,
        &accounts.config,
        &accounts.stake_pool,
        &accounts.blacklist,
        &accounts.vote,
        &validator_identity_address,
    )?;

    let stake_pool = ctx.stake_pool(&accounts.stake_pool)?;

    // Validate the authority
    check_authority(
        &ctx.accounts,
        ctx.program_id,
        &accounts.config,
        &accounts.stake_pool,
        &stake_pool,
        accounts.delegation.as_ref(),
        &accounts.authority,
    )?;

    // Validate stake pool meets config requirements
    validate_stake_pool_config(&stake_pool, &config)?;

    let record = VoteRecord::<I>::new(
        accounts.stake_pool,
        validator_identity_address,
        reason,
        ctx.clock.unix_timestamp,
        ctx.clock.slot,
    );
    ctx.init(&accounts.authority, &accounts.vote, &record, Error::AlreadyVoted)?;

    info!(
        intent = I::LABEL,
        validator = %validator_identity_address,
        stake_pool = %accounts.stake_pool,
        slot = record.slot,
        "vote cast"
    );

    Ok(())
}
