use anchor_lang::prelude::Pubkey;
use tracing::info;

use crate::authority_checks::check_authority;
use crate::context::Context;
use crate::error::Result;
use crate::instructions::vote::require_vote_addresses;
use crate::state::{Config, VoteIntent, VoteRecord};

#[derive(Clone, Debug)]
pub struct Unvote {
    pub config: Pubkey,
    /// The stake pool whose vote is withdrawn
    pub stake_pool: Pubkey,
    pub blacklist: Pubkey,
    pub vote: Pubkey,
    pub delegation: Option<Pubkey>,
    /// Manager or delegate; receives the vote record's rent
    pub authority: Pubkey,
}

/// Withdraw a previously cast vote of intent `I`.
///
/// Only authority is checked. A pool that has since fallen below the TVL
/// floor or been delisted can still withdraw its votes.
pub fn unvote<I: VoteIntent>(
    ctx: &mut Context<'_>,
    accounts: &Unvote,
    validator_identity_address: Pubkey,
) -> Result<()> {
    ctx.load::<Config>(&accounts.config)?;

    require_vote_addresses::<I>(
        ctx.program_id,
        &accounts.config,
        &accounts.stake_pool,
        &accounts.blacklist,
        &accounts.vote,
        &validator_identity_address,
    )?;

    let stake_pool = ctx.stake_pool(&accounts.stake_pool)?;

    check_authority(
        &ctx.accounts,
        ctx.program_id,
        &accounts.config,
        &accounts.stake_pool,
        &stake_pool,
        accounts.delegation.as_ref(),
        &accounts.authority,
    )?;

    ctx.load::<VoteRecord<I>>(&accounts.vote)?;
    let refunded = ctx.close(&accounts.vote, &accounts.authority)?;

    info!(
        intent = I::LABEL,
        validator = %validator_identity_address,
        stake_pool = %accounts.stake_pool,
        refunded,
        "vote withdrawn"
    );

    Ok(())
}
