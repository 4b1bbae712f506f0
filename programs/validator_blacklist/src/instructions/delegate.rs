use anchor_lang::prelude::Pubkey;
use tracing::info;

use crate::context::Context;
use crate::error::{Error, Result, ValidatorBlacklistError};
use crate::pda;
use crate::state::{Config, Delegation};

#[derive(Clone, Debug)]
pub struct Delegate {
    pub config: Pubkey,
    /// The stake pool whose manager is delegating
    pub stake_pool: Pubkey,
    /// Derived from `["delegation", config, stake_pool]`
    pub delegation: Pubkey,
    /// Signer, must be the pool's current manager; pays rent
    pub manager: Pubkey,
    /// The address to delegate authority to
    pub delegate: Pubkey,
}

/// Delegate authority from a stake pool manager to another address
pub fn delegate(ctx: &mut Context<'_>, accounts: &Delegate) -> Result<()> {
    ctx.load::<Config>(&accounts.config)?;

    pda::require_derived(
        &accounts.delegation,
        pda::delegation_address(ctx.program_id, &accounts.config, &accounts.stake_pool),
    )?;

    // Validate the stake pool manager that was passed in to us
    let stake_pool = ctx.stake_pool(&accounts.stake_pool)?;
    if stake_pool.manager != accounts.manager {
        return Err(ValidatorBlacklistError::Unauthorized.into());
    }

    let delegation = Delegation {
        stake_pool: accounts.stake_pool,
        manager: accounts.manager,
        delegate: accounts.delegate,
        timestamp: ctx.clock.unix_timestamp,
    };
    ctx.init(&accounts.manager, &accounts.delegation, &delegation, Error::AlreadyDelegated)?;

    info!(
        stake_pool = %accounts.stake_pool,
        manager = %accounts.manager,
        delegate = %accounts.delegate,
        "delegation created"
    );

    Ok(())
}
