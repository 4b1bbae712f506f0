use anchor_lang::prelude::Pubkey;
use tracing::debug;

use crate::context::load_account;
use crate::error::{Result, ValidatorBlacklistError};
use crate::oracle::StakePoolInfo;
use crate::pda;
use crate::state::Delegation;
use crate::store::AccountReader;

/// How a signer earned the right to act for a stake pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Authority {
    Manager,
    Delegate,
}

/// Resolves whether `authority` may vote for `stake_pool_address` under
/// `config`.
///
/// The pool's current manager is always authorized. Anyone else must supply
/// the delegation recorded for `(config, stake_pool)` and be its delegate.
/// The manager captured on the delegation is not compared against the
/// pool's current manager.
pub fn check_authority(
    accounts: &dyn AccountReader,
    program_id: &Pubkey,
    config: &Pubkey,
    stake_pool_address: &Pubkey,
    stake_pool: &StakePoolInfo,
    delegation: Option<&Pubkey>,
    authority: &Pubkey,
) -> Result<Authority> {
    if stake_pool.manager == *authority {
        debug!(%authority, stake_pool = %stake_pool_address, "direct manager authority");
        return Ok(Authority::Manager);
    }

    let Some(delegation_address) = delegation else {
        return Err(ValidatorBlacklistError::Unauthorized.into());
    };

    // The delegation must be the one filed for this exact (config, pool)
    let (expected, _) = pda::delegation_address(program_id, config, stake_pool_address);
    if *delegation_address != expected {
        return Err(ValidatorBlacklistError::InvalidDelegation.into());
    }

    let delegation: Delegation = load_account(accounts, program_id, delegation_address)?;
    if delegation.delegate != *authority {
        return Err(ValidatorBlacklistError::InvalidDelegation.into());
    }

    debug!(%authority, stake_pool = %stake_pool_address, manager = %delegation.manager, "delegated authority");
    Ok(Authority::Delegate)
}
