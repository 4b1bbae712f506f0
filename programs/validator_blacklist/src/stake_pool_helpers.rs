use spl_stake_pool::state::StakePool;

use crate::error::{Result, ValidatorBlacklistError};
use crate::oracle::StakePoolInfo;
use crate::state::Config;

/// Size of a packed SPL `StakePool` account.
#[allow(deprecated)]
pub fn stake_pool_packed_len() -> usize {
    anchor_lang::solana_program::borsh1::get_packed_len::<StakePool>()
}

#[allow(deprecated)]
pub fn deserialize_stake_pool_with_checks(stake_pool_data: &[u8]) -> Result<StakePool> {
    if stake_pool_data.len() != stake_pool_packed_len() {
        return Err(ValidatorBlacklistError::InvalidStakePool.into());
    }

    let stake_pool: StakePool = anchor_lang::solana_program::borsh1::try_from_slice_unchecked(stake_pool_data)
        .map_err(|_| ValidatorBlacklistError::InvalidStakePool)?;

    Ok(stake_pool)
}

/// Admission gate for new votes: the pool must be owned by an allow-listed
/// program and hold at least `min_tvl` lamports.
pub fn validate_stake_pool_config(stake_pool: &StakePoolInfo, config: &Config) -> Result<()> {
    if !config.is_program_allowed(&stake_pool.owner_program) {
        return Err(ValidatorBlacklistError::UnauthorizedStakePoolProgram.into());
    }

    if stake_pool.total_lamports < config.min_tvl {
        return Err(ValidatorBlacklistError::InsufficientTvl.into());
    }

    Ok(())
}
