//! Read-only view of third-party stake pools.
//!
//! Pool accounts are untrusted input. Only the owning program is checked
//! against the config allow-list; manager and TVL are read fresh on every
//! call and never cached past one operation.

use std::collections::HashMap;

use anchor_lang::prelude::Pubkey;

use crate::error::{Result, ValidatorBlacklistError};
use crate::stake_pool_helpers::deserialize_stake_pool_with_checks;
use crate::store::AccountReader;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StakePoolInfo {
    pub manager: Pubkey,
    /// Total value locked, in lamports.
    pub total_lamports: u64,
    /// Program that owns the pool account.
    pub owner_program: Pubkey,
}

pub trait StakePoolOracle {
    fn stake_pool(&self, accounts: &dyn AccountReader, address: &Pubkey) -> Result<StakePoolInfo>;
}

/// Decodes SPL stake pool accounts straight out of the ledger.
#[derive(Clone, Copy, Debug, Default)]
pub struct SplStakePoolOracle;

impl StakePoolOracle for SplStakePoolOracle {
    fn stake_pool(&self, accounts: &dyn AccountReader, address: &Pubkey) -> Result<StakePoolInfo> {
        let account = accounts
            .account(address)
            .ok_or(ValidatorBlacklistError::InvalidStakePool)?;
        let stake_pool = deserialize_stake_pool_with_checks(&account.data)?;

        Ok(StakePoolInfo {
            manager: stake_pool.manager,
            total_lamports: stake_pool.total_lamports,
            owner_program: account.owner,
        })
    }
}

/// Fixed pool table, independent of ledger contents.
#[derive(Clone, Debug, Default)]
pub struct StaticStakePoolOracle {
    pools: HashMap<Pubkey, StakePoolInfo>,
}

impl StaticStakePoolOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: Pubkey, info: StakePoolInfo) -> Option<StakePoolInfo> {
        self.pools.insert(address, info)
    }

    pub fn get_mut(&mut self, address: &Pubkey) -> Option<&mut StakePoolInfo> {
        self.pools.get_mut(address)
    }
}

impl StakePoolOracle for StaticStakePoolOracle {
    fn stake_pool(&self, _accounts: &dyn AccountReader, address: &Pubkey) -> Result<StakePoolInfo> {
        self.pools
            .get(address)
            .cloned()
            .ok_or_else(|| ValidatorBlacklistError::InvalidStakePool.into())
    }
}

#[cfg(test)]
mod tests {
    use spl_stake_pool::state::StakePool;

    use super::*;
    use crate::error::Error;
    use crate::stake_pool_helpers::stake_pool_packed_len;
    use crate::store::{Account, AccountStore, MemoryStore};

    fn pool_account(manager: Pubkey, total_lamports: u64, owner: Pubkey) -> Account {
        let pool = StakePool {
            manager,
            total_lamports,
            ..StakePool::default()
        };
        let mut data = borsh::to_vec(&pool).unwrap();
        data.resize(stake_pool_packed_len(), 0);
        Account {
            lamports: 1,
            owner,
            data,
        }
    }

    #[test]
    fn spl_oracle_reads_manager_tvl_and_owner() {
        let mut store = MemoryStore::new();
        let address = Pubkey::new_unique();
        let manager = Pubkey::new_unique();
        store.set_account(address, pool_account(manager, 2_000_000_000, spl_stake_pool::id()));

        let info = SplStakePoolOracle.stake_pool(&store, &address).unwrap();
        assert_eq!(
            info,
            StakePoolInfo {
                manager,
                total_lamports: 2_000_000_000,
                owner_program: spl_stake_pool::id(),
            }
        );
    }

    #[test]
    fn spl_oracle_rejects_missing_and_truncated_accounts() {
        let mut store = MemoryStore::new();
        let missing = Pubkey::new_unique();
        assert_eq!(
            SplStakePoolOracle.stake_pool(&store, &missing),
            Err(Error::Program(ValidatorBlacklistError::InvalidStakePool))
        );

        let truncated = Pubkey::new_unique();
        let mut account = pool_account(Pubkey::new_unique(), 1, spl_stake_pool::id());
        account.data.truncate(100);
        store.set_account(truncated, account);
        assert_eq!(
            SplStakePoolOracle.stake_pool(&store, &truncated),
            Err(Error::Program(ValidatorBlacklistError::InvalidStakePool))
        );
    }

    #[test]
    fn static_oracle_ignores_ledger() {
        let store = MemoryStore::new();
        let address = Pubkey::new_unique();
        let info = StakePoolInfo {
            manager: Pubkey::new_unique(),
            total_lamports: 3,
            owner_program: Pubkey::new_unique(),
        };
        let mut oracle = StaticStakePoolOracle::new();
        oracle.insert(address, info.clone());
        assert_eq!(oracle.stake_pool(&store, &address).unwrap(), info);
    }
}
