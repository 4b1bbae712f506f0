use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::clock::Clock;
use anchor_lang::solana_program::rent::Rent;

use crate::error::{Error, Result};
use crate::oracle::{StakePoolInfo, StakePoolOracle};
use crate::state::AccountData;
use crate::store::{Account, AccountReader, Transaction, SYSTEM_PROGRAM_ID};

/// Reads a program owned record of type `T` from `address`.
pub fn load_account<T: AccountData>(
    accounts: &dyn AccountReader,
    program_id: &Pubkey,
    address: &Pubkey,
) -> Result<T> {
    let account = accounts
        .account(address)
        .ok_or(Error::AccountNotInitialized(*address))?;
    if account.owner == SYSTEM_PROGRAM_ID {
        return Err(Error::AccountNotInitialized(*address));
    }
    if account.owner != *program_id {
        return Err(Error::AccountOwnedByWrongProgram {
            address: *address,
            expected: *program_id,
            actual: account.owner,
        });
    }
    T::try_deserialize(address, &account.data)
}

/// Everything one instruction may touch. Writes go to a staged
/// [`Transaction`] that the processor commits only on success.
pub struct Context<'a> {
    pub program_id: &'a Pubkey,
    pub accounts: Transaction<'a>,
    pub oracle: &'a dyn StakePoolOracle,
    pub clock: &'a Clock,
}

impl<'a> Context<'a> {
    pub fn new(
        program_id: &'a Pubkey,
        base: &'a dyn AccountReader,
        oracle: &'a dyn StakePoolOracle,
        clock: &'a Clock,
    ) -> Self {
        Self {
            program_id,
            accounts: Transaction::new(base),
            oracle,
            clock,
        }
    }

    pub fn load<T: AccountData>(&self, address: &Pubkey) -> Result<T> {
        load_account(&self.accounts, self.program_id, address)
    }

    pub fn stake_pool(&self, address: &Pubkey) -> Result<StakePoolInfo> {
        self.oracle.stake_pool(&self.accounts, address)
    }

    /// Creates a rent exempt record at `address`, paid for by `payer`.
    /// An address that already holds data or belongs to a program fails
    /// with `occupied(address)`.
    pub fn init<T: AccountData>(
        &mut self,
        payer: &Pubkey,
        address: &Pubkey,
        record: &T,
        occupied: fn(Pubkey) -> Error,
    ) -> Result<()> {
        let existing = self.accounts.account(address);
        if let Some(account) = &existing {
            if account.owner != SYSTEM_PROGRAM_ID || !account.data.is_empty() {
                return Err(occupied(*address));
            }
        }
        let data = record.try_serialize(address)?;

        let prefunded = existing.map_or(0, |account| account.lamports);
        let rent = Rent::default().minimum_balance(T::LEN);
        let required = rent.saturating_sub(prefunded);

        let mut payer_account = self.accounts.account(payer).unwrap_or_else(|| Account::system(0));
        if payer_account.lamports < required {
            return Err(Error::InsufficientFunds {
                address: *payer,
                required,
                available: payer_account.lamports,
            });
        }
        payer_account.lamports -= required;
        self.accounts.set(*payer, payer_account);

        self.accounts.set(
            *address,
            Account {
                lamports: prefunded + required,
                owner: *self.program_id,
                data,
            },
        );
        Ok(())
    }

    /// Overwrites an existing record, keeping its balance.
    pub fn save<T: AccountData>(&mut self, address: &Pubkey, record: &T) -> Result<()> {
        let mut account = self
            .accounts
            .account(address)
            .ok_or(Error::AccountNotInitialized(*address))?;
        account.data = record.try_serialize(address)?;
        self.accounts.set(*address, account);
        Ok(())
    }

    /// Removes the record at `address` and moves its lamports to `destination`.
    pub fn close(&mut self, address: &Pubkey, destination: &Pubkey) -> Result<u64> {
        let account = self
            .accounts
            .account(address)
            .ok_or(Error::AccountNotInitialized(*address))?;
        let mut receiver = self
            .accounts
            .account(destination)
            .unwrap_or_else(|| Account::system(0));
        receiver.lamports = receiver.lamports.saturating_add(account.lamports);
        self.accounts.set(*destination, receiver);
        self.accounts.delete(*address);
        Ok(account.lamports)
    }

    pub fn into_writes(self) -> Vec<(Pubkey, Option<Account>)> {
        self.accounts.into_writes()
    }
}
