use std::collections::BTreeMap;

use anchor_lang::prelude::Pubkey;
use borsh::{BorshDeserialize, BorshSerialize};

/// Owner of plain wallet accounts.
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::new_from_array([0; 32]);

/// Balance, owner and raw bytes held at one address.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Account {
    pub lamports: u64,
    pub owner: Pubkey,
    pub data: Vec<u8>,
}

impl Account {
    /// A plain wallet holding lamports.
    pub fn system(lamports: u64) -> Self {
        Self {
            lamports,
            owner: SYSTEM_PROGRAM_ID,
            data: Vec::new(),
        }
    }
}

pub trait AccountReader {
    fn account(&self, address: &Pubkey) -> Option<Account>;

    fn lamports(&self, address: &Pubkey) -> u64 {
        self.account(address).map_or(0, |account| account.lamports)
    }
}

pub trait AccountStore: AccountReader {
    fn set_account(&mut self, address: Pubkey, account: Account);

    fn delete_account(&mut self, address: &Pubkey) -> Option<Account>;

    /// Every account owned by `owner`, in address order.
    fn program_accounts(&self, owner: &Pubkey) -> Vec<(Pubkey, Account)>;

    fn apply(&mut self, writes: Vec<(Pubkey, Option<Account>)>) {
        for (address, account) in writes {
            match account {
                Some(account) => self.set_account(address, account),
                None => {
                    self.delete_account(&address);
                }
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MemoryStore {
    accounts: BTreeMap<Pubkey, Account>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `lamports` to `address`, creating a system account if needed.
    pub fn airdrop(&mut self, address: Pubkey, lamports: u64) {
        let account = self
            .accounts
            .entry(address)
            .or_insert_with(|| Account::system(0));
        account.lamports = account.lamports.saturating_add(lamports);
    }
}

impl AccountReader for MemoryStore {
    fn account(&self, address: &Pubkey) -> Option<Account> {
        self.accounts.get(address).cloned()
    }
}

impl AccountStore for MemoryStore {
    fn set_account(&mut self, address: Pubkey, account: Account) {
        self.accounts.insert(address, account);
    }

    fn delete_account(&mut self, address: &Pubkey) -> Option<Account> {
        self.accounts.remove(address)
    }

    fn program_accounts(&self, owner: &Pubkey) -> Vec<(Pubkey, Account)> {
        self.accounts
            .iter()
            .filter(|(_, account)| account.owner == *owner)
            .map(|(address, account)| (*address, account.clone()))
            .collect()
    }
}

/// Writes staged on top of a read-only base. Nothing reaches the base store
/// until the caller takes the writes and applies them, so a failed
/// operation leaves no trace.
pub struct Transaction<'a> {
    base: &'a dyn AccountReader,
    writes: BTreeMap<Pubkey, Option<Account>>,
}

impl<'a> Transaction<'a> {
    pub fn new(base: &'a dyn AccountReader) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, address: Pubkey, account: Account) {
        self.writes.insert(address, Some(account));
    }

    pub fn delete(&mut self, address: Pubkey) {
        self.writes.insert(address, None);
    }

    pub fn into_writes(self) -> Vec<(Pubkey, Option<Account>)> {
        self.writes.into_iter().collect()
    }
}

impl AccountReader for Transaction<'_> {
    fn account(&self, address: &Pubkey) -> Option<Account> {
        match self.writes.get(address) {
            Some(staged) => staged.clone(),
            None => self.base.account(address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn airdrop_accumulates() {
        let mut store = MemoryStore::new();
        let wallet = Pubkey::new_unique();
        store.airdrop(wallet, 5);
        store.airdrop(wallet, 7);
        assert_eq!(store.lamports(&wallet), 12);
        assert_eq!(store.account(&wallet).unwrap().owner, SYSTEM_PROGRAM_ID);
    }

    #[test]
    fn wallets_belong_to_the_system_program() {
        assert_eq!(SYSTEM_PROGRAM_ID.to_string(), "11111111111111111111111111111111");
    }

    #[test]
    fn transaction_reads_its_own_writes_and_leaves_base_alone() {
        let mut store = MemoryStore::new();
        let kept = Pubkey::new_unique();
        let dropped = Pubkey::new_unique();
        store.airdrop(kept, 1);
        store.airdrop(dropped, 2);

        let mut tx = Transaction::new(&store);
        tx.set(kept, Account::system(10));
        tx.delete(dropped);
        assert_eq!(tx.lamports(&kept), 10);
        assert!(tx.account(&dropped).is_none());
        let writes = tx.into_writes();

        assert_eq!(store.lamports(&kept), 1);
        assert_eq!(store.lamports(&dropped), 2);

        store.apply(writes);
        assert_eq!(store.lamports(&kept), 10);
        assert!(store.account(&dropped).is_none());
    }

    #[test]
    fn program_accounts_filters_by_owner() {
        let mut store = MemoryStore::new();
        let program = Pubkey::new_unique();
        let owned = Pubkey::new_unique();
        store.set_account(
            owned,
            Account {
                lamports: 1,
                owner: program,
                data: vec![1, 2, 3],
            },
        );
        store.airdrop(Pubkey::new_unique(), 1);

        let found = store.program_accounts(&program);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, owned);
    }
}
