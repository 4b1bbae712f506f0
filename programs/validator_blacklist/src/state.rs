use std::fmt;
use std::marker::PhantomData;

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::hash::hash;
use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::{Error, Result};
use crate::pda::{VOTE_ADD_SEED, VOTE_REMOVE_SEED};

pub const MAX_REASON_LENGTH: usize = 1024;
pub const MAX_ALLOWED_PROGRAMS: usize = 10;

pub const DISCRIMINATOR_LEN: usize = 8;

/// A record stored at a program owned address as
/// `discriminator ++ borsh(body)`, zero padded to `LEN`.
pub trait AccountData: BorshSerialize + BorshDeserialize {
    /// Name hashed into the discriminator.
    const NAME: &'static str;
    /// Full account size including the discriminator.
    const LEN: usize;

    fn discriminator() -> [u8; DISCRIMINATOR_LEN] {
        let digest = hash(format!("account:{}", Self::NAME).as_bytes());
        let mut out = [0u8; DISCRIMINATOR_LEN];
        out.copy_from_slice(&digest.to_bytes()[..DISCRIMINATOR_LEN]);
        out
    }

    fn try_serialize(&self, address: &Pubkey) -> Result<Vec<u8>> {
        let mut data = Self::discriminator().to_vec();
        self.serialize(&mut data)
            .map_err(|_| Error::AccountDidNotSerialize(*address))?;
        if data.len() > Self::LEN {
            return Err(Error::AccountDidNotSerialize(*address));
        }
        data.resize(Self::LEN, 0);
        Ok(data)
    }

    fn try_deserialize(address: &Pubkey, data: &[u8]) -> Result<Self> {
        if data.len() < DISCRIMINATOR_LEN || data[..DISCRIMINATOR_LEN] != Self::discriminator() {
            return Err(Error::AccountDiscriminatorMismatch(*address));
        }
        let mut body = &data[DISCRIMINATOR_LEN..];
        Self::deserialize(&mut body).map_err(|_| Error::AccountDidNotDeserialize(*address))
    }
}

/// Global configuration for the validator blacklist program
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Config {
    pub admin: Pubkey,                 // 32 bytes - admin who can update config
    pub min_tvl: u64,                  // 8 bytes - minimum total value locked required
    pub allowed_programs: Vec<Pubkey>, // 4 + (32 * 10) bytes - allowed stake pool programs
}

impl Config {
    pub fn new(admin: Pubkey, min_tvl: u64, allowed_programs: Vec<Pubkey>) -> Self {
        Self {
            admin,
            min_tvl,
            allowed_programs: dedup_programs(allowed_programs),
        }
    }

    pub fn set_allowed_programs(&mut self, allowed_programs: Vec<Pubkey>) {
        self.allowed_programs = dedup_programs(allowed_programs);
    }

    pub fn is_program_allowed(&self, program: &Pubkey) -> bool {
        self.allowed_programs.contains(program)
    }
}

impl AccountData for Config {
    const NAME: &'static str = "Config";
    const LEN: usize = DISCRIMINATOR_LEN + 32 + 8 + 4 + (32 * MAX_ALLOWED_PROGRAMS);
}

/// Keeps the first occurrence of each program id.
fn dedup_programs(programs: Vec<Pubkey>) -> Vec<Pubkey> {
    let mut out: Vec<Pubkey> = Vec::with_capacity(programs.len());
    for program in programs {
        if !out.contains(&program) {
            out.push(program);
        }
    }
    out
}

/// Delegation from a stake pool manager to another authority
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Delegation {
    pub stake_pool: Pubkey, // 32 bytes - the stake pool address
    pub manager: Pubkey,    // 32 bytes - manager at the time the delegation was created
    pub delegate: Pubkey,   // 32 bytes - the delegated authority
    pub timestamp: i64,     // 8 bytes - when delegation was created
}

impl AccountData for Delegation {
    const NAME: &'static str = "Delegation";
    const LEN: usize = DISCRIMINATOR_LEN + 32 + 32 + 32 + 8;
}

/// Which way a vote points. The two intents share one record layout and
/// differ only in seed and discriminator.
pub trait VoteIntent:
    Clone + fmt::Debug + PartialEq + Eq + Default + BorshSerialize + BorshDeserialize
{
    const SEED: &'static [u8];
    const ACCOUNT_NAME: &'static str;
    const LABEL: &'static str;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Add;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Remove;

impl VoteIntent for Add {
    const SEED: &'static [u8] = VOTE_ADD_SEED;
    const ACCOUNT_NAME: &'static str = "VoteAddToBlacklist";
    const LABEL: &'static str = "add";
}

impl VoteIntent for Remove {
    const SEED: &'static [u8] = VOTE_REMOVE_SEED;
    const ACCOUNT_NAME: &'static str = "VoteRemoveFromBlacklist";
    const LABEL: &'static str = "remove";
}

/// Evidence that one stake pool voted on a validator.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct VoteRecord<I: VoteIntent> {
    pub stake_pool: Pubkey,                 // 32 bytes - the stake pool who cast this vote
    pub validator_identity_address: Pubkey, // 32 bytes - the validator being voted on
    pub reason: String,                     // 4 + up to MAX_REASON_LENGTH bytes
    pub timestamp: i64,                     // 8 bytes - UTC timestamp
    pub slot: u64,                          // 8 bytes - slot when vote was cast
    #[borsh(skip)]
    intent: PhantomData<I>,
}

impl<I: VoteIntent> VoteRecord<I> {
    pub fn new(
        stake_pool: Pubkey,
        validator_identity_address: Pubkey,
        reason: String,
        timestamp: i64,
        slot: u64,
    ) -> Self {
        Self {
            stake_pool,
            validator_identity_address,
            reason,
            timestamp,
            slot,
            intent: PhantomData,
        }
    }
}

impl<I: VoteIntent> AccountData for VoteRecord<I> {
    const NAME: &'static str = I::ACCOUNT_NAME;
    const LEN: usize = DISCRIMINATOR_LEN + 32 + 32 + 4 + MAX_REASON_LENGTH + 8 + 8;
}

pub type VoteAddToBlacklist = VoteRecord<Add>;
pub type VoteRemoveFromBlacklist = VoteRecord<Remove>;
