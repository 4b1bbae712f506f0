//! Stake pool managers, or their delegates, file votes to add validators to
//! or remove them from a blacklist. Votes are admitted only for pools owned
//! by an allow-listed program that hold at least the configured TVL.
//!
//! The program runs against any [`AccountStore`]; each instruction either
//! commits all of its writes or none.

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::clock::Clock;
use tracing::warn;

pub mod authority_checks;
pub mod context;
pub mod error;
pub mod evidence;
pub mod instructions;
pub mod oracle;
pub mod pda;
pub mod stake_pool_helpers;
pub mod state;
pub mod store;

use context::Context;
use error::Result;
use evidence::{Evidence, Tally};
use instructions::*;
use oracle::StakePoolOracle;
use state::{Add, Remove};
use store::AccountStore;

anchor_lang::declare_id!("C7662BVQCwLuorurd8vXohNczQuMHMhDqZ4JcMMge77d");

pub struct ValidatorBlacklist<S, O> {
    program_id: Pubkey,
    store: S,
    oracle: O,
    clock: Clock,
}

impl<S: AccountStore, O: StakePoolOracle> ValidatorBlacklist<S, O> {
    pub fn new(program_id: Pubkey, store: S, oracle: O) -> Self {
        Self {
            program_id,
            store,
            oracle,
            clock: Clock::default(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Runs `handler` against a staged view of the store and commits its
    /// writes only if it succeeds.
    fn execute<F>(&mut self, instruction: &'static str, handler: F) -> Result<()>
    where
        F: FnOnce(&mut Context<'_>) -> Result<()>,
    {
        let writes = {
            let mut ctx = Context::new(&self.program_id, &self.store, &self.oracle, &self.clock);
            if let Err(err) = handler(&mut ctx) {
                warn!(instruction, code = err.code(), error = %err, "instruction failed");
                return Err(err);
            }
            ctx.into_writes()
        };
        self.store.apply(writes);
        Ok(())
    }

    /// Create the global configuration at a fresh address
    pub fn init_config(
        &mut self,
        accounts: InitConfig,
        admin: Pubkey,
        min_tvl: u64,
        allowed_programs: Vec<Pubkey>,
    ) -> Result<()> {
        self.execute("init_config", |ctx| {
            instructions::init_config::init_config(ctx, &accounts, admin, min_tvl, allowed_programs)
        })
    }

    /// Update the config settings (min_tvl and/or allowed_programs)
    pub fn update_config(
        &mut self,
        accounts: UpdateConfig,
        min_tvl: Option<u64>,
        allowed_programs: Option<Vec<Pubkey>>,
    ) -> Result<()> {
        self.execute("update_config", |ctx| {
            instructions::update_config::update_config(ctx, &accounts, min_tvl, allowed_programs)
        })
    }

    /// Update the admin of the config
    pub fn update_config_admin(&mut self, accounts: UpdateConfigAdmin, new_admin: Pubkey) -> Result<()> {
        self.execute("update_config_admin", |ctx| {
            instructions::update_config_admin::update_config_admin(ctx, &accounts, new_admin)
        })
    }

    /// Delegate authority from a stake pool manager to another address
    pub fn delegate(&mut self, accounts: Delegate) -> Result<()> {
        self.execute("delegate", |ctx| instructions::delegate::delegate(ctx, &accounts))
    }

    /// Remove delegation of authority
    pub fn undelegate(&mut self, accounts: Undelegate) -> Result<()> {
        self.execute("undelegate", |ctx| instructions::undelegate::undelegate(ctx, &accounts))
    }

    /// Vote to add a validator to the blacklist
    pub fn vote_add(&mut self, accounts: Vote, validator_identity_address: Pubkey, reason: String) -> Result<()> {
        self.execute("vote_add", |ctx| {
            instructions::vote::vote::<Add>(ctx, &accounts, validator_identity_address, reason)
        })
    }

    /// Vote to remove a validator from the blacklist
    pub fn vote_remove(&mut self, accounts: Vote, validator_identity_address: Pubkey, reason: String) -> Result<()> {
        self.execute("vote_remove", |ctx| {
            instructions::vote::vote::<Remove>(ctx, &accounts, validator_identity_address, reason)
        })
    }

    /// Remove a previously cast vote to add a validator to the blacklist
    pub fn unvote_add(&mut self, accounts: Unvote, validator_identity_address: Pubkey) -> Result<()> {
        self.execute("unvote_add", |ctx| {
            instructions::unvote::unvote::<Add>(ctx, &accounts, validator_identity_address)
        })
    }

    /// Remove a previously cast vote to remove a validator from the blacklist
    pub fn unvote_remove(&mut self, accounts: Unvote, validator_identity_address: Pubkey) -> Result<()> {
        self.execute("unvote_remove", |ctx| {
            instructions::unvote::unvote::<Remove>(ctx, &accounts, validator_identity_address)
        })
    }

    pub fn evidence(&self, config: &Pubkey, validator: &Pubkey) -> Evidence {
        evidence::collect_evidence(&self.store, &self.program_id, config, validator)
    }

    pub fn tally(&self, config: &Pubkey) -> Vec<Tally> {
        evidence::tally(&self.store, &self.program_id, config)
    }
}
