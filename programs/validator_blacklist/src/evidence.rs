//! Read side of the vote ledger.
//!
//! The program only keeps deduplicated, authorized evidence. Turning that
//! evidence into a verdict is left to a [`BlacklistPolicy`] supplied by the
//! consumer.

use std::collections::BTreeMap;

use anchor_lang::prelude::Pubkey;

use crate::pda;
use crate::state::{AccountData, Add, Remove, VoteIntent, VoteRecord};
use crate::store::AccountStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evidence {
    pub config: Pubkey,
    pub validator: Pubkey,
    pub adds: Vec<(Pubkey, VoteRecord<Add>)>,
    pub removes: Vec<(Pubkey, VoteRecord<Remove>)>,
}

impl Evidence {
    pub fn judge<P: BlacklistPolicy + ?Sized>(&self, policy: &P) -> bool {
        policy.is_blacklisted(self)
    }
}

pub trait BlacklistPolicy {
    fn is_blacklisted(&self, evidence: &Evidence) -> bool;
}

impl<F> BlacklistPolicy for F
where
    F: Fn(&Evidence) -> bool,
{
    fn is_blacklisted(&self, evidence: &Evidence) -> bool {
        self(evidence)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub validator: Pubkey,
    pub add_votes: u64,
    pub remove_votes: u64,
}

/// Every live vote of intent `I` filed under `config`. A record belongs to
/// the config only if its address re-derives from it.
fn votes<I: VoteIntent>(
    store: &dyn AccountStore,
    program_id: &Pubkey,
    config: &Pubkey,
) -> Vec<(Pubkey, VoteRecord<I>)> {
    store
        .program_accounts(program_id)
        .into_iter()
        .filter_map(|(address, account)| {
            let record = VoteRecord::<I>::try_deserialize(&address, &account.data).ok()?;
            let (expected, _) = pda::vote_address::<I>(
                program_id,
                config,
                &record.stake_pool,
                &record.validator_identity_address,
            );
            (expected == address).then_some((address, record))
        })
        .collect()
}

pub fn collect_evidence(
    store: &dyn AccountStore,
    program_id: &Pubkey,
    config: &Pubkey,
    validator: &Pubkey,
) -> Evidence {
    let adds = votes::<Add>(store, program_id, config)
        .into_iter()
        .filter(|(_, record)| record.validator_identity_address == *validator)
        .collect();
    let removes = votes::<Remove>(store, program_id, config)
        .into_iter()
        .filter(|(_, record)| record.validator_identity_address == *validator)
        .collect();

    Evidence {
        config: *config,
        validator: *validator,
        adds,
        removes,
    }
}

/// Per validator vote counts under `config`, in validator order.
pub fn tally(store: &dyn AccountStore, program_id: &Pubkey, config: &Pubkey) -> Vec<Tally> {
    let mut tallies: BTreeMap<Pubkey, Tally> = BTreeMap::new();

    for (_, record) in votes::<Add>(store, program_id, config) {
        let validator = record.validator_identity_address;
        tallies
            .entry(validator)
            .or_insert_with(|| Tally {
                validator,
                ..Tally::default()
            })
            .add_votes += 1;
    }
    for (_, record) in votes::<Remove>(store, program_id, config) {
        let validator = record.validator_identity_address;
        tallies
            .entry(validator)
            .or_insert_with(|| Tally {
                validator,
                ..Tally::default()
            })
            .remove_votes += 1;
    }

    tallies.into_values().collect()
}
