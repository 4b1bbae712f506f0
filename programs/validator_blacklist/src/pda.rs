//! Deterministic record addresses.
//!
//! Every record lives at a program derived address, so "a record exists at
//! the derived address" is the same statement as "this operation already
//! happened for this key". Creation at an occupied address fails, which is
//! the only mutual exclusion the program relies on.

use anchor_lang::prelude::Pubkey;

use crate::error::{Error, Result};
use crate::state::VoteIntent;

pub const DELEGATION_SEED: &[u8] = b"delegation";
pub const BLACKLIST_SEED: &[u8] = b"blacklist";
pub const VOTE_ADD_SEED: &[u8] = b"vote_add";
pub const VOTE_REMOVE_SEED: &[u8] = b"vote_remove";

pub fn delegation_address(program_id: &Pubkey, config: &Pubkey, stake_pool: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[DELEGATION_SEED, config.as_ref(), stake_pool.as_ref()], program_id)
}

/// Scope under which every vote on `validator` is filed. Nothing is stored
/// here; vote instructions name it so clients bind to the right scope.
pub fn blacklist_address(program_id: &Pubkey, config: &Pubkey, validator: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[BLACKLIST_SEED, config.as_ref(), validator.as_ref()], program_id)
}

pub fn vote_address<I: VoteIntent>(
    program_id: &Pubkey,
    config: &Pubkey,
    stake_pool: &Pubkey,
    validator: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[I::SEED, config.as_ref(), stake_pool.as_ref(), validator.as_ref()],
        program_id,
    )
}

/// Fails with a seeds violation unless `actual` is the derived address.
pub fn require_derived(actual: &Pubkey, (expected, _bump): (Pubkey, u8)) -> Result<()> {
    if *actual != expected {
        return Err(Error::ConstraintSeeds {
            expected,
            actual: *actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;
    use crate::state::{Add, Remove};

    fn key(bytes: [u8; 32]) -> Pubkey {
        Pubkey::new_from_array(bytes)
    }

    #[test]
    fn require_derived_rejects_other_addresses() {
        let program_id = Pubkey::new_unique();
        let config = Pubkey::new_unique();
        let validator = Pubkey::new_unique();
        let derived = blacklist_address(&program_id, &config, &validator);
        assert!(require_derived(&derived.0, derived).is_ok());

        let stranger = Pubkey::new_unique();
        assert_eq!(
            require_derived(&stranger, derived),
            Err(Error::ConstraintSeeds {
                expected: derived.0,
                actual: stranger
            })
        );
    }

    #[test]
    fn add_and_remove_votes_live_at_different_addresses() {
        let program_id = Pubkey::new_unique();
        let (config, pool, validator) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        assert_ne!(
            vote_address::<Add>(&program_id, &config, &pool, &validator).0,
            vote_address::<Remove>(&program_id, &config, &pool, &validator).0
        );
    }

    #[test]
    fn different_configs_do_not_share_delegations() {
        let program_id = Pubkey::new_unique();
        let pool = Pubkey::new_unique();
        assert_ne!(
            delegation_address(&program_id, &Pubkey::new_unique(), &pool).0,
            delegation_address(&program_id, &Pubkey::new_unique(), &pool).0
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn derivation_is_stable(
            program in any::<[u8; 32]>(),
            config in any::<[u8; 32]>(),
            pool in any::<[u8; 32]>(),
            validator in any::<[u8; 32]>(),
        ) {
            let (program, config, pool, validator) = (key(program), key(config), key(pool), key(validator));
            let first = vote_address::<Add>(&program, &config, &pool, &validator);
            let second = vote_address::<Add>(&program, &config, &pool, &validator);
            prop_assert_eq!(first, second);
            prop_assert!(!first.0.is_on_curve());
        }

        #[test]
        fn distinct_keys_do_not_collide(
            validators in prop::collection::hash_set(any::<[u8; 32]>(), 1..16),
        ) {
            let program = Pubkey::new_unique();
            let config = Pubkey::new_unique();
            let pool = Pubkey::new_unique();
            let addresses: HashSet<Pubkey> = validators
                .iter()
                .map(|v| vote_address::<Add>(&program, &config, &pool, &key(*v)).0)
                .collect();
            prop_assert_eq!(addresses.len(), validators.len());
        }
    }
}
