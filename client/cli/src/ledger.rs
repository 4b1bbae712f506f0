use std::fs;
use std::io::Write;
use std::path::Path;

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::clock::Clock;
use anyhow::{ensure, Context, Result};
use borsh::{BorshDeserialize, BorshSerialize};
use tempfile::NamedTempFile;
use validator_blacklist::store::MemoryStore;

/// On-disk state of a local ledger: the clock and every account.
#[derive(Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Snapshot {
    pub slot: u64,
    pub epoch: u64,
    pub unix_timestamp: i64,
    pub store: MemoryStore,
}

impl Snapshot {
    /// Reads the snapshot at `path`, or starts an empty ledger if the file
    /// does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(path).with_context(|| format!("Failed to read ledger {}", path.display()))?;
        borsh::from_slice(&bytes).with_context(|| format!("Corrupt ledger {}", path.display()))
    }

    /// Writes the snapshot next to `path` and swaps it into place.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = borsh::to_vec(self).context("Failed to encode ledger")?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staging = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to stage ledger in {}", dir.display()))?;
        staging
            .write_all(&bytes)
            .with_context(|| format!("Failed to write {}", staging.path().display()))?;
        staging
            .persist(path)
            .map_err(|err| err.error)
            .with_context(|| format!("Failed to replace ledger {}", path.display()))?;
        Ok(())
    }

    pub fn from_parts(clock: &Clock, store: MemoryStore) -> Self {
        Self {
            slot: clock.slot,
            epoch: clock.epoch,
            unix_timestamp: clock.unix_timestamp,
            store,
        }
    }

    pub fn clock(&self) -> Clock {
        Clock {
            slot: self.slot,
            epoch: self.epoch,
            unix_timestamp: self.unix_timestamp,
            ..Clock::default()
        }
    }
}

/// Public key of a Solana JSON keypair file (64 bytes, secret half first).
pub fn read_keypair_pubkey(path: &Path) -> Result<Pubkey> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read keypair file {}", path.display()))?;
    let bytes: Vec<u8> = serde_json::from_str(&content)
        .with_context(|| format!("Keypair file {} is not a JSON byte array", path.display()))?;
    ensure!(
        bytes.len() == 64,
        "Keypair file {} holds {} bytes, expected 64",
        path.display(),
        bytes.len()
    );
    let public: [u8; 32] = bytes[32..]
        .try_into()
        .context("Keypair public half is not 32 bytes")?;
    Ok(Pubkey::new_from_array(public))
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator_blacklist::store::AccountReader;

    #[test]
    fn missing_ledger_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::load(&dir.path().join("ledger.bin")).unwrap();
        assert_eq!(snapshot, Snapshot::default());
    }

    #[test]
    fn saved_ledger_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.bin");
        let wallet = Pubkey::new_unique();
        let mut store = MemoryStore::new();
        store.airdrop(wallet, 500);
        let clock = Clock {
            slot: 7,
            unix_timestamp: 1_234,
            ..Clock::default()
        };

        Snapshot::from_parts(&clock, store).save(&path).unwrap();
        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded.clock().slot, 7);
        assert_eq!(loaded.clock().unix_timestamp, 1_234);
        assert_eq!(loaded.store.lamports(&wallet), 500);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn ledger_with_a_tmp_extension_is_replaced_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.tmp");
        let sibling = dir.path().join("ledger.bin");
        let wallet = Pubkey::new_unique();

        let mut store = MemoryStore::new();
        store.airdrop(wallet, 1);
        Snapshot::from_parts(&Clock::default(), store.clone()).save(&sibling).unwrap();
        store.airdrop(wallet, 1);
        Snapshot::from_parts(&Clock::default(), store.clone()).save(&path).unwrap();
        store.airdrop(wallet, 1);
        Snapshot::from_parts(&Clock::default(), store).save(&path).unwrap();

        assert_eq!(Snapshot::load(&path).unwrap().store.lamports(&wallet), 3);
        assert_eq!(Snapshot::load(&sibling).unwrap().store.lamports(&wallet), 1);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn garbage_ledger_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.bin");
        fs::write(&path, [0xff; 3]).unwrap();
        assert!(Snapshot::load(&path).is_err());
    }

    #[test]
    fn keypair_public_half_is_the_signer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        let expected = Pubkey::new_unique();
        let mut bytes = vec![9u8; 32];
        bytes.extend_from_slice(expected.as_ref());
        fs::write(&path, serde_json::to_string(&bytes).unwrap()).unwrap();

        assert_eq!(read_keypair_pubkey(&path).unwrap(), expected);
    }

    #[test]
    fn short_keypair_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        fs::write(&path, "[1,2,3]").unwrap();
        assert!(read_keypair_pubkey(&path).is_err());
    }
}
