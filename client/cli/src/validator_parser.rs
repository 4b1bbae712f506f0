use std::collections::HashMap;
use std::io::Read;
use std::str::FromStr;

use anchor_lang::prelude::Pubkey;
use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, Trim};

/// A validator row from `solana validators` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorEntry {
    pub identity: Pubkey,
    /// Rows flagged with a warning sign are delinquent
    pub delinquent: bool,
}

/// A row of a batch ban file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanEntry {
    pub validator: Pubkey,
    pub reason: String,
}

/// Parses the table printed by `solana validators`.
///
/// Rows look like:
/// ```text
///    Identity                                      Vote Account                            Commission  Last Vote ...
///   3iQqh65Gby53aaYUF8ocoiEyhBs4aoe7BTYYWvy1c9dF  AEtdq4CwtuktCEUWLLpRTNPBZs6tr7BBqxkHJ1DjAttR    5%  379088558 ...
/// ⚠️2XK1YYuLwPCMZSbmfedmso1vmkqrX63M2srNApvAntvw  ENjAU1VZvBTAMCwg9ZayfxLaRQEPExcR2ujH7VdeBkDh  100%  378433337 ...
/// ```
/// Headers, separators and summary lines are skipped because their first
/// column is not a public key.
pub fn parse_validator_list(input: &str) -> Vec<ValidatorEntry> {
    input.lines().filter_map(parse_validator_line).collect()
}

/// Identities in the listing, each mapped to its delinquent flag.
pub fn listed_validators(input: &str) -> HashMap<Pubkey, bool> {
    parse_validator_list(input)
        .into_iter()
        .map(|entry| (entry.identity, entry.delinquent))
        .collect()
}

fn parse_validator_line(line: &str) -> Option<ValidatorEntry> {
    let line = line.trim_start();
    let (delinquent, rest) = match line.strip_prefix('\u{26a0}') {
        Some(rest) => (true, rest.trim_start_matches('\u{fe0f}')),
        None => (false, line),
    };

    let identity = Pubkey::from_str(rest.split_whitespace().next()?).ok()?;
    Some(ValidatorEntry { identity, delinquent })
}

/// Reads `validator,reason` rows. A leading header row naming the
/// validator column is skipped, as are blank rows.
pub fn read_ban_list<R: Read>(reader: R) -> Result<Vec<BanEntry>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut entries = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let row = index + 1;
        let record = record.with_context(|| format!("Invalid CSV record on row {row}"))?;
        let Some(address) = record.get(0).filter(|field| !field.is_empty()) else {
            continue;
        };

        if index == 0 {
            let lowered = address.to_lowercase();
            if lowered.contains("validator") || lowered.contains("address") {
                continue;
            }
        }

        let validator = Pubkey::from_str(address)
            .with_context(|| format!("Invalid validator address on row {row}: {address}"))?;
        let reason = match record.get(1) {
            Some(reason) if !reason.is_empty() => reason.to_string(),
            _ => bail!("Missing reason on row {row}: validator {validator} has no reason provided"),
        };

        entries.push(BanEntry { validator, reason });
    }

    Ok(entries)
}
