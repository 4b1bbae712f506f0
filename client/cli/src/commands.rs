use std::fs;
use std::path::Path;
use std::str::FromStr;

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::native_token::LAMPORTS_PER_SOL;
use anyhow::{anyhow, bail, Context, Result};
use spl_stake_pool::state::StakePool;
use tracing::{info, warn};
use validator_blacklist::instructions::{
    Delegate, InitConfig, Undelegate, Unvote, UpdateConfig, UpdateConfigAdmin, Vote,
};
use validator_blacklist::oracle::SplStakePoolOracle;
use validator_blacklist::pda;
use validator_blacklist::stake_pool_helpers::stake_pool_packed_len;
use validator_blacklist::state::{Add, Remove, VoteIntent};
use validator_blacklist::store::{Account, AccountStore, MemoryStore};
use validator_blacklist::ValidatorBlacklist;

use crate::cli::{Cli, Commands};
use crate::ledger::{read_keypair_pubkey, Snapshot};
use crate::validator_parser::{listed_validators, read_ban_list};

type Program = ValidatorBlacklist<MemoryStore, SplStakePoolOracle>;

pub fn run_command(cli: Cli) -> Result<()> {
    let program_id = match &cli.program_id {
        Some(id) => parse_pubkey(id, "program ID")?,
        None => validator_blacklist::ID,
    };

    let snapshot = Snapshot::load(&cli.ledger)?;
    let clock = snapshot.clock();
    let mut program = ValidatorBlacklist::new(program_id, snapshot.store, SplStakePoolOracle).with_clock(clock);
    let keypair = cli.keypair.as_deref();

    match cli.command {
        Commands::List { config } => {
            list_validators(&program, &parse_pubkey(&config, "config address")?);
            // Read only, nothing to persist
            return Ok(());
        }
        Commands::CreateConfig {
            config,
            min_tvl,
            allowed_programs,
            admin,
        } => {
            handle_create_config_command(&mut program, keypair, config, min_tvl, allowed_programs, admin)?;
        }
        Commands::UpdateConfig {
            config,
            min_tvl,
            allowed_programs,
        } => {
            handle_update_config_command(&mut program, keypair, config, min_tvl, allowed_programs)?;
        }
        Commands::UpdateConfigAdmin { config, new_admin } => {
            handle_update_config_admin_command(&mut program, keypair, config, new_admin)?;
        }
        Commands::VoteAdd {
            config,
            validator_address,
            stake_pool,
            reason,
            delegated,
        } => {
            let accounts = vote_accounts::<Add>(&program, keypair, &config, &validator_address, &stake_pool, delegated)?;
            let validator = parse_pubkey(&validator_address, "validator address")?;
            submit("vote_add", program.vote_add(accounts, validator, reason))?;
            println!("Voted to add validator {validator}");
        }
        Commands::VoteRemove {
            config,
            validator_address,
            stake_pool,
            reason,
            delegated,
        } => {
            let accounts =
                vote_accounts::<Remove>(&program, keypair, &config, &validator_address, &stake_pool, delegated)?;
            let validator = parse_pubkey(&validator_address, "validator address")?;
            submit("vote_remove", program.vote_remove(accounts, validator, reason))?;
            println!("Voted to remove validator {validator}");
        }
        Commands::UnvoteAdd {
            config,
            validator_address,
            stake_pool,
            delegated,
        } => {
            let accounts = vote_accounts::<Add>(&program, keypair, &config, &validator_address, &stake_pool, delegated)?;
            let validator = parse_pubkey(&validator_address, "validator address")?;
            submit("unvote_add", program.unvote_add(unvote(accounts), validator))?;
            println!("Withdrew add vote for validator {validator}");
        }
        Commands::UnvoteRemove {
            config,
            validator_address,
            stake_pool,
            delegated,
        } => {
            let accounts =
                vote_accounts::<Remove>(&program, keypair, &config, &validator_address, &stake_pool, delegated)?;
            let validator = parse_pubkey(&validator_address, "validator address")?;
            submit("unvote_remove", program.unvote_remove(unvote(accounts), validator))?;
            println!("Withdrew remove vote for validator {validator}");
        }
        Commands::Delegate {
            config,
            stake_pool,
            delegate,
        } => {
            handle_delegate_command(&mut program, keypair, config, stake_pool, delegate)?;
        }
        Commands::Undelegate { config, stake_pool } => {
            handle_undelegate_command(&mut program, keypair, config, stake_pool)?;
        }
        Commands::BatchBan {
            config,
            stake_pool,
            file,
            validators_file,
            delegated,
        } => {
            handle_batch_ban_command(
                &mut program,
                keypair,
                config,
                stake_pool,
                &file,
                validators_file.as_deref(),
                delegated,
            )?;
        }
        Commands::Airdrop { address, lamports } => {
            let address = parse_pubkey(&address, "address")?;
            program.store_mut().airdrop(address, lamports);
            println!(
                "Airdropped {} SOL to {address}",
                lamports as f64 / LAMPORTS_PER_SOL as f64
            );
        }
        Commands::SetStakePool {
            address,
            manager,
            total_lamports,
            owner,
        } => {
            handle_set_stake_pool_command(&mut program, address, manager, total_lamports, owner)?;
        }
        Commands::Warp { slot, unix_timestamp } => {
            let mut clock = program.clock().clone();
            if let Some(slot) = slot {
                clock.slot = slot;
            }
            if let Some(unix_timestamp) = unix_timestamp {
                clock.unix_timestamp = unix_timestamp;
            }
            println!("Clock at slot {} (unix time {})", clock.slot, clock.unix_timestamp);
            program.set_clock(clock);
        }
    }

    let clock = program.clock().clone();
    Snapshot::from_parts(&clock, program.into_store()).save(&cli.ledger)
}

fn parse_pubkey(value: &str, what: &str) -> Result<Pubkey> {
    Pubkey::from_str(value).with_context(|| format!("Invalid {what}: {value}"))
}

fn signer(keypair: Option<&Path>) -> Result<Pubkey> {
    let path = keypair.context("Keypair path is required")?;
    read_keypair_pubkey(path)
}

/// Turns a processor error into one carrying its numeric code.
fn submit(instruction: &str, result: validator_blacklist::error::Result<()>) -> Result<()> {
    result.map_err(|err| anyhow!("{instruction} failed (code {}): {err}", err.code()))
}

fn vote_accounts<I: VoteIntent>(
    program: &Program,
    keypair: Option<&Path>,
    config: &str,
    validator_address: &str,
    stake_pool: &str,
    delegated: bool,
) -> Result<Vote> {
    let program_id = program.program_id();
    let config = parse_pubkey(config, "config address")?;
    let validator = parse_pubkey(validator_address, "validator address")?;
    let stake_pool = parse_pubkey(stake_pool, "stake pool address")?;

    Ok(Vote {
        config,
        stake_pool,
        blacklist: pda::blacklist_address(program_id, &config, &validator).0,
        vote: pda::vote_address::<I>(program_id, &config, &stake_pool, &validator).0,
        delegation: delegated.then(|| pda::delegation_address(program_id, &config, &stake_pool).0),
        authority: signer(keypair)?,
    })
}

fn unvote(accounts: Vote) -> Unvote {
    Unvote {
        config: accounts.config,
        stake_pool: accounts.stake_pool,
        blacklist: accounts.blacklist,
        vote: accounts.vote,
        delegation: accounts.delegation,
        authority: accounts.authority,
    }
}

fn list_validators(program: &Program, config: &Pubkey) {
    let tallies = program.tally(config);
    if tallies.is_empty() {
        println!("No votes found.");
        return;
    }

    println!("{:<44} {:<10} {:<10}", "Validator Address", "Add Votes", "Remove Votes");
    println!("{}", "-".repeat(70));
    for tally in tallies {
        println!(
            "{:<44} {:<10} {:<10}",
            tally.validator, tally.add_votes, tally.remove_votes
        );
    }
}

fn handle_create_config_command(
    program: &mut Program,
    keypair: Option<&Path>,
    config: String,
    min_tvl: u64,
    allowed_programs: Vec<String>,
    admin: Option<String>,
) -> Result<()> {
    let config = parse_pubkey(&config, "config address")?;
    let payer = signer(keypair)?;
    let admin = admin
        .map(|admin| parse_pubkey(&admin, "admin"))
        .transpose()?
        .unwrap_or(payer);
    let allowed_programs = allowed_programs
        .iter()
        .map(|id| parse_pubkey(id, "program ID"))
        .collect::<Result<Vec<_>>>()?;

    submit(
        "init_config",
        program.init_config(InitConfig { config, payer }, admin, min_tvl, allowed_programs),
    )?;
    println!("Config account: {config}");
    Ok(())
}

fn handle_update_config_command(
    program: &mut Program,
    keypair: Option<&Path>,
    config: String,
    min_tvl: Option<u64>,
    allowed_programs: Option<Vec<String>>,
) -> Result<()> {
    if min_tvl.is_none() && allowed_programs.is_none() {
        bail!("Nothing to update: pass --min-tvl and/or --allowed-programs");
    }
    let config = parse_pubkey(&config, "config address")?;
    let allowed_programs = allowed_programs
        .map(|ids| {
            ids.iter()
                .map(|id| parse_pubkey(id, "program ID"))
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?;

    let accounts = UpdateConfig {
        config,
        admin: signer(keypair)?,
    };
    submit("update_config", program.update_config(accounts, min_tvl, allowed_programs))?;
    println!("Config {config} updated");
    Ok(())
}

fn handle_update_config_admin_command(
    program: &mut Program,
    keypair: Option<&Path>,
    config: String,
    new_admin: String,
) -> Result<()> {
    let config = parse_pubkey(&config, "config address")?;
    let new_admin = parse_pubkey(&new_admin, "new admin")?;
    let accounts = UpdateConfigAdmin {
        config,
        admin: signer(keypair)?,
    };
    submit("update_config_admin", program.update_config_admin(accounts, new_admin))?;
    println!("Config {config} admin is now {new_admin}");
    Ok(())
}

fn handle_delegate_command(
    program: &mut Program,
    keypair: Option<&Path>,
    config: String,
    stake_pool: String,
    delegate: String,
) -> Result<()> {
    let config = parse_pubkey(&config, "config address")?;
    let stake_pool = parse_pubkey(&stake_pool, "stake pool address")?;
    let delegate = parse_pubkey(&delegate, "delegate address")?;
    let (delegation, _) = pda::delegation_address(program.program_id(), &config, &stake_pool);

    let accounts = Delegate {
        config,
        stake_pool,
        delegation,
        manager: signer(keypair)?,
        delegate,
    };
    submit("delegate", program.delegate(accounts))?;
    println!("Delegation account: {delegation}");
    Ok(())
}

fn handle_undelegate_command(
    program: &mut Program,
    keypair: Option<&Path>,
    config: String,
    stake_pool: String,
) -> Result<()> {
    let config = parse_pubkey(&config, "config address")?;
    let stake_pool = parse_pubkey(&stake_pool, "stake pool address")?;
    let (delegation, _) = pda::delegation_address(program.program_id(), &config, &stake_pool);

    let accounts = Undelegate {
        config,
        stake_pool,
        delegation,
        manager: signer(keypair)?,
    };
    submit("undelegate", program.undelegate(accounts))?;
    println!("Delegation {delegation} closed");
    Ok(())
}

/// Outcome of a batch ban run.
#[derive(Debug, Default, PartialEq, Eq)]
struct BatchBanReport {
    voted: usize,
    failed: usize,
    /// Rows missing from the validators listing
    skipped: usize,
    /// Targeted validators the listing marks delinquent
    delinquent: usize,
}

fn handle_batch_ban_command(
    program: &mut Program,
    keypair: Option<&Path>,
    config: String,
    stake_pool: String,
    file: &Path,
    validators_file: Option<&Path>,
    delegated: bool,
) -> Result<BatchBanReport> {
    let reader = fs::File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let entries = read_ban_list(reader)?;
    if entries.is_empty() {
        bail!("No valid validators found in CSV file");
    }
    println!("Loaded {} validators from {}", entries.len(), file.display());

    let mut report = BatchBanReport::default();
    let entries = match validators_file {
        Some(path) => {
            let listing =
                fs::read_to_string(path).with_context(|| format!("Failed to read validators file {}", path.display()))?;
            let listed = listed_validators(&listing);
            let (kept, skipped): (Vec<_>, Vec<_>) =
                entries.into_iter().partition(|entry| listed.contains_key(&entry.validator));
            for entry in &skipped {
                info!(validator = %entry.validator, "skipping validator missing from active list");
            }
            for entry in kept.iter().filter(|entry| listed[&entry.validator]) {
                info!(validator = %entry.validator, "targeted validator is delinquent");
                report.delinquent += 1;
            }
            report.skipped = skipped.len();
            if report.skipped > 0 {
                println!("Skipped {} validators not in the active list", report.skipped);
            }
            if report.delinquent > 0 {
                println!("{} of the remaining validators are delinquent", report.delinquent);
            }
            kept
        }
        None => entries,
    };
    if entries.is_empty() {
        bail!("No active validators to ban after filtering");
    }

    let total = entries.len();
    for (i, entry) in entries.into_iter().enumerate() {
        let accounts = vote_accounts::<Add>(
            program,
            keypair,
            &config,
            &entry.validator.to_string(),
            &stake_pool,
            delegated,
        )?;
        match submit("vote_add", program.vote_add(accounts, entry.validator, entry.reason.clone())) {
            Ok(()) => {
                println!(
                    "[{}/{}] Voted to ban validator {} for reason: \"{}\"",
                    i + 1,
                    total,
                    entry.validator,
                    entry.reason
                );
                report.voted += 1;
            }
            Err(err) => {
                warn!(validator = %entry.validator, error = %err, "batch vote failed");
                println!("[{}/{}] Failed to ban validator {}: {err}", i + 1, total, entry.validator);
                report.failed += 1;
            }
        }
    }

    println!(
        "Batch ban finished: {} voted, {} failed, {} skipped",
        report.voted, report.failed, report.skipped
    );
    Ok(report)
}

fn handle_set_stake_pool_command(
    program: &mut Program,
    address: String,
    manager: String,
    total_lamports: u64,
    owner: Option<String>,
) -> Result<()> {
    let address = parse_pubkey(&address, "stake pool address")?;
    let manager = parse_pubkey(&manager, "manager")?;
    let owner = owner
        .map(|owner| parse_pubkey(&owner, "owner program"))
        .transpose()?
        .unwrap_or_else(spl_stake_pool::id);

    program.store_mut().set_account(address, stake_pool_account(manager, total_lamports, owner)?);
    println!("Stake pool {address} managed by {manager} with {total_lamports} lamports");
    Ok(())
}

/// An SPL stake pool account image holding just a manager and a TVL.
fn stake_pool_account(manager: Pubkey, total_lamports: u64, owner: Pubkey) -> Result<Account> {
    let stake_pool = StakePool {
        manager,
        total_lamports,
        ..StakePool::default()
    };
    let mut data = borsh::to_vec(&stake_pool).context("Failed to encode stake pool")?;
    data.resize(stake_pool_packed_len(), 0);
    Ok(Account {
        lamports: LAMPORTS_PER_SOL,
        owner,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use validator_blacklist::oracle::StakePoolOracle;

    #[test]
    fn stake_pool_image_is_readable_by_the_oracle() {
        let mut store = MemoryStore::new();
        let address = Pubkey::new_unique();
        let manager = Pubkey::new_unique();
        store.set_account(
            address,
            stake_pool_account(manager, 42, spl_stake_pool::id()).unwrap(),
        );

        let info = SplStakePoolOracle.stake_pool(&store, &address).unwrap();
        assert_eq!(info.manager, manager);
        assert_eq!(info.total_lamports, 42);
        assert_eq!(info.owner_program, spl_stake_pool::id());
    }

    fn run(ledger: &Path, keypair: &Path, args: &[&str]) -> Result<()> {
        use clap::Parser;

        let mut argv = vec![
            "validator-blacklist-cli".to_string(),
            "--ledger".to_string(),
            ledger.display().to_string(),
            "--keypair".to_string(),
            keypair.display().to_string(),
        ];
        argv.extend(args.iter().map(|arg| arg.to_string()));
        run_command(Cli::parse_from(argv))
    }

    #[test]
    fn commands_persist_through_the_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("ledger.bin");
        let keypair = dir.path().join("id.json");
        let signer = Pubkey::new_unique();
        let mut bytes = vec![1u8; 32];
        bytes.extend_from_slice(signer.as_ref());
        fs::write(&keypair, serde_json::to_string(&bytes).unwrap()).unwrap();

        let config = Pubkey::new_unique().to_string();
        let pool = Pubkey::new_unique().to_string();
        let validator = Pubkey::new_unique().to_string();
        let signer_str = signer.to_string();
        let spl = spl_stake_pool::id().to_string();

        run(&ledger, &keypair, &["airdrop", &signer_str, "10000000000"]).unwrap();
        run(&ledger, &keypair, &["set-stake-pool", &pool, &signer_str, "2000000000"]).unwrap();
        run(&ledger, &keypair, &["create-config", &config, "1000000000", &spl]).unwrap();
        run(&ledger, &keypair, &["warp", "--slot", "99"]).unwrap();
        run(&ledger, &keypair, &["vote-add", &config, &validator, &pool, "bad"]).unwrap();

        let err = run(&ledger, &keypair, &["vote-add", &config, &validator, &pool, "again"]).unwrap_err();
        assert!(err.to_string().contains("code 0"));

        let snapshot = Snapshot::load(&ledger).unwrap();
        assert_eq!(snapshot.slot, 99);
        let program = ValidatorBlacklist::new(validator_blacklist::ID, snapshot.store, SplStakePoolOracle);
        let tallies = program.tally(&parse_pubkey(&config, "config").unwrap());
        assert_eq!(tallies.len(), 1);
        assert_eq!(tallies[0].add_votes, 1);
    }

    fn write_keypair(path: &Path) -> Pubkey {
        let signer = Pubkey::new_unique();
        let mut bytes = vec![1u8; 32];
        bytes.extend_from_slice(signer.as_ref());
        fs::write(path, serde_json::to_string(&bytes).unwrap()).unwrap();
        signer
    }

    fn program_at(ledger: &Path) -> Program {
        let snapshot = Snapshot::load(ledger).unwrap();
        let clock = snapshot.clock();
        ValidatorBlacklist::new(validator_blacklist::ID, snapshot.store, SplStakePoolOracle).with_clock(clock)
    }

    /// Ledger with a funded manager running an SPL pool above a 1 SOL threshold.
    fn manager_ledger(dir: &Path) -> (PathBuf, PathBuf, String, String) {
        let ledger = dir.join("ledger.bin");
        let keypair = dir.join("manager.json");
        let manager = write_keypair(&keypair);
        let config = Pubkey::new_unique().to_string();
        let pool = Pubkey::new_unique().to_string();
        let manager_str = manager.to_string();
        let spl = spl_stake_pool::id().to_string();

        run(&ledger, &keypair, &["airdrop", &manager_str, "10000000000"]).unwrap();
        run(&ledger, &keypair, &["set-stake-pool", &pool, &manager_str, "2000000000"]).unwrap();
        run(&ledger, &keypair, &["create-config", &config, "1000000000", &spl]).unwrap();
        (ledger, keypair, config, pool)
    }

    #[test]
    fn batch_ban_counts_votes_failures_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        let (ledger, keypair, config, pool) = manager_ledger(dir.path());
        let already_voted = Pubkey::new_unique();
        let fresh = Pubkey::new_unique();
        let unlisted = Pubkey::new_unique();
        run(&ledger, &keypair, &["vote-add", &config, &already_voted.to_string(), &pool, "earlier"]).unwrap();

        let csv = dir.path().join("bans.csv");
        fs::write(
            &csv,
            format!("validator,reason\n{already_voted},sandwiching\n{fresh},private mempool\n{unlisted},gone\n"),
        )
        .unwrap();
        let listing = dir.path().join("validators.txt");
        fs::write(
            &listing,
            format!(
                "   Identity   Vote Account   Commission\n  {already_voted}  {}  5%\n{}{fresh}  {}  100%\n",
                Pubkey::new_unique(),
                "\u{26a0}\u{fe0f}",
                Pubkey::new_unique()
            ),
        )
        .unwrap();

        let mut program = program_at(&ledger);
        let report = handle_batch_ban_command(
            &mut program,
            Some(&keypair),
            config.clone(),
            pool,
            &csv,
            Some(&listing),
            false,
        )
        .unwrap();
        assert_eq!(
            report,
            BatchBanReport {
                voted: 1,
                failed: 1,
                skipped: 1,
                delinquent: 1,
            }
        );

        let tallies = program.tally(&parse_pubkey(&config, "config").unwrap());
        assert_eq!(tallies.len(), 2);
        for validator in [already_voted, fresh] {
            let tally = tallies.iter().find(|tally| tally.validator == validator).unwrap();
            assert_eq!(tally.add_votes, 1);
        }
        assert!(tallies.iter().all(|tally| tally.validator != unlisted));
    }

    #[test]
    fn delegate_votes_for_the_pool() {
        let dir = tempfile::tempdir().unwrap();
        let (ledger, manager_keypair, config, pool) = manager_ledger(dir.path());
        let delegate_keypair = dir.path().join("delegate.json");
        let delegate = write_keypair(&delegate_keypair).to_string();
        let validator = Pubkey::new_unique();
        let batched = Pubkey::new_unique();

        run(&ledger, &manager_keypair, &["airdrop", &delegate, "1000000000"]).unwrap();
        run(&ledger, &manager_keypair, &["delegate", &config, &pool, &delegate]).unwrap();

        // Without the flag the delegate is just a stranger
        let err = run(
            &ledger,
            &delegate_keypair,
            &["vote-add", &config, &validator.to_string(), &pool, "x"],
        )
        .unwrap_err();
        assert!(err.to_string().contains("code 6000"));

        run(
            &ledger,
            &delegate_keypair,
            &["vote-add", &config, &validator.to_string(), &pool, "x", "--delegated"],
        )
        .unwrap();

        let csv = dir.path().join("bans.csv");
        fs::write(&csv, format!("{batched},y\n")).unwrap();
        run(
            &ledger,
            &delegate_keypair,
            &["batch-ban", &config, &pool, &csv.display().to_string(), "--delegated"],
        )
        .unwrap();

        let tallies = program_at(&ledger).tally(&parse_pubkey(&config, "config").unwrap());
        assert_eq!(tallies.len(), 2);
        assert!(tallies.iter().all(|tally| tally.add_votes == 1));
    }

    #[test]
    fn signing_commands_need_a_keypair() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let config = Pubkey::new_unique().to_string();
        let spl = spl_stake_pool::id().to_string();
        assert!(run(&dir.path().join("ledger.bin"), &missing, &["create-config", &config, "0", &spl]).is_err());
        assert!(!dir.path().join("ledger.bin").exists());
    }

    #[test]
    fn processor_errors_keep_their_code() {
        let err = submit(
            "vote_add",
            Err(validator_blacklist::error::ValidatorBlacklistError::InsufficientTvl.into()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("code 6007"));
    }
}
