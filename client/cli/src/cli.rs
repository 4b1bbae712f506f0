use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "validator-blacklist-cli")]
#[command(about = "A CLI tool for operating a local validator blacklist ledger")]
pub struct Cli {
    /// Ledger snapshot file
    #[arg(long, default_value = "validator-blacklist-ledger.bin")]
    pub ledger: PathBuf,

    /// Program ID of the validator blacklist program
    #[arg(short, long)]
    pub program_id: Option<String>,

    /// Keypair file path for the signing authority
    #[arg(short, long)]
    pub keypair: Option<PathBuf>,

    /// Log filter directive, e.g. `info` or `validator_blacklist=debug`
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List validators with live votes and their vote tallies
    List {
        /// Config account address
        config: String,
    },

    /// Create the global configuration account
    CreateConfig {
        /// Config account address
        config: String,
        /// Minimum TVL required for stake pools
        min_tvl: u64,
        /// Comma-separated list of allowed stake pool program IDs
        #[arg(value_delimiter = ',')]
        allowed_programs: Vec<String>,
        /// Admin of the new config (defaults to the signer)
        #[arg(long)]
        admin: Option<String>,
    },

    /// Update the config settings (min_tvl and/or allowed_programs)
    UpdateConfig {
        /// Config account address
        config: String,
        /// New minimum TVL (optional)
        #[arg(long)]
        min_tvl: Option<u64>,
        /// Comma-separated list of new allowed stake pool program IDs (optional)
        #[arg(long, value_delimiter = ',')]
        allowed_programs: Option<Vec<String>>,
    },

    /// Update the admin of the config
    UpdateConfigAdmin {
        /// Config account address
        config: String,
        /// New admin pubkey
        new_admin: String,
    },

    /// Vote to add a validator to the blacklist
    VoteAdd {
        /// Config account address
        config: String,
        /// Validator identity address to blacklist
        validator_address: String,
        /// Stake pool address casting the vote
        stake_pool: String,
        /// Reason for blacklisting
        reason: String,
        /// Vote through the stake pool's delegation
        #[arg(long)]
        delegated: bool,
    },

    /// Vote to remove a validator from the blacklist
    VoteRemove {
        /// Config account address
        config: String,
        /// Validator identity address to remove from blacklist
        validator_address: String,
        /// Stake pool address casting the vote
        stake_pool: String,
        /// Reason for removal
        reason: String,
        /// Vote through the stake pool's delegation
        #[arg(long)]
        delegated: bool,
    },

    /// Remove a previously cast vote to add a validator
    UnvoteAdd {
        /// Config account address
        config: String,
        /// Validator identity address
        validator_address: String,
        /// Stake pool address that cast the vote
        stake_pool: String,
        /// Act through the stake pool's delegation
        #[arg(long)]
        delegated: bool,
    },

    /// Remove a previously cast vote to remove a validator
    UnvoteRemove {
        /// Config account address
        config: String,
        /// Validator identity address
        validator_address: String,
        /// Stake pool address that cast the vote
        stake_pool: String,
        /// Act through the stake pool's delegation
        #[arg(long)]
        delegated: bool,
    },

    /// Create a delegation from stake pool manager to another authority
    Delegate {
        /// Config account address
        config: String,
        /// Stake pool address
        stake_pool: String,
        /// Address to delegate authority to
        delegate: String,
    },

    /// Remove a delegation
    Undelegate {
        /// Config account address
        config: String,
        /// Stake pool address
        stake_pool: String,
    },

    /// Vote to add every validator listed in a CSV file
    BatchBan {
        /// Config account address
        config: String,
        /// Stake pool address casting the votes
        stake_pool: String,
        /// CSV file of `validator,reason` rows
        file: PathBuf,
        /// Output of `solana validators`; validators missing from it are skipped
        #[arg(long)]
        validators_file: Option<PathBuf>,
        /// Vote through the stake pool's delegation
        #[arg(long)]
        delegated: bool,
    },

    /// Credit lamports to an address on the local ledger
    Airdrop {
        address: String,
        lamports: u64,
    },

    /// Write a stake pool account onto the local ledger
    SetStakePool {
        /// Stake pool address
        address: String,
        /// Pool manager
        manager: String,
        /// Total lamports under management
        total_lamports: u64,
        /// Program owning the pool account (defaults to the SPL stake pool program)
        #[arg(long)]
        owner: Option<String>,
    },

    /// Move the ledger clock
    Warp {
        #[arg(long)]
        slot: Option<u64>,
        #[arg(long)]
        unix_timestamp: Option<i64>,
    },
}
