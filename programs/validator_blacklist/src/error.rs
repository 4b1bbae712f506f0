use anchor_lang::prelude::Pubkey;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Program level failures. The discriminants are the custom error codes
/// clients match on and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[repr(u32)]
pub enum ValidatorBlacklistError {
    #[error("Unauthorized signer - must be manager or valid delegate")]
    Unauthorized = 6000,
    #[error("Invalid stake pool account")]
    InvalidStakePool = 6001,
    #[error("Invalid delegation for this stake pool or signer")]
    InvalidDelegation = 6002,
    #[error("The reason field exceeds the maximum allowed length")]
    ReasonTooLong = 6006,
    #[error("Stake pool does not meet minimum TVL requirement")]
    InsufficientTvl = 6007,
    #[error("Stake pool program is not in the allowed programs list")]
    UnauthorizedStakePoolProgram = 6008,
    #[error("Only the admin can perform this action")]
    UnauthorizedAdmin = 6009,
}

impl ValidatorBlacklistError {
    pub fn code(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Program(#[from] ValidatorBlacklistError),

    #[error("config account {0} is already initialized")]
    ConfigAlreadyInitialized(Pubkey),

    #[error("delegation {0} already exists")]
    AlreadyDelegated(Pubkey),

    #[error("vote record {0} already exists")]
    AlreadyVoted(Pubkey),

    #[error("account {address} has {available} lamports, {required} required")]
    InsufficientFunds {
        address: Pubkey,
        required: u64,
        available: u64,
    },

    #[error("seeds constraint was violated: expected {expected}, got {actual}")]
    ConstraintSeeds { expected: Pubkey, actual: Pubkey },

    #[error("account {0} has the wrong discriminator")]
    AccountDiscriminatorMismatch(Pubkey),

    #[error("account {0} did not deserialize")]
    AccountDidNotDeserialize(Pubkey),

    #[error("account {0} did not serialize")]
    AccountDidNotSerialize(Pubkey),

    #[error("account {address} is owned by {actual}, expected {expected}")]
    AccountOwnedByWrongProgram {
        address: Pubkey,
        expected: Pubkey,
        actual: Pubkey,
    },

    #[error("account {0} is not initialized")]
    AccountNotInitialized(Pubkey),
}

impl Error {
    /// Numeric code as a host would report it: program codes from 6000,
    /// framework constraint codes from 2000/3000, system codes below 100.
    pub fn code(&self) -> u32 {
        match self {
            Error::Program(err) => err.code(),
            Error::ConfigAlreadyInitialized(_)
            | Error::AlreadyDelegated(_)
            | Error::AlreadyVoted(_) => 0,
            Error::InsufficientFunds { .. } => 1,
            Error::ConstraintSeeds { .. } => 2006,
            Error::AccountDiscriminatorMismatch(_) => 3002,
            Error::AccountDidNotDeserialize(_) => 3003,
            Error::AccountDidNotSerialize(_) => 3004,
            Error::AccountOwnedByWrongProgram { .. } => 3007,
            Error::AccountNotInitialized(_) => 3012,
        }
    }
}
