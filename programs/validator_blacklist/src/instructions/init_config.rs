use anchor_lang::prelude::Pubkey;
use tracing::info;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::state::Config;

#[derive(Clone, Debug)]
pub struct InitConfig {
    /// Fresh address chosen by the caller
    pub config: Pubkey,
    /// Pays rent for the config account
    pub payer: Pubkey,
}

/// Initialize the global configuration
pub fn init_config(
    ctx: &mut Context<'_>,
    accounts: &InitConfig,
    admin: Pubkey,
    min_tvl: u64,
    allowed_programs: Vec<Pubkey>,
) -> Result<()> {
    let config = Config::new(admin, min_tvl, allowed_programs);

    ctx.init(&accounts.payer, &accounts.config, &config, Error::ConfigAlreadyInitialized)?;

    info!(
        config = %accounts.config,
        admin = %config.admin,
        min_tvl,
        allowed_programs = config.allowed_programs.len(),
        "config initialized"
    );

    Ok(())
}
