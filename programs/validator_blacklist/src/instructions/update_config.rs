use anchor_lang::prelude::Pubkey;
use tracing::info;

use crate::context::Context;
use crate::error::{Result, ValidatorBlacklistError};
use crate::state::Config;

#[derive(Clone, Debug)]
pub struct UpdateConfig {
    pub config: Pubkey,
    /// Must match the config's admin
    pub admin: Pubkey,
}

/// Loads the config and checks `admin` is its admin.
pub(crate) fn load_as_admin(ctx: &Context<'_>, config: &Pubkey, admin: &Pubkey) -> Result<Config> {
    let config: Config = ctx.load(config)?;
    if config.admin != *admin {
        return Err(ValidatorBlacklistError::UnauthorizedAdmin.into());
    }
    Ok(config)
}

/// Update the config settings (min_tvl and allowed_programs). Omitted
/// fields are left as they are; records admitted earlier are untouched.
pub fn update_config(
    ctx: &mut Context<'_>,
    accounts: &UpdateConfig,
    min_tvl: Option<u64>,
    allowed_programs: Option<Vec<Pubkey>>,
) -> Result<()> {
    let mut config = load_as_admin(ctx, &accounts.config, &accounts.admin)?;

    if let Some(min_tvl) = min_tvl {
        config.min_tvl = min_tvl;
        info!(config = %accounts.config, min_tvl, "config min_tvl updated");
    }

    if let Some(allowed_programs) = allowed_programs {
        config.set_allowed_programs(allowed_programs);
        info!(
            config = %accounts.config,
            allowed_programs = config.allowed_programs.len(),
            "config allowed_programs updated"
        );
    }

    ctx.save(&accounts.config, &config)
}
