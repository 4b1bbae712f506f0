use anchor_lang::prelude::Pubkey;
use tracing::info;

use crate::context::Context;
use crate::error::Result;
use crate::instructions::update_config::load_as_admin;

#[derive(Clone, Debug)]
pub struct UpdateConfigAdmin {
    pub config: Pubkey,
    /// Must match the config's current admin
    pub admin: Pubkey,
}

/// Update the admin of the config
pub fn update_config_admin(
    ctx: &mut Context<'_>,
    accounts: &UpdateConfigAdmin,
    new_admin: Pubkey,
) -> Result<()> {
    let mut config = load_as_admin(ctx, &accounts.config, &accounts.admin)?;

    config.admin = new_admin;
    ctx.save(&accounts.config, &config)?;

    info!(config = %accounts.config, %new_admin, "config admin updated");

    Ok(())
}
