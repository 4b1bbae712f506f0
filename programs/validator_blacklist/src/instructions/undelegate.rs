use anchor_lang::prelude::Pubkey;
use tracing::info;

use crate::context::Context;
use crate::error::{Result, ValidatorBlacklistError};
use crate::pda;
use crate::state::Delegation;

#[derive(Clone, Debug)]
pub struct Undelegate {
    pub config: Pubkey,
    pub stake_pool: Pubkey,
    pub delegation: Pubkey,
    /// Signer, must match the manager recorded on the delegation. Receives
    /// the delegation's rent.
    pub manager: Pubkey,
}

/// Remove delegation of authority.
///
/// Checked against the manager captured when the delegation was created,
/// not the pool's current manager.
pub fn undelegate(ctx: &mut Context<'_>, accounts: &Undelegate) -> Result<()> {
    pda::require_derived(
        &accounts.delegation,
        pda::delegation_address(ctx.program_id, &accounts.config, &accounts.stake_pool),
    )?;

    let delegation: Delegation = ctx.load(&accounts.delegation)?;
    if delegation.manager != accounts.manager {
        return Err(ValidatorBlacklistError::Unauthorized.into());
    }

    let refunded = ctx.close(&accounts.delegation, &accounts.manager)?;

    info!(
        stake_pool = %accounts.stake_pool,
        manager = %accounts.manager,
        delegate = %delegation.delegate,
        refunded,
        "delegation removed"
    );

    Ok(())
}
