use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::ErrorCode;

/// Global protocol configuration. One per authority, created once by the
/// DAO; every asset hangs off a core.
#[account]
pub struct Core {
    pub initialized: bool,
    pub bump: u8,
    /// The DAO. Only account allowed to register assets and flip the
    /// active switch.
    pub authority: Pubkey,
    /// Owner of the token accounts that collect the deposit fee
    pub fee_treasury: Pubkey,
    /// Deposit fee in parts per million of the gross converted amount
    pub deposit_fee_rate: u64,
    pub active: bool,
    /// Why the core was deactivated, empty while active
    pub deactivation_reason: [u8; 32],
    pub asset_count: u64,
    pub created_on_utc: u64,
}

impl Core {
    /// Fails unless the core is initialized and active. Gates the
    /// operations that bring new value in or convert it.
    pub fn assert_active(&self) -> Result<()> {
        self.assert_initialized()?;
        if !self.active {
            return Err(ErrorCode::CoreInactive.into());
        }
        Ok(())
    }

    /// Terminations and payouts of already-converted value stay available
    /// while the core is deactivated; they only need an initialized core.
    pub fn assert_initialized(&self) -> Result<()> {
        if !self.initialized {
            return Err(ErrorCode::CoreNotInitialized.into());
        }
        Ok(())
    }

    pub fn validate_fee_rate(fee_rate: u64) -> Result<()> {
        if fee_rate > MAX_DEPOSIT_PERCENT_FEE {
            return Err(ErrorCode::InvalidFeeRate.into());
        }
        Ok(())
    }
}
