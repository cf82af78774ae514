use anchor_lang::prelude::*;

#[event]
pub struct CoreCreatedEvent {
    pub core: Pubkey,
    pub authority: Pubkey,
    pub fee_treasury: Pubkey,
    pub deposit_fee_rate: u64,
    pub timestamp: u64,
}

#[event]
pub struct CoreStatusEvent {
    pub core: Pubkey,
    pub active: bool,
    pub reason: [u8; 32],
    pub timestamp: u64,
}

#[event]
pub struct AssetInitializedEvent {
    pub core: Pubkey,
    pub asset: Pubkey,
    pub wrapped_mint: Pubkey,
    pub vault_state: Pubkey,
    pub share_mint: Pubkey,
    pub timestamp: u64,
}

#[event]
pub struct AssetStreamingEvent {
    pub asset: Pubkey,
    pub enabled: bool,
    pub timestamp: u64,
}

#[event]
pub struct StreamStartedEvent {
    pub asset: Pubkey,
    pub position: Pubkey,
    pub depositor: Pubkey,
    pub rate: u128,
    pub escrowed_amount: u64,
    pub upfront_fee: u128,
    pub index_id: u32,
    pub timestamp: u64,
}

#[event]
pub struct StreamFundedEvent {
    pub asset: Pubkey,
    pub position: Pubkey,
    pub depositor: Pubkey,
    pub amount: u64,
    pub streamable_units: u128,
    pub timestamp: u64,
}

#[event]
pub struct StreamUpdatedEvent {
    pub asset: Pubkey,
    pub position: Pubkey,
    pub depositor: Pubkey,
    pub old_rate: u128,
    pub new_rate: u128,
    pub upfront_fee: u128,
    pub refunded_amount: u64,
    pub timestamp: u64,
}

#[event]
pub struct StreamTerminatedEvent {
    pub asset: Pubkey,
    pub position: Pubkey,
    pub depositor: Pubkey,
    pub refunded_amount: u64,
    pub timestamp: u64,
}

#[event]
pub struct EmergencyCloseEvent {
    pub asset: Pubkey,
    pub position: Pubkey,
    pub depositor: Pubkey,
    pub caller: Pubkey,
    pub runway_seconds: u64,
    pub refunded_amount: u64,
    pub timestamp: u64,
}

#[event]
pub struct DepositEvent {
    pub asset: Pubkey,
    pub locked_index_id: u32,
    pub swept_positions: u64,
    pub gross_amount: u64,
    pub fee_amount: u64,
    pub shares_received: u64,
    pub timestamp: u64,
}

#[event]
pub struct DistributeEvent {
    pub asset: Pubkey,
    pub index_id: u32,
    pub members_paid: u64,
    pub shares_distributed: u64,
    pub carry_shares: u64,
    pub timestamp: u64,
}

#[event]
pub struct UpkeepEvent {
    pub asset: Pubkey,
    pub deposit_due: bool,
    pub distribution_due: bool,
    pub estimated_accrued: u128,
    pub pending_shares: u64,
    pub timestamp: u64,
}

#[event]
pub struct UninvestedEvent {
    pub asset: Pubkey,
    pub position: Pubkey,
    pub depositor: Pubkey,
    pub uninvested_units: u128,
    pub timestamp: u64,
}
