use anchor_lang::prelude::*;
use anchor_spl::associated_token::*;
use anchor_spl::token::*;

use crate::asset::*;
use crate::constants::*;
use crate::core::*;
use crate::errors::ErrorCode;
use crate::position::*;

/// Create Core
#[derive(Accounts, Clone)]
pub struct CreateCoreAccounts<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    /// The DAO that will govern the core
    pub authority: Signer<'info>,
    #[account(
        init,
        payer = payer,
        seeds = [CORE_SEED, authority.key().as_ref()],
        bump,
        space = CORE_ACCOUNT_SIZE
    )]
    pub core: Account<'info, Core>,
    /// CHECK: only stored as the owner the fee token accounts must have
    pub fee_treasury: UncheckedAccount<'info>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

/// Initialize Stream Asset
#[derive(Accounts, Clone)]
pub struct InitStreamAssetAccounts<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    #[account(constraint = authority.key() == core.authority @ ErrorCode::NotAuthorized)]
    pub authority: Signer<'info>,
    #[account(
        mut,
        seeds = [CORE_SEED, core.authority.as_ref()],
        bump = core.bump,
        constraint = core.initialized == true @ ErrorCode::CoreNotInitialized
    )]
    pub core: Account<'info, Core>,
    pub wrapped_mint: Box<Account<'info, Mint>>,
    #[account(
        init,
        payer = payer,
        seeds = [ASSET_SEED, core.key().as_ref(), wrapped_mint.key().as_ref()],
        bump,
        space = ASSET_ACCOUNT_SIZE
    )]
    pub asset: Account<'info, StreamAsset>,
    #[account(
        init,
        payer = payer,
        associated_token::mint = wrapped_mint,
        associated_token::authority = asset
    )]
    pub escrow: Box<Account<'info, TokenAccount>>,
    pub share_mint: Box<Account<'info, Mint>>,
    #[account(
        init,
        payer = payer,
        associated_token::mint = share_mint,
        associated_token::authority = asset
    )]
    pub share_account: Box<Account<'info, TokenAccount>>,
    /// CHECK: external vault program, recorded and matched on every deposit
    pub vault_program: UncheckedAccount<'info>,
    /// CHECK: validated by the vault program on CPI
    pub vault_state: UncheckedAccount<'info>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

/// Start Stream
#[derive(Accounts, Clone)]
pub struct StartStreamAccounts<'info> {
    #[account(mut)]
    pub depositor: Signer<'info>,
    #[account(
        seeds = [CORE_SEED, core.authority.as_ref()],
        bump = core.bump
    )]
    pub core: Account<'info, Core>,
    #[account(
        mut,
        seeds = [ASSET_SEED, core.key().as_ref(), asset.wrapped_mint.as_ref()],
        bump = asset.bump,
        constraint = asset.initialized == true @ ErrorCode::AssetNotInitialized,
        constraint = asset.core == core.key() @ ErrorCode::UnsupportedAsset,
        constraint = asset.streaming_enabled == true @ ErrorCode::StreamingDisabled
    )]
    pub asset: Account<'info, StreamAsset>,
    #[account(
        init_if_needed,
        payer = depositor,
        seeds = [POSITION_SEED, asset.key().as_ref(), depositor.key().as_ref()],
        bump,
        space = POSITION_ACCOUNT_SIZE
    )]
    pub position: Account<'info, StreamPosition>,
    #[account(
        mut,
        constraint = depositor_token.owner == depositor.key() @ ErrorCode::NotAuthorized,
        constraint = depositor_token.mint == asset.wrapped_mint @ ErrorCode::UnsupportedAsset
    )]
    pub depositor_token: Box<Account<'info, TokenAccount>>,
    #[account(mut, address = asset.escrow @ ErrorCode::InvalidArgument)]
    pub escrow: Box<Account<'info, TokenAccount>>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

/// Fund Stream
#[derive(Accounts, Clone)]
pub struct FundStreamAccounts<'info> {
    #[account(mut)]
    pub depositor: Signer<'info>,
    #[account(
        seeds = [CORE_SEED, core.authority.as_ref()],
        bump = core.bump
    )]
    pub core: Account<'info, Core>,
    #[account(
        mut,
        seeds = [ASSET_SEED, core.key().as_ref(), asset.wrapped_mint.as_ref()],
        bump = asset.bump,
        constraint = asset.core == core.key() @ ErrorCode::UnsupportedAsset
    )]
    pub asset: Account<'info, StreamAsset>,
    #[account(
        mut,
        seeds = [POSITION_SEED, asset.key().as_ref(), depositor.key().as_ref()],
        bump = position.bump,
        constraint = position.initialized == true @ ErrorCode::StreamNotFound,
        constraint = position.depositor == depositor.key() @ ErrorCode::NotAuthorized
    )]
    pub position: Account<'info, StreamPosition>,
    #[account(
        mut,
        constraint = depositor_token.owner == depositor.key() @ ErrorCode::NotAuthorized,
        constraint = depositor_token.mint == asset.wrapped_mint @ ErrorCode::UnsupportedAsset
    )]
    pub depositor_token: Box<Account<'info, TokenAccount>>,
    #[account(mut, address = asset.escrow @ ErrorCode::InvalidArgument)]
    pub escrow: Box<Account<'info, TokenAccount>>,
    pub token_program: Program<'info, Token>,
}

/// Update Stream / Terminate Stream
#[derive(Accounts, Clone)]
pub struct UpdateStreamAccounts<'info> {
    #[account(mut)]
    pub depositor: Signer<'info>,
    #[account(
        seeds = [CORE_SEED, core.authority.as_ref()],
        bump = core.bump
    )]
    pub core: Account<'info, Core>,
    #[account(
        mut,
        seeds = [ASSET_SEED, core.key().as_ref(), asset.wrapped_mint.as_ref()],
        bump = asset.bump,
        constraint = asset.core == core.key() @ ErrorCode::UnsupportedAsset
    )]
    pub asset: Account<'info, StreamAsset>,
    #[account(
        mut,
        seeds = [POSITION_SEED, asset.key().as_ref(), depositor.key().as_ref()],
        bump = position.bump,
        constraint = position.initialized == true @ ErrorCode::StreamNotFound,
        constraint = position.depositor == depositor.key() @ ErrorCode::NotAuthorized
    )]
    pub position: Account<'info, StreamPosition>,
    /// Refund destination for released escrow
    #[account(
        mut,
        constraint = depositor_token.owner == depositor.key() @ ErrorCode::NotAuthorized,
        constraint = depositor_token.mint == asset.wrapped_mint @ ErrorCode::UnsupportedAsset
    )]
    pub depositor_token: Box<Account<'info, TokenAccount>>,
    #[account(mut, address = asset.escrow @ ErrorCode::InvalidArgument)]
    pub escrow: Box<Account<'info, TokenAccount>>,
    pub token_program: Program<'info, Token>,
}

/// Emergency Close Stream. Callable by anyone; the refund always goes to
/// the depositor recorded on the position.
#[derive(Accounts, Clone)]
pub struct EmergencyCloseStreamAccounts<'info> {
    #[account(mut)]
    pub caller: Signer<'info>,
    #[account(
        seeds = [CORE_SEED, core.authority.as_ref()],
        bump = core.bump
    )]
    pub core: Account<'info, Core>,
    #[account(
        mut,
        seeds = [ASSET_SEED, core.key().as_ref(), asset.wrapped_mint.as_ref()],
        bump = asset.bump,
        constraint = asset.core == core.key() @ ErrorCode::UnsupportedAsset
    )]
    pub asset: Account<'info, StreamAsset>,
    #[account(
        mut,
        seeds = [POSITION_SEED, asset.key().as_ref(), position.depositor.as_ref()],
        bump = position.bump,
        constraint = position.initialized == true @ ErrorCode::StreamNotFound
    )]
    pub position: Account<'info, StreamPosition>,
    #[account(
        mut,
        constraint = depositor_token.owner == position.depositor @ ErrorCode::NotAuthorized,
        constraint = depositor_token.mint == asset.wrapped_mint @ ErrorCode::UnsupportedAsset
    )]
    pub depositor_token: Box<Account<'info, TokenAccount>>,
    #[account(mut, address = asset.escrow @ ErrorCode::InvalidArgument)]
    pub escrow: Box<Account<'info, TokenAccount>>,
    pub token_program: Program<'info, Token>,
}

/// Deposit (conversion). Remaining accounts: a batch of writable positions
/// not yet swept into the in-progress sweep, in any order. The call that
/// sweeps the last member settles the conversion.
#[derive(Accounts, Clone)]
pub struct DepositAccounts<'info> {
    #[account(mut)]
    pub caller: Signer<'info>,
    #[account(
        seeds = [CORE_SEED, core.authority.as_ref()],
        bump = core.bump
    )]
    pub core: Account<'info, Core>,
    #[account(
        mut,
        seeds = [ASSET_SEED, core.key().as_ref(), asset.wrapped_mint.as_ref()],
        bump = asset.bump,
        constraint = asset.core == core.key() @ ErrorCode::UnsupportedAsset
    )]
    pub asset: Account<'info, StreamAsset>,
    #[account(mut, address = asset.escrow @ ErrorCode::InvalidArgument)]
    pub escrow: Box<Account<'info, TokenAccount>>,
    /// Collects the deposit fee in wrapped tokens
    #[account(
        mut,
        constraint = fee_account.owner == core.fee_treasury @ ErrorCode::InvalidFeeTreasuryAccount,
        constraint = fee_account.mint == asset.wrapped_mint @ ErrorCode::InvalidFeeTreasuryAccount
    )]
    pub fee_account: Box<Account<'info, TokenAccount>>,
    /// CHECK: matched against the program recorded on the asset
    #[account(address = asset.vault_program @ ErrorCode::InvalidArgument)]
    pub vault_program: UncheckedAccount<'info>,
    /// CHECK: matched against the state recorded on the asset
    #[account(mut, address = asset.vault_state @ ErrorCode::InvalidArgument)]
    pub vault_state: UncheckedAccount<'info>,
    /// CHECK: the vault's custody account, validated by the vault program
    #[account(mut)]
    pub vault_token_account: UncheckedAccount<'info>,
    /// CHECK: matched against the mint recorded on the asset
    #[account(mut, address = asset.share_mint @ ErrorCode::InvalidArgument)]
    pub share_mint: UncheckedAccount<'info>,
    #[account(mut, address = asset.share_account @ ErrorCode::InvalidArgument)]
    pub share_account: Box<Account<'info, TokenAccount>>,
    pub token_program: Program<'info, Token>,
}

/// Distribute. Remaining accounts: for every member of the locked index, a
/// writable position followed by the member's share token account.
#[derive(Accounts, Clone)]
pub struct DistributeAccounts<'info> {
    #[account(mut)]
    pub caller: Signer<'info>,
    #[account(
        seeds = [CORE_SEED, core.authority.as_ref()],
        bump = core.bump
    )]
    pub core: Account<'info, Core>,
    #[account(
        mut,
        seeds = [ASSET_SEED, core.key().as_ref(), asset.wrapped_mint.as_ref()],
        bump = asset.bump,
        constraint = asset.core == core.key() @ ErrorCode::UnsupportedAsset
    )]
    pub asset: Account<'info, StreamAsset>,
    #[account(mut, address = asset.share_account @ ErrorCode::InvalidArgument)]
    pub share_account: Box<Account<'info, TokenAccount>>,
    pub token_program: Program<'info, Token>,
}

/// Require Upkeep (read-only query, reports through an event).
/// Remaining accounts: the assets to inspect, in priority order.
#[derive(Accounts, Clone)]
pub struct RequireUpkeepAccounts<'info> {
    #[account(
        seeds = [CORE_SEED, core.authority.as_ref()],
        bump = core.bump
    )]
    pub core: Account<'info, Core>,
}

/// Calc User Uninvested (read-only query, reports through an event)
#[derive(Accounts, Clone)]
pub struct CalcUserUninvestedAccounts<'info> {
    #[account(
        seeds = [ASSET_SEED, asset.core.as_ref(), asset.wrapped_mint.as_ref()],
        bump = asset.bump
    )]
    pub asset: Account<'info, StreamAsset>,
    #[account(
        seeds = [POSITION_SEED, asset.key().as_ref(), position.depositor.as_ref()],
        bump = position.bump,
        constraint = position.initialized == true @ ErrorCode::StreamNotFound
    )]
    pub position: Account<'info, StreamPosition>,
}

/// Deactivate / Reactivate Core
#[derive(Accounts, Clone)]
pub struct SetCoreStatusAccounts<'info> {
    #[account(constraint = authority.key() == core.authority @ ErrorCode::NotAuthorized)]
    pub authority: Signer<'info>,
    #[account(
        mut,
        seeds = [CORE_SEED, core.authority.as_ref()],
        bump = core.bump,
        constraint = core.initialized == true @ ErrorCode::CoreNotInitialized
    )]
    pub core: Account<'info, Core>,
}

/// Toggle streaming for an asset
#[derive(Accounts, Clone)]
pub struct SetAssetStreamingAccounts<'info> {
    #[account(constraint = authority.key() == core.authority @ ErrorCode::NotAuthorized)]
    pub authority: Signer<'info>,
    #[account(
        seeds = [CORE_SEED, core.authority.as_ref()],
        bump = core.bump
    )]
    pub core: Account<'info, Core>,
    #[account(
        mut,
        seeds = [ASSET_SEED, core.key().as_ref(), asset.wrapped_mint.as_ref()],
        bump = asset.bump,
        constraint = asset.core == core.key() @ ErrorCode::UnsupportedAsset
    )]
    pub asset: Account<'info, StreamAsset>,
}
