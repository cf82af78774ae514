// Fee constants
pub const PERCENT_DENOMINATOR: u64 = 1_000_000;
/// Upper bound for the deposit fee configured at core creation (5%)
pub const MAX_DEPOSIT_PERCENT_FEE: u64 = 50_000;

// Ledger precision
/// All internal value accounting is done with 18 decimals regardless of the
/// wrapped mint decimals. Token-side amounts are scaled down and floored.
pub const VALUE_DECIMALS: u8 = 18;

// Business-logic durations (seconds)
/// Forward-looking window used to price the upfront fee on rate increases
pub const COMMITMENT_HORIZON_SECONDS: u64 = 30 * 24 * 60 * 60;
/// A stream whose escrow sustains it for less than this is force-closable
pub const EMERGENCY_BUFFER_SECONDS: u64 = 12 * 60 * 60;
/// Minimum time between two conversions of the same asset
pub const MIN_CONVERSION_INTERVAL_SECONDS: u64 = 60 * 60;
/// Vault shares received on deposit stay locked for this long
pub const SHARE_EXIT_COOLDOWN_SECONDS: u64 = 24 * 60 * 60;

/// Minimum accrued value (18 decimals) that justifies a conversion
pub const MIN_CONVERSION_VALUE: u128 = 1_000_000_000_000_000_000;

// PDA seeds
pub const CORE_SEED: &[u8] = b"core";
pub const ASSET_SEED: &[u8] = b"asset";
pub const POSITION_SEED: &[u8] = b"position";

// Account sizes (fixed, validated in the account constraints)
pub const CORE_ACCOUNT_SIZE: usize = 300;
pub const ASSET_ACCOUNT_SIZE: usize = 500;
pub const POSITION_ACCOUNT_SIZE: usize = 300;
