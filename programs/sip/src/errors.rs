use anchor_lang::prelude::*;

#[error_code]
pub enum ErrorCode {
    #[msg("Not Authorized")]
    NotAuthorized,
    #[msg("Overflow")]
    Overflow,
    #[msg("Invalid argument")]
    InvalidArgument,
    #[msg("The string length is larger than 32 bytes")]
    StringTooLong,
    // Core
    #[msg("Core is not initialized")]
    CoreNotInitialized,
    #[msg("Core is deactivated")]
    CoreInactive,
    #[msg("Core is already active")]
    CoreAlreadyActive,
    #[msg("Invalid deposit fee rate")]
    InvalidFeeRate,
    #[msg("Invalid fee treasury account")]
    InvalidFeeTreasuryAccount,
    // Asset
    #[msg("Asset is not accepted for streaming")]
    UnsupportedAsset,
    #[msg("Streaming is disabled for this asset")]
    StreamingDisabled,
    #[msg("Asset is not initialized")]
    AssetNotInitialized,
    #[msg("Invalid wrapped mint decimals")]
    InvalidWrappedDecimals,
    // Stream
    #[msg("A stream already exists for this depositor and asset")]
    StreamAlreadyExists,
    #[msg("No stream exists for this depositor and asset")]
    StreamNotFound,
    #[msg("Invalid stream rate")]
    InvalidStreamRate,
    #[msg("Contribution amount is zero")]
    ZeroContributionAmount,
    #[msg("Insufficient streamable balance")]
    InsufficientStreamableBalance,
    #[msg("Stream has a pending distribution that must be settled first")]
    PendingDistributionForDepositor,
    // Conversion
    #[msg("Accrued value below the minimum conversion amount")]
    NotEnoughAccrued,
    #[msg("Conversion cooldown has not elapsed")]
    ConversionCooldown,
    #[msg("A previous conversion is still awaiting distribution")]
    DistributionPending,
    #[msg("No shares were received from the vault")]
    NoSharesReceived,
    #[msg("A conversion sweep is in progress")]
    SweepInProgress,
    // Distribution
    #[msg("Vault shares are still in the exit cooldown")]
    SharesLocked,
    #[msg("Provided member accounts do not match the index membership")]
    MemberAccountsMismatch,
    #[msg("Member positions must be provided in strictly ascending key order")]
    UnsortedMemberAccounts,
    #[msg("Position is not a member of the locked index")]
    NotAMember,
    #[msg("Invalid position account")]
    InvalidPositionAccount,
    #[msg("Invalid member share token account")]
    InvalidMemberShareAccount,
    #[msg("Position was already settled in this conversion")]
    PositionAlreadySettled,
    // Emergency
    #[msg("Stream is not eligible for emergency close")]
    NotEligibleForEmergencyClose,
}
