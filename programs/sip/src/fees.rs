use anchor_lang::prelude::*;

use crate::constants::*;
use crate::enums::RateSettlement;
use crate::errors::ErrorCode;

/// Value (18 decimals) streamed at `rate` units per second over `seconds`
pub fn accrue(rate: u128, seconds: u64) -> Result<u128> {
    rate.checked_mul(seconds as u128).ok_or_else(|| ErrorCode::Overflow.into())
}

/// Upfront fee charged when a stream speeds up from `old_rate` to
/// `new_rate`: the rate increase priced over the commitment horizon.
/// Returns zero when the rate does not increase.
pub fn upfront_fee(old_rate: u128, new_rate: u128, horizon_seconds: u64) -> Result<u128> {
    if new_rate <= old_rate {
        return Ok(0);
    }
    let delta = new_rate
        .checked_sub(old_rate)
        .ok_or(ErrorCode::Overflow)?;
    accrue(delta, horizon_seconds)
}

/// Settles a rate change against the uninvested accrual held so far.
///
/// Slowing down refunds the full uninvested accrual (the depositor forfeits
/// nothing; the fee is priced only on upfront commitment increases).
/// Speeding up charges the increase over the commitment horizon. Stream
/// creation is a speed-up from zero, termination a slow-down to zero.
pub fn settle_rate_change(
    old_rate: u128,
    new_rate: u128,
    uninvested: u128,
    horizon_seconds: u64,
) -> Result<RateSettlement> {
    if new_rate == old_rate {
        return Ok(RateSettlement::NoOp);
    }
    if new_rate < old_rate {
        return Ok(RateSettlement::Refunded(uninvested));
    }
    let fee = upfront_fee(old_rate, new_rate, horizon_seconds)?;
    Ok(RateSettlement::Charged(fee))
}

/// Protocol fee skimmed from the gross deposited token amount, rounded down
pub fn deposit_fee(gross: u64, fee_rate: u64) -> Result<u64> {
    let fee = (gross as u128)
        .checked_mul(fee_rate as u128)
        .ok_or(ErrorCode::Overflow)?
        .checked_div(PERCENT_DENOMINATOR as u128)
        .ok_or(ErrorCode::Overflow)?;
    Ok(fee as u64)
}

/// Pro-rata share of `shares` owed to `units` out of `total_units`,
/// rounded down. The remainder is carried by the caller.
pub fn pro_rata(shares: u64, units: u128, total_units: u128) -> Result<u64> {
    if total_units == 0 {
        return Ok(0);
    }
    let amount = (shares as u128)
        .checked_mul(units)
        .ok_or(ErrorCode::Overflow)?
        .checked_div(total_units)
        .ok_or(ErrorCode::Overflow)?;
    if amount > u64::MAX as u128 {
        return Err(ErrorCode::Overflow.into());
    }
    Ok(amount as u64)
}

/// Scale factor between an 18-decimal ledger value and a token amount in
/// the wrapped mint's base units
pub fn value_scale(decimals: u8) -> Result<u128> {
    if decimals > VALUE_DECIMALS {
        return Err(ErrorCode::InvalidWrappedDecimals.into());
    }
    10u128
        .checked_pow((VALUE_DECIMALS - decimals) as u32)
        .ok_or_else(|| ErrorCode::Overflow.into())
}

/// Converts an 18-decimal ledger value into a token amount, flooring in
/// favor of the protocol (at most one minimal token unit of drift)
pub fn to_token_amount(value: u128, decimals: u8) -> Result<u64> {
    let scaled = value
        .checked_div(value_scale(decimals)?)
        .ok_or(ErrorCode::Overflow)?;
    if scaled > u64::MAX as u128 {
        return Err(ErrorCode::Overflow.into());
    }
    Ok(scaled as u64)
}

/// Converts a token amount in base units into an 18-decimal ledger value
pub fn from_token_amount(amount: u64, decimals: u8) -> Result<u128> {
    (amount as u128)
        .checked_mul(value_scale(decimals)?)
        .ok_or_else(|| ErrorCode::Overflow.into())
}
