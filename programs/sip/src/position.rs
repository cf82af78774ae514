use anchor_lang::prelude::*;

use crate::enums::RateSettlement;
use crate::errors::ErrorCode;
use crate::fees;

/// Per-(depositor, asset) stream ledger.
///
/// All values are kept with 18 decimals (`VALUE_DECIMALS`) regardless of the
/// wrapped mint's decimals. The position's wrapped tokens sit in the asset's
/// escrow token account; this record tracks how much of that escrow is still
/// streamable, how much has accrued since the last baseline ("uninvested"),
/// and how much was charged upfront as pre-paid commitment value.
#[account]
pub struct StreamPosition {
    pub initialized: bool,
    pub bump: u8,
    pub depositor: Pubkey,
    pub asset: Pubkey,
    /// Streaming rate in 18-decimal value units per second. Zero means the
    /// stream is terminated.
    pub rate: u128,
    /// Escrowed value not yet consumed by the stream
    pub streamable_units: u128,
    /// Value accrued since `baseline_ts` settlements, awaiting conversion
    pub uninvested_units: u128,
    /// Upfront commitment fee held as pre-paid value. Included in the next
    /// conversion and in the depositor's distribution weight, but not
    /// reported by `calc_uninvested`.
    pub prepaid_units: u128,
    /// The blocktime of the last ledger settlement
    pub baseline_ts: u64,
    /// Distribution index membership. Zero id means not subscribed.
    pub subscribed_index_id: u32,
    pub subscribed_slot: u8,
    /// Contribution weight recorded in the subscribed index at conversion
    pub units: u128,
    /// The blocktime this position was last swept into a conversion
    pub last_conversion_ts: u64,
    /// Cumulative value escrowed by the depositor
    pub total_streamed_in: u128,
    /// Cumulative value refunded to the depositor
    pub total_refunded: u128,
    /// Unix timestamp (in seconds) when the position was created
    pub created_on_utc: u64,
}

impl StreamPosition {
    /// Whether the stream is currently flowing
    pub fn is_active(&self) -> bool {
        self.rate > 0
    }

    /// Value accrued since the baseline at the current rate, capped at the
    /// remaining streamable escrow. Pure read.
    pub fn calc_accrued(&self, timestamp: u64) -> Result<u128> {
        if self.rate == 0 {
            return Ok(0);
        }
        let elapsed = timestamp.saturating_sub(self.baseline_ts);
        let accrued = fees::accrue(self.rate, elapsed)?;
        Ok(std::cmp::min(accrued, self.streamable_units))
    }

    /// The depositor's uninvested amount at `timestamp`: the settled
    /// baseline plus accrual since then. Pure read, callable at any point.
    pub fn calc_uninvested(&self, timestamp: u64) -> Result<u128> {
        let accrued = self.calc_accrued(timestamp)?;
        self.uninvested_units
            .checked_add(accrued)
            .ok_or_else(|| ErrorCode::Overflow.into())
    }

    /// Moves accrued value from the streamable escrow into the uninvested
    /// ledger and advances the baseline. The baseline never moves backwards.
    pub fn settle(&mut self, timestamp: u64) -> Result<u128> {
        let accrued = self.calc_accrued(timestamp)?;
        self.streamable_units = self
            .streamable_units
            .checked_sub(accrued)
            .ok_or(ErrorCode::Overflow)?;
        self.uninvested_units = self
            .uninvested_units
            .checked_add(accrued)
            .ok_or(ErrorCode::Overflow)?;
        self.baseline_ts = std::cmp::max(self.baseline_ts, timestamp);
        Ok(accrued)
    }

    /// Applies a rate change on an already-settled position. Speeding up
    /// moves the upfront fee from the streamable escrow into the pre-paid
    /// ledger; slowing down releases the full uninvested accrual for refund.
    /// Returns the settlement outcome; the caller performs the transfer.
    pub fn apply_rate_change(
        &mut self,
        new_rate: u128,
        horizon_seconds: u64,
    ) -> Result<RateSettlement> {
        let settlement =
            fees::settle_rate_change(self.rate, new_rate, self.uninvested_units, horizon_seconds)?;

        match settlement {
            RateSettlement::NoOp => {}
            RateSettlement::Charged(fee) => {
                if fee > self.streamable_units {
                    return Err(ErrorCode::InsufficientStreamableBalance.into());
                }
                self.streamable_units = self
                    .streamable_units
                    .checked_sub(fee)
                    .ok_or(ErrorCode::Overflow)?;
                self.prepaid_units = self
                    .prepaid_units
                    .checked_add(fee)
                    .ok_or(ErrorCode::Overflow)?;
            }
            RateSettlement::Refunded(amount) => {
                self.uninvested_units = self
                    .uninvested_units
                    .checked_sub(amount)
                    .ok_or(ErrorCode::Overflow)?;
            }
        }

        self.rate = new_rate;
        Ok(settlement)
    }

    /// Takes the full uninvested plus pre-paid value for a conversion,
    /// zeroing both ledgers. The taken value becomes distribution units.
    pub fn take_for_conversion(&mut self) -> Result<u128> {
        let taken = self
            .uninvested_units
            .checked_add(self.prepaid_units)
            .ok_or(ErrorCode::Overflow)?;
        self.uninvested_units = 0;
        self.prepaid_units = 0;
        Ok(taken)
    }

    /// Seconds the remaining escrow can sustain the current rate, as seen
    /// from `timestamp`. A terminated stream has unbounded runway.
    pub fn runway_seconds(&self, timestamp: u64) -> Result<u64> {
        if self.rate == 0 {
            return Ok(u64::MAX);
        }
        let accrued = self.calc_accrued(timestamp)?;
        let remaining = self
            .streamable_units
            .checked_sub(accrued)
            .ok_or(ErrorCode::Overflow)?;
        let seconds = remaining
            .checked_div(self.rate)
            .ok_or(ErrorCode::Overflow)?;
        Ok(std::cmp::min(seconds, u64::MAX as u128) as u64)
    }

    /// Whether the stream is about to run out of funds and must be
    /// force-closed to keep the ledger consistent with reality
    pub fn is_emergency_closable(&self, timestamp: u64, buffer_seconds: u64) -> Result<bool> {
        if self.rate == 0 {
            return Ok(false);
        }
        Ok(self.runway_seconds(timestamp)? < buffer_seconds)
    }

    /// Releases everything the depositor is owed on termination: the full
    /// uninvested accrual, the pre-paid value and the remaining escrow.
    /// Returns the released value; the caller performs the transfer and the
    /// index bookkeeping.
    pub fn release_all(&mut self) -> Result<u128> {
        let released = self
            .uninvested_units
            .checked_add(self.prepaid_units)
            .ok_or(ErrorCode::Overflow)?
            .checked_add(self.streamable_units)
            .ok_or(ErrorCode::Overflow)?;
        self.uninvested_units = 0;
        self.prepaid_units = 0;
        self.streamable_units = 0;
        self.rate = 0;
        Ok(released)
    }

    /// Whether the position still awaits a payout from a locked index
    pub fn has_pending_payout(&self) -> bool {
        self.units > 0
    }
}
