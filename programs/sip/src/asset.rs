use anchor_lang::prelude::*;

use crate::constants::*;
use crate::enums::IndexLock;
use crate::errors::ErrorCode;
use crate::fees;
use crate::vault;

/// One of the two rotating distribution indices of an asset.
///
/// The open slot collects the contribution weight of every active stream.
/// At conversion time the open slot is locked with the swept units and the
/// other slot, which must already be paid out, is reset and reopened under a
/// fresh id. Distribution later pays the locked slot pro rata and empties it.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default)]
pub struct DistIndexSlot {
    /// Monotonically increasing index id, unique per asset. Zero only
    /// before the slot has ever been opened.
    pub id: u32,
    pub lock: IndexLock,
    /// Sum of the member units swept into this index
    pub total_units: u128,
    pub member_count: u64,
    /// The blocktime this index was opened
    pub opened_ts: u64,
}

impl DistIndexSlot {
    pub fn is_empty(&self) -> bool {
        self.total_units == 0 && self.member_count == 0
    }
}

/// Per-wrapped-mint streaming market.
///
/// Holds the escrow and share token accounts, the vault linkage, the two
/// distribution index slots and the aggregate stream observations used to
/// decide when a conversion is due.
#[account]
pub struct StreamAsset {
    pub initialized: bool,
    pub bump: u8,
    pub core: Pubkey,
    pub wrapped_mint: Pubkey,
    pub wrapped_decimals: u8,
    /// Token account owned by this asset holding the escrowed wrapped tokens
    pub escrow: Pubkey,
    /// Token account owned by this asset holding undistributed vault shares
    pub share_account: Pubkey,
    // Vault linkage
    pub vault_program: Pubkey,
    pub vault_state: Pubkey,
    pub share_mint: Pubkey,
    /// New streams can be disabled per asset without touching open ones
    pub streaming_enabled: bool,
    /// Sum of the rates of all active streams (18-decimal units/second)
    pub total_rate: u128,
    pub active_streams: u64,
    /// Accrued value observed across all streams up to `last_observed_ts`.
    /// An estimate for conversion gating; the per-position ledgers are the
    /// source of truth at sweep time.
    pub held_value: u128,
    pub last_observed_ts: u64,
    pub last_conversion_ts: u64,
    /// The blocktime of the last vault deposit, anchor of the share exit
    /// cooldown
    pub last_deposit_ts: u64,
    /// Shares received from the vault awaiting distribution
    pub pending_shares: u64,
    /// Rounding remainder of past distributions, folded into the next one
    pub carry_shares: u64,
    /// Which of `slots` is currently open (0 or 1)
    pub open_slot: u8,
    /// Next index id to assign when a slot reopens
    pub next_index_id: u32,
    /// The blocktime the in-progress conversion sweep started, zero when no
    /// sweep is running. Swept accrual is priced at this instant no matter
    /// how many batches the sweep takes.
    pub sweep_ts: u64,
    /// Positions swept so far in the in-progress sweep
    pub sweep_cursor: u64,
    pub slots: [DistIndexSlot; 2],
    pub total_converted_value: u128,
    pub total_shares_received: u64,
    pub total_shares_distributed: u64,
    pub created_on_utc: u64,
}

impl StreamAsset {
    pub fn open(&self) -> &DistIndexSlot {
        &self.slots[self.open_slot as usize]
    }

    pub fn open_mut(&mut self) -> &mut DistIndexSlot {
        &mut self.slots[self.open_slot as usize]
    }

    pub fn locked(&self) -> &DistIndexSlot {
        &self.slots[(1 - self.open_slot) as usize]
    }

    pub fn locked_mut(&mut self) -> &mut DistIndexSlot {
        &mut self.slots[(1 - self.open_slot) as usize]
    }

    /// Estimated accrued value across all streams at `timestamp`. Counts
    /// every stream at its full rate; streams that ran dry overestimate
    /// until they are closed.
    pub fn estimated_accrued(&self, timestamp: u64) -> Result<u128> {
        let elapsed = timestamp.saturating_sub(self.last_observed_ts);
        let accrued = fees::accrue(self.total_rate, elapsed)?;
        self.held_value
            .checked_add(accrued)
            .ok_or_else(|| ErrorCode::Overflow.into())
    }

    /// Folds the accrual since the last observation into `held_value` and
    /// advances the observation clock. Must be called before `total_rate`
    /// changes so past accrual is priced at the old rate.
    pub fn observe(&mut self, timestamp: u64) -> Result<()> {
        self.held_value = self.estimated_accrued(timestamp)?;
        self.last_observed_ts = std::cmp::max(self.last_observed_ts, timestamp);
        Ok(())
    }

    /// Registers a stream in the open index. Returns the membership the
    /// position must record.
    pub fn subscribe(&mut self) -> Result<(u32, u8)> {
        let slot = self.open_slot;
        let open = self.open_mut();
        open.member_count = open.member_count.checked_add(1).ok_or(ErrorCode::Overflow)?;
        Ok((open.id, slot))
    }

    /// Removes a member from the index slot it is subscribed to
    pub fn unsubscribe(&mut self, slot: u8) -> Result<()> {
        let index = &mut self.slots[slot as usize];
        index.member_count = index
            .member_count
            .checked_sub(1)
            .ok_or(ErrorCode::Overflow)?;
        Ok(())
    }

    /// Whether a conversion is due: a started sweep must finish; otherwise
    /// shares from the previous conversion are fully distributed, the
    /// estimated accrual clears the minimum and the conversion interval has
    /// elapsed.
    pub fn requires_deposit(&self, timestamp: u64) -> Result<bool> {
        if self.sweep_in_progress() {
            return Ok(true);
        }
        if self.pending_shares > 0 {
            return Ok(false);
        }
        if timestamp.saturating_sub(self.last_conversion_ts) < MIN_CONVERSION_INTERVAL_SECONDS {
            return Ok(false);
        }
        Ok(self.estimated_accrued(timestamp)? >= MIN_CONVERSION_VALUE)
    }

    /// Whether the pending shares can be paid out: there are some and the
    /// vault's exit cooldown on them has elapsed
    pub fn requires_distribution(&self, timestamp: u64) -> bool {
        self.pending_shares > 0
            && vault::exit_cooldown_remaining(
                self.last_deposit_ts,
                SHARE_EXIT_COOLDOWN_SECONDS,
                timestamp,
            ) == 0
    }

    pub fn sweep_in_progress(&self) -> bool {
        self.sweep_ts != 0
    }

    /// Whether every member of the locked index has been swept. Members
    /// terminated before their sweep drop out of the count.
    pub fn sweep_complete(&self) -> bool {
        self.sweep_in_progress() && self.sweep_cursor >= self.locked().member_count
    }

    /// Starts a conversion sweep: locks the open index and reopens the
    /// other slot under a fresh id. The other slot must be fully paid out.
    /// Swept units accumulate on the locked slot batch by batch. Returns
    /// the physical slot that was locked.
    pub fn begin_sweep(&mut self, timestamp: u64) -> Result<u8> {
        let reopening = (1 - self.open_slot) as usize;
        if !self.slots[reopening].is_empty() {
            return Err(ErrorCode::DistributionPending.into());
        }

        let locking = self.open_slot;
        self.open_mut().lock = IndexLock::Locked;

        let fresh_id = self.next_index_id;
        self.next_index_id = fresh_id.checked_add(1).ok_or(ErrorCode::Overflow)?;
        self.slots[reopening] = DistIndexSlot {
            id: fresh_id,
            lock: IndexLock::Open,
            total_units: 0,
            member_count: 0,
            opened_ts: timestamp,
        };
        self.open_slot = reopening as u8;
        self.sweep_ts = timestamp;
        self.sweep_cursor = 0;
        Ok(locking)
    }

    /// Accounts one swept position's units on the locked index
    pub fn record_sweep(&mut self, taken: u128) -> Result<()> {
        let locked = self.locked_mut();
        locked.total_units = locked
            .total_units
            .checked_add(taken)
            .ok_or(ErrorCode::Overflow)?;
        self.sweep_cursor = self
            .sweep_cursor
            .checked_add(1)
            .ok_or(ErrorCode::Overflow)?;
        Ok(())
    }

    pub fn finish_sweep(&mut self) {
        self.sweep_ts = 0;
        self.sweep_cursor = 0;
    }

    /// Empties the locked index after its payout. The slot stays locked
    /// until the next conversion reopens it.
    pub fn clear_locked(&mut self) {
        let locked = self.locked_mut();
        locked.total_units = 0;
        locked.member_count = 0;
    }
}
