use anchor_lang::prelude::*;
use anchor_spl::token::TokenAccount;

pub mod asset;
pub mod constants;
pub mod core;
pub mod enums;
pub mod errors;
pub mod events;
pub mod fees;
pub mod instructions;
pub mod position;
pub mod utils;
pub mod vault;

use crate::asset::*;
use crate::constants::*;
use crate::enums::*;
use crate::errors::ErrorCode;
use crate::events::*;
use crate::instructions::*;
use crate::position::StreamPosition;
use crate::utils::*;
use crate::vault::VaultDeposit;

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

#[program]
pub mod sip {

    use super::*;

    /// Create Core
    pub fn create_core(ctx: Context<CreateCoreAccounts>, deposit_fee_rate: u64) -> Result<()> {
        crate::core::Core::validate_fee_rate(deposit_fee_rate)?;

        let now_ts = Clock::get()?.unix_timestamp as u64;
        let core = &mut ctx.accounts.core;
        core.initialized = true;
        core.bump = ctx.bumps.core;
        core.authority = ctx.accounts.authority.key();
        core.fee_treasury = ctx.accounts.fee_treasury.key();
        core.deposit_fee_rate = deposit_fee_rate;
        core.active = true;
        core.deactivation_reason = [b' '; 32];
        core.asset_count = 0;
        core.created_on_utc = now_ts;

        emit!(CoreCreatedEvent {
            core: core.key(),
            authority: core.authority,
            fee_treasury: core.fee_treasury,
            deposit_fee_rate,
            timestamp: now_ts,
        });

        Ok(())
    }

    /// Initialize Stream Asset
    pub fn init_stream_asset(ctx: Context<InitStreamAssetAccounts>) -> Result<()> {
        ctx.accounts.core.assert_active()?;

        let decimals = ctx.accounts.wrapped_mint.decimals;
        // rejects mints with more than 18 decimals
        fees::value_scale(decimals)?;

        let now_ts = Clock::get()?.unix_timestamp as u64;
        let asset = &mut ctx.accounts.asset;
        asset.initialized = true;
        asset.bump = ctx.bumps.asset;
        asset.core = ctx.accounts.core.key();
        asset.wrapped_mint = ctx.accounts.wrapped_mint.key();
        asset.wrapped_decimals = decimals;
        asset.escrow = ctx.accounts.escrow.key();
        asset.share_account = ctx.accounts.share_account.key();
        asset.vault_program = ctx.accounts.vault_program.key();
        asset.vault_state = ctx.accounts.vault_state.key();
        asset.share_mint = ctx.accounts.share_mint.key();
        asset.streaming_enabled = true;
        asset.total_rate = 0;
        asset.active_streams = 0;
        asset.held_value = 0;
        asset.last_observed_ts = now_ts;
        asset.last_conversion_ts = 0;
        asset.last_deposit_ts = 0;
        asset.pending_shares = 0;
        asset.carry_shares = 0;
        asset.open_slot = 0;
        asset.sweep_ts = 0;
        asset.sweep_cursor = 0;
        // index ids start at 1; slot 1 is a never-opened empty placeholder
        // so the first conversion can rotate into it
        asset.next_index_id = 2;
        asset.slots = [
            DistIndexSlot {
                id: 1,
                lock: IndexLock::Open,
                total_units: 0,
                member_count: 0,
                opened_ts: now_ts,
            },
            DistIndexSlot {
                id: 0,
                lock: IndexLock::Locked,
                total_units: 0,
                member_count: 0,
                opened_ts: 0,
            },
        ];
        asset.total_converted_value = 0;
        asset.total_shares_received = 0;
        asset.total_shares_distributed = 0;
        asset.created_on_utc = now_ts;

        let core = &mut ctx.accounts.core;
        core.asset_count = core.asset_count.checked_add(1).ok_or(ErrorCode::Overflow)?;

        emit!(AssetInitializedEvent {
            core: core.key(),
            asset: asset.key(),
            wrapped_mint: asset.wrapped_mint,
            vault_state: asset.vault_state,
            share_mint: asset.share_mint,
            timestamp: now_ts,
        });

        Ok(())
    }

    /// Start Stream
    pub fn start_stream(ctx: Context<StartStreamAccounts>, rate: u128, amount: u64) -> Result<()> {
        ctx.accounts.core.assert_active()?;

        if rate == 0 {
            return Err(ErrorCode::InvalidStreamRate.into());
        }
        if amount == 0 {
            return Err(ErrorCode::ZeroContributionAmount.into());
        }

        let now_ts = Clock::get()?.unix_timestamp as u64;
        let position = &mut ctx.accounts.position;

        if position.initialized {
            // restarting a previously terminated position
            if position.is_active() {
                return Err(ErrorCode::StreamAlreadyExists.into());
            }
            if position.has_pending_payout() {
                return Err(ErrorCode::PendingDistributionForDepositor.into());
            }
        } else {
            position.initialized = true;
            position.bump = ctx.bumps.position;
            position.depositor = ctx.accounts.depositor.key();
            position.asset = ctx.accounts.asset.key();
            position.created_on_utc = now_ts;
        }

        transfer_token_amount(
            &ctx.accounts.depositor_token.to_account_info(),
            &ctx.accounts.escrow.to_account_info(),
            &ctx.accounts.depositor.to_account_info(),
            &ctx.accounts.token_program.to_account_info(),
            amount,
        )?;

        let asset = &mut ctx.accounts.asset;
        let value = fees::from_token_amount(amount, asset.wrapped_decimals)?;

        let position = &mut ctx.accounts.position;
        position.streamable_units = position
            .streamable_units
            .checked_add(value)
            .ok_or(ErrorCode::Overflow)?;
        position.total_streamed_in = position
            .total_streamed_in
            .checked_add(value)
            .ok_or(ErrorCode::Overflow)?;
        position.baseline_ts = now_ts;

        // starting is a rate change from zero, so the full rate is charged
        // upfront over the commitment horizon
        let settlement = position.apply_rate_change(rate, COMMITMENT_HORIZON_SECONDS)?;
        let upfront = match settlement {
            RateSettlement::Charged(fee) => fee,
            _ => 0,
        };

        asset.observe(now_ts)?;
        asset.total_rate = asset
            .total_rate
            .checked_add(rate)
            .ok_or(ErrorCode::Overflow)?;
        asset.active_streams = asset
            .active_streams
            .checked_add(1)
            .ok_or(ErrorCode::Overflow)?;

        let (index_id, slot) = asset.subscribe()?;
        position.subscribed_index_id = index_id;
        position.subscribed_slot = slot;

        emit!(StreamStartedEvent {
            asset: asset.key(),
            position: position.key(),
            depositor: position.depositor,
            rate,
            escrowed_amount: amount,
            upfront_fee: upfront,
            index_id,
            timestamp: now_ts,
        });

        Ok(())
    }

    /// Fund Stream
    pub fn fund_stream(ctx: Context<FundStreamAccounts>, amount: u64) -> Result<()> {
        ctx.accounts.core.assert_active()?;

        if amount == 0 {
            return Err(ErrorCode::ZeroContributionAmount.into());
        }

        let now_ts = Clock::get()?.unix_timestamp as u64;
        let position = &mut ctx.accounts.position;

        // price the accrual so far before the escrow grows
        position.settle(now_ts)?;

        transfer_token_amount(
            &ctx.accounts.depositor_token.to_account_info(),
            &ctx.accounts.escrow.to_account_info(),
            &ctx.accounts.depositor.to_account_info(),
            &ctx.accounts.token_program.to_account_info(),
            amount,
        )?;

        let value = fees::from_token_amount(amount, ctx.accounts.asset.wrapped_decimals)?;
        let position = &mut ctx.accounts.position;
        position.streamable_units = position
            .streamable_units
            .checked_add(value)
            .ok_or(ErrorCode::Overflow)?;
        position.total_streamed_in = position
            .total_streamed_in
            .checked_add(value)
            .ok_or(ErrorCode::Overflow)?;

        emit!(StreamFundedEvent {
            asset: ctx.accounts.asset.key(),
            position: position.key(),
            depositor: position.depositor,
            amount,
            streamable_units: position.streamable_units,
            timestamp: now_ts,
        });

        Ok(())
    }

    /// Update Stream
    pub fn update_stream(ctx: Context<UpdateStreamAccounts>, new_rate: u128) -> Result<()> {
        ctx.accounts.core.assert_active()?;

        if new_rate == 0 {
            return Err(ErrorCode::InvalidStreamRate.into());
        }

        let now_ts = Clock::get()?.unix_timestamp as u64;
        let position = &mut ctx.accounts.position;

        if !position.is_active() {
            return Err(ErrorCode::StreamNotFound.into());
        }

        let old_rate = position.rate;
        position.settle(now_ts)?;
        let settlement = position.apply_rate_change(new_rate, COMMITMENT_HORIZON_SECONDS)?;

        let mut upfront = 0u128;
        let mut refunded_tokens = 0u64;
        let mut refunded_value = 0u128;

        match settlement {
            RateSettlement::NoOp => {}
            RateSettlement::Charged(fee) => upfront = fee,
            RateSettlement::Refunded(value) => {
                refunded_value = value;
                refunded_tokens =
                    fees::to_token_amount(value, ctx.accounts.asset.wrapped_decimals)?;
            }
        }

        if refunded_tokens > 0 {
            asset_signed_transfer(
                &ctx.accounts.asset,
                &ctx.accounts.escrow.to_account_info(),
                &ctx.accounts.depositor_token.to_account_info(),
                &ctx.accounts.token_program.to_account_info(),
                refunded_tokens,
            )?;
        }

        let position = &mut ctx.accounts.position;
        position.total_refunded = position
            .total_refunded
            .checked_add(refunded_value)
            .ok_or(ErrorCode::Overflow)?;

        let asset = &mut ctx.accounts.asset;
        asset.observe(now_ts)?;
        asset.held_value = asset.held_value.saturating_sub(refunded_value);
        asset.total_rate = asset
            .total_rate
            .checked_sub(old_rate)
            .ok_or(ErrorCode::Overflow)?
            .checked_add(new_rate)
            .ok_or(ErrorCode::Overflow)?;

        emit!(StreamUpdatedEvent {
            asset: asset.key(),
            position: ctx.accounts.position.key(),
            depositor: ctx.accounts.position.depositor,
            old_rate,
            new_rate,
            upfront_fee: upfront,
            refunded_amount: refunded_tokens,
            timestamp: now_ts,
        });

        Ok(())
    }

    /// Terminate Stream. Available even while the core is deactivated so
    /// depositors can always reclaim their escrow.
    pub fn terminate_stream(ctx: Context<UpdateStreamAccounts>) -> Result<()> {
        ctx.accounts.core.assert_initialized()?;

        let now_ts = Clock::get()?.unix_timestamp as u64;
        let position = &mut ctx.accounts.position;

        if !position.is_active() {
            return Err(ErrorCode::StreamNotFound.into());
        }

        let old_rate = position.rate;
        position.settle(now_ts)?;
        let uninvested = position.uninvested_units;
        let released = position.release_all()?;
        let refunded_tokens = fees::to_token_amount(released, ctx.accounts.asset.wrapped_decimals)?;

        if refunded_tokens > 0 {
            asset_signed_transfer(
                &ctx.accounts.asset,
                &ctx.accounts.escrow.to_account_info(),
                &ctx.accounts.depositor_token.to_account_info(),
                &ctx.accounts.token_program.to_account_info(),
                refunded_tokens,
            )?;
        }

        let position = &mut ctx.accounts.position;
        position.total_refunded = position
            .total_refunded
            .checked_add(released)
            .ok_or(ErrorCode::Overflow)?;

        let asset = &mut ctx.accounts.asset;
        asset.observe(now_ts)?;
        asset.held_value = asset.held_value.saturating_sub(uninvested);
        asset.total_rate = asset
            .total_rate
            .checked_sub(old_rate)
            .ok_or(ErrorCode::Overflow)?;
        asset.active_streams = asset
            .active_streams
            .checked_sub(1)
            .ok_or(ErrorCode::Overflow)?;

        // drop out of the open index; a pending locked payout, if any, is
        // still honored through the recorded units
        let slot = ctx.accounts.position.subscribed_slot;
        asset.unsubscribe(slot)?;
        let position = &mut ctx.accounts.position;
        position.subscribed_index_id = 0;

        emit!(StreamTerminatedEvent {
            asset: ctx.accounts.asset.key(),
            position: position.key(),
            depositor: position.depositor,
            refunded_amount: refunded_tokens,
            timestamp: now_ts,
        });

        Ok(())
    }

    /// Emergency Close Stream
    pub fn emergency_close_stream(ctx: Context<EmergencyCloseStreamAccounts>) -> Result<()> {
        ctx.accounts.core.assert_initialized()?;

        let now_ts = Clock::get()?.unix_timestamp as u64;
        let position = &mut ctx.accounts.position;

        if !position.is_active() {
            return Err(ErrorCode::StreamNotFound.into());
        }

        let runway = position.runway_seconds(now_ts)?;
        if !position.is_emergency_closable(now_ts, EMERGENCY_BUFFER_SECONDS)? {
            return Err(ErrorCode::NotEligibleForEmergencyClose.into());
        }

        let old_rate = position.rate;
        position.settle(now_ts)?;
        let uninvested = position.uninvested_units;
        let released = position.release_all()?;
        let refunded_tokens = fees::to_token_amount(released, ctx.accounts.asset.wrapped_decimals)?;

        if refunded_tokens > 0 {
            asset_signed_transfer(
                &ctx.accounts.asset,
                &ctx.accounts.escrow.to_account_info(),
                &ctx.accounts.depositor_token.to_account_info(),
                &ctx.accounts.token_program.to_account_info(),
                refunded_tokens,
            )?;
        }

        let position = &mut ctx.accounts.position;
        position.total_refunded = position
            .total_refunded
            .checked_add(released)
            .ok_or(ErrorCode::Overflow)?;

        let asset = &mut ctx.accounts.asset;
        asset.observe(now_ts)?;
        asset.held_value = asset.held_value.saturating_sub(uninvested);
        asset.total_rate = asset
            .total_rate
            .checked_sub(old_rate)
            .ok_or(ErrorCode::Overflow)?;
        asset.active_streams = asset
            .active_streams
            .checked_sub(1)
            .ok_or(ErrorCode::Overflow)?;

        let slot = ctx.accounts.position.subscribed_slot;
        asset.unsubscribe(slot)?;
        let position = &mut ctx.accounts.position;
        position.subscribed_index_id = 0;

        emit!(EmergencyCloseEvent {
            asset: ctx.accounts.asset.key(),
            position: position.key(),
            depositor: position.depositor,
            caller: ctx.accounts.caller.key(),
            runway_seconds: runway,
            refunded_amount: refunded_tokens,
            timestamp: now_ts,
        });

        Ok(())
    }

    /// Deposit. Sweeps active positions into the open index in batches; the
    /// first batch locks the index, the last one sends the gross amount
    /// minus the fee into the vault and records the received shares as
    /// pending distribution. Swept accrual is priced at the sweep start.
    pub fn deposit<'info>(ctx: Context<'_, '_, 'info, 'info, DepositAccounts<'info>>) -> Result<()> {
        ctx.accounts.core.assert_active()?;

        let now_ts = Clock::get()?.unix_timestamp as u64;
        let asset = &mut ctx.accounts.asset;
        asset.observe(now_ts)?;

        if !asset.sweep_in_progress() {
            if asset.pending_shares > 0 {
                return Err(ErrorCode::DistributionPending.into());
            }
            if now_ts.saturating_sub(asset.last_conversion_ts) < MIN_CONVERSION_INTERVAL_SECONDS {
                return Err(ErrorCode::ConversionCooldown.into());
            }
            if asset.estimated_accrued(now_ts)? < MIN_CONVERSION_VALUE {
                return Err(ErrorCode::NotEnoughAccrued.into());
            }
            asset.begin_sweep(now_ts)?;
        }

        let asset_key = asset.key();
        let sweep_ts = asset.sweep_ts;
        let locked_index_id = asset.locked().id;
        let unswept = asset
            .locked()
            .member_count
            .saturating_sub(asset.sweep_cursor);
        if ctx.remaining_accounts.len() as u64 > unswept {
            return Err(ErrorCode::MemberAccountsMismatch.into());
        }

        for position_info in ctx.remaining_accounts.iter() {
            let mut position = Account::<StreamPosition>::try_from(position_info)?;
            if position.asset != asset_key || !position.is_active() {
                return Err(ErrorCode::InvalidPositionAccount.into());
            }
            if position.last_conversion_ts == sweep_ts {
                return Err(ErrorCode::PositionAlreadySettled.into());
            }
            // unswept members are still subscribed to the locked index
            if position.subscribed_index_id != locked_index_id {
                return Err(ErrorCode::NotAMember.into());
            }

            position.settle(sweep_ts)?;
            let taken = position.take_for_conversion()?;
            position.units = position.units.checked_add(taken).ok_or(ErrorCode::Overflow)?;
            position.last_conversion_ts = sweep_ts;
            asset.record_sweep(taken)?;

            // a swept position stays active and re-subscribes to the
            // freshly opened index
            let (index_id, slot) = asset.subscribe()?;
            position.subscribed_index_id = index_id;
            position.subscribed_slot = slot;
            position.exit(ctx.program_id)?;
        }

        if !asset.sweep_complete() {
            msg!("swept {0} of {1}", asset.sweep_cursor, asset.locked().member_count);
            return Ok(());
        }

        // the last batch settles the conversion itself
        let total_units = asset.locked().total_units;
        let member_count = asset.locked().member_count;
        let decimals = asset.wrapped_decimals;
        let fee_rate = ctx.accounts.core.deposit_fee_rate;
        let gross_tokens = fees::to_token_amount(total_units, decimals)?;

        let mut fee_tokens = 0u64;
        let mut shares = 0u64;

        if gross_tokens > 0 {
            fee_tokens = fees::deposit_fee(gross_tokens, fee_rate)?;
            let net_tokens = gross_tokens
                .checked_sub(fee_tokens)
                .ok_or(ErrorCode::Overflow)?;

            if fee_tokens > 0 {
                asset_signed_transfer(
                    &ctx.accounts.asset,
                    &ctx.accounts.escrow.to_account_info(),
                    &ctx.accounts.fee_account.to_account_info(),
                    &ctx.accounts.token_program.to_account_info(),
                    fee_tokens,
                )?;
            }

            let shares_before = ctx.accounts.share_account.amount;

            let vault_program_info = ctx.accounts.vault_program.to_account_info();
            let vault_state_info = ctx.accounts.vault_state.to_account_info();
            let vault_token_info = ctx.accounts.vault_token_account.to_account_info();
            let share_mint_info = ctx.accounts.share_mint.to_account_info();
            let escrow_info = ctx.accounts.escrow.to_account_info();
            let share_account_info = ctx.accounts.share_account.to_account_info();
            let token_program_info = ctx.accounts.token_program.to_account_info();

            let vault_deposit = VaultDeposit {
                vault_program: &vault_program_info,
                vault_state: &vault_state_info,
                vault_token_account: &vault_token_info,
                share_mint: &share_mint_info,
                source_token_account: &escrow_info,
                share_token_account: &share_account_info,
                token_program: &token_program_info,
            };
            vault_deposit.invoke(&ctx.accounts.asset, net_tokens)?;

            // shares received are measured, never trusted from return data
            ctx.accounts.share_account.reload()?;
            shares = ctx
                .accounts
                .share_account
                .amount
                .checked_sub(shares_before)
                .ok_or(ErrorCode::Overflow)?;
            if shares == 0 {
                return Err(ErrorCode::NoSharesReceived.into());
            }
        }

        let asset = &mut ctx.accounts.asset;
        asset.pending_shares = shares
            .checked_add(asset.carry_shares)
            .ok_or(ErrorCode::Overflow)?;
        asset.carry_shares = 0;
        asset.last_conversion_ts = sweep_ts;
        asset.last_deposit_ts = now_ts;
        asset.held_value = asset.held_value.saturating_sub(total_units);
        asset.total_converted_value = asset
            .total_converted_value
            .checked_add(total_units)
            .ok_or(ErrorCode::Overflow)?;
        asset.total_shares_received = asset
            .total_shares_received
            .checked_add(shares)
            .ok_or(ErrorCode::Overflow)?;
        asset.finish_sweep();

        emit!(DepositEvent {
            asset: asset_key,
            locked_index_id,
            swept_positions: member_count,
            gross_amount: gross_tokens,
            fee_amount: fee_tokens,
            shares_received: shares,
            timestamp: now_ts,
        });

        Ok(())
    }

    /// Distribute. Pays the locked index pro rata by recorded units, folds
    /// the rounding remainder into the next payout and empties the index.
    /// A payout with zero shares or zero units still walks every member to
    /// clear the recorded units.
    pub fn distribute<'info>(
        ctx: Context<'_, '_, 'info, 'info, DistributeAccounts<'info>>,
    ) -> Result<()> {
        ctx.accounts.core.assert_initialized()?;

        let now_ts = Clock::get()?.unix_timestamp as u64;
        let asset = &mut ctx.accounts.asset;

        if asset.sweep_in_progress() {
            return Err(ErrorCode::SweepInProgress.into());
        }
        if asset.pending_shares == 0 && asset.locked().is_empty() {
            msg!("nothing to distribute");
            return Ok(());
        }
        if asset.pending_shares > 0
            && now_ts.saturating_sub(asset.last_deposit_ts) < SHARE_EXIT_COOLDOWN_SECONDS
        {
            return Err(ErrorCode::SharesLocked.into());
        }

        let asset_key = asset.key();
        let share_mint = asset.share_mint;
        let last_conversion_ts = asset.last_conversion_ts;
        let locked = *asset.locked();
        let shares_pool = asset.pending_shares;

        let expected = (locked.member_count as usize)
            .checked_mul(2)
            .ok_or(ErrorCode::Overflow)?;
        if ctx.remaining_accounts.len() != expected {
            return Err(ErrorCode::MemberAccountsMismatch.into());
        }

        let mut distributed = 0u64;
        let mut members_paid = 0u64;
        let mut previous_key: Option<Pubkey> = None;

        for pair in ctx.remaining_accounts.chunks(2) {
            let position_info = &pair[0];
            let member_token_info = &pair[1];

            // strictly ascending keys plus the exact length gate force
            // every member to appear exactly once
            assert_ascending_member(previous_key, position_info.key())?;
            previous_key = Some(position_info.key());

            let mut position = Account::<StreamPosition>::try_from(position_info)?;
            if position.asset != asset_key {
                return Err(ErrorCode::InvalidPositionAccount.into());
            }
            // members are exactly the positions swept at the conversion
            // that produced this payout
            if position.last_conversion_ts != last_conversion_ts {
                return Err(ErrorCode::NotAMember.into());
            }

            let member_token = Account::<TokenAccount>::try_from(member_token_info)?;
            if member_token.owner != position.depositor || member_token.mint != share_mint {
                return Err(ErrorCode::InvalidMemberShareAccount.into());
            }

            let amount = fees::pro_rata(shares_pool, position.units, locked.total_units)?;
            if amount > 0 {
                asset_signed_transfer(
                    &ctx.accounts.asset,
                    &ctx.accounts.share_account.to_account_info(),
                    member_token_info,
                    &ctx.accounts.token_program.to_account_info(),
                    amount,
                )?;
                distributed = distributed.checked_add(amount).ok_or(ErrorCode::Overflow)?;
                members_paid = members_paid.checked_add(1).ok_or(ErrorCode::Overflow)?;
            }

            position.units = 0;
            position.exit(ctx.program_id)?;
        }

        let asset = &mut ctx.accounts.asset;
        let remainder = shares_pool
            .checked_sub(distributed)
            .ok_or(ErrorCode::Overflow)?;
        asset.carry_shares = asset
            .carry_shares
            .checked_add(remainder)
            .ok_or(ErrorCode::Overflow)?;
        asset.pending_shares = 0;
        asset.total_shares_distributed = asset
            .total_shares_distributed
            .checked_add(distributed)
            .ok_or(ErrorCode::Overflow)?;
        asset.clear_locked();

        emit!(DistributeEvent {
            asset: asset_key,
            index_id: locked.id,
            members_paid,
            shares_distributed: distributed,
            carry_shares: asset.carry_shares,
            timestamp: now_ts,
        });

        Ok(())
    }

    /// Require Upkeep. Walks the caller-supplied assets in order and
    /// reports the first one due for a conversion or a payout. A
    /// deactivated core never reports work.
    pub fn require_upkeep<'info>(
        ctx: Context<'_, '_, 'info, 'info, RequireUpkeepAccounts<'info>>,
    ) -> Result<()> {
        let now_ts = Clock::get()?.unix_timestamp as u64;
        let core_key = ctx.accounts.core.key();

        if ctx.accounts.core.active {
            for asset_info in ctx.remaining_accounts.iter() {
                let asset = Account::<StreamAsset>::try_from(asset_info)?;
                if asset.core != core_key {
                    return Err(ErrorCode::UnsupportedAsset.into());
                }

                let deposit_due = asset.requires_deposit(now_ts)?;
                let distribution_due = asset.requires_distribution(now_ts);
                if deposit_due || distribution_due {
                    msg!("deposit_due: {0}", deposit_due);
                    msg!("distribution_due: {0}", distribution_due);

                    emit!(UpkeepEvent {
                        asset: asset.key(),
                        deposit_due,
                        distribution_due,
                        estimated_accrued: asset.estimated_accrued(now_ts)?,
                        pending_shares: asset.pending_shares,
                        timestamp: now_ts,
                    });
                    return Ok(());
                }
            }
        }

        msg!("no upkeep required");
        emit!(UpkeepEvent {
            asset: Pubkey::default(),
            deposit_due: false,
            distribution_due: false,
            estimated_accrued: 0,
            pending_shares: 0,
            timestamp: now_ts,
        });

        Ok(())
    }

    /// Calc User Uninvested
    pub fn calc_user_uninvested(ctx: Context<CalcUserUninvestedAccounts>) -> Result<()> {
        let now_ts = Clock::get()?.unix_timestamp as u64;
        let position = &ctx.accounts.position;

        let uninvested = position.calc_uninvested(now_ts)?;
        msg!("uninvested_units: {0}", uninvested);

        emit!(UninvestedEvent {
            asset: ctx.accounts.asset.key(),
            position: position.key(),
            depositor: position.depositor,
            uninvested_units: uninvested,
            timestamp: now_ts,
        });

        Ok(())
    }

    /// Deactivate Core
    pub fn deactivate_core(ctx: Context<SetCoreStatusAccounts>, reason: String) -> Result<()> {
        let core = &mut ctx.accounts.core;
        if !core.active {
            return Err(ErrorCode::CoreInactive.into());
        }

        let now_ts = Clock::get()?.unix_timestamp as u64;
        core.active = false;
        core.deactivation_reason = string_to_bytes(reason)?;

        emit!(CoreStatusEvent {
            core: core.key(),
            active: false,
            reason: core.deactivation_reason,
            timestamp: now_ts,
        });

        Ok(())
    }

    /// Reactivate Core
    pub fn reactivate_core(ctx: Context<SetCoreStatusAccounts>) -> Result<()> {
        let core = &mut ctx.accounts.core;
        if core.active {
            return Err(ErrorCode::CoreAlreadyActive.into());
        }

        let now_ts = Clock::get()?.unix_timestamp as u64;
        core.active = true;
        core.deactivation_reason = [b' '; 32];

        emit!(CoreStatusEvent {
            core: core.key(),
            active: true,
            reason: core.deactivation_reason,
            timestamp: now_ts,
        });

        Ok(())
    }

    /// Toggle streaming for an asset. Open streams are untouched; only new
    /// ones are blocked while disabled.
    pub fn set_asset_streaming(ctx: Context<SetAssetStreamingAccounts>, enabled: bool) -> Result<()> {
        let now_ts = Clock::get()?.unix_timestamp as u64;
        ctx.accounts.asset.streaming_enabled = enabled;

        emit!(AssetStreamingEvent {
            asset: ctx.accounts.asset.key(),
            enabled,
            timestamp: now_ts,
        });

        Ok(())
    }
}
