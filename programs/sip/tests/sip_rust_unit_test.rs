// how to run:
// cargo test -- --nocapture

use anchor_lang::prelude::Pubkey;

use sip::asset::{DistIndexSlot, StreamAsset};
use sip::constants::*;
use sip::core::Core;
use sip::enums::{IndexLock, RateSettlement};
use sip::fees;
use sip::position::StreamPosition;
use sip::utils::{assert_ascending_member, string_to_bytes};
use sip::vault::exit_cooldown_remaining;

const DAY: u64 = 24 * 60 * 60;
const HOUR: u64 = 60 * 60;

fn base_position(rate: u128, streamable: u128, baseline_ts: u64) -> StreamPosition {
    StreamPosition {
        initialized: true,
        bump: 255,
        depositor: Pubkey::new_unique(),
        asset: Pubkey::new_unique(),
        rate,
        streamable_units: streamable,
        uninvested_units: 0,
        prepaid_units: 0,
        baseline_ts,
        subscribed_index_id: 1,
        subscribed_slot: 0,
        units: 0,
        last_conversion_ts: 0,
        total_streamed_in: streamable,
        total_refunded: 0,
        created_on_utc: baseline_ts,
    }
}

fn base_asset(now_ts: u64) -> StreamAsset {
    StreamAsset {
        initialized: true,
        bump: 254,
        core: Pubkey::new_unique(),
        wrapped_mint: Pubkey::new_unique(),
        wrapped_decimals: 6,
        escrow: Pubkey::new_unique(),
        share_account: Pubkey::new_unique(),
        vault_program: Pubkey::new_unique(),
        vault_state: Pubkey::new_unique(),
        share_mint: Pubkey::new_unique(),
        streaming_enabled: true,
        total_rate: 0,
        active_streams: 0,
        held_value: 0,
        last_observed_ts: now_ts,
        last_conversion_ts: 0,
        last_deposit_ts: 0,
        pending_shares: 0,
        carry_shares: 0,
        open_slot: 0,
        next_index_id: 2,
        sweep_ts: 0,
        sweep_cursor: 0,
        slots: [
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
        ],
        total_converted_value: 0,
        total_shares_received: 0,
        total_shares_distributed: 0,
        created_on_utc: now_ts,
    }
}

// ------------------------------------------------------------------
// fee and rate calculator
// ------------------------------------------------------------------

#[test]
fn upfront_fee_prices_only_rate_increases() {
    assert_eq!(fees::upfront_fee(0, 100, HOUR).unwrap(), 100 * HOUR as u128);
    assert_eq!(fees::upfront_fee(100, 250, HOUR).unwrap(), 150 * HOUR as u128);
    assert_eq!(fees::upfront_fee(100, 100, HOUR).unwrap(), 0);
    assert_eq!(fees::upfront_fee(100, 40, HOUR).unwrap(), 0);
}

#[test]
fn settle_rate_change_variants() {
    assert_eq!(
        fees::settle_rate_change(100, 100, 555, HOUR).unwrap(),
        RateSettlement::NoOp
    );
    assert_eq!(
        fees::settle_rate_change(100, 40, 555, HOUR).unwrap(),
        RateSettlement::Refunded(555)
    );
    assert_eq!(
        fees::settle_rate_change(100, 250, 555, HOUR).unwrap(),
        RateSettlement::Charged(150 * HOUR as u128)
    );
}

#[test]
fn deposit_fee_floors_in_favor_of_the_protocol() {
    // 2% of 1000
    assert_eq!(fees::deposit_fee(1000, 20_000).unwrap(), 20);
    // 2% of 49 is 0.98, skimmed down to zero
    assert_eq!(fees::deposit_fee(49, 20_000).unwrap(), 0);
    assert_eq!(fees::deposit_fee(1000, 0).unwrap(), 0);
}

#[test]
fn pro_rata_two_to_one_with_remainder() {
    let total = 3u128;
    let a = fees::pro_rata(101, 2, total).unwrap();
    let b = fees::pro_rata(101, 1, total).unwrap();
    assert_eq!(a, 67);
    assert_eq!(b, 33);
    // one share left over for the carry
    assert_eq!(101 - a - b, 1);
    assert_eq!(fees::pro_rata(101, 1, 0).unwrap(), 0);
}

#[test]
fn token_amount_scaling_round_trips_whole_tokens() {
    let one_token_value = fees::from_token_amount(1_000_000, 6).unwrap();
    assert_eq!(one_token_value, 1_000_000_000_000_000_000);
    assert_eq!(fees::to_token_amount(one_token_value, 6).unwrap(), 1_000_000);
    // sub-token dust floors away
    assert_eq!(fees::to_token_amount(one_token_value + 999, 6).unwrap(), 1_000_000);
    assert!(fees::value_scale(19).is_err());
    assert_eq!(fees::value_scale(18).unwrap(), 1);
}

// ------------------------------------------------------------------
// stream position ledger
// ------------------------------------------------------------------

#[test]
fn uninvested_grows_linearly_with_time() {
    // 90 value units per day
    let rate = 90u128;
    let position = base_position(rate * 1_000, rate * 1_000 * 90 * DAY as u128, 1_000_000);
    let rate_per_day = rate * 1_000 * DAY as u128;

    let after_one_day = position.calc_uninvested(1_000_000 + DAY).unwrap();
    let after_three_days = position.calc_uninvested(1_000_000 + 3 * DAY).unwrap();
    assert_eq!(after_one_day, rate_per_day);
    assert_eq!(after_three_days, 3 * rate_per_day);
}

#[test]
fn uninvested_is_capped_at_the_streamable_escrow() {
    let position = base_position(10, 500, 0);
    // escrow runs out after 50 seconds
    assert_eq!(position.calc_uninvested(49).unwrap(), 490);
    assert_eq!(position.calc_uninvested(50).unwrap(), 500);
    assert_eq!(position.calc_uninvested(5_000).unwrap(), 500);
}

#[test]
fn calc_uninvested_is_a_pure_read() {
    let position = base_position(7, 10_000, 100);
    let first = position.calc_uninvested(100 + HOUR).unwrap();
    let second = position.calc_uninvested(100 + HOUR).unwrap();
    assert_eq!(first, second);
}

#[test]
fn settle_preserves_the_reported_total() {
    let mut position = base_position(7, 10_000_000, 100);
    let reported = position.calc_uninvested(100 + HOUR).unwrap();

    position.settle(100 + HOUR).unwrap();
    assert_eq!(position.baseline_ts, 100 + HOUR);
    assert_eq!(position.calc_uninvested(100 + HOUR).unwrap(), reported);

    // later reads keep growing from the new baseline
    let later = position.calc_uninvested(100 + HOUR + 10).unwrap();
    assert_eq!(later, reported + 70);
}

#[test]
fn accrual_restarts_after_a_conversion_sweep() {
    let mut position = base_position(5, 10_000_000, 0);
    position.settle(2 * DAY).unwrap();
    let taken = position.take_for_conversion().unwrap();
    assert_eq!(taken, 5 * 2 * DAY as u128);
    assert_eq!(position.calc_uninvested(2 * DAY).unwrap(), 0);

    // fresh accrual only since the sweep
    assert_eq!(
        position.calc_uninvested(2 * DAY + HOUR).unwrap(),
        5 * HOUR as u128
    );
}

#[test]
fn prepaid_value_is_swept_but_not_reported() {
    let mut position = base_position(0, 10_000_000, 0);
    let settlement = position
        .apply_rate_change(2, COMMITMENT_HORIZON_SECONDS)
        .unwrap();
    let fee = 2 * COMMITMENT_HORIZON_SECONDS as u128;
    assert_eq!(settlement, RateSettlement::Charged(fee));
    assert_eq!(position.prepaid_units, fee);
    assert_eq!(position.streamable_units, 10_000_000 - fee);

    // the upfront fee never shows up as uninvested
    assert_eq!(position.calc_uninvested(0).unwrap(), 0);

    position.settle(10).unwrap();
    let taken = position.take_for_conversion().unwrap();
    assert_eq!(taken, fee + 20);
    assert_eq!(position.prepaid_units, 0);
}

#[test]
fn rate_increase_needs_enough_escrow() {
    let mut position = base_position(0, 10, 0);
    let result = position.apply_rate_change(1, COMMITMENT_HORIZON_SECONDS);
    assert!(result.is_err());
    // nothing moved
    assert_eq!(position.streamable_units, 10);
    assert_eq!(position.rate, 0);
}

#[test]
fn slowing_down_releases_the_full_uninvested_accrual() {
    let mut position = base_position(10, 100_000, 0);
    position.settle(1_000).unwrap();
    assert_eq!(position.uninvested_units, 10_000);

    let settlement = position
        .apply_rate_change(4, COMMITMENT_HORIZON_SECONDS)
        .unwrap();
    assert_eq!(settlement, RateSettlement::Refunded(10_000));
    assert_eq!(position.uninvested_units, 0);
    assert_eq!(position.rate, 4);
}

#[test]
fn release_all_conserves_value() {
    let mut position = base_position(10, 70_000, 0);
    position.settle(1_000).unwrap();
    position.prepaid_units = 500;

    let expected = position.streamable_units + position.uninvested_units + 500;
    let released = position.release_all().unwrap();
    assert_eq!(released, expected);
    assert_eq!(position.streamable_units, 0);
    assert_eq!(position.uninvested_units, 0);
    assert_eq!(position.prepaid_units, 0);
    assert_eq!(position.rate, 0);
    assert!(!position.is_active());
}

// ------------------------------------------------------------------
// emergency close eligibility
// ------------------------------------------------------------------

#[test]
fn runway_below_the_buffer_is_emergency_closable() {
    // escrow covers eleven hours at this rate
    let position = base_position(1, 11 * HOUR as u128, 0);
    assert_eq!(position.runway_seconds(0).unwrap(), 11 * HOUR);
    assert!(position
        .is_emergency_closable(0, EMERGENCY_BUFFER_SECONDS)
        .unwrap());
}

#[test]
fn runway_above_the_buffer_is_not_emergency_closable() {
    let position = base_position(1, 13 * HOUR as u128, 0);
    assert_eq!(position.runway_seconds(0).unwrap(), 13 * HOUR);
    assert!(!position
        .is_emergency_closable(0, EMERGENCY_BUFFER_SECONDS)
        .unwrap());
}

#[test]
fn terminated_streams_are_never_emergency_closable() {
    let position = base_position(0, 0, 0);
    assert!(!position
        .is_emergency_closable(0, EMERGENCY_BUFFER_SECONDS)
        .unwrap());
}

// ------------------------------------------------------------------
// distribution index rotation
// ------------------------------------------------------------------

#[test]
fn subscribe_and_unsubscribe_track_the_open_index() {
    let mut asset = base_asset(1_000);
    let (id_a, slot_a) = asset.subscribe().unwrap();
    let (id_b, slot_b) = asset.subscribe().unwrap();
    assert_eq!((id_a, slot_a), (1, 0));
    assert_eq!((id_b, slot_b), (1, 0));
    assert_eq!(asset.open().member_count, 2);

    asset.unsubscribe(slot_b).unwrap();
    assert_eq!(asset.open().member_count, 1);
}

#[test]
fn sweep_locks_the_open_index_and_reopens_the_other_slot() {
    let mut asset = base_asset(1_000);
    asset.subscribe().unwrap();
    asset.subscribe().unwrap();

    let locked_slot = asset.begin_sweep(2_000).unwrap();
    assert_eq!(locked_slot, 0);
    assert_eq!(asset.locked().id, 1);
    assert_eq!(asset.locked().lock, IndexLock::Locked);
    assert_eq!(asset.locked().member_count, 2);
    assert!(asset.sweep_in_progress());
    assert!(!asset.sweep_complete());

    // new joiners land in a fresh index, not the locked one
    assert_eq!(asset.open().id, 2);
    assert_eq!(asset.open().lock, IndexLock::Open);
    assert_eq!(asset.open().member_count, 0);
    assert_eq!(asset.open().opened_ts, 2_000);
}

#[test]
fn sweep_accumulates_units_batch_by_batch() {
    let mut asset = base_asset(1_000);
    asset.subscribe().unwrap();
    asset.subscribe().unwrap();
    asset.subscribe().unwrap();

    asset.begin_sweep(2_000).unwrap();
    // the pool keeps asking for batches until the sweep finishes
    assert!(asset.requires_deposit(2_000).unwrap());

    asset.record_sweep(100).unwrap();
    assert!(!asset.sweep_complete());
    assert_eq!(asset.locked().total_units, 100);

    asset.record_sweep(150).unwrap();
    asset.record_sweep(50).unwrap();
    assert!(asset.sweep_complete());
    assert_eq!(asset.locked().total_units, 300);

    asset.finish_sweep();
    assert!(!asset.sweep_in_progress());
    assert_eq!(asset.sweep_cursor, 0);
}

#[test]
fn members_terminated_before_their_sweep_drop_out_of_the_count() {
    let mut asset = base_asset(1_000);
    asset.subscribe().unwrap();
    asset.subscribe().unwrap();

    let locked_slot = asset.begin_sweep(2_000).unwrap();
    asset.record_sweep(100).unwrap();

    // the unswept member closes its stream mid-sweep
    asset.unsubscribe(locked_slot).unwrap();
    assert!(asset.sweep_complete());
}

#[test]
fn sweep_is_blocked_while_a_payout_is_outstanding() {
    let mut asset = base_asset(1_000);
    asset.subscribe().unwrap();
    asset.begin_sweep(2_000).unwrap();
    asset.record_sweep(300).unwrap();
    asset.finish_sweep();

    let result = asset.begin_sweep(3_000);
    assert!(result.is_err());

    // paying out the locked index unblocks the next conversion
    asset.clear_locked();
    let locked_slot = asset.begin_sweep(3_000).unwrap();
    assert_eq!(locked_slot, 1);
    assert_eq!(asset.locked().id, 2);
    assert_eq!(asset.open().id, 3);
}

// ------------------------------------------------------------------
// upkeep gating
// ------------------------------------------------------------------

#[test]
fn deposit_is_due_only_past_threshold_and_cooldown() {
    let mut asset = base_asset(0);
    asset.total_rate = MIN_CONVERSION_VALUE / DAY as u128;

    // accrual too small
    assert!(!asset.requires_deposit(HOUR).unwrap());
    // enough accrual, interval elapsed
    assert!(asset.requires_deposit(2 * DAY).unwrap());

    asset.last_conversion_ts = 2 * DAY;
    asset.held_value = MIN_CONVERSION_VALUE;
    // interval not elapsed yet
    assert!(!asset.requires_deposit(2 * DAY + HOUR - 1).unwrap());
    assert!(asset.requires_deposit(2 * DAY + HOUR).unwrap());

    // undistributed shares block the next conversion
    asset.pending_shares = 10;
    assert!(!asset.requires_deposit(3 * DAY).unwrap());
}

#[test]
fn distribution_is_due_only_after_the_share_cooldown() {
    let mut asset = base_asset(0);
    assert!(!asset.requires_distribution(10 * DAY));

    asset.pending_shares = 10;
    asset.last_deposit_ts = 5 * DAY;
    assert!(!asset.requires_distribution(5 * DAY + SHARE_EXIT_COOLDOWN_SECONDS - 1));
    assert!(asset.requires_distribution(5 * DAY + SHARE_EXIT_COOLDOWN_SECONDS));
}

#[test]
fn observe_folds_accrual_and_never_rewinds() {
    let mut asset = base_asset(1_000);
    asset.total_rate = 10;

    assert_eq!(asset.estimated_accrued(1_100).unwrap(), 1_000);
    asset.observe(1_100).unwrap();
    assert_eq!(asset.held_value, 1_000);
    assert_eq!(asset.last_observed_ts, 1_100);

    // a stale timestamp adds nothing and keeps the clock in place
    asset.observe(1_050).unwrap();
    assert_eq!(asset.held_value, 1_000);
    assert_eq!(asset.last_observed_ts, 1_100);
}

#[test]
fn exit_cooldown_counts_down_to_zero() {
    assert_eq!(exit_cooldown_remaining(100, 50, 100), 50);
    assert_eq!(exit_cooldown_remaining(100, 50, 130), 20);
    assert_eq!(exit_cooldown_remaining(100, 50, 150), 0);
    assert_eq!(exit_cooldown_remaining(100, 50, 500), 0);
}

// ------------------------------------------------------------------
// a full cycle over the ledgers
// ------------------------------------------------------------------

#[test]
fn two_streams_sweep_to_a_two_to_one_weighting() {
    let mut asset = base_asset(0);

    // depositor A streams twice as fast as depositor B
    let mut a = base_position(20, 10_000_000, 0);
    let mut b = base_position(10, 10_000_000, 0);
    asset.subscribe().unwrap();
    asset.subscribe().unwrap();

    let sweep_ts = DAY;
    a.settle(sweep_ts).unwrap();
    b.settle(sweep_ts).unwrap();
    let units_a = a.take_for_conversion().unwrap();
    let units_b = b.take_for_conversion().unwrap();
    assert_eq!(units_a, 2 * units_b);

    let total = units_a + units_b;
    asset.begin_sweep(sweep_ts).unwrap();
    asset.record_sweep(units_a).unwrap();
    asset.record_sweep(units_b).unwrap();
    assert!(asset.sweep_complete());
    assert_eq!(asset.locked().total_units, total);
    asset.finish_sweep();

    // 900 shares come back from the vault
    let shares = 900u64;
    let paid_a = fees::pro_rata(shares, units_a, total).unwrap();
    let paid_b = fees::pro_rata(shares, units_b, total).unwrap();
    assert_eq!(paid_a, 600);
    assert_eq!(paid_b, 300);
    assert!(paid_a + paid_b <= shares);
}

#[test]
fn value_is_conserved_across_a_full_stream_lifecycle() {
    let mut position = base_position(10, 10_000_000, 0);
    let mut converted = 0u128;
    let mut refunded = 0u128;

    position.settle(1_000).unwrap();
    position.apply_rate_change(25, HOUR).unwrap();
    assert_eq!(
        position.streamable_units + position.uninvested_units + position.prepaid_units,
        10_000_000
    );

    position.settle(2_000).unwrap();
    converted += position.take_for_conversion().unwrap();

    position.settle(3_000).unwrap();
    if let RateSettlement::Refunded(amount) = position.apply_rate_change(5, HOUR).unwrap() {
        refunded += amount;
    }
    refunded += position.release_all().unwrap();

    // every escrowed unit left either through a conversion or a refund
    assert_eq!(converted + refunded, position.total_streamed_in);
    assert_eq!(position.streamable_units, 0);
    assert_eq!(position.uninvested_units, 0);
    assert_eq!(position.prepaid_units, 0);
}

#[test]
fn speeding_up_to_sixty_tokens_monthly_accrues_about_two_per_day() {
    // 60 whole tokens per commitment horizon, in 18-decimal value units
    let sixty_tokens = fees::from_token_amount(60_000_000, 6).unwrap();
    let rate = sixty_tokens / COMMITMENT_HORIZON_SECONDS as u128;

    // the stream was swept moments ago and the escrow covers the fee
    let mut position = base_position(3, 100 * sixty_tokens, 0);
    position.settle(DAY).unwrap();
    position.take_for_conversion().unwrap();

    let settlement = position
        .apply_rate_change(rate, COMMITMENT_HORIZON_SECONDS)
        .unwrap();
    assert!(matches!(settlement, RateSettlement::Charged(_)));

    let accrued = position.calc_uninvested(2 * DAY).unwrap();
    assert_eq!(fees::to_token_amount(accrued, 6).unwrap(), 1_999_999);
}

#[test]
fn member_lists_must_be_strictly_ascending() {
    let low = Pubkey::new_from_array([1u8; 32]);
    let high = Pubkey::new_from_array([2u8; 32]);

    assert!(assert_ascending_member(None, low).is_ok());
    assert!(assert_ascending_member(Some(low), high).is_ok());
    // a duplicated member cannot satisfy the ordering
    assert!(assert_ascending_member(Some(low), low).is_err());
    assert!(assert_ascending_member(Some(high), low).is_err());
}

// ------------------------------------------------------------------
// core configuration
// ------------------------------------------------------------------

#[test]
fn core_gate_rejects_inactive_and_uninitialized() {
    let mut core = Core {
        initialized: true,
        bump: 253,
        authority: Pubkey::new_unique(),
        fee_treasury: Pubkey::new_unique(),
        deposit_fee_rate: 20_000,
        active: true,
        deactivation_reason: [b' '; 32],
        asset_count: 0,
        created_on_utc: 0,
    };
    assert!(core.assert_active().is_ok());

    core.active = false;
    assert!(core.assert_active().is_err());

    core.active = true;
    core.initialized = false;
    assert!(core.assert_active().is_err());
}

#[test]
fn deactivated_core_still_passes_the_exit_gate() {
    let mut core = Core {
        initialized: true,
        bump: 253,
        authority: Pubkey::new_unique(),
        fee_treasury: Pubkey::new_unique(),
        deposit_fee_rate: 20_000,
        active: false,
        deactivation_reason: [b' '; 32],
        asset_count: 0,
        created_on_utc: 0,
    };
    // terminations and payouts stay available while deactivated
    assert!(core.assert_initialized().is_ok());
    assert!(core.assert_active().is_err());

    core.initialized = false;
    assert!(core.assert_initialized().is_err());
}

#[test]
fn fee_rate_is_bounded() {
    assert!(Core::validate_fee_rate(0).is_ok());
    assert!(Core::validate_fee_rate(MAX_DEPOSIT_PERCENT_FEE).is_ok());
    assert!(Core::validate_fee_rate(MAX_DEPOSIT_PERCENT_FEE + 1).is_err());
}

#[test]
fn deactivation_reason_must_fit() {
    assert!(string_to_bytes("maintenance".to_string()).is_ok());
    assert!(string_to_bytes("x".repeat(33)).is_err());
}
