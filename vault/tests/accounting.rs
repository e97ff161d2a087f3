//! Numeric property tests for the Meridian vault.
//!
//! Where the lifecycle suite proves the flows compose, this suite pins the
//! arithmetic: decimal-offset bootstrap precision, closed-form accrual
//! values, rounding direction, conservation between the books and custody,
//! and the exact boundaries of the growth guard.
//!
//! Each scenario wires a fresh vault against in-memory collaborators.

use meridian_vault::account::{Collaborators, VaultAccount};
use meridian_vault::collaborators::{Allowlist, AssetBook, OperatorTable, PauseSwitch, Role, RoleTable};
use meridian_vault::config::{Timestamp, VaultParams};
use meridian_vault::error::VaultError;
use meridian_vault::holdings::HoldingsError;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const T0: Timestamp = 1_700_000_000;
const DAY: Timestamp = 86_400;

struct World {
    vault: VaultAccount,
    assets: AssetBook,
    pause: PauseSwitch,
}

fn default_params() -> VaultParams {
    VaultParams {
        min_investment: 1,
        max_investment: 1_000_000_000_000,
        min_withdrawal: 1,
        max_withdrawal: 1_000_000_000_000,
        daily_yield_rate: 0,
        growth_guard_factor: 0,
        is_open: true,
    }
}

/// Builds a vault with the given parameters and decimal configuration.
/// Wallets are funded generously; "desk" approves, "treasury" configures.
fn custom_world(params: VaultParams, share_decimals: u8, asset_decimals: u8) -> World {
    let allowlist = Allowlist::with_members(["alice", "bob", "custody"]);
    let roles = RoleTable::new();
    roles.grant("desk", Role::Approver);
    roles.grant("treasury", Role::Config);
    let assets = AssetBook::new();
    assets.deposit("alice", 1_000_000_000_000);
    assets.deposit("bob", 1_000_000_000_000);
    let pause = PauseSwitch::new();
    let collaborators = Collaborators {
        allowlist: Box::new(allowlist.clone()),
        roles: Box::new(roles),
        assets: Box::new(assets.clone()),
        pause: Box::new(pause.clone()),
        operators: Box::new(OperatorTable::new()),
    };
    let vault =
        VaultAccount::new(params, "custody", share_decimals, asset_decimals, collaborators)
            .expect("vault");
    World { vault, assets, pause }
}

fn world() -> World {
    custom_world(default_params(), 6, 6)
}

fn invest(w: &mut World, who: &str, id: &str, amount: u128, now: Timestamp) {
    w.vault.request_investment(who, id, amount, 0, now).expect("request");
    w.vault.approve_investment("desk", id).expect("approve");
    w.vault.claim_investment(who, id, who, now).expect("claim");
}

fn withdraw(w: &mut World, who: &str, id: &str, amount: u128, now: Timestamp) {
    w.vault.request_withdrawal(who, id, amount, now).expect("request");
    w.vault.approve_withdrawal("desk", id).expect("approve");
    w.vault.claim_withdrawal(who, id, now).expect("claim");
}

// ---------------------------------------------------------------------------
// 1. Decimal-Offset Bootstrap Is Exact
// ---------------------------------------------------------------------------

#[test]
fn offset_bootstrap_round_trips_a_single_unit() {
    // 18-decimal shares over a 6-decimal asset: offset 10^12.
    let mut w = custom_world(default_params(), 18, 6);

    invest(&mut w, "alice", "inv-1", 1, T0);
    assert_eq!(w.vault.balance_of("alice"), 1_000_000_000_000);
    assert_eq!(w.vault.total_shares(), 1_000_000_000_000);
    assert_eq!(w.vault.stored_total_value(), 1);

    // The full position converts back to exactly the unit that went in.
    assert_eq!(w.vault.convert_to_assets(1_000_000_000_000, T0).unwrap(), 1);
    withdraw(&mut w, "alice", "wd-1", 1, T0);
    assert_eq!(w.vault.total_shares(), 0);
    assert_eq!(w.vault.stored_total_value(), 0);
    assert_eq!(w.assets.balance_of("alice"), 1_000_000_000_000);
}

// ---------------------------------------------------------------------------
// 2. Closed-Form Accrual
// ---------------------------------------------------------------------------

#[test]
fn daily_accrual_matches_the_closed_form() {
    let mut w = world();
    invest(&mut w, "alice", "inv-1", 1_000_000_000, T0);

    // 10_000 microbips per day = a factor of 1.000001 per whole day.
    w.vault.set_daily_yield_rate("treasury", 10_000, T0).unwrap();

    // (1.000001)^9 = 1.000009000036000084; on 10^9 that floors to +9_000.
    assert_eq!(w.vault.current_total_value(T0 + 9 * DAY).unwrap(), 1_000_009_000);

    // Partial days do not count: one second short of day ten still pays
    // nine days.
    assert_eq!(w.vault.current_total_value(T0 + 10 * DAY - 1).unwrap(), 1_000_009_000);

    // (1.000001)^10 = 1.000010000045000120; on 10^9 that floors to +10_000.
    assert_eq!(w.vault.current_total_value(T0 + 10 * DAY).unwrap(), 1_000_010_000);

    // Reads never touch the stored snapshot.
    assert_eq!(w.vault.stored_total_value(), 1_000_000_000);
    assert_eq!(w.vault.value_updated_at(), T0);

    // A clock that reads before the snapshot accrues nothing.
    assert_eq!(w.vault.current_total_value(T0 - 100).unwrap(), 1_000_000_000);
}

#[test]
fn accrual_compounds_rather_than_adds() {
    let mut w = world();
    invest(&mut w, "alice", "inv-1", 1_000, T0);
    // An implausible 10% per day makes the compounding visible in four
    // digits: 1100, 1210, 1331 rather than 1100, 1200, 1300.
    w.vault.set_daily_yield_rate("treasury", 1_000_000_000, T0).unwrap();

    assert_eq!(w.vault.current_total_value(T0 + DAY).unwrap(), 1_100);
    assert_eq!(w.vault.current_total_value(T0 + 2 * DAY).unwrap(), 1_210);
    assert_eq!(w.vault.current_total_value(T0 + 3 * DAY).unwrap(), 1_331);
}

#[test]
fn accrued_reads_are_stable_and_monotonic() {
    let mut w = world();
    invest(&mut w, "alice", "inv-1", 1_000, T0);
    w.vault.set_daily_yield_rate("treasury", 1_000_000_000, T0).unwrap();

    let hour = 3_600;
    let samples = [T0, T0 + hour, T0 + DAY, T0 + DAY + hour, T0 + 2 * DAY];
    let mut previous = 0;
    for now in samples {
        let value = w.vault.current_total_value(now).unwrap();
        // Repeated reads at the same instant agree.
        assert_eq!(w.vault.current_total_value(now).unwrap(), value);
        assert!(value >= previous);
        previous = value;
    }
    assert_eq!(w.vault.stored_total_value(), 1_000);
}

// ---------------------------------------------------------------------------
// 3. Rounding Direction
// ---------------------------------------------------------------------------

#[test]
fn every_rounding_decision_favors_the_vault() {
    let mut w = world();
    // An awkward ratio: 3 shares against a managed total of 1000.
    invest(&mut w, "alice", "inv-1", 3, T0);
    w.vault.update_total_value("treasury", 1_000, T0).unwrap();

    // Minting floors: 100 units of assets buy zero shares at this ratio.
    assert_eq!(w.vault.preview_deposit(100, T0).unwrap(), 0);
    // Withdrawing ceils: the same 100 units cost a whole share.
    assert_eq!(w.vault.preview_withdraw(100, T0).unwrap(), 1);

    // Charging for a share ceils; paying for one floors.
    assert_eq!(w.vault.preview_mint(1, T0).unwrap(), 334);
    assert_eq!(w.vault.preview_redeem(1, T0).unwrap(), 333);
}

// ---------------------------------------------------------------------------
// 4. Books Balance Against Custody
// ---------------------------------------------------------------------------

#[test]
fn custody_tracks_the_managed_total_exactly() {
    let mut w = world();
    // With a zero rate and no manual revaluations, every unit in the
    // managed total sits in custody and backs exactly one share.
    let balanced = |w: &World, expected: u128| {
        assert_eq!(w.assets.balance_of("custody"), expected);
        assert_eq!(w.vault.stored_total_value(), expected);
        assert_eq!(w.vault.total_shares(), expected);
    };

    invest(&mut w, "alice", "inv-1", 1_000, T0);
    balanced(&w, 1_000);
    invest(&mut w, "bob", "inv-2", 700, T0);
    balanced(&w, 1_700);
    withdraw(&mut w, "alice", "wd-1", 300, T0);
    balanced(&w, 1_400);
    withdraw(&mut w, "bob", "wd-2", 700, T0);
    balanced(&w, 700);
    invest(&mut w, "alice", "inv-3", 200, T0);
    balanced(&w, 900);
}

// ---------------------------------------------------------------------------
// 5. Growth Guard Boundaries
// ---------------------------------------------------------------------------

#[test]
fn growth_guard_refuses_strictly_above_the_multiple() {
    let mut w = world();
    invest(&mut w, "alice", "inv-1", 1_000, T0);
    w.vault.set_growth_guard("treasury", 10).unwrap();

    // 1000 + 9001 lands strictly above 10x; 1000 + 9000 lands exactly on it.
    assert!(matches!(
        w.vault.request_investment("bob", "inv-2", 9_001, 0, T0),
        Err(VaultError::GrowthLimitExceeded { max_allowed: 10_000, .. })
    ));
    w.vault.request_investment("bob", "inv-3", 9_000, 0, T0).unwrap();

    // Replacement totals follow the same strict rule.
    w.vault.update_total_value("treasury", 10_000, T0).unwrap();
    assert!(matches!(
        w.vault.update_total_value("treasury", 100_001, T0),
        Err(VaultError::GrowthLimitExceeded { max_allowed: 100_000, .. })
    ));
    w.vault.update_total_value("treasury", 100_000, T0).unwrap();

    // Factor one allows standing still but not growing.
    w.vault.set_growth_guard("treasury", 1).unwrap();
    w.vault.update_total_value("treasury", 100_000, T0).unwrap();
    assert!(matches!(
        w.vault.update_total_value("treasury", 100_001, T0),
        Err(VaultError::GrowthLimitExceeded { .. })
    ));
}

#[test]
fn guard_is_rechecked_when_the_claim_lands() {
    let mut w = world();
    invest(&mut w, "alice", "inv-1", 1_000, T0);
    w.vault.set_growth_guard("treasury", 2).unwrap();

    // Admission passes at request time: 1000 + 900 is inside 2x.
    w.vault.request_investment("bob", "inv-2", 900, 0, T0).unwrap();
    w.vault.approve_investment("desk", "inv-2").unwrap();

    // The managed total collapses before the claim; 500 + 900 now breaks
    // the 2x ceiling, so the claim is refused and nothing moves.
    w.vault.update_total_value("treasury", 500, T0).unwrap();
    assert!(matches!(
        w.vault.claim_investment("bob", "inv-2", "bob", T0),
        Err(VaultError::GrowthLimitExceeded { current: 500, requested: 1_400, .. })
    ));
    assert_eq!(w.vault.total_shares(), 1_000);
    assert_eq!(w.vault.stored_total_value(), 500);

    // The stranded escrow resolves through rejection and refund.
    w.vault.reject_investment("desk", "inv-2").unwrap();
    assert_eq!(w.vault.claim_refund("bob").unwrap(), 900);
    assert_eq!(w.assets.balance_of("bob"), 1_000_000_000_000);
}

// ---------------------------------------------------------------------------
// 6. Commitment Boundary
// ---------------------------------------------------------------------------

#[test]
fn commitment_expires_exactly_at_its_timestamp() {
    let mut w = world();
    let until = T0 + DAY;
    w.vault.request_investment("alice", "inv-1", 1_000, until, T0).unwrap();
    w.vault.approve_then_claim_investment("desk", "inv-1", "alice", T0).unwrap();

    assert!(matches!(
        w.vault.request_withdrawal("alice", "wd-1", 1, until - 1),
        Err(VaultError::Holdings(HoldingsError::CommittedBalance { .. }))
    ));
    w.vault.request_withdrawal("alice", "wd-2", 1, until).unwrap();
}

// ---------------------------------------------------------------------------
// 7. Zero-Liquidity Guards
// ---------------------------------------------------------------------------

#[test]
fn empty_vault_refuses_to_price_withdrawals() {
    let mut w = world();
    assert!(matches!(
        w.vault.request_withdrawal("alice", "wd-1", 100, T0),
        Err(VaultError::NoLiquidity)
    ));
    assert!(matches!(w.vault.preview_withdraw(100, T0), Err(VaultError::NoLiquidity)));
    assert_eq!(w.vault.max_withdraw("alice", T0).unwrap(), 0);

    // Deposit-side previews still work through the bootstrap scaling.
    assert_eq!(w.vault.preview_deposit(100, T0).unwrap(), 100);
    assert_eq!(w.vault.convert_to_assets(100, T0).unwrap(), 0);
}

// ---------------------------------------------------------------------------
// 8. Emergency Pricing Rounds Against the User
// ---------------------------------------------------------------------------

#[test]
fn emergency_withdrawal_burns_the_ceiling_share_equivalent() {
    let mut w = world();
    invest(&mut w, "alice", "inv-1", 1_000, T0);
    w.vault.update_total_value("treasury", 1_500, T0).unwrap();
    w.pause.set(true);

    // 100 units at 1000 shares / 1500 value: ceil(66.66) = 67 shares.
    let burned = w.vault.emergency_withdraw("treasury", "alice", 100, T0).unwrap();
    assert_eq!(burned, 67);
    assert_eq!(w.vault.balance_of("alice"), 933);
    assert_eq!(w.vault.total_shares(), 933);
    assert_eq!(w.vault.stored_total_value(), 1_400);
    assert_eq!(w.assets.balance_of("custody"), 900);
}
