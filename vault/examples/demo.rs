//! Interactive CLI demo of the full Meridian vault lifecycle.
//!
//! Walks through collaborator wiring, the two-phase investment flow, NAV
//! accrual, a second investor entering at an evolved ratio, withdrawal with
//! reservation, rejection with refund, and the paused emergency path. The
//! output uses ANSI escape codes for colored, storytelling-style terminal
//! rendering.
//!
//! Run with:
//!   cargo run --example demo --release

use std::time::Instant;

use meridian_vault::account::{Collaborators, VaultAccount};
use meridian_vault::collaborators::{
    Allowlist, AssetBook, OperatorTable, PauseSwitch, Role, RoleTable,
};
use meridian_vault::config::{Timestamp, VaultParams, SECONDS_PER_DAY};

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const ITALIC: &str = "\x1b[3m";

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

const BG_BLUE: &str = "\x1b[44m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn banner() {
    println!();
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    MERIDIAN VAULT  --  Permissioned Lifecycle Demo                 {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    Request -> Approve -> Claim  |  Integer Math Only               {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!();
}

fn section(num: u32, title: &str) {
    println!();
    println!(
        "{BOLD}{CYAN}===[{YELLOW} Step {num} {CYAN}]=============================================================={RESET}"
    );
    println!("{BOLD}{WHITE}  {title}{RESET}");
    println!(
        "{CYAN}------------------------------------------------------------------------{RESET}"
    );
}

fn subsection(text: &str) {
    println!("{DIM}{CYAN}  >> {text}{RESET}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn info(label: &str, value: &str) {
    println!("{WHITE}  {BOLD}{label}:{RESET} {YELLOW}{value}{RESET}");
}

fn timing(label: &str, elapsed: std::time::Duration) {
    let ms = elapsed.as_secs_f64() * 1000.0;
    println!("{DIM}{MAGENTA}  [{label}: {ms:.2} ms]{RESET}");
}

fn balance_row(name: &str, balance: u128, color: &str) {
    println!("  {color}{BOLD}{name:<10}{RESET}  {WHITE}{balance:>12}{RESET} {DIM}units{RESET}");
}

fn share_row(name: &str, shares: u128, color: &str) {
    println!("  {color}{BOLD}{name:<10}{RESET}  {WHITE}{shares:>12}{RESET} {DIM}shares{RESET}");
}

fn separator() {
    println!(
        "{DIM}{CYAN}  . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . {RESET}"
    );
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let demo_start = Instant::now();
    banner();

    // The engine takes time as an argument, so the demo can play a month
    // of fund history in microseconds of wall clock.
    const T0: Timestamp = 1_750_000_000;

    // -----------------------------------------------------------------------
    // Step 1: Collaborator Wiring
    // -----------------------------------------------------------------------

    section(1, "Collaborator Wiring");
    subsection("Building allowlist, role table, custody ledger, pause switch, operators...");

    let t = Instant::now();
    let allowlist = Allowlist::with_members(["alice", "bob", "custody"]);
    let roles = RoleTable::new();
    roles.grant("desk", Role::Approver);
    roles.grant("treasury", Role::Config);
    let assets = AssetBook::new();
    assets.deposit("alice", 5_000_000);
    assets.deposit("bob", 3_000_000);
    let pause = PauseSwitch::new();
    let collaborators = Collaborators {
        allowlist: Box::new(allowlist.clone()),
        roles: Box::new(roles),
        assets: Box::new(assets.clone()),
        pause: Box::new(pause.clone()),
        operators: Box::new(OperatorTable::new()),
    };
    timing("collaborator setup", t.elapsed());

    info("Members", "alice, bob, custody");
    info("Approver role", "desk");
    info("Config role", "treasury");
    success("Collaborators wired");

    // -----------------------------------------------------------------------
    // Step 2: Vault Construction
    // -----------------------------------------------------------------------

    section(2, "Vault Construction");
    subsection("Opening a 6/6-decimal vault with a 20x growth guard...");

    let params = VaultParams {
        min_investment: 100,
        max_investment: 10_000_000,
        min_withdrawal: 100,
        max_withdrawal: 10_000_000,
        daily_yield_rate: 0,
        growth_guard_factor: 20,
        is_open: true,
    };
    let mut vault = VaultAccount::new(params, "custody", 6, 6, collaborators).expect("vault");

    info("Custodian", vault.custodian());
    info("Investment bounds", "100 ..= 10,000,000");
    info("Growth guard", "20x per admission");
    success("Vault open for requests");

    // -----------------------------------------------------------------------
    // Step 3: First Investment (Bootstrap)
    // -----------------------------------------------------------------------

    section(3, "First Investment: Alice Bootstraps the Vault");

    subsection("Alice requests 1,000,000 units; funds move to custody escrow...");
    let t = Instant::now();
    vault.request_investment("alice", "inv-alice-1", 1_000_000, 0, T0).unwrap();
    assert_eq!(assets.balance_of("custody"), 1_000_000);
    assert_eq!(vault.total_shares(), 0);

    subsection("The desk approves; Alice claims...");
    vault.approve_investment("desk", "inv-alice-1").unwrap();
    vault.claim_investment("alice", "inv-alice-1", "alice", T0).unwrap();
    timing("request + approve + claim", t.elapsed());

    assert_eq!(vault.balance_of("alice"), 1_000_000);
    assert_eq!(vault.stored_total_value(), 1_000_000);

    println!();
    println!("  {BOLD}{WHITE}--- Position After Bootstrap ---{RESET}");
    share_row("Alice", vault.balance_of("alice"), BLUE);
    balance_row("Custody", assets.balance_of("custody"), MAGENTA);
    println!();
    success("Bootstrap mint: one share per unit, value admitted in full");

    // -----------------------------------------------------------------------
    // Step 4: A Month of NAV Accrual
    // -----------------------------------------------------------------------

    section(4, "NAV Accrual: Thirty Days at 0.005% per Day");

    subsection("The treasury sets the daily yield rate...");
    vault.set_daily_yield_rate("treasury", 500_000, T0).unwrap();

    let month_later = T0 + 30 * SECONDS_PER_DAY;
    let accrued = vault.current_total_value(month_later).unwrap();
    assert!(accrued > 1_000_000 && accrued < 1_002_000);
    // Reads never materialize: the stored snapshot is still the claim-time
    // value until the next mutation lands.
    assert_eq!(vault.stored_total_value(), 1_000_000);

    info("Stored value", &vault.stored_total_value().to_string());
    info("Accrued value (+30d)", &accrued.to_string());
    success("Daily compounding applied lazily, stored snapshot untouched");

    separator();

    subsection("Bob invests 500,000 at the evolved ratio...");
    vault.request_investment("bob", "inv-bob-1", 500_000, 0, month_later).unwrap();
    vault.approve_then_claim_investment("desk", "inv-bob-1", "bob", month_later).unwrap();

    let bob_shares = vault.balance_of("bob");
    assert!(bob_shares < 500_000, "bob pays the accrued price per share");

    println!();
    println!("  {BOLD}{WHITE}--- Positions After Bob Enters ---{RESET}");
    share_row("Alice", vault.balance_of("alice"), BLUE);
    share_row("Bob", bob_shares, GREEN);
    balance_row("Managed", vault.stored_total_value(), MAGENTA);
    println!();
    success("Later entrant pays more per share; early holders keep their gain");

    // -----------------------------------------------------------------------
    // Step 5: Withdrawal with Reservation
    // -----------------------------------------------------------------------

    section(5, "Withdrawal: Alice Takes 200,000 Units Out");

    subsection("Request freezes the ceiling share cost at today's ratio...");
    let t = Instant::now();
    let frozen = vault.request_withdrawal("alice", "wd-alice-1", 200_000, month_later).unwrap().shares;
    info("Frozen share cost", &frozen.to_string());

    subsection("Approval reserves the shares; the claim burns and pays...");
    vault.approve_withdrawal("desk", "wd-alice-1").unwrap();
    assert_eq!(vault.reserved_shares_of("alice"), frozen);
    let wallet_before = assets.balance_of("alice");
    vault.claim_withdrawal("alice", "wd-alice-1", month_later).unwrap();
    timing("request + approve + claim", t.elapsed());

    let paid = assets.balance_of("alice") - wallet_before;
    assert!(paid >= 200_000, "ceiling burn covers the full amount");
    assert_eq!(vault.reserved_shares_of("alice"), 0);

    info("Paid out", &paid.to_string());
    info("Shares burned", &frozen.to_string());
    success("Reservation released, shares burned, custody paid out");

    // -----------------------------------------------------------------------
    // Step 6: Rejection and Refund
    // -----------------------------------------------------------------------

    section(6, "Rejection: The Desk Turns Requests Away");

    subsection("Bob asks to pull 100,000 out; the desk says no...");
    vault.request_withdrawal("bob", "wd-bob-1", 100_000, month_later).unwrap();
    vault.reject_withdrawal("desk", "wd-bob-1").unwrap();
    success("Withdrawal rejected; the id is closed for good");

    subsection("Bob tries to put 300,000 more in; the desk says no again...");
    vault.request_investment("bob", "inv-bob-2", 300_000, 0, month_later).unwrap();
    vault.reject_investment("desk", "inv-bob-2").unwrap();
    assert_eq!(vault.pending_refund_of("bob"), 300_000);

    subsection("Bob claims his refund from custody...");
    let refunded = vault.claim_refund("bob").unwrap();
    assert_eq!(refunded, 300_000);
    assert_eq!(vault.pending_refund_of("bob"), 0);

    info("Refunded", &refunded.to_string());
    success("Escrow returned in full, exactly once");

    // -----------------------------------------------------------------------
    // Step 7: Pause and Emergency
    // -----------------------------------------------------------------------

    section(7, "Emergency: Paused Vault, Config-Role Exit");

    subsection("The pause switch flips; normal flows freeze...");
    pause.set(true);
    assert!(vault.request_withdrawal("alice", "wd-alice-2", 100, month_later).is_err());

    subsection("The treasury runs an emergency withdrawal for Alice...");
    let burned = vault.emergency_withdraw("treasury", "alice", 50_000, month_later).unwrap();
    info("Units moved", "50,000");
    info("Shares burned (ceil)", &burned.to_string());

    pause.set(false);
    success("Pause lifted; normal operation resumes");

    // -----------------------------------------------------------------------
    // Final Summary
    // -----------------------------------------------------------------------

    let total_elapsed = demo_start.elapsed();

    println!();
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    DEMO COMPLETE -- Final Summary                                  {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!();

    println!("  {BOLD}{WHITE}Vault Statistics:{RESET}");
    println!("  {DIM}----------------------------------------------{RESET}");
    info("Events recorded", &vault.event_count().to_string());
    info("Shares outstanding", &vault.total_shares().to_string());
    info("Managed total", &vault.stored_total_value().to_string());
    info("Rounding policy", "mint floor, charge ceiling");
    info("Value model", "lazy daily compounding, 1e18 fixed point");
    info("Arithmetic", "checked u128, zero floats");
    println!();

    println!("  {BOLD}{WHITE}Final Balances:{RESET}");
    println!("  {DIM}----------------------------------------------{RESET}");
    balance_row("Alice", assets.balance_of("alice"), BLUE);
    balance_row("Bob", assets.balance_of("bob"), GREEN);
    balance_row("Custody", assets.balance_of("custody"), MAGENTA);

    // Every unit that left a wallet sits in custody or came back; the
    // asset ledger only ever moved money, never created it.
    let total_in_system =
        assets.balance_of("alice") + assets.balance_of("bob") + assets.balance_of("custody");
    println!();
    println!(
        "  {ITALIC}{DIM}Conservation check: {total_in_system} units across all accounts (seeded: 8000000){RESET}"
    );
    assert_eq!(total_in_system, 8_000_000);

    println!();
    println!(
        "  {BOLD}{GREEN}Total demo time: {:.2}s{RESET}",
        total_elapsed.as_secs_f64()
    );
    println!();
}
