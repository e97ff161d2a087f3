// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Meridian Vault — Core Library
//!
//! The accounting engine behind Meridian: a permissioned, asynchronous
//! tokenized vault for real-world asset funds, where deposits and
//! withdrawals are requests that a human approves before money moves.
//!
//! Meridian takes a deliberately boring stance: every balance is an
//! integer in the smallest unit (because floating-point money is how you
//! end up in the news), every rounding decision favors the vault (because
//! dust leaks compound), and every state transition either fully happens
//! or leaves no trace (because partially-applied money is worse than no
//! money).
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the actual concerns of an
//! asset-management vault:
//!
//! - **account** — The aggregate root. Admission, lifecycle, commit.
//! - **accrual** — Daily-compounded value growth and the growth guard.
//! - **collaborators** — Allowlist, roles, custody ledger, pause, operators.
//! - **config** — Parameters, primitive aliases, fixed-point constants.
//! - **conversion** — Share/asset math with explicit rounding direction.
//! - **error** — One error surface, classified for transport mapping.
//! - **events** — The append-only audit trail.
//! - **holdings** — Shares, commitments, reservations, refunds.
//! - **ledger** — Investment and withdrawal request books.
//!
//! ## Design Philosophy
//!
//! 1. Time is an argument, never an ambient read. Callers say what "now"
//!    is; the engine just does arithmetic.
//! 2. Rounding is asymmetric on purpose. Mint floor, charge ceiling; the
//!    vault never pays out more than it took in.
//! 3. Refusals are free. Every operation checks everything it can before
//!    mutating anything.
//! 4. If it touches money, it has tests. Plural.

pub mod account;
pub mod accrual;
pub mod collaborators;
pub mod config;
pub mod conversion;
pub mod error;
pub mod events;
pub mod holdings;
pub mod ledger;
