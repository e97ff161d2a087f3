//! # Holdings — Per-Holder Share State
//!
//! Everything the vault knows about an individual holder lives here: their
//! share balance, the slice of it locked under a commitment, the slice
//! reserved by approved-but-unclaimed withdrawals, and any pending refund
//! from a rejected investment.
//!
//! ## Architecture
//!
//! ```text
//! shares.rs      — ShareBook: balances + total supply, mint/burn/move
//! commitment.rs  — CommitmentBook: locked shares with an expiry
//! reservation.rs — ReservationBook: shares earmarked by approved withdrawals
//! refund.rs      — RefundBook: asset refunds awaiting a claim
//! ```
//!
//! ## Design Principles
//!
//! 1. **Checked arithmetic on every mutation.** A wrapped balance is a
//!    solvency bug; every add and sub goes through `checked_*` and surfaces
//!    a [`HoldingsError`] instead of wrapping.
//!
//! 2. **The invariant `committed + reserved <= balance` is enforced at the
//!    points those numbers are set**, not re-validated globally. The books
//!    provide the checks; the aggregate root decides when to run them.
//!
//! 3. **Serializable state.** Every book derives `Serialize`/`Deserialize`
//!    so vault state can be snapshotted or shipped to an API client.

use thiserror::Error;

pub mod commitment;
pub mod refund;
pub mod reservation;
pub mod shares;

pub use commitment::{Commitment, CommitmentBook};
pub use refund::RefundBook;
pub use reservation::ReservationBook;
pub use shares::ShareBook;

use crate::config::Amount;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures in per-holder share accounting.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HoldingsError {
    /// The holder's balance cannot cover the requested shares.
    #[error("{holder} holds {balance} shares, needs {required}")]
    InsufficientShares {
        /// The holder whose balance fell short.
        holder: String,
        /// Their current balance.
        balance: Amount,
        /// What the operation needed.
        required: Amount,
    },

    /// The operation would drop the holder's balance below their active
    /// committed amount.
    #[error("{holder} would retain {would_remain} shares, below the {committed} committed")]
    CommittedBalance {
        /// The holder with the active commitment.
        holder: String,
        /// Shares locked until the commitment expires.
        committed: Amount,
        /// Balance the operation would leave behind.
        would_remain: Amount,
    },

    /// The holder's balance outside existing reservations cannot cover a
    /// further withdrawal request.
    #[error("{holder} has {available} shares outside the {reserved} reserved, needs {required}")]
    ReservedBalance {
        /// The holder with outstanding reservations.
        holder: String,
        /// Shares already reserved by approved withdrawals.
        reserved: Amount,
        /// Balance remaining outside those reservations.
        available: Amount,
        /// What the new request needed.
        required: Amount,
    },

    /// An attempt to release more shares than are reserved. The aggregate
    /// root only releases what it previously reserved, so this is a broken
    /// internal invariant, not a user error.
    #[error("{holder} has {reserved} shares reserved, cannot release {requested}")]
    InsufficientReserved {
        /// The holder whose reservation fell short.
        holder: String,
        /// Their current reservation.
        reserved: Amount,
        /// The release that was attempted.
        requested: Amount,
    },

    /// A balance, supply, or counter exceeded 128 bits.
    #[error("arithmetic overflow in {context}")]
    Overflow {
        /// Which counter overflowed.
        context: &'static str,
    },
}
