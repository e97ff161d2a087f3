//! # Request Ledger — Investment & Withdrawal Lifecycles
//!
//! The ledger owns every request ever made against the vault. Requests are
//! keyed by caller-supplied string ids, live in two separate namespaces
//! (an investment id and a withdrawal id never collide with each other),
//! and follow an append-only discipline: a record is created once, mutated
//! in place through its lifecycle, and never deleted. A completed or
//! rejected id is permanently closed — resubmission happens under a new id,
//! not by reopening an old one.
//!
//! ## Architecture
//!
//! ```text
//! investment.rs — InvestmentRequest + InvestmentBook
//! withdrawal.rs — WithdrawalRequest + WithdrawalBook
//! ```
//!
//! Both sides share the same transition guards: approval and rejection are
//! mutually exclusive terminal-track outcomes, a claim requires a prior
//! approval, and every illegal transition surfaces as a specific
//! [`LedgerError`] — the books never panic and never silently no-op.
//!
//! The books store lifecycle state and enforce transition legality. They
//! know nothing about money: share math, reservations, commitments, and
//! asset transfers are the aggregate root's business.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod investment;
pub mod withdrawal;

pub use investment::{InvestmentBook, InvestmentRequest};
pub use withdrawal::{WithdrawalBook, WithdrawalRequest};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Invalid identifiers and illegal lifecycle transitions.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The caller supplied an empty request id.
    #[error("request id must not be empty")]
    EmptyId,

    /// The id was already used by an earlier request in the same namespace.
    /// Ids are single-use regardless of how the earlier request resolved.
    #[error("request id {id} already exists")]
    DuplicateId {
        /// The contested id.
        id: String,
    },

    /// No request with this id exists in the namespace.
    #[error("request {id} not found")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    /// The request was already approved; approval is not idempotent.
    #[error("request {id} is already approved")]
    AlreadyApproved {
        /// The request id.
        id: String,
    },

    /// The request was already claimed — a terminal state.
    #[error("request {id} is already claimed")]
    AlreadyClaimed {
        /// The request id.
        id: String,
    },

    /// The request was already rejected — a terminal state. A rejected id
    /// can never be approved or claimed.
    #[error("request {id} is already rejected")]
    AlreadyRejected {
        /// The request id.
        id: String,
    },

    /// A claim was attempted before approval.
    #[error("request {id} is not approved")]
    NotApproved {
        /// The request id.
        id: String,
    },
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// A request's position in its lifecycle, derived from the stored flags.
///
/// Storage keeps the raw `approved` / `claimed` / `rejected` flags (rejection
/// is tracked separately from approval on purpose); this enum is the
/// human-facing projection for logs and API views.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Created, awaiting an approver's decision.
    Pending,
    /// Approved, awaiting a claim.
    Approved,
    /// Claimed. Terminal.
    Claimed,
    /// Rejected. Terminal.
    Rejected,
}

impl RequestStatus {
    /// Derives the status from the stored lifecycle flags.
    pub fn from_flags(approved: bool, claimed: bool, rejected: bool) -> Self {
        if rejected {
            RequestStatus::Rejected
        } else if claimed {
            RequestStatus::Claimed
        } else if approved {
            RequestStatus::Approved
        } else {
            RequestStatus::Pending
        }
    }

    /// Whether the request can never change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Claimed | RequestStatus::Rejected)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Claimed => "claimed",
            RequestStatus::Rejected => "rejected",
        };
        write!(f, "{}", label)
    }
}
