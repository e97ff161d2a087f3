//! # Vault Error Surface
//!
//! Every fallible vault operation returns [`VaultError`]. Module-level
//! errors (conversion, accrual, ledger, holdings, transfer) convert in via
//! `#[from]`; the variants declared here cover the checks the aggregate
//! itself performs: admission, authorization, operational mode, and the
//! economic guards.
//!
//! [`VaultError::kind`] collapses the full surface into five coarse
//! classes. Callers that need to translate failures into transport-level
//! responses or counters match on the class instead of every variant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::accrual::AccrualError;
use crate::collaborators::{Role, TransferError};
use crate::config::Amount;
use crate::conversion::ConversionError;
use crate::holdings::HoldingsError;
use crate::ledger::LedgerError;

// ---------------------------------------------------------------------------
// Error Kind
// ---------------------------------------------------------------------------

/// Coarse classification of vault failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input: zero or out-of-bounds amounts, empty identifiers,
    /// inverted bounds.
    Validation,
    /// The operation is legal but the current state refuses it: duplicate
    /// or missing requests, wrong lifecycle stage, wrong operational mode.
    StateConflict,
    /// The caller lacks membership, role, or delegation.
    Authorization,
    /// An economic policy refused: growth guard, dust payouts, missing
    /// refunds, insufficient or committed balances.
    EconomicGuard,
    /// Checked arithmetic overflowed.
    Arithmetic,
}

impl ErrorKind {
    /// Stable label for counters and log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::StateConflict => "state_conflict",
            ErrorKind::Authorization => "authorization",
            ErrorKind::EconomicGuard => "economic_guard",
            ErrorKind::Arithmetic => "arithmetic",
        }
    }
}

// ---------------------------------------------------------------------------
// Vault Errors
// ---------------------------------------------------------------------------

/// Failures surfaced by vault operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VaultError {
    /// The operation was given a zero amount where value must move.
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// The amount falls outside the configured per-operation bounds.
    #[error("amount {amount} outside configured bounds [{min}, {max}]")]
    OutOfBounds {
        /// The offered amount.
        amount: Amount,
        /// Configured lower bound, inclusive.
        min: Amount,
        /// Configured upper bound, inclusive.
        max: Amount,
    },

    /// An identity string was empty.
    #[error("identity must not be empty")]
    EmptyIdentity,

    /// A bounds update put the minimum above the maximum.
    #[error("invalid bounds: min {min} exceeds max {max}")]
    InvalidBounds {
        /// Proposed lower bound.
        min: Amount,
        /// Proposed upper bound.
        max: Amount,
    },

    /// The vault is closed to new investment.
    #[error("vault is closed to new investment")]
    Closed,

    /// The vault is paused; normal flows are suspended.
    #[error("vault is paused")]
    Paused,

    /// The operation requires the vault to be paused first.
    #[error("vault is not paused")]
    NotPaused,

    /// The caller lacks the required role.
    #[error("{identity} does not hold the {role} role")]
    MissingRole {
        /// The caller.
        identity: String,
        /// The role the operation requires.
        role: Role,
    },

    /// The identity is not on the allowlist.
    #[error("{identity} is not allowlisted")]
    NotAllowlisted {
        /// The refused identity.
        identity: String,
    },

    /// The caller may not act on this request.
    #[error("{caller} is neither {owner} nor an operator for them")]
    NotOwnerOrOperator {
        /// Who tried.
        caller: String,
        /// Who owns the request.
        owner: String,
    },

    /// The proposed managed total exceeds the growth guard's ceiling.
    #[error(
        "growth guard refused: proposed total {requested} exceeds {max_allowed} allowed from {current}"
    )]
    GrowthLimitExceeded {
        /// Managed total before the change.
        current: Amount,
        /// The proposed total after the change.
        requested: Amount,
        /// The guard ceiling at this moment.
        max_allowed: Amount,
    },

    /// The vault holds no shares or no value, so no ratio exists to price
    /// the operation.
    #[error("vault holds no shares or no value to price the operation")]
    NoLiquidity,

    /// No pending refund exists for the identity.
    #[error("{identity} has no pending refund")]
    NoRefund {
        /// The claimant.
        identity: String,
    },

    /// The share amount converts to zero asset units.
    #[error("{shares} shares convert to a zero payout")]
    ZeroPayout {
        /// The shares that produced no value.
        shares: Amount,
    },

    /// Share/asset conversion failed.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Yield accrual failed.
    #[error(transparent)]
    Accrual(#[from] AccrualError),

    /// The request book refused.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The holdings books refused.
    #[error(transparent)]
    Holdings(#[from] HoldingsError),

    /// The asset ledger refused a transfer.
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

impl VaultError {
    /// The coarse class this failure belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::ZeroAmount
            | VaultError::OutOfBounds { .. }
            | VaultError::EmptyIdentity
            | VaultError::InvalidBounds { .. } => ErrorKind::Validation,

            VaultError::Closed | VaultError::Paused | VaultError::NotPaused => {
                ErrorKind::StateConflict
            }

            VaultError::MissingRole { .. }
            | VaultError::NotAllowlisted { .. }
            | VaultError::NotOwnerOrOperator { .. } => ErrorKind::Authorization,

            VaultError::GrowthLimitExceeded { .. }
            | VaultError::ZeroPayout { .. }
            | VaultError::NoRefund { .. }
            | VaultError::NoLiquidity => ErrorKind::EconomicGuard,

            VaultError::Conversion(_) | VaultError::Accrual(_) => ErrorKind::Arithmetic,

            VaultError::Ledger(err) => match err {
                LedgerError::EmptyId | LedgerError::DuplicateId { .. } => ErrorKind::Validation,
                _ => ErrorKind::StateConflict,
            },

            VaultError::Holdings(err) => match err {
                HoldingsError::Overflow { .. } => ErrorKind::Arithmetic,
                _ => ErrorKind::EconomicGuard,
            },

            VaultError::Transfer(_) => ErrorKind::EconomicGuard,
        }
    }
}
