//! # Vault Events
//!
//! Every state transition the vault commits is recorded as a typed event in
//! an append-only in-memory log. The log is the audit trail for operators
//! and the feed behind the node's event stream; nothing in the engine ever
//! reads it back to make a decision.
//!
//! Events carry the quantities a reader needs to reconstruct what happened
//! without replaying the books: claims carry the minted or burned share
//! count and the managed total after the operation, rejections carry what
//! was released or credited back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{Amount, RateMicrobip, Timestamp, VaultParams};

// ---------------------------------------------------------------------------
// Event Envelope
// ---------------------------------------------------------------------------

/// A committed state transition, stamped and identified.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VaultEvent {
    /// Unique event id.
    pub id: Uuid,
    /// Wall-clock time the event was recorded.
    pub at: DateTime<Utc>,
    /// What happened.
    pub kind: EventKind,
}

impl VaultEvent {
    /// Stamps a new event around the given transition.
    pub fn new(kind: EventKind) -> Self {
        Self { id: Uuid::new_v4(), at: Utc::now(), kind }
    }
}

// ---------------------------------------------------------------------------
// Event Kinds
// ---------------------------------------------------------------------------

/// The state transitions the vault records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// An investment request entered the book and assets moved to custody.
    InvestmentRequested {
        id: String,
        investor: String,
        amount: Amount,
        committed_until: Timestamp,
    },
    /// An approver accepted an investment request.
    InvestmentApproved { id: String },
    /// An approved investment was claimed; shares were minted.
    InvestmentClaimed {
        id: String,
        investor: String,
        amount: Amount,
        shares_minted: Amount,
        total_value: Amount,
    },
    /// An investment request was rejected; the escrow became a pending refund.
    InvestmentRejected {
        id: String,
        investor: String,
        refund: Amount,
    },

    /// A withdrawal request entered the book with its share cost frozen.
    WithdrawalRequested {
        id: String,
        investor: String,
        amount: Amount,
        shares: Amount,
    },
    /// An approver accepted a withdrawal request and reserved its shares.
    WithdrawalApproved { id: String, shares_reserved: Amount },
    /// An approved withdrawal was claimed; shares were burned and assets paid.
    WithdrawalClaimed {
        id: String,
        investor: String,
        amount: Amount,
        shares_burned: Amount,
        total_value: Amount,
    },
    /// A withdrawal request was rejected; its reservation was released.
    WithdrawalRejected {
        id: String,
        investor: String,
        shares_released: Amount,
    },

    /// A pending refund was paid out of custody.
    RefundClaimed { investor: String, amount: Amount },

    /// Shares moved directly between two allowlisted holders.
    SharesTransferred {
        from: String,
        to: String,
        shares: Amount,
    },

    /// An admin replaced the managed total outright.
    TotalValueSet { previous: Amount, updated: Amount },
    /// The daily yield rate changed; accrual at the old rate was settled
    /// into the recorded total first.
    RateChanged {
        previous: RateMicrobip,
        updated: RateMicrobip,
        settled_total: Amount,
    },
    /// Operational parameters changed (bounds, guard, open flag).
    ParamsUpdated { params: VaultParams },
    /// The custody account changed.
    CustodianChanged { previous: String, updated: String },
    /// An owner granted or revoked an operator.
    OperatorSet {
        owner: String,
        operator: String,
        authorized: bool,
    },

    /// The paused vault moved custody funds to a recovery destination.
    EmergencyWithdrawal {
        destination: String,
        amount: Amount,
        shares_burned: Amount,
    },
}

impl EventKind {
    /// Stable label for counters and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::InvestmentRequested { .. } => "investment_requested",
            EventKind::InvestmentApproved { .. } => "investment_approved",
            EventKind::InvestmentClaimed { .. } => "investment_claimed",
            EventKind::InvestmentRejected { .. } => "investment_rejected",
            EventKind::WithdrawalRequested { .. } => "withdrawal_requested",
            EventKind::WithdrawalApproved { .. } => "withdrawal_approved",
            EventKind::WithdrawalClaimed { .. } => "withdrawal_claimed",
            EventKind::WithdrawalRejected { .. } => "withdrawal_rejected",
            EventKind::RefundClaimed { .. } => "refund_claimed",
            EventKind::SharesTransferred { .. } => "shares_transferred",
            EventKind::TotalValueSet { .. } => "total_value_set",
            EventKind::RateChanged { .. } => "rate_changed",
            EventKind::ParamsUpdated { .. } => "params_updated",
            EventKind::CustodianChanged { .. } => "custodian_changed",
            EventKind::OperatorSet { .. } => "operator_set",
            EventKind::EmergencyWithdrawal { .. } => "emergency_withdrawal",
        }
    }
}
