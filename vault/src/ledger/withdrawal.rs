//! Withdrawal-side request records and their book.
//!
//! The defining quirk of a withdrawal request: its share cost is computed
//! once, at request time, with ceiling rounding — and never recomputed. If
//! yield accrues between request and claim, the payout is whatever those
//! frozen shares are worth at claim time. The investor wears the ratio
//! drift in both directions; that exposure is observed protocol behavior,
//! not a bug to fix here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{LedgerError, RequestStatus};
use crate::config::Amount;

// ---------------------------------------------------------------------------
// WithdrawalRequest
// ---------------------------------------------------------------------------

/// A single withdrawal request.
///
/// `amount` is what the investor asked for in asset units; `shares` is the
/// ceiling-rounded share cost frozen at request time. Approval reserves
/// those shares against the investor, a claim burns them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    /// Caller-chosen unique id. Never reused, even after resolution.
    pub id: String,

    /// The identity redeeming shares.
    pub investor: String,

    /// Asset units requested at request time.
    pub amount: Amount,

    /// Share cost, ceiling-rounded at request time. Never recomputed.
    pub shares: Amount,

    /// Set by an approver; reserving the shares happens alongside.
    pub approved: bool,

    /// Set when the shares are burned and the payout leaves. Terminal.
    pub claimed: bool,

    /// Terminal rejection flag, tracked separately from `approved`.
    pub rejected: bool,

    /// When the request was recorded.
    pub created_at: DateTime<Utc>,

    /// Last lifecycle transition.
    pub updated_at: DateTime<Utc>,
}

impl WithdrawalRequest {
    /// Creates a fresh, unapproved, unclaimed request.
    pub fn new(id: &str, investor: &str, amount: Amount, shares: Amount) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            investor: investor.to_string(),
            amount,
            shares,
            approved: false,
            claimed: false,
            rejected: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// The derived lifecycle status.
    pub fn status(&self) -> RequestStatus {
        RequestStatus::from_flags(self.approved, self.claimed, self.rejected)
    }

    /// Marks the request approved.
    ///
    /// # Errors
    ///
    /// [`LedgerError::AlreadyClaimed`], [`LedgerError::AlreadyRejected`], or
    /// [`LedgerError::AlreadyApproved`].
    pub fn approve(&mut self) -> Result<(), LedgerError> {
        if self.claimed {
            return Err(LedgerError::AlreadyClaimed { id: self.id.clone() });
        }
        if self.rejected {
            return Err(LedgerError::AlreadyRejected { id: self.id.clone() });
        }
        if self.approved {
            return Err(LedgerError::AlreadyApproved { id: self.id.clone() });
        }
        self.approved = true;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Checks that a claim would be legal without mutating anything.
    ///
    /// # Errors
    ///
    /// [`LedgerError::AlreadyClaimed`], [`LedgerError::AlreadyRejected`], or
    /// [`LedgerError::NotApproved`].
    pub fn ensure_claimable(&self) -> Result<(), LedgerError> {
        if self.claimed {
            return Err(LedgerError::AlreadyClaimed { id: self.id.clone() });
        }
        if self.rejected {
            return Err(LedgerError::AlreadyRejected { id: self.id.clone() });
        }
        if !self.approved {
            return Err(LedgerError::NotApproved { id: self.id.clone() });
        }
        Ok(())
    }

    /// Marks the request claimed.
    ///
    /// # Errors
    ///
    /// Same conditions as [`WithdrawalRequest::ensure_claimable`].
    pub fn claim(&mut self) -> Result<(), LedgerError> {
        self.ensure_claimable()?;
        self.claimed = true;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Checks that a rejection would be legal without mutating anything.
    ///
    /// # Errors
    ///
    /// [`LedgerError::AlreadyClaimed`] or [`LedgerError::AlreadyRejected`].
    pub fn ensure_rejectable(&self) -> Result<(), LedgerError> {
        if self.claimed {
            return Err(LedgerError::AlreadyClaimed { id: self.id.clone() });
        }
        if self.rejected {
            return Err(LedgerError::AlreadyRejected { id: self.id.clone() });
        }
        Ok(())
    }

    /// Marks the request rejected. A previously approved request is demoted
    /// back to unapproved first — the aggregate root releases its share
    /// reservation in the same operation.
    ///
    /// # Errors
    ///
    /// Same conditions as [`WithdrawalRequest::ensure_rejectable`].
    pub fn reject(&mut self) -> Result<(), LedgerError> {
        self.ensure_rejectable()?;
        self.approved = false;
        self.rejected = true;
        self.updated_at = Utc::now();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// WithdrawalBook
// ---------------------------------------------------------------------------

/// Append-only registry of withdrawal requests, keyed by request id.
///
/// A separate namespace from the investment book: the same id string can
/// exist once on each side.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WithdrawalBook {
    requests: HashMap<String, WithdrawalRequest>,
}

impl WithdrawalBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self { requests: HashMap::new() }
    }

    /// Records a new request with its frozen share cost.
    ///
    /// # Errors
    ///
    /// [`LedgerError::EmptyId`] or [`LedgerError::DuplicateId`].
    pub fn create(
        &mut self,
        id: &str,
        investor: &str,
        amount: Amount,
        shares: Amount,
    ) -> Result<&WithdrawalRequest, LedgerError> {
        if id.is_empty() {
            return Err(LedgerError::EmptyId);
        }
        if self.requests.contains_key(id) {
            return Err(LedgerError::DuplicateId { id: id.to_string() });
        }
        let request = WithdrawalRequest::new(id, investor, amount, shares);
        Ok(self.requests.entry(id.to_string()).or_insert(request))
    }

    /// Looks up a request.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`].
    pub fn get(&self, id: &str) -> Result<&WithdrawalRequest, LedgerError> {
        self.requests
            .get(id)
            .ok_or_else(|| LedgerError::NotFound { id: id.to_string() })
    }

    /// Whether the id is taken (in any state).
    pub fn contains(&self, id: &str) -> bool {
        self.requests.contains_key(id)
    }

    /// Approves a request and returns the updated record.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] plus the transition guards of
    /// [`WithdrawalRequest::approve`].
    pub fn approve(&mut self, id: &str) -> Result<&WithdrawalRequest, LedgerError> {
        let request = self
            .requests
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound { id: id.to_string() })?;
        request.approve()?;
        Ok(&*request)
    }

    /// Claims a request and returns the updated record.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] plus the transition guards of
    /// [`WithdrawalRequest::claim`].
    pub fn claim(&mut self, id: &str) -> Result<&WithdrawalRequest, LedgerError> {
        let request = self
            .requests
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound { id: id.to_string() })?;
        request.claim()?;
        Ok(&*request)
    }

    /// Rejects a request (demoting an approval if present) and returns the
    /// updated record.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] plus the transition guards of
    /// [`WithdrawalRequest::reject`].
    pub fn reject(&mut self, id: &str) -> Result<&WithdrawalRequest, LedgerError> {
        let request = self
            .requests
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound { id: id.to_string() })?;
        request.reject()?;
        Ok(&*request)
    }

    /// Number of requests ever recorded.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether the book has never seen a request.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Iterates over all records, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &WithdrawalRequest> {
        self.requests.values()
    }
}
