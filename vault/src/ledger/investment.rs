//! Investment-side request records and their book.
//!
//! An investment request is born when a prospective investor has already
//! wired the asset in — the record tracks the claim on shares, not the
//! money. Approval and claiming happen later, possibly much later, and the
//! record keeps its full history: a rejected or claimed request stays in the
//! book forever as audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{LedgerError, RequestStatus};
use crate::config::{Amount, Timestamp};

// ---------------------------------------------------------------------------
// InvestmentRequest
// ---------------------------------------------------------------------------

/// A single investment request, identity immutable after creation.
///
/// `committed_until` is carried from the request into the eventual claim:
/// when it is still in the future at claim time, the minted shares are
/// locked under the holder's commitment until that timestamp. `0` means no
/// lock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvestmentRequest {
    /// Caller-chosen unique id. Never reused, even after resolution.
    pub id: String,

    /// The identity that made (and funded) the request.
    pub investor: String,

    /// Asset units transferred in when the request was recorded.
    pub amount: Amount,

    /// Commitment expiry for the minted shares. `0` = no lock.
    pub committed_until: Timestamp,

    /// Set by an approver. Required before a claim.
    pub approved: bool,

    /// Set when the shares are minted. Terminal.
    pub claimed: bool,

    /// Set by an approver instead of (or after) approval. Terminal; tracked
    /// separately from `approved` so a rejected id can never be claimed.
    pub rejected: bool,

    /// When the request was recorded.
    pub created_at: DateTime<Utc>,

    /// Last lifecycle transition.
    pub updated_at: DateTime<Utc>,
}

impl InvestmentRequest {
    /// Creates a fresh, unapproved, unclaimed request.
    pub fn new(id: &str, investor: &str, amount: Amount, committed_until: Timestamp) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            investor: investor.to_string(),
            amount,
            committed_until,
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
    /// [`LedgerError::AlreadyApproved`] when the transition is illegal.
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
    /// The aggregate root stages all fallible work (share math, guard
    /// checks) against this before committing the claim, so a late failure
    /// never leaves a half-claimed record.
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
    /// Same conditions as [`InvestmentRequest::ensure_claimable`].
    pub fn claim(&mut self) -> Result<(), LedgerError> {
        self.ensure_claimable()?;
        self.claimed = true;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Marks the request rejected. An approved-but-unclaimed investment can
    /// still be rejected — the investor gets a refund claim instead of
    /// shares.
    ///
    /// # Errors
    ///
    /// [`LedgerError::AlreadyClaimed`] or [`LedgerError::AlreadyRejected`].
    pub fn reject(&mut self) -> Result<(), LedgerError> {
        if self.claimed {
            return Err(LedgerError::AlreadyClaimed { id: self.id.clone() });
        }
        if self.rejected {
            return Err(LedgerError::AlreadyRejected { id: self.id.clone() });
        }
        self.rejected = true;
        self.updated_at = Utc::now();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// InvestmentBook
// ---------------------------------------------------------------------------

/// Append-only registry of investment requests, keyed by request id.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InvestmentBook {
    requests: HashMap<String, InvestmentRequest>,
}

impl InvestmentBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self { requests: HashMap::new() }
    }

    /// Records a new request.
    ///
    /// # Errors
    ///
    /// [`LedgerError::EmptyId`] or [`LedgerError::DuplicateId`]. Duplicate
    /// detection ignores the earlier request's resolution state — a claimed
    /// or rejected id is just as taken as a pending one.
    pub fn create(
        &mut self,
        id: &str,
        investor: &str,
        amount: Amount,
        committed_until: Timestamp,
    ) -> Result<&InvestmentRequest, LedgerError> {
        if id.is_empty() {
            return Err(LedgerError::EmptyId);
        }
        if self.requests.contains_key(id) {
            return Err(LedgerError::DuplicateId { id: id.to_string() });
        }
        let request = InvestmentRequest::new(id, investor, amount, committed_until);
        Ok(self.requests.entry(id.to_string()).or_insert(request))
    }

    /// Looks up a request.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`].
    pub fn get(&self, id: &str) -> Result<&InvestmentRequest, LedgerError> {
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
    /// [`InvestmentRequest::approve`].
    pub fn approve(&mut self, id: &str) -> Result<&InvestmentRequest, LedgerError> {
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
    /// [`InvestmentRequest::claim`].
    pub fn claim(&mut self, id: &str) -> Result<&InvestmentRequest, LedgerError> {
        let request = self
            .requests
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound { id: id.to_string() })?;
        request.claim()?;
        Ok(&*request)
    }

    /// Rejects a request and returns the updated record.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] plus the transition guards of
    /// [`InvestmentRequest::reject`].
    pub fn reject(&mut self, id: &str) -> Result<&InvestmentRequest, LedgerError> {
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
    pub fn iter(&self) -> impl Iterator<Item = &InvestmentRequest> {
        self.requests.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book() -> InvestmentBook {
        let mut book = InvestmentBook::new();
        book.create("inv-1", "alice", 1_000, 0).unwrap();
        book
    }

    #[test]
    fn create_records_a_pending_request() {
        let book = sample_book();
        let request = book.get("inv-1").unwrap();
        assert_eq!(request.investor, "alice");
        assert_eq!(request.amount, 1_000);
        assert_eq!(request.status(), RequestStatus::Pending);
        assert!(!request.approved && !request.claimed && !request.rejected);
    }

    #[test]
    fn empty_id_is_rejected() {
        let mut book = InvestmentBook::new();
        assert!(matches!(book.create("", "alice", 1, 0), Err(LedgerError::EmptyId)));
    }

    #[test]
    fn duplicate_id_is_rejected_in_every_state() {
        let mut book = sample_book();
        assert!(matches!(
            book.create("inv-1", "bob", 5, 0),
            Err(LedgerError::DuplicateId { .. })
        ));

        // Still taken after approval...
        book.approve("inv-1").unwrap();
        assert!(matches!(
            book.create("inv-1", "bob", 5, 0),
            Err(LedgerError::DuplicateId { .. })
        ));

        // ...and after the claim resolves it.
        book.claim("inv-1").unwrap();
        assert!(matches!(
            book.create("inv-1", "bob", 5, 0),
            Err(LedgerError::DuplicateId { .. })
        ));
    }

    #[test]
    fn happy_path_approve_then_claim() {
        let mut book = sample_book();
        assert_eq!(book.approve("inv-1").unwrap().status(), RequestStatus::Approved);
        assert_eq!(book.claim("inv-1").unwrap().status(), RequestStatus::Claimed);
    }

    #[test]
    fn approval_is_not_idempotent() {
        let mut book = sample_book();
        book.approve("inv-1").unwrap();
        assert!(matches!(book.approve("inv-1"), Err(LedgerError::AlreadyApproved { .. })));
    }

    #[test]
    fn claim_requires_approval() {
        let mut book = sample_book();
        assert!(matches!(book.claim("inv-1"), Err(LedgerError::NotApproved { .. })));
    }

    #[test]
    fn claim_is_terminal() {
        let mut book = sample_book();
        book.approve("inv-1").unwrap();
        book.claim("inv-1").unwrap();
        assert!(matches!(book.claim("inv-1"), Err(LedgerError::AlreadyClaimed { .. })));
        assert!(matches!(book.reject("inv-1"), Err(LedgerError::AlreadyClaimed { .. })));
    }

    #[test]
    fn rejected_id_can_never_be_approved_or_claimed() {
        let mut book = sample_book();
        book.reject("inv-1").unwrap();
        assert!(matches!(book.approve("inv-1"), Err(LedgerError::AlreadyRejected { .. })));
        assert!(matches!(book.claim("inv-1"), Err(LedgerError::AlreadyRejected { .. })));
        assert!(matches!(book.reject("inv-1"), Err(LedgerError::AlreadyRejected { .. })));
    }

    #[test]
    fn approved_request_can_still_be_rejected() {
        // An approved-but-unclaimed investment turns into a refund.
        let mut book = sample_book();
        book.approve("inv-1").unwrap();
        let record = book.reject("inv-1").unwrap();
        assert_eq!(record.status(), RequestStatus::Rejected);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut book = InvestmentBook::new();
        assert!(matches!(book.get("ghost"), Err(LedgerError::NotFound { .. })));
        assert!(matches!(book.approve("ghost"), Err(LedgerError::NotFound { .. })));
    }

    #[test]
    fn records_survive_resolution() {
        let mut book = sample_book();
        book.reject("inv-1").unwrap();
        assert_eq!(book.len(), 1);
        assert!(book.contains("inv-1"));
    }

    #[test]
    fn request_serialization_roundtrip() {
        let request = InvestmentRequest::new("inv-9", "carol", 77, 12_345);
        let json = serde_json::to_string(&request).unwrap();
        let recovered: InvestmentRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request, recovered);
    }
}
