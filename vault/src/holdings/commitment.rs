//! Committed (locked) share balances.
//!
//! A committed investment locks its minted shares until an expiry timestamp:
//! while the lock is active, no transfer or withdrawal may drop the holder's
//! balance below the committed amount. The lock is passive — nothing
//! decrements it; it simply stops binding once `now` reaches the expiry.
//!
//! One deliberate oddity, preserved from observed protocol behavior: a
//! holder claiming a second committed investment before the first lock
//! expires *adds* the new shares to the committed total but *overwrites*
//! the expiry with the newer claim's timestamp. Only one expiry is tracked
//! per holder, so the combined lock can cover more shares than either claim
//! alone, under a deadline that belongs to neither. Do not "fix" this.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::HoldingsError;
use crate::config::{Amount, Timestamp};

/// A holder's lock: how many shares, and until when.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    /// Shares locked under the commitment.
    pub shares: Amount,
    /// Unix timestamp at which the lock stops binding.
    pub until: Timestamp,
}

/// Per-holder commitment tracking.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CommitmentBook {
    commitments: HashMap<String, Commitment>,
}

impl CommitmentBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self { commitments: HashMap::new() }
    }

    /// Records a committed claim: shares accumulate, the expiry is replaced.
    ///
    /// # Errors
    ///
    /// [`HoldingsError::Overflow`] if the accumulated share count exceeds
    /// 128 bits.
    pub fn add(&mut self, holder: &str, shares: Amount, until: Timestamp) -> Result<(), HoldingsError> {
        let entry = self
            .commitments
            .entry(holder.to_string())
            .or_insert(Commitment { shares: 0, until: 0 });
        entry.shares = entry
            .shares
            .checked_add(shares)
            .ok_or(HoldingsError::Overflow { context: "commitment shares" })?;
        entry.until = until;
        Ok(())
    }

    /// The raw commitment record, if one was ever made.
    pub fn get(&self, holder: &str) -> Option<&Commitment> {
        self.commitments.get(holder)
    }

    /// Shares currently locked: the committed amount while `now` is before
    /// the expiry, zero otherwise.
    pub fn active_shares(&self, holder: &str, now: Timestamp) -> Amount {
        match self.commitments.get(holder) {
            Some(commitment) if now < commitment.until => commitment.shares,
            _ => 0,
        }
    }

    /// Verifies that removing `reduction` shares from a holder with
    /// `balance` would not violate an active commitment.
    ///
    /// # Errors
    ///
    /// [`HoldingsError::InsufficientShares`] if the balance cannot even
    /// cover the reduction; [`HoldingsError::CommittedBalance`] if what
    /// remains would dip below the locked amount.
    pub fn ensure_can_reduce(
        &self,
        holder: &str,
        balance: Amount,
        reduction: Amount,
        now: Timestamp,
    ) -> Result<(), HoldingsError> {
        let committed = self.active_shares(holder, now);
        if committed == 0 {
            return Ok(());
        }
        let would_remain = balance
            .checked_sub(reduction)
            .ok_or_else(|| HoldingsError::InsufficientShares {
                holder: holder.to_string(),
                balance,
                required: reduction,
            })?;
        if would_remain < committed {
            return Err(HoldingsError::CommittedBalance {
                holder: holder.to_string(),
                committed,
                would_remain,
            });
        }
        Ok(())
    }
}
