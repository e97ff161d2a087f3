//! Reserved shares for approved-but-unclaimed withdrawals.
//!
//! Approval of a withdrawal earmarks its frozen share cost against the
//! investor. The reservation is what stops the same shares from backing two
//! pending withdrawals at once: a new withdrawal request must fit inside
//! `balance - reserved`. A claim or a rejection of the approved request
//! releases exactly what approval reserved.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::HoldingsError;
use crate::config::Amount;

/// Per-holder reserved share counters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReservationBook {
    reserved: HashMap<String, Amount>,
}

impl ReservationBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self { reserved: HashMap::new() }
    }

    /// Shares currently reserved against a holder.
    pub fn reserved(&self, holder: &str) -> Amount {
        self.reserved.get(holder).copied().unwrap_or(0)
    }

    /// Adds to a holder's reservation.
    ///
    /// # Errors
    ///
    /// [`HoldingsError::Overflow`] if the counter would exceed 128 bits.
    pub fn reserve(&mut self, holder: &str, shares: Amount) -> Result<(), HoldingsError> {
        let entry = self.reserved.entry(holder.to_string()).or_insert(0);
        *entry = entry
            .checked_add(shares)
            .ok_or(HoldingsError::Overflow { context: "reservation" })?;
        Ok(())
    }

    /// Releases part of a holder's reservation.
    ///
    /// # Errors
    ///
    /// [`HoldingsError::InsufficientReserved`] if the release exceeds what
    /// is reserved — the aggregate root only releases what it reserved, so
    /// this error means an internal invariant broke.
    pub fn release(&mut self, holder: &str, shares: Amount) -> Result<(), HoldingsError> {
        let current = self.reserved(holder);
        let remaining = current
            .checked_sub(shares)
            .ok_or_else(|| HoldingsError::InsufficientReserved {
                holder: holder.to_string(),
                reserved: current,
                requested: shares,
            })?;
        self.reserved.insert(holder.to_string(), remaining);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_accumulates_across_requests() {
        let mut book = ReservationBook::new();
        book.reserve("alice", 100).unwrap();
        book.reserve("alice", 50).unwrap();
        assert_eq!(book.reserved("alice"), 150);
        assert_eq!(book.reserved("bob"), 0);
    }

    #[test]
    fn release_returns_exactly_what_was_reserved() {
        let mut book = ReservationBook::new();
        book.reserve("alice", 100).unwrap();
        book.release("alice", 60).unwrap();
        assert_eq!(book.reserved("alice"), 40);
        book.release("alice", 40).unwrap();
        assert_eq!(book.reserved("alice"), 0);
    }

    #[test]
    fn over_release_is_an_invariant_error() {
        let mut book = ReservationBook::new();
        book.reserve("alice", 10).unwrap();
        let err = book.release("alice", 11).unwrap_err();
        assert!(matches!(
            err,
            HoldingsError::InsufficientReserved { reserved: 10, requested: 11, .. }
        ));
        // The failed release must not touch the counter.
        assert_eq!(book.reserved("alice"), 10);
    }

    #[test]
    fn reservation_overflow_is_checked() {
        let mut book = ReservationBook::new();
        book.reserve("alice", Amount::MAX).unwrap();
        assert!(matches!(
            book.reserve("alice", 1),
            Err(HoldingsError::Overflow { .. })
        ));
    }
}
