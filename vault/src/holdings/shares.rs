//! Share balances and total supply.
//!
//! The ShareBook is the vault's own share token ledger: who holds what, and
//! how many shares exist at all. Mint and burn are the only operations that
//! change supply; moves just shuffle balances. Policy — commitment locks,
//! allowlist checks on the destination — is enforced by the aggregate root
//! before it touches this book.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::HoldingsError;
use crate::config::Amount;

/// Per-holder share balances plus the outstanding total.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ShareBook {
    balances: HashMap<String, Amount>,
    total: Amount,
}

impl ShareBook {
    /// Creates an empty book with zero supply.
    pub fn new() -> Self {
        Self { balances: HashMap::new(), total: 0 }
    }

    /// Total shares outstanding.
    pub fn total(&self) -> Amount {
        self.total
    }

    /// A holder's balance. Unknown holders hold zero.
    pub fn balance_of(&self, holder: &str) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Mints new shares to a holder, growing the total supply.
    ///
    /// # Errors
    ///
    /// [`HoldingsError::Overflow`] if the supply or the holder's balance
    /// would exceed 128 bits.
    pub fn mint(&mut self, to: &str, amount: Amount) -> Result<(), HoldingsError> {
        let new_total = self
            .total
            .checked_add(amount)
            .ok_or(HoldingsError::Overflow { context: "mint supply" })?;
        let balance = self.balances.entry(to.to_string()).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(HoldingsError::Overflow { context: "mint balance" })?;
        self.total = new_total;
        Ok(())
    }

    /// Burns shares from a holder, shrinking the total supply.
    ///
    /// # Errors
    ///
    /// [`HoldingsError::InsufficientShares`] if the balance cannot cover the
    /// burn; [`HoldingsError::Overflow`] if the supply counter underflows
    /// (an internal invariant break — supply is the sum of balances).
    pub fn burn(&mut self, from: &str, amount: Amount) -> Result<(), HoldingsError> {
        let balance = self.balance_of(from);
        let remaining = balance
            .checked_sub(amount)
            .ok_or_else(|| HoldingsError::InsufficientShares {
                holder: from.to_string(),
                balance,
                required: amount,
            })?;
        let new_total = self
            .total
            .checked_sub(amount)
            .ok_or(HoldingsError::Overflow { context: "burn supply" })?;
        self.balances.insert(from.to_string(), remaining);
        self.total = new_total;
        Ok(())
    }

    /// Moves shares between holders. Supply is unchanged.
    ///
    /// # Errors
    ///
    /// [`HoldingsError::InsufficientShares`] if the sender's balance cannot
    /// cover the move; [`HoldingsError::Overflow`] if the receiver's balance
    /// would exceed 128 bits.
    pub fn transfer(&mut self, from: &str, to: &str, amount: Amount) -> Result<(), HoldingsError> {
        let from_balance = self.balance_of(from);
        let from_remaining = from_balance
            .checked_sub(amount)
            .ok_or_else(|| HoldingsError::InsufficientShares {
                holder: from.to_string(),
                balance: from_balance,
                required: amount,
            })?;
        let to_balance = self.balance_of(to);
        let to_updated = to_balance
            .checked_add(amount)
            .ok_or(HoldingsError::Overflow { context: "transfer balance" })?;
        self.balances.insert(from.to_string(), from_remaining);
        self.balances.insert(to.to_string(), to_updated);
        Ok(())
    }

    /// Iterates over `(holder, balance)` pairs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Amount)> {
        self.balances.iter().map(|(holder, balance)| (holder.as_str(), *balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_grows_balance_and_supply() {
        let mut book = ShareBook::new();
        book.mint("alice", 1_000).unwrap();
        book.mint("alice", 500).unwrap();
        book.mint("bob", 250).unwrap();
        assert_eq!(book.balance_of("alice"), 1_500);
        assert_eq!(book.balance_of("bob"), 250);
        assert_eq!(book.total(), 1_750);
    }

    #[test]
    fn burn_shrinks_balance_and_supply() {
        let mut book = ShareBook::new();
        book.mint("alice", 1_000).unwrap();
        book.burn("alice", 400).unwrap();
        assert_eq!(book.balance_of("alice"), 600);
        assert_eq!(book.total(), 600);
    }

    #[test]
    fn burn_beyond_balance_fails() {
        let mut book = ShareBook::new();
        book.mint("alice", 100).unwrap();
        let err = book.burn("alice", 101).unwrap_err();
        assert!(matches!(
            err,
            HoldingsError::InsufficientShares { balance: 100, required: 101, .. }
        ));
        // Nothing moved.
        assert_eq!(book.balance_of("alice"), 100);
        assert_eq!(book.total(), 100);
    }

    #[test]
    fn transfer_preserves_supply() {
        let mut book = ShareBook::new();
        book.mint("alice", 1_000).unwrap();
        book.transfer("alice", "bob", 300).unwrap();
        assert_eq!(book.balance_of("alice"), 700);
        assert_eq!(book.balance_of("bob"), 300);
        assert_eq!(book.total(), 1_000);
    }

    #[test]
    fn transfer_beyond_balance_fails_cleanly() {
        let mut book = ShareBook::new();
        book.mint("alice", 100).unwrap();
        assert!(book.transfer("alice", "bob", 200).is_err());
        assert_eq!(book.balance_of("alice"), 100);
        assert_eq!(book.balance_of("bob"), 0);
    }

    #[test]
    fn unknown_holders_hold_zero() {
        let book = ShareBook::new();
        assert_eq!(book.balance_of("nobody"), 0);
    }

    #[test]
    fn mint_overflow_is_checked() {
        let mut book = ShareBook::new();
        book.mint("alice", Amount::MAX).unwrap();
        assert!(matches!(
            book.mint("bob", 1),
            Err(HoldingsError::Overflow { .. })
        ));
    }

    #[test]
    fn serialization_roundtrip() {
        let mut book = ShareBook::new();
        book.mint("alice", 42).unwrap();
        let json = serde_json::to_string(&book).unwrap();
        let recovered: ShareBook = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered.balance_of("alice"), 42);
        assert_eq!(recovered.total(), 42);
    }
}
