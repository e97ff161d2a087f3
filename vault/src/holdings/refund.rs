//! Pending refunds from rejected investments.
//!
//! Rejecting an investment does not move the asset back immediately — it
//! records a claim right. The investor (and only the investor) later calls
//! claim-refund to pull the full amount. Multiple rejections accumulate
//! into one balance; a successful claim zeroes it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::HoldingsError;
use crate::config::Amount;

/// Per-holder refundable asset balances.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RefundBook {
    refunds: HashMap<String, Amount>,
}

impl RefundBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self { refunds: HashMap::new() }
    }

    /// The holder's refundable balance.
    pub fn pending(&self, holder: &str) -> Amount {
        self.refunds.get(holder).copied().unwrap_or(0)
    }

    /// Credits a rejected investment's amount to the holder.
    ///
    /// # Errors
    ///
    /// [`HoldingsError::Overflow`] if the balance would exceed 128 bits.
    pub fn credit(&mut self, holder: &str, amount: Amount) -> Result<(), HoldingsError> {
        let entry = self.refunds.entry(holder.to_string()).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(HoldingsError::Overflow { context: "refund balance" })?;
        Ok(())
    }

    /// Zeroes the holder's balance and returns what it was.
    pub fn take(&mut self, holder: &str) -> Amount {
        self.refunds.remove(holder).unwrap_or(0)
    }
}
