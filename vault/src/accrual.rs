//! # Accrual Engine
//!
//! Discrete daily compounding of the vault's total value locked (TVL).
//!
//! The model is deliberately simple: an admin sets a daily yield rate in
//! microbips, and the TVL grows by `(1 + rate/1e10)^days` where `days` is the
//! number of *whole* days elapsed since the last materialized snapshot.
//! There is no partial-day interpolation — 23 hours of elapsed time accrues
//! nothing, 25 hours accrues exactly one day.
//!
//! [`accrue`] is a pure function of its four inputs. It never touches stored
//! state, so read paths can call it as often as they like and always get the
//! same answer for the same inputs. Materializing the result into the vault
//! snapshot is the aggregate root's job, not this module's.
//!
//! The compounding factor is computed with integer exponentiation by
//! squaring at a 1e18 fixed-point scale. No floating point anywhere near
//! money.

use thiserror::Error;

use crate::config::{
    Amount, RateMicrobip, Timestamp, FIXED_POINT_ONE, MICROBIP_FIXED_POINT, SECONDS_PER_DAY,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Arithmetic failures in the accrual layer.
///
/// These only fire for extreme inputs (enormous rates, decades of elapsed
/// days against a huge TVL). The engine treats them as fatal to the call —
/// a saturated or wrapped TVL would silently misprice every share.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AccrualError {
    /// A fixed-point multiply exceeded 128 bits.
    #[error("arithmetic overflow in {context}")]
    Overflow {
        /// Which computation overflowed.
        context: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Accrual
// ---------------------------------------------------------------------------

/// Computes the accrued TVL at `now` from the last materialized snapshot.
///
/// Returns `last_tvl` unchanged when no time has passed, the TVL is zero,
/// or the rate is zero. Otherwise compounds once per whole elapsed day.
///
/// # Errors
///
/// [`AccrualError::Overflow`] if the compounding factor or the final product
/// exceeds 128 bits.
pub fn accrue(
    last_tvl: Amount,
    last_updated_at: Timestamp,
    daily_rate: RateMicrobip,
    now: Timestamp,
) -> Result<Amount, AccrualError> {
    if now <= last_updated_at || last_tvl == 0 || daily_rate == 0 {
        return Ok(last_tvl);
    }
    let days = (now - last_updated_at) / SECONDS_PER_DAY;
    if days == 0 {
        return Ok(last_tvl);
    }
    let factor = growth_factor(daily_rate, days)?;
    let product = last_tvl
        .checked_mul(factor)
        .ok_or(AccrualError::Overflow { context: "accrue" })?;
    Ok(product / FIXED_POINT_ONE)
}

/// `(1 + rate/1e10)^days` at the 1e18 fixed-point scale.
///
/// Exponentiation by squaring: O(log days) fixed-point multiplies, each one
/// overflow-checked and floored at the scale. The result is always at least
/// [`FIXED_POINT_ONE`] — compounding a nonnegative rate never shrinks value.
///
/// # Errors
///
/// [`AccrualError::Overflow`] if any intermediate square or multiply exceeds
/// 128 bits.
pub fn growth_factor(daily_rate: RateMicrobip, days: u64) -> Result<u128, AccrualError> {
    let daily_increment = u128::from(daily_rate)
        .checked_mul(MICROBIP_FIXED_POINT)
        .ok_or(AccrualError::Overflow { context: "growth_factor base" })?;
    let mut base = FIXED_POINT_ONE
        .checked_add(daily_increment)
        .ok_or(AccrualError::Overflow { context: "growth_factor base" })?;

    let mut result = FIXED_POINT_ONE;
    let mut exp = days;
    while exp > 0 {
        if exp & 1 == 1 {
            result = fixed_mul(result, base)?;
        }
        exp >>= 1;
        if exp > 0 {
            base = fixed_mul(base, base)?;
        }
    }
    Ok(result)
}

/// The largest TVL the growth guard admits on top of `current`.
///
/// This is the one deliberately saturating computation in the engine: a
/// guard bound beyond `u128::MAX` simply means "unbounded", and saturating
/// expresses that without an overflow branch.
pub fn max_allowed_tvl(current: Amount, guard_factor: u64) -> Amount {
    current.saturating_mul(u128::from(guard_factor))
}

/// Fixed-point multiply: `a * b / 1e18`, floored.
fn fixed_mul(a: u128, b: u128) -> Result<u128, AccrualError> {
    let product = a
        .checked_mul(b)
        .ok_or(AccrualError::Overflow { context: "fixed_mul" })?;
    Ok(product / FIXED_POINT_ONE)
}
