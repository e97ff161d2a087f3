//! # Conversion Math
//!
//! Pure share/asset conversion arithmetic. No state, no clock, no
//! collaborators — just ratios, and the rounding discipline that keeps the
//! vault solvent:
//!
//! - Deposits mint shares rounded **down** (the vault never over-issues).
//! - Withdrawals burn shares rounded **up** (the investor never under-pays).
//! - Asset payouts are always rounded **down**.
//!
//! The asymmetry is deliberate. Each operation can cost the investor at most
//! one smallest unit, and in exchange the pool can never be drained below the
//! value its outstanding shares represent.
//!
//! Every multiply-before-divide is overflow-checked. A wrapped product is an
//! [`ConversionError::Overflow`], never a wrong ratio.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Amount;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Arithmetic failures in the conversion layer.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// A wide multiply (or the ceiling bump) exceeded 128 bits.
    #[error("arithmetic overflow in {context}")]
    Overflow {
        /// Which computation overflowed, for the post-mortem.
        context: &'static str,
    },

    /// Division with a zero denominator. Callers zero-check totals before
    /// converting, so reaching this means an internal invariant broke.
    #[error("division by zero in {context}")]
    DivisionByZero {
        /// Which computation hit the zero denominator.
        context: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

/// Rounding direction for a conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rounding {
    /// Round toward zero. Used when minting shares and paying out assets.
    Floor,
    /// Round away from zero. Used when burning shares for a withdrawal.
    Ceil,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Converts an asset amount into shares at the current pool ratio.
///
/// Returns `0` when `total_assets == 0` — the zero-liquidity bootstrap is
/// handled by the caller via [`scale_by_offset`], not by a ratio.
///
/// # Errors
///
/// [`ConversionError::Overflow`] if `assets * total_shares` (or the ceiling
/// bump) does not fit in 128 bits.
pub fn shares_from_assets(
    assets: Amount,
    total_shares: Amount,
    total_assets: Amount,
    rounding: Rounding,
) -> Result<Amount, ConversionError> {
    if total_assets == 0 {
        return Ok(0);
    }
    mul_div(assets, total_shares, total_assets, rounding, "shares_from_assets")
}

/// Converts a share amount into assets at the current pool ratio.
///
/// Returns `0` when `total_shares == 0` — no shares outstanding means no
/// claim on the pool.
///
/// # Errors
///
/// [`ConversionError::Overflow`] if `shares * total_assets` (or the ceiling
/// bump) does not fit in 128 bits.
pub fn assets_from_shares(
    shares: Amount,
    total_shares: Amount,
    total_assets: Amount,
    rounding: Rounding,
) -> Result<Amount, ConversionError> {
    if total_shares == 0 {
        return Ok(0);
    }
    mul_div(shares, total_assets, total_shares, rounding, "assets_from_shares")
}

/// `value * numerator / denominator` with the requested rounding.
///
/// Floor is plain integer division; ceil adds `denominator - 1` to the
/// product first (safe: the denominator is already known nonzero).
fn mul_div(
    value: Amount,
    numerator: Amount,
    denominator: Amount,
    rounding: Rounding,
    context: &'static str,
) -> Result<Amount, ConversionError> {
    if denominator == 0 {
        return Err(ConversionError::DivisionByZero { context });
    }
    let product = value
        .checked_mul(numerator)
        .ok_or(ConversionError::Overflow { context })?;
    let out = match rounding {
        Rounding::Floor => product / denominator,
        Rounding::Ceil => {
            let bumped = product
                .checked_add(denominator - 1)
                .ok_or(ConversionError::Overflow { context })?;
            bumped / denominator
        }
    };
    Ok(out)
}

// ---------------------------------------------------------------------------
// Decimal-Offset Bootstrap
// ---------------------------------------------------------------------------

/// The decimal offset between the share token and the asset.
///
/// Shares usually carry more decimal places than the asset (18 vs. 6 is the
/// common pairing); the offset is the difference, or `0` when the share
/// precision is not larger. At zero liquidity one asset unit mints
/// `10^offset` shares.
pub fn decimal_offset(share_decimals: u8, asset_decimals: u8) -> u32 {
    if share_decimals > asset_decimals {
        u32::from(share_decimals - asset_decimals)
    } else {
        0
    }
}

/// Scales a raw asset amount by `10^offset` — the bootstrap conversion used
/// when the pool has no ratio to offer.
///
/// # Errors
///
/// [`ConversionError::Overflow`] if `10^offset` or the scaled amount does
/// not fit in 128 bits.
pub fn scale_by_offset(amount: Amount, offset: u32) -> Result<Amount, ConversionError> {
    let factor = 10u128
        .checked_pow(offset)
        .ok_or(ConversionError::Overflow { context: "scale_by_offset" })?;
    amount
        .checked_mul(factor)
        .ok_or(ConversionError::Overflow { context: "scale_by_offset" })
}

/// Divides a share amount by `10^offset`, rounding up — the inverse of
/// [`scale_by_offset`], used by mint previews at zero liquidity.
///
/// # Errors
///
/// [`ConversionError::Overflow`] if `10^offset` does not fit in 128 bits.
pub fn unscale_by_offset(shares: Amount, offset: u32) -> Result<Amount, ConversionError> {
    let factor = 10u128
        .checked_pow(offset)
        .ok_or(ConversionError::Overflow { context: "unscale_by_offset" })?;
    mul_div(shares, 1, factor, Rounding::Ceil, "unscale_by_offset")
}
