//! # Engine Configuration & Constants
//!
//! Every magic number in the Meridian engine lives here. If you're hardcoding
//! a scale factor somewhere else, you're doing it wrong and you owe the team
//! coffee.
//!
//! The fixed-point scales in particular are load-bearing: the accrual math,
//! the conversion math, and every test that pins a numeric scenario all agree
//! on these values. Changing them after a vault has live balances is
//! somewhere between "difficult" and "career-ending".

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Core Unit Types
// ---------------------------------------------------------------------------

/// Asset and share quantities, in smallest-unit denomination.
///
/// `u128` gives the conversion math room to multiply an amount by a total
/// before dividing without silently wrapping — every such product is
/// overflow-checked and a wrap is a hard error, never a wrong ratio.
pub type Amount = u128;

/// Unix timestamp in whole seconds. The engine never reads the wall clock;
/// callers stamp `now` at the boundary and thread it through.
pub type Timestamp = u64;

/// A daily yield rate expressed in microbips (1 microbip = 1e-10 as a
/// fraction). Small enough to express "a few basis points a year" without
/// touching floating point.
pub type RateMicrobip = u64;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Seconds per accrual day. Accrual is quantized to whole elapsed days —
/// there is deliberately no partial-day interpolation.
pub const SECONDS_PER_DAY: u64 = 86_400;

// ---------------------------------------------------------------------------
// Fixed-Point Scales
// ---------------------------------------------------------------------------

/// The denominator that turns a microbip rate into a fraction:
/// `rate / MICROBIP_SCALE` is the daily growth as a real number.
pub const MICROBIP_SCALE: u128 = 10_000_000_000; // 1e10

/// Fixed-point "1.0" for the compounding arithmetic. 1e18, same scale the
/// share token uses for 18-decimal precision. Factors are computed at this
/// scale and divided back out exactly once.
pub const FIXED_POINT_ONE: u128 = 1_000_000_000_000_000_000; // 1e18

/// `FIXED_POINT_ONE / MICROBIP_SCALE`, precomputed. One microbip at the
/// fixed-point scale. The division is exact (1e18 / 1e10 = 1e8), which the
/// tests below insist on.
pub const MICROBIP_FIXED_POINT: u128 = 100_000_000; // 1e8

// ---------------------------------------------------------------------------
// Vault Parameters
// ---------------------------------------------------------------------------

/// Admin-tunable vault parameters.
///
/// This is the explicit configuration block embedded in the aggregate root —
/// never ambient process state. Only authorized configuration operations
/// mutate it, and every mutation is logged and evented.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultParams {
    /// Smallest investment request the vault will accept, in asset units.
    pub min_investment: Amount,

    /// Largest investment request the vault will accept, in asset units.
    pub max_investment: Amount,

    /// Smallest withdrawal request the vault will accept, in asset units.
    pub min_withdrawal: Amount,

    /// Largest withdrawal request the vault will accept, in asset units.
    pub max_withdrawal: Amount,

    /// Daily yield rate in microbips. `0` disables accrual entirely.
    pub daily_yield_rate: RateMicrobip,

    /// Maximum permitted multiplicative jump in TVL per update. A factor of
    /// `1` freezes TVL growth, `10` admits up to a 9x increase on top of the
    /// current value. `0` disables the guard.
    pub growth_guard_factor: u64,

    /// Whether the vault accepts new investment and withdrawal requests.
    /// Closing the vault does not block claims on already-recorded requests.
    pub is_open: bool,
}

impl VaultParams {
    /// Permissive defaults: wide-open bounds, no yield, guard disabled,
    /// vault open. Production deployments tighten these before go-live.
    pub fn new() -> Self {
        Self {
            min_investment: 1,
            max_investment: Amount::MAX,
            min_withdrawal: 1,
            max_withdrawal: Amount::MAX,
            daily_yield_rate: 0,
            growth_guard_factor: 0,
            is_open: true,
        }
    }
}

impl Default for VaultParams {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_microbip_fixed_point_is_exact() {
        // If this drifts, every accrual factor in the system is wrong.
        assert_eq!(FIXED_POINT_ONE / MICROBIP_SCALE, MICROBIP_FIXED_POINT);
        assert_eq!(FIXED_POINT_ONE % MICROBIP_SCALE, 0);
    }

    #[test]
    fn test_scales_are_powers_of_ten() {
        assert_eq!(MICROBIP_SCALE, 10u128.pow(10));
        assert_eq!(FIXED_POINT_ONE, 10u128.pow(18));
        assert_eq!(MICROBIP_FIXED_POINT, 10u128.pow(8));
    }

    #[test]
    fn test_seconds_per_day() {
        assert_eq!(SECONDS_PER_DAY, 24 * 60 * 60);
    }

    #[test]
    fn test_default_params_are_permissive() {
        let params = VaultParams::default();
        assert!(params.is_open);
        assert_eq!(params.daily_yield_rate, 0);
        assert_eq!(params.growth_guard_factor, 0);
        assert!(params.min_investment <= params.max_investment);
        assert!(params.min_withdrawal <= params.max_withdrawal);
    }

    #[test]
    fn test_params_serialization_roundtrip() {
        let params = VaultParams {
            min_investment: 100,
            max_investment: 1_000_000,
            min_withdrawal: 50,
            max_withdrawal: 500_000,
            daily_yield_rate: 10_000,
            growth_guard_factor: 10,
            is_open: false,
        };
        let json = serde_json::to_string(&params).unwrap();
        let recovered: VaultParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params, recovered);
    }
}
