//! WAD fixed-point helpers (18 fractional digits)
//!
//! Display balances and the rebase index share the same scale, so a share
//! amount converts to a display amount with a single `floor(a * b / WAD)`.
//! Products are taken at full width before the division; `u128` is tried
//! first and `BigUint` picks up anything that does not fit.

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::error::{LedgerError, Result};

/// Unit scale: 1.0 == 10^18.
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Number of fractional decimal digits carried by `WAD`.
pub const WAD_DECIMALS: u32 = 18;

/// Exact `floor(a * b / denom)`.
pub fn mul_div_floor(a: u128, b: u128, denom: u128) -> Result<u128> {
    if denom == 0 {
        return Err(LedgerError::Overflow);
    }
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / denom);
    }

    let wide = BigUint::from(a) * BigUint::from(b) / BigUint::from(denom);
    wide.to_u128().ok_or(LedgerError::Overflow)
}

/// `floor(shares * index / WAD)`
pub fn shares_to_display(shares: u128, index: u128) -> Result<u128> {
    mul_div_floor(shares, index, WAD)
}

/// `floor(amount * WAD / index)`; a zero index has no inverse.
pub fn display_to_shares(amount: u128, index: u128) -> Result<u128> {
    mul_div_floor(amount, WAD, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_products_stay_exact() {
        assert_eq!(mul_div_floor(7, 3, 2).unwrap(), 10);
        assert_eq!(mul_div_floor(0, u128::MAX, 1).unwrap(), 0);
    }

    #[test]
    fn test_wide_products_use_bigint() {
        // 1e27 shares at index 0.99 overflows u128 before the division
        let shares = 1_000_000_000 * WAD;
        let index = WAD / 100 * 99;
        assert_eq!(shares_to_display(shares, index).unwrap(), 990_000_000 * WAD);
    }

    #[test]
    fn test_floor_rounding() {
        // 1 share at index 0.5 is half a display unit, floored away
        assert_eq!(shares_to_display(1, WAD / 2).unwrap(), 0);
        // 10 units at index 3.0 rounds the share count down
        assert_eq!(display_to_shares(10, 3 * WAD).unwrap(), 3);
    }

    #[test]
    fn test_rejects_zero_denominator_and_overflowing_result() {
        assert_eq!(display_to_shares(1, 0), Err(LedgerError::Overflow));
        assert_eq!(mul_div_floor(u128::MAX, 2, 1), Err(LedgerError::Overflow));
    }
}
