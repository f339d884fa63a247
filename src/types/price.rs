//! Exact price arithmetic and unit conversion.
//!
//! ## Overview
//!
//! Prices are never stored. They are ratios `buy / sell` between two 96-bit
//! amounts and are compared or applied by cross-multiplying in 256 bits, so
//! no precision is lost before the single truncating division at the end.
//!
//! ## Base Units
//!
//! Token amounts are integers in base units (10^18 per whole token by
//! default). `to_base_units` and `from_base_units` convert from and to
//! human decimal strings through `rust_decimal`, never through floats.
//!
//! ## Examples
//!
//! ```
//! use batch_auction::types::price::{to_base_units, from_base_units, DEFAULT_DECIMALS};
//!
//! let amount = to_base_units("0.1", DEFAULT_DECIMALS).unwrap();
//! assert_eq!(amount, 100_000_000_000_000_000);
//! assert_eq!(from_base_units(amount, DEFAULT_DECIMALS).unwrap(), "0.1");
//! ```

use std::cmp::Ordering;

use alloy_primitives::U256;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Decimals of a standard 18-decimal token.
pub const DEFAULT_DECIMALS: u32 = 18;

/// Largest scale `rust_decimal` can represent.
pub const MAX_DECIMALS: u32 = 28;

// ============================================================================
// 256-bit helpers
// ============================================================================

/// `floor(a * b / d)` with the product taken in 256 bits.
///
/// # Returns
///
/// * `Some(u128)` - The quotient
/// * `None` - If `d` is zero or the quotient does not fit in `u128`
///
/// # Example
///
/// ```
/// use batch_auction::types::price::mul_div;
///
/// assert_eq!(mul_div(u128::MAX, 4, 8), Some(u128::MAX / 2));
/// assert_eq!(mul_div(1, 1, 0), None);
/// ```
pub fn mul_div(a: u128, b: u128, d: u128) -> Option<u128> {
    if d == 0 {
        return None;
    }
    let quotient = U256::from(a) * U256::from(b) / U256::from(d);
    u128::try_from(quotient).ok()
}

/// `a * b` in 256 bits. Never overflows for `u128` inputs.
#[inline]
pub fn wide_mul(a: u128, b: u128) -> U256 {
    U256::from(a) * U256::from(b)
}

/// Compare the ratios `a_num / a_den` and `b_num / b_den` without division.
#[inline]
pub fn cross_cmp(a_num: u128, a_den: u128, b_num: u128, b_den: u128) -> Ordering {
    wide_mul(a_num, b_den).cmp(&wide_mul(b_num, a_den))
}

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert a decimal string into integer base units.
///
/// # Arguments
///
/// * `s` - Decimal string (e.g., "2.000000000000000001")
/// * `decimals` - Token decimals, at most [`MAX_DECIMALS`]
///
/// # Returns
///
/// * `Some(u128)` - The base-unit amount, rounded to the nearest unit
/// * `None` - If parsing fails, the value is negative or out of range
pub fn to_base_units(s: &str, decimals: u32) -> Option<u128> {
    let decimal = Decimal::from_str(s).ok()?;
    decimal_to_base_units(decimal, decimals)
}

/// Convert a `Decimal` into integer base units.
pub fn decimal_to_base_units(d: Decimal, decimals: u32) -> Option<u128> {
    if d.is_sign_negative() || decimals > MAX_DECIMALS {
        return None;
    }

    let unit = Decimal::from_i128_with_scale(10i128.checked_pow(decimals)?, 0);
    let scaled = d.checked_mul(unit)?;
    scaled.round_dp(0).to_u128()
}

/// Convert base units back into a trimmed decimal string.
///
/// Returns `None` if `value` exceeds the 96-bit `Decimal` mantissa or
/// `decimals` exceeds [`MAX_DECIMALS`].
pub fn from_base_units(value: u128, decimals: u32) -> Option<String> {
    let mantissa = i128::try_from(value).ok()?;
    let decimal = Decimal::try_from_i128_with_scale(mantissa, decimals).ok()?;
    Some(decimal.normalize().to_string())
}

// ============================================================================
// Unit Tests
// ============================================================================
