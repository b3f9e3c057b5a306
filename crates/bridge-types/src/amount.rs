//! Fixed-point helpers over 256-bit integers.
//!
//! Amounts and LP-fee fractions are 256-bit integers (`alloy_primitives::U256`,
//! the same type the rest of the corpus already depends on via `alloy`).
//! Floating point is never used in refund arithmetic — every fraction here
//! is a numerator over a fixed `ONE_E18` denominator, truncated on division
//! exactly as the EVM's integer division does.

use alloy_primitives::U256;

/// Fixed-point "1.0" — LP fee fractions live in `[0, ONE_E18]`.
pub const ONE_E18: U256 = U256::from_limbs([1_000_000_000_000_000_000u64, 0, 0, 0]);

/// `amount * fraction_e18 / 1e18`, truncating exactly like Solidity's
/// `mulDiv`. Never overflows for realistic bridge amounts since `amount`
/// and `fraction_e18` are each well below 2^128 in practice, but the
/// multiplication is still performed in the full 256-bit domain.
pub fn mul_div_1e18(amount: U256, fraction_e18: U256) -> U256 {
    amount.saturating_mul(fraction_e18) / ONE_E18
}

/// `amount * (1e18 - fraction_e18) / 1e18`. Saturates `fraction_e18` to
/// `ONE_E18` rather than panicking on out-of-range fee fractions, since an
/// upstream rate-model bug must not crash the reconstructor.
pub fn mul_div_complement_1e18(amount: U256, fraction_e18: U256) -> U256 {
    let complement = ONE_E18.saturating_sub(fraction_e18);
    mul_div_1e18(amount, complement)
}
