//! Digest Normalization
//!
//! Maps a 256-bit digest onto the unit interval `[0, 1)`.
//!
//! The digest is read as a big-endian unsigned integer `n` and the
//! result is `n / 2^256`. Only the top 53 bits of the quotient survive
//! the conversion to `f64`, and they are taken by truncation, so every
//! output is exactly representable and strictly below 1.

use num_bigint::BigUint;

use super::hash::{ChainHash, DIGEST_BITS};

/// Mantissa precision of `f64`.
const F64_PRECISION: u64 = 53;

/// Read a digest as a big-endian unsigned integer.
#[inline]
pub fn digest_to_biguint(hash: &ChainHash) -> BigUint {
    BigUint::from_bytes_be(hash)
}

/// Normalize a digest to `[0, 1)`.
pub fn normalize_digest(hash: &ChainHash) -> f64 {
    let n = digest_to_biguint(hash);

    // floor(n / 2^(256 - 53)) fits in 53 bits
    let scaled: BigUint = n >> (DIGEST_BITS - F64_PRECISION);
    let mantissa = scaled.iter_u64_digits().next().unwrap_or(0);

    mantissa as f64 / (1u64 << F64_PRECISION) as f64
}
