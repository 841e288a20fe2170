//! Core deterministic primitives.
//!
//! Everything the fairness proof rests on lives here: the chain digest
//! and the mapping from a digest to a uniform value in `[0, 1)`.

pub mod hash;
pub mod unit;

// Re-export core types
pub use hash::{chain_step, seed_hash, to_hex, ChainHash, DIGEST_ALGORITHM};
pub use unit::normalize_digest;
