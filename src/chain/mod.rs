//! Commitment Chain
//!
//! ```text
//! generate_chain(secret, seed, n)      ChainAllocator::new(chain)
//!   h[0] = H(secret ∥ seed)              reveal[k] = h[n-1-k]
//!   h[i] = H(secret ∥ hex(h[i-1]))  ──▶  cursor: 0 ─────────▶ n
//! ```
//!
//! The chain is revealed in reverse generation order. Once the secret is
//! published, each newly revealed element hashes forward into the one
//! revealed just before it, so nothing already shown can be swapped out.

pub mod allocator;
pub mod generator;

pub use allocator::{ChainAllocator, SlotClaim};
pub use generator::{generate_chain, ChainConfig, ROUNDS_PER_GAME};

/// Errors raised by chain construction and slot allocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// Invalid secret, seed or length. Fatal at startup.
    #[error("Invalid chain configuration: {0}")]
    Configuration(String),

    /// Not enough unused slots remain. The chain must be replaced.
    #[error("Chain exhausted: requested {requested} slots at cursor {cursor} of {length}")]
    Exhausted {
        /// Slots requested by the failing claim.
        requested: usize,
        /// Allocator cursor at the time of the claim (left untouched).
        /// Simulations read from reveal index 0 and always report 0.
        cursor: usize,
        /// Total chain length.
        length: usize,
    },
}
