//! Fairness Proofs
//!
//! Published before play, checked after the secret is disclosed:
//! - `commitment.rs` - terminal-hash commitment and secret disclosure
//! - `verify.rs`     - reveal links, chain comparison, game replay

pub mod commitment;
pub mod verify;

// Re-export key types
pub use commitment::{ChainCommitment, CommitmentError, SecretDisclosure};
pub use verify::{
    verify_game, verify_reveal_link, verify_reveal_sequence, verify_revealed_chain,
    ChainAuditor, VerificationError,
};
