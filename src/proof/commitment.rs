//! Chain Commitment Protocol
//!
//! Commit to the whole chain before the first game is played.
//! Disclose the secret after exhaustion so anyone can check every game.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::{generate_chain, ChainConfig, ChainError};
use crate::core::hash::{chain_step, hex_serde, ChainHash, DIGEST_ALGORITHM};

/// Public commitment, published before play.
///
/// `terminal_hash` is the generation step one past the end of the chain:
/// `H(secret ∥ hex(reveal[0]))`. It pins down every element without
/// revealing any of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainCommitment {
    /// Public seed the chain was generated from.
    pub public_seed: String,
    /// Number of chain elements.
    pub chain_length: usize,
    /// Digest used for every chain step.
    pub digest_algorithm: String,
    /// Commitment to the full chain.
    #[serde(with = "hex_serde")]
    pub terminal_hash: ChainHash,
    /// When the chain was generated.
    pub generated_at: DateTime<Utc>,
}

impl ChainCommitment {
    /// Commit to a reveal-ordered chain.
    ///
    /// Returns `None` for an empty chain.
    pub fn from_reveal_chain(secret: &str, public_seed: &str, revealed: &[ChainHash]) -> Option<Self> {
        let first = revealed.first()?;
        Some(Self {
            public_seed: public_seed.to_string(),
            chain_length: revealed.len(),
            digest_algorithm: DIGEST_ALGORITHM.to_string(),
            terminal_hash: chain_step(secret, first),
            generated_at: Utc::now(),
        })
    }

    /// Check a disclosure against this commitment.
    ///
    /// Regenerates the chain, so cost is linear in its length.
    pub fn verify(&self, disclosure: &SecretDisclosure) -> Result<(), CommitmentError> {
        if disclosure.public_seed != self.public_seed {
            return Err(CommitmentError::SeedMismatch);
        }
        if disclosure.chain_length != self.chain_length {
            return Err(CommitmentError::LengthMismatch {
                expected: self.chain_length,
                got: disclosure.chain_length,
            });
        }
        if self.digest_algorithm != DIGEST_ALGORITHM {
            return Err(CommitmentError::UnsupportedDigest(self.digest_algorithm.clone()));
        }

        let revealed = disclosure.regenerate().map_err(CommitmentError::Chain)?;
        let first = revealed.first().ok_or(CommitmentError::LengthMismatch {
            expected: self.chain_length,
            got: 0,
        })?;

        if chain_step(&disclosure.secret, first) != self.terminal_hash {
            return Err(CommitmentError::TerminalMismatch);
        }
        Ok(())
    }
}

/// Everything needed to rebuild the chain, published after exhaustion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretDisclosure {
    /// The commitment secret.
    pub secret: String,
    /// Public seed.
    pub public_seed: String,
    /// Number of chain elements.
    pub chain_length: usize,
}

impl SecretDisclosure {
    /// Disclosure for a chain configuration.
    pub fn from_config(config: &ChainConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            public_seed: config.public_seed.clone(),
            chain_length: config.chain_length,
        }
    }

    /// Rebuild the chain in reveal order.
    pub fn regenerate(&self) -> Result<Vec<ChainHash>, ChainError> {
        let mut chain = generate_chain(&self.secret, &self.public_seed, self.chain_length)?;
        chain.reverse();
        Ok(chain)
    }
}

/// Errors that can occur during commitment verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitmentError {
    /// Disclosed seed differs from the committed one.
    SeedMismatch,

    /// Disclosed length differs from the committed one.
    LengthMismatch {
        /// Committed length.
        expected: usize,
        /// Disclosed length.
        got: usize,
    },

    /// Commitment names a digest this build cannot recompute.
    UnsupportedDigest(String),

    /// Disclosure could not produce a chain.
    Chain(ChainError),

    /// Regenerated chain does not hash into the terminal hash.
    TerminalMismatch,
}

impl std::fmt::Display for CommitmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SeedMismatch => write!(f, "Public seed doesn't match commitment"),
            Self::LengthMismatch { expected, got } => {
                write!(f, "Chain length mismatch: expected {}, got {}", expected, got)
            }
            Self::UnsupportedDigest(name) => write!(f, "Unsupported digest algorithm: {}", name),
            Self::Chain(e) => write!(f, "Cannot regenerate chain: {}", e),
            Self::TerminalMismatch => write!(f, "Terminal hash doesn't match commitment"),
        }
    }
}

impl std::error::Error for CommitmentError {}
