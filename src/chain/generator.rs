//! Chain Generation
//!
//! Builds the full commitment sequence once, before any game is played.
//! Each step depends on the previous digest, so generation is strictly
//! sequential.

use std::env;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::ChainError;
use crate::core::hash::{chain_step, seed_hash, ChainHash};

/// Public seed used when none is configured.
///
/// A Bitcoin block hash: nobody could have known it before it was mined.
pub const DEFAULT_PUBLIC_SEED: &str =
    "0000000000000000000f3aafaa428b545e2a2cf4a9014228f5fc55019607edc8";

/// Default number of chain elements (200_000 games of 5 rounds).
pub const DEFAULT_CHAIN_LENGTH: usize = 1_000_000;

/// Rounds played per game.
pub const ROUNDS_PER_GAME: usize = 5;

/// Environment variable holding the commitment secret.
pub const ENV_SECRET: &str = "LUCKYDOG_SECRET";
/// Environment variable holding the public seed.
pub const ENV_PUBLIC_SEED: &str = "LUCKYDOG_PUBLIC_SEED";
/// Environment variable holding the chain length.
pub const ENV_CHAIN_LENGTH: &str = "LUCKYDOG_CHAIN_LENGTH";

/// Parameters fixed for the lifetime of one chain.
#[derive(Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Server secret. Published only after the chain is exhausted.
    pub secret: String,
    /// Public seed, published before play.
    pub public_seed: String,
    /// Number of chain elements.
    pub chain_length: usize,
}

impl std::fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainConfig")
            .field("secret", &"<redacted>")
            .field("public_seed", &self.public_seed)
            .field("chain_length", &self.chain_length)
            .finish()
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            public_seed: DEFAULT_PUBLIC_SEED.to_string(),
            chain_length: DEFAULT_CHAIN_LENGTH,
        }
    }
}

impl ChainConfig {
    /// Create a config from explicit values.
    pub fn new(secret: impl Into<String>, public_seed: impl Into<String>, chain_length: usize) -> Self {
        Self {
            secret: secret.into(),
            public_seed: public_seed.into(),
            chain_length,
        }
    }

    /// Load from `LUCKYDOG_*` environment variables, falling back to defaults.
    ///
    /// The secret has no default; a missing secret fails validation.
    pub fn from_env() -> Result<Self, ChainError> {
        let mut config = Self::default();

        if let Ok(secret) = env::var(ENV_SECRET) {
            config.secret = secret;
        }
        if let Ok(seed) = env::var(ENV_PUBLIC_SEED) {
            config.public_seed = seed;
        }
        if let Ok(length) = env::var(ENV_CHAIN_LENGTH) {
            config.chain_length = length.trim().parse().map_err(|_| {
                ChainError::Configuration(format!("{} is not a valid length: {:?}", ENV_CHAIN_LENGTH, length))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the config can produce a chain.
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.secret.is_empty() {
            return Err(ChainError::Configuration("secret must not be empty".to_string()));
        }
        if self.public_seed.is_empty() {
            return Err(ChainError::Configuration("public seed must not be empty".to_string()));
        }
        if self.chain_length == 0 {
            return Err(ChainError::Configuration("chain length must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Number of complete games the chain can serve.
    pub fn game_capacity(&self) -> usize {
        self.chain_length / ROUNDS_PER_GAME
    }
}

/// Generate the chain in generation order.
///
/// `h[0] = H(secret ∥ seed)`, `h[i] = H(secret ∥ hex(h[i-1]))`.
/// Same inputs always give the same sequence.
#[instrument(skip(secret, seed))]
pub fn generate_chain(secret: &str, seed: &str, length: usize) -> Result<Vec<ChainHash>, ChainError> {
    ChainConfig::new(secret, seed, length).validate()?;

    let start = Instant::now();
    let mut chain = Vec::with_capacity(length);

    let mut current = seed_hash(secret, seed);
    chain.push(current);
    for _ in 1..length {
        current = chain_step(secret, &current);
        chain.push(current);
    }

    info!("Generated hash chain of length {} in {:?}", length, start.elapsed());
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "0000000000000000000000000000000000000000000000000000000000000000";

    #[test]
    fn test_generation_determinism() {
        let chain1 = generate_chain("k", SEED, 10).unwrap();
        let chain2 = generate_chain("k", SEED, 10).unwrap();

        assert_eq!(chain1.len(), 10);
        assert_eq!(chain1, chain2);
    }

    #[test]
    fn test_chain_linkage() {
        let chain = generate_chain("k", SEED, 25).unwrap();

        assert_eq!(chain[0], seed_hash("k", SEED));
        for i in 1..chain.len() {
            assert_eq!(chain[i], chain_step("k", &chain[i - 1]), "broken link at {}", i);
        }
    }

    #[test]
    fn test_prefix_stability() {
        // A longer chain starts with the shorter one.
        let short = generate_chain("k", SEED, 5).unwrap();
        let long = generate_chain("k", SEED, 12).unwrap();
        assert_eq!(&long[..5], &short[..]);
    }

    #[test]
    fn test_different_inputs_diverge() {
        let a = generate_chain("k", SEED, 3).unwrap();
        let b = generate_chain("j", SEED, 3).unwrap();
        let c = generate_chain("k", "1", 3).unwrap();

        assert_ne!(a[0], b[0]);
        assert_ne!(a[0], c[0]);
    }

    #[test]
    fn test_single_element_chain() {
        let chain = generate_chain("k", SEED, 1).unwrap();
        assert_eq!(chain, vec![seed_hash("k", SEED)]);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(generate_chain("k", SEED, 0), Err(ChainError::Configuration(_))));
        assert!(matches!(generate_chain("", SEED, 5), Err(ChainError::Configuration(_))));
        assert!(matches!(generate_chain("k", "", 5), Err(ChainError::Configuration(_))));
    }

    #[test]
    fn test_config_default() {
        let config = ChainConfig::default();
        assert_eq!(config.chain_length, DEFAULT_CHAIN_LENGTH);
        assert_eq!(config.public_seed, DEFAULT_PUBLIC_SEED);
        assert_eq!(config.game_capacity(), 200_000);
        // No built-in secret
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_debug_hides_secret() {
        let config = ChainConfig::new("hunter2", SEED, 10);
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("redacted"));
    }
}
