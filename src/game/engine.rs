//! Fair Engine
//!
//! The handle request handlers share. Built once at startup; cloning is
//! cheap and every clone draws from the same chain and cursor.

use std::sync::Arc;

use tracing::{info, instrument};

use super::session::{create_game, Game};
use super::simulation::{simulate, SimulationReport};
use crate::chain::{generate_chain, ChainAllocator, ChainConfig, ChainError, ROUNDS_PER_GAME};
use crate::proof::commitment::ChainCommitment;

/// Shared entry point to the provably-fair core.
#[derive(Clone, Debug)]
pub struct FairEngine {
    allocator: Arc<ChainAllocator>,
    commitment: Arc<ChainCommitment>,
}

impl FairEngine {
    /// Generate the chain and prepare it for reveal.
    ///
    /// Blocks until generation completes. Call once, before serving
    /// traffic; a failure here must stop startup.
    #[instrument(skip(config), fields(length = config.chain_length))]
    pub fn initialize(config: &ChainConfig) -> Result<Self, ChainError> {
        config.validate()?;

        let generated = generate_chain(&config.secret, &config.public_seed, config.chain_length)?;
        let allocator = ChainAllocator::new(generated);

        let commitment = ChainCommitment::from_reveal_chain(
            &config.secret,
            &config.public_seed,
            &allocator.chain(),
        )
        .ok_or_else(|| ChainError::Configuration("chain is empty".to_string()))?;

        info!(
            terminal_hash = %hex::encode(commitment.terminal_hash),
            games = config.game_capacity(),
            "Chain committed"
        );

        Ok(Self {
            allocator: Arc::new(allocator),
            commitment: Arc::new(commitment),
        })
    }

    /// Play one game of five rounds.
    ///
    /// The caller checks the wager and applies `net` afterwards.
    pub fn play_game(&self, amount: f64) -> Result<Game, ChainError> {
        create_game(&self.allocator, amount)
    }

    /// Simulate games over the start of the chain without consuming slots.
    pub fn run_simulation(&self, game_count: usize) -> Result<SimulationReport, ChainError> {
        simulate(&self.allocator.chain(), game_count)
    }

    /// Public commitment to this chain.
    pub fn commitment(&self) -> &ChainCommitment {
        &self.commitment
    }

    /// The allocator behind this engine.
    pub fn allocator(&self) -> &ChainAllocator {
        &self.allocator
    }

    /// Complete games still playable.
    pub fn games_remaining(&self) -> usize {
        self.allocator.remaining() / ROUNDS_PER_GAME
    }
}
