//! Fairness Simulation
//!
//! Replays games straight off the reveal-ordered chain to measure win rate
//! and average total multiplier. Reads the chain only; the allocator's
//! cursor is never touched, so production slots are not consumed.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::session::rolls_for;
use crate::chain::{ChainError, ROUNDS_PER_GAME};
use crate::core::hash::ChainHash;

/// Aggregate outcome of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    /// Games simulated.
    pub games: usize,
    /// Games whose total multiplier exceeded 1.
    pub wins: usize,
    /// `wins / games`.
    pub win_rate: f64,
    /// Mean of the per-game total multiplier.
    pub average_total_multiplier: f64,
}

impl std::fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "won {} of {} games (win rate {:.6}, average multiplier {:.6})",
            self.wins, self.games, self.win_rate, self.average_total_multiplier
        )
    }
}

/// Simulate `game_count` games over reveal indices `[0, 5 × game_count)`.
///
/// Game `j` uses indices `5j..5j+5`, exactly as the allocator would have
/// issued them to the first `game_count` players.
///
/// A run longer than the chain fails with [`ChainError::Exhausted`] and
/// `cursor: 0`, the index every simulation starts from.
pub fn simulate(chain: &[ChainHash], game_count: usize) -> Result<SimulationReport, ChainError> {
    let needed = game_count
        .checked_mul(ROUNDS_PER_GAME)
        .filter(|needed| *needed <= chain.len())
        .ok_or(ChainError::Exhausted {
            requested: game_count.saturating_mul(ROUNDS_PER_GAME),
            cursor: 0,
            length: chain.len(),
        })?;

    if game_count == 0 {
        return Ok(SimulationReport::default());
    }

    let mut wins = 0;
    let mut total_multiplier = 0.0;

    for game in chain[..needed].chunks_exact(ROUNDS_PER_GAME) {
        let total: f64 = rolls_for(game).iter().sum();
        if total > 1.0 {
            wins += 1;
        }
        total_multiplier += total;
    }

    let report = SimulationReport {
        games: game_count,
        wins,
        win_rate: wins as f64 / game_count as f64,
        average_total_multiplier: total_multiplier / game_count as f64,
    };

    info!("Simulation: {}", report);
    Ok(report)
}
