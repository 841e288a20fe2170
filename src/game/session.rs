//! Game Sessions
//!
//! One game consumes five consecutive chain slots, one per round, and
//! pays `amount × Σ multipliers`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::multiplier::multiplier_for_round;
use crate::chain::{ChainAllocator, ChainError, ROUNDS_PER_GAME};
use crate::core::hash::ChainHash;

/// A played game.
///
/// Serialized for clients with exactly four fields:
/// `chainStartPoint`, `amount`, `rolls`, `net`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// First reveal index consumed by this game.
    pub chain_start_point: usize,
    /// Wager.
    pub amount: f64,
    /// Per-round multipliers, round 1 first.
    pub rolls: Vec<f64>,
    /// Net payout: `amount × Σ rolls`.
    pub net: f64,
}

impl Game {
    /// Derive a game from the chain elements it consumed.
    ///
    /// Round `i` (1-based) uses `elements[i - 1]`. Nothing but the chain
    /// elements feeds the outcome.
    pub fn from_elements(chain_start_point: usize, amount: f64, elements: &[ChainHash]) -> Self {
        let rolls = rolls_for(elements);
        let net = evaluate(amount, &rolls);
        Self {
            chain_start_point,
            amount,
            rolls,
            net,
        }
    }

    /// Sum of the round multipliers.
    pub fn total_multiplier(&self) -> f64 {
        self.rolls.iter().sum()
    }

    /// Whether the payout exceeds the wager.
    pub fn is_win(&self) -> bool {
        self.total_multiplier() > 1.0
    }

    /// Reveal indices this game consumed.
    ///
    /// `None` if the range would overflow, which only a forged game can
    /// claim.
    pub fn slots(&self) -> Option<std::ops::Range<usize>> {
        let end = self.chain_start_point.checked_add(self.rolls.len())?;
        Some(self.chain_start_point..end)
    }
}

/// Multipliers for consecutive rounds starting at round 1.
pub fn rolls_for(elements: &[ChainHash]) -> Vec<f64> {
    elements
        .iter()
        .zip(1u32..)
        .map(|(element, round)| multiplier_for_round(round, element))
        .collect()
}

/// Net payout for a wager and its rolls.
pub fn evaluate(amount: f64, rolls: &[f64]) -> f64 {
    rolls.iter().sum::<f64>() * amount
}

/// Claim the next five slots and play them.
///
/// `amount` is not validated here; the caller owns wager policy.
pub fn create_game(allocator: &ChainAllocator, amount: f64) -> Result<Game, ChainError> {
    let claim = allocator.claim(ROUNDS_PER_GAME)?;
    let game = Game::from_elements(claim.start, amount, &claim.elements);

    debug!(
        start = game.chain_start_point,
        amount = game.amount,
        net = game.net,
        "Game played"
    );

    Ok(game)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::generate_chain;
    use crate::game::multiplier::RoundBounds;

    const SEED: &str = "0000000000000000000000000000000000000000000000000000000000000000";

    fn test_allocator(length: usize) -> ChainAllocator {
        ChainAllocator::new(generate_chain("k", SEED, length).unwrap())
    }

    #[test]
    fn test_create_game_shape() {
        let allocator = test_allocator(10);
        let game = create_game(&allocator, 100.0).unwrap();

        assert_eq!(game.chain_start_point, 0);
        assert_eq!(game.amount, 100.0);
        assert_eq!(game.rolls.len(), ROUNDS_PER_GAME);
        assert_eq!(game.slots(), Some(0..5));

        for (i, roll) in game.rolls.iter().enumerate() {
            assert!(RoundBounds::for_round(i as u32 + 1).contains(*roll));
        }
    }

    #[test]
    fn test_net_is_amount_times_sum() {
        let allocator = test_allocator(10);
        let game = create_game(&allocator, 250.0).unwrap();

        let sum: f64 = game.rolls.iter().sum();
        assert_eq!(game.net, sum * 250.0);
        assert_eq!(game.is_win(), sum > 1.0);
    }

    #[test]
    fn test_games_consume_consecutive_slots() {
        let allocator = test_allocator(10);
        let first = create_game(&allocator, 1.0).unwrap();
        let second = create_game(&allocator, 1.0).unwrap();

        assert_eq!(first.chain_start_point, 0);
        assert_eq!(second.chain_start_point, 5);
        assert_ne!(first.rolls, second.rolls);

        assert!(matches!(create_game(&allocator, 1.0), Err(ChainError::Exhausted { .. })));
    }

    #[test]
    fn test_game_reproducible_from_chain() {
        let allocator = test_allocator(15);
        create_game(&allocator, 1.0).unwrap();
        let game = create_game(&allocator, 42.0).unwrap();

        let elements: Vec<ChainHash> = game
            .slots()
            .unwrap()
            .map(|i| *allocator.element(i).unwrap())
            .collect();
        let replayed = Game::from_elements(game.chain_start_point, 42.0, &elements);

        assert_eq!(replayed, game);
    }

    #[test]
    fn test_slots_overflow() {
        let game = Game {
            chain_start_point: usize::MAX - 2,
            amount: 1.0,
            rolls: vec![0.0; ROUNDS_PER_GAME],
            net: 0.0,
        };
        assert_eq!(game.slots(), None);
    }

    #[test]
    fn test_zero_amount_is_not_rejected() {
        let allocator = test_allocator(5);
        let game = create_game(&allocator, 0.0).unwrap();
        assert_eq!(game.net, 0.0);
    }

    #[test]
    fn test_json_field_names() {
        let game = Game {
            chain_start_point: 5,
            amount: 10.0,
            rolls: vec![0.5, 0.1, 0.0, -0.1, 0.2],
            net: 7.0,
        };

        let value = serde_json::to_value(&game).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 4);
        assert_eq!(object["chainStartPoint"], 5);
        assert_eq!(object["amount"], 10.0);
        assert_eq!(object["rolls"].as_array().unwrap().len(), 5);
        assert_eq!(object["net"], 7.0);
    }
}
