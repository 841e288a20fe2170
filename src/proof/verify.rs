//! Verification API
//!
//! Third-party checks once the secret is disclosed: revealed elements
//! must sit on the regenerated chain, and every game must replay to the
//! same rolls and net payout.

use tracing::{debug, warn};

use super::commitment::{ChainCommitment, CommitmentError, SecretDisclosure};
use crate::chain::{ChainError, ROUNDS_PER_GAME};
use crate::core::hash::{chain_step, ChainHash};
use crate::game::session::Game;

/// Absolute tolerance when comparing reported and replayed multipliers.
pub const ROLL_TOLERANCE: f64 = 1e-9;

/// Errors that can occur during verification.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VerificationError {
    /// Commitment check failed.
    #[error("Commitment check failed: {0}")]
    Commitment(#[from] CommitmentError),

    /// Disclosure could not produce a chain.
    #[error("Cannot regenerate chain: {0}")]
    Chain(#[from] ChainError),

    /// A revealed element is not the one at its reveal index.
    #[error("Revealed element {index} does not match the chain")]
    ElementMismatch {
        /// Reveal index of the first bad element.
        index: usize,
    },

    /// A revealed element does not hash into its predecessor.
    #[error("Reveal {index} does not hash into reveal {}", .index - 1)]
    BrokenLink {
        /// Reveal index of the element that fails to link.
        index: usize,
    },

    /// Game claims slots past the end of the chain.
    #[error("Game slots {start}..{end} exceed chain length {length}")]
    OutOfRange {
        /// First claimed slot.
        start: usize,
        /// One past the last claimed slot.
        end: usize,
        /// Chain length.
        length: usize,
    },

    /// Game has the wrong number of rounds.
    #[error("Expected {expected} rolls, got {got}")]
    RollCount {
        /// Rounds per game.
        expected: usize,
        /// Rolls reported.
        got: usize,
    },

    /// A roll differs from its replay.
    #[error("Round {round} mismatch: expected {expected}, got {got}")]
    RollMismatch {
        /// 1-based round number.
        round: usize,
        /// Replayed multiplier.
        expected: f64,
        /// Reported multiplier.
        got: f64,
    },

    /// Net payout differs from its replay.
    #[error("Net mismatch: expected {expected}, got {got}")]
    NetMismatch {
        /// Replayed net.
        expected: f64,
        /// Reported net.
        got: f64,
    },
}

/// Check one reveal step: `H(secret ∥ hex(later)) == earlier`.
///
/// `earlier` is reveal index `k`, `later` is `k + 1`.
pub fn verify_reveal_link(secret: &str, earlier: &ChainHash, later: &ChainHash) -> bool {
    chain_step(secret, later) == *earlier
}

/// Check a sequence of consecutive reveals starting at reveal index `offset`.
pub fn verify_reveal_sequence(
    secret: &str,
    offset: usize,
    revealed: &[ChainHash],
) -> Result<(), VerificationError> {
    for (i, pair) in revealed.windows(2).enumerate() {
        if !verify_reveal_link(secret, &pair[0], &pair[1]) {
            return Err(VerificationError::BrokenLink { index: offset + i + 1 });
        }
    }
    Ok(())
}

/// Compare revealed elements, starting at reveal index 0, with the chain.
pub fn verify_revealed_chain(
    chain: &[ChainHash],
    revealed: &[ChainHash],
) -> Result<(), VerificationError> {
    if revealed.len() > chain.len() {
        return Err(VerificationError::ElementMismatch { index: chain.len() });
    }
    match chain.iter().zip(revealed).position(|(expected, got)| expected != got) {
        Some(index) => Err(VerificationError::ElementMismatch { index }),
        None => Ok(()),
    }
}

/// Replay a game against the reveal-ordered chain.
pub fn verify_game(chain: &[ChainHash], game: &Game) -> Result<(), VerificationError> {
    if game.rolls.len() != ROUNDS_PER_GAME {
        return Err(VerificationError::RollCount {
            expected: ROUNDS_PER_GAME,
            got: game.rolls.len(),
        });
    }

    let out_of_range = || VerificationError::OutOfRange {
        start: game.chain_start_point,
        end: game.chain_start_point.saturating_add(game.rolls.len()),
        length: chain.len(),
    };
    let elements = game
        .slots()
        .and_then(|slots| chain.get(slots))
        .ok_or_else(out_of_range)?;

    let replayed = Game::from_elements(game.chain_start_point, game.amount, elements);

    for (i, (expected, got)) in replayed.rolls.iter().zip(&game.rolls).enumerate() {
        if (expected - got).abs() > ROLL_TOLERANCE {
            return Err(VerificationError::RollMismatch {
                round: i + 1,
                expected: *expected,
                got: *got,
            });
        }
    }

    let net_tolerance = ROLL_TOLERANCE * game.amount.abs().max(1.0);
    if (replayed.net - game.net).abs() > net_tolerance {
        return Err(VerificationError::NetMismatch {
            expected: replayed.net,
            got: game.net,
        });
    }

    Ok(())
}

/// Audits played games after the secret is disclosed.
///
/// Construction checks the disclosure against the published commitment
/// and regenerates the chain once; every later check is a lookup.
pub struct ChainAuditor {
    disclosure: SecretDisclosure,
    chain: Vec<ChainHash>,
}

impl ChainAuditor {
    /// Verify the disclosure against the commitment and rebuild the chain.
    pub fn new(commitment: &ChainCommitment, disclosure: SecretDisclosure) -> Result<Self, VerificationError> {
        commitment.verify(&disclosure)?;
        let chain = disclosure.regenerate()?;
        debug!(length = chain.len(), "Auditor chain regenerated");
        Ok(Self { disclosure, chain })
    }

    /// Rebuild the chain without a commitment check.
    pub fn unchecked(disclosure: SecretDisclosure) -> Result<Self, VerificationError> {
        let chain = disclosure.regenerate()?;
        Ok(Self { disclosure, chain })
    }

    /// The regenerated chain in reveal order.
    pub fn chain(&self) -> &[ChainHash] {
        &self.chain
    }

    /// The disclosure being audited.
    pub fn disclosure(&self) -> &SecretDisclosure {
        &self.disclosure
    }

    /// Check one game.
    pub fn audit_game(&self, game: &Game) -> Result<(), VerificationError> {
        verify_game(&self.chain, game).map_err(|e| {
            warn!(start = game.chain_start_point, "Game failed audit: {}", e);
            e
        })
    }

    /// Check many games, returning the first failure with its position.
    pub fn audit_games<'a, I>(&self, games: I) -> Result<usize, (usize, VerificationError)>
    where
        I: IntoIterator<Item = &'a Game>,
    {
        let mut count = 0;
        for (i, game) in games.into_iter().enumerate() {
            self.audit_game(game).map_err(|e| (i, e))?;
            count += 1;
        }
        Ok(count)
    }

    /// Check elements revealed so far, starting at reveal index 0.
    pub fn audit_revealed(&self, revealed: &[ChainHash]) -> Result<(), VerificationError> {
        verify_reveal_sequence(&self.disclosure.secret, 0, revealed)?;
        verify_revealed_chain(&self.chain, revealed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{generate_chain, ChainAllocator};
    use crate::game::session::create_game;

    const SEED: &str = "0000000000000000000000000000000000000000000000000000000000000000";

    fn test_disclosure(length: usize) -> SecretDisclosure {
        SecretDisclosure {
            secret: "k".to_string(),
            public_seed: SEED.to_string(),
            chain_length: length,
        }
    }

    fn played_games(length: usize, count: usize) -> (ChainAllocator, Vec<Game>) {
        let allocator = ChainAllocator::new(generate_chain("k", SEED, length).unwrap());
        let games = (0..count)
            .map(|i| create_game(&allocator, 10.0 * (i + 1) as f64).unwrap())
            .collect();
        (allocator, games)
    }

    #[test]
    fn test_honest_games_verify() {
        let (allocator, games) = played_games(30, 6);
        let revealed = allocator.chain();
        let commitment = ChainCommitment::from_reveal_chain("k", SEED, &revealed).unwrap();

        let auditor = ChainAuditor::new(&commitment, test_disclosure(30)).unwrap();
        assert_eq!(auditor.audit_games(&games), Ok(6));
        assert!(auditor.audit_revealed(&revealed[..12]).is_ok());
    }

    #[test]
    fn test_tampered_roll_detected() {
        let (allocator, mut games) = played_games(15, 3);
        games[1].rolls[2] += 0.01;

        let result = verify_game(&allocator.chain(), &games[1]);
        assert!(matches!(result, Err(VerificationError::RollMismatch { round: 3, .. })));
    }

    #[test]
    fn test_tampered_net_detected() {
        let (allocator, mut games) = played_games(10, 1);
        games[0].net += 1.0;

        let result = verify_game(&allocator.chain(), &games[0]);
        assert!(matches!(result, Err(VerificationError::NetMismatch { .. })));
    }

    #[test]
    fn test_shifted_start_detected() {
        let (allocator, mut games) = played_games(15, 2);
        games[0].chain_start_point = 5;

        assert!(verify_game(&allocator.chain(), &games[0]).is_err());
    }

    #[test]
    fn test_out_of_range_game() {
        let (allocator, mut games) = played_games(10, 1);
        games[0].chain_start_point = 8;

        assert!(matches!(
            verify_game(&allocator.chain(), &games[0]),
            Err(VerificationError::OutOfRange { start: 8, end: 13, length: 10 })
        ));
    }

    #[test]
    fn test_overflowing_start_is_out_of_range() {
        let (allocator, _) = played_games(10, 0);
        let game: Game = serde_json::from_str(
            r#"{"chainStartPoint":18446744073709551613,"amount":1.0,"rolls":[0.1,0.1,0.1,0.1,0.1],"net":0.5}"#,
        )
        .unwrap();

        assert!(matches!(
            verify_game(&allocator.chain(), &game),
            Err(VerificationError::OutOfRange { start, end: usize::MAX, length: 10 })
                if start == usize::MAX - 2
        ));
    }

    #[test]
    fn test_wrong_roll_count() {
        let (allocator, mut games) = played_games(10, 1);
        games[0].rolls.pop();

        assert!(matches!(
            verify_game(&allocator.chain(), &games[0]),
            Err(VerificationError::RollCount { expected: 5, got: 4 })
        ));
    }

    #[test]
    fn test_reveal_links() {
        let (allocator, _) = played_games(10, 0);
        let chain = allocator.chain();

        assert!(verify_reveal_link("k", &chain[3], &chain[4]));
        assert!(!verify_reveal_link("k", &chain[4], &chain[3]));
        assert!(!verify_reveal_link("j", &chain[3], &chain[4]));
        assert!(verify_reveal_sequence("k", 0, &chain).is_ok());
    }

    #[test]
    fn test_swapped_reveal_detected() {
        let (allocator, _) = played_games(10, 0);
        let mut revealed = allocator.chain().to_vec();
        revealed[6] = [0xAB; 32];

        assert_eq!(
            verify_reveal_sequence("k", 0, &revealed),
            Err(VerificationError::BrokenLink { index: 6 })
        );

        let auditor = ChainAuditor::unchecked(test_disclosure(10)).unwrap();
        assert!(auditor.audit_revealed(&revealed).is_err());
        assert_eq!(
            verify_revealed_chain(auditor.chain(), &revealed),
            Err(VerificationError::ElementMismatch { index: 6 })
        );
    }

    #[test]
    fn test_wrong_secret_rejected_by_auditor() {
        let (allocator, _) = played_games(10, 0);
        let commitment = ChainCommitment::from_reveal_chain("k", SEED, &allocator.chain()).unwrap();

        let mut disclosure = test_disclosure(10);
        disclosure.secret = "not-k".to_string();

        assert!(matches!(
            ChainAuditor::new(&commitment, disclosure),
            Err(VerificationError::Commitment(CommitmentError::TerminalMismatch))
        ));
    }

    #[test]
    fn test_audit_games_reports_position() {
        let (allocator, mut games) = played_games(20, 4);
        games[2].rolls[0] = 99.0;

        let auditor = ChainAuditor::unchecked(test_disclosure(20)).unwrap();
        assert_eq!(auditor.chain(), &allocator.chain()[..]);

        let (index, error) = auditor.audit_games(&games).unwrap_err();
        assert_eq!(index, 2);
        assert!(matches!(error, VerificationError::RollMismatch { round: 1, .. }));
    }
}
