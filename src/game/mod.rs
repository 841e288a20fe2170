//! Game logic.
//!
//! Turns claimed chain slots into played games:
//! - `multiplier` - per-round bounds and digest → multiplier
//! - `session`    - one five-round game and its payout
//! - `simulation` - aggregate statistics straight off the chain
//! - `engine`     - the shared handle callers play through

pub mod engine;
pub mod multiplier;
pub mod session;
pub mod simulation;

pub use engine::FairEngine;
pub use multiplier::{multiplier_for_round, multiplier_from_unit, RoundBounds};
pub use session::{create_game, Game};
pub use simulation::{simulate, SimulationReport};
