//! # Luckydog Server
//!
//! Provably-fair multiplier game built on a SHA-256 hash chain.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      LUCKYDOG SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                 │
//! │  ├── hash.rs     - Chain digest and hex helpers             │
//! │  └── unit.rs     - Digest → [0, 1) normalization            │
//! │                                                             │
//! │  chain/          - Commitment chain                         │
//! │  ├── generator.rs- One-shot generation + config             │
//! │  └── allocator.rs- Reveal-order slots, atomic cursor        │
//! │                                                             │
//! │  game/           - Outcomes                                 │
//! │  ├── multiplier.rs - Round bounds, digest → multiplier      │
//! │  ├── session.rs  - Five-round game and payout               │
//! │  ├── simulation.rs - Win-rate replay over the chain         │
//! │  └── engine.rs   - Shared handle for callers                │
//! │                                                             │
//! │  proof/          - Commitment and third-party audit         │
//! │  network/        - WebSocket front-end (non-deterministic)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fairness Guarantee
//!
//! Every outcome is a pure function of one chain element, and every chain
//! element is a pure function of (secret, public seed). Once the secret is
//! published, anyone can regenerate the chain and replay every game.
//! Nothing else, including server-side randomness, feeds an outcome.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod chain;
pub mod core;
pub mod game;
pub mod network;
pub mod proof;

// Re-export commonly used types
pub use chain::{ChainAllocator, ChainConfig, ChainError, ROUNDS_PER_GAME};
pub use crate::core::hash::ChainHash;
pub use game::{FairEngine, Game, SimulationReport};
pub use proof::{ChainAuditor, ChainCommitment, SecretDisclosure};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
