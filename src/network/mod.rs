//! Network Layer
//!
//! WebSocket front-end for players.
//! Owns wager validation; all outcomes come from `game/`.

pub mod protocol;
pub mod server;

pub use protocol::{ClientMessage, ServerMessage, PlayRequest, ServerError, ErrorCode};
pub use server::{GameServer, ServerConfig, GameServerError};
