//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! All messages are JSON objects tagged by `type`.

use serde::{Serialize, Deserialize};

use crate::game::session::Game;
use crate::proof::commitment::ChainCommitment;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Play one game.
    Play(PlayRequest),

    /// Request the published chain commitment.
    Commitment,

    /// Ping for latency measurement.
    Ping { timestamp: u64 },
}

/// Wager for one game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayRequest {
    /// Amount wagered.
    pub amount: f64,
}

impl PlayRequest {
    /// Check the wager before it reaches the engine.
    pub fn validate(&self, min_amount: f64) -> Result<f64, ServerError> {
        if !self.amount.is_finite() || self.amount < min_amount {
            return Err(ServerError {
                code: ErrorCode::InvalidAmount,
                message: format!("amount must be at least {}", min_amount),
            });
        }
        Ok(self.amount)
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once after the connection opens.
    #[serde(rename_all = "camelCase")]
    Welcome {
        session_id: String,
        server_version: String,
    },

    /// Outcome of a `play` request.
    GameResult { game: Game },

    /// The chain commitment.
    Commitment { commitment: ChainCommitment },

    /// Pong response.
    #[serde(rename_all = "camelCase")]
    Pong { timestamp: u64, server_time: u64 },

    /// Error message.
    Error(ServerError),

    /// Server shutting down.
    Shutdown { reason: String },
}

/// Server error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Message could not be parsed.
    InvalidInput,
    /// Wager missing, non-finite or below the minimum.
    InvalidAmount,
    /// No games left on this chain.
    ChainExhausted,
    /// Connection limit reached.
    ServerOverloaded,
    /// Internal error.
    InternalError,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Shorthand for an error message.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error(ServerError {
            code,
            message: message.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_play() {
        let msg = ClientMessage::from_json(r#"{"type":"play","amount":25.5}"#).unwrap();

        if let ClientMessage::Play(req) = msg {
            assert_eq!(req.amount, 25.5);
        } else {
            panic!("Wrong message type");
        }
    }

    #[test]
    fn test_parse_unit_and_ping() {
        assert!(matches!(
            ClientMessage::from_json(r#"{"type":"commitment"}"#).unwrap(),
            ClientMessage::Commitment
        ));
        assert!(matches!(
            ClientMessage::from_json(r#"{"type":"ping","timestamp":7}"#).unwrap(),
            ClientMessage::Ping { timestamp: 7 }
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(ClientMessage::from_json(r#"{"type":"withdraw","amount":1}"#).is_err());
        assert!(ClientMessage::from_json(r#"{"type":"play"}"#).is_err());
    }

    #[test]
    fn test_amount_validation() {
        assert_eq!(PlayRequest { amount: 1.0 }.validate(1.0).unwrap(), 1.0);
        assert_eq!(PlayRequest { amount: 500.0 }.validate(1.0).unwrap(), 500.0);

        for amount in [0.0, 0.5, -10.0, f64::NAN, f64::INFINITY] {
            let err = PlayRequest { amount }.validate(1.0).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidAmount);
        }
    }

    #[test]
    fn test_game_result_json() {
        let msg = ServerMessage::GameResult {
            game: Game {
                chain_start_point: 10,
                amount: 5.0,
                rolls: vec![1.0, 0.0, 0.0, 0.0, 0.0],
                net: 5.0,
            },
        };

        let json: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "game_result");
        assert_eq!(json["game"]["chainStartPoint"], 10);
        assert_eq!(json["game"]["net"], 5.0);
    }

    #[test]
    fn test_envelope_fields_are_camel_case() {
        let welcome = ServerMessage::Welcome {
            session_id: "abc".to_string(),
            server_version: "0.1.0".to_string(),
        };
        let json: serde_json::Value = serde_json::from_str(&welcome.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "welcome");
        assert_eq!(json["sessionId"], "abc");
        assert_eq!(json["serverVersion"], "0.1.0");

        let pong = ServerMessage::Pong { timestamp: 7, server_time: 9 };
        let json: serde_json::Value = serde_json::from_str(&pong.to_json().unwrap()).unwrap();
        assert_eq!(json["timestamp"], 7);
        assert_eq!(json["serverTime"], 9);
        assert!(json.get("server_time").is_none());
    }

    #[test]
    fn test_error_codes() {
        let msg = ServerMessage::error(ErrorCode::ChainExhausted, "no games left");
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"error\""));
        assert!(json.contains("chain_exhausted"));
    }
}
