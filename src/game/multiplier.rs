//! Round Multipliers
//!
//! Each round draws a multiplier uniformly between round-specific bounds:
//!
//! | round | min   | max                              |
//! |-------|-------|----------------------------------|
//! | 1     | 0.05  | 1.20                             |
//! | 2     | -0.20 | 0.80                             |
//! | 3     | -0.30 | 0.25                             |
//! | ≥4    | -0.30 | max(0.30 - 0.05·(round-2), -0.30) |
//!
//! Round 3 does not follow the general formula (which would give 0.20).
//! These bounds are published game parameters and must stay exactly as is.

use serde::{Deserialize, Serialize};

use crate::core::hash::ChainHash;
use crate::core::unit::normalize_digest;

/// Lowest multiplier any round past the second can draw.
pub const FLOOR_MULTIPLIER: f64 = -0.3;

/// Inclusive multiplier range for one round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundBounds {
    /// Multiplier at unit value 0.
    pub min: f64,
    /// Multiplier approached as the unit value tends to 1.
    pub max: f64,
}

impl RoundBounds {
    /// Bounds for a 1-based round number.
    pub fn for_round(round: u32) -> Self {
        match round {
            1 => Self { min: 0.05, max: 1.2 },
            2 => Self { min: -0.2, max: 0.8 },
            3 => Self { min: FLOOR_MULTIPLIER, max: 0.25 },
            _ => {
                let max = 0.3 - 0.05 * (f64::from(round) - 2.0);
                Self {
                    min: FLOOR_MULTIPLIER,
                    max: max.max(FLOOR_MULTIPLIER),
                }
            }
        }
    }

    /// Linear interpolation between the bounds.
    #[inline]
    pub fn interpolate(&self, unit: f64) -> f64 {
        self.min + unit * (self.max - self.min)
    }

    /// Whether a multiplier lies within the bounds.
    pub fn contains(&self, multiplier: f64) -> bool {
        multiplier >= self.min && multiplier <= self.max
    }
}

/// Multiplier for a round given an already-normalized unit value.
#[inline]
pub fn multiplier_from_unit(round: u32, unit: f64) -> f64 {
    RoundBounds::for_round(round).interpolate(unit)
}

/// Multiplier for a round drawn from one chain element.
pub fn multiplier_for_round(round: u32, element: &ChainHash) -> f64 {
    multiplier_from_unit(round, normalize_digest(element))
}
