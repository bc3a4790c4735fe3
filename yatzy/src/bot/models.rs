//! Bot difficulty parameters.

use crate::table::config::BotDifficulty;

/// Bot difficulty parameters
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyParams {
    /// Multiplier applied to the strategic adjustments (upper bonus gap,
    /// Yatzy chasing, Chance fallback). Raw points are never scaled.
    pub heuristic_weight: f32,

    /// Probability of discarding the best candidate for a random other one
    pub substitution_rate: f64,
}

impl DifficultyParams {
    /// Get parameters for Easy difficulty
    /// Plays for raw points and often picks a worse option
    pub fn easy() -> Self {
        Self {
            heuristic_weight: 0.5,
            substitution_rate: 0.40,
        }
    }

    /// Get parameters for Medium difficulty
    pub fn medium() -> Self {
        Self {
            heuristic_weight: 1.0,
            substitution_rate: 0.10,
        }
    }

    /// Get parameters for Hard difficulty
    /// Always takes the best candidate
    pub fn hard() -> Self {
        Self {
            heuristic_weight: 1.0,
            substitution_rate: 0.0,
        }
    }

    /// Get parameters for a given difficulty
    pub fn from_difficulty(difficulty: BotDifficulty) -> Self {
        match difficulty {
            BotDifficulty::Easy => Self::easy(),
            BotDifficulty::Medium => Self::medium(),
            BotDifficulty::Hard => Self::hard(),
        }
    }
}
