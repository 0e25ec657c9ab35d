use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::GameMode;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    Chaos,
}

impl Difficulty {
    pub fn all() -> Vec<Difficulty> {
        vec![
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Hard,
            Difficulty::Chaos,
        ]
    }

    pub fn key(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Chaos => "chaos",
        }
    }

    /// Upper bound of the range for every mode outside double chaos and streak
    pub fn standard_max(&self) -> i64 {
        match self {
            Difficulty::Easy => 100,
            Difficulty::Medium => 250,
            Difficulty::Hard => 500,
            Difficulty::Chaos => 1000,
        }
    }

    pub fn standard_attempts(&self) -> u32 {
        match self {
            Difficulty::Easy => 12,
            Difficulty::Medium => 10,
            Difficulty::Hard => 8,
            Difficulty::Chaos => 5,
        }
    }

    pub fn double_chaos_max(&self) -> i64 {
        match self {
            Difficulty::Easy => 200,
            Difficulty::Medium => 400,
            Difficulty::Hard => 600,
            Difficulty::Chaos => 1000,
        }
    }

    pub fn double_chaos_attempts(&self) -> u32 {
        match self {
            Difficulty::Easy => 12,
            Difficulty::Medium => 10,
            Difficulty::Hard => 8,
            Difficulty::Chaos => 6,
        }
    }

    /// Score multiplier in tenths (1.0, 1.2, 1.4, 1.6)
    pub fn score_multiplier_tenths(&self) -> i64 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 12,
            Difficulty::Hard => 14,
            Difficulty::Chaos => 16,
        }
    }

    /// Experience multiplier in halves (1, 1.5, 2, 3)
    pub fn experience_multiplier_halves(&self) -> u32 {
        match self {
            Difficulty::Easy => 2,
            Difficulty::Medium => 3,
            Difficulty::Hard => 4,
            Difficulty::Chaos => 6,
        }
    }

    pub fn efficiency_bonus(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.0,
            Difficulty::Medium => 5.0,
            Difficulty::Hard => 10.0,
            Difficulty::Chaos => 15.0,
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::all()
            .into_iter()
            .find(|d| d.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown difficulty: {}", s))
    }
}

/// The range and attempt budget a round starts with. `max_attempts` is `None`
/// for modes without an attempt limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSettings {
    pub min_range: i64,
    pub max_range: i64,
    pub max_attempts: Option<u32>,
}

pub const STREAK_START_MAX: i64 = 100;
pub const STREAK_START_ATTEMPTS: u32 = 12;
pub const STREAK_RANGE_STEP: i64 = 50;
pub const STREAK_ROUNDS: u32 = 12;

impl RangeSettings {
    pub fn for_mode(mode: GameMode, difficulty: Difficulty) -> Self {
        let (max_range, max_attempts) = match mode {
            GameMode::DoubleChaos => (
                difficulty.double_chaos_max(),
                Some(difficulty.double_chaos_attempts()),
            ),
            GameMode::Streak => (STREAK_START_MAX, Some(STREAK_START_ATTEMPTS)),
            GameMode::Sudden => (difficulty.standard_max(), Some(1)),
            GameMode::Practice | GameMode::BreakTheBot => (difficulty.standard_max(), None),
            _ => (
                difficulty.standard_max(),
                Some(difficulty.standard_attempts()),
            ),
        };
        Self {
            min_range: 1,
            max_range,
            max_attempts,
        }
    }

    /// Envelope a double chaos reroll must stay inside
    pub fn envelope(&self) -> (i64, i64) {
        (self.min_range, self.max_range)
    }
}
