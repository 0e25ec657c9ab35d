use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Hot,
    Cold,
    Neutral,
    Correct,
}

impl Classification {
    /// Swaps hot and cold, used by reverse mode
    pub fn reversed(self) -> Self {
        match self {
            Classification::Hot => Classification::Cold,
            Classification::Cold => Classification::Hot,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Higher,
    Lower,
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Higher => write!(f, "higher"),
            Direction::Lower => write!(f, "lower"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuessRecord {
    pub value: i64,
    pub classification: Classification,
}

/// Everything the player learns from one non-winning guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessFeedback {
    pub guess: i64,
    pub classification: Classification,
    pub direction: Option<Direction>,
    pub math_hint: Option<String>,
}

impl GuessFeedback {
    pub fn message(&self) -> String {
        match (self.classification, self.direction) {
            (Classification::Correct, _) => "Correct!".to_string(),
            (Classification::Hot, Some(direction)) => format!("Hot! Try {}!", direction),
            (Classification::Hot, None) => "Hot!".to_string(),
            (Classification::Cold, Some(direction)) => format!("Cold! Try {}!", direction),
            (Classification::Cold, None) => "Cold!".to_string(),
            (Classification::Neutral, direction) => match (&self.math_hint, direction) {
                (Some(hint), Some(direction)) => format!("{}. Try {}!", hint, direction),
                (Some(hint), None) => hint.clone(),
                (None, Some(direction)) => format!("Try {}!", direction),
                (None, None) => "Try again!".to_string(),
            },
        }
    }
}
