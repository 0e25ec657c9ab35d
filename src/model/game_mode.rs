use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const CHAOS_INTERVAL: Duration = Duration::from_millis(15_000);
pub const BLITZ_DURATION: Duration = Duration::from_millis(30_000);
pub const COUNTDOWN_TICK: Duration = Duration::from_millis(1_000);
pub const BOT_TURN_DELAY: Duration = Duration::from_millis(800);
pub const NEXT_ROUND_DELAY: Duration = Duration::from_millis(3_000);

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Classic,
    Chaos,
    Math,
    Daily,
    Streak,
    Reverse,
    Blitz,
    Sudden,
    Bot,
    #[serde(rename = "breakthebot")]
    BreakTheBot,
    #[serde(rename = "doublechaos")]
    DoubleChaos,
    Practice,
}

/// Which timer family a mode runs while a round is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRegimeKind {
    None,
    Chaos,
    DoubleChaos,
    Blitz,
}

impl GameMode {
    pub fn all() -> Vec<GameMode> {
        vec![
            GameMode::Classic,
            GameMode::Chaos,
            GameMode::Math,
            GameMode::Daily,
            GameMode::Streak,
            GameMode::Reverse,
            GameMode::Blitz,
            GameMode::Sudden,
            GameMode::Bot,
            GameMode::BreakTheBot,
            GameMode::DoubleChaos,
            GameMode::Practice,
        ]
    }

    pub fn key(&self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::Chaos => "chaos",
            GameMode::Math => "math",
            GameMode::Daily => "daily",
            GameMode::Streak => "streak",
            GameMode::Reverse => "reverse",
            GameMode::Blitz => "blitz",
            GameMode::Sudden => "sudden",
            GameMode::Bot => "bot",
            GameMode::BreakTheBot => "breakthebot",
            GameMode::DoubleChaos => "doublechaos",
            GameMode::Practice => "practice",
        }
    }

    pub fn explanation(&self) -> &'static str {
        match self {
            GameMode::Classic => "Guess the hidden number within the range and limited attempts.",
            GameMode::Chaos => "The number changes every 15 seconds! Try to guess before it changes.",
            GameMode::Math => "Get math hints to help you guess the number.",
            GameMode::Daily => "Daily challenge - try to win once a day.",
            GameMode::Streak => {
                "Win? The range increases and attempts decrease! How long can your streak last?"
            }
            GameMode::Reverse => "Hot/Cold is reversed! Hot = far, Cold = close.",
            GameMode::Blitz => "You have only 30 seconds to guess the number!",
            GameMode::Sudden => "Only one guess! Hit or miss.",
            GameMode::Bot => "Take turns with the bot. Whoever finds the number first wins.",
            GameMode::BreakTheBot => {
                "Try to outsmart the bot! Take turns guessing. If the bot finds the number first, you lose."
            }
            GameMode::DoubleChaos => "Range and number change every 15 seconds!",
            GameMode::Practice => "Unlimited attempts. No pressure.",
        }
    }

    pub fn is_bot_mode(&self) -> bool {
        matches!(self, GameMode::Bot | GameMode::BreakTheBot)
    }

    pub fn timer_regime(&self) -> TimerRegimeKind {
        match self {
            GameMode::Chaos => TimerRegimeKind::Chaos,
            GameMode::DoubleChaos => TimerRegimeKind::DoubleChaos,
            GameMode::Blitz => TimerRegimeKind::Blitz,
            _ => TimerRegimeKind::None,
        }
    }
}

impl Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', '_', ' '], "");
        GameMode::all()
            .into_iter()
            .find(|mode| mode.key().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown game mode: {}", s))
    }
}
