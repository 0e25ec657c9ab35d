use crate::game::RoundState;
use crate::model::{
    Achievement, Classification, DailyResult, Difficulty, EasterEgg, GameMode, PersistentStats,
    Tier,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Info,
    Hint,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossReason {
    OutOfAttempts,
    TimeUp,
    NumberExpired,
    BotWon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinSummary {
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub target: i64,
    pub num_guesses: u32,
    pub win_time: u64,
    pub score: u32,
    pub used_help: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LossSummary {
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub target: i64,
    pub reason: LossReason,
    pub num_guesses: u32,
    pub time: u64,
    /// Streak length reached when a streak run ends
    pub streak: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    Won(WinSummary),
    Lost(LossSummary),
    StreakAdvanced {
        summary: WinSummary,
        streak: u32,
        max_range: i64,
        attempts_left: u32,
    },
    StreakCompleted(WinSummary),
}

impl RoundOutcome {
    pub fn is_win(&self) -> bool {
        !matches!(self, RoundOutcome::Lost(_))
    }

    pub fn message(&self) -> String {
        match self {
            RoundOutcome::Won(summary) => format!(
                "Congratulations! You guessed the number! Score: {}",
                summary.score
            ),
            RoundOutcome::Lost(LossSummary {
                streak: Some(streak),
                ..
            }) => format!("Game Over! Your streak: {}", streak),
            RoundOutcome::Lost(summary) => match summary.reason {
                LossReason::TimeUp => "Time's up! You lost.".to_string(),
                LossReason::BotWon => "The bot found the number! You lost.".to_string(),
                LossReason::NumberExpired | LossReason::OutOfAttempts => {
                    format!("Game Over! The number was {}", summary.target)
                }
            },
            RoundOutcome::StreakAdvanced {
                streak,
                max_range,
                attempts_left,
                ..
            } => format!(
                "Correct! Streak: {} / 12. New range: 1-{}. Guesses left: {}",
                streak, max_range, attempts_left
            ),
            RoundOutcome::StreakCompleted(_) => "Amazing! You completed the Streak Mode!".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum GameEngineEvent {
    RoundStarted(RoundState),
    DailyAlreadyPlayed(DailyResult),
    Feedback {
        message: String,
        kind: FeedbackKind,
    },
    HelpRevealed {
        lower: i64,
        upper: i64,
    },
    BotGuessed {
        guess: i64,
        classification: Classification,
        message: String,
    },
    RangeChanged {
        min_range: i64,
        max_range: i64,
    },
    TimerTick(u64),
    RoundSettled(RoundOutcome),
    AchievementUnlocked {
        achievement: Achievement,
        tier: Tier,
    },
    EasterEggDiscovered(EasterEgg),
    StatsUpdated(PersistentStats),
}
