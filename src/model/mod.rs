mod achievement;
mod daily_result;
mod easter_egg;
mod difficulty;
mod game_engine_command;
mod game_engine_event;
mod game_mode;
mod game_stats;
mod guess;
mod tier;
mod timer_state;

pub use achievement::Achievement;
pub use daily_result::DailyResult;
pub use easter_egg::EasterEgg;
pub use difficulty::{
    Difficulty, RangeSettings, STREAK_RANGE_STEP, STREAK_ROUNDS, STREAK_START_ATTEMPTS,
    STREAK_START_MAX,
};
pub use game_engine_command::GameEngineCommand;
pub use game_engine_event::{
    FeedbackKind, GameEngineEvent, LossReason, LossSummary, RoundOutcome, WinSummary,
};
pub use game_mode::{
    GameMode, TimerRegimeKind, BLITZ_DURATION, BOT_TURN_DELAY, CHAOS_INTERVAL, COUNTDOWN_TICK,
    NEXT_ROUND_DELAY,
};
pub use game_stats::{
    CalculatedStats, DailyStats, ModeDifficultyStats, PersistentStats, PersonalBest, Ranking,
    RankingProgress, StreakStats, LEVEL_THRESHOLDS, LEVEL_TITLES,
};
pub use guess::{Classification, Direction, GuessFeedback, GuessRecord};
pub use tier::Tier;
pub use timer_state::TimerState;
