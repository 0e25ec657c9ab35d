use std::time::SystemTime;

use log::trace;
use uuid::Uuid;

use super::bot_opponent::{BotState, Turn};
use crate::error::{GuessError, HelpError};
use crate::model::{
    Classification, DailyResult, Difficulty, Direction, GameMode, GuessRecord, RangeSettings,
    TimerState, STREAK_RANGE_STEP, STREAK_ROUNDS, STREAK_START_ATTEMPTS, STREAK_START_MAX,
};

/// Guesses within this distance of the target are hot
pub const HOT_DISTANCE: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    AwaitingGuess,
    Won,
    Lost,
    StreakCompleted,
    AlreadyPlayedToday,
}

impl RoundPhase {
    pub fn is_over(&self) -> bool {
        *self != RoundPhase::AwaitingGuess
    }
}

/// Progress through a streak run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakState {
    pub current_streak: u32,
    pub range_ceiling: i64,
    pub attempts: u32,
}

impl Default for StreakState {
    fn default() -> Self {
        Self {
            current_streak: 0,
            range_ceiling: STREAK_START_MAX,
            attempts: STREAK_START_ATTEMPTS,
        }
    }
}

impl StreakState {
    /// State after one more win; `None` once the run is complete
    pub fn advanced(&self) -> Option<StreakState> {
        let current_streak = self.current_streak + 1;
        if current_streak >= STREAK_ROUNDS {
            return None;
        }
        Some(StreakState {
            current_streak,
            range_ceiling: self.range_ceiling + STREAK_RANGE_STEP,
            attempts: self.attempts.saturating_sub(1).max(1),
        })
    }
}

/// Hot within 5, cold at 30% of the range or more, neutral otherwise.
/// Reverse mode swaps hot and cold.
pub fn classify(guess: i64, target: i64, min: i64, max: i64, reverse: bool) -> Classification {
    let distance = (guess - target).abs();
    if distance == 0 {
        return Classification::Correct;
    }
    let cold_distance = (max - min) * 3 / 10;
    let classification = if distance <= HOT_DISTANCE {
        Classification::Hot
    } else if distance >= cold_distance {
        Classification::Cold
    } else {
        Classification::Neutral
    };
    if reverse {
        classification.reversed()
    } else {
        classification
    }
}

pub fn direction(guess: i64, target: i64, min: i64, max: i64) -> Option<Direction> {
    if guess < target && guess < max {
        Some(Direction::Higher)
    } else if guess > target && guess > min {
        Some(Direction::Lower)
    } else {
        None
    }
}

/// The round in play. Fields are read-only outside this module; every change
/// goes through a method that keeps the invariants.
#[readonly::make]
#[derive(Debug, Clone)]
pub struct RoundState {
    pub round_id: Uuid,
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub min_range: i64,
    pub max_range: i64,
    /// Bounds a double chaos reroll stays within
    pub envelope: (i64, i64),
    pub target: i64,
    pub max_attempts: Option<u32>,
    pub attempts_left: Option<u32>,
    pub guesses_made: u32,
    pub used_help: bool,
    pub help_range: Option<(i64, i64)>,
    pub guess_history: Vec<GuessRecord>,
    pub timer: TimerState,
    pub blitz_started: bool,
    pub phase: RoundPhase,
    pub bot: Option<BotState>,
    pub streak: Option<StreakState>,
}

impl RoundState {
    pub fn new(
        mode: GameMode,
        difficulty: Difficulty,
        settings: RangeSettings,
        target: i64,
        now: SystemTime,
    ) -> Self {
        let bot = mode
            .is_bot_mode()
            .then(|| BotState::new(mode, difficulty, settings.min_range, settings.max_range));
        let streak = (mode == GameMode::Streak).then(StreakState::default);
        Self {
            round_id: Uuid::new_v4(),
            mode,
            difficulty,
            min_range: settings.min_range,
            max_range: settings.max_range,
            envelope: settings.envelope(),
            target,
            max_attempts: settings.max_attempts,
            attempts_left: settings.max_attempts,
            guesses_made: 0,
            used_help: false,
            help_range: None,
            guess_history: Vec::new(),
            timer: TimerState::started_at(now),
            blitz_started: false,
            phase: RoundPhase::AwaitingGuess,
            bot,
            streak,
        }
    }

    /// Next round of a streak run, with the range and budget the run has reached
    pub fn streak_round(
        difficulty: Difficulty,
        streak: StreakState,
        target: i64,
        now: SystemTime,
    ) -> Self {
        let settings = RangeSettings {
            min_range: 1,
            max_range: streak.range_ceiling,
            max_attempts: Some(streak.attempts),
        };
        let mut round = RoundState::new(GameMode::Streak, difficulty, settings, target, now);
        round.streak = Some(streak);
        round
    }

    /// Terminal round shown when today's daily challenge was already played
    pub fn already_played(
        difficulty: Difficulty,
        settings: RangeSettings,
        result: &DailyResult,
        now: SystemTime,
    ) -> Self {
        let mut round = RoundState::new(GameMode::Daily, difficulty, settings, result.number, now);
        round.phase = RoundPhase::AlreadyPlayedToday;
        round.attempts_left = Some(0);
        round.timer = round.timer.ended(now);
        round
    }

    pub fn is_active(&self) -> bool {
        self.phase == RoundPhase::AwaitingGuess
    }

    pub fn attempts_exhausted(&self) -> bool {
        self.attempts_left == Some(0)
    }

    pub fn range_width(&self) -> i64 {
        self.max_range - self.min_range + 1
    }

    pub fn turn(&self) -> Turn {
        self.bot.as_ref().map_or(Turn::Player, |bot| bot.turn)
    }

    pub fn elapsed_seconds(&self, now: SystemTime) -> u64 {
        self.timer.elapsed_seconds(now)
    }

    pub fn check_can_guess(&self) -> Result<(), GuessError> {
        if !self.is_active() {
            return Err(GuessError::RoundOver);
        }
        if self.attempts_exhausted() {
            return Err(GuessError::NoAttemptsLeft);
        }
        if self.turn() != Turn::Player {
            return Err(GuessError::NotYourTurn);
        }
        Ok(())
    }

    /// Parses trimmed input as an integer inside the current range
    pub fn parse_guess(&self, raw: &str) -> Result<i64, GuessError> {
        let invalid = GuessError::InvalidInput {
            min: self.min_range,
            max: self.max_range,
        };
        let value: i64 = raw.trim().parse().map_err(|_| invalid.clone())?;
        if value < self.min_range || value > self.max_range {
            return Err(invalid);
        }
        Ok(value)
    }

    pub fn classify(&self, guess: i64) -> Classification {
        classify(
            guess,
            self.target,
            self.min_range,
            self.max_range,
            self.mode == GameMode::Reverse,
        )
    }

    pub fn direction(&self, guess: i64) -> Option<Direction> {
        direction(guess, self.target, self.min_range, self.max_range)
    }

    pub fn mark_blitz_started(&mut self) {
        self.blitz_started = true;
    }

    /// Consumes one attempt for a valid player guess
    pub fn record_guess(&mut self, value: i64, classification: Classification) {
        if let Some(left) = self.attempts_left.as_mut() {
            *left = left.saturating_sub(1);
        }
        self.guesses_made += 1;
        self.guess_history.push(GuessRecord {
            value,
            classification,
        });
        trace!(
            target: "game_engine",
            "Guess {} -> {:?}, attempts left {:?}",
            value,
            classification,
            self.attempts_left
        );
    }

    /// Cold guesses immediately before the latest guess
    pub fn cold_run_before_last(&self) -> u32 {
        self.guess_history
            .iter()
            .rev()
            .skip(1)
            .take_while(|g| g.classification == Classification::Cold)
            .count() as u32
    }

    pub fn settle(&mut self, phase: RoundPhase, now: SystemTime) {
        self.phase = phase;
        self.timer = self.timer.ended(now);
        if let Some(bot) = self.bot.as_mut() {
            bot.turn = Turn::Player;
        }
    }

    pub fn set_turn(&mut self, turn: Turn) {
        if let Some(bot) = self.bot.as_mut() {
            bot.turn = turn;
        }
    }

    pub fn bot(&self) -> Option<&BotState> {
        self.bot.as_ref()
    }

    pub fn bot_mut(&mut self) -> Option<&mut BotState> {
        self.bot.as_mut()
    }

    /// Chaos: a new number inside the current range
    pub fn reroll_target(&mut self, target: i64) {
        self.target = target;
    }

    /// Double chaos: new range and number. History is cleared, attempts are not restored.
    pub fn reroll_range(&mut self, min_range: i64, max_range: i64, target: i64) {
        self.min_range = min_range;
        self.max_range = max_range;
        self.target = target;
        self.guess_history.clear();
        self.help_range = None;
    }

    /// Reveals a window of ±20% of the range around the target, once per round
    pub fn use_help(&mut self) -> Result<(i64, i64), HelpError> {
        if !self.is_active() {
            return Err(HelpError::RoundOver);
        }
        if self.used_help {
            return Err(HelpError::AlreadyUsed);
        }
        let delta = (self.max_range - self.min_range) / 5;
        let window = (
            self.min_range.max(self.target - delta),
            self.max_range.min(self.target + delta),
        );
        self.used_help = true;
        self.help_range = Some(window);
        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(5_000)
    }

    fn classic(target: i64) -> RoundState {
        RoundState::new(
            GameMode::Classic,
            Difficulty::Easy,
            RangeSettings::for_mode(GameMode::Classic, Difficulty::Easy),
            target,
            now(),
        )
    }

    #[test]
    fn test_classification_thresholds() {
        // range 99, cold at 29 or more
        assert_eq!(classify(10, 42, 1, 100, false), Classification::Cold);
        assert_eq!(classify(50, 42, 1, 100, false), Classification::Neutral);
        assert_eq!(classify(47, 42, 1, 100, false), Classification::Hot);
        assert_eq!(classify(13, 42, 1, 100, false), Classification::Cold);
        assert_eq!(classify(14, 42, 1, 100, false), Classification::Neutral);
        assert_eq!(classify(42, 42, 1, 100, false), Classification::Correct);
    }

    #[test]
    fn test_reverse_swaps_hot_and_cold() {
        assert_eq!(classify(10, 42, 1, 100, true), Classification::Hot);
        assert_eq!(classify(44, 42, 1, 100, true), Classification::Cold);
        assert_eq!(classify(50, 42, 1, 100, true), Classification::Neutral);
    }

    #[test]
    fn test_direction_at_bounds() {
        assert_eq!(direction(10, 42, 1, 100), Some(Direction::Higher));
        assert_eq!(direction(50, 42, 1, 100), Some(Direction::Lower));
        assert_eq!(direction(42, 42, 1, 100), None);
    }

    #[test]
    fn test_parse_guess() {
        let round = classic(42);
        assert_eq!(round.parse_guess(" 17 "), Ok(17));
        let invalid = Err(GuessError::InvalidInput { min: 1, max: 100 });
        assert_eq!(round.parse_guess("abc"), invalid);
        assert_eq!(round.parse_guess("0"), invalid);
        assert_eq!(round.parse_guess("101"), invalid);
        assert_eq!(round.parse_guess("4.5"), invalid);
    }

    #[test]
    fn test_attempts_never_underflow() {
        let mut round = RoundState::new(
            GameMode::Sudden,
            Difficulty::Easy,
            RangeSettings::for_mode(GameMode::Sudden, Difficulty::Easy),
            42,
            now(),
        );
        round.record_guess(10, Classification::Cold);
        assert_eq!(round.attempts_left, Some(0));
        assert_eq!(round.check_can_guess(), Err(GuessError::NoAttemptsLeft));
        round.record_guess(11, Classification::Cold);
        assert_eq!(round.attempts_left, Some(0));
    }

    #[test]
    fn test_unbounded_modes_count_guesses() {
        let mut round = RoundState::new(
            GameMode::Practice,
            Difficulty::Hard,
            RangeSettings::for_mode(GameMode::Practice, Difficulty::Hard),
            42,
            now(),
        );
        for guess in 1..=20 {
            round.record_guess(guess, Classification::Cold);
        }
        assert_eq!(round.attempts_left, None);
        assert_eq!(round.guesses_made, 20);
        assert!(round.check_can_guess().is_ok());
    }

    #[test]
    fn test_cold_run() {
        let mut round = classic(42);
        for guess in [90, 95, 99] {
            round.record_guess(guess, Classification::Cold);
        }
        round.record_guess(42, Classification::Correct);
        assert_eq!(round.cold_run_before_last(), 3);
    }

    #[test]
    fn test_help_once_and_clamped() {
        let mut round = classic(5);
        // delta floor(99 * 0.2) = 19
        assert_eq!(round.use_help(), Ok((1, 24)));
        assert_eq!(round.use_help(), Err(HelpError::AlreadyUsed));
        round.settle(RoundPhase::Won, now());
        assert_eq!(round.use_help(), Err(HelpError::RoundOver));
    }

    #[test]
    fn test_settled_round_rejects_guesses() {
        let mut round = classic(42);
        round.settle(RoundPhase::Lost, now());
        assert_eq!(round.check_can_guess(), Err(GuessError::RoundOver));
        assert!(round.timer.is_ended());
    }

    #[test]
    fn test_bot_turn_blocks_player() {
        let mut round = RoundState::new(
            GameMode::Bot,
            Difficulty::Easy,
            RangeSettings::for_mode(GameMode::Bot, Difficulty::Easy),
            42,
            now(),
        );
        round.set_turn(Turn::Bot);
        assert_eq!(round.check_can_guess(), Err(GuessError::NotYourTurn));
    }

    #[test]
    fn test_streak_progression() {
        let mut streak = StreakState::default();
        let mut rounds = 1;
        while let Some(next) = streak.advanced() {
            streak = next;
            rounds += 1;
        }
        assert_eq!(rounds, STREAK_ROUNDS);
        assert_eq!(streak.current_streak, 11);
        assert_eq!(streak.range_ceiling, 650);
        assert_eq!(streak.attempts, 1);
    }

    #[test]
    fn test_double_chaos_reroll_clears_history() {
        let mut round = RoundState::new(
            GameMode::DoubleChaos,
            Difficulty::Easy,
            RangeSettings::for_mode(GameMode::DoubleChaos, Difficulty::Easy),
            42,
            now(),
        );
        round.record_guess(10, Classification::Cold);
        round.reroll_range(30, 80, 55);
        assert!(round.guess_history.is_empty());
        assert_eq!(round.attempts_left, Some(11));
        assert_eq!(round.envelope, (1, 200));
        assert_eq!((round.min_range, round.max_range, round.target), (30, 80, 55));
    }
}
