use log::{debug, info, trace, warn};
use std::cell::RefCell;
use std::rc::Rc;

use super::achievements::{AchievementContext, AchievementEngine};
use super::bot_opponent::Turn;
use super::clock::{Clock, ScheduledEvent, TimerKind};
use super::easter_eggs::{EasterEggTracker, GuessObservation};
use super::math_hint::math_hint;
use super::number_generator::NumberGenerator;
use super::round::{RoundPhase, RoundState};
use super::scoring::calculate_score;
use super::settings::Settings;
use super::stats_manager::{SettledRound, StatsManager};
use super::storage::Storage;
use super::timer_coordinator::TimerCoordinator;
use crate::destroyable::Destroyable;
use crate::error::{GuessError, HelpError, StorageError};
use crate::events::{EventEmitter, EventObserver, Unsubscriber};
use crate::model::{
    Achievement, Classification, DailyResult, Difficulty, EasterEgg, FeedbackKind,
    GameEngineCommand, GameEngineEvent, GameMode, GuessFeedback, LossReason, LossSummary,
    PersistentStats, RangeSettings, RankingProgress, RoundOutcome, TimerRegimeKind, WinSummary,
    STREAK_ROUNDS,
};

/// What a valid guess produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    Feedback(GuessFeedback),
    Settled(RoundOutcome),
}

pub struct GameEngine {
    round: Option<RoundState>,
    timers: TimerCoordinator,
    generator: NumberGenerator,
    stats: StatsManager,
    achievements: AchievementEngine,
    easter_eggs: EasterEggTracker,
    settings: Settings,
    debug_mode: bool,
    subscription_id: Option<Unsubscriber<GameEngineCommand>>,
    game_engine_event_emitter: EventEmitter<GameEngineEvent>,
}

impl Destroyable for GameEngine {
    fn destroy(&mut self) {
        self.timers.cancel_all();
        if let Some(subscription_id) = self.subscription_id.take() {
            subscription_id.unsubscribe();
        }
    }
}

impl GameEngine {
    pub fn new(
        game_engine_command_observer: EventObserver<GameEngineCommand>,
        game_engine_event_emitter: EventEmitter<GameEngineEvent>,
        clock: Rc<dyn Clock>,
        storage: Rc<dyn Storage>,
        seed: Option<u64>,
    ) -> Rc<RefCell<Self>> {
        let settings = Settings::load(storage.as_ref());
        let game_engine = Self {
            round: None,
            timers: TimerCoordinator::new(clock),
            generator: NumberGenerator::new(seed),
            stats: StatsManager::load(storage.clone()),
            achievements: AchievementEngine::load(storage.clone()),
            easter_eggs: EasterEggTracker::load(storage),
            settings,
            debug_mode: Settings::is_debug_mode(),
            subscription_id: None,
            game_engine_event_emitter,
        };
        let refcell = Rc::new(RefCell::new(game_engine));
        GameEngine::wire_subscription(refcell.clone(), game_engine_command_observer);
        refcell
    }

    fn wire_subscription(
        game_engine: Rc<RefCell<Self>>,
        game_engine_command_observer: EventObserver<GameEngineCommand>,
    ) {
        let game_engine_handler = game_engine.clone();
        let subscription_id = game_engine_command_observer.subscribe(move |command| {
            let mut game_engine = game_engine_handler.borrow_mut();
            game_engine.handle_command(command.clone());
        });
        game_engine.borrow_mut().subscription_id = Some(subscription_id);
    }

    fn handle_command(&mut self, command: GameEngineCommand) {
        trace!(target: "game_engine", "Handling command: {:?}", command);
        match command {
            GameEngineCommand::NewGame(mode, difficulty) => self.start_new_game(mode, difficulty),
            GameEngineCommand::Restart => self.restart(),
            GameEngineCommand::SubmitGuess(raw) => {
                if let Err(e) = self.submit_guess(&raw) {
                    debug!(target: "game_engine", "Guess {:?} rejected: {}", raw, e);
                }
            }
            GameEngineCommand::UseHelp => {
                if let Err(e) = self.use_help() {
                    debug!(target: "game_engine", "Help rejected: {}", e);
                }
            }
            GameEngineCommand::TimersDue => self.run_due_timers(),
            GameEngineCommand::ResetStats => self.reset_stats(),
            GameEngineCommand::ResetAchievements => self.reset_achievements(),
        }
    }

    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    pub fn stats(&self) -> &PersistentStats {
        self.stats.stats()
    }

    pub fn ranking_progress(&self) -> RankingProgress {
        self.stats.stats().ranking.progress()
    }

    pub fn achievements(&self) -> &AchievementEngine {
        &self.achievements
    }

    pub fn easter_eggs(&self) -> &EasterEggTracker {
        &self.easter_eggs
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn seed(&self) -> u64 {
        self.generator.seed()
    }

    /// Countdown shown for chaos, double chaos and a running blitz
    pub fn seconds_remaining(&self) -> Option<u64> {
        self.timers.seconds_remaining()
    }

    fn clock(&self) -> &Rc<dyn Clock> {
        self.timers.clock()
    }

    fn emit(&self, event: GameEngineEvent) {
        self.game_engine_event_emitter.emit(event);
    }

    fn emit_feedback(&self, message: impl Into<String>, kind: FeedbackKind) {
        self.emit(GameEngineEvent::Feedback {
            message: message.into(),
            kind,
        });
    }

    fn report_storage_error(&self, action: &str, error: StorageError) {
        warn!(target: "storage", "Could not {}: {}", action, error);
        self.emit_feedback(
            format!("Progress could not be saved: {}", error),
            FeedbackKind::Warning,
        );
    }

    fn report_storage_read_error(&self, action: &str, error: StorageError) {
        warn!(target: "storage", "Could not {}: {}", action, error);
        self.emit_feedback(
            format!("Saved progress could not be read: {}", error),
            FeedbackKind::Warning,
        );
    }

    /// Writes stats and achievements back to storage
    fn flush(&self) {
        if let Err(e) = self.stats.save() {
            self.report_storage_error("save stats", e);
        }
        if let Err(e) = self.achievements.persist() {
            self.report_storage_error("save achievements", e);
        }
        if let Err(e) = self.easter_eggs.persist() {
            self.report_storage_error("save discoveries", e);
        }
    }

    pub fn start_new_game(&mut self, mode: GameMode, difficulty: Difficulty) {
        self.timers.cancel_all();
        let now = self.clock().now();
        let settings = RangeSettings::for_mode(mode, difficulty);

        let target = if mode == GameMode::Daily {
            let today = self.clock().today();
            match self.stats.daily_result(today) {
                Ok(Some(result)) => {
                    info!(target: "game_engine", "Daily challenge for {} already played", today);
                    self.achievements.begin_round();
                    let round = RoundState::already_played(difficulty, settings, &result, now);
                    self.emit(GameEngineEvent::RoundStarted(round.clone()));
                    self.emit_feedback(
                        format!(
                            "You already played today's challenge! The number was {}",
                            result.number
                        ),
                        FeedbackKind::Info,
                    );
                    self.emit(GameEngineEvent::DailyAlreadyPlayed(result));
                    self.round = Some(round);
                    return;
                }
                Ok(None) => {}
                Err(e) => self.report_storage_read_error("read today's daily result", e),
            }
            NumberGenerator::daily(today, settings.min_range, settings.max_range)
        } else {
            self.generator.in_range(settings.min_range, settings.max_range)
        };

        self.begin_round(RoundState::new(mode, difficulty, settings, target, now));
    }

    /// Starts another round with the current mode and difficulty, or the
    /// configured defaults when nothing has been played yet
    pub fn restart(&mut self) {
        let (mode, difficulty) = match &self.round {
            Some(round) => (round.mode, round.difficulty),
            None => (
                self.settings.default_mode,
                self.settings.default_difficulty,
            ),
        };
        self.start_new_game(mode, difficulty);
    }

    fn begin_round(&mut self, round: RoundState) {
        self.achievements.begin_round();
        self.easter_eggs.begin_round();
        info!(
            target: "game_engine",
            "New round {}: {} on {}, range {}-{}, attempts {:?}",
            round.round_id,
            round.mode,
            round.difficulty,
            round.min_range,
            round.max_range,
            round.max_attempts
        );
        if self.debug_mode {
            info!(target: "game_engine", "Target is {} (seed {})", round.target, self.seed());
        }

        // blitz waits for the first submission
        let regime = round.mode.timer_regime();
        if regime != TimerRegimeKind::None && regime != TimerRegimeKind::Blitz {
            self.timers.start_regime(regime, round.round_id);
        }

        self.emit(GameEngineEvent::RoundStarted(round.clone()));
        self.emit_feedback(round.mode.explanation(), FeedbackKind::Info);
        self.round = Some(round);
    }

    fn continue_streak(&mut self) {
        let Some(round) = &self.round else {
            return;
        };
        let Some(next) = round.streak.and_then(|streak| streak.advanced()) else {
            return;
        };
        let difficulty = round.difficulty;
        let now = self.clock().now();
        let target = self.generator.in_range(1, next.range_ceiling);
        self.begin_round(RoundState::streak_round(difficulty, next, target, now));
    }

    pub fn submit_guess(&mut self, raw: &str) -> Result<GuessOutcome, GuessError> {
        let Some(mut round) = self.round.take() else {
            self.emit_feedback(GuessError::NoActiveRound.to_string(), FeedbackKind::Error);
            return Err(GuessError::NoActiveRound);
        };
        let result = self.apply_guess(&mut round, raw);
        self.round = Some(round);

        match &result {
            Ok(GuessOutcome::Settled(RoundOutcome::StreakAdvanced { .. })) => {
                self.flush();
                self.continue_streak();
            }
            Ok(_) => self.flush(),
            Err(e) => self.emit_feedback(e.to_string(), FeedbackKind::Error),
        }
        result
    }

    fn apply_guess(&mut self, round: &mut RoundState, raw: &str) -> Result<GuessOutcome, GuessError> {
        round.check_can_guess()?;

        if round.mode.timer_regime() == TimerRegimeKind::Blitz && !round.blitz_started {
            round.mark_blitz_started();
            self.timers
                .start_regime(TimerRegimeKind::Blitz, round.round_id);
        }

        let value = round.parse_guess(raw)?;
        let classification = round.classify(value);
        round.record_guess(value, classification);
        self.stats.record_attempt();

        let discovery = self.easter_eggs.observe(&GuessObservation {
            guess: value,
            target: round.target,
            min_range: round.min_range,
            max_range: round.max_range,
            won: classification == Classification::Correct,
            attempt: round.guesses_made,
            used_help: round.used_help,
            first_game: self.stats.stats().games_played == 0,
            at: self.clock().now(),
        });
        let outcome = self.resolve_guess(round, value, classification);
        if let Some(egg) = discovery {
            self.announce_discovery(egg);
        }
        Ok(outcome)
    }

    fn resolve_guess(
        &mut self,
        round: &mut RoundState,
        value: i64,
        classification: Classification,
    ) -> GuessOutcome {
        if classification == Classification::Correct {
            return GuessOutcome::Settled(self.settle_win(round));
        }

        let math_hint = (round.mode == GameMode::Math && classification == Classification::Neutral)
            .then(|| {
                math_hint(
                    round.target,
                    round.min_range,
                    round.max_range,
                    &mut self.generator,
                )
            });
        let feedback = GuessFeedback {
            guess: value,
            classification,
            direction: round.direction(value),
            math_hint,
        };
        self.emit_feedback(feedback.message(), FeedbackKind::Hint);

        if round.attempts_exhausted() {
            return GuessOutcome::Settled(self.settle_loss(round, LossReason::OutOfAttempts));
        }

        if round.mode.is_bot_mode() {
            round.set_turn(Turn::Bot);
            self.timers.schedule_bot_turn(round.round_id);
        }
        GuessOutcome::Feedback(feedback)
    }

    fn announce_discovery(&self, egg: EasterEgg) {
        self.emit(GameEngineEvent::EasterEggDiscovered(egg));
        self.emit_feedback(format!("New discovery! {}", egg), FeedbackKind::Info);
    }

    pub fn use_help(&mut self) -> Result<(i64, i64), HelpError> {
        let result = match self.round.as_mut() {
            Some(round) => round.use_help(),
            None => Err(HelpError::NoActiveRound),
        };
        match result {
            Ok((lower, upper)) => {
                self.stats.record_help();
                info!(target: "game_engine", "Help used: {}-{}", lower, upper);
                self.emit(GameEngineEvent::HelpRevealed { lower, upper });
                self.emit_feedback(
                    format!("The number is between {} and {}", lower, upper),
                    FeedbackKind::Hint,
                );
                self.flush();
            }
            Err(ref e) => self.emit_feedback(e.to_string(), FeedbackKind::Error),
        }
        result
    }

    fn settle_win(&mut self, round: &mut RoundState) -> RoundOutcome {
        self.timers.cancel_all();
        let now = self.clock().now();
        let today = self.clock().today();

        let win_time = round.elapsed_seconds(now);
        let num_guesses = round.guesses_made;
        let score = calculate_score(num_guesses, win_time, round.used_help, round.difficulty);
        let previous_best_score = self.stats.stats().best_score;
        let cold_run = round.cold_run_before_last();

        let summary = WinSummary {
            mode: round.mode,
            difficulty: round.difficulty,
            target: round.target,
            num_guesses,
            win_time,
            score,
            used_help: round.used_help,
        };
        let (phase, outcome, streak, streak_completed) = match round.streak {
            Some(streak) => match streak.advanced() {
                Some(next) => (
                    RoundPhase::Won,
                    RoundOutcome::StreakAdvanced {
                        summary,
                        streak: next.current_streak,
                        max_range: next.range_ceiling,
                        attempts_left: next.attempts,
                    },
                    next.current_streak,
                    false,
                ),
                None => (
                    RoundPhase::StreakCompleted,
                    RoundOutcome::StreakCompleted(summary),
                    STREAK_ROUNDS,
                    true,
                ),
            },
            None => (RoundPhase::Won, RoundOutcome::Won(summary), 0, false),
        };
        // a streak run settles as one game, when it completes or is lost
        let run_continues = matches!(outcome, RoundOutcome::StreakAdvanced { .. });
        if round.streak.is_some() {
            self.stats.record_streak_round(true, streak, streak_completed);
        }
        if !run_continues {
            self.stats.record_round(
                &SettledRound {
                    mode: round.mode,
                    difficulty: round.difficulty,
                    won: true,
                    num_guesses,
                    max_attempts: round.max_attempts,
                    time: win_time,
                    score,
                    used_help: round.used_help,
                },
                today,
            );
        }
        round.settle(phase, now);
        info!(
            target: "game_engine",
            "Round {} won in {} guesses, {}s, score {}",
            round.round_id,
            num_guesses,
            win_time,
            score
        );

        if round.mode == GameMode::Daily {
            self.save_daily(round, true, win_time);
        }

        let stats = self.stats.stats();
        let context = AchievementContext {
            won: true,
            mode: round.mode,
            difficulty: round.difficulty,
            num_guesses,
            max_attempts: round.max_attempts,
            attempts_left: round.attempts_left,
            win_time,
            used_help: round.used_help,
            score,
            previous_best_score,
            range_width: round.range_width(),
            cold_run,
            streak,
            streak_completed,
            games_won: stats.games_won,
            lifetime_hints: stats.hints_used,
            perfect_games: stats.perfect_games,
            distinct_modes_won: stats.distinct_modes_won(),
            math_wins: stats.wins_in(GameMode::Math),
            days_won: stats.daily_stats.days_won,
            daily_streak: stats.daily_stats.current_streak,
        };
        if run_continues {
            self.achievements.evaluate_one(Achievement::StreakMaster, &context);
        } else {
            self.achievements.evaluate_all(&context);
        }

        self.announce_settlement(round, &outcome);
        outcome
    }

    fn settle_loss(&mut self, round: &mut RoundState, reason: LossReason) -> RoundOutcome {
        self.timers.cancel_all();
        let now = self.clock().now();
        let today = self.clock().today();
        let time = round.elapsed_seconds(now);

        self.stats.record_round(
            &SettledRound {
                mode: round.mode,
                difficulty: round.difficulty,
                won: false,
                num_guesses: round.guesses_made,
                max_attempts: round.max_attempts,
                time,
                score: 0,
                used_help: round.used_help,
            },
            today,
        );
        let streak = round.streak.map(|streak| streak.current_streak);
        if let Some(reached) = streak {
            self.stats.record_streak_round(false, reached, false);
        }
        round.settle(RoundPhase::Lost, now);
        info!(
            target: "game_engine",
            "Round {} lost ({:?}), the number was {}",
            round.round_id,
            reason,
            round.target
        );

        if round.mode == GameMode::Daily {
            self.save_daily(round, false, time);
        }

        let outcome = RoundOutcome::Lost(LossSummary {
            mode: round.mode,
            difficulty: round.difficulty,
            target: round.target,
            reason,
            num_guesses: round.guesses_made,
            time,
            streak,
        });
        self.announce_settlement(round, &outcome);
        outcome
    }

    fn save_daily(&self, round: &RoundState, win: bool, seconds: u64) {
        let result = DailyResult {
            win,
            attempts: round.guesses_made,
            number: round.target,
            time: Some(std::time::Duration::from_secs(seconds)),
        };
        let today = self.clock().today();
        if let Err(e) = self.stats.save_daily_result(today, &result) {
            self.report_storage_error("save the daily result", e);
        }
    }

    fn announce_settlement(&mut self, round: &RoundState, outcome: &RoundOutcome) {
        let kind = if outcome.is_win() {
            FeedbackKind::Success
        } else {
            FeedbackKind::Error
        };
        self.emit(GameEngineEvent::RoundSettled(outcome.clone()));
        self.emit_feedback(outcome.message(), kind);

        for (achievement, tier) in self.achievements.take_notifications() {
            self.emit(GameEngineEvent::AchievementUnlocked { achievement, tier });
        }
        self.emit(GameEngineEvent::StatsUpdated(self.stats.stats().clone()));

        let continues = matches!(outcome, RoundOutcome::StreakAdvanced { .. });
        if self.settings.auto_next_round && !continues && round.mode != GameMode::Daily {
            self.timers.schedule_next_round(round.round_id);
        }
    }

    /// Delivers every timer event that has come due
    pub fn run_due_timers(&mut self) {
        let mut handled = 0;
        while let Some(event) = self.timers.pop_due() {
            self.handle_timer(event);
            handled += 1;
        }
        if handled > 0 {
            self.flush();
        }
    }

    /// Handles one timer event. Events for a round that is no longer current
    /// are dropped.
    pub fn handle_timer(&mut self, event: ScheduledEvent) {
        let Some(mut round) = self.round.take() else {
            trace!(target: "timers", "No round, dropping {:?}", event.kind);
            return;
        };
        if round.round_id != event.round_id {
            trace!(target: "timers", "Stale {:?} for round {}", event.kind, event.round_id);
            self.round = Some(round);
            return;
        }

        let mut start_next = false;
        match event.kind {
            TimerKind::CountdownTick => {
                if round.is_active() {
                    let seconds = self.timers.seconds_remaining().unwrap_or(0);
                    self.emit(GameEngineEvent::TimerTick(seconds));
                }
            }
            TimerKind::ChaosReroll => {
                if round.is_active() {
                    let target = self.generator.in_range(round.min_range, round.max_range);
                    round.reroll_target(target);
                    self.timers.restart_cycle(round.round_id);
                    debug!(target: "game_engine", "Chaos reroll");
                    if self.debug_mode {
                        info!(target: "game_engine", "Target is now {}", target);
                    }
                    self.emit_feedback("The number has changed!", FeedbackKind::Warning);
                }
            }
            TimerKind::ChaosExpired => {
                if round.is_active() {
                    self.settle_loss(&mut round, LossReason::NumberExpired);
                }
            }
            TimerKind::DoubleChaosReroll => {
                if round.is_active() {
                    let (envelope_min, envelope_max) = round.envelope;
                    let (min_range, max_range) = self.generator.sub_range(envelope_min, envelope_max);
                    let target = self.generator.in_range(min_range, max_range);
                    round.reroll_range(min_range, max_range, target);
                    self.timers.restart_cycle(round.round_id);
                    debug!(
                        target: "game_engine",
                        "Double chaos reroll: {}-{}",
                        min_range,
                        max_range
                    );
                    self.emit(GameEngineEvent::RangeChanged {
                        min_range,
                        max_range,
                    });
                    self.emit_feedback(
                        format!(
                            "Range and number changed! New range: {}-{}",
                            min_range, max_range
                        ),
                        FeedbackKind::Warning,
                    );
                }
            }
            TimerKind::BlitzExpired => {
                if round.is_active() {
                    self.settle_loss(&mut round, LossReason::TimeUp);
                }
            }
            TimerKind::BotTurn => self.take_bot_turn(&mut round),
            TimerKind::NextRound => start_next = round.phase.is_over(),
        }

        let (mode, difficulty) = (round.mode, round.difficulty);
        self.round = Some(round);
        if start_next {
            self.start_new_game(mode, difficulty);
        }
    }

    fn take_bot_turn(&mut self, round: &mut RoundState) {
        if !round.is_active() || round.turn() != Turn::Bot {
            return;
        }
        let choice = match round.bot() {
            Some(bot) => bot.choose_guess(
                &round.guess_history,
                round.min_range,
                round.max_range,
                &mut self.generator,
            ),
            None => return,
        };
        let Some(guess) = choice else {
            round.set_turn(Turn::Player);
            self.emit_feedback("The bot has nothing left to guess. Your turn!", FeedbackKind::Info);
            return;
        };

        let classification = round.classify(guess);
        let direction = round.direction(guess);
        if let Some(bot) = round.bot_mut() {
            bot.record(guess, direction);
        }
        let message = if classification == Classification::Correct {
            format!("Bot guessed {}. Correct!", guess)
        } else {
            let feedback = GuessFeedback {
                guess,
                classification,
                direction,
                math_hint: None,
            };
            format!("Bot guessed {}. {}", guess, feedback.message())
        };
        debug!(target: "bot", "{}", message);
        self.emit(GameEngineEvent::BotGuessed {
            guess,
            classification,
            message,
        });

        if classification == Classification::Correct {
            self.settle_loss(round, LossReason::BotWon);
        } else {
            round.set_turn(Turn::Player);
        }
    }

    pub fn reset_stats(&mut self) {
        if let Err(e) = self.stats.reset() {
            self.report_storage_error("reset stats", e);
        }
        self.emit(GameEngineEvent::StatsUpdated(self.stats.stats().clone()));
        self.emit_feedback("Statistics reset", FeedbackKind::Info);
    }

    pub fn reset_achievements(&mut self) {
        if let Err(e) = self.achievements.reset() {
            self.report_storage_error("reset achievements", e);
        }
        self.emit_feedback("Achievements reset", FeedbackKind::Info);
    }

    #[cfg(test)]
    pub(crate) fn force_target(&mut self, target: i64) {
        if let Some(round) = self.round.as_mut() {
            round.reroll_target(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use test_context::test_context;

    use super::*;
    use crate::game::storage::EASTER_EGGS_KEY;
    use crate::game::tests::EngineHarness;
    use crate::model::{Direction, Tier};
    use crate::tests::UsingLogger;

    fn expect_feedback(result: Result<GuessOutcome, GuessError>) -> GuessFeedback {
        match result {
            Ok(GuessOutcome::Feedback(feedback)) => feedback,
            other => panic!("expected feedback, got {:?}", other),
        }
    }

    fn expect_win(result: Result<GuessOutcome, GuessError>) -> WinSummary {
        match result {
            Ok(GuessOutcome::Settled(RoundOutcome::Won(summary))) => summary,
            other => panic!("expected a win, got {:?}", other),
        }
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_classic_scenario(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Classic, Difficulty::Easy);
        harness.engine.borrow_mut().force_target(42);

        let first = expect_feedback(harness.guess("10"));
        assert_eq!(first.classification, Classification::Cold);
        assert_eq!(first.direction, Some(Direction::Higher));

        let second = expect_feedback(harness.guess("50"));
        assert_eq!(second.classification, Classification::Neutral);
        assert_eq!(second.message(), "Try lower!");

        let summary = expect_win(harness.guess("42"));
        assert_eq!(summary.num_guesses, 3);
        assert_eq!(summary.score, 900);

        let round = harness.round();
        assert_eq!(round.phase, RoundPhase::Won);
        assert_eq!(round.attempts_left, Some(9));

        let engine = harness.engine.borrow();
        assert_eq!(engine.stats().games_won, 1);
        assert_eq!(engine.stats().total_attempts, 3);
        let achievements = engine.achievements();
        assert_eq!(achievements.held_tier(Achievement::FirstWin), Some(Tier::Bronze));
        assert_eq!(achievements.held_tier(Achievement::LightningFast), Some(Tier::Silver));
        assert_eq!(achievements.held_tier(Achievement::SpeedDemon), Some(Tier::Gold));
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_invalid_input_keeps_attempts(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Classic, Difficulty::Easy);

        assert_eq!(
            harness.guess("abc"),
            Err(GuessError::InvalidInput { min: 1, max: 100 })
        );
        assert_eq!(
            harness.guess("101"),
            Err(GuessError::InvalidInput { min: 1, max: 100 })
        );
        let round = harness.round();
        assert_eq!(round.attempts_left, Some(12));
        assert_eq!(round.guesses_made, 0);
        assert!(harness.feedback(FeedbackKind::Error).iter().any(|m| m.contains("between 1 and 100")));
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_sudden_death(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Sudden, Difficulty::Medium);
        harness.engine.borrow_mut().force_target(42);

        let outcome = harness.guess("10").unwrap();
        assert!(matches!(
            outcome,
            GuessOutcome::Settled(RoundOutcome::Lost(LossSummary {
                reason: LossReason::OutOfAttempts,
                ..
            }))
        ));
        assert_eq!(harness.round().attempts_left, Some(0));
        assert_eq!(harness.guess("42"), Err(GuessError::RoundOver));
        assert_eq!(harness.engine.borrow().stats().games_played, 1);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_attempts_invariant(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Classic, Difficulty::Chaos);
        harness.engine.borrow_mut().force_target(1000);
        for guess in 1..=8 {
            let _ = harness.guess(&guess.to_string());
            let round = harness.round();
            let left = round.attempts_left.unwrap();
            assert!(left <= round.max_attempts.unwrap());
        }
        let round = harness.round();
        assert_eq!(round.attempts_left, Some(0));
        assert_eq!(round.guesses_made, 5);
        assert_eq!(round.phase, RoundPhase::Lost);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_daily_is_deterministic_and_once_per_day(_: &mut UsingLogger) {
        let harness = EngineHarness::at_date("2024-01-01");
        harness.start(GameMode::Daily, Difficulty::Easy);
        assert_eq!(harness.round().target, 33);

        let outcome = harness.guess("33").unwrap();
        assert!(matches!(outcome, GuessOutcome::Settled(RoundOutcome::Won(_))));
        assert_eq!(harness.engine.borrow().stats().daily_stats.days_won, 1);

        harness.take_events();
        harness.start(GameMode::Daily, Difficulty::Easy);
        assert_eq!(harness.round().phase, RoundPhase::AlreadyPlayedToday);
        let already_played = harness.take_events().into_iter().find_map(|e| match e {
            GameEngineEvent::DailyAlreadyPlayed(result) => Some(result),
            _ => None,
        });
        let result = already_played.unwrap();
        assert!(result.win);
        assert_eq!((result.attempts, result.number), (1, 33));
        assert_eq!(harness.guess("33"), Err(GuessError::RoundOver));
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_blitz_starts_on_first_submission_and_times_out(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Blitz, Difficulty::Easy);
        harness.advance(40);
        assert!(harness.round().is_active());
        assert_eq!(harness.engine.borrow().seconds_remaining(), None);

        let _ = harness.guess("abc");
        assert!(harness.round().blitz_started);
        harness.advance(29);
        assert!(harness.round().is_active());
        assert_eq!(harness.engine.borrow().seconds_remaining(), Some(1));

        harness.advance(1);
        assert_eq!(harness.round().phase, RoundPhase::Lost);
        assert!(harness.settled().iter().any(|o| matches!(
            o,
            RoundOutcome::Lost(LossSummary {
                reason: LossReason::TimeUp,
                ..
            })
        )));
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_chaos_rerolls_without_losing(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Chaos, Difficulty::Easy);
        let round_id = harness.round().round_id;
        harness.take_events();

        harness.advance(45);
        let round = harness.round();
        assert_eq!(round.round_id, round_id);
        assert!(round.is_active());
        assert!((1..=100).contains(&round.target));
        let changes = harness
            .feedback(FeedbackKind::Warning)
            .into_iter()
            .filter(|m| m == "The number has changed!")
            .count();
        assert_eq!(changes, 3);
        let ticks = harness
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, GameEngineEvent::TimerTick(_)))
            .count();
        assert_eq!(ticks, 45);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_chaos_countdown_ticks(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Chaos, Difficulty::Easy);
        harness.take_events();
        harness.advance(3);
        let ticks: Vec<u64> = harness
            .take_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEngineEvent::TimerTick(seconds) => Some(seconds),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![14, 13, 12]);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_double_chaos_range_invariant(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::DoubleChaos, Difficulty::Medium);
        harness.engine.borrow_mut().force_target(400);
        let _ = harness.guess("1");
        let attempts_after_guess = harness.round().attempts_left;

        for _ in 0..10 {
            harness.advance(15);
            let round = harness.round();
            assert!(round.is_active());
            assert!(round.max_range - round.min_range >= 10);
            assert!(round.min_range >= 1);
            assert!(round.max_range <= 400);
            assert!((round.min_range..=round.max_range).contains(&round.target));
            assert!(round.guess_history.is_empty());
            assert_eq!(round.attempts_left, attempts_after_guess);
        }
        let ranges = harness
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, GameEngineEvent::RangeChanged { .. }))
            .count();
        assert_eq!(ranges, 10);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_bot_takes_turns_and_can_win(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::BreakTheBot, Difficulty::Chaos);
        harness.engine.borrow_mut().force_target(42);

        let mut bot_guesses = Vec::new();
        for guess in 1..=7 {
            harness.guess(&guess.to_string()).unwrap();
            if guess == 1 {
                assert_eq!(harness.guess("2"), Err(GuessError::NotYourTurn));
            }
            harness.advance(1);
            bot_guesses.extend(harness.take_events().into_iter().filter_map(|e| match e {
                GameEngineEvent::BotGuessed { guess, .. } => Some(guess),
                _ => None,
            }));
        }

        assert_eq!(bot_guesses, vec![50, 25, 37, 43, 40, 41, 42]);
        assert_eq!(harness.round().phase, RoundPhase::Lost);
        let engine = harness.engine.borrow();
        assert_eq!(engine.stats().games_played, 1);
        assert_eq!(engine.stats().games_won, 0);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_beating_the_bot(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Bot, Difficulty::Hard);
        harness.engine.borrow_mut().force_target(42);
        harness.guess("42").unwrap();
        let engine = harness.engine.borrow();
        assert_eq!(
            engine.achievements().held_tier(Achievement::BotBusterHard),
            Some(Tier::Gold)
        );
        assert_eq!(
            engine.achievements().held_tier(Achievement::LightningFast),
            Some(Tier::Gold)
        );
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_streak_continues_with_tighter_parameters(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Streak, Difficulty::Easy);
        let first_id = harness.round().round_id;
        harness.engine.borrow_mut().force_target(42);

        let outcome = harness.guess("42").unwrap();
        assert!(matches!(
            outcome,
            GuessOutcome::Settled(RoundOutcome::StreakAdvanced {
                streak: 1,
                max_range: 150,
                attempts_left: 11,
                ..
            })
        ));

        let round = harness.round();
        assert_ne!(round.round_id, first_id);
        assert!(round.is_active());
        assert_eq!((round.min_range, round.max_range), (1, 150));
        assert_eq!(round.attempts_left, Some(11));
        assert_eq!(round.streak.map(|s| s.current_streak), Some(1));

        let engine = harness.engine.borrow();
        assert_eq!(
            engine.achievements().held_tier(Achievement::StreakMaster),
            Some(Tier::Bronze)
        );
        assert_eq!(engine.stats().streak.best_streak, 1);
        // the run has not settled as a game yet
        assert_eq!(engine.stats().games_played, 0);
        assert_eq!(engine.stats().games_won, 0);
        assert!(!engine.achievements().is_unlocked(Achievement::FirstWin));
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_completed_streak_settles_as_one_game(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Streak, Difficulty::Easy);
        for won in 1..=STREAK_ROUNDS {
            harness.engine.borrow_mut().force_target(1);
            let outcome = harness.guess("1").unwrap();
            if won < STREAK_ROUNDS {
                assert!(matches!(
                    outcome,
                    GuessOutcome::Settled(RoundOutcome::StreakAdvanced { .. })
                ));
            } else {
                assert!(matches!(
                    outcome,
                    GuessOutcome::Settled(RoundOutcome::StreakCompleted(_))
                ));
            }
        }

        assert_eq!(harness.round().phase, RoundPhase::StreakCompleted);
        let engine = harness.engine.borrow();
        let stats = engine.stats();
        assert_eq!((stats.games_played, stats.games_won), (1, 1));
        assert_eq!(stats.streak.best_streak, 12);
        assert_eq!(stats.streak.completed_runs, 1);
        let achievements = engine.achievements();
        assert_eq!(
            achievements.held_tier(Achievement::StreakMaster),
            Some(Tier::Platinum)
        );
        assert_eq!(
            achievements.held_tier(Achievement::PerfectStreak),
            Some(Tier::Bronze)
        );
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_streak_loss_reports_length(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Streak, Difficulty::Easy);
        harness.engine.borrow_mut().force_target(42);
        harness.guess("42").unwrap();
        harness.engine.borrow_mut().force_target(150);
        for guess in 1..=11 {
            let _ = harness.guess(&guess.to_string());
        }
        let lost = harness.settled().into_iter().find_map(|o| match o {
            RoundOutcome::Lost(summary) => Some(summary),
            _ => None,
        });
        assert_eq!(lost.unwrap().streak, Some(1));
        let engine = harness.engine.borrow();
        assert_eq!(engine.stats().streak.games_played, 2);
        assert_eq!(engine.stats().games_played, 1);
        assert_eq!(engine.stats().games_won, 0);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_math_hint_on_neutral_feedback(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Math, Difficulty::Easy);
        harness.engine.borrow_mut().force_target(42);

        let neutral = expect_feedback(harness.guess("60"));
        assert_eq!(neutral.classification, Classification::Neutral);
        assert!(neutral.math_hint.is_some());

        let cold = expect_feedback(harness.guess("10"));
        assert_eq!(cold.classification, Classification::Cold);
        assert_eq!(cold.math_hint, None);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_reverse_mode_swaps_hot_and_cold(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Reverse, Difficulty::Easy);
        harness.engine.borrow_mut().force_target(42);

        let near = expect_feedback(harness.guess("44"));
        assert_eq!(near.classification, Classification::Cold);
        assert_eq!(near.direction, Some(Direction::Lower));
        let far = expect_feedback(harness.guess("1"));
        assert_eq!(far.classification, Classification::Hot);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_perfect_game_tiers_follow_lifetime_count(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        let mut tiers = Vec::new();
        for _ in 0..10 {
            harness.start(GameMode::Classic, Difficulty::Easy);
            harness.engine.borrow_mut().force_target(42);
            expect_win(harness.guess("42"));
            tiers.push(
                harness
                    .engine
                    .borrow()
                    .achievements()
                    .held_tier(Achievement::PerfectGame),
            );
        }
        use Tier::*;
        assert_eq!(
            tiers,
            [Bronze, Bronze, Silver, Silver, Gold, Gold, Gold, Gold, Gold, Platinum]
                .map(Some)
                .to_vec()
        );
        assert_eq!(harness.engine.borrow().stats().perfect_games, 10);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_easter_egg_announced_and_saved(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Classic, Difficulty::Easy);
        harness.engine.borrow_mut().force_target(42);
        harness.take_events();
        expect_win(harness.guess("42"));

        assert!(harness
            .feedback(FeedbackKind::Info)
            .iter()
            .any(|m| m.starts_with("New discovery!")));
        assert!(harness.take_events().iter().any(|e| matches!(
            e,
            GameEngineEvent::EasterEggDiscovered(EasterEgg::BeginnersLuck)
        )));
        assert_eq!(
            harness.storage.get(EASTER_EGGS_KEY).unwrap().as_deref(),
            Some("[\"beginners_luck\"]")
        );
        assert!(harness
            .engine
            .borrow()
            .easter_eggs()
            .discovered()
            .contains(&EasterEgg::BeginnersLuck));
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_help_once_per_round(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Classic, Difficulty::Easy);
        harness.engine.borrow_mut().force_target(42);

        assert_eq!(harness.engine.borrow_mut().use_help(), Ok((23, 61)));
        assert_eq!(
            harness.engine.borrow_mut().use_help(),
            Err(HelpError::AlreadyUsed)
        );
        assert_eq!(harness.engine.borrow().stats().hints_used, 1);

        let summary = expect_win(harness.guess("42"));
        assert!(summary.used_help);
        assert_eq!(summary.score, 900);
        assert_eq!(
            harness
                .engine
                .borrow()
                .achievements()
                .held_tier(Achievement::HelpSeeker),
            Some(Tier::Bronze)
        );
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_next_round_starts_automatically(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Classic, Difficulty::Easy);
        let first_id = harness.round().round_id;
        harness.engine.borrow_mut().force_target(42);
        harness.guess("42").unwrap();

        harness.advance(2);
        assert_eq!(harness.round().round_id, first_id);
        harness.advance(1);
        let round = harness.round();
        assert_ne!(round.round_id, first_id);
        assert!(round.is_active());
        assert_eq!(round.mode, GameMode::Classic);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_stale_timer_is_ignored(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Classic, Difficulty::Easy);
        harness.engine.borrow_mut().handle_timer(ScheduledEvent {
            round_id: uuid::Uuid::new_v4(),
            kind: TimerKind::BlitzExpired,
        });
        assert!(harness.round().is_active());
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_chaos_expiry_loses_the_round(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Chaos, Difficulty::Easy);
        let round_id = harness.round().round_id;
        harness.engine.borrow_mut().handle_timer(ScheduledEvent {
            round_id,
            kind: TimerKind::ChaosExpired,
        });

        assert_eq!(harness.round().phase, RoundPhase::Lost);
        assert!(harness.settled().iter().any(|o| matches!(
            o,
            RoundOutcome::Lost(LossSummary {
                reason: LossReason::NumberExpired,
                ..
            })
        )));
        assert_eq!(harness.engine.borrow().seconds_remaining(), None);
        // only the next round timer is left
        assert_eq!(harness.clock.pending(), 1);
        assert_eq!(harness.engine.borrow().stats().games_played, 1);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_new_game_cancels_previous_timers(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Chaos, Difficulty::Easy);
        harness.start(GameMode::Classic, Difficulty::Easy);
        assert_eq!(harness.clock.pending(), 0);
        assert_eq!(harness.engine.borrow().seconds_remaining(), None);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_storage_failure_warns_and_play_continues(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Classic, Difficulty::Easy);
        harness.engine.borrow_mut().force_target(42);
        harness.storage.set_unavailable(true);

        let outcome = harness.guess("42").unwrap();
        assert!(matches!(outcome, GuessOutcome::Settled(RoundOutcome::Won(_))));
        assert!(harness
            .feedback(FeedbackKind::Warning)
            .iter()
            .any(|m| m.starts_with("Progress could not be saved")));
        assert_eq!(harness.engine.borrow().stats().games_won, 1);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_unreadable_daily_result_warns_and_starts(_: &mut UsingLogger) {
        let harness = EngineHarness::at_date("2024-01-01");
        harness.storage.set_unavailable(true);
        harness.start(GameMode::Daily, Difficulty::Easy);

        assert!(harness
            .feedback(FeedbackKind::Warning)
            .iter()
            .any(|m| m.starts_with("Saved progress could not be read")));
        let round = harness.round();
        assert!(round.is_active());
        assert_eq!(round.target, 33);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_progress_survives_restart(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Classic, Difficulty::Easy);
        harness.engine.borrow_mut().force_target(42);
        harness.guess("42").unwrap();

        let reloaded = EngineHarness::with_storage(harness.storage.clone());
        let engine = reloaded.engine.borrow();
        assert_eq!(engine.stats().games_won, 1);
        assert!(engine.achievements().is_unlocked(Achievement::FirstWin));
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_resets(_: &mut UsingLogger) {
        let harness = EngineHarness::new();
        harness.start(GameMode::Classic, Difficulty::Easy);
        harness.engine.borrow_mut().force_target(42);
        harness.guess("42").unwrap();

        harness.send(GameEngineCommand::ResetStats);
        harness.send(GameEngineCommand::ResetAchievements);
        let engine = harness.engine.borrow();
        assert_eq!(engine.stats(), &PersistentStats::default());
        assert_eq!(engine.achievements().unlocked_count(), 0);
    }
}
