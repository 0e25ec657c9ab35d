use std::rc::Rc;

use chrono::NaiveDate;
use log::{debug, info};

use super::scoring::{calculate_efficiency, calculate_experience};
use super::storage::{self, Storage, STATS_KEY};
use crate::error::StorageError;
use crate::model::{DailyResult, Difficulty, GameMode, PersistentStats};

/// A round as the stats ledger sees it once it is over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledRound {
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub won: bool,
    pub num_guesses: u32,
    pub max_attempts: Option<u32>,
    pub time: u64,
    pub score: u32,
    pub used_help: bool,
}

impl SettledRound {
    pub fn is_perfect_game(&self) -> bool {
        self.won && self.num_guesses == 1 && !self.used_help && self.time < 5
    }
}

pub struct StatsManager {
    storage: Rc<dyn Storage>,
    stats: PersistentStats,
}

impl StatsManager {
    pub fn load(storage: Rc<dyn Storage>) -> Self {
        let stats: PersistentStats = storage::load_or_default(storage.as_ref(), STATS_KEY);
        debug!(
            target: "stats",
            "Loaded stats: {} played, {} won",
            stats.games_played,
            stats.games_won
        );
        Self { storage, stats }
    }

    pub fn stats(&self) -> &PersistentStats {
        &self.stats
    }

    /// Counts one valid guess towards the lifetime attempt total
    pub fn record_attempt(&mut self) {
        self.stats.total_attempts += 1;
    }

    pub fn record_help(&mut self) {
        self.stats.hints_used += 1;
    }

    /// Applies a settled round to every ledger. Returns the experience gained.
    pub fn record_round(&mut self, round: &SettledRound, today: NaiveDate) -> u64 {
        let stats = &mut self.stats;
        stats.games_played += 1;

        if round.won {
            stats.games_won += 1;
            stats.total_score += round.score as u64;
            stats.best_score = Some(stats.best_score.map_or(round.score, |b| b.max(round.score)));
            let mode_best = stats.best_by_mode.entry(round.mode).or_insert(0);
            *mode_best = (*mode_best).max(round.score);
            *stats.modes_won.entry(round.mode).or_insert(0) += 1;

            let n = stats.games_won as f64;
            stats.avg_win_time = (stats.avg_win_time * (n - 1.0) + round.time as f64) / n;

            if round.is_perfect_game() {
                stats.perfect_games += 1;
            }

            let efficiency = calculate_efficiency(
                round.num_guesses,
                round.max_attempts,
                round.time,
                round.difficulty,
            );
            stats
                .personal_bests
                .entry(round.mode)
                .or_default()
                .record(round.score, round.time, efficiency);
        }

        stats
            .advanced_stats
            .entry(round.mode)
            .or_default()
            .entry(round.difficulty)
            .or_default()
            .record(round.won, round.time, round.num_guesses, round.score);

        if round.mode == GameMode::Daily {
            stats.daily_stats.record(today, round.won);
        }

        let experience = calculate_experience(
            round.won,
            round.score,
            round.difficulty,
            round.num_guesses,
            round.time,
        );
        let level_before = stats.ranking.current_level;
        stats.ranking.add_experience(experience);
        if stats.ranking.current_level > level_before {
            info!(
                target: "stats",
                "Level up: {} ({})",
                stats.ranking.current_level,
                stats.ranking.current_title
            );
        }
        experience
    }

    /// Streak mode bookkeeping. `streak` is the run length reached this round.
    pub fn record_streak_round(&mut self, won: bool, streak: u32, completed: bool) {
        let streak_stats = &mut self.stats.streak;
        streak_stats.games_played += 1;
        if won {
            streak_stats.games_won += 1;
        }
        streak_stats.best_streak = streak_stats.best_streak.max(streak);
        if completed {
            streak_stats.completed_runs += 1;
        }
    }

    pub fn daily_result(&self, date: NaiveDate) -> Result<Option<DailyResult>, StorageError> {
        storage::load_json(self.storage.as_ref(), &DailyResult::storage_key(date))
    }

    pub fn save_daily_result(
        &self,
        date: NaiveDate,
        result: &DailyResult,
    ) -> Result<(), StorageError> {
        storage::save_json(self.storage.as_ref(), &DailyResult::storage_key(date), result)
    }

    pub fn save(&self) -> Result<(), StorageError> {
        storage::save_json(self.storage.as_ref(), STATS_KEY, &self.stats)
    }

    pub fn reset(&mut self) -> Result<(), StorageError> {
        info!(target: "stats", "Resetting statistics");
        self.stats = PersistentStats::default();
        self.storage.remove(STATS_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use test_context::test_context;

    use super::*;
    use crate::game::storage::MemoryStorage;
    use crate::tests::UsingLogger;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn round(mode: GameMode, won: bool, time: u64, score: u32) -> SettledRound {
        SettledRound {
            mode,
            difficulty: Difficulty::Easy,
            won,
            num_guesses: 3,
            max_attempts: Some(12),
            time,
            score,
            used_help: false,
        }
    }

    fn manager() -> (Rc<MemoryStorage>, StatsManager) {
        let storage = Rc::new(MemoryStorage::new());
        let manager = StatsManager::load(storage.clone());
        (storage, manager)
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_win_and_loss_settlement(_: &mut UsingLogger) {
        let (_, mut manager) = manager();
        let today = date("2024-06-01");
        manager.record_round(&round(GameMode::Classic, true, 10, 880), today);
        manager.record_round(&round(GameMode::Classic, true, 20, 700), today);
        manager.record_round(&round(GameMode::Chaos, false, 15, 0), today);

        let stats = manager.stats();
        assert_eq!(stats.games_played, 3);
        assert_eq!(stats.games_won, 2);
        assert_eq!(stats.total_score, 1580);
        assert_eq!(stats.best_score, Some(880));
        assert_eq!(stats.best_by_mode.get(&GameMode::Classic), Some(&880));
        assert_eq!(stats.avg_win_time, 15.0);
        assert_eq!(stats.wins_in(GameMode::Classic), 2);
        assert_eq!(stats.wins_in(GameMode::Chaos), 0);
        let chaos = &stats.advanced_stats[&GameMode::Chaos][&Difficulty::Easy];
        assert_eq!((chaos.games_played, chaos.games_won), (1, 0));
        assert_eq!(stats.personal_bests[&GameMode::Classic].best_time, Some(10));
        assert!(stats.ranking.total_experience > 0);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_perfect_game_counter(_: &mut UsingLogger) {
        let (_, mut manager) = manager();
        let mut perfect = round(GameMode::Classic, true, 2, 1000);
        perfect.num_guesses = 1;
        manager.record_round(&perfect, date("2024-06-01"));
        perfect.used_help = true;
        manager.record_round(&perfect, date("2024-06-01"));
        assert_eq!(manager.stats().perfect_games, 1);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_daily_stats_only_in_daily_mode(_: &mut UsingLogger) {
        let (_, mut manager) = manager();
        manager.record_round(&round(GameMode::Classic, true, 5, 900), date("2024-06-01"));
        assert_eq!(manager.stats().daily_stats.days_played, 0);
        manager.record_round(&round(GameMode::Daily, true, 5, 900), date("2024-06-01"));
        assert_eq!(manager.stats().daily_stats.days_won, 1);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_streak_bookkeeping(_: &mut UsingLogger) {
        let (_, mut manager) = manager();
        manager.record_streak_round(true, 1, false);
        manager.record_streak_round(true, 2, false);
        manager.record_streak_round(false, 2, false);
        let streak = &manager.stats().streak;
        assert_eq!(streak.games_played, 3);
        assert_eq!(streak.games_won, 2);
        assert_eq!(streak.best_streak, 2);
        assert_eq!(streak.completed_runs, 0);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_save_reload_and_reset(_: &mut UsingLogger) {
        let (storage, mut manager) = manager();
        manager.record_attempt();
        manager.record_help();
        manager.save().unwrap();

        let reloaded = StatsManager::load(storage.clone());
        assert_eq!(reloaded.stats().total_attempts, 1);
        assert_eq!(reloaded.stats().hints_used, 1);

        manager.reset().unwrap();
        assert_eq!(manager.stats(), &PersistentStats::default());
        assert_eq!(storage.get(STATS_KEY).unwrap(), None);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_corrupt_stats_fall_back_to_defaults(_: &mut UsingLogger) {
        let storage = Rc::new(MemoryStorage::new());
        storage.set(STATS_KEY, "{not json").unwrap();
        let manager = StatsManager::load(storage);
        assert_eq!(manager.stats(), &PersistentStats::default());
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_daily_result_round_trip(_: &mut UsingLogger) {
        let (storage, manager) = manager();
        let today = date("2024-01-01");
        assert_eq!(manager.daily_result(today).unwrap(), None);
        let result = DailyResult {
            win: false,
            attempts: 12,
            number: 33,
            time: Some(Duration::from_secs(61)),
        };
        manager.save_daily_result(today, &result).unwrap();
        assert_eq!(manager.daily_result(today).unwrap(), Some(result));
        assert!(storage.keys().contains(&"daily_2024-01-01".to_string()));
    }
}
