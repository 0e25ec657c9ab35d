use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Difficulty, GameMode};

pub const LEVEL_THRESHOLDS: [u64; 10] = [0, 100, 250, 500, 1000, 2000, 4000, 8000, 16000, 32000];
pub const LEVEL_TITLES: [&str; 10] = [
    "Novice",
    "Apprentice",
    "Explorer",
    "Strategist",
    "Mastermind",
    "Virtuoso",
    "Legend",
    "Mythic",
    "Divine",
    "Transcendent",
];

/// Lifetime statistics, persisted as one JSON document under `guessRushStats`.
/// Every field defaults so older or partial documents still load.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistentStats {
    pub games_played: u32,
    pub games_won: u32,
    pub total_attempts: u32,
    pub total_score: u64,
    pub hints_used: u32,
    pub best_score: Option<u32>,
    pub avg_win_time: f64,
    pub perfect_games: u32,
    pub best_by_mode: BTreeMap<GameMode, u32>,
    pub modes_won: BTreeMap<GameMode, u32>,
    pub daily_stats: DailyStats,
    pub streak: StreakStats,
    pub personal_bests: BTreeMap<GameMode, PersonalBest>,
    pub advanced_stats: BTreeMap<GameMode, BTreeMap<Difficulty, ModeDifficultyStats>>,
    pub ranking: Ranking,
}

impl PersistentStats {
    pub fn distinct_modes_won(&self) -> usize {
        self.modes_won.values().filter(|wins| **wins > 0).count()
    }

    pub fn wins_in(&self, mode: GameMode) -> u32 {
        self.modes_won.get(&mode).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyStats {
    pub days_played: u32,
    pub days_won: u32,
    pub current_streak: u32,
    pub max_streak: u32,
    pub last_win_date: Option<NaiveDate>,
}

impl DailyStats {
    /// Counts a daily round played on `today`. A day already recorded as won
    /// is not counted twice; consecutive winning days extend the streak.
    pub fn record(&mut self, today: NaiveDate, win: bool) {
        if self.last_win_date == Some(today) {
            return;
        }
        self.days_played += 1;
        if win {
            self.days_won += 1;
            let consecutive = self
                .last_win_date
                .and_then(|last| last.succ_opt())
                .map(|next| next == today)
                .unwrap_or(false);
            self.current_streak = if consecutive {
                self.current_streak + 1
            } else {
                1
            };
            self.last_win_date = Some(today);
            self.max_streak = self.max_streak.max(self.current_streak);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct StreakStats {
    pub games_played: u32,
    pub games_won: u32,
    pub best_streak: u32,
    pub completed_runs: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalBest {
    pub best_score: Option<u32>,
    pub best_time: Option<u64>,
    pub best_efficiency: Option<u32>,
}

impl PersonalBest {
    pub fn record(&mut self, score: u32, time: u64, efficiency: u32) {
        if self.best_score.map_or(true, |best| score > best) {
            self.best_score = Some(score);
        }
        if time > 0 && self.best_time.map_or(true, |best| time < best) {
            self.best_time = Some(time);
        }
        if self.best_efficiency.map_or(true, |best| efficiency > best) {
            self.best_efficiency = Some(efficiency);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ModeDifficultyStats {
    pub games_played: u32,
    pub games_won: u32,
    pub total_time: u64,
    pub total_attempts: u32,
    pub total_score: u64,
}

impl ModeDifficultyStats {
    pub fn record(&mut self, won: bool, time: u64, attempts: u32, score: u32) {
        self.games_played += 1;
        if won {
            self.games_won += 1;
        }
        self.total_time += time;
        self.total_attempts += attempts;
        self.total_score += score as u64;
    }

    pub fn calculated(&self) -> CalculatedStats {
        if self.games_played == 0 {
            return CalculatedStats::default();
        }
        let played = self.games_played as f64;
        CalculatedStats {
            average_time: (self.total_time as f64 / played).round() as u64,
            average_attempts: (self.total_attempts as f64 / played * 10.0).round() / 10.0,
            success_rate: (self.games_won as f64 / played * 100.0).round() as u32,
            average_score: (self.total_score as f64 / played).round() as u64,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalculatedStats {
    pub average_time: u64,
    pub average_attempts: f64,
    pub success_rate: u32,
    pub average_score: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Ranking {
    pub current_level: usize,
    pub current_title: String,
    pub total_experience: u64,
}

impl Default for Ranking {
    fn default() -> Self {
        Self {
            current_level: 1,
            current_title: LEVEL_TITLES[0].to_string(),
            total_experience: 0,
        }
    }
}

impl Ranking {
    pub fn level_for(experience: u64) -> usize {
        LEVEL_THRESHOLDS
            .iter()
            .rposition(|threshold| experience >= *threshold)
            .map(|index| index + 1)
            .unwrap_or(1)
    }

    pub fn add_experience(&mut self, experience: u64) {
        self.total_experience += experience;
        self.current_level = Ranking::level_for(self.total_experience);
        self.current_title = LEVEL_TITLES[(self.current_level - 1).min(LEVEL_TITLES.len() - 1)]
            .to_string();
    }

    pub fn progress(&self) -> RankingProgress {
        let level = self.current_level.clamp(1, LEVEL_THRESHOLDS.len());
        let current_threshold = LEVEL_THRESHOLDS[level - 1];
        let next_threshold = LEVEL_THRESHOLDS
            .get(level)
            .copied()
            .unwrap_or(current_threshold);
        let exp_in_current_level = self.total_experience.saturating_sub(current_threshold);
        let exp_needed_for_next_level = next_threshold - current_threshold;
        let progress_percentage = if exp_needed_for_next_level > 0 {
            ((exp_in_current_level as f64 / exp_needed_for_next_level as f64) * 100.0).round()
                as u32
        } else {
            100
        };
        RankingProgress {
            current_level: level,
            current_title: self.current_title.clone(),
            total_experience: self.total_experience,
            exp_in_current_level,
            exp_needed_for_next_level,
            progress_percentage,
            next_level: level + 1,
            next_title: LEVEL_TITLES
                .get(level)
                .map(|title| title.to_string())
                .unwrap_or_else(|| self.current_title.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingProgress {
    pub current_level: usize,
    pub current_title: String,
    pub total_experience: u64,
    pub exp_in_current_level: u64,
    pub exp_needed_for_next_level: u64,
    pub progress_percentage: u32,
    pub next_level: usize,
    pub next_title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_daily_streak_consecutive_days() {
        let mut daily = DailyStats::default();
        daily.record(date("2024-03-01"), true);
        daily.record(date("2024-03-02"), true);
        assert_eq!(daily.current_streak, 2);
        daily.record(date("2024-03-04"), true);
        assert_eq!(daily.current_streak, 1);
        assert_eq!(daily.max_streak, 2);
        assert_eq!(daily.days_won, 3);
    }

    #[test]
    fn test_daily_same_day_not_counted_twice() {
        let mut daily = DailyStats::default();
        daily.record(date("2024-03-01"), true);
        daily.record(date("2024-03-01"), true);
        assert_eq!(daily.days_played, 1);
        assert_eq!(daily.days_won, 1);
    }

    #[test]
    fn test_personal_best_keeps_best_values() {
        let mut best = PersonalBest::default();
        best.record(800, 12, 70);
        best.record(600, 8, 90);
        best.record(900, 0, 50);
        assert_eq!(best.best_score, Some(900));
        assert_eq!(best.best_time, Some(8));
        assert_eq!(best.best_efficiency, Some(90));
    }

    #[test]
    fn test_calculated_stats() {
        let mut stats = ModeDifficultyStats::default();
        stats.record(true, 10, 3, 900);
        stats.record(false, 21, 4, 0);
        stats.record(true, 5, 3, 950);
        let calculated = stats.calculated();
        assert_eq!(calculated.average_time, 12);
        assert_eq!(calculated.average_attempts, 3.3);
        assert_eq!(calculated.success_rate, 67);
        assert_eq!(calculated.average_score, 617);
        assert_eq!(
            ModeDifficultyStats::default().calculated(),
            CalculatedStats::default()
        );
    }

    #[test]
    fn test_ranking_levels() {
        assert_eq!(Ranking::level_for(0), 1);
        assert_eq!(Ranking::level_for(99), 1);
        assert_eq!(Ranking::level_for(100), 2);
        assert_eq!(Ranking::level_for(40_000), 10);

        let mut ranking = Ranking::default();
        ranking.add_experience(300);
        assert_eq!(ranking.current_level, 3);
        assert_eq!(ranking.current_title, "Explorer");

        let progress = ranking.progress();
        assert_eq!(progress.exp_in_current_level, 50);
        assert_eq!(progress.exp_needed_for_next_level, 250);
        assert_eq!(progress.progress_percentage, 20);
        assert_eq!(progress.next_title, "Strategist");
    }

    #[test]
    fn test_max_level_progress_is_complete() {
        let mut ranking = Ranking::default();
        ranking.add_experience(50_000);
        let progress = ranking.progress();
        assert_eq!(progress.current_title, "Transcendent");
        assert_eq!(progress.progress_percentage, 100);
        assert_eq!(progress.next_title, "Transcendent");
    }

    #[test]
    fn test_partial_document_loads_with_defaults() {
        let stats: PersistentStats =
            serde_json::from_str(r#"{"gamesPlayed": 4, "modesWon": {"classic": 2}}"#).unwrap();
        assert_eq!(stats.games_played, 4);
        assert_eq!(stats.wins_in(GameMode::Classic), 2);
        assert_eq!(stats.ranking.current_level, 1);
    }
}
