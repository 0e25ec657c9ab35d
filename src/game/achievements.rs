use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use itertools::Itertools;
use log::{debug, info};

use crate::error::StorageError;
use crate::game::storage::{
    self, Storage, ACHIEVEMENTS_KEY, ACHIEVEMENT_TIERS_KEY,
};
use crate::model::{Achievement, Difficulty, GameMode, Tier};

/// Everything an achievement predicate may look at, captured at settlement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AchievementContext {
    pub won: bool,
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub num_guesses: u32,
    pub max_attempts: Option<u32>,
    pub attempts_left: Option<u32>,
    pub win_time: u64,
    pub used_help: bool,
    pub score: u32,
    /// Best score before this round was settled
    pub previous_best_score: Option<u32>,
    /// Number of values in play, `max - min + 1`
    pub range_width: i64,
    /// Consecutive cold guesses immediately before the winning guess
    pub cold_run: u32,
    /// Live streak length in streak mode, 0 elsewhere
    pub streak: u32,
    pub streak_completed: bool,
    pub games_won: u32,
    pub lifetime_hints: u32,
    pub perfect_games: u32,
    pub distinct_modes_won: usize,
    pub math_wins: u32,
    pub days_won: u32,
    pub daily_streak: u32,
}

impl AchievementContext {
    pub fn is_perfect_game(&self) -> bool {
        self.won && self.num_guesses == 1 && !self.used_help && self.win_time < 5
    }

    fn beat_bot_on(&self, difficulty: Difficulty) -> bool {
        self.won && self.mode.is_bot_mode() && self.difficulty == difficulty
    }

    fn won_double_chaos_on(&self, difficulty: Difficulty) -> bool {
        self.won && self.mode == GameMode::DoubleChaos && self.difficulty == difficulty
    }

    fn won_in(&self, mode: GameMode) -> bool {
        self.won && self.mode == mode
    }

    /// Score at least `tenths`/10 of the previous best, 1000 when there is none
    fn score_at_least(&self, tenths: u64) -> bool {
        let baseline = self.previous_best_score.filter(|b| *b > 0).unwrap_or(1000) as u64;
        self.won && self.score as u64 * 10 >= baseline * tenths
    }

    fn persistent(&self, rule: fn(u32, u32) -> bool) -> bool {
        match self.max_attempts {
            Some(max) => self.won && rule(self.num_guesses, max),
            None => false,
        }
    }
}

pub struct TierRule {
    pub tier: Tier,
    pub predicate: fn(&AchievementContext) -> bool,
    pub description: &'static str,
}

static FIRST_WIN: [TierRule; 1] = [TierRule {
    tier: Tier::Bronze,
    predicate: |c| c.won,
    description: "Win your first game",
}];

static LIGHTNING_FAST: [TierRule; 3] = [
    TierRule {
        tier: Tier::Bronze,
        predicate: |c| c.won && c.num_guesses < 6,
        description: "Win in less than 6 guesses",
    },
    TierRule {
        tier: Tier::Silver,
        predicate: |c| c.won && c.num_guesses < 4,
        description: "Win in less than 4 guesses",
    },
    TierRule {
        tier: Tier::Gold,
        predicate: |c| c.won && c.num_guesses == 1,
        description: "Win on your first guess!",
    },
];

static LUCKY_GUESS: [TierRule; 1] = [TierRule {
    tier: Tier::Bronze,
    predicate: |c| c.won && c.num_guesses == 1,
    description: "Win on your first try",
}];

static STREAK_MASTER: [TierRule; 4] = [
    TierRule {
        tier: Tier::Bronze,
        predicate: |c| c.won && (1..=3).contains(&c.streak),
        description: "Win 1-3 games in a row",
    },
    TierRule {
        tier: Tier::Silver,
        predicate: |c| c.won && (4..=7).contains(&c.streak),
        description: "Win 4-7 games in a row",
    },
    TierRule {
        tier: Tier::Gold,
        predicate: |c| c.won && (8..=11).contains(&c.streak),
        description: "Win 8-11 games in a row",
    },
    TierRule {
        tier: Tier::Platinum,
        predicate: |c| c.won && c.streak == 12,
        description: "Win 12 games in a row!",
    },
];

static PERSISTENT: [TierRule; 4] = [
    TierRule {
        tier: Tier::Bronze,
        predicate: |c| c.persistent(|guesses, max| guesses == max),
        description: "Win on your last attempt",
    },
    TierRule {
        tier: Tier::Silver,
        predicate: |c| c.persistent(|guesses, max| guesses >= max * 9 / 10),
        description: "Win after using 90%+ of attempts",
    },
    TierRule {
        tier: Tier::Gold,
        predicate: |c| c.persistent(|guesses, max| max > 0 && guesses == max - 1),
        description: "Win with only one attempt left",
    },
    TierRule {
        tier: Tier::Platinum,
        predicate: |c| !c.used_help && c.persistent(|guesses, max| guesses == max),
        description: "Win on last attempt without hints",
    },
];

static NEVER_GIVE_UP: [TierRule; 1] = [TierRule {
    tier: Tier::Bronze,
    predicate: |c| c.won && c.attempts_left == Some(0),
    description: "Win using your last attempt",
}];

static SPEED_DEMON: [TierRule; 3] = [
    TierRule {
        tier: Tier::Bronze,
        predicate: |c| c.won && c.win_time < 30,
        description: "Win in under 30 seconds",
    },
    TierRule {
        tier: Tier::Silver,
        predicate: |c| c.won && c.win_time < 20,
        description: "Win in under 20 seconds",
    },
    TierRule {
        tier: Tier::Gold,
        predicate: |c| c.won && c.win_time < 10,
        description: "Win in under 10 seconds",
    },
];

static PERFECT_GAME: [TierRule; 4] = [
    TierRule {
        tier: Tier::Bronze,
        predicate: |c| c.is_perfect_game() && c.perfect_games >= 1,
        description: "Achieve 1 perfect game",
    },
    TierRule {
        tier: Tier::Silver,
        predicate: |c| c.is_perfect_game() && c.perfect_games >= 3,
        description: "Achieve 3 perfect games",
    },
    TierRule {
        tier: Tier::Gold,
        predicate: |c| c.is_perfect_game() && c.perfect_games >= 5,
        description: "Achieve 5 perfect games",
    },
    TierRule {
        tier: Tier::Platinum,
        predicate: |c| c.is_perfect_game() && c.perfect_games >= 10,
        description: "Achieve 10 perfect games!",
    },
];

static PERFECT_SCORE: [TierRule; 4] = [
    TierRule {
        tier: Tier::Bronze,
        predicate: |c| c.score_at_least(8),
        description: "Score at least 80% of your best",
    },
    TierRule {
        tier: Tier::Silver,
        predicate: |c| c.score_at_least(9),
        description: "Score at least 90% of your best",
    },
    TierRule {
        tier: Tier::Gold,
        predicate: |c| c.score_at_least(10),
        description: "Match or beat your best score",
    },
    TierRule {
        tier: Tier::Platinum,
        predicate: |c| {
            c.won && c.num_guesses == 1 && !c.used_help && c.difficulty == Difficulty::Hard
        },
        description: "Best possible score (first guess, no hints, hard mode)",
    },
];

static HELP_SEEKER: [TierRule; 4] = [
    TierRule {
        tier: Tier::Bronze,
        predicate: |c| c.won && c.used_help && c.lifetime_hints >= 1,
        description: "Win after using a hint",
    },
    TierRule {
        tier: Tier::Silver,
        predicate: |c| c.won && c.used_help && c.lifetime_hints >= 2,
        description: "Win with a hint, 2 hints used overall",
    },
    TierRule {
        tier: Tier::Gold,
        predicate: |c| c.won && c.used_help && c.lifetime_hints >= 3,
        description: "Win with a hint, 3 hints used overall",
    },
    TierRule {
        tier: Tier::Platinum,
        predicate: |c| c.won && c.used_help && c.lifetime_hints >= 4,
        description: "Win with a hint, 4 hints used overall",
    },
];

static RANGE_MASTER: [TierRule; 4] = [
    TierRule {
        tier: Tier::Bronze,
        predicate: |c| c.won && c.range_width >= 100,
        description: "Win with a range of 100 numbers",
    },
    TierRule {
        tier: Tier::Silver,
        predicate: |c| c.won && c.range_width >= 250,
        description: "Win with a range of 250 numbers",
    },
    TierRule {
        tier: Tier::Gold,
        predicate: |c| c.won && c.range_width >= 500,
        description: "Win with a range of 500 numbers",
    },
    TierRule {
        tier: Tier::Platinum,
        predicate: |c| c.won && c.range_width >= 1000,
        description: "Win with a range of 1000 numbers",
    },
];

static TOTAL_WINS: [TierRule; 4] = [
    TierRule {
        tier: Tier::Bronze,
        predicate: |c| c.games_won >= 1,
        description: "First Win - Win 1 game",
    },
    TierRule {
        tier: Tier::Silver,
        predicate: |c| c.games_won >= 10,
        description: "Getting Started - Win 10 games",
    },
    TierRule {
        tier: Tier::Gold,
        predicate: |c| c.games_won >= 25,
        description: "Seasoned Winner - Win 25 games",
    },
    TierRule {
        tier: Tier::Platinum,
        predicate: |c| c.games_won >= 50,
        description: "Victory Veteran - Win 50 games",
    },
];

static COMEBACK_KING: [TierRule; 4] = [
    TierRule {
        tier: Tier::Bronze,
        predicate: |c| c.won && c.cold_run >= 3,
        description: "Win after 3 cold guesses in a row",
    },
    TierRule {
        tier: Tier::Silver,
        predicate: |c| c.won && c.cold_run >= 5,
        description: "Win after 5 cold guesses in a row",
    },
    TierRule {
        tier: Tier::Gold,
        predicate: |c| c.won && c.cold_run >= 7,
        description: "Win after 7 cold guesses in a row",
    },
    TierRule {
        tier: Tier::Platinum,
        predicate: |c| c.won && c.cold_run >= 10,
        description: "Win after 10 cold guesses in a row",
    },
];

static ALL_ROUNDER: [TierRule; 4] = [
    TierRule {
        tier: Tier::Bronze,
        predicate: |c| c.distinct_modes_won >= 3,
        description: "Win in 3 different modes",
    },
    TierRule {
        tier: Tier::Silver,
        predicate: |c| c.distinct_modes_won >= 6,
        description: "Win in 6 different modes",
    },
    TierRule {
        tier: Tier::Gold,
        predicate: |c| c.distinct_modes_won >= 10,
        description: "Win in 10 different modes",
    },
    TierRule {
        tier: Tier::Platinum,
        predicate: |c| c.distinct_modes_won >= 10 && c.won && !c.used_help,
        description: "Win in 10 different modes, the last without hints",
    },
];

static MATH_WHIZ: [TierRule; 4] = [
    TierRule {
        tier: Tier::Bronze,
        predicate: |c| c.won_in(GameMode::Math),
        description: "Win math mode",
    },
    TierRule {
        tier: Tier::Silver,
        predicate: |c| c.won_in(GameMode::Math) && !c.used_help,
        description: "Win math mode with no hints",
    },
    TierRule {
        tier: Tier::Gold,
        predicate: |c| c.won_in(GameMode::Math) && c.num_guesses == 1,
        description: "Win math mode on first try",
    },
    TierRule {
        tier: Tier::Platinum,
        predicate: |c| c.won_in(GameMode::Math) && c.math_wins >= 10,
        description: "Win math mode 10 times",
    },
];

static DAILY_CHAMPION: [TierRule; 4] = [
    TierRule {
        tier: Tier::Bronze,
        predicate: |c| c.won_in(GameMode::Daily) && c.days_won >= 1,
        description: "Win 1 daily challenge",
    },
    TierRule {
        tier: Tier::Silver,
        predicate: |c| c.won_in(GameMode::Daily) && c.days_won >= 5,
        description: "Win 5 daily challenges",
    },
    TierRule {
        tier: Tier::Gold,
        predicate: |c| c.won_in(GameMode::Daily) && c.days_won >= 15,
        description: "Win 15 daily challenges",
    },
    TierRule {
        tier: Tier::Platinum,
        predicate: |c| c.won_in(GameMode::Daily) && c.daily_streak >= 30,
        description: "Win 30 daily challenges in a row",
    },
];

static BLITZ_CHAMPION: [TierRule; 4] = [
    TierRule {
        tier: Tier::Bronze,
        predicate: |c| c.won_in(GameMode::Blitz) && c.win_time < 60,
        description: "Win blitz mode",
    },
    TierRule {
        tier: Tier::Silver,
        predicate: |c| c.won_in(GameMode::Blitz) && c.win_time < 20,
        description: "Win blitz mode in under 20 seconds",
    },
    TierRule {
        tier: Tier::Gold,
        predicate: |c| c.won_in(GameMode::Blitz) && c.win_time < 10,
        description: "Win blitz mode in under 10 seconds",
    },
    TierRule {
        tier: Tier::Platinum,
        predicate: |c| c.won_in(GameMode::Blitz) && c.num_guesses == 1 && c.win_time < 60,
        description: "Win blitz mode with only one guess",
    },
];

static CHAOS_MASTER: [TierRule; 1] = [TierRule {
    tier: Tier::Bronze,
    predicate: |c| c.won_in(GameMode::Chaos),
    description: "Win in chaos mode",
}];

static REVERSE_MASTER: [TierRule; 1] = [TierRule {
    tier: Tier::Bronze,
    predicate: |c| c.won_in(GameMode::Reverse),
    description: "Win in reverse mode",
}];

static SUDDEN_DEATH: [TierRule; 1] = [TierRule {
    tier: Tier::Bronze,
    predicate: |c| c.won_in(GameMode::Sudden),
    description: "Win in sudden death mode",
}];

static DOUBLE_CHAOS: [TierRule; 1] = [TierRule {
    tier: Tier::Bronze,
    predicate: |c| c.won_in(GameMode::DoubleChaos),
    description: "Win in double chaos mode",
}];

static BREAK_THE_BOT: [TierRule; 1] = [TierRule {
    tier: Tier::Bronze,
    predicate: |c| c.won_in(GameMode::BreakTheBot),
    description: "Win in break the bot mode",
}];

static PERFECT_STREAK: [TierRule; 1] = [TierRule {
    tier: Tier::Bronze,
    predicate: |c| c.streak_completed,
    description: "Complete Streak Mode without a loss",
}];

static BOT_BUSTER_EASY: [TierRule; 1] = [TierRule {
    tier: Tier::Bronze,
    predicate: |c| c.beat_bot_on(Difficulty::Easy),
    description: "Beat the bot on Easy difficulty",
}];

static BOT_BUSTER_MEDIUM: [TierRule; 1] = [TierRule {
    tier: Tier::Silver,
    predicate: |c| c.beat_bot_on(Difficulty::Medium),
    description: "Beat the bot on Medium difficulty",
}];

static BOT_BUSTER_HARD: [TierRule; 1] = [TierRule {
    tier: Tier::Gold,
    predicate: |c| c.beat_bot_on(Difficulty::Hard),
    description: "Beat the bot on Hard difficulty",
}];

static BOT_BUSTER_CHAOS: [TierRule; 1] = [TierRule {
    tier: Tier::Platinum,
    predicate: |c| c.beat_bot_on(Difficulty::Chaos),
    description: "Beat the bot on Chaos difficulty!",
}];

static INTO_THE_STORM: [TierRule; 1] = [TierRule {
    tier: Tier::Bronze,
    predicate: |c| c.won_double_chaos_on(Difficulty::Easy),
    description: "Win Double Chaos on easy",
}];

static CHAOS_HANDLER: [TierRule; 1] = [TierRule {
    tier: Tier::Silver,
    predicate: |c| c.won_double_chaos_on(Difficulty::Medium),
    description: "Win Double Chaos on medium",
}];

static MASTER_OF_MAYHEM: [TierRule; 1] = [TierRule {
    tier: Tier::Gold,
    predicate: |c| c.won_double_chaos_on(Difficulty::Hard),
    description: "Win Double Chaos on hard",
}];

static LORD_OF_THE_DOUBLE_CHAOS: [TierRule; 1] = [TierRule {
    tier: Tier::Platinum,
    predicate: |c| c.won_double_chaos_on(Difficulty::Chaos),
    description: "Win Double Chaos on chaos",
}];

// unlocked only by the secret check, never by evaluation
static GAME_MASTER: [TierRule; 1] = [TierRule {
    tier: Tier::Platinum,
    predicate: |_| false,
    description: "Earn every other achievement",
}];

/// Tier rules for an achievement, declared weakest first
pub fn rules(achievement: Achievement) -> &'static [TierRule] {
    match achievement {
        Achievement::FirstWin => &FIRST_WIN,
        Achievement::LightningFast => &LIGHTNING_FAST,
        Achievement::LuckyGuess => &LUCKY_GUESS,
        Achievement::StreakMaster => &STREAK_MASTER,
        Achievement::Persistent => &PERSISTENT,
        Achievement::NeverGiveUp => &NEVER_GIVE_UP,
        Achievement::SpeedDemon => &SPEED_DEMON,
        Achievement::PerfectGame => &PERFECT_GAME,
        Achievement::PerfectScore => &PERFECT_SCORE,
        Achievement::HelpSeeker => &HELP_SEEKER,
        Achievement::RangeMaster => &RANGE_MASTER,
        Achievement::TotalWins => &TOTAL_WINS,
        Achievement::ComebackKing => &COMEBACK_KING,
        Achievement::AllRounder => &ALL_ROUNDER,
        Achievement::MathWhiz => &MATH_WHIZ,
        Achievement::DailyChampion => &DAILY_CHAMPION,
        Achievement::BlitzChampion => &BLITZ_CHAMPION,
        Achievement::ChaosMaster => &CHAOS_MASTER,
        Achievement::ReverseMaster => &REVERSE_MASTER,
        Achievement::SuddenDeath => &SUDDEN_DEATH,
        Achievement::DoubleChaos => &DOUBLE_CHAOS,
        Achievement::BreakTheBot => &BREAK_THE_BOT,
        Achievement::PerfectStreak => &PERFECT_STREAK,
        Achievement::BotBusterEasy => &BOT_BUSTER_EASY,
        Achievement::BotBusterMedium => &BOT_BUSTER_MEDIUM,
        Achievement::BotBusterHard => &BOT_BUSTER_HARD,
        Achievement::BotBusterChaos => &BOT_BUSTER_CHAOS,
        Achievement::IntoTheStorm => &INTO_THE_STORM,
        Achievement::ChaosHandler => &CHAOS_HANDLER,
        Achievement::MasterOfMayhem => &MASTER_OF_MAYHEM,
        Achievement::LordOfTheDoubleChaos => &LORD_OF_THE_DOUBLE_CHAOS,
        Achievement::GameMaster => &GAME_MASTER,
    }
}

pub fn describe(achievement: Achievement, tier: Tier) -> &'static str {
    rules(achievement)
        .iter()
        .find(|rule| rule.tier == tier)
        .map(|rule| rule.description)
        .unwrap_or_else(|| achievement.summary())
}

/// Strongest tier whose predicate holds, checked strongest first
pub fn evaluate(achievement: Achievement, context: &AchievementContext) -> Option<Tier> {
    rules(achievement)
        .iter()
        .sorted_by_key(|rule| Reverse(rule.tier))
        .find(|rule| (rule.predicate)(context))
        .map(|rule| rule.tier)
}

/// Held tiers, the lifetime unlock set and this round's earnings
pub struct AchievementEngine {
    storage: Rc<dyn Storage>,
    tiers: BTreeMap<Achievement, Tier>,
    unlocked: BTreeSet<Achievement>,
    earned_this_round: Vec<(Achievement, Tier)>,
    notifications: Vec<(Achievement, Tier)>,
}

impl AchievementEngine {
    pub fn load(storage: Rc<dyn Storage>) -> Self {
        let tiers: BTreeMap<Achievement, Tier> =
            storage::load_or_default(storage.as_ref(), ACHIEVEMENT_TIERS_KEY);
        let mut unlocked: BTreeSet<Achievement> =
            storage::load_or_default(storage.as_ref(), ACHIEVEMENTS_KEY);
        unlocked.extend(tiers.keys().copied());
        debug!(target: "achievements", "Loaded {} achievements", unlocked.len());
        Self {
            storage,
            tiers,
            unlocked,
            earned_this_round: Vec::new(),
            notifications: Vec::new(),
        }
    }

    pub fn held_tier(&self, achievement: Achievement) -> Option<Tier> {
        self.tiers.get(&achievement).copied()
    }

    pub fn is_unlocked(&self, achievement: Achievement) -> bool {
        self.unlocked.contains(&achievement)
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocked.len()
    }

    pub fn earned_this_round(&self) -> &[(Achievement, Tier)] {
        &self.earned_this_round
    }

    pub fn begin_round(&mut self) {
        self.earned_this_round.clear();
    }

    /// Raises the held tier. Returns false when an equal or stronger tier is
    /// already held.
    pub fn unlock(&mut self, achievement: Achievement, tier: Tier) -> bool {
        if self.held_tier(achievement).is_some_and(|held| held >= tier) {
            return false;
        }
        info!(target: "achievements", "Unlocked {} ({})", achievement, tier);
        self.tiers.insert(achievement, tier);
        self.unlocked.insert(achievement);
        self.earned_this_round.retain(|(earned, _)| *earned != achievement);
        self.earned_this_round.push((achievement, tier));
        self.notifications.push((achievement, tier));
        if !achievement.is_secret() {
            self.check_secret();
        }
        true
    }

    /// Unlocks the secret achievement once every other one is held
    pub fn check_secret(&mut self) -> bool {
        let secret = Achievement::GameMaster;
        if self.is_unlocked(secret) {
            return false;
        }
        let all_earned = Achievement::all()
            .into_iter()
            .filter(|a| !a.is_secret())
            .all(|a| self.is_unlocked(a));
        all_earned && self.unlock(secret, Tier::Platinum)
    }

    /// Evaluates the whole registry and unlocks what the context earns.
    /// Returns the achievements whose held tier went up.
    pub fn evaluate_all(&mut self, context: &AchievementContext) -> Vec<(Achievement, Tier)> {
        Achievement::all()
            .into_iter()
            .filter(|a| !a.is_secret())
            .filter_map(|a| evaluate(a, context).map(|tier| (a, tier)))
            .filter(|(a, tier)| self.unlock(*a, *tier))
            .collect()
    }

    /// Evaluates a single achievement, unlocking it when the context earns a
    /// stronger tier than the one held
    pub fn evaluate_one(&mut self, achievement: Achievement, context: &AchievementContext) -> bool {
        evaluate(achievement, context).is_some_and(|tier| self.unlock(achievement, tier))
    }

    /// Unlocks newly earned since the last call, for event emission
    pub fn take_notifications(&mut self) -> Vec<(Achievement, Tier)> {
        std::mem::take(&mut self.notifications)
    }

    pub fn persist(&self) -> Result<(), StorageError> {
        storage::save_json(self.storage.as_ref(), ACHIEVEMENT_TIERS_KEY, &self.tiers)?;
        storage::save_json(self.storage.as_ref(), ACHIEVEMENTS_KEY, &self.unlocked)
    }

    pub fn reset(&mut self) -> Result<(), StorageError> {
        info!(target: "achievements", "Resetting all achievements");
        self.tiers.clear();
        self.unlocked.clear();
        self.earned_this_round.clear();
        self.notifications.clear();
        self.storage.remove(ACHIEVEMENT_TIERS_KEY)?;
        self.storage.remove(ACHIEVEMENTS_KEY)?;
        Ok(())
    }
}
