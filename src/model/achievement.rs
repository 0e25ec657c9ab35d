use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Every achievement the game knows about. Serialized by display name so the
/// persisted tier map reads `{"Lightning Fast": "gold"}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Achievement {
    #[serde(rename = "First Win")]
    FirstWin,
    #[serde(rename = "Lightning Fast")]
    LightningFast,
    #[serde(rename = "Lucky Guess")]
    LuckyGuess,
    #[serde(rename = "Streak Master")]
    StreakMaster,
    #[serde(rename = "Persistent")]
    Persistent,
    #[serde(rename = "Never Give Up")]
    NeverGiveUp,
    #[serde(rename = "Speed Demon")]
    SpeedDemon,
    #[serde(rename = "Perfect Game")]
    PerfectGame,
    #[serde(rename = "Perfect Score")]
    PerfectScore,
    #[serde(rename = "Help Seeker")]
    HelpSeeker,
    #[serde(rename = "Range Master")]
    RangeMaster,
    #[serde(rename = "Total Wins")]
    TotalWins,
    #[serde(rename = "Comeback King")]
    ComebackKing,
    #[serde(rename = "All Rounder")]
    AllRounder,
    #[serde(rename = "Math Whiz")]
    MathWhiz,
    #[serde(rename = "Daily Champion")]
    DailyChampion,
    #[serde(rename = "Blitz Champion")]
    BlitzChampion,
    #[serde(rename = "Chaos Master")]
    ChaosMaster,
    #[serde(rename = "Reverse Master")]
    ReverseMaster,
    #[serde(rename = "Sudden Death")]
    SuddenDeath,
    #[serde(rename = "Double Chaos")]
    DoubleChaos,
    #[serde(rename = "Break the Bot")]
    BreakTheBot,
    #[serde(rename = "Perfect Streak")]
    PerfectStreak,
    #[serde(rename = "Bot Buster (Easy)")]
    BotBusterEasy,
    #[serde(rename = "Bot Buster (Medium)")]
    BotBusterMedium,
    #[serde(rename = "Bot Buster (Hard)")]
    BotBusterHard,
    #[serde(rename = "Bot Buster (Chaos)")]
    BotBusterChaos,
    #[serde(rename = "Into the Storm")]
    IntoTheStorm,
    #[serde(rename = "Chaos Handler")]
    ChaosHandler,
    #[serde(rename = "Master of Mayhem")]
    MasterOfMayhem,
    #[serde(rename = "Lord of the Double Chaos")]
    LordOfTheDoubleChaos,
    #[serde(rename = "Game Master")]
    GameMaster,
}

impl Achievement {
    pub fn all() -> Vec<Achievement> {
        vec![
            Achievement::FirstWin,
            Achievement::LightningFast,
            Achievement::LuckyGuess,
            Achievement::StreakMaster,
            Achievement::Persistent,
            Achievement::NeverGiveUp,
            Achievement::SpeedDemon,
            Achievement::PerfectGame,
            Achievement::PerfectScore,
            Achievement::HelpSeeker,
            Achievement::RangeMaster,
            Achievement::TotalWins,
            Achievement::ComebackKing,
            Achievement::AllRounder,
            Achievement::MathWhiz,
            Achievement::DailyChampion,
            Achievement::BlitzChampion,
            Achievement::ChaosMaster,
            Achievement::ReverseMaster,
            Achievement::SuddenDeath,
            Achievement::DoubleChaos,
            Achievement::BreakTheBot,
            Achievement::PerfectStreak,
            Achievement::BotBusterEasy,
            Achievement::BotBusterMedium,
            Achievement::BotBusterHard,
            Achievement::BotBusterChaos,
            Achievement::IntoTheStorm,
            Achievement::ChaosHandler,
            Achievement::MasterOfMayhem,
            Achievement::LordOfTheDoubleChaos,
            Achievement::GameMaster,
        ]
    }

    /// The meta achievement, only unlocked once everything else has been earned
    pub fn is_secret(&self) -> bool {
        matches!(self, Achievement::GameMaster)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Achievement::FirstWin => "First Win",
            Achievement::LightningFast => "Lightning Fast",
            Achievement::LuckyGuess => "Lucky Guess",
            Achievement::StreakMaster => "Streak Master",
            Achievement::Persistent => "Persistent",
            Achievement::NeverGiveUp => "Never Give Up",
            Achievement::SpeedDemon => "Speed Demon",
            Achievement::PerfectGame => "Perfect Game",
            Achievement::PerfectScore => "Perfect Score",
            Achievement::HelpSeeker => "Help Seeker",
            Achievement::RangeMaster => "Range Master",
            Achievement::TotalWins => "Total Wins",
            Achievement::ComebackKing => "Comeback King",
            Achievement::AllRounder => "All Rounder",
            Achievement::MathWhiz => "Math Whiz",
            Achievement::DailyChampion => "Daily Champion",
            Achievement::BlitzChampion => "Blitz Champion",
            Achievement::ChaosMaster => "Chaos Master",
            Achievement::ReverseMaster => "Reverse Master",
            Achievement::SuddenDeath => "Sudden Death",
            Achievement::DoubleChaos => "Double Chaos",
            Achievement::BreakTheBot => "Break the Bot",
            Achievement::PerfectStreak => "Perfect Streak",
            Achievement::BotBusterEasy => "Bot Buster (Easy)",
            Achievement::BotBusterMedium => "Bot Buster (Medium)",
            Achievement::BotBusterHard => "Bot Buster (Hard)",
            Achievement::BotBusterChaos => "Bot Buster (Chaos)",
            Achievement::IntoTheStorm => "Into the Storm",
            Achievement::ChaosHandler => "Chaos Handler",
            Achievement::MasterOfMayhem => "Master of Mayhem",
            Achievement::LordOfTheDoubleChaos => "Lord of the Double Chaos",
            Achievement::GameMaster => "Game Master",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Achievement::FirstWin => "Win your first game",
            Achievement::LightningFast => "Win quickly with few guesses",
            Achievement::LuckyGuess => "Win on your first try",
            Achievement::StreakMaster => "Win multiple games in a row",
            Achievement::Persistent => "Win after many attempts",
            Achievement::NeverGiveUp => "Win using your last attempt",
            Achievement::SpeedDemon => "Win in under 30 seconds",
            Achievement::PerfectGame => "Win in 1 guess, no hints, under 5 seconds",
            Achievement::PerfectScore => "Win with the best possible score",
            Achievement::HelpSeeker => "Use hints to win",
            Achievement::RangeMaster => "Win with a large number range",
            Achievement::TotalWins => "Win games to unlock higher tiers",
            Achievement::ComebackKing => "Win after a run of cold guesses",
            Achievement::AllRounder => "Win in many different modes",
            Achievement::MathWhiz => "Win in math mode",
            Achievement::DailyChampion => "Win the daily challenge",
            Achievement::BlitzChampion => "Win in blitz mode",
            Achievement::ChaosMaster => "Win in chaos mode",
            Achievement::ReverseMaster => "Win in reverse mode",
            Achievement::SuddenDeath => "Win in sudden death mode",
            Achievement::DoubleChaos => "Win in double chaos mode",
            Achievement::BreakTheBot => "Win in break the bot mode",
            Achievement::PerfectStreak => "Complete Streak Mode without a loss",
            Achievement::BotBusterEasy => "Beat the bot on easy difficulty",
            Achievement::BotBusterMedium => "Beat the bot on medium difficulty",
            Achievement::BotBusterHard => "Beat the bot on hard difficulty",
            Achievement::BotBusterChaos => "Beat the bot on chaos difficulty",
            Achievement::IntoTheStorm => "Win Double Chaos on easy difficulty",
            Achievement::ChaosHandler => "Win Double Chaos on medium difficulty",
            Achievement::MasterOfMayhem => "Win Double Chaos on hard difficulty",
            Achievement::LordOfTheDoubleChaos => "Win Double Chaos on chaos difficulty",
            Achievement::GameMaster => "Win all achievements to unlock this",
        }
    }
}

impl Display for Achievement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
