use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Hidden reactions to how the player guesses. Persisted by id in the
/// discovered list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EasterEgg {
    MetaGuess,
    #[serde(rename = "colder_ex")]
    ColderThanYourEx,
    #[serde(rename = "emotional_hotcold")]
    EmotionalHotCold,
    QaEngineer,
    #[serde(rename = "spray_pray")]
    SprayAndPray,
    JustVibes,
    Witchcraft,
    NoHintsMaster,
    StopShowingOff,
    Calculated,
    BeginnersLuck,
}

impl EasterEgg {
    pub fn all() -> [EasterEgg; 11] {
        [
            EasterEgg::MetaGuess,
            EasterEgg::ColderThanYourEx,
            EasterEgg::EmotionalHotCold,
            EasterEgg::QaEngineer,
            EasterEgg::SprayAndPray,
            EasterEgg::JustVibes,
            EasterEgg::Witchcraft,
            EasterEgg::NoHintsMaster,
            EasterEgg::StopShowingOff,
            EasterEgg::Calculated,
            EasterEgg::BeginnersLuck,
        ]
    }

    /// Rarer eggs win when several trigger on the same guess
    pub fn priority(&self) -> u8 {
        match self {
            EasterEgg::MetaGuess => 0,
            EasterEgg::ColderThanYourEx => 1,
            EasterEgg::EmotionalHotCold => 2,
            EasterEgg::QaEngineer => 3,
            EasterEgg::SprayAndPray => 4,
            EasterEgg::JustVibes => 5,
            EasterEgg::Witchcraft => 6,
            EasterEgg::NoHintsMaster => 7,
            EasterEgg::StopShowingOff => 8,
            EasterEgg::Calculated => 9,
            EasterEgg::BeginnersLuck => 10,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            EasterEgg::MetaGuess => "Guessing the number of your own guess? That's deep. 🌀",
            EasterEgg::ColderThanYourEx => "Colder than your ex! 🧊💔",
            EasterEgg::EmotionalHotCold => "You're playing emotional hot/cold. 😵‍💫",
            EasterEgg::QaEngineer => {
                "Testing the boundaries? You'd make a great QA engineer. ⌨️"
            }
            EasterEgg::SprayAndPray => "Spray and pray, huh? 💥🎯",
            EasterEgg::JustVibes => "No logic. No plan. Just vibes. ✨",
            EasterEgg::Witchcraft => "Is this… luck or witchcraft? 🔮",
            EasterEgg::NoHintsMaster => {
                "You either know what you're doing... or you're way too proud. 😏"
            }
            EasterEgg::StopShowingOff => "Stop showing off. We get it. 😎",
            EasterEgg::Calculated => "Calculated… maybe. 🤔📐",
            EasterEgg::BeginnersLuck => "Beginner's luck… or are you a genius in disguise? 🎓🕵️",
        }
    }
}

impl Display for EasterEgg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}
