use std::collections::BTreeSet;

use log::{debug, info};

use super::number_generator::NumberGenerator;
use crate::model::{Difficulty, Direction, GameMode, GuessRecord};

/// Break-the-bot switches to pure binary search after this many bot guesses
pub const BREAK_THE_BOT_LEVEL_UP: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BotSkill {
    Random,
    /// Takes the search midpoint with this probability, otherwise a random pick
    Mixed(f64),
    BinarySearch,
}

impl BotSkill {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => BotSkill::Random,
            Difficulty::Medium => BotSkill::Mixed(0.7),
            Difficulty::Hard => BotSkill::Mixed(0.9),
            Difficulty::Chaos => BotSkill::BinarySearch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Player,
    Bot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BotState {
    pub guessed_numbers: BTreeSet<i64>,
    pub turn: Turn,
    pub skill: BotSkill,
    pub search_min: i64,
    pub search_max: i64,
    pub guess_count: u32,
    levels_up: bool,
}

impl BotState {
    pub fn new(mode: GameMode, difficulty: Difficulty, min: i64, max: i64) -> Self {
        Self {
            guessed_numbers: BTreeSet::new(),
            turn: Turn::Player,
            skill: BotSkill::for_difficulty(difficulty),
            search_min: min,
            search_max: max,
            guess_count: 0,
            levels_up: mode == GameMode::BreakTheBot,
        }
    }

    pub fn midpoint(&self) -> i64 {
        (self.search_min + self.search_max).div_euclid(2)
    }

    /// Picks the bot's next guess in `[min, max]`, avoiding every number
    /// already guessed by either side. `None` when nothing is left to try.
    pub fn choose_guess(
        &self,
        player_guesses: &[GuessRecord],
        min: i64,
        max: i64,
        generator: &mut NumberGenerator,
    ) -> Option<i64> {
        let taken: BTreeSet<i64> = player_guesses
            .iter()
            .map(|g| g.value)
            .chain(self.guessed_numbers.iter().copied())
            .collect();
        let available: Vec<i64> = (min..=max).filter(|n| !taken.contains(n)).collect();
        if available.is_empty() {
            return None;
        }

        let intended = match self.skill {
            BotSkill::Random => None,
            BotSkill::Mixed(probability) => generator.chance(probability).then(|| self.midpoint()),
            BotSkill::BinarySearch => Some(self.midpoint()),
        };
        let guess = match intended {
            None => generator.choose(&available).copied(),
            Some(wanted) if available.binary_search(&wanted).is_ok() => Some(wanted),
            Some(wanted) => closest(&available, wanted),
        };
        debug!(target: "bot", "Bot skill {:?} picked {:?}", self.skill, guess);
        guess
    }

    /// Remembers a bot guess and narrows the search window from its feedback
    pub fn record(&mut self, guess: i64, direction: Option<Direction>) {
        self.guessed_numbers.insert(guess);
        self.guess_count += 1;

        // Random bots ignore the window but still keep it, so a level-up
        // starts searching from what has been learned
        match direction {
            Some(Direction::Higher) => self.search_min = self.search_min.max(guess + 1),
            Some(Direction::Lower) => self.search_max = self.search_max.min(guess - 1),
            None => {}
        }

        if self.levels_up
            && self.guess_count >= BREAK_THE_BOT_LEVEL_UP
            && self.skill != BotSkill::BinarySearch
        {
            info!(target: "bot", "Bot levelled up to binary search");
            self.skill = BotSkill::BinarySearch;
        }
    }
}

/// Available value nearest to `wanted`, lowest on ties
fn closest(available: &[i64], wanted: i64) -> Option<i64> {
    available
        .iter()
        .copied()
        .min_by_key(|value| ((value - wanted).abs(), *value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Classification;

    fn record(value: i64) -> GuessRecord {
        GuessRecord {
            value,
            classification: Classification::Neutral,
        }
    }

    #[test]
    fn test_skill_table() {
        assert_eq!(BotSkill::for_difficulty(Difficulty::Easy), BotSkill::Random);
        assert_eq!(BotSkill::for_difficulty(Difficulty::Medium), BotSkill::Mixed(0.7));
        assert_eq!(BotSkill::for_difficulty(Difficulty::Hard), BotSkill::Mixed(0.9));
        assert_eq!(
            BotSkill::for_difficulty(Difficulty::Chaos),
            BotSkill::BinarySearch
        );
    }

    #[test]
    fn test_binary_search_takes_midpoint() {
        let bot = BotState::new(GameMode::Bot, Difficulty::Chaos, 1, 100);
        let mut generator = NumberGenerator::new(Some(1));
        assert_eq!(bot.choose_guess(&[], 1, 100, &mut generator), Some(50));
    }

    #[test]
    fn test_unavailable_midpoint_falls_back_to_closest_lowest() {
        let bot = BotState::new(GameMode::Bot, Difficulty::Chaos, 1, 100);
        let mut generator = NumberGenerator::new(Some(1));
        let taken = [record(50)];
        assert_eq!(bot.choose_guess(&taken, 1, 100, &mut generator), Some(49));
    }

    #[test]
    fn test_never_repeats() {
        let mut bot = BotState::new(GameMode::Bot, Difficulty::Easy, 1, 20);
        let mut generator = NumberGenerator::new(Some(5));
        let player = [record(3), record(7)];
        let mut seen = BTreeSet::new();
        while let Some(guess) = bot.choose_guess(&player, 1, 20, &mut generator) {
            assert!(seen.insert(guess));
            assert!(guess != 3 && guess != 7);
            bot.record(guess, None);
        }
        assert_eq!(seen.len(), 18);
    }

    #[test]
    fn test_narrowing_from_direction() {
        let mut bot = BotState::new(GameMode::Bot, Difficulty::Chaos, 1, 100);
        bot.record(50, Some(Direction::Higher));
        assert_eq!((bot.search_min, bot.search_max), (51, 100));
        bot.record(75, Some(Direction::Lower));
        assert_eq!((bot.search_min, bot.search_max), (51, 74));
        assert_eq!(bot.midpoint(), 62);
    }

    #[test]
    fn test_level_up_searches_the_learned_window() {
        let mut bot = BotState::new(GameMode::BreakTheBot, Difficulty::Easy, 1, 100);
        bot.record(10, Some(Direction::Higher));
        bot.record(90, Some(Direction::Lower));
        bot.record(20, Some(Direction::Higher));
        assert_eq!(bot.skill, BotSkill::BinarySearch);
        let mut generator = NumberGenerator::new(Some(1));
        assert_eq!(bot.choose_guess(&[], 1, 100, &mut generator), Some(55));
    }

    #[test]
    fn test_break_the_bot_levels_up() {
        let mut bot = BotState::new(GameMode::BreakTheBot, Difficulty::Easy, 1, 100);
        for guess in [10, 20] {
            bot.record(guess, Some(Direction::Higher));
        }
        assert_eq!(bot.skill, BotSkill::Random);
        bot.record(30, Some(Direction::Higher));
        assert_eq!(bot.skill, BotSkill::BinarySearch);

        let mut plain = BotState::new(GameMode::Bot, Difficulty::Easy, 1, 100);
        for guess in [10, 20, 30, 40] {
            plain.record(guess, None);
        }
        assert_eq!(plain.skill, BotSkill::Random);
    }
}
