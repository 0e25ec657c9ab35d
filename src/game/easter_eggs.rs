use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;
use std::time::{Duration, SystemTime};

use itertools::Itertools;
use log::{debug, info};

use super::storage::{self, Storage, EASTER_EGGS_KEY};
use crate::error::StorageError;
use crate::model::EasterEgg;

const RAPID_GUESSES: usize = 10;
const RAPID_WINDOW: Duration = Duration::from_secs(5);
const FAR_DISTANCE: i64 = 30;
const FAR_RUN: u32 = 10;
const BOUNDARY_RUN: u32 = 3;
const HINTLESS_WINS: u32 = 5;
const QUICK_WINS: usize = 3;

/// One valid player guess, as the tracker sees it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuessObservation {
    pub guess: i64,
    pub target: i64,
    pub min_range: i64,
    pub max_range: i64,
    pub won: bool,
    /// 1-based attempt number within the round
    pub attempt: u32,
    pub used_help: bool,
    /// No game has been settled yet
    pub first_game: bool,
    pub at: SystemTime,
}

impl GuessObservation {
    fn distance(&self) -> i64 {
        (self.guess - self.target).abs()
    }
}

/// Watches guessing behaviour for easter eggs. Counters live for the session;
/// the discovered list is persisted and each egg is only announced once.
pub struct EasterEggTracker {
    storage: Rc<dyn Storage>,
    discovered: BTreeSet<EasterEgg>,

    // across rounds
    guess_times: VecDeque<SystemTime>,
    first_guess_wins: u32,
    hintless_wins: u32,
    recent_win_guesses: VecDeque<u32>,

    // per round
    last_distances: VecDeque<i64>,
    far_run: u32,
    boundary_run: u32,
    last_boundary: Option<i64>,
    meta_guess_seen: bool,
    last_triggered: Option<EasterEgg>,
}

impl EasterEggTracker {
    pub fn load(storage: Rc<dyn Storage>) -> Self {
        let discovered: BTreeSet<EasterEgg> =
            storage::load_or_default(storage.as_ref(), EASTER_EGGS_KEY);
        debug!(target: "easter_eggs", "{} easter eggs discovered so far", discovered.len());
        Self {
            storage,
            discovered,
            guess_times: VecDeque::new(),
            first_guess_wins: 0,
            hintless_wins: 0,
            recent_win_guesses: VecDeque::new(),
            last_distances: VecDeque::new(),
            far_run: 0,
            boundary_run: 0,
            last_boundary: None,
            meta_guess_seen: false,
            last_triggered: None,
        }
    }

    pub fn discovered(&self) -> &BTreeSet<EasterEgg> {
        &self.discovered
    }

    pub fn begin_round(&mut self) {
        self.last_distances.clear();
        self.far_run = 0;
        self.boundary_run = 0;
        self.last_boundary = None;
        self.meta_guess_seen = false;
        self.last_triggered = None;
    }

    /// Updates every counter with the guess and returns the egg it uncovers,
    /// if it is one the player has not found before
    pub fn observe(&mut self, observation: &GuessObservation) -> Option<EasterEgg> {
        let triggered = self.triggered_by(observation);
        let selected = triggered.into_iter().max_by_key(|egg| egg.priority())?;
        if self.last_triggered == Some(selected) {
            return None;
        }
        self.last_triggered = Some(selected);
        if !self.discovered.insert(selected) {
            return None;
        }
        info!(target: "easter_eggs", "New discovery: {:?}", selected);
        Some(selected)
    }

    fn triggered_by(&mut self, o: &GuessObservation) -> Vec<EasterEgg> {
        let mut triggered = Vec::new();
        let distance = o.distance();

        push_capped(&mut self.guess_times, o.at, RAPID_GUESSES);
        push_capped(&mut self.last_distances, distance, 3);

        if o.won && o.attempt == 1 && o.first_game {
            self.first_guess_wins = 1;
            triggered.push(EasterEgg::BeginnersLuck);
        }

        if o.won && o.attempt == 1 && self.first_guess_wins >= 2 {
            self.first_guess_wins = 0;
            triggered.push(EasterEgg::Calculated);
        }

        if o.won {
            push_capped(&mut self.recent_win_guesses, o.attempt, QUICK_WINS);
            if self.recent_win_guesses.len() >= QUICK_WINS
                && self.recent_win_guesses.iter().all(|g| *g < 3)
            {
                self.recent_win_guesses.clear();
                triggered.push(EasterEgg::StopShowingOff);
            }

            if o.used_help {
                self.hintless_wins = 0;
            } else {
                self.hintless_wins += 1;
                if self.hintless_wins >= HINTLESS_WINS {
                    self.hintless_wins = 0;
                    triggered.push(EasterEgg::NoHintsMaster);
                }
            }

            if o.attempt == 1 {
                self.first_guess_wins += 1;
                if self.first_guess_wins == 1 && !o.first_game {
                    triggered.push(EasterEgg::Witchcraft);
                }
            } else {
                self.first_guess_wins = 0;
            }
        } else if o.attempt > 1 {
            self.first_guess_wins = 0;
        }

        if !o.used_help && distance > FAR_DISTANCE {
            self.far_run += 1;
            if self.far_run >= FAR_RUN {
                self.far_run = 0;
                triggered.push(EasterEgg::JustVibes);
            }
        } else {
            self.far_run = 0;
        }

        if self.guess_times.len() >= RAPID_GUESSES {
            let span = self
                .guess_times
                .back()
                .zip(self.guess_times.front())
                .and_then(|(last, first)| last.duration_since(*first).ok());
            if span.is_some_and(|span| span < RAPID_WINDOW) {
                self.guess_times.clear();
                triggered.push(EasterEgg::SprayAndPray);
            }
        }

        if o.guess == o.min_range || o.guess == o.max_range {
            if self.last_boundary == Some(o.guess) {
                self.boundary_run += 1;
            } else {
                self.boundary_run = 1;
            }
            self.last_boundary = Some(o.guess);
            if self.boundary_run >= BOUNDARY_RUN {
                self.boundary_run = 0;
                triggered.push(EasterEgg::QaEngineer);
            }
        } else {
            self.boundary_run = 0;
            self.last_boundary = None;
        }

        if let Some((first, second, third)) = self.last_distances.iter().copied().collect_tuple() {
            if first < 10 && second > 40 && third < 10 {
                triggered.push(EasterEgg::EmotionalHotCold);
            }
            if [first, second, third].iter().all(|d| *d > 50) {
                triggered.push(EasterEgg::ColderThanYourEx);
            }
        }

        if o.guess == o.attempt as i64 && !self.meta_guess_seen {
            self.meta_guess_seen = true;
            triggered.push(EasterEgg::MetaGuess);
        }

        triggered
    }

    pub fn persist(&self) -> Result<(), StorageError> {
        storage::save_json(self.storage.as_ref(), EASTER_EGGS_KEY, &self.discovered)
    }
}

fn push_capped<T>(queue: &mut VecDeque<T>, value: T, cap: usize) {
    queue.push_back(value);
    while queue.len() > cap {
        queue.pop_front();
    }
}
