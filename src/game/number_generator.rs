use chrono::NaiveDate;
use log::debug;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::helpers::iso_date;

/// Minimum width of a double chaos sub-range
pub const MIN_SUB_RANGE_WIDTH: i64 = 10;

/// All randomness in a game session. Seeded so a session can be replayed.
pub struct NumberGenerator {
    rng: StdRng,
    seed: u64,
}

impl NumberGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        debug!(target: "game_engine", "Number generator seed: {}", seed);
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform integer in `[min, max]`
    pub fn in_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        self.rng.random_range(min..=max)
    }

    /// A random sub-range of `[envelope_min, envelope_max]` at least
    /// `MIN_SUB_RANGE_WIDTH` wide
    pub fn sub_range(&mut self, envelope_min: i64, envelope_max: i64) -> (i64, i64) {
        let min = self.in_range(envelope_min, envelope_max - MIN_SUB_RANGE_WIDTH);
        let mut max = self.in_range(min, envelope_max);
        if max - min < MIN_SUB_RANGE_WIDTH {
            max = min + MIN_SUB_RANGE_WIDTH;
        }
        (min, max.min(envelope_max))
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.random_bool(probability.clamp(0.0, 1.0))
    }

    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    /// The same number for everyone on a given UTC date
    pub fn daily(date: NaiveDate, min: i64, max: i64) -> i64 {
        let hash = daily_hash(&iso_date(date));
        min + (hash as i64).abs() % (max - min + 1)
    }
}

/// 31-multiplier string hash over UTF-16 units, wrapping at 32 bits
pub fn daily_hash(text: &str) -> i32 {
    text.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32)
    })
}
