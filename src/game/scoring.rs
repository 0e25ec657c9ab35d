use crate::model::Difficulty;

/// Round score: 1000, minus 50 per extra guess, 2 per second, 100 for help,
/// scaled by difficulty and rounded half-up. Never negative.
pub fn calculate_score(num_guesses: u32, win_time: u64, used_help: bool, difficulty: Difficulty) -> u32 {
    let raw = 1000
        - 50 * (num_guesses.max(1) as i64 - 1)
        - 2 * win_time as i64
        - if used_help { 100 } else { 0 };
    if raw <= 0 {
        return 0;
    }
    ((raw * difficulty.score_multiplier_tenths() + 5) / 10) as u32
}

/// 0..=100 rating mixing attempt economy, speed and difficulty. With no
/// attempt limit every guess is free, so attempt efficiency is full.
pub fn calculate_efficiency(
    attempts: u32,
    max_attempts: Option<u32>,
    time: u64,
    difficulty: Difficulty,
) -> u32 {
    let attempt_ratio = match max_attempts {
        Some(max) if max > 0 => attempts as f64 / max as f64,
        _ => 0.0,
    };
    let attempt_efficiency = (100.0 - attempt_ratio * 100.0).max(0.0);
    let time_efficiency = (100.0 - (time as f64 / 60.0) * 20.0).max(0.0);
    let efficiency =
        attempt_efficiency * 0.7 + time_efficiency * 0.3 + difficulty.efficiency_bonus();
    efficiency.round().clamp(0.0, 100.0) as u32
}

/// Experience earned by one settled round
pub fn calculate_experience(
    won: bool,
    score: u32,
    difficulty: Difficulty,
    attempts: u32,
    time: u64,
) -> u64 {
    let mut exp: u32 = 10;
    if won {
        exp += 50;

        if score > 1000 {
            exp += 25;
        }
        if score > 2000 {
            exp += 50;
        }
        if score > 3000 {
            exp += 100;
        }

        if attempts <= 3 {
            exp += 30;
        }
        if attempts <= 5 {
            exp += 20;
        }
        if attempts <= 7 {
            exp += 10;
        }

        if time < 30 {
            exp += 20;
        }
        if time < 60 {
            exp += 10;
        }
    }
    ((exp * difficulty.experience_multiplier_halves() + 1) / 2) as u64
}
