use std::time::{Duration, SystemTime};

use serde_with::serde_as;
use serde_with::TimestampSeconds;

/// Wall-clock span of a round. Time is always passed in so the engine can run
/// against a simulated clock.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimerState {
    #[serde_as(as = "TimestampSeconds")]
    pub started_timestamp: SystemTime,
    #[serde_as(as = "Option<TimestampSeconds>")]
    pub ended_timestamp: Option<SystemTime>,
}

impl TimerState {
    pub fn started_at(now: SystemTime) -> Self {
        Self {
            started_timestamp: now,
            ended_timestamp: None,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.ended_timestamp.is_some()
    }

    pub fn elapsed(&self, now: SystemTime) -> Duration {
        let until_time = self.ended_timestamp.unwrap_or(now);

        until_time
            .duration_since(self.started_timestamp)
            .unwrap_or(Duration::default())
    }

    /// Elapsed time rounded half-up to whole seconds
    pub fn elapsed_seconds(&self, now: SystemTime) -> u64 {
        let elapsed = self.elapsed(now);
        (elapsed.as_millis() as u64 + 500) / 1000
    }

    pub fn ended(&self, now: SystemTime) -> TimerState {
        let mut new_state = self.clone();
        new_state.ended_timestamp = Some(now);
        new_state
    }
}
