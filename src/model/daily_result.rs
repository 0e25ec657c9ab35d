use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use serde_with::DurationSeconds;

use crate::game::storage::DAILY_KEY_PREFIX;
use crate::helpers::iso_date;

/// Outcome of a daily challenge, stored under `daily_<ISODate>`
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyResult {
    pub win: bool,
    pub attempts: u32,
    pub number: i64,
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    #[serde(default)]
    pub time: Option<Duration>,
}

impl DailyResult {
    pub fn storage_key(date: chrono::NaiveDate) -> String {
        format!("{}{}", DAILY_KEY_PREFIX, iso_date(date))
    }
}
