use chrono::NaiveDate;

pub trait Capitalize {
    fn capitalize(&self) -> String;
}

impl Capitalize for str {
    fn capitalize(&self) -> String {
        let mut chars = self.chars();
        match chars.next() {
            Some(first) => {
                first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
            }
            None => String::new(),
        }
    }
}

/// `YYYY-MM-DD`, the form used for daily storage keys and the daily seed
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Seconds left until `deadline`, rounded up so a countdown reads 30, 29, ... 1
pub fn seconds_until(deadline: std::time::SystemTime, now: std::time::SystemTime) -> u64 {
    match deadline.duration_since(now) {
        Ok(remaining) => {
            let millis = remaining.as_millis() as u64;
            millis.div_ceil(1000)
        }
        Err(_) => 0,
    }
}
