// src/services/clock.rs
// DOCUMENTATION: Single definition of "now" and "today"
// PURPOSE: Quota resets and cache expiry read time only through this trait

use chrono::{DateTime, Local, NaiveDate};

/// Time source
/// DOCUMENTATION: "today" is the local calendar date (local midnight boundary)
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Manually driven clock for tests
#[cfg(test)]
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Local>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn at(now: DateTime<Local>) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
        }
    }

    /// Noon local time on the given day
    pub fn on(date: NaiveDate) -> Self {
        use chrono::TimeZone;
        let noon = date.and_hms_opt(12, 0, 0).unwrap();
        Self::at(Local.from_local_datetime(&noon).unwrap())
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap()
    }
}
