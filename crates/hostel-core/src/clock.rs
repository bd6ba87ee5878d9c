//! Clock abstraction
//!
//! All billing-period arithmetic depends on the wall-clock "current month".
//! The engine only ever reads time through this trait so tests can pin
//! "now" deterministically.

use crate::models::BillingPeriod;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use parking_lot::Mutex;

/// Source of the current time for the billing engine
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Current billing period (calendar month)
    fn current_period(&self) -> BillingPeriod {
        BillingPeriod::from_date(self.today())
    }
}

/// Wall-clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Create a clock pinned at midnight UTC of the given date
    pub fn at(date: NaiveDate) -> Self {
        let now = Utc
            .from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default());
        Self {
            now: Mutex::new(now),
        }
    }

    /// Move the clock to a new date
    pub fn set(&self, date: NaiveDate) {
        *self.now.lock() = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default());
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_period() {
        let clock = FixedClock::at(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(clock.current_period().to_string(), "2024-03");

        clock.set(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert_eq!(clock.current_period().to_string(), "2024-04");
    }
}
