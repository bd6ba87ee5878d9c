//! Billing periods
//!
//! A billing period is one calendar month, displayed and stored as
//! `YYYY-MM`. The ledger additionally uses the `ADVANCE` sentinel for
//! credit that is not attached to any period yet.

use chrono::{Datelike, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The sentinel billing-month key for unattached advance credit
pub const ADVANCE_SENTINEL: &str = "ADVANCE";

/// One calendar month a student can owe rent for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BillingPeriod {
    year: i32,
    month: u32,
}

impl BillingPeriod {
    /// Create a period, validating the month number
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The period containing the given date
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the period
    pub fn first_day(&self) -> NaiveDate {
        // Safe: month is validated on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// The following period
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Ordered inclusive sequence of periods from `from` through `to`
    ///
    /// Returns an empty vector when `from > to`. This is the billing-period
    /// generator: given a joining month and the current month it yields
    /// every month the student owes for, current month included.
    pub fn sequence(from: BillingPeriod, to: BillingPeriod) -> Vec<BillingPeriod> {
        let mut periods = Vec::new();
        let mut cursor = from;
        while cursor <= to {
            periods.push(cursor);
            cursor = cursor.next();
        }
        periods
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BillingPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("invalid billing period: {}", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid billing period year: {}", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid billing period month: {}", s))?;
        BillingPeriod::new(year, month).ok_or_else(|| format!("month out of range: {}", s))
    }
}

impl Serialize for BillingPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BillingPeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Ledger key: a concrete billing period or the advance sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BillingMonth {
    /// Unattached advance credit
    Advance,
    /// A concrete calendar month
    Month(BillingPeriod),
}

impl BillingMonth {
    pub fn is_advance(&self) -> bool {
        matches!(self, BillingMonth::Advance)
    }

    /// The concrete period, if any
    pub fn period(&self) -> Option<BillingPeriod> {
        match self {
            BillingMonth::Advance => None,
            BillingMonth::Month(p) => Some(*p),
        }
    }
}

impl From<BillingPeriod> for BillingMonth {
    fn from(period: BillingPeriod) -> Self {
        BillingMonth::Month(period)
    }
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillingMonth::Advance => f.write_str(ADVANCE_SENTINEL),
            BillingMonth::Month(p) => p.fmt(f),
        }
    }
}

impl FromStr for BillingMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ADVANCE_SENTINEL {
            Ok(BillingMonth::Advance)
        } else {
            s.parse::<BillingPeriod>().map(BillingMonth::Month)
        }
    }
}

impl Serialize for BillingMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BillingMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(year: i32, month: u32) -> BillingPeriod {
        BillingPeriod::new(year, month).unwrap()
    }

    #[test]
    fn test_display_and_parse() {
        let p = period(2024, 3);
        assert_eq!(p.to_string(), "2024-03");
        assert_eq!("2024-03".parse::<BillingPeriod>().unwrap(), p);
        assert!("2024-13".parse::<BillingPeriod>().is_err());
        assert!("garbage".parse::<BillingPeriod>().is_err());
    }

    #[test]
    fn test_next_wraps_year() {
        assert_eq!(period(2023, 12).next(), period(2024, 1));
        assert_eq!(period(2024, 5).next(), period(2024, 6));
    }

    #[test]
    fn test_sequence_inclusive() {
        let months = BillingPeriod::sequence(period(2023, 11), period(2024, 2));
        let rendered: Vec<String> = months.iter().map(|m| m.to_string()).collect();
        assert_eq!(rendered, vec!["2023-11", "2023-12", "2024-01", "2024-02"]);
    }

    #[test]
    fn test_sequence_single_and_empty() {
        assert_eq!(
            BillingPeriod::sequence(period(2024, 1), period(2024, 1)),
            vec![period(2024, 1)]
        );
        assert!(BillingPeriod::sequence(period(2024, 2), period(2024, 1)).is_empty());
    }

    #[test]
    fn test_billing_month_sentinel() {
        let advance: BillingMonth = "ADVANCE".parse().unwrap();
        assert!(advance.is_advance());
        assert_eq!(advance.to_string(), "ADVANCE");

        let month: BillingMonth = "2024-07".parse().unwrap();
        assert_eq!(month.period(), Some(period(2024, 7)));
    }

    #[test]
    fn test_ordering() {
        assert!(period(2023, 12) < period(2024, 1));
        assert!(period(2024, 2) > period(2024, 1));
    }
}
