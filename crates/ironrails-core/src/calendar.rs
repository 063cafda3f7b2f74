use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{SimError, SimResult};

/// Absolute simulation day. Day 0 is 0001-01-01.
pub type Day = u64;

const DAYS_PER_400_YEARS: Day = 146_097;

/// Gregorian calendar date used to time every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeDate {
    year: u32,
    month: u32,
    day: u32,
}

pub fn is_leap_year(year: u32) -> bool {
    year % 400 == 0 || (year % 4 == 0 && year % 100 != 0)
}

pub fn days_in_year(year: u32) -> Day {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// Number of days in `month` of `year`, or 0 for a month outside 1..=12.
pub fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Calendar year that contains the absolute `day`.
pub fn year_of(day: Day) -> u32 {
    TimeDate::from_total_days(day).year
}

fn days_before_year(year: u32) -> Day {
    let y = (year - 1) as Day;
    365 * y + y / 4 - y / 100 + y / 400
}

impl TimeDate {
    pub fn new(year: u32, month: u32, day: u32) -> SimResult<Self> {
        if year == 0 || !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
            return Err(SimError::InvalidDate { year, month, day });
        }
        Ok(Self { year, month, day })
    }

    /// First day of the given year.
    pub fn new_year(year: u32) -> SimResult<Self> {
        Self::new(year, 1, 1)
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Days elapsed since 0001-01-01.
    pub fn total_days(&self) -> Day {
        let mut total = days_before_year(self.year);
        for month in 1..self.month {
            total += days_in_month(self.year, month) as Day;
        }
        total + (self.day - 1) as Day
    }

    pub fn from_total_days(total: Day) -> Self {
        let mut remaining = total % DAYS_PER_400_YEARS;
        let mut year = 1 + (total / DAYS_PER_400_YEARS) as u32 * 400;

        while remaining >= days_in_year(year) {
            remaining -= days_in_year(year);
            year += 1;
        }

        let mut month = 1;
        loop {
            let length = days_in_month(year, month) as Day;
            if remaining < length {
                break;
            }
            remaining -= length;
            month += 1;
        }

        Self {
            year,
            month,
            day: remaining as u32 + 1,
        }
    }

    /// Signed number of days from `self` to `other`.
    pub fn days_until(&self, other: &TimeDate) -> i64 {
        other.total_days() as i64 - self.total_days() as i64
    }

    pub fn add_days(&self, days: Day) -> Self {
        Self::from_total_days(self.total_days() + days)
    }
}

impl fmt::Display for TimeDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_is_day_zero() {
        let epoch = TimeDate::new(1, 1, 1).unwrap();
        assert_eq!(epoch.total_days(), 0);
        assert_eq!(TimeDate::from_total_days(0), epoch);
    }

    #[test]
    fn test_leap_year_february() {
        let feb_2024 = TimeDate::new(2024, 2, 1).unwrap();
        let mar_2024 = TimeDate::new(2024, 3, 1).unwrap();
        assert_eq!(mar_2024.total_days() - feb_2024.total_days(), 29);

        let feb_2023 = TimeDate::new(2023, 2, 1).unwrap();
        let mar_2023 = TimeDate::new(2023, 3, 1).unwrap();
        assert_eq!(mar_2023.total_days() - feb_2023.total_days(), 28);
    }

    #[test]
    fn test_century_leap_rules() {
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(1904));
        assert!(TimeDate::new(1900, 2, 29).is_err());
        assert!(TimeDate::new(2000, 2, 29).is_ok());
    }

    #[test]
    fn test_invalid_dates_rejected() {
        assert!(TimeDate::new(0, 1, 1).is_err());
        assert!(TimeDate::new(1850, 13, 1).is_err());
        assert!(TimeDate::new(1850, 4, 31).is_err());
        assert!(TimeDate::new(1850, 4, 0).is_err());
    }

    #[test]
    fn test_round_trip_across_years() {
        for year in [1, 4, 99, 100, 399, 400, 401, 1600, 1830, 1899, 1900, 2000, 2023, 2024] {
            for month in 1..=12 {
                for day in 1..=days_in_month(year, month) {
                    let date = TimeDate::new(year, month, day).unwrap();
                    assert_eq!(TimeDate::from_total_days(date.total_days()), date);
                }
            }
        }
    }

    #[test]
    fn test_consecutive_days_are_contiguous() {
        let start = TimeDate::new(1899, 12, 30).unwrap().total_days();
        let mut previous = TimeDate::from_total_days(start);
        for offset in 1..800 {
            let next = TimeDate::from_total_days(start + offset);
            assert!(next > previous);
            assert_eq!(previous.days_until(&next), 1);
            previous = next;
        }
    }

    #[test]
    fn test_ordering_and_display() {
        let a = TimeDate::new(1850, 6, 15).unwrap();
        let b = TimeDate::new(1851, 1, 1).unwrap();
        assert!(a < b);
        assert_eq!(a.days_until(&b), 200);
        assert_eq!(b.days_until(&a), -200);
        assert_eq!(a.to_string(), "1850-06-15");
        assert_eq!(year_of(b.total_days()), 1851);
        assert_eq!(a.add_days(200), b);
    }
}
