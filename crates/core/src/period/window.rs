//! Period window calculation from a user's salary day.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::PeriodError;

/// A user's salary day-of-month, validated to `[1, 31]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SalaryDay(u8);

impl SalaryDay {
    /// Creates a salary day, rejecting values outside `[1, 31]`.
    ///
    /// # Errors
    ///
    /// Returns `PeriodError::InvalidSalaryDay` for 0 or anything above 31.
    pub fn new(day: u8) -> Result<Self, PeriodError> {
        if (1..=31).contains(&day) {
            Ok(Self(day))
        } else {
            Err(PeriodError::InvalidSalaryDay(day))
        }
    }

    /// Returns the day-of-month value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Returns the salary date within the given month.
    ///
    /// Days beyond the month's length clamp to the month's last day, so a
    /// salary day of 31 anchors to Feb 28 (29 in leap years), Apr 30, and so on.
    #[must_use]
    pub fn anchor_in(self, year: i32, month: u32) -> NaiveDate {
        let day = u32::from(self.0).min(days_in_month(year, month));
        NaiveDate::from_ymd_opt(year, month, day)
            .expect("clamped day is always valid for the month")
    }
}

impl TryFrom<i16> for SalaryDay {
    type Error = PeriodError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        let day = u8::try_from(value).map_err(|_| PeriodError::InvalidSalaryDay(0))?;
        Self::new(day)
    }
}

/// A half-open budget period window `[start, end)`.
///
/// `start` is a salary date (possibly clamped) and `end` is the next salary
/// date one calendar month later. The left bound is inclusive, the right
/// bound exclusive: a date equal to `start` belongs to this window, a date
/// equal to `end` belongs to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    /// First day of the window (inclusive).
    pub start: NaiveDate,
    /// First day after the window (exclusive).
    pub end: NaiveDate,
}

impl PeriodWindow {
    /// Computes the window containing `reference`.
    ///
    /// `start` is the most recent salary date on-or-before `reference`,
    /// `end` is the following salary date.
    #[must_use]
    pub fn containing(salary_day: SalaryDay, reference: NaiveDate) -> Self {
        let candidate = salary_day.anchor_in(reference.year(), reference.month());

        let start = if reference >= candidate {
            candidate
        } else {
            let (year, month) = previous_month(reference.year(), reference.month());
            salary_day.anchor_in(year, month)
        };

        let (end_year, end_month) = next_month(start.year(), start.month());
        let end = salary_day.anchor_in(end_year, end_month);

        Self { start, end }
    }

    /// Returns true if `date` falls within this window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    /// Returns the window immediately following this one.
    #[must_use]
    pub fn next(&self, salary_day: SalaryDay) -> Self {
        Self::containing(salary_day, self.end)
    }
}

/// Number of days in the given month.
fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = next_month(year, month);
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(28, |last| last.day())
}

const fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

const fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 { (year - 1, 12) } else { (year, month - 1) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(31, 2024, 2, 29)] // leap February
    #[case(31, 2023, 2, 28)]
    #[case(31, 2024, 4, 30)]
    #[case(30, 2024, 2, 29)]
    #[case(15, 2024, 2, 15)] // no clamping needed
    fn test_anchor_clamps_to_month_length(
        #[case] salary_day: u8,
        #[case] year: i32,
        #[case] month: u32,
        #[case] expected_day: u32,
    ) {
        let anchor = SalaryDay::new(salary_day).unwrap().anchor_in(year, month);
        assert_eq!(anchor.day(), expected_day);
    }

    #[test]
    fn test_salary_day_bounds() {
        assert!(SalaryDay::new(0).is_err());
        assert!(SalaryDay::new(32).is_err());
        assert!(SalaryDay::new(1).is_ok());
        assert!(SalaryDay::new(31).is_ok());
    }

    #[test]
    fn test_window_before_salary_date() {
        let window = PeriodWindow::containing(SalaryDay::new(15).unwrap(), day(2024, 3, 10));
        assert_eq!(window.start, day(2024, 2, 15));
        assert_eq!(window.end, day(2024, 3, 15));
    }

    #[test]
    fn test_window_on_salary_date_is_left_inclusive() {
        let window = PeriodWindow::containing(SalaryDay::new(15).unwrap(), day(2024, 3, 15));
        assert_eq!(window.start, day(2024, 3, 15));
        assert_eq!(window.end, day(2024, 4, 15));
    }

    #[test]
    fn test_window_clamps_to_short_month() {
        let salary_day = SalaryDay::new(31).unwrap();

        let window = PeriodWindow::containing(salary_day, day(2024, 2, 10));
        assert_eq!(window.start, day(2024, 1, 31));
        assert_eq!(window.end, day(2024, 2, 29)); // leap year

        let window = PeriodWindow::containing(salary_day, day(2023, 2, 28));
        assert_eq!(window.start, day(2023, 1, 31));
        assert_eq!(window.end, day(2023, 2, 28));
    }

    #[test]
    fn test_consecutive_windows_are_gapless() {
        let salary_day = SalaryDay::new(31).unwrap();
        let window = PeriodWindow::containing(salary_day, day(2024, 1, 31));
        let next = window.next(salary_day);

        assert_eq!(window.end, next.start);
        assert_eq!(next.end, day(2024, 3, 31));
    }

    #[test]
    fn test_year_boundary() {
        let window = PeriodWindow::containing(SalaryDay::new(25).unwrap(), day(2024, 1, 3));
        assert_eq!(window.start, day(2023, 12, 25));
        assert_eq!(window.end, day(2024, 1, 25));
    }
}
