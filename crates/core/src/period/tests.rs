//! Property-based tests for the period module.

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use paycycle_shared::types::UserId;

use super::engine::{brought_forward_from, complete, new_period, successor_window, with_totals};
use super::types::{PeriodStatus, PeriodTotals};
use super::window::{PeriodWindow, SalaryDay};

prop_compose! {
    fn arb_date()(days in 0i64..=18_262) -> NaiveDate {
        // 2000-01-01 through 2049-12-31
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + chrono::Duration::days(days)
    }
}

prop_compose! {
    fn arb_salary_day()(day in 1u8..=31) -> SalaryDay {
        SalaryDay::new(day).unwrap()
    }
}

proptest! {
    /// The computed window always contains the reference date.
    #[test]
    fn test_window_contains_reference(salary_day in arb_salary_day(), reference in arb_date()) {
        let window = PeriodWindow::containing(salary_day, reference);

        prop_assert!(window.contains(reference));
        prop_assert!(window.start < window.end);
    }

    /// The window start lands on the salary day, or on the month's last day
    /// when the salary day overflows the month.
    #[test]
    fn test_window_start_matches_salary_day(salary_day in arb_salary_day(), reference in arb_date()) {
        let window = PeriodWindow::containing(salary_day, reference);
        let start = window.start;

        let clamped = salary_day.anchor_in(start.year(), start.month());
        prop_assert_eq!(start, clamped);

        if start.day() != u32::from(salary_day.get()) {
            // Clamped: the start must be the last day of its month.
            prop_assert!(start.succ_opt().unwrap().month() != start.month());
        }
    }

    /// Consecutive windows tile the calendar: no gap, no overlap.
    #[test]
    fn test_windows_are_gapless(salary_day in arb_salary_day(), reference in arb_date()) {
        let window = PeriodWindow::containing(salary_day, reference);
        let next = window.next(salary_day);

        prop_assert_eq!(window.end, next.start);
        prop_assert!(!next.contains(reference));
    }

    /// The same date always derives the same window, whether asked for as
    /// "current period" or as the period of an arbitrary transaction date.
    #[test]
    fn test_window_derivation_is_deterministic(salary_day in arb_salary_day(), reference in arb_date()) {
        let a = PeriodWindow::containing(salary_day, reference);
        let b = PeriodWindow::containing(salary_day, reference);
        prop_assert_eq!(a, b);
    }

    /// Carry-forward is never negative, whatever the totals.
    #[test]
    fn test_carry_forward_non_negative(
        income in 0i64..1_000_000,
        expenses in 0i64..1_000_000,
        savings in 0i64..1_000_000,
        investments in 0i64..1_000_000,
        brought in 0i64..1_000_000,
    ) {
        let window = PeriodWindow {
            start: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
        };
        let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();

        let mut period = new_period(UserId::new(), window, Decimal::from(brought), today);
        period = with_totals(&period, PeriodTotals {
            income: Decimal::from(income),
            expenses: Decimal::from(expenses),
            savings: Decimal::from(savings),
            investments: Decimal::from(investments),
        });

        let completed = complete(&period, None, today).unwrap();
        prop_assert!(completed.carried_forward >= Decimal::ZERO);

        // A still-open predecessor projects the same never-negative value.
        prop_assert!(brought_forward_from(Some(&period)) >= Decimal::ZERO);
        prop_assert_eq!(brought_forward_from(Some(&completed)), completed.carried_forward);
    }

    /// A completion's successor window starts exactly where the period ended,
    /// even when the period was cut short mid-window.
    #[test]
    fn test_successor_is_gapless_and_disjoint(salary_day in arb_salary_day(), reference in arb_date()) {
        let window = PeriodWindow::containing(salary_day, reference);

        let mut period = new_period(UserId::new(), window, Decimal::ZERO, reference);
        prop_assert_eq!(period.status, PeriodStatus::Active);
        period = complete(&period, Some(reference), reference).unwrap();

        let ended_at = period.ended_at.unwrap();
        let successor = successor_window(salary_day, ended_at);

        // Gapless: the successor begins the day the period ended.
        prop_assert_eq!(successor.start, ended_at);
        // Disjoint from the completed [started_at, ended_at) and non-empty.
        prop_assert!(successor.start < successor.end);
    }
}
