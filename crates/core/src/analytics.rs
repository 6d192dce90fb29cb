//! Aggregation math for the analytics read layer.
//!
//! Pure decimal arithmetic only; the query side lives in the db crate.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

/// Savings rate as a percentage of income, rounded to two decimals.
///
/// Zero or negative income yields a zero rate rather than a division error.
#[must_use]
pub fn savings_rate(income: Decimal, saved: Decimal) -> Decimal {
    if income <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        (saved / income * Decimal::ONE_HUNDRED).round_dp(2)
    }
}

/// Share of `part` within `total` as a percentage, rounded to two decimals.
#[must_use]
pub fn share_of_total(part: Decimal, total: Decimal) -> Decimal {
    if total <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        (part / total * Decimal::ONE_HUNDRED).round_dp(2)
    }
}

/// Display label for a period, named after the month most of it covers.
///
/// A period starting late in March mostly covers April, so label by the
/// month four weeks past the start date.
#[must_use]
pub fn period_label(started_at: NaiveDate) -> String {
    let mid = started_at + chrono::Duration::days(28);
    format!("{} {}", month_name(mid.month()), mid.year())
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        _ => "December",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_savings_rate() {
        assert_eq!(savings_rate(dec!(3000), dec!(800)), dec!(26.67));
        assert_eq!(savings_rate(dec!(0), dec!(500)), Decimal::ZERO);
        assert_eq!(savings_rate(dec!(-100), dec!(500)), Decimal::ZERO);
    }

    #[test]
    fn test_share_of_total() {
        assert_eq!(share_of_total(dec!(250), dec!(1000)), dec!(25.00));
        assert_eq!(share_of_total(dec!(1), dec!(3)), dec!(33.33));
        assert_eq!(share_of_total(dec!(10), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_period_label_names_the_covered_month() {
        let late_march = NaiveDate::from_ymd_opt(2024, 3, 25).unwrap();
        assert_eq!(period_label(late_march), "April 2024");

        let first_of_june = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(period_label(first_of_june), "June 2024");
    }
}
