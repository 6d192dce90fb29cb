//! Budget period command functions.
//!
//! Each function takes an entity snapshot plus inputs and returns the next
//! state for the caller to persist. No hidden side effects, no store access.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use paycycle_shared::types::{BudgetPeriodId, UserId};

use super::error::PeriodError;
use super::types::{BudgetPeriod, PeriodStatus, PeriodTotals};
use super::window::{PeriodWindow, SalaryDay};

/// Builds a new period for `window`.
///
/// Status is decided against `today`: windows fully in the past are created
/// already completed (backfill), windows that have not started yet are
/// projected, everything else is active. Backfilled periods start with zero
/// totals, so their initial carry equals `brought_forward` until a rebuild.
#[must_use]
pub fn new_period(
    user_id: UserId,
    window: PeriodWindow,
    brought_forward: Decimal,
    today: NaiveDate,
) -> BudgetPeriod {
    let (status, ended_at, carried_forward) = if window.end <= today {
        (PeriodStatus::Completed, Some(window.end), brought_forward)
    } else if window.start > today {
        (PeriodStatus::Projected, None, Decimal::ZERO)
    } else {
        (PeriodStatus::Active, None, Decimal::ZERO)
    };

    BudgetPeriod {
        id: BudgetPeriodId::new(),
        user_id,
        started_at: window.start,
        ended_at,
        expected_income: Decimal::ZERO,
        actual_income: Decimal::ZERO,
        total_expenses: Decimal::ZERO,
        total_savings: Decimal::ZERO,
        total_investments: Decimal::ZERO,
        brought_forward,
        carried_forward,
        status,
    }
}

/// Returns the period with recomputed totals applied.
///
/// Totals replacement never touches status or carry: a completed period is
/// not re-opened, and its `carried_forward` stays as-is unless an explicit
/// rebuild recomputes it.
#[must_use]
pub fn with_totals(period: &BudgetPeriod, totals: PeriodTotals) -> BudgetPeriod {
    BudgetPeriod {
        actual_income: totals.income,
        total_expenses: totals.expenses,
        total_savings: totals.savings,
        total_investments: totals.investments,
        ..period.clone()
    }
}

/// Completes a period: fixes `ended_at`, computes the final carry-forward,
/// and marks it completed.
///
/// This is a terminal transition; completing an already-completed period is
/// rejected rather than recomputed.
///
/// # Errors
///
/// Returns `AlreadyCompleted` if the period is completed, or
/// `EndBeforeStart` if the requested end date precedes the start.
pub fn complete(
    period: &BudgetPeriod,
    ended_at: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<BudgetPeriod, PeriodError> {
    if period.status == PeriodStatus::Completed {
        return Err(PeriodError::AlreadyCompleted(period.id));
    }

    let end = ended_at.or(period.ended_at).unwrap_or(today);
    if end < period.started_at {
        return Err(PeriodError::EndBeforeStart {
            ended_at: end,
            started_at: period.started_at,
        });
    }

    Ok(BudgetPeriod {
        ended_at: Some(end),
        carried_forward: period.projected_carry_forward(),
        status: PeriodStatus::Completed,
        ..period.clone()
    })
}

/// Recomputes the carry-forward of an already-completed period.
///
/// Only the bulk rebuild path calls this; `with_totals` deliberately never
/// does it implicitly.
#[must_use]
pub fn recompute_carry(period: &BudgetPeriod) -> BudgetPeriod {
    BudgetPeriod {
        carried_forward: period.projected_carry_forward(),
        ..period.clone()
    }
}

/// Amount a new period inherits from its chronological predecessor.
///
/// A completed predecessor contributes its stored `carried_forward`; a
/// still-open one contributes a projection of what it would carry, without
/// being mutated. No predecessor means nothing to inherit.
#[must_use]
pub fn brought_forward_from(prior: Option<&BudgetPeriod>) -> Decimal {
    match prior {
        None => Decimal::ZERO,
        Some(p) if p.status == PeriodStatus::Completed => p.carried_forward,
        Some(p) => p.projected_carry_forward(),
    }
}

/// Window for the period chained after a completion ending at `ended_at`.
///
/// The salary-day window containing `ended_at` can begin before `ended_at`
/// when the period was completed early; the successor starts at whichever is
/// later, keeping the user's timeline gapless and overlap-free.
#[must_use]
pub fn successor_window(salary_day: SalaryDay, ended_at: NaiveDate) -> PeriodWindow {
    let candidate = PeriodWindow::containing(salary_day, ended_at);
    PeriodWindow {
        start: candidate.start.max(ended_at),
        end: candidate.end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window(start: NaiveDate, end: NaiveDate) -> PeriodWindow {
        PeriodWindow { start, end }
    }

    #[test]
    fn test_new_period_active_when_window_is_current() {
        let w = window(day(2024, 3, 15), day(2024, 4, 15));
        let period = new_period(UserId::new(), w, dec!(100), day(2024, 3, 20));

        assert_eq!(period.status, PeriodStatus::Active);
        assert_eq!(period.ended_at, None);
        assert_eq!(period.brought_forward, dec!(100));
        assert_eq!(period.carried_forward, Decimal::ZERO);
    }

    #[test]
    fn test_new_period_backfill_is_completed() {
        let w = window(day(2023, 11, 15), day(2023, 12, 15));
        let period = new_period(UserId::new(), w, dec!(50), day(2024, 3, 20));

        assert_eq!(period.status, PeriodStatus::Completed);
        assert_eq!(period.ended_at, Some(day(2023, 12, 15)));
        // Zero totals at creation: the backfilled period passes its
        // inheritance straight through until a rebuild corrects it.
        assert_eq!(period.carried_forward, dec!(50));
    }

    #[test]
    fn test_new_period_future_is_projected() {
        let w = window(day(2024, 4, 15), day(2024, 5, 15));
        let period = new_period(UserId::new(), w, Decimal::ZERO, day(2024, 3, 20));

        assert_eq!(period.status, PeriodStatus::Projected);
    }

    #[test]
    fn test_with_totals_replaces_all_four_sums() {
        let w = window(day(2024, 3, 15), day(2024, 4, 15));
        let period = new_period(UserId::new(), w, Decimal::ZERO, day(2024, 3, 20));

        let totals = PeriodTotals {
            income: dec!(3000),
            expenses: dec!(1200),
            savings: dec!(500),
            investments: dec!(300),
        };
        let updated = with_totals(&period, totals);

        assert_eq!(updated.actual_income, dec!(3000));
        assert_eq!(updated.total_expenses, dec!(1200));
        assert_eq!(updated.total_savings, dec!(500));
        assert_eq!(updated.total_investments, dec!(300));
        assert_eq!(updated.status, period.status);
        assert_eq!(updated.carried_forward, period.carried_forward);
    }

    #[test]
    fn test_with_totals_is_idempotent() {
        let w = window(day(2024, 3, 15), day(2024, 4, 15));
        let period = new_period(UserId::new(), w, Decimal::ZERO, day(2024, 3, 20));

        let totals = PeriodTotals {
            income: dec!(1000),
            ..PeriodTotals::default()
        };
        let once = with_totals(&period, totals);
        let twice = with_totals(&once, totals);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_complete_computes_carry_forward() {
        let w = window(day(2024, 3, 15), day(2024, 4, 15));
        let mut period = new_period(UserId::new(), w, Decimal::ZERO, day(2024, 3, 20));
        period = with_totals(
            &period,
            PeriodTotals {
                income: dec!(3000),
                expenses: dec!(1200),
                savings: dec!(500),
                investments: dec!(300),
            },
        );

        let completed = complete(&period, None, day(2024, 4, 15)).unwrap();

        assert_eq!(completed.status, PeriodStatus::Completed);
        assert_eq!(completed.ended_at, Some(day(2024, 4, 15)));
        assert_eq!(completed.carried_forward, dec!(1000));
    }

    #[test]
    fn test_complete_clamps_negative_carry_to_zero() {
        let w = window(day(2024, 3, 15), day(2024, 4, 15));
        let mut period = new_period(UserId::new(), w, Decimal::ZERO, day(2024, 3, 20));
        period = with_totals(
            &period,
            PeriodTotals {
                income: dec!(1000),
                expenses: dec!(2500),
                ..PeriodTotals::default()
            },
        );

        let completed = complete(&period, None, day(2024, 4, 15)).unwrap();
        assert_eq!(completed.carried_forward, Decimal::ZERO);
    }

    #[test]
    fn test_complete_is_not_reenterable() {
        let w = window(day(2024, 3, 15), day(2024, 4, 15));
        let period = new_period(UserId::new(), w, Decimal::ZERO, day(2024, 3, 20));
        let completed = complete(&period, None, day(2024, 4, 15)).unwrap();

        let again = complete(&completed, None, day(2024, 4, 16));
        assert!(matches!(again, Err(PeriodError::AlreadyCompleted(id)) if id == period.id));
    }

    #[test]
    fn test_complete_rejects_end_before_start() {
        let w = window(day(2024, 3, 15), day(2024, 4, 15));
        let period = new_period(UserId::new(), w, Decimal::ZERO, day(2024, 3, 20));

        let result = complete(&period, Some(day(2024, 3, 1)), day(2024, 3, 20));
        assert!(matches!(result, Err(PeriodError::EndBeforeStart { .. })));
    }

    #[test]
    fn test_brought_forward_from_completed_uses_stored_carry() {
        let w = window(day(2024, 2, 15), day(2024, 3, 15));
        let mut prior = new_period(UserId::new(), w, Decimal::ZERO, day(2024, 2, 20));
        prior = with_totals(
            &prior,
            PeriodTotals {
                income: dec!(2000),
                expenses: dec!(1500),
                ..PeriodTotals::default()
            },
        );
        let prior = complete(&prior, None, day(2024, 3, 15)).unwrap();

        assert_eq!(brought_forward_from(Some(&prior)), dec!(500));
    }

    #[test]
    fn test_brought_forward_from_active_is_a_projection() {
        let w = window(day(2024, 3, 15), day(2024, 4, 15));
        let mut prior = new_period(UserId::new(), w, dec!(200), day(2024, 3, 20));
        prior = with_totals(
            &prior,
            PeriodTotals {
                income: dec!(1000),
                expenses: dec!(700),
                ..PeriodTotals::default()
            },
        );

        // Projection only; the prior period itself is untouched.
        assert_eq!(brought_forward_from(Some(&prior)), dec!(500));
        assert_eq!(prior.carried_forward, Decimal::ZERO);
        assert_eq!(prior.status, PeriodStatus::Active);
    }

    #[test]
    fn test_brought_forward_without_predecessor_is_zero() {
        assert_eq!(brought_forward_from(None), Decimal::ZERO);
    }

    #[test]
    fn test_rebuild_cascade_corrects_stale_brought_forward() {
        // P1 completed carrying 200, but P2 was completed with a stale
        // brought_forward of 0. Re-deriving P2 from P1 fixes both fields.
        let w1 = window(day(2024, 1, 15), day(2024, 2, 15));
        let mut p1 = new_period(UserId::new(), w1, Decimal::ZERO, day(2024, 1, 20));
        p1 = with_totals(
            &p1,
            PeriodTotals {
                income: dec!(1000),
                expenses: dec!(800),
                ..PeriodTotals::default()
            },
        );
        let p1 = complete(&p1, None, day(2024, 2, 15)).unwrap();
        assert_eq!(p1.carried_forward, dec!(200));

        let w2 = window(day(2024, 2, 15), day(2024, 3, 15));
        let mut p2 = new_period(p1.user_id, w2, Decimal::ZERO, day(2024, 2, 20));
        p2 = with_totals(
            &p2,
            PeriodTotals {
                income: dec!(1000),
                expenses: dec!(1050),
                ..PeriodTotals::default()
            },
        );
        let mut p2 = complete(&p2, None, day(2024, 3, 15)).unwrap();
        // Overdrawn without the inheritance.
        assert_eq!(p2.carried_forward, Decimal::ZERO);

        p2.brought_forward = brought_forward_from(Some(&p1));
        let p2 = recompute_carry(&p2);
        assert_eq!(p2.brought_forward, dec!(200));
        assert_eq!(p2.carried_forward, dec!(150));
    }

    #[test]
    fn test_successor_window_on_schedule_is_gapless() {
        let salary_day = SalaryDay::new(15).unwrap();
        let successor = successor_window(salary_day, day(2024, 4, 15));

        assert_eq!(successor.start, day(2024, 4, 15));
        assert_eq!(successor.end, day(2024, 5, 15));
    }

    #[test]
    fn test_successor_window_after_early_completion() {
        let salary_day = SalaryDay::new(15).unwrap();
        // Period completed early on March 20; the salary window containing
        // that date starts March 15, but the successor must not reach back
        // into the completed period.
        let successor = successor_window(salary_day, day(2024, 3, 20));

        assert_eq!(successor.start, day(2024, 3, 20));
        assert_eq!(successor.end, day(2024, 4, 15));
    }
}
