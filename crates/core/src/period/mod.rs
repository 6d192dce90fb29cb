//! Salary-day anchored budget periods.
//!
//! A budget period is the half-open window between two consecutive salary
//! dates. Unspent money rolls forward: when a period completes, its leftover
//! balance becomes the next period's `brought_forward`.

pub mod clock;
pub mod engine;
pub mod error;
pub mod types;
pub mod window;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{
    brought_forward_from, complete, new_period, recompute_carry, successor_window, with_totals,
};
pub use error::PeriodError;
pub use types::{BudgetPeriod, PeriodStatus, PeriodTotals, TransactionKind};
pub use window::{PeriodWindow, SalaryDay};

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
