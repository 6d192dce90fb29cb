//! Budget period error types.

use thiserror::Error;

use paycycle_shared::types::BudgetPeriodId;

/// Budget period errors.
#[derive(Debug, Error)]
pub enum PeriodError {
    /// Salary day outside the 1-31 contract.
    #[error("Salary day must be between 1 and 31, got {0}")]
    InvalidSalaryDay(u8),

    /// Completion requested on an already-completed period.
    #[error("Budget period is already completed: {0}")]
    AlreadyCompleted(BudgetPeriodId),

    /// Completion end date precedes the period start.
    #[error("End date {ended_at} is before period start {started_at}")]
    EndBeforeStart {
        /// Requested end date.
        ended_at: chrono::NaiveDate,
        /// Period start date.
        started_at: chrono::NaiveDate,
    },
}
