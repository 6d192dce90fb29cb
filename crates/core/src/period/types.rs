//! Budget period data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use paycycle_shared::types::{BudgetPeriodId, UserId};

/// Transaction classification.
///
/// Amounts are unsigned magnitudes; the kind determines whether a
/// transaction adds to or draws from the period's available money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Money coming in (salary, refunds, gifts).
    Income,
    /// Money spent.
    Expense,
    /// Money set aside in savings.
    Saving,
    /// Money moved into investments.
    Investment,
    /// Manual balance correction.
    Adjustment,
}

/// Budget period lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Period is open and accumulating transactions.
    Active,
    /// Period is closed; `carried_forward` is final.
    Completed,
    /// Future period created ahead of time.
    Projected,
}

/// Per-kind transaction sums for a period.
///
/// Always produced by a full recompute over the period's transactions,
/// never patched incrementally, so applying it twice is a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotals {
    /// Sum of income transactions.
    pub income: Decimal,
    /// Sum of expense transactions.
    pub expenses: Decimal,
    /// Sum of saving transactions.
    pub savings: Decimal,
    /// Sum of investment transactions.
    pub investments: Decimal,
}

impl PeriodTotals {
    /// Builds totals from `(kind, sum)` pairs; unrepresented kinds stay zero.
    #[must_use]
    pub fn from_sums<I>(sums: I) -> Self
    where
        I: IntoIterator<Item = (TransactionKind, Decimal)>,
    {
        let mut totals = Self::default();
        for (kind, amount) in sums {
            match kind {
                TransactionKind::Income => totals.income += amount,
                TransactionKind::Expense => totals.expenses += amount,
                TransactionKind::Saving => totals.savings += amount,
                TransactionKind::Investment => totals.investments += amount,
                // Adjustments are tracked per transaction, not in period totals.
                TransactionKind::Adjustment => {}
            }
        }
        totals
    }
}

/// A budget period snapshot.
///
/// The engine's command functions take a snapshot, compute the next state,
/// and return it for the caller to persist; nothing here talks to a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetPeriod {
    /// Unique identifier.
    pub id: BudgetPeriodId,
    /// Owning user.
    pub user_id: UserId,
    /// First day of the period (inclusive).
    pub started_at: NaiveDate,
    /// First day after the period (exclusive); `None` while the period is open.
    pub ended_at: Option<NaiveDate>,
    /// User-declared income forecast (informational only).
    pub expected_income: Decimal,
    /// Recomputed sum of income transactions.
    pub actual_income: Decimal,
    /// Recomputed sum of expense transactions.
    pub total_expenses: Decimal,
    /// Recomputed sum of saving transactions.
    pub total_savings: Decimal,
    /// Recomputed sum of investment transactions.
    pub total_investments: Decimal,
    /// Balance inherited from the preceding period at creation time.
    pub brought_forward: Decimal,
    /// Balance carried to the next period; final once completed.
    pub carried_forward: Decimal,
    /// Lifecycle status.
    pub status: PeriodStatus,
}

impl BudgetPeriod {
    /// Total money available: income plus the inherited balance.
    #[must_use]
    pub fn available_money(&self) -> Decimal {
        self.actual_income + self.brought_forward
    }

    /// Total money used: expenses plus savings plus investments.
    #[must_use]
    pub fn money_used(&self) -> Decimal {
        self.total_expenses + self.total_savings + self.total_investments
    }

    /// What this period would carry forward if completed right now.
    ///
    /// Never negative: an overdrawn period carries zero, not debt.
    #[must_use]
    pub fn projected_carry_forward(&self) -> Decimal {
        (self.available_money() - self.money_used()).max(Decimal::ZERO)
    }

    /// Returns true if `date` falls inside `[started_at, ended_at)`.
    ///
    /// Open periods (no `ended_at`) contain every date from `started_at` on;
    /// the caller bounds them with the derived window end.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.started_at && self.ended_at.is_none_or(|end| date < end)
    }
}
