//! Analytics read layer: dashboards, yearly summaries, trends, breakdowns.
//!
//! Read-only aggregation over periods and transactions; no locking beyond
//! the store's normal read consistency.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use paycycle_core::analytics::{period_label, savings_rate, share_of_total};
use paycycle_core::period::{Clock, SystemClock};

use super::period::{PeriodError, PeriodRepository};
use crate::entities::{
    budget_periods, categories, sea_orm_active_enums::TransactionKind, transactions,
};

/// Error types for analytics operations.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// Period engine failure.
    #[error(transparent)]
    Period(#[from] PeriodError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Aggregated amounts for one category.
#[derive(Debug, Clone)]
pub struct CategoryBreakdown {
    /// Category ID.
    pub category_id: Uuid,
    /// Category name.
    pub category_name: String,
    /// Category kind.
    pub kind: TransactionKind,
    /// Summed amount.
    pub amount: Decimal,
    /// Share of the grand total, as a percentage.
    pub percentage: Decimal,
    /// Number of transactions.
    pub transaction_count: u64,
}

/// Dashboard summary for the landing view.
#[derive(Debug, Clone)]
pub struct DashboardSummary {
    /// The period containing today, if materialized.
    pub current_period: Option<budget_periods::Model>,
    /// Accumulated savings and investments minus adjustments, all time.
    pub net_position: Decimal,
    /// Current period income.
    pub this_month_income: Decimal,
    /// Current period expenses.
    pub this_month_expenses: Decimal,
    /// Current period savings plus investments, net of adjustments.
    pub this_month_saved: Decimal,
    /// Saved share of income this period, as a percentage.
    pub savings_rate: Decimal,
    /// All-time income.
    pub all_time_income: Decimal,
    /// All-time expenses.
    pub all_time_expenses: Decimal,
    /// Top expense categories of the current period, largest first.
    pub top_expense_categories: Vec<CategoryBreakdown>,
    /// Most recent transactions, newest first.
    pub recent_transactions: Vec<transactions::Model>,
}

/// One period's totals in a yearly trend line.
#[derive(Debug, Clone)]
pub struct PeriodTrend {
    /// Display label, e.g. "March 2024".
    pub label: String,
    /// Period income.
    pub income: Decimal,
    /// Period expenses.
    pub expenses: Decimal,
    /// Period savings.
    pub savings: Decimal,
    /// Period investments.
    pub investments: Decimal,
    /// Income minus expenses.
    pub net: Decimal,
}

/// Yearly financial summary.
#[derive(Debug, Clone)]
pub struct YearlySummary {
    /// The calendar year.
    pub year: i32,
    /// Summed income across the year's periods.
    pub total_income: Decimal,
    /// Summed expenses.
    pub total_expenses: Decimal,
    /// Summed savings.
    pub total_savings: Decimal,
    /// Summed investments.
    pub total_investments: Decimal,
    /// Savings plus investments.
    pub net_savings: Decimal,
    /// Saved share of income, as a percentage.
    pub savings_rate: Decimal,
    /// Number of periods considered.
    pub periods_count: usize,
    /// Per-period trend line.
    pub period_trends: Vec<PeriodTrend>,
    /// Category totals across the year.
    pub category_breakdown: Vec<CategoryBreakdown>,
}

/// Monthly total for one transaction kind.
#[derive(Debug, Clone)]
pub struct SpendTrend {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
    /// Transaction kind.
    pub kind: TransactionKind,
    /// Summed amount.
    pub amount: Decimal,
}

/// Analytics repository.
#[derive(Clone)]
pub struct AnalyticsRepository {
    db: DatabaseConnection,
    periods: PeriodRepository,
    clock: std::sync::Arc<dyn Clock>,
}

impl AnalyticsRepository {
    /// Creates a new analytics repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let periods = PeriodRepository::new(db.clone());
        Self {
            db,
            periods,
            clock: std::sync::Arc::new(SystemClock),
        }
    }

    /// Builds the dashboard summary for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if any underlying query fails.
    pub async fn dashboard(&self, user_id: Uuid) -> Result<DashboardSummary, AnalyticsError> {
        let current_period = self.periods.current_period(user_id).await?;

        let net_position = self.net_position(user_id).await?;
        let (all_time_income, all_time_expenses) = self.all_time_totals(user_id).await?;

        let (this_month_income, this_month_expenses, this_month_saved) = match &current_period {
            Some(period) => {
                let adjustments = self.sum_adjustments(user_id, Some(period.id)).await?;
                (
                    period.actual_income,
                    period.total_expenses,
                    period.total_savings + period.total_investments - adjustments,
                )
            }
            None => (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
        };

        let top_expense_categories = match &current_period {
            Some(period) => {
                let mut breakdown = self
                    .breakdown_for(user_id, Some(period.id), Some(TransactionKind::Expense))
                    .await?;
                breakdown.truncate(5);
                breakdown
            }
            None => Vec::new(),
        };

        let recent_transactions = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_desc(transactions::Column::TransactedAt)
            .order_by_desc(transactions::Column::CreatedAt)
            .limit(10)
            .all(&self.db)
            .await?;

        Ok(DashboardSummary {
            current_period,
            net_position,
            this_month_income,
            this_month_expenses,
            this_month_saved,
            savings_rate: savings_rate(this_month_income, this_month_saved),
            all_time_income,
            all_time_expenses,
            top_expense_categories,
            recent_transactions,
        })
    }

    /// Builds the yearly summary for a user.
    ///
    /// Periods count toward a year when they are still open or ended inside
    /// it, matching how the period list reads historically.
    ///
    /// # Errors
    ///
    /// Returns an error if any underlying query fails.
    pub async fn yearly_summary(
        &self,
        user_id: Uuid,
        year: i32,
    ) -> Result<YearlySummary, AnalyticsError> {
        let year_start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default();
        let year_end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or_default();

        let periods = budget_periods::Entity::find()
            .filter(budget_periods::Column::UserId.eq(user_id))
            .filter(
                Condition::any()
                    .add(budget_periods::Column::EndedAt.is_null())
                    .add(budget_periods::Column::EndedAt.between(year_start, year_end)),
            )
            .order_by_asc(budget_periods::Column::StartedAt)
            .all(&self.db)
            .await?;

        let mut total_income = Decimal::ZERO;
        let mut total_expenses = Decimal::ZERO;
        let mut total_savings = Decimal::ZERO;
        let mut total_investments = Decimal::ZERO;
        let mut period_trends = Vec::with_capacity(periods.len());

        for period in &periods {
            total_income += period.actual_income;
            total_expenses += period.total_expenses;
            total_savings += period.total_savings;
            total_investments += period.total_investments;

            period_trends.push(PeriodTrend {
                label: period_label(period.started_at),
                income: period.actual_income,
                expenses: period.total_expenses,
                savings: period.total_savings,
                investments: period.total_investments,
                net: period.actual_income - period.total_expenses,
            });
        }

        let net_savings = total_savings + total_investments;
        let category_breakdown = self
            .breakdown_between(user_id, year_start, year_end, None)
            .await?;

        Ok(YearlySummary {
            year,
            total_income,
            total_expenses,
            total_savings,
            total_investments,
            net_savings,
            savings_rate: savings_rate(total_income, net_savings),
            periods_count: periods.len(),
            period_trends,
            category_breakdown,
        })
    }

    /// Monthly totals per kind over the trailing `months` months.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn spending_trends(
        &self,
        user_id: Uuid,
        months: u32,
    ) -> Result<Vec<SpendTrend>, AnalyticsError> {
        let today = self.clock.today();
        let span = chrono::Duration::days(i64::from(months) * 31);
        let from = today - span;

        let rows = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(transactions::Column::TransactedAt.gte(from))
            .filter(transactions::Column::TransactedAt.lte(today))
            .all(&self.db)
            .await?;

        let mut buckets: BTreeMap<(i32, u32, TransactionKind), Decimal> = BTreeMap::new();
        for tx in rows {
            let key = (tx.transacted_at.year(), tx.transacted_at.month(), tx.kind);
            *buckets.entry(key).or_default() += tx.amount;
        }

        Ok(buckets
            .into_iter()
            .map(|((year, month, kind), amount)| SpendTrend {
                year,
                month,
                kind,
                amount,
            })
            .collect())
    }

    /// Category totals for a period (or the current one when unspecified).
    ///
    /// # Errors
    ///
    /// Returns an error if any underlying query fails.
    pub async fn category_breakdown(
        &self,
        user_id: Uuid,
        period_id: Option<Uuid>,
    ) -> Result<Vec<CategoryBreakdown>, AnalyticsError> {
        let period_id = match period_id {
            Some(id) => Some(id),
            None => self.periods.current_period(user_id).await?.map(|p| p.id),
        };

        let Some(period_id) = period_id else {
            return Ok(Vec::new());
        };

        self.breakdown_for(user_id, Some(period_id), None).await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Accumulated savings and investments minus adjustments, over all periods.
    async fn net_position(&self, user_id: Uuid) -> Result<Decimal, AnalyticsError> {
        let periods = budget_periods::Entity::find()
            .filter(budget_periods::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;

        let saved: Decimal = periods
            .iter()
            .map(|p| p.total_savings + p.total_investments)
            .sum();

        let adjustments = self.sum_adjustments(user_id, None).await?;
        Ok(saved - adjustments)
    }

    /// Sum of adjustment transactions, optionally scoped to one period.
    async fn sum_adjustments(
        &self,
        user_id: Uuid,
        period_id: Option<Uuid>,
    ) -> Result<Decimal, AnalyticsError> {
        let mut query = transactions::Entity::find()
            .select_only()
            .column_as(transactions::Column::Amount.sum(), "total")
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(transactions::Column::Kind.eq(TransactionKind::Adjustment));

        if let Some(period_id) = period_id {
            query = query.filter(transactions::Column::BudgetPeriodId.eq(period_id));
        }

        let total: Option<Option<Decimal>> = query.into_tuple().one(&self.db).await?;
        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }

    /// All-time income and expense sums.
    async fn all_time_totals(&self, user_id: Uuid) -> Result<(Decimal, Decimal), AnalyticsError> {
        let sums: Vec<(TransactionKind, Decimal)> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::Kind)
            .column_as(transactions::Column::Amount.sum(), "total")
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(
                transactions::Column::Kind
                    .is_in([TransactionKind::Income, TransactionKind::Expense]),
            )
            .group_by(transactions::Column::Kind)
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut income = Decimal::ZERO;
        let mut expenses = Decimal::ZERO;
        for (kind, total) in sums {
            match kind {
                TransactionKind::Income => income = total,
                TransactionKind::Expense => expenses = total,
                _ => {}
            }
        }

        Ok((income, expenses))
    }

    /// Category aggregation over one period.
    async fn breakdown_for(
        &self,
        user_id: Uuid,
        period_id: Option<Uuid>,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<CategoryBreakdown>, AnalyticsError> {
        let mut query = transactions::Entity::find().filter(transactions::Column::UserId.eq(user_id));
        if let Some(period_id) = period_id {
            query = query.filter(transactions::Column::BudgetPeriodId.eq(period_id));
        }
        if let Some(kind) = kind {
            query = query.filter(transactions::Column::Kind.eq(kind));
        }

        let rows = query.all(&self.db).await?;
        self.aggregate_by_category(user_id, rows).await
    }

    /// Category aggregation over a date range.
    async fn breakdown_between(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<CategoryBreakdown>, AnalyticsError> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(transactions::Column::TransactedAt.gte(from))
            .filter(transactions::Column::TransactedAt.lte(to));
        if let Some(kind) = kind {
            query = query.filter(transactions::Column::Kind.eq(kind));
        }

        let rows = query.all(&self.db).await?;
        self.aggregate_by_category(user_id, rows).await
    }

    /// Groups transactions by category with shares of the grand total.
    async fn aggregate_by_category(
        &self,
        user_id: Uuid,
        rows: Vec<transactions::Model>,
    ) -> Result<Vec<CategoryBreakdown>, AnalyticsError> {
        let mut amounts: HashMap<Uuid, (Decimal, u64)> = HashMap::new();
        for tx in &rows {
            let entry = amounts.entry(tx.category_id).or_default();
            entry.0 += tx.amount;
            entry.1 += 1;
        }

        let category_info: HashMap<Uuid, (String, TransactionKind)> = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, (c.name, c.kind)))
            .collect();

        let grand_total: Decimal = amounts.values().map(|(amount, _)| *amount).sum();

        let mut breakdown: Vec<CategoryBreakdown> = amounts
            .into_iter()
            .map(|(category_id, (amount, transaction_count))| {
                let (category_name, kind) = category_info
                    .get(&category_id)
                    .cloned()
                    .unwrap_or_else(|| (String::new(), TransactionKind::Expense));
                CategoryBreakdown {
                    category_id,
                    category_name,
                    kind,
                    amount,
                    percentage: share_of_total(amount, grand_total),
                    transaction_count,
                }
            })
            .collect();

        breakdown.sort_by(|a, b| b.amount.cmp(&a.amount));
        Ok(breakdown)
    }
}
