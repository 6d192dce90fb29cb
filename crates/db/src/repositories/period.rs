//! Budget period repository: the persistence half of the period engine.
//!
//! All window math and state transitions are pure functions in
//! `paycycle_core::period`; this repository loads snapshots, runs the
//! command functions, and persists the returned state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use tracing::{info, warn};
use uuid::Uuid;

use paycycle_core::period::{
    self as engine, BudgetPeriod as PeriodSnapshot, Clock, PeriodError as DomainError,
    PeriodTotals, PeriodWindow, SalaryDay, SystemClock,
};
use paycycle_shared::types::{BudgetPeriodId, PageRequest, UserId};

use crate::entities::{
    budget_periods, categories,
    sea_orm_active_enums::{PeriodStatus, TransactionKind},
    transactions, users,
};

/// Error types for budget period operations.
#[derive(Debug, thiserror::Error)]
pub enum PeriodError {
    /// Budget period not found.
    #[error("Budget period not found: {0}")]
    NotFound(Uuid),

    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Requested window overlaps an existing period.
    #[error("Budget period overlaps an existing period starting {0}")]
    Overlap(NaiveDate),

    /// Domain rule violation (invalid salary day, re-completion, bad dates).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for explicitly creating a budget period.
#[derive(Debug, Clone)]
pub struct CreatePeriodInput {
    /// First day of the period.
    pub started_at: NaiveDate,
    /// Optional end; derived from the salary window when absent.
    pub ended_at: Option<NaiveDate>,
    /// Optional income forecast.
    pub expected_income: Option<Decimal>,
    /// Optional explicit inheritance; computed from the predecessor when absent.
    pub brought_forward: Option<Decimal>,
}

/// Input for updating a budget period.
#[derive(Debug, Clone, Default)]
pub struct UpdatePeriodInput {
    /// New income forecast.
    pub expected_income: Option<Decimal>,
}

/// Filter options for listing periods.
#[derive(Debug, Clone, Default)]
pub struct PeriodFilter {
    /// Filter by lifecycle status.
    pub status: Option<PeriodStatus>,
}

/// Expense total for one category within a period.
#[derive(Debug, Clone)]
pub struct CategoryExpense {
    /// Category ID.
    pub category_id: Uuid,
    /// Category name.
    pub name: String,
    /// Summed expense amount.
    pub total: Decimal,
}

/// Period with its summary breakdown.
#[derive(Debug, Clone)]
pub struct PeriodSummary {
    /// The period record.
    pub period: budget_periods::Model,
    /// Expenses grouped by category.
    pub expense_by_category: Vec<CategoryExpense>,
    /// Largest expenses first, at most five.
    pub top_expenses: Vec<transactions::Model>,
}

/// Outcome of rebuilding a single period.
#[derive(Debug)]
pub struct RebuildOutcome {
    /// The period that was processed.
    pub period_id: Uuid,
    /// The rebuilt period, or why it failed.
    pub result: Result<budget_periods::Model, PeriodError>,
}

/// Budget period repository.
#[derive(Clone)]
pub struct PeriodRepository {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl PeriodRepository {
    /// Creates a repository backed by the system clock.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    /// Creates a repository with an injected clock.
    #[must_use]
    pub fn with_clock(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Lists a user's periods, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_periods(
        &self,
        user_id: Uuid,
        filter: PeriodFilter,
        page: &PageRequest,
    ) -> Result<(Vec<budget_periods::Model>, u64), PeriodError> {
        let mut query =
            budget_periods::Entity::find().filter(budget_periods::Column::UserId.eq(user_id));

        if let Some(status) = filter.status {
            query = query.filter(budget_periods::Column::Status.eq(status));
        }

        let total = query.clone().count(&self.db).await?;

        let periods = query
            .order_by_desc(budget_periods::Column::StartedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((periods, total))
    }

    /// Gets a period owned by the user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such period exists for this user.
    pub async fn find_period(
        &self,
        user_id: Uuid,
        period_id: Uuid,
    ) -> Result<budget_periods::Model, PeriodError> {
        budget_periods::Entity::find_by_id(period_id)
            .filter(budget_periods::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(PeriodError::NotFound(period_id))
    }

    /// Returns the period containing today, if one exists. No side effects.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the user does not exist.
    pub async fn current_period(
        &self,
        user_id: Uuid,
    ) -> Result<Option<budget_periods::Model>, PeriodError> {
        let salary_day = self.salary_day_of(user_id).await?;
        self.find_containing(salary_day, user_id, self.clock.today())
            .await
    }

    /// Finds the period whose window contains `date`, if any.
    ///
    /// The window of an open period (null `ended_at`) is bounded by the end
    /// derived from the user's salary day, so an old active period does not
    /// swallow dates past its scheduled end.
    async fn find_containing(
        &self,
        salary_day: SalaryDay,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<budget_periods::Model>, PeriodError> {
        let candidate = budget_periods::Entity::find()
            .filter(budget_periods::Column::UserId.eq(user_id))
            .filter(budget_periods::Column::StartedAt.lte(date))
            .order_by_desc(budget_periods::Column::StartedAt)
            .one(&self.db)
            .await?;

        Ok(candidate.filter(|p| {
            let end = p
                .ended_at
                .unwrap_or_else(|| PeriodWindow::containing(salary_day, p.started_at).end);
            date < end
        }))
    }

    // ========================================================================
    // Lazy creation
    // ========================================================================

    /// Gets the period containing `date`, creating it if absent.
    ///
    /// Creation inherits `brought_forward` from the chronologically nearest
    /// prior period. Two concurrent calls for the same window race on the
    /// `(user_id, started_at)` unique constraint; the loser re-runs the
    /// lookup and returns the winner's row.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` for an unknown user, or `Domain` if the user's
    /// stored salary day violates the 1-31 contract.
    pub async fn get_or_create_for(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<budget_periods::Model, PeriodError> {
        let salary_day = self.salary_day_of(user_id).await?;

        if let Some(existing) = self.find_containing(salary_day, user_id, date).await? {
            return Ok(existing);
        }

        let window = PeriodWindow::containing(salary_day, date);
        let brought_forward = self.brought_forward_before(user_id, window.start).await?;
        let snapshot = engine::new_period(
            UserId::from_uuid(user_id),
            window,
            brought_forward,
            self.clock.today(),
        );

        match self.insert_snapshot(&snapshot, Decimal::ZERO).await {
            Ok(created) => {
                info!(
                    user_id = %user_id,
                    period_id = %created.id,
                    started_at = %created.started_at,
                    "Budget period created lazily"
                );
                Ok(created)
            }
            Err(e) if is_unique_violation(&e) => {
                // Lost the creation race; the winner's period now contains the date.
                warn!(user_id = %user_id, date = %date, "Period creation race lost, retrying lookup");
                self.find_containing(salary_day, user_id, date)
                    .await?
                    .ok_or(PeriodError::Overlap(window.start))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Explicitly creates a period for the given window.
    ///
    /// # Errors
    ///
    /// Returns `Overlap` if the window intersects an existing period.
    pub async fn create_period(
        &self,
        user_id: Uuid,
        input: CreatePeriodInput,
    ) -> Result<budget_periods::Model, PeriodError> {
        let salary_day = self.salary_day_of(user_id).await?;

        let end = input
            .ended_at
            .unwrap_or_else(|| PeriodWindow::containing(salary_day, input.started_at).end);
        let window = PeriodWindow {
            start: input.started_at,
            end,
        };

        if self.overlaps(salary_day, user_id, window).await? {
            return Err(PeriodError::Overlap(window.start));
        }

        let brought_forward = match input.brought_forward {
            Some(amount) => amount,
            None => self.brought_forward_before(user_id, window.start).await?,
        };

        let mut snapshot = engine::new_period(
            UserId::from_uuid(user_id),
            window,
            brought_forward,
            self.clock.today(),
        );
        snapshot.expected_income = input.expected_income.unwrap_or(Decimal::ZERO);

        match self
            .insert_snapshot(&snapshot, snapshot.expected_income)
            .await
        {
            Ok(created) => Ok(created),
            Err(e) if is_unique_violation(&e) => Err(PeriodError::Overlap(window.start)),
            Err(e) => Err(e.into()),
        }
    }

    /// Updates a period's forecast fields.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such period exists for this user.
    pub async fn update_period(
        &self,
        user_id: Uuid,
        period_id: Uuid,
        input: UpdatePeriodInput,
    ) -> Result<budget_periods::Model, PeriodError> {
        let period = self.find_period(user_id, period_id).await?;

        let mut active: budget_periods::ActiveModel = period.into();
        if let Some(expected_income) = input.expected_income {
            active.expected_income = Set(expected_income);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    // ========================================================================
    // Totals aggregation
    // ========================================================================

    /// Recomputes the period's per-kind totals from its transactions.
    ///
    /// Full recompute, never incremental, so redundant calls are harmless.
    /// A completed period keeps its status and its stored `carried_forward`;
    /// only the explicit rebuild path re-derives the carry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the period does not exist.
    pub async fn recalculate_totals(
        &self,
        period_id: Uuid,
    ) -> Result<budget_periods::Model, PeriodError> {
        let period = budget_periods::Entity::find_by_id(period_id)
            .one(&self.db)
            .await?
            .ok_or(PeriodError::NotFound(period_id))?;

        let totals = self.compute_totals(period_id).await?;
        let updated = engine::with_totals(&snapshot(&period), totals);

        let mut active: budget_periods::ActiveModel = period.into();
        active.actual_income = Set(updated.actual_income);
        active.total_expenses = Set(updated.total_expenses);
        active.total_savings = Set(updated.total_savings);
        active.total_investments = Set(updated.total_investments);
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Sums the period's transactions grouped by kind.
    async fn compute_totals(&self, period_id: Uuid) -> Result<PeriodTotals, PeriodError> {
        let sums: Vec<(TransactionKind, Decimal)> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::Kind)
            .column_as(transactions::Column::Amount.sum(), "total")
            .filter(transactions::Column::BudgetPeriodId.eq(period_id))
            .group_by(transactions::Column::Kind)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(PeriodTotals::from_sums(
            sums.into_iter().map(|(kind, total)| (kind.into(), total)),
        ))
    }

    // ========================================================================
    // Completion and chaining
    // ========================================================================

    /// Completes a period and chains the next one.
    ///
    /// Sets `ended_at` (given, or today), computes the final carry-forward,
    /// and marks the period completed. If the period ends on-or-before today
    /// and nothing covers the following window yet, the successor period is
    /// created with `brought_forward` equal to this period's carry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing period and `Domain` for
    /// re-completion or an end date before the start.
    pub async fn complete_period(
        &self,
        user_id: Uuid,
        period_id: Uuid,
        ended_at: Option<NaiveDate>,
    ) -> Result<budget_periods::Model, PeriodError> {
        let salary_day = self.salary_day_of(user_id).await?;
        let period = self.find_period(user_id, period_id).await?;

        let completed = engine::complete(&snapshot(&period), ended_at, self.clock.today())?;

        let mut active: budget_periods::ActiveModel = period.into();
        active.ended_at = Set(completed.ended_at);
        active.carried_forward = Set(completed.carried_forward);
        active.status = Set(completed.status.into());
        active.updated_at = Set(Utc::now().into());
        let persisted = active.update(&self.db).await?;

        info!(
            user_id = %user_id,
            period_id = %period_id,
            carried_forward = %completed.carried_forward,
            "Budget period completed"
        );

        if let Some(end) = completed.ended_at {
            if end <= self.clock.today() {
                self.chain_successor(salary_day, &completed, end).await?;
            }
        }

        Ok(persisted)
    }

    /// Creates the period immediately following a completion, if absent.
    async fn chain_successor(
        &self,
        salary_day: SalaryDay,
        completed: &PeriodSnapshot,
        ended_at: NaiveDate,
    ) -> Result<(), PeriodError> {
        let window = engine::successor_window(salary_day, ended_at);

        if self
            .find_containing(salary_day, completed.user_id.into_inner(), window.start)
            .await?
            .is_some()
        {
            return Ok(());
        }

        let successor = PeriodSnapshot {
            id: BudgetPeriodId::new(),
            user_id: completed.user_id,
            started_at: window.start,
            ended_at: None,
            expected_income: Decimal::ZERO,
            actual_income: Decimal::ZERO,
            total_expenses: Decimal::ZERO,
            total_savings: Decimal::ZERO,
            total_investments: Decimal::ZERO,
            brought_forward: completed.carried_forward,
            carried_forward: Decimal::ZERO,
            status: paycycle_core::period::PeriodStatus::Active,
        };

        match self.insert_snapshot(&successor, Decimal::ZERO).await {
            Ok(created) => {
                info!(
                    user_id = %completed.user_id,
                    period_id = %created.id,
                    brought_forward = %created.brought_forward,
                    "Successor period created"
                );
                Ok(())
            }
            // Someone else chained it first; chaining is idempotent.
            Err(e) if is_unique_violation(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // ========================================================================
    // Bulk rebuild
    // ========================================================================

    /// Rebuilds periods in chronological order, correcting historical drift.
    ///
    /// For every period (all of the user's, or the given subset) this
    /// re-derives `brought_forward` from the freshly rebuilt predecessor,
    /// recomputes totals, and for completed periods re-derives
    /// `carried_forward`. Failures are collected per period; one bad period
    /// never aborts the batch.
    ///
    /// # Errors
    ///
    /// Returns an error only if the initial period load fails.
    pub async fn rebuild(
        &self,
        user_id: Uuid,
        period_ids: Option<Vec<Uuid>>,
    ) -> Result<Vec<RebuildOutcome>, PeriodError> {
        let mut query =
            budget_periods::Entity::find().filter(budget_periods::Column::UserId.eq(user_id));

        if let Some(ids) = period_ids {
            query = query.filter(budget_periods::Column::Id.is_in(ids));
        }

        // Carry corrections cascade forward, so predecessors must be
        // rebuilt before their successors.
        let periods = query
            .order_by_asc(budget_periods::Column::StartedAt)
            .all(&self.db)
            .await?;

        let mut outcomes = Vec::with_capacity(periods.len());
        for period in periods {
            let period_id = period.id;
            let result = self.rebuild_one(period).await;
            if let Err(e) = &result {
                warn!(period_id = %period_id, error = %e, "Period rebuild failed");
            }
            outcomes.push(RebuildOutcome { period_id, result });
        }

        Ok(outcomes)
    }

    /// Rebuilds a single period from its transactions and predecessor.
    async fn rebuild_one(
        &self,
        period: budget_periods::Model,
    ) -> Result<budget_periods::Model, PeriodError> {
        let brought_forward = self
            .brought_forward_before(period.user_id, period.started_at)
            .await?;
        let totals = self.compute_totals(period.id).await?;

        let mut rebuilt = engine::with_totals(&snapshot(&period), totals);
        rebuilt.brought_forward = brought_forward;
        if rebuilt.status == paycycle_core::period::PeriodStatus::Completed {
            rebuilt = engine::recompute_carry(&rebuilt);
        }

        let mut active: budget_periods::ActiveModel = period.into();
        active.brought_forward = Set(rebuilt.brought_forward);
        active.actual_income = Set(rebuilt.actual_income);
        active.total_expenses = Set(rebuilt.total_expenses);
        active.total_savings = Set(rebuilt.total_savings);
        active.total_investments = Set(rebuilt.total_investments);
        active.carried_forward = Set(rebuilt.carried_forward);
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    // ========================================================================
    // Summaries
    // ========================================================================

    /// Gets a period together with its expense breakdown.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such period exists for this user.
    pub async fn period_summary(
        &self,
        user_id: Uuid,
        period_id: Uuid,
    ) -> Result<PeriodSummary, PeriodError> {
        let period = self.find_period(user_id, period_id).await?;

        let mut expenses = transactions::Entity::find()
            .filter(transactions::Column::BudgetPeriodId.eq(period_id))
            .filter(transactions::Column::Kind.eq(TransactionKind::Expense))
            .all(&self.db)
            .await?;

        let mut totals_by_category: HashMap<Uuid, Decimal> = HashMap::new();
        for tx in &expenses {
            *totals_by_category.entry(tx.category_id).or_default() += tx.amount;
        }

        let category_names: HashMap<Uuid, String> = categories::Entity::find()
            .filter(categories::Column::Id.is_in(totals_by_category.keys().copied()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let mut expense_by_category: Vec<CategoryExpense> = totals_by_category
            .into_iter()
            .map(|(category_id, total)| CategoryExpense {
                category_id,
                name: category_names
                    .get(&category_id)
                    .cloned()
                    .unwrap_or_default(),
                total,
            })
            .collect();
        expense_by_category.sort_by(|a, b| b.total.cmp(&a.total));

        expenses.sort_by(|a, b| b.amount.cmp(&a.amount));
        expenses.truncate(5);

        Ok(PeriodSummary {
            period,
            expense_by_category,
            top_expenses: expenses,
        })
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Loads and validates the user's salary day.
    async fn salary_day_of(&self, user_id: Uuid) -> Result<SalaryDay, PeriodError> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(PeriodError::UserNotFound(user_id))?;

        Ok(SalaryDay::try_from(user.salary_day)?)
    }

    /// Inheritance from the chronologically nearest period before `start`.
    async fn brought_forward_before(
        &self,
        user_id: Uuid,
        start: NaiveDate,
    ) -> Result<Decimal, PeriodError> {
        let prior = budget_periods::Entity::find()
            .filter(budget_periods::Column::UserId.eq(user_id))
            .filter(budget_periods::Column::StartedAt.lt(start))
            .order_by_desc(budget_periods::Column::StartedAt)
            .one(&self.db)
            .await?;

        Ok(engine::brought_forward_from(
            prior.map(|p| snapshot(&p)).as_ref(),
        ))
    }

    /// True if any stored period intersects `window`.
    async fn overlaps(
        &self,
        salary_day: SalaryDay,
        user_id: Uuid,
        window: PeriodWindow,
    ) -> Result<bool, PeriodError> {
        if self
            .find_containing(salary_day, user_id, window.start)
            .await?
            .is_some()
        {
            return Ok(true);
        }

        let starts_inside = budget_periods::Entity::find()
            .filter(budget_periods::Column::UserId.eq(user_id))
            .filter(budget_periods::Column::StartedAt.gte(window.start))
            .filter(budget_periods::Column::StartedAt.lt(window.end))
            .count(&self.db)
            .await?;

        Ok(starts_inside > 0)
    }

    /// Inserts a period snapshot as a new row.
    async fn insert_snapshot(
        &self,
        period: &PeriodSnapshot,
        expected_income: Decimal,
    ) -> Result<budget_periods::Model, DbErr> {
        let now = Utc::now().into();
        budget_periods::ActiveModel {
            id: Set(period.id.into_inner()),
            user_id: Set(period.user_id.into_inner()),
            started_at: Set(period.started_at),
            ended_at: Set(period.ended_at),
            expected_income: Set(expected_income),
            actual_income: Set(period.actual_income),
            total_expenses: Set(period.total_expenses),
            total_savings: Set(period.total_savings),
            total_investments: Set(period.total_investments),
            brought_forward: Set(period.brought_forward),
            carried_forward: Set(period.carried_forward),
            status: Set(period.status.into()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
    }
}

/// Converts a stored row into a domain snapshot for the command functions.
fn snapshot(model: &budget_periods::Model) -> PeriodSnapshot {
    PeriodSnapshot {
        id: BudgetPeriodId::from_uuid(model.id),
        user_id: UserId::from_uuid(model.user_id),
        started_at: model.started_at,
        ended_at: model.ended_at,
        expected_income: model.expected_income,
        actual_income: model.actual_income,
        total_expenses: model.total_expenses,
        total_savings: model.total_savings,
        total_investments: model.total_investments,
        brought_forward: model.brought_forward,
        carried_forward: model.carried_forward,
        status: model.status.into(),
    }
}

/// True if the error is a unique-constraint violation (creation race lost).
fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
