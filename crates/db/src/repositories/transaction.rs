//! Transaction repository.
//!
//! Every write goes through the period engine: the transaction's date
//! decides which budget period it belongs to (lazily creating one when
//! needed), and the affected periods' totals are recomputed afterwards.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::info;
use uuid::Uuid;

use paycycle_shared::types::PageRequest;

use super::category::{CategoryError, CategoryRepository};
use super::period::{PeriodError, PeriodRepository};
use crate::entities::{sea_orm_active_enums::TransactionKind, transactions};

/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    NotFound(Uuid),

    /// Category not found.
    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),

    /// Amounts are unsigned magnitudes; negatives are rejected.
    #[error("Amount cannot be negative")]
    NegativeAmount,

    /// Period engine failure.
    #[error(transparent)]
    Period(#[from] PeriodError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// Category the transaction belongs to.
    pub category_id: Uuid,
    /// Unsigned amount; the kind carries the direction.
    pub amount: Decimal,
    /// Transaction classification.
    pub kind: TransactionKind,
    /// Optional description.
    pub description: Option<String>,
    /// Date the money moved.
    pub transacted_at: NaiveDate,
    /// Optional payment method (cash, card, bank_transfer, ...).
    pub payment_method: Option<String>,
    /// Optional free-form notes.
    pub notes: Option<String>,
}

/// Input for updating a transaction.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    /// New category.
    pub category_id: Option<Uuid>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New kind.
    pub kind: Option<TransactionKind>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New date; moving the date may reassign the budget period.
    pub transacted_at: Option<NaiveDate>,
    /// New payment method.
    pub payment_method: Option<Option<String>>,
    /// New notes.
    pub notes: Option<Option<String>>,
}

/// Filter options for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Filter by category.
    pub category_id: Option<Uuid>,
    /// Filter by kind.
    pub kind: Option<TransactionKind>,
    /// Filter by budget period.
    pub budget_period_id: Option<Uuid>,
    /// Inclusive lower date bound.
    pub from: Option<NaiveDate>,
    /// Inclusive upper date bound.
    pub to: Option<NaiveDate>,
}

/// Transaction repository.
#[derive(Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
    periods: PeriodRepository,
    categories: CategoryRepository,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let periods = PeriodRepository::new(db.clone());
        let categories = CategoryRepository::new(db.clone());
        Self {
            db,
            periods,
            categories,
        }
    }

    /// Lists transactions with filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: TransactionFilter,
        page: &PageRequest,
    ) -> Result<(Vec<transactions::Model>, u64), TransactionError> {
        let mut query = transactions::Entity::find().filter(transactions::Column::UserId.eq(user_id));

        if let Some(category_id) = filter.category_id {
            query = query.filter(transactions::Column::CategoryId.eq(category_id));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(transactions::Column::Kind.eq(kind));
        }
        if let Some(period_id) = filter.budget_period_id {
            query = query.filter(transactions::Column::BudgetPeriodId.eq(period_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::TransactedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::TransactedAt.lte(to));
        }

        let total = query.clone().count(&self.db).await?;

        let items = query
            .order_by_desc(transactions::Column::TransactedAt)
            .order_by_desc(transactions::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((items, total))
    }

    /// Gets a transaction owned by the user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such transaction exists for this user.
    pub async fn find(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<transactions::Model, TransactionError> {
        transactions::Entity::find_by_id(transaction_id)
            .filter(transactions::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(TransactionError::NotFound(transaction_id))
    }

    /// Creates a transaction, assigning it to the period containing its date.
    ///
    /// # Errors
    ///
    /// Returns `NegativeAmount` or `CategoryNotFound` on bad input, or a
    /// `Period` error if the engine cannot materialize the period.
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreateTransactionInput,
    ) -> Result<transactions::Model, TransactionError> {
        let created = self.insert_one(user_id, &input).await?;

        self.periods
            .recalculate_totals(created.budget_period_id)
            .await?;

        info!(
            user_id = %user_id,
            transaction_id = %created.id,
            period_id = %created.budget_period_id,
            "Transaction created"
        );

        Ok(created)
    }

    /// Creates several transactions, recomputing each affected period once.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid input; earlier inserts are kept and their
    /// periods recomputed on the next write.
    pub async fn bulk_create(
        &self,
        user_id: Uuid,
        inputs: Vec<CreateTransactionInput>,
    ) -> Result<Vec<transactions::Model>, TransactionError> {
        let mut created = Vec::with_capacity(inputs.len());
        for input in &inputs {
            created.push(self.insert_one(user_id, input).await?);
        }

        let affected: HashSet<Uuid> = created.iter().map(|t| t.budget_period_id).collect();
        for period_id in affected {
            self.periods.recalculate_totals(period_id).await?;
        }

        Ok(created)
    }

    /// Updates a transaction; a date move reassigns its budget period and
    /// recomputes both sides.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing transaction or validation errors for
    /// bad input.
    pub async fn update(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
        input: UpdateTransactionInput,
    ) -> Result<transactions::Model, TransactionError> {
        let existing = self.find(user_id, transaction_id).await?;
        let old_period_id = existing.budget_period_id;

        if let Some(amount) = input.amount {
            if amount < Decimal::ZERO {
                return Err(TransactionError::NegativeAmount);
            }
        }
        if let Some(category_id) = input.category_id {
            self.ensure_category(user_id, category_id).await?;
        }

        let new_period_id = match input.transacted_at {
            Some(date) if date != existing.transacted_at => {
                Some(self.periods.get_or_create_for(user_id, date).await?.id)
            }
            _ => None,
        };

        let mut active: transactions::ActiveModel = existing.into();
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(kind) = input.kind {
            active.kind = Set(kind);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(date) = input.transacted_at {
            active.transacted_at = Set(date);
        }
        if let Some(period_id) = new_period_id {
            active.budget_period_id = Set(period_id);
        }
        if let Some(payment_method) = input.payment_method {
            active.payment_method = Set(payment_method);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(notes);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&self.db).await?;

        self.periods.recalculate_totals(old_period_id).await?;
        if updated.budget_period_id != old_period_id {
            self.periods
                .recalculate_totals(updated.budget_period_id)
                .await?;
        }

        Ok(updated)
    }

    /// Deletes a transaction and recomputes its period.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such transaction exists for this user.
    pub async fn delete(&self, user_id: Uuid, transaction_id: Uuid) -> Result<(), TransactionError> {
        let existing = self.find(user_id, transaction_id).await?;
        let period_id = existing.budget_period_id;

        existing.delete(&self.db).await?;
        self.periods.recalculate_totals(period_id).await?;

        Ok(())
    }

    /// Validates input and inserts a row without recomputing totals.
    async fn insert_one(
        &self,
        user_id: Uuid,
        input: &CreateTransactionInput,
    ) -> Result<transactions::Model, TransactionError> {
        if input.amount < Decimal::ZERO {
            return Err(TransactionError::NegativeAmount);
        }
        self.ensure_category(user_id, input.category_id).await?;

        let period = self
            .periods
            .get_or_create_for(user_id, input.transacted_at)
            .await?;

        let now = Utc::now().into();
        let transaction = transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            budget_period_id: Set(period.id),
            category_id: Set(input.category_id),
            amount: Set(input.amount),
            kind: Set(input.kind),
            description: Set(input.description.clone()),
            transacted_at: Set(input.transacted_at),
            payment_method: Set(input.payment_method.clone()),
            notes: Set(input.notes.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(transaction.insert(&self.db).await?)
    }

    /// Confirms the category exists and belongs to the user.
    async fn ensure_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<(), TransactionError> {
        match self.categories.find(user_id, category_id).await {
            Ok(_) => Ok(()),
            Err(CategoryError::NotFound(id)) => Err(TransactionError::CategoryNotFound(id)),
            Err(CategoryError::Database(e)) => Err(TransactionError::Database(e)),
            Err(CategoryError::Duplicate { .. } | CategoryError::InUse) => {
                Err(TransactionError::CategoryNotFound(category_id))
            }
        }
    }
}
