//! Category repository for transaction categorization.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{categories, sea_orm_active_enums::TransactionKind, transactions};

/// Error types for category operations.
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    /// Category not found.
    #[error("Category not found: {0}")]
    NotFound(Uuid),

    /// Category with this name and kind already exists.
    #[error("Category '{name}' of kind {kind:?} already exists")]
    Duplicate {
        /// Category name.
        name: String,
        /// Category kind.
        kind: TransactionKind,
    },

    /// Category still referenced by transactions.
    #[error("Cannot delete category that is being used by transactions")]
    InUse,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    /// Category name.
    pub name: String,
    /// Category kind.
    pub kind: TransactionKind,
    /// Optional hex color.
    pub color: Option<String>,
    /// Optional icon name.
    pub icon: Option<String>,
}

/// Input for updating a category.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    /// New name.
    pub name: Option<String>,
    /// New hex color.
    pub color: Option<Option<String>>,
    /// New icon name.
    pub icon: Option<Option<String>>,
}

/// Category repository.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists a user's categories, optionally filtered by kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: Uuid,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<categories::Model>, CategoryError> {
        let mut query = categories::Entity::find().filter(categories::Column::UserId.eq(user_id));

        if let Some(kind) = kind {
            query = query.filter(categories::Column::Kind.eq(kind));
        }

        Ok(query
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Gets a category owned by the user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such category exists for this user.
    pub async fn find(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<categories::Model, CategoryError> {
        categories::Entity::find_by_id(category_id)
            .filter(categories::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(CategoryError::NotFound(category_id))
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if the user already has a category with this
    /// name and kind.
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreateCategoryInput,
    ) -> Result<categories::Model, CategoryError> {
        let existing = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::Name.eq(&input.name))
            .filter(categories::Column::Kind.eq(input.kind))
            .one(&self.db)
            .await?;

        if existing.is_some() {
            return Err(CategoryError::Duplicate {
                name: input.name,
                kind: input.kind,
            });
        }

        let category = categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(input.name),
            kind: Set(input.kind),
            color: Set(input.color),
            icon: Set(input.icon),
            is_default: Set(false),
            created_at: Set(Utc::now().into()),
        };

        Ok(category.insert(&self.db).await?)
    }

    /// Updates a category.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing category and `Duplicate` on a name
    /// collision within the same kind.
    pub async fn update(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<categories::Model, CategoryError> {
        let category = self.find(user_id, category_id).await?;

        if let Some(name) = &input.name {
            if *name != category.name {
                let clash = categories::Entity::find()
                    .filter(categories::Column::UserId.eq(user_id))
                    .filter(categories::Column::Name.eq(name))
                    .filter(categories::Column::Kind.eq(category.kind))
                    .one(&self.db)
                    .await?;
                if clash.is_some() {
                    return Err(CategoryError::Duplicate {
                        name: name.clone(),
                        kind: category.kind,
                    });
                }
            }
        }

        let mut active: categories::ActiveModel = category.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(color) = input.color {
            active.color = Set(color);
        }
        if let Some(icon) = input.icon {
            active.icon = Set(icon);
        }

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a category that no transaction references.
    ///
    /// # Errors
    ///
    /// Returns `InUse` if any transaction still points at the category.
    pub async fn delete(&self, user_id: Uuid, category_id: Uuid) -> Result<(), CategoryError> {
        let category = self.find(user_id, category_id).await?;

        let referenced = transactions::Entity::find()
            .filter(transactions::Column::CategoryId.eq(category.id))
            .count(&self.db)
            .await?;

        if referenced > 0 {
            return Err(CategoryError::InUse);
        }

        categories::Entity::delete_by_id(category.id)
            .exec(&self.db)
            .await?;

        Ok(())
    }
}
