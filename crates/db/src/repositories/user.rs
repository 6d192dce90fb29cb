//! User repository for account and settings operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
};
use tracing::info;
use uuid::Uuid;

use paycycle_core::period::SalaryDay;

use crate::entities::users;

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// User not found.
    #[error("User not found: {0}")]
    NotFound(Uuid),

    /// Email already registered.
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// Salary day outside the 1-31 contract.
    #[error("Salary day must be between 1 and 31, got {0}")]
    InvalidSalaryDay(i16),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Identity handed over by the OAuth gateway after a successful dance.
#[derive(Debug, Clone)]
pub struct OauthIdentity {
    /// Provider name (e.g. "google", "github").
    pub provider: String,
    /// Provider-scoped subject identifier.
    pub subject: String,
    /// Verified email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Avatar URL, if the provider supplied one.
    pub avatar_url: Option<String>,
}

/// Input for updating a user's profile and settings.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// New display name.
    pub name: Option<String>,
    /// New IANA timezone.
    pub timezone: Option<String>,
    /// New ISO 4217 currency code.
    pub currency: Option<String>,
    /// New salary day-of-month.
    pub salary_day: Option<i16>,
    /// New avatar URL.
    pub avatar_url: Option<Option<String>>,
}

/// User repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Gets a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    pub async fn find_by_id(&self, user_id: Uuid) -> Result<users::Model, UserError> {
        users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(UserError::NotFound(user_id))
    }

    /// Finds a user by OAuth identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_oauth(
        &self,
        provider: &str,
        subject: &str,
    ) -> Result<Option<users::Model>, UserError> {
        Ok(users::Entity::find()
            .filter(users::Column::OauthProvider.eq(provider))
            .filter(users::Column::OauthId.eq(subject))
            .one(&self.db)
            .await?)
    }

    /// Finds the user for an OAuth identity, creating the account on first login.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEmail` if the email is already registered under a
    /// different identity.
    pub async fn find_or_create(&self, identity: OauthIdentity) -> Result<users::Model, UserError> {
        if let Some(existing) = self
            .find_by_oauth(&identity.provider, &identity.subject)
            .await?
        {
            return Ok(existing);
        }

        let now = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(identity.email.clone()),
            name: Set(identity.name),
            oauth_provider: Set(identity.provider),
            oauth_id: Set(identity.subject),
            avatar_url: Set(identity.avatar_url),
            timezone: Set("UTC".to_string()),
            currency: Set("USD".to_string()),
            salary_day: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match user.insert(&self.db).await {
            Ok(created) => {
                info!(user_id = %created.id, "User created from OAuth identity");
                Ok(created)
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(UserError::DuplicateEmail(identity.email))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Updates profile and settings fields.
    ///
    /// The salary day is validated here, at the settings boundary; the
    /// period engine then trusts the stored value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSalaryDay` for values outside 1-31 and `NotFound`
    /// for an unknown user.
    pub async fn update(
        &self,
        user_id: Uuid,
        input: UpdateUserInput,
    ) -> Result<users::Model, UserError> {
        if let Some(day) = input.salary_day {
            if SalaryDay::try_from(day).is_err() {
                return Err(UserError::InvalidSalaryDay(day));
            }
        }

        let user = self.find_by_id(user_id).await?;
        let mut active: users::ActiveModel = user.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(timezone) = input.timezone {
            active.timezone = Set(timezone);
        }
        if let Some(currency) = input.currency {
            active.currency = Set(currency);
        }
        if let Some(salary_day) = input.salary_day {
            active.salary_day = Set(salary_day);
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(avatar_url);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }
}
