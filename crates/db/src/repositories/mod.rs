//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod analytics;
pub mod category;
pub mod period;
pub mod transaction;
pub mod user;

pub use analytics::{
    AnalyticsError, AnalyticsRepository, CategoryBreakdown, DashboardSummary, PeriodTrend,
    SpendTrend, YearlySummary,
};
pub use category::{CategoryError, CategoryRepository, CreateCategoryInput, UpdateCategoryInput};
pub use period::{
    CategoryExpense, CreatePeriodInput, PeriodError, PeriodFilter, PeriodRepository, PeriodSummary,
    RebuildOutcome, UpdatePeriodInput,
};
pub use transaction::{
    CreateTransactionInput, TransactionError, TransactionFilter, TransactionRepository,
    UpdateTransactionInput,
};
pub use user::{OauthIdentity, UpdateUserInput, UserError, UserRepository};
