//! Database enum types mapped to PostgreSQL enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction classification stored on `transactions.kind`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, DeriveActiveEnum,
    Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_kind")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Money coming in.
    #[sea_orm(string_value = "income")]
    Income,
    /// Money spent.
    #[sea_orm(string_value = "expense")]
    Expense,
    /// Money set aside in savings.
    #[sea_orm(string_value = "saving")]
    Saving,
    /// Money moved into investments.
    #[sea_orm(string_value = "investment")]
    Investment,
    /// Manual balance correction.
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

/// Budget period lifecycle status stored on `budget_periods.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "period_status")]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Open and accumulating transactions.
    #[sea_orm(string_value = "active")]
    Active,
    /// Closed; carry-forward is final.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Created ahead of its window.
    #[sea_orm(string_value = "projected")]
    Projected,
}

impl From<TransactionKind> for paycycle_core::period::TransactionKind {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Income => Self::Income,
            TransactionKind::Expense => Self::Expense,
            TransactionKind::Saving => Self::Saving,
            TransactionKind::Investment => Self::Investment,
            TransactionKind::Adjustment => Self::Adjustment,
        }
    }
}

impl From<paycycle_core::period::TransactionKind> for TransactionKind {
    fn from(kind: paycycle_core::period::TransactionKind) -> Self {
        match kind {
            paycycle_core::period::TransactionKind::Income => Self::Income,
            paycycle_core::period::TransactionKind::Expense => Self::Expense,
            paycycle_core::period::TransactionKind::Saving => Self::Saving,
            paycycle_core::period::TransactionKind::Investment => Self::Investment,
            paycycle_core::period::TransactionKind::Adjustment => Self::Adjustment,
        }
    }
}

impl From<PeriodStatus> for paycycle_core::period::PeriodStatus {
    fn from(status: PeriodStatus) -> Self {
        match status {
            PeriodStatus::Active => Self::Active,
            PeriodStatus::Completed => Self::Completed,
            PeriodStatus::Projected => Self::Projected,
        }
    }
}

impl From<paycycle_core::period::PeriodStatus> for PeriodStatus {
    fn from(status: paycycle_core::period::PeriodStatus) -> Self {
        match status {
            paycycle_core::period::PeriodStatus::Active => Self::Active,
            paycycle_core::period::PeriodStatus::Completed => Self::Completed,
            paycycle_core::period::PeriodStatus::Projected => Self::Projected,
        }
    }
}
