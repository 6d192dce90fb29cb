//! `SeaORM` entity definitions.

pub mod budget_periods;
pub mod categories;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod users;
