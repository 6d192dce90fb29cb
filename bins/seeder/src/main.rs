//! Database seeder for Paycycle development and testing.
//!
//! Seeds a test user with categories and three months of transactions,
//! then rebuilds the resulting periods so the carry-forward chain settles.
//!
//! Usage: cargo run --bin seeder

use chrono::{Datelike, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use paycycle_db::entities::{sea_orm_active_enums::TransactionKind, users};
use paycycle_db::repositories::{
    CategoryRepository, CreateCategoryInput, CreateTransactionInput, PeriodRepository,
    TransactionRepository,
};

/// Test user ID (consistent for all seeds)
const TEST_USER_ID: &str = "00000000-0000-0000-0000-000000000001";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = paycycle_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding test user...");
    let user_id = seed_test_user(&db).await;

    println!("Seeding categories...");
    let categories = seed_categories(&db, user_id).await;

    println!("Seeding transactions...");
    seed_transactions(&db, user_id, &categories).await;

    println!("Rebuilding periods...");
    let periods = PeriodRepository::new(db);
    let outcomes = periods
        .rebuild(user_id, None)
        .await
        .expect("Failed to rebuild periods");
    for outcome in &outcomes {
        match &outcome.result {
            Ok(period) => println!(
                "  period {} [{} - {:?}] carried_forward={}",
                period.id, period.started_at, period.ended_at, period.carried_forward
            ),
            Err(e) => println!("  period {} failed: {e}", outcome.period_id),
        }
    }

    println!("Done.");
}

async fn seed_test_user(db: &DatabaseConnection) -> Uuid {
    let user_id = Uuid::parse_str(TEST_USER_ID).expect("valid test user id");

    let existing = users::Entity::find_by_id(user_id)
        .one(db)
        .await
        .expect("Failed to query users");
    if existing.is_some() {
        println!("  test user already exists, skipping");
        return user_id;
    }

    let now = Utc::now().into();
    users::ActiveModel {
        id: Set(user_id),
        email: Set("demo@paycycle.dev".to_string()),
        name: Set("Demo User".to_string()),
        oauth_provider: Set("google".to_string()),
        oauth_id: Set("demo-oauth-subject".to_string()),
        avatar_url: Set(None),
        timezone: Set("UTC".to_string()),
        currency: Set("USD".to_string()),
        salary_day: Set(25),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert test user");

    user_id
}

struct SeedCategories {
    salary: Uuid,
    groceries: Uuid,
    rent: Uuid,
    savings: Uuid,
    index_funds: Uuid,
}

async fn seed_categories(db: &DatabaseConnection, user_id: Uuid) -> SeedCategories {
    let repo = CategoryRepository::new(db.clone());

    let defaults = [
        ("Salary", TransactionKind::Income),
        ("Groceries", TransactionKind::Expense),
        ("Rent", TransactionKind::Expense),
        ("Emergency Fund", TransactionKind::Saving),
        ("Index Funds", TransactionKind::Investment),
    ];

    let mut ids = Vec::with_capacity(defaults.len());
    for (name, kind) in defaults {
        let id = match repo
            .create(
                user_id,
                CreateCategoryInput {
                    name: name.to_string(),
                    kind,
                    color: None,
                    icon: None,
                },
            )
            .await
        {
            Ok(category) => category.id,
            // Already seeded on a previous run.
            Err(_) => find_category(db, user_id, name).await,
        };
        ids.push(id);
    }

    SeedCategories {
        salary: ids[0],
        groceries: ids[1],
        rent: ids[2],
        savings: ids[3],
        index_funds: ids[4],
    }
}

async fn find_category(db: &DatabaseConnection, user_id: Uuid, name: &str) -> Uuid {
    use paycycle_db::entities::categories;
    categories::Entity::find()
        .filter(categories::Column::UserId.eq(user_id))
        .filter(categories::Column::Name.eq(name))
        .one(db)
        .await
        .expect("Failed to query categories")
        .expect("Seeded category should exist")
        .id
}

async fn seed_transactions(db: &DatabaseConnection, user_id: Uuid, categories: &SeedCategories) {
    let repo = TransactionRepository::new(db.clone());
    let today = Utc::now().date_naive();

    // Three months of history: salary in, rent and groceries out, a slice
    // saved and invested. Past months land in backfilled completed periods.
    for months_ago in (0..3).rev() {
        let base = today - Duration::days(months_ago * 30);

        let entries: [(Uuid, Decimal, TransactionKind, &str); 5] = [
            (categories.salary, dec!(4200), TransactionKind::Income, "Monthly salary"),
            (categories.rent, dec!(1500), TransactionKind::Expense, "Rent"),
            (categories.groceries, dec!(430.50), TransactionKind::Expense, "Groceries"),
            (categories.savings, dec!(600), TransactionKind::Saving, "Emergency fund top-up"),
            (categories.index_funds, dec!(400), TransactionKind::Investment, "ETF purchase"),
        ];

        for (category_id, amount, kind, description) in entries {
            let transacted_at = if base.day() > 1 {
                base - Duration::days(1)
            } else {
                base
            };

            repo.create(
                user_id,
                CreateTransactionInput {
                    category_id,
                    amount,
                    kind,
                    description: Some(description.to_string()),
                    transacted_at,
                    payment_method: Some("bank_transfer".to_string()),
                    notes: None,
                },
            )
            .await
            .expect("Failed to insert transaction");
        }
    }
}
