//! Transaction routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use paycycle_db::entities::{sea_orm_active_enums::TransactionKind, transactions};
use paycycle_db::repositories::{
    CreateTransactionInput, TransactionError, TransactionFilter, TransactionRepository,
    UpdateTransactionInput,
};
use paycycle_shared::types::{PageRequest, PageResponse};

/// Creates the transaction routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions))
        .route("/transactions", post(create_transaction))
        .route("/transactions/bulk", post(bulk_create_transactions))
        .route("/transactions/{transaction_id}", get(get_transaction))
        .route("/transactions/{transaction_id}", put(update_transaction))
        .route("/transactions/{transaction_id}", delete(delete_transaction))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Filter by category.
    pub category_id: Option<Uuid>,
    /// Filter by kind: income, expense, saving, investment, adjustment.
    pub kind: Option<String>,
    /// Filter by budget period.
    pub period_id: Option<Uuid>,
    /// Inclusive lower date bound.
    pub from: Option<NaiveDate>,
    /// Inclusive upper date bound.
    pub to: Option<NaiveDate>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Category the transaction belongs to.
    pub category_id: Uuid,
    /// Unsigned amount; the kind carries the direction.
    pub amount: Decimal,
    /// Kind: income, expense, saving, investment, adjustment.
    pub kind: String,
    /// Optional description.
    pub description: Option<String>,
    /// Date the money moved.
    pub transacted_at: NaiveDate,
    /// Optional payment method.
    pub payment_method: Option<String>,
    /// Optional notes.
    pub notes: Option<String>,
}

/// Request body for bulk creation.
#[derive(Debug, Deserialize)]
pub struct BulkCreateRequest {
    /// Transactions to create.
    pub transactions: Vec<CreateTransactionRequest>,
}

/// Request body for updating a transaction.
#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    /// New category.
    pub category_id: Option<Uuid>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New kind.
    pub kind: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New date; moving the date may reassign the budget period.
    pub transacted_at: Option<NaiveDate>,
    /// New payment method.
    pub payment_method: Option<String>,
    /// New notes.
    pub notes: Option<String>,
}

/// Response for a transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: Uuid,
    /// Budget period the transaction belongs to.
    pub budget_period_id: Uuid,
    /// Category ID.
    pub category_id: Uuid,
    /// Amount.
    pub amount: String,
    /// Kind.
    pub kind: String,
    /// Description.
    pub description: Option<String>,
    /// Transaction date.
    pub transacted_at: String,
    /// Payment method.
    pub payment_method: Option<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<transactions::Model> for TransactionResponse {
    fn from(tx: transactions::Model) -> Self {
        Self {
            id: tx.id,
            budget_period_id: tx.budget_period_id,
            category_id: tx.category_id,
            amount: tx.amount.to_string(),
            kind: kind_to_string(tx.kind),
            description: tx.description,
            transacted_at: tx.transacted_at.to_string(),
            payment_method: tx.payment_method,
            notes: tx.notes,
            created_at: tx.created_at.to_rfc3339(),
            updated_at: tx.updated_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/transactions` - List transactions with filters, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone());

    let kind = match query.kind.as_deref().map(parse_kind) {
        Some(None) => return invalid_kind(),
        Some(parsed) => parsed,
        None => None,
    };

    let filter = TransactionFilter {
        category_id: query.category_id,
        kind,
        budget_period_id: query.period_id,
        from: query.from,
        to: query.to,
    };

    let page = PageRequest {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20).min(100),
    };

    match repo.list(auth.user_id(), filter, &page).await {
        Ok((items, total)) => {
            let items: Vec<TransactionResponse> = items.into_iter().map(Into::into).collect();
            let response = PageResponse::new(items, page.page, page.per_page, total);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list transactions");
            transaction_error_response(&e)
        }
    }
}

/// POST `/transactions` - Create a transaction.
///
/// The transaction's date decides its budget period, creating the period
/// lazily when no window covers the date yet.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone());

    let input = match parse_create_request(payload) {
        Ok(input) => input,
        Err(response) => return response,
    };

    match repo.create(auth.user_id(), input).await {
        Ok(tx) => {
            info!(user_id = %auth.user_id(), transaction_id = %tx.id, "Transaction created");
            (StatusCode::CREATED, Json(TransactionResponse::from(tx))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create transaction");
            transaction_error_response(&e)
        }
    }
}

/// POST `/transactions/bulk` - Create several transactions at once.
async fn bulk_create_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<BulkCreateRequest>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone());

    let mut inputs = Vec::with_capacity(payload.transactions.len());
    for request in payload.transactions {
        match parse_create_request(request) {
            Ok(input) => inputs.push(input),
            Err(response) => return response,
        }
    }

    match repo.bulk_create(auth.user_id(), inputs).await {
        Ok(created) => {
            info!(
                user_id = %auth.user_id(),
                count = created.len(),
                "Transactions bulk created"
            );
            let items: Vec<TransactionResponse> = created.into_iter().map(Into::into).collect();
            (StatusCode::CREATED, Json(json!({ "transactions": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to bulk create transactions");
            transaction_error_response(&e)
        }
    }
}

/// GET `/transactions/{transaction_id}` - A single transaction.
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone());

    match repo.find(auth.user_id(), transaction_id).await {
        Ok(tx) => (StatusCode::OK, Json(TransactionResponse::from(tx))).into_response(),
        Err(e) => transaction_error_response(&e),
    }
}

/// PUT `/transactions/{transaction_id}` - Update a transaction.
async fn update_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone());

    let kind = match payload.kind.as_deref().map(parse_kind) {
        Some(None) => return invalid_kind(),
        Some(parsed) => parsed,
        None => None,
    };

    let input = UpdateTransactionInput {
        category_id: payload.category_id,
        amount: payload.amount,
        kind,
        description: payload.description.map(Some),
        transacted_at: payload.transacted_at,
        payment_method: payload.payment_method.map(Some),
        notes: payload.notes.map(Some),
    };

    match repo.update(auth.user_id(), transaction_id, input).await {
        Ok(tx) => (StatusCode::OK, Json(TransactionResponse::from(tx))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to update transaction");
            transaction_error_response(&e)
        }
    }
}

/// DELETE `/transactions/{transaction_id}` - Delete a transaction.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone());

    match repo.delete(auth.user_id(), transaction_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => transaction_error_response(&e),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_create_request(
    request: CreateTransactionRequest,
) -> Result<CreateTransactionInput, axum::response::Response> {
    let Some(kind) = parse_kind(&request.kind) else {
        return Err(invalid_kind());
    };

    if request.amount < Decimal::ZERO {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_amount",
                "message": "Amount must be a non-negative magnitude; the kind carries the direction"
            })),
        )
            .into_response());
    }

    Ok(CreateTransactionInput {
        category_id: request.category_id,
        amount: request.amount,
        kind,
        description: request.description,
        transacted_at: request.transacted_at,
        payment_method: request.payment_method,
        notes: request.notes,
    })
}

fn parse_kind(s: &str) -> Option<TransactionKind> {
    match s.to_lowercase().as_str() {
        "income" => Some(TransactionKind::Income),
        "expense" => Some(TransactionKind::Expense),
        "saving" => Some(TransactionKind::Saving),
        "investment" => Some(TransactionKind::Investment),
        "adjustment" => Some(TransactionKind::Adjustment),
        _ => None,
    }
}

pub(crate) fn kind_to_string(kind: TransactionKind) -> String {
    match kind {
        TransactionKind::Income => "income".to_string(),
        TransactionKind::Expense => "expense".to_string(),
        TransactionKind::Saving => "saving".to_string(),
        TransactionKind::Investment => "investment".to_string(),
        TransactionKind::Adjustment => "adjustment".to_string(),
    }
}

fn invalid_kind() -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "invalid_kind",
            "message": "Kind must be one of: income, expense, saving, investment, adjustment"
        })),
    )
        .into_response()
}

/// Maps a transaction repository error onto the JSON error envelope.
fn transaction_error_response(e: &TransactionError) -> axum::response::Response {
    match e {
        TransactionError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "transaction_not_found",
                "message": "Transaction not found"
            })),
        )
            .into_response(),
        TransactionError::CategoryNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "category_not_found",
                "message": format!("Category not found: {id}")
            })),
        )
            .into_response(),
        TransactionError::NegativeAmount => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_amount",
                "message": "Amount cannot be negative"
            })),
        )
            .into_response(),
        TransactionError::Period(period_error) => super::periods::period_error_response(period_error),
        TransactionError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "internal_error",
                "message": "An error occurred"
            })),
        )
            .into_response(),
    }
}
