//! Category routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use paycycle_db::entities::{categories, sea_orm_active_enums::TransactionKind};
use paycycle_db::repositories::{
    CategoryError, CategoryRepository, CreateCategoryInput, UpdateCategoryInput,
};

/// Creates the category routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories", post(create_category))
        .route("/categories/{category_id}", put(update_category))
        .route("/categories/{category_id}", delete(delete_category))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing categories.
#[derive(Debug, Deserialize)]
pub struct ListCategoriesQuery {
    /// Filter by kind.
    pub kind: Option<String>,
}

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Category name.
    pub name: String,
    /// Kind: income, expense, saving, investment, adjustment.
    pub kind: String,
    /// Optional hex color.
    pub color: Option<String>,
    /// Optional icon name.
    pub icon: Option<String>,
}

/// Request body for updating a category.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    /// New name.
    pub name: Option<String>,
    /// New hex color.
    pub color: Option<String>,
    /// New icon name.
    pub icon: Option<String>,
}

/// Response for a category.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    /// Category ID.
    pub id: Uuid,
    /// Category name.
    pub name: String,
    /// Kind.
    pub kind: String,
    /// Hex color.
    pub color: Option<String>,
    /// Icon name.
    pub icon: Option<String>,
    /// Whether this is a seeded default.
    pub is_default: bool,
}

impl From<categories::Model> for CategoryResponse {
    fn from(category: categories::Model) -> Self {
        Self {
            id: category.id,
            name: category.name,
            kind: kind_to_string(category.kind),
            color: category.color,
            icon: category.icon,
            is_default: category.is_default,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/categories` - List the user's categories.
async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListCategoriesQuery>,
) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    let kind = match query.kind.as_deref().map(parse_kind) {
        Some(None) => return invalid_kind(),
        Some(parsed) => parsed,
        None => None,
    };

    match repo.list(auth.user_id(), kind).await {
        Ok(items) => {
            let items: Vec<CategoryResponse> = items.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "categories": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list categories");
            category_error_response(&e)
        }
    }
}

/// POST `/categories` - Create a category.
async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    let Some(kind) = parse_kind(&payload.kind) else {
        return invalid_kind();
    };

    if payload.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_name",
                "message": "Category name cannot be empty"
            })),
        )
            .into_response();
    }

    let input = CreateCategoryInput {
        name: payload.name,
        kind,
        color: payload.color,
        icon: payload.icon,
    };

    match repo.create(auth.user_id(), input).await {
        Ok(category) => {
            (StatusCode::CREATED, Json(CategoryResponse::from(category))).into_response()
        }
        Err(e) => category_error_response(&e),
    }
}

/// PUT `/categories/{category_id}` - Update a category.
async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    let input = UpdateCategoryInput {
        name: payload.name,
        color: payload.color.map(Some),
        icon: payload.icon.map(Some),
    };

    match repo.update(auth.user_id(), category_id, input).await {
        Ok(category) => (StatusCode::OK, Json(CategoryResponse::from(category))).into_response(),
        Err(e) => category_error_response(&e),
    }
}

/// DELETE `/categories/{category_id}` - Delete an unused category.
async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    match repo.delete(auth.user_id(), category_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => category_error_response(&e),
    }
}

// ============================================================================
// Helpers
// ============================================================================

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

fn kind_to_string(kind: TransactionKind) -> String {
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

/// Maps a category repository error onto the JSON error envelope.
fn category_error_response(e: &CategoryError) -> axum::response::Response {
    match e {
        CategoryError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "category_not_found",
                "message": "Category not found"
            })),
        )
            .into_response(),
        CategoryError::Duplicate { name, .. } => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "category_exists",
                "message": format!("Category '{name}' already exists")
            })),
        )
            .into_response(),
        CategoryError::InUse => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "category_in_use",
                "message": "Cannot delete category that is being used by transactions"
            })),
        )
            .into_response(),
        CategoryError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "internal_error",
                "message": "An error occurred"
            })),
        )
            .into_response(),
    }
}
