//! Budget period routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use paycycle_core::period::PeriodError as DomainError;
use paycycle_db::entities::{budget_periods, sea_orm_active_enums::PeriodStatus};
use paycycle_db::repositories::{
    CreatePeriodInput, PeriodError, PeriodFilter, PeriodRepository, PeriodSummary,
    UpdatePeriodInput,
};
use paycycle_shared::AppError;
use paycycle_shared::types::{PageRequest, PageResponse};

/// Creates the budget period routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/periods", get(list_periods))
        .route("/periods", post(create_period))
        .route("/periods/current", get(get_current_period))
        .route("/periods/rebuild", post(rebuild_periods))
        .route("/periods/{period_id}", get(get_period))
        .route("/periods/{period_id}", put(update_period))
        .route("/periods/{period_id}/complete", post(complete_period))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing periods.
#[derive(Debug, Deserialize)]
pub struct ListPeriodsQuery {
    /// Filter by status: active, completed, projected.
    pub status: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for creating a period explicitly.
#[derive(Debug, Deserialize)]
pub struct CreatePeriodRequest {
    /// First day of the period.
    pub started_at: NaiveDate,
    /// Optional end; derived from the salary window when absent.
    pub ended_at: Option<NaiveDate>,
    /// Optional income forecast.
    pub expected_income: Option<Decimal>,
    /// Optional explicit inheritance from the previous period.
    pub brought_forward: Option<Decimal>,
}

/// Request body for updating a period.
#[derive(Debug, Deserialize)]
pub struct UpdatePeriodRequest {
    /// New income forecast.
    pub expected_income: Option<Decimal>,
}

/// Request body for completing a period.
#[derive(Debug, Default, Deserialize)]
pub struct CompletePeriodRequest {
    /// Explicit end date; defaults to today.
    pub ended_at: Option<NaiveDate>,
}

/// Request body for bulk rebuild.
#[derive(Debug, Deserialize)]
pub struct RebuildRequest {
    /// Periods to rebuild; all of the user's periods when absent.
    pub period_ids: Option<Vec<Uuid>>,
}

/// Response for a budget period.
#[derive(Debug, Serialize)]
pub struct PeriodResponse {
    /// Period ID.
    pub id: Uuid,
    /// First day of the period.
    pub started_at: String,
    /// First day after the period, if closed.
    pub ended_at: Option<String>,
    /// Income forecast.
    pub expected_income: String,
    /// Summed income.
    pub actual_income: String,
    /// Summed expenses.
    pub total_expenses: String,
    /// Summed savings.
    pub total_savings: String,
    /// Summed investments.
    pub total_investments: String,
    /// Inherited balance.
    pub brought_forward: String,
    /// Balance carried to the next period.
    pub carried_forward: String,
    /// Lifecycle status.
    pub status: String,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<budget_periods::Model> for PeriodResponse {
    fn from(period: budget_periods::Model) -> Self {
        Self {
            id: period.id,
            started_at: period.started_at.to_string(),
            ended_at: period.ended_at.map(|d| d.to_string()),
            expected_income: period.expected_income.to_string(),
            actual_income: period.actual_income.to_string(),
            total_expenses: period.total_expenses.to_string(),
            total_savings: period.total_savings.to_string(),
            total_investments: period.total_investments.to_string(),
            brought_forward: period.brought_forward.to_string(),
            carried_forward: period.carried_forward.to_string(),
            status: status_to_string(period.status),
            created_at: period.created_at.to_rfc3339(),
            updated_at: period.updated_at.to_rfc3339(),
        }
    }
}

/// Response for a period with its expense breakdown.
#[derive(Debug, Serialize)]
pub struct PeriodSummaryResponse {
    /// The period.
    #[serde(flatten)]
    pub period: PeriodResponse,
    /// Expenses grouped by category, largest first.
    pub expense_by_category: Vec<CategoryExpenseResponse>,
    /// Largest expenses first, at most five.
    pub top_expenses: Vec<TopExpenseResponse>,
}

/// Expense total for one category.
#[derive(Debug, Serialize)]
pub struct CategoryExpenseResponse {
    /// Category ID.
    pub category_id: Uuid,
    /// Category name.
    pub name: String,
    /// Summed expense amount.
    pub total: String,
}

/// One of the period's largest expenses.
#[derive(Debug, Serialize)]
pub struct TopExpenseResponse {
    /// Transaction ID.
    pub id: Uuid,
    /// Description.
    pub description: Option<String>,
    /// Amount.
    pub amount: String,
    /// Transaction date.
    pub transacted_at: String,
}

impl From<PeriodSummary> for PeriodSummaryResponse {
    fn from(summary: PeriodSummary) -> Self {
        Self {
            period: summary.period.into(),
            expense_by_category: summary
                .expense_by_category
                .into_iter()
                .map(|c| CategoryExpenseResponse {
                    category_id: c.category_id,
                    name: c.name,
                    total: c.total.to_string(),
                })
                .collect(),
            top_expenses: summary
                .top_expenses
                .into_iter()
                .map(|t| TopExpenseResponse {
                    id: t.id,
                    description: t.description,
                    amount: t.amount.to_string(),
                    transacted_at: t.transacted_at.to_string(),
                })
                .collect(),
        }
    }
}

/// Per-period outcome of a bulk rebuild.
#[derive(Debug, Serialize)]
pub struct RebuildItemResponse {
    /// Period ID.
    pub period_id: Uuid,
    /// Whether this period rebuilt cleanly.
    pub success: bool,
    /// The rebuilt period on success.
    pub period: Option<PeriodResponse>,
    /// The failure reason otherwise.
    pub error: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/periods` - List the user's periods, newest first.
async fn list_periods(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListPeriodsQuery>,
) -> impl IntoResponse {
    let repo = PeriodRepository::new((*state.db).clone());

    let status = match query.status.as_deref().map(parse_status) {
        Some(None) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_status",
                    "message": "Status must be one of: active, completed, projected"
                })),
            )
                .into_response();
        }
        Some(parsed) => parsed,
        None => None,
    };

    let page = PageRequest {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20).min(100),
    };

    match repo
        .list_periods(auth.user_id(), PeriodFilter { status }, &page)
        .await
    {
        Ok((periods, total)) => {
            let items: Vec<PeriodResponse> = periods.into_iter().map(Into::into).collect();
            let response = PageResponse::new(items, page.page, page.per_page, total);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list periods");
            period_error_response(&e)
        }
    }
}

/// GET `/periods/current` - The period containing today, with summary.
async fn get_current_period(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = PeriodRepository::new((*state.db).clone());

    let current = match repo.current_period(auth.user_id()).await {
        Ok(Some(period)) => period,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "no_current_period",
                    "message": "No active budget period found. Record a transaction or create a period."
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Failed to load current period");
            return period_error_response(&e);
        }
    };

    match repo.period_summary(auth.user_id(), current.id).await {
        Ok(summary) => {
            (StatusCode::OK, Json(PeriodSummaryResponse::from(summary))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to build period summary");
            period_error_response(&e)
        }
    }
}

/// POST `/periods` - Explicitly create a period.
async fn create_period(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreatePeriodRequest>,
) -> impl IntoResponse {
    let repo = PeriodRepository::new((*state.db).clone());

    let input = CreatePeriodInput {
        started_at: payload.started_at,
        ended_at: payload.ended_at,
        expected_income: payload.expected_income,
        brought_forward: payload.brought_forward,
    };

    match repo.create_period(auth.user_id(), input).await {
        Ok(period) => {
            info!(user_id = %auth.user_id(), period_id = %period.id, "Budget period created");
            (StatusCode::CREATED, Json(PeriodResponse::from(period))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create period");
            period_error_response(&e)
        }
    }
}

/// GET `/periods/{period_id}` - A period with its summary.
async fn get_period(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(period_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = PeriodRepository::new((*state.db).clone());

    match repo.period_summary(auth.user_id(), period_id).await {
        Ok(summary) => {
            (StatusCode::OK, Json(PeriodSummaryResponse::from(summary))).into_response()
        }
        Err(e) => period_error_response(&e),
    }
}

/// PUT `/periods/{period_id}` - Update a period's forecast.
async fn update_period(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(period_id): Path<Uuid>,
    Json(payload): Json<UpdatePeriodRequest>,
) -> impl IntoResponse {
    let repo = PeriodRepository::new((*state.db).clone());

    let input = UpdatePeriodInput {
        expected_income: payload.expected_income,
    };

    match repo.update_period(auth.user_id(), period_id, input).await {
        Ok(period) => (StatusCode::OK, Json(PeriodResponse::from(period))).into_response(),
        Err(e) => period_error_response(&e),
    }
}

/// POST `/periods/{period_id}/complete` - Complete a period.
///
/// Computes the final carry-forward and chains the next period when this
/// one ends on-or-before today.
async fn complete_period(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(period_id): Path<Uuid>,
    payload: Option<Json<CompletePeriodRequest>>,
) -> impl IntoResponse {
    let repo = PeriodRepository::new((*state.db).clone());
    let ended_at = payload.and_then(|Json(p)| p.ended_at);

    match repo
        .complete_period(auth.user_id(), period_id, ended_at)
        .await
    {
        Ok(period) => {
            info!(
                user_id = %auth.user_id(),
                period_id = %period_id,
                carried_forward = %period.carried_forward,
                "Budget period completed"
            );
            (StatusCode::OK, Json(PeriodResponse::from(period))).into_response()
        }
        Err(e) => period_error_response(&e),
    }
}

/// POST `/periods/rebuild` - Rebuild periods chronologically.
///
/// Per-period results; one failure never aborts the batch.
async fn rebuild_periods(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<RebuildRequest>,
) -> impl IntoResponse {
    let repo = PeriodRepository::new((*state.db).clone());

    match repo.rebuild(auth.user_id(), payload.period_ids).await {
        Ok(outcomes) => {
            let items: Vec<RebuildItemResponse> = outcomes
                .into_iter()
                .map(|outcome| match outcome.result {
                    Ok(period) => RebuildItemResponse {
                        period_id: outcome.period_id,
                        success: true,
                        period: Some(period.into()),
                        error: None,
                    },
                    Err(e) => RebuildItemResponse {
                        period_id: outcome.period_id,
                        success: false,
                        period: None,
                        error: Some(e.to_string()),
                    },
                })
                .collect();

            (StatusCode::OK, Json(json!({ "results": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to rebuild periods");
            period_error_response(&e)
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_status(s: &str) -> Option<PeriodStatus> {
    match s.to_lowercase().as_str() {
        "active" => Some(PeriodStatus::Active),
        "completed" => Some(PeriodStatus::Completed),
        "projected" => Some(PeriodStatus::Projected),
        _ => None,
    }
}

fn status_to_string(status: PeriodStatus) -> String {
    match status {
        PeriodStatus::Active => "active".to_string(),
        PeriodStatus::Completed => "completed".to_string(),
        PeriodStatus::Projected => "projected".to_string(),
    }
}

/// Maps a period repository error onto the JSON error envelope.
pub(crate) fn period_error_response(e: &PeriodError) -> axum::response::Response {
    let app_error = match e {
        PeriodError::NotFound(id) => AppError::NotFound(format!("budget period {id}")),
        PeriodError::UserNotFound(id) => AppError::NotFound(format!("user {id}")),
        PeriodError::Overlap(start) => AppError::Conflict(format!(
            "budget period overlaps an existing period starting {start}"
        )),
        PeriodError::Domain(DomainError::InvalidSalaryDay(day)) => {
            AppError::Configuration(format!("salary day {day} is outside 1-31"))
        }
        PeriodError::Domain(domain) => AppError::BusinessRule(domain.to_string()),
        PeriodError::Database(_) => AppError::Internal("An error occurred".to_string()),
    };

    let status = StatusCode::from_u16(app_error.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": app_error.error_code(),
            "message": app_error.to_string()
        })),
    )
        .into_response()
}
