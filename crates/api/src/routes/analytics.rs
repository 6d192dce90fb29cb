//! Analytics routes: dashboard, yearly summary, trends, breakdowns.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use crate::routes::periods::PeriodResponse;
use crate::routes::transactions::TransactionResponse;
use paycycle_db::repositories::{
    AnalyticsError, AnalyticsRepository, CategoryBreakdown, DashboardSummary, PeriodTrend,
    SpendTrend, YearlySummary,
};

/// Creates the analytics routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/dashboard", get(get_dashboard))
        .route("/analytics/yearly/{year}", get(get_yearly_summary))
        .route("/analytics/trends", get(get_spending_trends))
        .route("/analytics/categories", get(get_category_breakdown))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for spending trends.
#[derive(Debug, Deserialize)]
pub struct TrendsQuery {
    /// Number of trailing months to cover (default 6, max 36).
    pub months: Option<u32>,
}

/// Query parameters for category breakdown.
#[derive(Debug, Deserialize)]
pub struct BreakdownQuery {
    /// Period to break down; the current period when absent.
    pub period_id: Option<Uuid>,
}

/// Response for a category aggregation row.
#[derive(Debug, Serialize)]
pub struct CategoryBreakdownResponse {
    /// Category ID.
    pub category_id: Uuid,
    /// Category name.
    pub category_name: String,
    /// Summed amount.
    pub amount: String,
    /// Share of the grand total, as a percentage.
    pub percentage: String,
    /// Number of transactions.
    pub transaction_count: u64,
}

impl From<CategoryBreakdown> for CategoryBreakdownResponse {
    fn from(item: CategoryBreakdown) -> Self {
        Self {
            category_id: item.category_id,
            category_name: item.category_name,
            amount: item.amount.to_string(),
            percentage: item.percentage.to_string(),
            transaction_count: item.transaction_count,
        }
    }
}

/// Response for the dashboard summary.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    /// The period containing today, if materialized.
    pub current_period: Option<PeriodResponse>,
    /// Accumulated savings and investments minus adjustments.
    pub net_position: String,
    /// Current period income.
    pub this_month_income: String,
    /// Current period expenses.
    pub this_month_expenses: String,
    /// Current period savings plus investments, net of adjustments.
    pub this_month_saved: String,
    /// Saved share of income this period, as a percentage.
    pub savings_rate: String,
    /// All-time income.
    pub all_time_income: String,
    /// All-time expenses.
    pub all_time_expenses: String,
    /// Top expense categories of the current period.
    pub top_expense_categories: Vec<CategoryBreakdownResponse>,
    /// Most recent transactions.
    pub recent_transactions: Vec<TransactionResponse>,
}

impl From<DashboardSummary> for DashboardResponse {
    fn from(summary: DashboardSummary) -> Self {
        Self {
            current_period: summary.current_period.map(Into::into),
            net_position: summary.net_position.to_string(),
            this_month_income: summary.this_month_income.to_string(),
            this_month_expenses: summary.this_month_expenses.to_string(),
            this_month_saved: summary.this_month_saved.to_string(),
            savings_rate: summary.savings_rate.to_string(),
            all_time_income: summary.all_time_income.to_string(),
            all_time_expenses: summary.all_time_expenses.to_string(),
            top_expense_categories: summary
                .top_expense_categories
                .into_iter()
                .map(Into::into)
                .collect(),
            recent_transactions: summary
                .recent_transactions
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}

/// Response for one period in the yearly trend line.
#[derive(Debug, Serialize)]
pub struct PeriodTrendResponse {
    /// Display label, e.g. "March 2024".
    pub label: String,
    /// Period income.
    pub income: String,
    /// Period expenses.
    pub expenses: String,
    /// Period savings.
    pub savings: String,
    /// Period investments.
    pub investments: String,
    /// Income minus expenses.
    pub net: String,
}

impl From<PeriodTrend> for PeriodTrendResponse {
    fn from(trend: PeriodTrend) -> Self {
        Self {
            label: trend.label,
            income: trend.income.to_string(),
            expenses: trend.expenses.to_string(),
            savings: trend.savings.to_string(),
            investments: trend.investments.to_string(),
            net: trend.net.to_string(),
        }
    }
}

/// Response for the yearly summary.
#[derive(Debug, Serialize)]
pub struct YearlySummaryResponse {
    /// The calendar year.
    pub year: i32,
    /// Summed income.
    pub total_income: String,
    /// Summed expenses.
    pub total_expenses: String,
    /// Summed savings.
    pub total_savings: String,
    /// Summed investments.
    pub total_investments: String,
    /// Savings plus investments.
    pub net_savings: String,
    /// Saved share of income, as a percentage.
    pub savings_rate: String,
    /// Number of periods considered.
    pub periods_count: usize,
    /// Per-period trend line.
    pub period_trends: Vec<PeriodTrendResponse>,
    /// Category totals across the year.
    pub category_breakdown: Vec<CategoryBreakdownResponse>,
}

impl From<YearlySummary> for YearlySummaryResponse {
    fn from(summary: YearlySummary) -> Self {
        Self {
            year: summary.year,
            total_income: summary.total_income.to_string(),
            total_expenses: summary.total_expenses.to_string(),
            total_savings: summary.total_savings.to_string(),
            total_investments: summary.total_investments.to_string(),
            net_savings: summary.net_savings.to_string(),
            savings_rate: summary.savings_rate.to_string(),
            periods_count: summary.periods_count,
            period_trends: summary.period_trends.into_iter().map(Into::into).collect(),
            category_breakdown: summary
                .category_breakdown
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}

/// Response for one monthly trend bucket.
#[derive(Debug, Serialize)]
pub struct SpendTrendResponse {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
    /// Transaction kind.
    pub kind: String,
    /// Summed amount.
    pub amount: String,
}

impl From<SpendTrend> for SpendTrendResponse {
    fn from(trend: SpendTrend) -> Self {
        Self {
            year: trend.year,
            month: trend.month,
            kind: super::transactions::kind_to_string(trend.kind),
            amount: trend.amount.to_string(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/analytics/dashboard` - Dashboard summary.
async fn get_dashboard(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = AnalyticsRepository::new((*state.db).clone());

    match repo.dashboard(auth.user_id()).await {
        Ok(summary) => (StatusCode::OK, Json(DashboardResponse::from(summary))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to build dashboard");
            analytics_error_response(&e)
        }
    }
}

/// GET `/analytics/yearly/{year}` - Yearly financial summary.
async fn get_yearly_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(year): Path<i32>,
) -> impl IntoResponse {
    if !(2000..=2100).contains(&year) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_year",
                "message": "Year must be between 2000 and 2100"
            })),
        )
            .into_response();
    }

    let repo = AnalyticsRepository::new((*state.db).clone());

    match repo.yearly_summary(auth.user_id(), year).await {
        Ok(summary) => {
            (StatusCode::OK, Json(YearlySummaryResponse::from(summary))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to build yearly summary");
            analytics_error_response(&e)
        }
    }
}

/// GET `/analytics/trends?months=N` - Monthly totals per kind.
async fn get_spending_trends(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TrendsQuery>,
) -> impl IntoResponse {
    let months = query.months.unwrap_or(6).clamp(1, 36);
    let repo = AnalyticsRepository::new((*state.db).clone());

    match repo.spending_trends(auth.user_id(), months).await {
        Ok(trends) => {
            let items: Vec<SpendTrendResponse> = trends.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "trends": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to compute spending trends");
            analytics_error_response(&e)
        }
    }
}

/// GET `/analytics/categories` - Category breakdown for a period.
async fn get_category_breakdown(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<BreakdownQuery>,
) -> impl IntoResponse {
    let repo = AnalyticsRepository::new((*state.db).clone());

    match repo
        .category_breakdown(auth.user_id(), query.period_id)
        .await
    {
        Ok(breakdown) => {
            let items: Vec<CategoryBreakdownResponse> =
                breakdown.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "categories": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to compute category breakdown");
            analytics_error_response(&e)
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Maps an analytics error onto the JSON error envelope.
fn analytics_error_response(e: &AnalyticsError) -> axum::response::Response {
    match e {
        AnalyticsError::Period(period_error) => {
            super::periods::period_error_response(period_error)
        }
        AnalyticsError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "internal_error",
                "message": "An error occurred"
            })),
        )
            .into_response(),
    }
}
