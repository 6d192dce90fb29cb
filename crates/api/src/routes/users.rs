//! User profile and settings routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use paycycle_db::entities::users;
use paycycle_db::repositories::{UpdateUserInput, UserError, UserRepository};

/// Creates the user routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/users/me", put(update_me))
}

/// Request body for updating the current user.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    /// Display name.
    pub name: Option<String>,
    /// IANA timezone.
    pub timezone: Option<String>,
    /// ISO 4217 currency code.
    pub currency: Option<String>,
    /// Salary day-of-month, 1-31.
    pub salary_day: Option<i16>,
    /// Avatar URL.
    pub avatar_url: Option<String>,
}

/// Response for a user profile.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// OAuth provider.
    pub oauth_provider: String,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// IANA timezone.
    pub timezone: String,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Salary day-of-month.
    pub salary_day: i16,
    /// Created at timestamp.
    pub created_at: String,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            oauth_provider: user.oauth_provider,
            avatar_url: user.avatar_url,
            timezone: user.timezone,
            currency: user.currency,
            salary_day: user.salary_day,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// GET `/users/me` - Current user's profile.
async fn get_me(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    match user_repo.find_by_id(auth.user_id()).await {
        Ok(user) => (StatusCode::OK, Json(UserResponse::from(user))).into_response(),
        Err(UserError::NotFound(_)) => user_not_found(),
        Err(e) => {
            error!(error = %e, "Failed to load user");
            internal_error()
        }
    }
}

/// PUT `/users/me` - Update profile and settings.
///
/// The salary day is validated here at the settings boundary; the period
/// engine trusts the stored value afterwards.
async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateUserRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    let input = UpdateUserInput {
        name: payload.name,
        timezone: payload.timezone,
        currency: payload.currency,
        salary_day: payload.salary_day,
        avatar_url: payload.avatar_url.map(Some),
    };

    match user_repo.update(auth.user_id(), input).await {
        Ok(user) => (StatusCode::OK, Json(UserResponse::from(user))).into_response(),
        Err(UserError::InvalidSalaryDay(day)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_salary_day",
                "message": format!("Salary day must be between 1 and 31, got {day}")
            })),
        )
            .into_response(),
        Err(UserError::NotFound(_)) => user_not_found(),
        Err(e) => {
            error!(error = %e, "Failed to update user");
            internal_error()
        }
    }
}

fn user_not_found() -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "user_not_found",
            "message": "User not found"
        })),
    )
        .into_response()
}

fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": "An error occurred"
        })),
    )
        .into_response()
}
