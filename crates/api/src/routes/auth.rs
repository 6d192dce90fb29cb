//! Authentication routes.
//!
//! The OAuth dance itself happens at the gateway; these endpoints take the
//! verified identity it produces, upsert the account, and mint our own
//! access/refresh token pair.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::AppState;
use paycycle_db::repositories::{OauthIdentity, UserError, UserRepository};
use paycycle_shared::TokenPair;

/// Creates the auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

/// Request body carrying a gateway-verified OAuth identity.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
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

/// Request body for refreshing an access token.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// A previously issued refresh token.
    pub refresh_token: String,
}

/// Response carrying a token pair and the user profile.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// User ID.
    pub user_id: Uuid,
    /// User email.
    pub email: String,
    /// Access and refresh tokens.
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// POST `/auth/login` - Exchange a verified OAuth identity for tokens.
async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> impl IntoResponse {
    if payload.email.is_empty() || payload.subject.is_empty() || payload.provider.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_identity",
                "message": "Provider, subject, and email are required"
            })),
        )
            .into_response();
    }

    let user_repo = UserRepository::new((*state.db).clone());

    let identity = OauthIdentity {
        provider: payload.provider,
        subject: payload.subject,
        email: payload.email,
        name: payload.name,
        avatar_url: payload.avatar_url,
    };

    let user = match user_repo.find_or_create(identity).await {
        Ok(user) => user,
        Err(UserError::DuplicateEmail(email)) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "email_taken",
                    "message": format!("Email {email} is already registered with another provider")
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Failed to resolve OAuth identity");
            return internal_error();
        }
    };

    match mint_tokens(&state, user.id, &user.email) {
        Ok(response) => {
            info!(user_id = %user.id, "User logged in");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(response) => response,
    }
}

/// POST `/auth/refresh` - Rotate an access token from a refresh token.
async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> impl IntoResponse {
    let claims = match state.jwt_service.validate_token(&payload.refresh_token) {
        Ok(claims) => claims,
        Err(paycycle_shared::JwtError::Expired) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "token_expired",
                    "message": "Refresh token has expired"
                })),
            )
                .into_response();
        }
        Err(_) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_token",
                    "message": "Invalid or malformed refresh token"
                })),
            )
                .into_response();
        }
    };

    match mint_tokens(&state, claims.user_id(), &claims.email) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(response) => response,
    }
}

/// Mints an access/refresh pair for the user.
fn mint_tokens(
    state: &AppState,
    user_id: Uuid,
    email: &str,
) -> Result<LoginResponse, axum::response::Response> {
    let access_token = state
        .jwt_service
        .generate_access_token(user_id, email)
        .map_err(|e| {
            error!(error = %e, "Failed to generate access token");
            internal_error()
        })?;
    let refresh_token = state
        .jwt_service
        .generate_refresh_token(user_id, email)
        .map_err(|e| {
            error!(error = %e, "Failed to generate refresh token");
            internal_error()
        })?;

    Ok(LoginResponse {
        user_id,
        email: email.to_string(),
        tokens: TokenPair::new(
            access_token,
            refresh_token,
            state.jwt_service.access_token_expires_in(),
        ),
    })
}

/// Standard opaque 500 response.
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
