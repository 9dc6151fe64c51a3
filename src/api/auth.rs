//! Authentication API endpoints
//!
//! Handles HTTP requests for user authentication:
//! - POST /api/v1/auth/register - User registration
//! - POST /api/v1/auth/login - User login (sets the token cookie)
//! - POST /api/v1/auth/logout - Clears the token cookie
//! - GET /api/v1/auth/me - Get current user

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, TOKEN_COOKIE};
use crate::services::AuthServiceError;

/// Request body for registration and login.
///
/// Both fields are optional at the serde level so that an absent key
/// gets the same 400 validation response as an empty value instead of
/// the extractor's 422.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CredentialsRequest {
    fn into_fields(self) -> Result<(String, String), ApiError> {
        let username = self.username.unwrap_or_default();
        let password = self.password.unwrap_or_default();

        if username.trim().is_empty() || password.is_empty() {
            return Err(ApiError::validation_error(
                "Username and password are required",
            ));
        }

        Ok((username, password))
    }
}

/// Response for user info
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
}

impl From<crate::models::User> for UserResponse {
    fn from(user: crate::models::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Response for successful login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/me", get(get_current_user))
}

fn set_cookie_headers(cookie: String) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::internal_error(format!("Invalid cookie value: {}", e)))?,
    );
    Ok(headers)
}

/// POST /api/v1/auth/register - User registration
async fn register(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (username, password) = body.into_fields()?;

    let user = state
        .auth_service
        .register(&username, &password)
        .await
        .map_err(|e| match e {
            AuthServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            AuthServiceError::UserExists(_) => ApiError::conflict("Username already taken"),
            _ => ApiError::internal_error(e.to_string()),
        })?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /api/v1/auth/login - User login
///
/// On success sets the `token` cookie carrying the signed token. Bad
/// credentials get the same response whether the username exists or
/// not.
async fn login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (username, password) = body.into_fields()?;

    let (user, token) = state
        .auth_service
        .login(&username, &password)
        .await
        .map_err(|e| match e {
            AuthServiceError::InvalidCredentials => {
                ApiError::unauthorized("Invalid credentials")
            }
            AuthServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            _ => ApiError::internal_error(e.to_string()),
        })?;

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        TOKEN_COOKIE,
        token,
        state.token_ttl_days * 24 * 60 * 60
    );
    let headers = set_cookie_headers(cookie)?;

    Ok((
        headers,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

/// POST /api/v1/auth/logout - User logout
///
/// Tokens are stateless, so logout is purely a cookie clear; it does
/// not need (or check) authentication.
async fn logout() -> Result<impl IntoResponse, ApiError> {
    let clear_cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        TOKEN_COOKIE
    );
    let headers = set_cookie_headers(clear_cookie)?;

    Ok((headers, Json(serde_json::json!({ "message": "Logged out" }))))
}

/// GET /api/v1/auth/me - Get current user
///
/// Requires authentication.
async fn get_current_user(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(user.0.into())
}
