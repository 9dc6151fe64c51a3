//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for Expensary:
//! - Auth endpoints (register, login, logout, me)
//! - Expense endpoints (CRUD, filtered listing, category summary)

pub mod auth;
pub mod docs;
pub mod expenses;
pub mod middleware;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Protected routes (need a valid token)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/expenses", expenses::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .nest("/docs", docs::router())
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // CORS configured for cookie-based auth from the frontend origin
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
            .allow_credentials(true),
        Err(e) => {
            tracing::warn!("Invalid CORS origin {:?}, CORS disabled: {}", cors_origin, e);
            CorsLayer::new()
        }
    };

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxExpenseRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::services::{AuthService, ExpenseService, TokenCodec};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::sync::Arc;

    async fn test_server() -> TestServer {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let state = AppState {
            auth_service: Arc::new(AuthService::new(
                SqlxUserRepository::shared(pool.clone()),
                TokenCodec::new("test-secret", 7),
            )),
            expense_service: Arc::new(ExpenseService::new(SqlxExpenseRepository::shared(pool))),
            token_ttl_days: 7,
        };

        let mut server =
            TestServer::new(build_router(state, "http://localhost:3000")).expect("server");
        server.save_cookies();
        server
    }

    async fn register_and_login(server: &TestServer, username: &str) {
        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({ "username": username, "password": "password123" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "username": username, "password": "password123" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_returns_created_user() {
        let server = test_server().await;

        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({ "username": "alice", "password": "password123" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["username"], "alice");
        assert!(body["id"].as_i64().unwrap() > 0);
        assert!(body.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_username_conflicts() {
        let server = test_server().await;
        register_and_login(&server, "alice").await;

        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({ "username": "alice", "password": "other" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_register_missing_fields_rejected() {
        let server = test_server().await;

        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({ "username": "", "password": "x" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_absent_keys_get_validation_envelope() {
        let server = test_server().await;

        // A body without the password key must get the same 400
        // envelope as an empty value, not an extractor 422
        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({ "username": "alice" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_login_absent_keys_get_validation_envelope() {
        let server = test_server().await;

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "username": "alice" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_docs_are_public() {
        let server = test_server().await;

        let response = server.get("/api/v1/docs").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["openapi"], "3.0.3");
        assert!(body["paths"]["/api/v1/expenses"].is_object());
    }

    #[tokio::test]
    async fn test_login_sets_http_only_cookie() {
        let server = test_server().await;
        server
            .post("/api/v1/auth/register")
            .json(&json!({ "username": "alice", "password": "password123" }))
            .await;

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "username": "alice", "password": "password123" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let cookie = response
            .header(axum::http::header::SET_COOKIE)
            .to_str()
            .expect("cookie header")
            .to_string();
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("SameSite=Lax"));
    }

    #[tokio::test]
    async fn test_login_failures_share_one_response() {
        let server = test_server().await;
        server
            .post("/api/v1/auth/register")
            .json(&json!({ "username": "alice", "password": "password123" }))
            .await;

        let unknown = server
            .post("/api/v1/auth/login")
            .json(&json!({ "username": "nobody", "password": "password123" }))
            .await;
        let wrong = server
            .post("/api/v1/auth/login")
            .json(&json!({ "username": "alice", "password": "wrong" }))
            .await;

        assert_eq!(unknown.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);
        let unknown_body: Value = unknown.json();
        let wrong_body: Value = wrong.json();
        assert_eq!(unknown_body, wrong_body);
    }

    #[tokio::test]
    async fn test_me_requires_auth() {
        let server = test_server().await;

        let response = server.get("/api/v1/auth/me").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_returns_current_user() {
        let server = test_server().await;
        register_and_login(&server, "alice").await;

        let response = server.get("/api/v1/auth/me").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["username"], "alice");
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let server = test_server().await;
        register_and_login(&server, "alice").await;

        let response = server.post("/api/v1/auth/logout").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let cookie = response
            .header(axum::http::header::SET_COOKIE)
            .to_str()
            .expect("cookie header")
            .to_string();
        assert!(cookie.contains("Max-Age=0"));

        let me = server.get("/api/v1/auth/me").await;
        assert_eq!(me.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expenses_require_auth() {
        let server = test_server().await;

        let response = server.get("/api/v1/expenses").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

        let response = server
            .post("/api/v1/expenses")
            .json(&json!({ "title": "Lunch", "category": "FOOD", "amount": 10.0 }))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_expense_with_defaults() {
        let server = test_server().await;
        register_and_login(&server, "alice").await;

        let response = server
            .post("/api/v1/expenses")
            .json(&json!({ "title": "Lunch", "category": "FOOD", "amount": 10.0 }))
            .await;

        assert_eq!(response.status_code(), StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["title"], "Lunch");
        assert_eq!(body["category"], "FOOD");
        assert_eq!(body["quantity"], 1);
        assert_eq!(body["isRecurring"], false);
        assert_eq!(body["taxPercent"], 0.0);
        assert_eq!(body["discount"], 0.0);
        assert_eq!(body["effectiveAmount"], 10.0);
    }

    #[tokio::test]
    async fn test_create_expense_reports_effective_amount() {
        let server = test_server().await;
        register_and_login(&server, "alice").await;

        let response = server
            .post("/api/v1/expenses")
            .json(&json!({
                "title": "Feast",
                "category": "FOOD",
                "amount": 100.0,
                "quantity": 2,
                "discount": 10.0,
                "taxPercent": 5.0
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::CREATED);
        let body: Value = response.json();
        // 200 subtotal, minus 10% discount, plus 5% tax
        assert!((body["effectiveAmount"].as_f64().unwrap() - 189.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_create_expense_rejects_bad_category() {
        let server = test_server().await;
        register_and_login(&server, "alice").await;

        let response = server
            .post("/api/v1/expenses")
            .json(&json!({ "title": "Lunch", "category": "SNACKS", "amount": 10.0 }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let server = test_server().await;
        register_and_login(&server, "alice").await;

        for (title, category, amount) in [
            ("Lunch", "FOOD", 15.0),
            ("Dinner", "FOOD", 60.0),
            ("Snack", "FOOD", 40.0),
            ("Taxi", "TRAVEL", 30.0),
        ] {
            server
                .post("/api/v1/expenses")
                .json(&json!({ "title": title, "category": category, "amount": amount }))
                .await;
        }

        let response = server
            .get("/api/v1/expenses")
            .add_query_param("category", "FOOD")
            .add_query_param("minAmount", "10")
            .add_query_param("maxAmount", "50")
            .add_query_param("sortBy", "amount")
            .add_query_param("order", "asc")
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        let titles: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Lunch", "Snack"]);
    }

    #[tokio::test]
    async fn test_list_category_all_means_no_filter() {
        let server = test_server().await;
        register_and_login(&server, "alice").await;

        server
            .post("/api/v1/expenses")
            .json(&json!({ "title": "Lunch", "category": "FOOD", "amount": 10.0 }))
            .await;
        server
            .post("/api/v1/expenses")
            .json(&json!({ "title": "Taxi", "category": "TRAVEL", "amount": 30.0 }))
            .await;

        let response = server
            .get("/api/v1/expenses")
            .add_query_param("category", "ALL")
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_sort_field() {
        let server = test_server().await;
        register_and_login(&server, "alice").await;

        let response = server
            .get("/api/v1/expenses")
            .add_query_param("sortBy", "userId")
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_expenses_are_owner_scoped() {
        let server = test_server().await;

        register_and_login(&server, "alice").await;
        let created = server
            .post("/api/v1/expenses")
            .json(&json!({ "title": "Secret", "category": "OTHER", "amount": 10.0 }))
            .await;
        let expense_id = created.json::<Value>()["id"].as_i64().unwrap();

        // Switch to a different account
        register_and_login(&server, "bob").await;

        let get = server.get(&format!("/api/v1/expenses/{}", expense_id)).await;
        assert_eq!(get.status_code(), StatusCode::NOT_FOUND);

        let update = server
            .put(&format!("/api/v1/expenses/{}", expense_id))
            .json(&json!({ "title": "Stolen" }))
            .await;
        assert_eq!(update.status_code(), StatusCode::NOT_FOUND);

        let delete = server
            .delete(&format!("/api/v1/expenses/{}", expense_id))
            .await;
        assert_eq!(delete.status_code(), StatusCode::NOT_FOUND);

        let list = server.get("/api/v1/expenses").await;
        assert_eq!(list.json::<Value>().as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_update_changes_supplied_fields_only() {
        let server = test_server().await;
        register_and_login(&server, "alice").await;

        let created = server
            .post("/api/v1/expenses")
            .json(&json!({ "title": "Internet", "category": "UTILITIES", "amount": 40.0 }))
            .await;
        let expense_id = created.json::<Value>()["id"].as_i64().unwrap();

        let response = server
            .put(&format!("/api/v1/expenses/{}", expense_id))
            .json(&json!({ "amount": 45.0, "isRecurring": true }))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["amount"], 45.0);
        assert_eq!(body["isRecurring"], true);
        assert_eq!(body["title"], "Internet");
        assert_eq!(body["category"], "UTILITIES");
    }

    #[tokio::test]
    async fn test_delete_then_delete_again_is_not_found() {
        let server = test_server().await;
        register_and_login(&server, "alice").await;

        let created = server
            .post("/api/v1/expenses")
            .json(&json!({ "title": "Gone", "category": "OTHER", "amount": 5.0 }))
            .await;
        let expense_id = created.json::<Value>()["id"].as_i64().unwrap();

        let first = server
            .delete(&format!("/api/v1/expenses/{}", expense_id))
            .await;
        assert_eq!(first.status_code(), StatusCode::OK);

        let second = server
            .delete(&format!("/api/v1/expenses/{}", expense_id))
            .await;
        assert_eq!(second.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_summary_totals_by_category() {
        let server = test_server().await;
        register_and_login(&server, "alice").await;

        server
            .post("/api/v1/expenses")
            .json(&json!({ "title": "Lunch", "category": "FOOD", "amount": 10.0 }))
            .await;
        server
            .post("/api/v1/expenses")
            .json(&json!({ "title": "Dinner", "category": "FOOD", "amount": 20.0 }))
            .await;
        server
            .post("/api/v1/expenses")
            .json(&json!({ "title": "Taxi", "category": "TRAVEL", "amount": 30.0 }))
            .await;

        let response = server.get("/api/v1/expenses/summary").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        let summary = body.as_array().unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0]["category"], "FOOD");
        assert_eq!(summary[0]["total"], 30.0);
        assert_eq!(summary[0]["count"], 2);
        assert_eq!(summary[1]["category"], "TRAVEL");
        assert_eq!(summary[1]["total"], 30.0);
    }

    #[tokio::test]
    async fn test_bearer_token_works_without_cookie() {
        let mut server = test_server().await;
        server
            .post("/api/v1/auth/register")
            .json(&json!({ "username": "alice", "password": "password123" }))
            .await;
        let login = server
            .post("/api/v1/auth/login")
            .json(&json!({ "username": "alice", "password": "password123" }))
            .await;
        let token = login.json::<Value>()["token"].as_str().unwrap().to_string();

        server.clear_cookies();
        let response = server
            .get("/api/v1/auth/me")
            .authorization_bearer(&token)
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_tampered_token_rejected() {
        let mut server = test_server().await;
        register_and_login(&server, "alice").await;
        server.clear_cookies();

        let response = server
            .get("/api/v1/auth/me")
            .authorization_bearer("forged.token")
            .await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }
}
