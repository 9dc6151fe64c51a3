//! API documentation endpoint
//!
//! Serves a static OpenAPI 3 document describing the HTTP surface:
//! - GET /api/v1/docs - OpenAPI JSON

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::api::middleware::AppState;
use crate::models::Category;

/// Build the docs router
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(openapi_spec))
}

/// GET /api/v1/docs - OpenAPI JSON
async fn openapi_spec() -> Json<Value> {
    Json(openapi_document())
}

fn openapi_document() -> Value {
    let categories: Vec<String> = Category::ALL.iter().map(|c| c.to_string()).collect();

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Expensary API",
            "description": "Personal expense tracking API with cookie-based authentication",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "paths": {
            "/api/v1/auth/register": {
                "post": {
                    "summary": "Register a new user",
                    "responses": {
                        "201": { "description": "User created" },
                        "400": { "description": "Missing or invalid fields" },
                        "409": { "description": "Username already taken" },
                    },
                },
            },
            "/api/v1/auth/login": {
                "post": {
                    "summary": "Log in and receive the token cookie",
                    "responses": {
                        "200": { "description": "Logged in; token cookie set" },
                        "400": { "description": "Missing fields" },
                        "401": { "description": "Invalid credentials" },
                    },
                },
            },
            "/api/v1/auth/logout": {
                "post": {
                    "summary": "Clear the token cookie",
                    "responses": { "200": { "description": "Logged out" } },
                },
            },
            "/api/v1/auth/me": {
                "get": {
                    "summary": "Get the current user",
                    "responses": {
                        "200": { "description": "Current user" },
                        "401": { "description": "Not authenticated" },
                    },
                },
            },
            "/api/v1/expenses": {
                "post": {
                    "summary": "Create an expense",
                    "responses": {
                        "201": { "description": "Expense created" },
                        "400": { "description": "Validation error" },
                        "401": { "description": "Not authenticated" },
                    },
                },
                "get": {
                    "summary": "List the current user's expenses",
                    "parameters": [
                        { "name": "category", "in": "query", "schema": { "type": "string" },
                          "description": "Category filter; ALL disables the filter" },
                        { "name": "minAmount", "in": "query", "schema": { "type": "number" } },
                        { "name": "maxAmount", "in": "query", "schema": { "type": "number" } },
                        { "name": "sortBy", "in": "query", "schema": { "type": "string",
                          "enum": ["createdAt", "amount", "title", "isRecurring"] } },
                        { "name": "order", "in": "query", "schema": { "type": "string",
                          "enum": ["asc", "desc"] } },
                    ],
                    "responses": {
                        "200": { "description": "Matching expenses" },
                        "400": { "description": "Invalid filter or sort parameter" },
                        "401": { "description": "Not authenticated" },
                    },
                },
            },
            "/api/v1/expenses/summary": {
                "get": {
                    "summary": "Per-category spending totals",
                    "responses": {
                        "200": { "description": "Totals of effective amounts by category" },
                        "401": { "description": "Not authenticated" },
                    },
                },
            },
            "/api/v1/expenses/{id}": {
                "get": {
                    "summary": "Get one expense",
                    "responses": {
                        "200": { "description": "The expense" },
                        "404": { "description": "Not found (or owned by another user)" },
                    },
                },
                "put": {
                    "summary": "Partially update an expense",
                    "responses": {
                        "200": { "description": "Updated expense" },
                        "400": { "description": "Validation error" },
                        "404": { "description": "Not found (or owned by another user)" },
                    },
                },
                "delete": {
                    "summary": "Delete an expense",
                    "responses": {
                        "200": { "description": "Deleted" },
                        "404": { "description": "Not found (or owned by another user)" },
                    },
                },
            },
        },
        "components": {
            "schemas": {
                "Category": { "type": "string", "enum": categories },
            },
        },
    })
}
