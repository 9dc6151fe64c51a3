//! Expense API endpoints
//!
//! Handles HTTP requests for expense management. All routes require
//! authentication and operate strictly on the authenticated user's own
//! records:
//! - POST /api/v1/expenses - Create expense
//! - GET /api/v1/expenses - List with filters and sorting
//! - GET /api/v1/expenses/summary - Per-category totals
//! - GET /api/v1/expenses/{id} - Get one expense
//! - PUT /api/v1/expenses/{id} - Partial update
//! - DELETE /api/v1/expenses/{id} - Delete

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    Category, Expense, ExpenseQuery, ExpenseUpdate, NewExpense, SortField, SortOrder,
};
use crate::services::amount::expense_effective_amount;
use crate::services::ExpenseServiceError;

/// Build the expense router (mounted behind the auth middleware)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_expenses).post(create_expense))
        .route("/summary", get(get_summary))
        .route(
            "/{id}",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
}

/// Query string for listing expenses
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub category: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl ListParams {
    /// Convert raw query parameters into a typed query.
    ///
    /// `category=ALL` means no category filter; any other unknown
    /// category, sort field or order is a validation error.
    fn into_query(self) -> Result<ExpenseQuery, ApiError> {
        let category = match self.category.as_deref() {
            None => None,
            Some(raw) if raw.eq_ignore_ascii_case("ALL") => None,
            Some(raw) => Some(
                Category::from_str(raw)
                    .map_err(|_| ApiError::validation_error(format!("Invalid category: {}", raw)))?,
            ),
        };

        let sort_by = match self.sort_by.as_deref() {
            None => SortField::default(),
            Some(raw) => SortField::from_str(raw)
                .map_err(|_| ApiError::validation_error(format!("Invalid sort field: {}", raw)))?,
        };

        let order = match self.order.as_deref() {
            None => SortOrder::default(),
            Some(raw) => SortOrder::from_str(raw)
                .map_err(|_| ApiError::validation_error(format!("Invalid sort order: {}", raw)))?,
        };

        Ok(ExpenseQuery {
            category,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            sort_by,
            order,
        })
    }
}

/// Expense payload returned by every endpoint; the stored fields plus
/// the derived effective amount (discount applied to the subtotal,
/// then tax).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    #[serde(flatten)]
    pub expense: Expense,
    pub effective_amount: f64,
}

impl From<Expense> for ExpenseResponse {
    fn from(expense: Expense) -> Self {
        let effective_amount = expense_effective_amount(&expense);
        Self {
            expense,
            effective_amount,
        }
    }
}

fn map_service_error(e: ExpenseServiceError) -> ApiError {
    match e {
        ExpenseServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        ExpenseServiceError::NotFound => ApiError::not_found("Expense not found"),
        ExpenseServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
    }
}

/// POST /api/v1/expenses - Create expense
async fn create_expense(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<NewExpense>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .expense_service
        .create(user.0.id, body)
        .await
        .map_err(map_service_error)?;

    Ok((StatusCode::CREATED, Json(ExpenseResponse::from(created))))
}

/// GET /api/v1/expenses - List expenses
async fn list_expenses(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ExpenseResponse>>, ApiError> {
    let query = params.into_query()?;

    let expenses = state
        .expense_service
        .list(user.0.id, &query)
        .await
        .map_err(map_service_error)?;

    Ok(Json(expenses.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/expenses/summary - Per-category totals
async fn get_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .expense_service
        .summary(user.0.id)
        .await
        .map_err(map_service_error)?;

    Ok(Json(summary))
}

/// GET /api/v1/expenses/{id} - Get one expense
async fn get_expense(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ExpenseResponse>, ApiError> {
    let expense = state
        .expense_service
        .get(user.0.id, id)
        .await
        .map_err(map_service_error)?;

    Ok(Json(expense.into()))
}

/// PUT /api/v1/expenses/{id} - Partial update
async fn update_expense(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<ExpenseUpdate>,
) -> Result<Json<ExpenseResponse>, ApiError> {
    let updated = state
        .expense_service
        .update(user.0.id, id, body)
        .await
        .map_err(map_service_error)?;

    Ok(Json(updated.into()))
}

/// DELETE /api/v1/expenses/{id} - Delete expense
async fn delete_expense(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .expense_service
        .delete(user.0.id, id)
        .await
        .map_err(map_service_error)?;

    Ok(Json(serde_json::json!({ "message": "Expense deleted" })))
}
