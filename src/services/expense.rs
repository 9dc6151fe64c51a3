//! Expense service
//!
//! Validation and business rules for expense records. All operations
//! take the acting user's id and only ever touch that user's records;
//! a record belonging to someone else surfaces as `NotFound`.

use crate::db::repositories::ExpenseRepository;
use crate::models::{
    Category, Expense, ExpenseChanges, ExpenseQuery, ExpenseUpdate, NewExpense,
};
use crate::services::amount::expense_effective_amount;
use anyhow::Result;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;

/// Error types for expense operations
#[derive(Debug, thiserror::Error)]
pub enum ExpenseServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Expense missing or owned by another user
    #[error("Expense not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Per-category spending totals for the dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: Category,
    pub total: f64,
    pub count: usize,
}

/// Expense service
pub struct ExpenseService {
    expense_repo: Arc<dyn ExpenseRepository>,
}

impl ExpenseService {
    /// Create a new expense service
    pub fn new(expense_repo: Arc<dyn ExpenseRepository>) -> Self {
        Self { expense_repo }
    }

    /// Create an expense for the given owner.
    ///
    /// # Errors
    ///
    /// - `ValidationError` for an empty title, unknown category,
    ///   negative amount, non-positive quantity, or percentages
    ///   outside 0-100
    /// - `InternalError` for database errors
    pub async fn create(
        &self,
        owner_id: i64,
        input: NewExpense,
    ) -> Result<Expense, ExpenseServiceError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(ExpenseServiceError::ValidationError(
                "Title is required".to_string(),
            ));
        }

        let category = parse_category(&input.category)?;
        let amount = validate_amount(input.amount)?;
        let quantity = validate_quantity(input.quantity.unwrap_or(1))?;
        let tax_percent = validate_percent("taxPercent", input.tax_percent.unwrap_or(0.0))?;
        let discount = validate_percent("discount", input.discount.unwrap_or(0.0))?;

        let expense = Expense {
            id: 0,
            user_id: owner_id,
            title,
            category,
            amount,
            quantity,
            is_recurring: input.is_recurring.unwrap_or(false),
            tax_percent,
            discount,
            created_at: chrono::Utc::now(),
        };

        let created = self.expense_repo.create(&expense).await?;
        tracing::debug!(expense_id = created.id, user_id = owner_id, "Expense created");
        Ok(created)
    }

    /// Fetch a single expense owned by `owner_id`.
    pub async fn get(&self, owner_id: i64, id: i64) -> Result<Expense, ExpenseServiceError> {
        self.expense_repo
            .get(owner_id, id)
            .await?
            .ok_or(ExpenseServiceError::NotFound)
    }

    /// List the owner's expenses matching the query.
    pub async fn list(
        &self,
        owner_id: i64,
        query: &ExpenseQuery,
    ) -> Result<Vec<Expense>, ExpenseServiceError> {
        Ok(self.expense_repo.list(owner_id, query).await?)
    }

    /// Apply a partial update to an expense owned by `owner_id`.
    ///
    /// Supplied fields are validated with the same rules as creation;
    /// omitted fields keep their stored values. An empty update simply
    /// returns the current record.
    pub async fn update(
        &self,
        owner_id: i64,
        id: i64,
        input: ExpenseUpdate,
    ) -> Result<Expense, ExpenseServiceError> {
        let changes = validate_update(input)?;

        self.expense_repo
            .update(owner_id, id, &changes)
            .await?
            .ok_or(ExpenseServiceError::NotFound)
    }

    /// Delete an expense owned by `owner_id`.
    pub async fn delete(&self, owner_id: i64, id: i64) -> Result<(), ExpenseServiceError> {
        if !self.expense_repo.delete(owner_id, id).await? {
            return Err(ExpenseServiceError::NotFound);
        }
        tracing::debug!(expense_id = id, user_id = owner_id, "Expense deleted");
        Ok(())
    }

    /// Per-category totals of effective amounts (discount applied to
    /// the subtotal, then tax), for every category with at least one
    /// expense. Ordered by the fixed category display order.
    pub async fn summary(&self, owner_id: i64) -> Result<Vec<CategorySummary>, ExpenseServiceError> {
        let expenses = self
            .expense_repo
            .list(owner_id, &ExpenseQuery::default())
            .await?;

        let mut summaries = Vec::new();
        for category in Category::ALL {
            let matching: Vec<_> = expenses.iter().filter(|e| e.category == category).collect();
            if matching.is_empty() {
                continue;
            }
            summaries.push(CategorySummary {
                category,
                total: matching.iter().map(|e| expense_effective_amount(e)).sum(),
                count: matching.len(),
            });
        }

        Ok(summaries)
    }
}

fn parse_category(raw: &str) -> Result<Category, ExpenseServiceError> {
    Category::from_str(raw)
        .map_err(|_| ExpenseServiceError::ValidationError(format!("Invalid category: {}", raw)))
}

fn validate_amount(amount: f64) -> Result<f64, ExpenseServiceError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ExpenseServiceError::ValidationError(
            "Amount must be a non-negative number".to_string(),
        ));
    }
    Ok(amount)
}

fn validate_quantity(quantity: i64) -> Result<i64, ExpenseServiceError> {
    if quantity < 1 {
        return Err(ExpenseServiceError::ValidationError(
            "Quantity must be at least 1".to_string(),
        ));
    }
    Ok(quantity)
}

fn validate_percent(field: &str, value: f64) -> Result<f64, ExpenseServiceError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ExpenseServiceError::ValidationError(format!(
            "{} must be between 0 and 100",
            field
        )));
    }
    Ok(value)
}

fn validate_update(input: ExpenseUpdate) -> Result<ExpenseChanges, ExpenseServiceError> {
    let title = match input.title {
        Some(title) => {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(ExpenseServiceError::ValidationError(
                    "Title cannot be empty".to_string(),
                ));
            }
            Some(title)
        }
        None => None,
    };

    Ok(ExpenseChanges {
        title,
        category: input.category.as_deref().map(parse_category).transpose()?,
        amount: input.amount.map(validate_amount).transpose()?,
        quantity: input.quantity.map(validate_quantity).transpose()?,
        is_recurring: input.is_recurring,
        tax_percent: input
            .tax_percent
            .map(|v| validate_percent("taxPercent", v))
            .transpose()?,
        discount: input
            .discount
            .map(|v| validate_percent("discount", v))
            .transpose()?,
    })
}
