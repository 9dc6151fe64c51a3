//! Expense model
//!
//! Defines the Expense entity and the input/query types used by the
//! expense repository. Every expense belongs to exactly one user; all
//! reads and writes are filtered by (id, user_id) so one user can never
//! observe or mutate another user's records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed set of expense categories.
///
/// Category strings arriving from clients must map onto this set;
/// anything else is a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Food,
    Travel,
    Rent,
    Utilities,
    Other,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Travel,
        Category::Rent,
        Category::Utilities,
        Category::Other,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Food => write!(f, "FOOD"),
            Category::Travel => write!(f, "TRAVEL"),
            Category::Rent => write!(f, "RENT"),
            Category::Utilities => write!(f, "UTILITIES"),
            Category::Other => write!(f, "OTHER"),
        }
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FOOD" => Ok(Category::Food),
            "TRAVEL" => Ok(Category::Travel),
            "RENT" => Ok(Category::Rent),
            "UTILITIES" => Ok(Category::Utilities),
            "OTHER" => Ok(Category::Other),
            _ => Err(anyhow::anyhow!("Invalid category: {}", s)),
        }
    }
}

/// Expense entity owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Unique identifier
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Short description
    pub title: String,
    /// Expense category
    pub category: Category,
    /// Unit amount (non-negative)
    pub amount: f64,
    /// Number of units (positive)
    pub quantity: i64,
    /// Whether this expense repeats
    pub is_recurring: bool,
    /// Tax percentage applied after discount (0-100)
    pub tax_percent: f64,
    /// Discount percentage (0-100)
    pub discount: f64,
    /// Creation timestamp, assigned at insert
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new expense.
///
/// Title, category and amount are mandatory; the rest default per the
/// data model (quantity 1, not recurring, zero tax and discount).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub title: String,
    pub category: String,
    pub amount: f64,
    pub quantity: Option<i64>,
    pub is_recurring: Option<bool>,
    pub tax_percent: Option<f64>,
    pub discount: Option<f64>,
}

/// Partial update for an expense: only supplied fields change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseUpdate {
    pub title: Option<String>,
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub quantity: Option<i64>,
    pub is_recurring: Option<bool>,
    pub tax_percent: Option<f64>,
    pub discount: Option<f64>,
}

impl ExpenseUpdate {
    /// True when no field is supplied at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.amount.is_none()
            && self.quantity.is_none()
            && self.is_recurring.is_none()
            && self.tax_percent.is_none()
            && self.discount.is_none()
    }
}

/// Validated, typed form of [`ExpenseUpdate`] handed to the repository.
///
/// The category has been checked against the enumerated set by the
/// service layer before this struct exists.
#[derive(Debug, Clone, Default)]
pub struct ExpenseChanges {
    pub title: Option<String>,
    pub category: Option<Category>,
    pub amount: Option<f64>,
    pub quantity: Option<i64>,
    pub is_recurring: Option<bool>,
    pub tax_percent: Option<f64>,
    pub discount: Option<f64>,
}

impl ExpenseChanges {
    /// True when no field is supplied at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.amount.is_none()
            && self.quantity.is_none()
            && self.is_recurring.is_none()
            && self.tax_percent.is_none()
            && self.discount.is_none()
    }
}

/// Sortable expense fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    Amount,
    Title,
    IsRecurring,
}

impl SortField {
    /// Column name used in ORDER BY clauses. Whitelisted, never
    /// interpolated from client input directly.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Amount => "amount",
            SortField::Title => "title",
            SortField::IsRecurring => "is_recurring",
        }
    }
}

impl FromStr for SortField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" | "created_at" => Ok(SortField::CreatedAt),
            "amount" => Ok(SortField::Amount),
            "title" => Ok(SortField::Title),
            "isRecurring" | "is_recurring" => Ok(SortField::IsRecurring),
            _ => Err(anyhow::anyhow!("Invalid sort field: {}", s)),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(anyhow::anyhow!("Invalid sort order: {}", s)),
        }
    }
}

/// Query parameters for listing a user's expenses.
///
/// `category = None` means no category filter; amount bounds are
/// inclusive and apply to the unit amount. Defaults to newest first.
#[derive(Debug, Clone, Default)]
pub struct ExpenseQuery {
    pub category: Option<Category>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub sort_by: SortField,
    pub order: SortOrder,
}
