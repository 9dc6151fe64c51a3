//! Expense repository
//!
//! Database operations for expense records. Every query here filters by
//! (id, user_id) or by user_id alone: ownership is enforced at the SQL
//! level, so a record belonging to another user is indistinguishable
//! from one that does not exist.
//!
//! Updates and deletes are single filtered statements whose affected-row
//! count doubles as the existence check; there is no separate
//! read-then-write step that could race with a concurrent delete.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Category, Expense, ExpenseChanges, ExpenseQuery};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

const EXPENSE_COLUMNS: &str =
    "id, user_id, title, category, amount, quantity, is_recurring, tax_percent, discount, created_at";

/// Expense repository trait. All operations are scoped to an owner.
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// Insert a new expense; the id and timestamp are server-assigned.
    async fn create(&self, expense: &Expense) -> Result<Expense>;

    /// Fetch one expense by (id, owner). `None` covers both a missing
    /// record and a record owned by someone else.
    async fn get(&self, owner_id: i64, id: i64) -> Result<Option<Expense>>;

    /// List the owner's expenses matching the query, sorted as asked.
    async fn list(&self, owner_id: i64, query: &ExpenseQuery) -> Result<Vec<Expense>>;

    /// Apply the supplied fields to the expense matching (id, owner).
    /// Returns the updated record, or `None` if nothing matched.
    async fn update(
        &self,
        owner_id: i64,
        id: i64,
        changes: &ExpenseChanges,
    ) -> Result<Option<Expense>>;

    /// Delete the expense matching (id, owner). Returns whether a row
    /// was removed; deleting an already-deleted id yields `false`.
    async fn delete(&self, owner_id: i64, id: i64) -> Result<bool>;
}

/// SQLx-based expense repository implementation
pub struct SqlxExpenseRepository {
    pool: DynDatabasePool,
}

impl SqlxExpenseRepository {
    /// Create a new SQLx expense repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for dependency injection
    pub fn shared(pool: DynDatabasePool) -> Arc<dyn ExpenseRepository> {
        Arc::new(Self::new(pool))
    }

    fn sqlite(&self) -> Result<&SqlitePool> {
        self.pool.as_sqlite().context("Missing SQLite pool")
    }

    fn mysql(&self) -> Result<&MySqlPool> {
        self.pool.as_mysql().context("Missing MySQL pool")
    }
}

#[async_trait]
impl ExpenseRepository for SqlxExpenseRepository {
    async fn create(&self, expense: &Expense) -> Result<Expense> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_expense_sqlite(self.sqlite()?, expense).await,
            DatabaseDriver::Mysql => create_expense_mysql(self.mysql()?, expense).await,
        }
    }

    async fn get(&self, owner_id: i64, id: i64) -> Result<Option<Expense>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_expense_sqlite(self.sqlite()?, owner_id, id).await,
            DatabaseDriver::Mysql => get_expense_mysql(self.mysql()?, owner_id, id).await,
        }
    }

    async fn list(&self, owner_id: i64, query: &ExpenseQuery) -> Result<Vec<Expense>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_expenses_sqlite(self.sqlite()?, owner_id, query).await,
            DatabaseDriver::Mysql => list_expenses_mysql(self.mysql()?, owner_id, query).await,
        }
    }

    async fn update(
        &self,
        owner_id: i64,
        id: i64,
        changes: &ExpenseChanges,
    ) -> Result<Option<Expense>> {
        // Nothing supplied: behave as a read so callers still get the
        // 404-vs-record distinction
        if changes.is_empty() {
            return self.get(owner_id, id).await;
        }

        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_expense_sqlite(self.sqlite()?, owner_id, id, changes).await
            }
            DatabaseDriver::Mysql => {
                update_expense_mysql(self.mysql()?, owner_id, id, changes).await
            }
        }
    }

    async fn delete(&self, owner_id: i64, id: i64) -> Result<bool> {
        let sql = "DELETE FROM expenses WHERE id = ? AND user_id = ?";

        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .bind(owner_id)
                .execute(self.sqlite()?)
                .await
                .context("Failed to delete expense")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .bind(owner_id)
                .execute(self.mysql()?)
                .await
                .context("Failed to delete expense")?
                .rows_affected(),
        };

        Ok(affected > 0)
    }
}

// ============================================================================
// SQL construction
// ============================================================================

/// Build the filtered, sorted list query. Sort columns come from the
/// `SortField` whitelist, never from raw client input.
fn list_sql(query: &ExpenseQuery) -> String {
    let mut sql = format!(
        "SELECT {} FROM expenses WHERE user_id = ?",
        EXPENSE_COLUMNS
    );

    if query.category.is_some() {
        sql.push_str(" AND category = ?");
    }
    if query.min_amount.is_some() {
        sql.push_str(" AND amount >= ?");
    }
    if query.max_amount.is_some() {
        sql.push_str(" AND amount <= ?");
    }

    sql.push_str(&format!(
        " ORDER BY {} {}",
        query.sort_by.column(),
        query.order.sql()
    ));

    sql
}

/// Build the SET clause for a partial update. Caller guarantees at
/// least one field is present.
fn update_set_clause(changes: &ExpenseChanges) -> String {
    let mut sets = Vec::new();

    if changes.title.is_some() {
        sets.push("title = ?");
    }
    if changes.category.is_some() {
        sets.push("category = ?");
    }
    if changes.amount.is_some() {
        sets.push("amount = ?");
    }
    if changes.quantity.is_some() {
        sets.push("quantity = ?");
    }
    if changes.is_recurring.is_some() {
        sets.push("is_recurring = ?");
    }
    if changes.tax_percent.is_some() {
        sets.push("tax_percent = ?");
    }
    if changes.discount.is_some() {
        sets.push("discount = ?");
    }

    sets.join(", ")
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_expense_sqlite(pool: &SqlitePool, expense: &Expense) -> Result<Expense> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO expenses (user_id, title, category, amount, quantity, is_recurring, tax_percent, discount, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(expense.user_id)
    .bind(&expense.title)
    .bind(expense.category.to_string())
    .bind(expense.amount)
    .bind(expense.quantity)
    .bind(expense.is_recurring)
    .bind(expense.tax_percent)
    .bind(expense.discount)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create expense")?;

    Ok(Expense {
        id: result.last_insert_rowid(),
        created_at: now,
        ..expense.clone()
    })
}

async fn get_expense_sqlite(pool: &SqlitePool, owner_id: i64, id: i64) -> Result<Option<Expense>> {
    let sql = format!(
        "SELECT {} FROM expenses WHERE id = ? AND user_id = ?",
        EXPENSE_COLUMNS
    );

    let row = sqlx::query_as::<_, ExpenseRow>(&sql)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get expense")?;

    row.map(ExpenseRow::into_expense).transpose()
}

async fn list_expenses_sqlite(
    pool: &SqlitePool,
    owner_id: i64,
    query: &ExpenseQuery,
) -> Result<Vec<Expense>> {
    let sql = list_sql(query);

    let mut q = sqlx::query_as::<_, ExpenseRow>(&sql).bind(owner_id);
    if let Some(category) = query.category {
        q = q.bind(category.to_string());
    }
    if let Some(min) = query.min_amount {
        q = q.bind(min);
    }
    if let Some(max) = query.max_amount {
        q = q.bind(max);
    }

    let rows = q
        .fetch_all(pool)
        .await
        .context("Failed to list expenses")?;

    rows.into_iter().map(ExpenseRow::into_expense).collect()
}

async fn update_expense_sqlite(
    pool: &SqlitePool,
    owner_id: i64,
    id: i64,
    changes: &ExpenseChanges,
) -> Result<Option<Expense>> {
    // Single statement: the RETURNING row is both the existence check
    // and the fresh record
    let sql = format!(
        "UPDATE expenses SET {} WHERE id = ? AND user_id = ? RETURNING {}",
        update_set_clause(changes),
        EXPENSE_COLUMNS
    );

    let mut q = sqlx::query_as::<_, ExpenseRow>(&sql);
    if let Some(title) = &changes.title {
        q = q.bind(title);
    }
    if let Some(category) = changes.category {
        q = q.bind(category.to_string());
    }
    if let Some(amount) = changes.amount {
        q = q.bind(amount);
    }
    if let Some(quantity) = changes.quantity {
        q = q.bind(quantity);
    }
    if let Some(is_recurring) = changes.is_recurring {
        q = q.bind(is_recurring);
    }
    if let Some(tax_percent) = changes.tax_percent {
        q = q.bind(tax_percent);
    }
    if let Some(discount) = changes.discount {
        q = q.bind(discount);
    }

    let row = q
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
        .context("Failed to update expense")?;

    row.map(ExpenseRow::into_expense).transpose()
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_expense_mysql(pool: &MySqlPool, expense: &Expense) -> Result<Expense> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO expenses (user_id, title, category, amount, quantity, is_recurring, tax_percent, discount, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(expense.user_id)
    .bind(&expense.title)
    .bind(expense.category.to_string())
    .bind(expense.amount)
    .bind(expense.quantity)
    .bind(expense.is_recurring)
    .bind(expense.tax_percent)
    .bind(expense.discount)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create expense")?;

    Ok(Expense {
        id: result.last_insert_id() as i64,
        created_at: now,
        ..expense.clone()
    })
}

async fn get_expense_mysql(pool: &MySqlPool, owner_id: i64, id: i64) -> Result<Option<Expense>> {
    let sql = format!(
        "SELECT {} FROM expenses WHERE id = ? AND user_id = ?",
        EXPENSE_COLUMNS
    );

    let row = sqlx::query_as::<_, ExpenseRow>(&sql)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get expense")?;

    row.map(ExpenseRow::into_expense).transpose()
}

async fn list_expenses_mysql(
    pool: &MySqlPool,
    owner_id: i64,
    query: &ExpenseQuery,
) -> Result<Vec<Expense>> {
    let sql = list_sql(query);

    let mut q = sqlx::query_as::<_, ExpenseRow>(&sql).bind(owner_id);
    if let Some(category) = query.category {
        q = q.bind(category.to_string());
    }
    if let Some(min) = query.min_amount {
        q = q.bind(min);
    }
    if let Some(max) = query.max_amount {
        q = q.bind(max);
    }

    let rows = q
        .fetch_all(pool)
        .await
        .context("Failed to list expenses")?;

    rows.into_iter().map(ExpenseRow::into_expense).collect()
}

async fn update_expense_mysql(
    pool: &MySqlPool,
    owner_id: i64,
    id: i64,
    changes: &ExpenseChanges,
) -> Result<Option<Expense>> {
    // MySQL has no UPDATE ... RETURNING; the affected-row count of the
    // single filtered statement is the authoritative existence check,
    // and only then is the row re-read. (sqlx connects with
    // CLIENT_FOUND_ROWS, so the count means "matched", not "changed".)
    let sql = format!(
        "UPDATE expenses SET {} WHERE id = ? AND user_id = ?",
        update_set_clause(changes)
    );

    let mut q = sqlx::query(&sql);
    if let Some(title) = &changes.title {
        q = q.bind(title);
    }
    if let Some(category) = changes.category {
        q = q.bind(category.to_string());
    }
    if let Some(amount) = changes.amount {
        q = q.bind(amount);
    }
    if let Some(quantity) = changes.quantity {
        q = q.bind(quantity);
    }
    if let Some(is_recurring) = changes.is_recurring {
        q = q.bind(is_recurring);
    }
    if let Some(tax_percent) = changes.tax_percent {
        q = q.bind(tax_percent);
    }
    if let Some(discount) = changes.discount {
        q = q.bind(discount);
    }

    let result = q
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await
        .context("Failed to update expense")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_expense_mysql(pool, owner_id, id).await
}

/// Row shape shared by both drivers
#[derive(sqlx::FromRow)]
struct ExpenseRow {
    id: i64,
    user_id: i64,
    title: String,
    category: String,
    amount: f64,
    quantity: i64,
    is_recurring: bool,
    tax_percent: f64,
    discount: f64,
    created_at: chrono::DateTime<Utc>,
}

impl ExpenseRow {
    fn into_expense(self) -> Result<Expense> {
        let category = Category::from_str(&self.category)
            .with_context(|| format!("Invalid category in database: {}", self.category))?;

        Ok(Expense {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            category,
            amount: self.amount,
            quantity: self.quantity,
            is_recurring: self.is_recurring,
            tax_percent: self.tax_percent,
            discount: self.discount,
            created_at: self.created_at,
        })
    }
}
