//! Data models
//!
//! This module contains all data structures used throughout Expensary.
//! Models represent:
//! - Database entities (User, Expense)
//! - Query and partial-update inputs for expenses

mod expense;
mod user;

pub use expense::{
    Category, Expense, ExpenseChanges, ExpenseQuery, ExpenseUpdate, NewExpense, SortField,
    SortOrder,
};
pub use user::User;
