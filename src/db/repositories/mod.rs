//! Repositories
//!
//! Data access for users and expenses. Each repository is a trait with
//! a SQLx implementation supporting both SQLite and MySQL, injected
//! into the services at startup.

mod expense;
mod user;

pub use expense::{ExpenseRepository, SqlxExpenseRepository};
pub use user::{SqlxUserRepository, UserRepository};
