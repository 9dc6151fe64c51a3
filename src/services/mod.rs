//! Business logic services
//!
//! Services sit between the HTTP handlers and the repositories. They
//! validate input, enforce ownership and authentication rules, and map
//! failures onto typed error enums the API layer translates to status
//! codes.

pub mod amount;
pub mod auth;
pub mod expense;
pub mod password;
pub mod token;

pub use amount::{breakdown, effective_amount, AmountBreakdown};
pub use auth::{AuthService, AuthServiceError};
pub use expense::{CategorySummary, ExpenseService, ExpenseServiceError};
pub use token::{Claims, TokenCodec, TokenError};
