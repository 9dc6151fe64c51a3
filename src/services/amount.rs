//! Effective amount calculation
//!
//! Pure, deterministic arithmetic deriving the final charge of an
//! expense from its unit amount, quantity, discount and tax:
//!
//! ```text
//! subtotal       = amount * quantity
//! discount_amount = subtotal * discount / 100
//! after_discount = subtotal - discount_amount
//! tax_amount     = after_discount * tax_percent / 100
//! effective      = after_discount + tax_amount
//! ```
//!
//! Tax is computed on the post-discount amount, not on the original
//! subtotal. Reversing that order changes results whenever both
//! discount and tax are nonzero, so the ordering here is contractual.
//!
//! Inputs are assumed to be validated to their ranges (amount >= 0,
//! quantity >= 1, percentages within 0-100) by the caller; nothing is
//! clamped here.

use serde::Serialize;

use crate::models::Expense;

/// Itemized result of the effective amount calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountBreakdown {
    pub subtotal: f64,
    pub discount_amount: f64,
    pub after_discount: f64,
    pub tax_amount: f64,
    pub effective: f64,
}

/// Compute the full breakdown for the given inputs.
pub fn breakdown(amount: f64, quantity: i64, discount: f64, tax_percent: f64) -> AmountBreakdown {
    let subtotal = amount * quantity as f64;
    let discount_amount = subtotal * discount / 100.0;
    let after_discount = subtotal - discount_amount;
    let tax_amount = after_discount * tax_percent / 100.0;
    let effective = after_discount + tax_amount;

    AmountBreakdown {
        subtotal,
        discount_amount,
        after_discount,
        tax_amount,
        effective,
    }
}

/// Effective charge for the given inputs.
pub fn effective_amount(amount: f64, quantity: i64, discount: f64, tax_percent: f64) -> f64 {
    breakdown(amount, quantity, discount, tax_percent).effective
}

/// Effective charge of an expense record.
pub fn expense_effective_amount(expense: &Expense) -> f64 {
    effective_amount(
        expense.amount,
        expense.quantity,
        expense.discount,
        expense.tax_percent,
    )
}
