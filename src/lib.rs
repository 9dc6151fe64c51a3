//! Expensary - A personal expense tracking API
//!
//! A small HTTP service for tracking personal expenses: cookie-based
//! authentication with signed stateless tokens, owner-scoped expense
//! CRUD with filtering and sorting, and per-category spending totals.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
