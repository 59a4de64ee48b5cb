//! Shared primitive types used across the crate.

/// A stable, unique identifier for a customer row.
pub type CustomerId = String;

/// Position of a row within a loaded batch.
pub type RowIndex = usize;

/// Number of monthly payment-status columns (`month_1` is the most recent).
pub const PAYMENT_MONTHS: usize = 6;

/// Default source table.
pub const DEFAULT_TABLE: &str = "delinquency_prediction";
