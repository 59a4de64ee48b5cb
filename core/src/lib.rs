//! Delinquency risk scoring: load customer rows, score and tier them,
//! aggregate the results for reporting.

pub mod analytics;
pub mod charts;
pub mod config;
pub mod error;
pub mod record;
pub mod report;
pub mod risk_scorer;
pub mod rng;
pub mod stats;
pub mod store;
pub mod synthetic;
pub mod types;
