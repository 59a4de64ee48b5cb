use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid table name '{name}': expected a plain SQL identifier")]
    InvalidTableName { name: String },

    #[error("No customer rows to analyze")]
    EmptyDataset,

    #[error("Table '{table}' already holds {rows} rows; synthetic data needs an empty table")]
    TableNotEmpty { table: String, rows: i64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// A per-row failure. Surfaced in the batch failure list, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordError {
    #[error("required field '{field}' is missing")]
    MissingField { field: &'static str },

    #[error("risk score {score} falls outside every tier bin")]
    UnclassifiedTier { score: f64 },

    #[error("field '{field}' holds unreadable value '{value}'; loaded as missing")]
    InvalidField { field: &'static str, value: String },
}
