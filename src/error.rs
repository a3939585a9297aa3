use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building the model at startup
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Dataset not found or unreadable: {}", path.display())]
    DatasetNotFound { path: PathBuf },

    #[error("Missing required columns: {missing:?}")]
    Schema { missing: Vec<String> },

    #[error("Invalid {field} value '{value}'. Must be one of: {allowed:?}")]
    InvalidCategory {
        field: &'static str,
        value: String,
        allowed: Vec<&'static str>,
    },

    #[error("Dataset contains no records")]
    EmptyDataset,

    #[error("Invalid value in column '{column}' at row {row}")]
    InvalidRecord { row: usize, column: &'static str },

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] PolarsError),
}

/// Errors returned from a single recommendation call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecommendError {
    /// The caller supplied a value outside the accepted domain
    #[error("Invalid {field} '{value}'. Must be one of: {allowed:?}")]
    InvalidInput {
        field: &'static str,
        value: String,
        allowed: Vec<&'static str>,
    },

    /// No trained model is available
    #[error("Model unavailable: {reason}")]
    ModelUnavailable { reason: String },
}

impl RecommendError {
    /// True when the failure was caused by the caller's input
    pub fn is_input_error(&self) -> bool {
        matches!(self, RecommendError::InvalidInput { .. })
    }
}

/// Validation functions
pub fn validate_track_temp(track_temp: f64) -> Result<(), RecommendError> {
    if !track_temp.is_finite() {
        return Err(RecommendError::InvalidInput {
            field: "track_temp",
            value: track_temp.to_string(),
            allowed: vec!["any finite number"],
        });
    }
    Ok(())
}
