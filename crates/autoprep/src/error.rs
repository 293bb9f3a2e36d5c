//! Error types for the preprocessing pipeline.
//!
//! Only failures that leave no meaningful partial result surface as errors.
//! Coercion problems become nulls and advisor problems fall back to the
//! heuristic, so a run fails only on polars errors or a rejected
//! configuration. Column-level errors are logged by the pipeline and the
//! column is left out.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// The main error type for the preprocessing pipeline.
#[derive(Error, Debug)]
pub enum PreprocessingError {
    /// Configuration rejected by validation.
    #[error("Configuration validation failed: {0}")]
    Config(#[from] ConfigValidationError),

    /// Two inputs that must be row-aligned have different lengths.
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Error with the operation it happened in.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PreprocessingError>,
    },
}

impl PreprocessingError {
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PreprocessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable machine-readable code. Context wrappers report the inner code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "INVALID_CONFIG",
            Self::LengthMismatch { .. } => "LENGTH_MISMATCH",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// True when the caller can fix its input and retry.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) | Self::LengthMismatch { .. } => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            Self::Polars(_) => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PreprocessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PreprocessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

pub type Result<T> = std::result::Result<T, PreprocessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PreprocessingError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatch() -> PreprocessingError {
        PreprocessingError::LengthMismatch {
            column: "spend".to_string(),
            expected: 10,
            found: 8,
        }
    }

    #[test]
    fn test_error_code() {
        assert_eq!(mismatch().error_code(), "LENGTH_MISMATCH");
        assert_eq!(
            PreprocessingError::Config(ConfigValidationError::InvalidKnnNeighbors(0)).error_code(),
            "INVALID_CONFIG"
        );
    }

    #[test]
    fn test_is_recoverable() {
        assert!(mismatch().is_recoverable());
        assert!(mismatch().with_context("Target encoding").is_recoverable());

        let polars = PreprocessingError::Polars(polars::error::PolarsError::NoData("empty".into()));
        assert!(!polars.is_recoverable());
    }

    #[test]
    fn test_error_serialization() {
        let json = serde_json::to_value(mismatch()).unwrap();
        assert_eq!(json["code"], "LENGTH_MISMATCH");
        assert_eq!(json["message"], "Column 'spend' has 8 rows, expected 10");
    }

    #[test]
    fn test_with_context() {
        let error = mismatch().with_context("KNN imputation");
        assert!(error.to_string().starts_with("KNN imputation: "));
        assert_eq!(error.error_code(), "LENGTH_MISMATCH");
    }

    #[test]
    fn test_polars_result_context() {
        let raw: std::result::Result<(), polars::error::PolarsError> = Err(
            polars::error::PolarsError::ColumnNotFound("price".into()),
        );
        let err = raw.context("Reading price").unwrap_err();
        assert_eq!(err.error_code(), "POLARS_ERROR");
        assert!(err.to_string().starts_with("Reading price"));
    }
}
