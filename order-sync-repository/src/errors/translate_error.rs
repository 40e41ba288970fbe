//! Query translation error types.

use order_sync_shared::FilterOperator;
use thiserror::Error;

/// Errors produced while compiling a generic filter request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslateError {
    /// The backend's operator table has no token for the operator.
    #[error("Operator '{operator}' is not supported by the {backend} backend")]
    UnsupportedOperator {
        backend: String,
        operator: FilterOperator,
    },

    /// A date-valued field received something other than `YYYY-MM-DD`.
    #[error("Invalid date '{value}' for field '{field}', expected YYYY-MM-DD")]
    InvalidDate { field: String, value: String },

    /// The clause value has the wrong shape for the operator.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// Two backend mappings disagree on which fields or operators exist.
    #[error("Inconsistent backend mappings: {0}")]
    InconsistentMapping(String),
}

impl TranslateError {
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
