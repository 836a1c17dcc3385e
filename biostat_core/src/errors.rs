//! # Error Types
//!
//! Structured error types for biostat_core. A failed calculation never
//! produces a partial [`CalculationResult`](crate::result::CalculationResult);
//! it returns one of these instead, carrying enough context (field, offending
//! value, violated constraint) for a front end to show a precise message.
//!
//! ## Example
//!
//! ```rust
//! use biostat_core::errors::{CalcError, CalcResult};
//!
//! fn validate_alpha(alpha: f64) -> CalcResult<()> {
//!     if !(alpha > 0.0 && alpha < 1.0) {
//!         return Err(CalcError::validation(
//!             "alpha",
//!             alpha.to_string(),
//!             "must lie strictly between 0 and 1",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_alpha(0.05).is_ok());
//! assert_eq!(validate_alpha(1.5).unwrap_err().error_code(), "VALIDATION_ERROR");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for biostat_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// A parsed value violates a domain precondition of the formula
    #[error("Invalid value for '{field}': {value} - {constraint}")]
    Validation {
        field: String,
        value: String,
        constraint: String,
    },

    /// A raw parameter could not be coerced to the expected numeric type
    #[error("Cannot parse '{field}' from {value}: {reason}")]
    InvalidParameter {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// No calculator is registered under this name
    #[error("Unknown calculator: {name}")]
    UnknownCalculator { name: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl CalcError {
    /// Create a Validation error
    pub fn validation(
        field: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        CalcError::Validation {
            field: field.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    /// Create an InvalidParameter error
    pub fn invalid_parameter(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::InvalidParameter {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create an UnknownCalculator error
    pub fn unknown_calculator(name: impl Into<String>) -> Self {
        CalcError::UnknownCalculator { name: name.into() }
    }

    /// The parameter this error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            CalcError::Validation { field, .. }
            | CalcError::InvalidParameter { field, .. }
            | CalcError::MissingField { field } => Some(field),
            _ => None,
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::Validation { .. } => "VALIDATION_ERROR",
            CalcError::InvalidParameter { .. } => "INVALID_PARAMETER",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::UnknownCalculator { .. } => "UNKNOWN_CALCULATOR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::validation("p", "1.2", "must lie strictly between 0 and 1");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"Validation\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("alpha").error_code(), "MISSING_FIELD");
        assert_eq!(
            CalcError::unknown_calculator("nope").error_code(),
            "UNKNOWN_CALCULATOR"
        );
        assert_eq!(
            CalcError::invalid_parameter("n", "abc", "not a number").error_code(),
            "INVALID_PARAMETER"
        );
    }

    #[test]
    fn test_error_field() {
        assert_eq!(CalcError::missing_field("power").field(), Some("power"));
        assert_eq!(CalcError::unknown_calculator("x").field(), None);
    }

    #[test]
    fn test_display_message() {
        let error = CalcError::validation("d", "0.7", "must lie in (0, 0.5)");
        assert_eq!(error.to_string(), "Invalid value for 'd': 0.7 - must lie in (0, 0.5)");
    }
}
