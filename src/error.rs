//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the crate.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Wrapper for XML parse errors.
    #[display("XML Error: {_0}")]
    Xml(roxmltree::Error),

    /// Fatal schema validation errors. These abort the current generation
    /// call; the message carries the original validation failure.
    #[from(ignore)]
    #[display("Schema Validation Error: {_0}")]
    Validation(String),

    /// Aggregate compilation failure, thrown only when the caller opted
    /// into exceptions on fatal diagnostics.
    #[from(ignore)]
    #[display("Compile Error: {_0}")]
    Compile(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Io(e) => Some(e),
            AppError::Xml(e) => Some(e),
            _ => None,
        }
    }
}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

/// The error raised by generated value-holder types when an assigned value
/// violates a schema restriction facet. Names the failing facet and the
/// rejected value; checks short-circuit, so only the first declared
/// violation is ever reported.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("value '{value}' violates facet '{facet}'")]
pub struct FacetViolation {
    /// The schema facet that was violated (e.g. `length`, `pattern`).
    pub facet: String,
    /// The offending value.
    pub value: String,
}

impl FacetViolation {
    /// Creates a violation for the given facet and offending value.
    pub fn new(facet: &str, value: &str) -> Self {
        Self {
            facet: facet.to_string(),
            value: value.to_string(),
        }
    }
}

impl std::error::Error for FacetViolation {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::Other, "test");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_string_conversion() {
        // Test that String defaults to General, not Validation
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_validation_manual_creation() {
        let app_err = AppError::Validation("bad schema".into());
        assert_eq!(
            format!("{}", app_err),
            "Schema Validation Error: bad schema"
        );
    }

    #[test]
    fn test_facet_violation_display() {
        let v = FacetViolation::new("maxLength", "abcdef");
        assert_eq!(format!("{}", v), "value 'abcdef' violates facet 'maxLength'");
    }
}
