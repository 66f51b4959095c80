//! # Error Types
//!
//! Domain-specific error types for mise-core.
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field name, limit, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation failures.
///
/// Raised by [`crate::validation`] before an action is accepted into the
/// queue. Enqueue is the only place these surface: once queued, an action
/// is known to be well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is empty or missing.
    #[error("Field '{field}' is required")]
    Required { field: String },

    /// A field exceeds its maximum length.
    #[error("Field '{field}' exceeds maximum length of {max}")]
    TooLong { field: String, max: usize },

    /// A field contains characters outside its allowed set.
    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A numeric field is outside its allowed range.
    #[error("Field '{field}' is out of range: {reason}")]
    OutOfRange { field: String, reason: String },
}

impl ValidationError {
    /// Creates a Required error for a field name.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Creates an OutOfRange error with a reason.
    pub fn out_of_range(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_field() {
        let err = ValidationError::required("sku");
        assert!(err.to_string().contains("sku"));

        let err = ValidationError::TooLong {
            field: "name".into(),
            max: 200,
        };
        assert!(err.to_string().contains("200"));
    }
}
