//! # Error Types
//!
//! Errors shared by every crate in the workspace. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! - [`ValidationError`]: a required field is missing or malformed.
//! - [`NirError`]: failures that are not tied to one domain crate
//!   (timestamp parsing, identifier parsing).

use thiserror::Error;

/// A request payload failed business-rule validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent or blank.
    #[error("required field `{0}` is missing")]
    MissingField(&'static str),

    /// A field was present but its value is not acceptable.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidField {
        /// Field name as it appears on the wire.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::InvalidField`].
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Top-level error type for core parsing failures.
#[derive(Error, Debug)]
pub enum NirError {
    /// Timestamp string could not be parsed.
    #[error("invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        input: String,
        /// Parser message.
        reason: String,
    },

    /// Identifier string was not a UUID.
    #[error("invalid identifier {input:?}: {reason}")]
    InvalidIdentifier {
        /// The rejected input.
        input: String,
        /// Parser message.
        reason: String,
    },

    /// Field-level validation failure.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Reject a blank string as a missing required field.
///
/// Returns the trimmed value so callers store normalised text.
pub fn require_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Like [`require_text`] but for optional inputs.
pub fn require_some_text(
    field: &'static str,
    value: Option<&str>,
) -> Result<String, ValidationError> {
    value
        .ok_or(ValidationError::MissingField(field))
        .and_then(|v| require_text(field, v))
}
