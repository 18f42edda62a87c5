//! Core error types for the booking platform.
//!
//! This module defines storage-agnostic error types. Document-store-specific
//! failures are converted to these types at the store boundary.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the booking core.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation invalid for current state: {0}")]
    StateConflict(String),

    #[error("Upstream dependency failed: {0}")]
    Upstream(String),
}

/// Validation errors raised before any state mutation.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

impl Error {
    /// Returns true when retrying the same operation is safe (nothing advanced).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Upstream(_))
    }
}

// Stored documents that fail to decode are upstream data corruption, not
// caller input errors.
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Upstream(format!("document decode failed: {}", err))
    }
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}
