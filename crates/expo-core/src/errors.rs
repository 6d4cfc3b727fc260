//! Cross-cutting error types for Expo.
//!
//! Business-rule violations have their own typed enum in
//! [`crate::validation::ValidationError`]; repository errors live in `expo-db`.

use thiserror::Error;

/// Errors that can be raised by any Expo crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),
}
