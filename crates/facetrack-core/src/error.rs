//! Error types for the face tracking core.
//!
//! Errors here are confined to configuration and input validation. The
//! pipeline itself treats runtime faults (camera loss, detector failure) as
//! ordinary states, not errors; those live with the capture layer.

use thiserror::Error;

/// A specialized `Result` type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Error type for the face tracking core.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoreError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
    },

    /// Validation error for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Description of what validation failed
        message: String,
    },
}

impl CoreError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::validation("score out of range");
        assert_eq!(err.to_string(), "Validation error: score out of range");

        let err = CoreError::configuration("smoothing must be in (0, 1)");
        assert!(err.to_string().starts_with("Configuration error:"));
    }
}
