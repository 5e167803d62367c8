//! Error types for prompt management
//!
//! Every failure surfaces as one of three categories: bad input, a missing
//! prompt/version, or a storage failure.

use thiserror::Error;

/// Prompt management error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Storage error: {0}")]
    Storage(versa_storage::Error),
}

impl Error {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "validation",
            Error::NotFound { .. } => "not_found",
            Error::Storage(_) => "storage",
        }
    }
}

impl From<versa_core::Error> for Error {
    fn from(err: versa_core::Error) -> Self {
        match err {
            versa_core::Error::Validation { message }
            | versa_core::Error::Configuration { message } => Error::Validation { message },
        }
    }
}

impl From<versa_storage::Error> for Error {
    fn from(err: versa_storage::Error) -> Self {
        match err {
            versa_storage::Error::Core(core) => core.into(),
            other => Error::Storage(other),
        }
    }
}

/// Convenience result type for prompt operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_fold_into_validation() {
        let err: Error = versa_core::Error::validation("too short").into();
        assert!(err.is_validation());
        assert!(err.to_string().contains("too short"));

        let err: Error = versa_core::Error::configuration("bad allow-list").into();
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn test_storage_errors_fold_into_categories() {
        let err: Error = versa_storage::Error::Migration("disk full".to_string()).into();
        assert!(err.is_storage());
        assert_eq!(err.category(), "storage");

        let err: Error = versa_storage::Error::Core(versa_core::Error::validation("bad key")).into();
        assert!(err.is_validation());

        let err = Error::not_found("knowledge.rag_prompt v4");
        assert!(err.is_not_found());
        assert!(!err.is_storage());
    }
}
