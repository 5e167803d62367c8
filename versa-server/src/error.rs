//! Error types for the server application

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Server application error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error(transparent)]
    Prompts(#[from] versa_prompts::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] versa_storage::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<versa_core::Error> for Error {
    fn from(err: versa_core::Error) -> Self {
        match err {
            versa_core::Error::Configuration { message } => Error::Configuration(message),
            other => Error::Prompts(other.into()),
        }
    }
}

/// Convenience result type for server operations
pub type Result<T> = std::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Error::Prompts(ref err) if err.is_validation() => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Error::Prompts(ref err) if err.is_not_found() => {
                (StatusCode::NOT_FOUND, err.to_string())
            }
            ref err => {
                tracing::error!("Request failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let validation: Error = versa_prompts::Error::validation("bad content").into();
        assert_eq!(validation.into_response().status(), StatusCode::BAD_REQUEST);

        let missing: Error = versa_prompts::Error::not_found("knowledge.rag_prompt").into();
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let storage: Error =
            versa_prompts::Error::Storage(versa_storage::Error::Migration("boom".into())).into();
        assert_eq!(
            storage.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_core_configuration_errors_stay_configuration() {
        let err: Error = versa_core::Error::configuration("bad catalog").into();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
