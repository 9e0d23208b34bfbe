//! Application error types.
//!
//! Errors are layered: narrow enums for each failure domain, composed into
//! a single `AppError` that the API layer maps onto HTTP status codes.

use thiserror::Error;

/// Errors from external services (indexer API, registries on disk).
#[derive(Debug, Error)]
pub enum ExternalServiceError {
    #[error("Service configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("External API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Failed to parse external response: {0}")]
    ParseError(String),

    #[error("External service unavailable: {0}")]
    Unavailable(String),

    #[error("External service timed out: {0}")]
    Timeout(String),
}

/// Request validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid Solana address '{0}': must be a base58-encoded 32-byte key")]
    InvalidAddress(String),
}

/// Configuration errors raised during startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(String),

    #[error("Invalid configuration value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    ExternalService(#[from] ExternalServiceError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not supported: {0}")]
    NotSupported(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_descriptive() {
        let err = AppError::Validation(ValidationError::InvalidAddress("abc".to_string()));
        assert!(err.to_string().contains("abc"));

        let err = AppError::ExternalService(ExternalServiceError::ApiError {
            status_code: 502,
            message: "bad gateway".to_string(),
        });
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_nested_error_conversion() {
        let err: AppError = ExternalServiceError::Network("connection refused".to_string()).into();
        assert!(matches!(err, AppError::ExternalService(_)));
    }
}
