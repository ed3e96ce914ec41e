//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address")]
    InvalidBindAddress,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid Twilio account SID format")]
    InvalidAccountSid,

    #[error("Public base URL must be an absolute http(s) URL")]
    InvalidPublicUrl,

    #[error("Public base URL must use HTTPS in production")]
    PublicUrlMustBeHttps,

    #[error(
        "Request timeout of {request_secs}s is shorter than the slowest turn ({turn_secs}s: PDF rendering plus pool acquire)"
    )]
    RequestTimeoutTooShort { request_secs: u64, turn_secs: u64 },

    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),
}
