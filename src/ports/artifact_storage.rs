//! Artifact Storage Port - where generated reports live.
//!
//! Artifacts are addressed by a flat file name; the storage decides the
//! location. Names containing path separators or `..` are rejected so the
//! download endpoint cannot escape the storage root.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Port for storing and serving generated artifacts.
///
/// # Contract
///
/// Implementations must:
/// - Write atomically (no partial content visible on failure)
/// - Reject names that are not a single plain path component
#[async_trait]
pub trait ArtifactStorage: Send + Sync {
    /// Stores `content` under `name` and returns its SHA-256 checksum (hex).
    async fn write(&self, name: &str, content: &[u8]) -> Result<String, StorageError>;

    /// Reads a stored artifact.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the artifact doesn't exist.
    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Deletes artifacts last written at least `max_age` ago, returning how
    /// many were removed. Leftover temporary files count as artifacts.
    async fn purge_older_than(&self, max_age: Duration) -> Result<usize, StorageError>;
}

/// Checks that `name` is a single plain file name.
pub fn validate_artifact_name(name: &str) -> Result<(), StorageError> {
    let invalid = name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.starts_with('.')
        || name.chars().any(char::is_control);
    if invalid {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid artifact name: {0}")]
    InvalidName(String),

    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
