//! Local Filesystem Storage Adapter - Implementation of ArtifactStorage.
//!
//! Stores generated reports as flat files in one directory. Uses atomic
//! writes and SHA-256 checksums.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::ports::{validate_artifact_name, ArtifactStorage, StorageError};

/// Maximum artifact size allowed (10 MB).
const MAX_ARTIFACT_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Local filesystem storage for report artifacts.
///
/// # Atomic Writes
///
/// Content is written to a hidden `.{name}.tmp` file, synced, then renamed
/// into place. Hidden names are never served.
#[derive(Debug, Clone)]
pub struct LocalArtifactStorage {
    base_path: PathBuf,
}

impl LocalArtifactStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }

    fn artifact_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    fn temp_path(&self, name: &str) -> PathBuf {
        self.base_path.join(format!(".{}.tmp", name))
    }

    fn compute_checksum(content: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content);
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl ArtifactStorage for LocalArtifactStorage {
    async fn write(&self, name: &str, content: &[u8]) -> Result<String, StorageError> {
        validate_artifact_name(name)?;
        if content.len() > MAX_ARTIFACT_SIZE_BYTES {
            return Err(StorageError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "artifact is {} bytes, limit is {}",
                    content.len(),
                    MAX_ARTIFACT_SIZE_BYTES
                ),
            )));
        }

        fs::create_dir_all(&self.base_path).await?;

        let temp_path = self.temp_path(name);
        let final_path = self.artifact_path(name);

        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(content).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        let checksum = Self::compute_checksum(content);
        tracing::debug!(
            artifact = name,
            bytes = content.len(),
            checksum = %checksum,
            "artifact stored"
        );
        Ok(checksum)
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        validate_artifact_name(name)?;
        match fs::read(self.artifact_path(name)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn purge_older_than(&self, max_age: Duration) -> Result<usize, StorageError> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            // A modification time in the future counts as fresh.
            let expired = metadata
                .modified()?
                .elapsed()
                .map(|age| age >= max_age)
                .unwrap_or(false);
            if !expired {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                // Removed by a concurrent purge.
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        if removed > 0 {
            tracing::debug!(removed, base = %self.base_path.display(), "expired artifacts purged");
        }
        Ok(removed)
    }
}
