//! Artifact Store — the narrow object-storage boundary used by the pipeline.
//!
//! Uploads overwrite: recompiling a document writes to the same deterministic
//! key, and whichever upload lands last wins. Nothing here retries.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

#[cfg(test)]
pub mod memory;
pub mod s3;

pub use s3::S3ArtifactStore;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload of '{key}' failed: {message}")]
    Upload { key: String, message: String },

    #[error("Could not sign URL for '{key}': {message}")]
    Sign { key: String, message: String },

    #[error("Delete of '{key}' failed: {message}")]
    Delete { key: String, message: String },
}

/// Object storage for compiled artifacts. Carried in `AppState` as
/// `Arc<dyn ArtifactStore>` so tests can swap in an in-memory store.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Stores `bytes` under `key`, replacing any previous object.
    async fn upload(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Issues a URL that grants read access to `key` for `ttl`.
    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;

    /// Removes `key`. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Deterministic storage key for a user's compiled resume.
pub fn artifact_key(user_id: Uuid, document_id: Uuid) -> String {
    format!("resumes/{user_id}/{document_id}.pdf")
}
