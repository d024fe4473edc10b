//! In-memory [`ArtifactStore`] for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::storage::{ArtifactStore, StorageError};

#[derive(Default)]
pub struct InMemoryArtifactStore {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
    fail_uploads: AtomicBool,
}

impl InMemoryArtifactStore {
    /// A store whose uploads always fail, to exercise the storage error path.
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail_uploads.store(true, Ordering::SeqCst);
        store
    }

    pub fn get(&self, key: &str) -> Option<(Bytes, String)> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn upload(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Upload {
                key: key.to_string(),
                message: "storage unavailable".to_string(),
            });
        }
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        Ok(format!("memory://{key}?expires_in={}", ttl.as_secs()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}
