/// In-process storage backend
///
/// Keeps objects and metadata rows in memory. Used when no remote backend is
/// configured and by tests; failure switches let tests exercise the error
/// paths of the upload flow.

use crate::backend::{FileBackend, FileRecord, NewFileRow};
use crate::error::BackendError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Inner {
    objects: HashMap<String, Vec<u8>>,
    /// Rows in insertion order
    rows: Vec<FileRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
    user_id: Option<String>,
    fail_row_insert: AtomicBool,
    fail_listing: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose auth service reports `user_id` as signed in
    pub fn with_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    /// Make every metadata row write fail until switched off
    pub fn set_fail_row_insert(&self, fail: bool) {
        self.fail_row_insert.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn object_paths(&self) -> Vec<String> {
        let inner = self.lock();
        let mut paths: Vec<String> = inner.objects.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-write; the data is still usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl FileBackend for MemoryBackend {
    async fn list_files(&self) -> Result<Vec<FileRecord>, BackendError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(BackendError::Storage("listing disabled".to_string()));
        }
        // Newest first; rows are appended, so reverse insertion order.
        Ok(self.lock().rows.iter().rev().cloned().collect())
    }

    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _mime_type: &str,
    ) -> Result<String, BackendError> {
        let mut inner = self.lock();
        if inner.objects.contains_key(path) {
            return Err(BackendError::Storage(format!("object already exists: {}", path)));
        }
        inner.objects.insert(path.to_string(), bytes);
        Ok(path.to_string())
    }

    async fn delete_object(&self, path: &str) -> Result<(), BackendError> {
        match self.lock().objects.remove(path) {
            Some(_) => Ok(()),
            None => Err(BackendError::NotFound(path.to_string())),
        }
    }

    async fn insert_file_row(&self, row: NewFileRow) -> Result<FileRecord, BackendError> {
        if self.fail_row_insert.load(Ordering::SeqCst) {
            return Err(BackendError::Status {
                status: 500,
                body: "row insert rejected".to_string(),
            });
        }

        let now = Utc::now();
        let record = FileRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: row.name,
            path: row.path,
            mime_type: Some(row.mime_type),
            size: Some(row.size),
            created_at: Some(now),
            updated_at: Some(now),
            created_by: row.created_by,
        };
        self.lock().rows.push(record.clone());
        Ok(record)
    }

    async fn current_user_id(&self) -> Result<Option<String>, BackendError> {
        Ok(self.user_id.clone())
    }

    async fn download_file_content(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        self.lock()
            .objects
            .get(path)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(path.to_string()))
    }
}
