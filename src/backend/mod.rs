/// Storage backend layer
///
/// Thin pass-through to the backend-as-a-service holding uploaded files:
/// object storage for the bytes, a `files` table for metadata rows, and the
/// auth service for the uploader's identity. No caching, retry or
/// de-duplication happens here; each user action issues its own requests.

use crate::error::BackendError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Upload flow: validation, timestamped object names, compensating cleanup
pub mod upload;

// Supabase REST/storage implementation over reqwest
pub mod supabase;

// In-process implementation for offline use and tests
pub mod memory;

pub use memory::MemoryBackend;
pub use supabase::SupabaseBackend;
pub use upload::{upload_file, AcceptList, FileUpload};

/// Metadata row of an uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    /// Object path inside the storage bucket
    pub path: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Row written after the object upload succeeds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewFileRow {
    pub name: String,
    pub path: String,
    pub mime_type: String,
    pub size: i64,
    pub created_by: Option<String>,
}

/// Operations the editor needs from the storage service
#[async_trait]
pub trait FileBackend: Send + Sync {
    /// Metadata rows, newest first
    async fn list_files(&self) -> Result<Vec<FileRecord>, BackendError>;

    /// Write object bytes, returning the stored path
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<String, BackendError>;

    async fn delete_object(&self, path: &str) -> Result<(), BackendError>;

    async fn insert_file_row(&self, row: NewFileRow) -> Result<FileRecord, BackendError>;

    /// Id of the authenticated user, `None` for anonymous sessions
    async fn current_user_id(&self) -> Result<Option<String>, BackendError>;

    /// Raw object bytes; `BackendError::NotFound` when the path is absent
    async fn download_file_content(&self, path: &str) -> Result<Vec<u8>, BackendError>;
}
