/// File upload flow
///
/// Uploading is two writes against a non-transactional backend: the object
/// bytes, then the metadata row pointing at them. When the row write fails
/// the object is deleted again before the error is reported, so a failed
/// upload leaves nothing behind in the bucket.

use crate::backend::{FileBackend, FileRecord, NewFileRow};
use crate::error::{BackendError, UploadError};
use chrono::Utc;

/// Default accepted extensions at the file input
pub const DEFAULT_ACCEPT: &str = ".csv,.xlsx,.xls,.json";

/// Extension allow-list applied when a file is chosen
///
/// Parsed from a comma or semicolon separated list; leading dots and case are
/// ignored. Only the editor enforces it; the backend does not re-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptList {
    extensions: Vec<String>,
}

impl AcceptList {
    pub fn parse(list: &str) -> Self {
        let extensions = list
            .split(&[',', ';'][..])
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extensions }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn accepts(&self, file_name: &str) -> bool {
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            }
            _ => false,
        }
    }

    /// Reject names outside the allow-list
    pub fn check(&self, file_name: &str) -> Result<(), UploadError> {
        if self.accepts(file_name) {
            Ok(())
        } else {
            Err(UploadError::UnsupportedFileType(file_name.to_string()))
        }
    }
}

impl Default for AcceptList {
    fn default() -> Self {
        Self::parse(DEFAULT_ACCEPT)
    }
}

/// A chosen file waiting to be uploaded
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Build an upload, guessing the MIME type from the extension
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_type_for(&name).to_string();
        Self { name, mime_type, bytes }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

pub fn mime_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => "text/csv",
        "json" => "application/json",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        _ => "application/octet-stream",
    }
}

/// Bucket object name: upload time in milliseconds, a short random tag,
/// then the original name
pub fn object_name(file_name: &str) -> String {
    let tag = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", Utc::now().timestamp_millis(), &tag[..8], file_name)
}

/// Upload bytes and record their metadata row
pub async fn upload_file(
    backend: &dyn FileBackend,
    upload: FileUpload,
) -> Result<FileRecord, UploadError> {
    let FileUpload { name, mime_type, bytes } = upload;
    let size = bytes.len() as i64;
    let object = object_name(&name);

    tracing::info!("Uploading file {} ({} bytes) as {}", name, size, object);
    let path = backend.put_object(&object, bytes, &mime_type).await?;

    let row = match backend.current_user_id().await {
        Ok(created_by) => {
            backend
                .insert_file_row(NewFileRow {
                    name: name.clone(),
                    path: path.clone(),
                    mime_type,
                    size,
                    created_by,
                })
                .await
        }
        Err(err) => Err(err),
    };

    match row {
        Ok(record) => {
            tracing::info!("Uploaded file {} as {}", record.name, record.id);
            Ok(record)
        }
        Err(err) => {
            tracing::error!("Metadata write failed for {}: {}", path, err);
            compensate(backend, &path).await;
            Err(err.into())
        }
    }
}

async fn compensate(backend: &dyn FileBackend, path: &str) {
    match backend.delete_object(path).await {
        Ok(()) => tracing::info!("Removed orphaned object {}", path),
        Err(BackendError::NotFound(_)) => {}
        Err(err) => tracing::error!("Orphaned object {} could not be removed: {}", path, err),
    }
}
