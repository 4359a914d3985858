/// Error types for the storage backend and file uploads

use thiserror::Error;

/// Failure talking to the object/row storage backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Failure of the upload flow, split by who has to act on it
#[derive(Error, Debug)]
pub enum UploadError {
    /// Upload pressed before a file was chosen
    #[error("no file selected")]
    NoFileSelected,

    #[error("file type not accepted: {0}")]
    UnsupportedFileType(String),

    #[error("block not found: {0}")]
    BlockNotFound(String),

    /// Upload aimed at a block that does not reference files
    #[error("block {0} is not a file block")]
    NotAFileBlock(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl UploadError {
    /// Short, non-technical text shown next to the upload control
    pub fn user_message(&self) -> &'static str {
        match self {
            UploadError::NoFileSelected => "Please select a file",
            UploadError::UnsupportedFileType(_) => "Supported formats: CSV, Excel, JSON",
            UploadError::BlockNotFound(_) => "Block not found",
            UploadError::NotAFileBlock(_) => "Only file blocks accept uploads",
            UploadError::Backend(_) => "Failed to upload file. Please try again.",
        }
    }

    /// Whether the user can fix this without retrying against the backend
    pub fn is_validation(&self) -> bool {
        !matches!(self, UploadError::Backend(_))
    }
}
