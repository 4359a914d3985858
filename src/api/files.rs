/// Uploaded file REST API endpoints
///
/// Failures come back as `{ "error": "<short message>" }` with the same
/// wording the editor shows inline; details only go to the log.
///
/// Backend calls run with the session unlocked: the lock is taken only to
/// validate before a call and to apply its result afterwards, so a slow
/// storage backend never stalls canvas gestures.

use crate::{
    api::AppState,
    backend::{upload::upload_file, FileRecord, FileUpload},
    error::{BackendError, UploadError},
    inspector::{FileListState, FilePicker},
};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

type ApiError = (StatusCode, Json<Value>);

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Original file name, including extension
    pub name: Option<String>,
    /// `file` block to attach the upload to
    pub block_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub path: String,
}

/// Create uploaded file routes
pub fn create_file_routes() -> Router<AppState> {
    Router::new()
        .route("/api/files", get(list_files).post(upload))
        .route("/api/files/content", get(download_content))
}

fn error_body(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "error": message })))
}

fn upload_error(err: &UploadError) -> ApiError {
    let status = match err {
        UploadError::BlockNotFound(_) => StatusCode::NOT_FOUND,
        UploadError::Backend(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::BAD_REQUEST,
    };
    error_body(status, err.user_message())
}

/// List uploaded files, newest first
///
/// GET /api/files
/// Returns: { "files": [{ "id": "...", "name": "q1.csv", "path": "...", ... }] }
async fn list_files(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let listed = FilePicker::load(state.backend.as_ref()).await;
    state.session.lock().await.files.set_state(listed.clone());

    match listed {
        FileListState::Loaded(files) => Ok(Json(json!({ "files": files }))),
        FileListState::Failed(message) => Err(error_body(StatusCode::BAD_GATEWAY, &message)),
        FileListState::Loading => Err(error_body(
            StatusCode::SERVICE_UNAVAILABLE,
            "Files are still loading",
        )),
    }
}

/// Upload a file
///
/// POST /api/files?name=q1.csv[&block_id=...]
/// Body: raw file bytes; Content-Type is stored as the MIME type when given.
async fn upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<FileRecord>, ApiError> {
    let Some(name) = query.name.filter(|n| !n.trim().is_empty()) else {
        return Err(upload_error(&UploadError::NoFileSelected));
    };

    let mut file = FileUpload::new(name, body.to_vec());
    if let Some(mime) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && *v != "application/octet-stream")
    {
        file = file.with_mime_type(mime);
    }

    let block_id = query.block_id.as_deref();
    let prepared = state.session.lock().await.prepare_upload(file, block_id);
    let result = match prepared {
        Ok(file) => {
            let uploaded = upload_file(state.backend.as_ref(), file).await;
            state.session.lock().await.finish_upload(uploaded, block_id)
        }
        Err(err) => Err(err),
    };

    result.map(Json).map_err(|err| {
        tracing::warn!("Upload rejected: {}", err);
        upload_error(&err)
    })
}

/// Download raw object bytes
///
/// GET /api/files/content?path=1700000000000-q1.csv
async fn download_content(
    State(state): State<AppState>,
    Query(query): Query<ContentQuery>,
) -> Result<Response, ApiError> {
    match state.backend.download_file_content(&query.path).await {
        Ok(bytes) => Ok((
            [(header::CONTENT_TYPE, crate::backend::upload::mime_type_for(&query.path))],
            bytes,
        )
            .into_response()),
        Err(BackendError::NotFound(_)) => Err(error_body(StatusCode::NOT_FOUND, "File not found")),
        Err(e) => {
            tracing::error!("Failed to download {}: {}", query.path, e);
            Err(error_body(StatusCode::BAD_GATEWAY, "Failed to download file"))
        }
    }
}
