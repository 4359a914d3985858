/// HTTP API Layer
///
/// REST surface of the editor. It handles:
/// - Gesture dispatch and editor state for the open session
/// - Saved workflow snapshots
/// - File listing, upload and download against the storage backend

use crate::backend::FileBackend;
use crate::session::EditorSession;
use crate::workflow::storage::WorkflowStorage;
use std::sync::Arc;
use tokio::sync::Mutex;

// Editor session endpoints (gestures, config, save/run, inspector)
pub mod editor;

// Uploaded file endpoints
pub mod files;

// Saved snapshot endpoints
pub mod workflows;

// Re-export router builders
pub use editor::create_editor_routes;
pub use files::create_file_routes;
pub use workflows::create_workflow_routes;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// The single editing session; the mutex keeps one writer at a time
    pub session: Arc<Mutex<EditorSession>>,
    /// Snapshot storage for saved workflows
    pub storage: WorkflowStorage,
    /// Object and row storage for uploaded files
    pub backend: Arc<dyn FileBackend>,
}

impl AppState {
    pub fn new(
        session: EditorSession,
        storage: WorkflowStorage,
        backend: Arc<dyn FileBackend>,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            storage,
            backend,
        }
    }
}
