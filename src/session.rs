/// Editing session
///
/// Bundles the state store with the view state that lives beside it: the
/// canvas controller, the inspector's collapsed sections, the file list and
/// the upload dialog. One session is one open editor.

use crate::backend::upload::{upload_file, AcceptList, FileUpload};
use crate::backend::{FileBackend, FileRecord};
use crate::canvas::{CanvasController, CanvasView, Gesture, GestureOutcome};
use crate::error::UploadError;
use crate::inspector::{FileListState, FilePicker, InspectorView, PropertyInspector, UploadDialog};
use crate::workflow::store::WorkflowStore;
use crate::workflow::types::Workflow;
use serde::Serialize;

/// Everything a client needs to draw the editor
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorView {
    pub name: String,
    pub selected_block_id: Option<String>,
    pub pending_source: Option<String>,
    pub last_saved: Option<Workflow>,
    pub canvas: CanvasView,
}

pub struct EditorSession {
    pub store: WorkflowStore,
    pub canvas: CanvasController,
    pub inspector: PropertyInspector,
    pub files: FilePicker,
    pub upload: UploadDialog,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(WorkflowStore::new(), AcceptList::default())
    }
}

impl EditorSession {
    pub fn new(store: WorkflowStore, accept: AcceptList) -> Self {
        Self {
            store,
            canvas: CanvasController::new(),
            inspector: PropertyInspector::new(),
            files: FilePicker::new(),
            upload: UploadDialog::new(accept),
        }
    }

    pub fn apply(&mut self, gesture: Gesture) -> GestureOutcome {
        self.canvas.apply(&mut self.store, gesture)
    }

    pub fn view(&self) -> EditorView {
        EditorView {
            name: self.store.name().to_string(),
            selected_block_id: self.store.selected_block_id().map(str::to_string),
            pending_source: self.canvas.pending_source().map(str::to_string),
            last_saved: self.store.last_saved().cloned(),
            canvas: self.canvas.view(&self.store),
        }
    }

    pub fn inspector_view(&self) -> Option<InspectorView> {
        self.inspector.view(&self.store)
    }

    pub async fn refresh_files(&mut self, backend: &dyn FileBackend) -> FileListState {
        self.files.refresh(backend).await.clone()
    }

    /// Validate an upload before any backend call
    ///
    /// With a block the file goes through the upload dialog and the block
    /// must be an existing `file` block; without one only the accept list
    /// applies.
    pub fn prepare_upload(
        &mut self,
        upload: FileUpload,
        block_id: Option<&str>,
    ) -> Result<FileUpload, UploadError> {
        match block_id {
            Some(block_id) => {
                self.upload.choose(upload)?;
                self.upload.begin(&self.store, block_id)
            }
            None => {
                self.upload.accept().check(&upload.name)?;
                Ok(upload)
            }
        }
    }

    /// Apply the result of an upload started with `prepare_upload`
    ///
    /// A stored file joins the loaded list even when attaching it fails.
    pub fn finish_upload(
        &mut self,
        result: Result<FileRecord, UploadError>,
        block_id: Option<&str>,
    ) -> Result<FileRecord, UploadError> {
        if let Ok(record) = &result {
            self.files.record_upload(record.clone());
        }
        match block_id {
            Some(block_id) => {
                self.upload
                    .finish(result, &self.inspector, &mut self.store, block_id)
            }
            None => result,
        }
    }

    /// Attach a listed file to the selected block
    pub fn pick_file(&mut self, file_id: &str) -> bool {
        let Some(block_id) = self.store.selected_block_id().map(str::to_string) else {
            return false;
        };
        self.files
            .select(&self.inspector, &mut self.store, &block_id, file_id)
    }

    /// Choose and upload a file for `block_id`, then reload the file list
    pub async fn upload_to_block(
        &mut self,
        backend: &dyn FileBackend,
        upload: FileUpload,
        block_id: &str,
    ) -> Result<FileRecord, UploadError> {
        let upload = self.prepare_upload(upload, Some(block_id))?;
        let result = upload_file(backend, upload).await;
        let record = self.finish_upload(result, Some(block_id))?;
        self.files.refresh(backend).await;
        Ok(record)
    }
}
