/// File selection for `file` blocks
///
/// `FilePicker` holds the list of previously uploaded files and
/// `UploadDialog` the chosen-but-not-yet-uploaded file. Backend failures end
/// up as a short message on the state.
///
/// Backend I/O is kept apart from state changes (`FilePicker::load`,
/// `UploadDialog::begin`/`finish`) so a caller sharing the session behind a
/// lock can release it while the request is in flight.

use crate::backend::upload::{upload_file, AcceptList, FileUpload};
use crate::backend::{FileBackend, FileRecord};
use crate::error::UploadError;
use crate::inspector::PropertyInspector;
use crate::workflow::store::WorkflowStore;
use crate::workflow::types::BlockType;
use serde::Serialize;
use tracing::{info, warn};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load files";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum FileListState {
    Loading,
    Loaded(Vec<FileRecord>),
    Failed(String),
}

/// Previously uploaded files offered for selection
#[derive(Debug, Clone)]
pub struct FilePicker {
    state: FileListState,
}

impl Default for FilePicker {
    fn default() -> Self {
        Self {
            state: FileListState::Loading,
        }
    }
}

impl FilePicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FileListState {
        &self.state
    }

    pub fn files(&self) -> &[FileRecord] {
        match &self.state {
            FileListState::Loaded(files) => files,
            _ => &[],
        }
    }

    pub fn contains(&self, file_id: &str) -> bool {
        self.files().iter().any(|f| f.id == file_id)
    }

    /// Fetch the list from the backend, newest first, without touching a picker
    pub async fn load(backend: &dyn FileBackend) -> FileListState {
        match backend.list_files().await {
            Ok(files) => FileListState::Loaded(files),
            Err(err) => {
                warn!("Failed to load files: {}", err);
                FileListState::Failed(LOAD_FAILED_MESSAGE.to_string())
            }
        }
    }

    pub fn set_state(&mut self, state: FileListState) {
        self.state = state;
    }

    /// Reload the list from the backend
    pub async fn refresh(&mut self, backend: &dyn FileBackend) -> &FileListState {
        self.state = FileListState::Loading;
        self.state = Self::load(backend).await;
        &self.state
    }

    /// Put a fresh upload at the top of a loaded list
    ///
    /// A list that never loaded is left alone; the next load brings it in.
    pub fn record_upload(&mut self, record: FileRecord) {
        if let FileListState::Loaded(files) = &mut self.state {
            files.retain(|f| f.id != record.id);
            files.insert(0, record);
        }
    }

    /// Point the block at a listed file
    ///
    /// Ids not present in the loaded list are ignored.
    pub fn select(
        &self,
        inspector: &PropertyInspector,
        store: &mut WorkflowStore,
        block_id: &str,
        file_id: &str,
    ) -> bool {
        if !self.contains(file_id) {
            return false;
        }
        inspector.attach_file(store, block_id, file_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum UploadState {
    Idle,
    Uploading,
    /// File id of the last completed upload
    Done(String),
    /// Inline message shown next to the upload control
    Failed(String),
}

/// Upload control of the `file` section
#[derive(Debug, Clone)]
pub struct UploadDialog {
    accept: AcceptList,
    chosen: Option<FileUpload>,
    state: UploadState,
}

impl UploadDialog {
    pub fn new(accept: AcceptList) -> Self {
        Self {
            accept,
            chosen: None,
            state: UploadState::Idle,
        }
    }

    pub fn accept(&self) -> &AcceptList {
        &self.accept
    }

    pub fn chosen(&self) -> Option<&FileUpload> {
        self.chosen.as_ref()
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    /// Take a file from the picker; rejected names leave the previous choice
    pub fn choose(&mut self, upload: FileUpload) -> Result<(), UploadError> {
        if let Err(err) = self.accept.check(&upload.name) {
            self.state = UploadState::Failed(err.user_message().to_string());
            return Err(err);
        }
        self.chosen = Some(upload);
        self.state = UploadState::Idle;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.chosen = None;
        self.state = UploadState::Idle;
    }

    /// Check the upload can go ahead and hand out the file to send
    ///
    /// Fails without touching the backend when nothing is chosen or the
    /// block cannot take a file.
    pub fn begin(
        &mut self,
        store: &WorkflowStore,
        block_id: &str,
    ) -> Result<FileUpload, UploadError> {
        let checked = match &self.chosen {
            None => Err(UploadError::NoFileSelected),
            Some(upload) => check_file_block(store, block_id).map(|()| upload.clone()),
        };
        match checked {
            Ok(upload) => {
                self.state = UploadState::Uploading;
                Ok(upload)
            }
            Err(err) => {
                self.state = UploadState::Failed(err.user_message().to_string());
                Err(err)
            }
        }
    }

    /// Apply the backend's answer: attach the new file or report the failure
    ///
    /// On failure the chosen file stays in place so the user can retry, and
    /// the block configuration is untouched.
    pub fn finish(
        &mut self,
        result: Result<FileRecord, UploadError>,
        inspector: &PropertyInspector,
        store: &mut WorkflowStore,
        block_id: &str,
    ) -> Result<FileRecord, UploadError> {
        let attached = result.and_then(|record| {
            if inspector.attach_file(store, block_id, &record.id) {
                Ok(record)
            } else {
                // Block went away while the upload was in flight.
                Err(UploadError::BlockNotFound(block_id.to_string()))
            }
        });

        match attached {
            Ok(record) => {
                info!("Attached file {} to block {}", record.id, block_id);
                self.chosen = None;
                self.state = UploadState::Done(record.id.clone());
                Ok(record)
            }
            Err(err) => {
                warn!("Upload of {} failed: {}", self.chosen_name(), err);
                self.state = UploadState::Failed(err.user_message().to_string());
                Err(err)
            }
        }
    }

    /// Upload the chosen file and attach it to the block
    pub async fn submit(
        &mut self,
        backend: &dyn FileBackend,
        inspector: &PropertyInspector,
        store: &mut WorkflowStore,
        block_id: &str,
    ) -> Result<FileRecord, UploadError> {
        let upload = self.begin(store, block_id)?;
        let result = upload_file(backend, upload).await;
        self.finish(result, inspector, store, block_id)
    }

    fn chosen_name(&self) -> &str {
        self.chosen.as_ref().map(|u| u.name.as_str()).unwrap_or("")
    }
}

/// Only existing `file` blocks take uploads
pub fn check_file_block(store: &WorkflowStore, block_id: &str) -> Result<(), UploadError> {
    match store.block(block_id) {
        None => Err(UploadError::BlockNotFound(block_id.to_string())),
        Some(block) if block.block_type != BlockType::File => {
            Err(UploadError::NotAFileBlock(block_id.to_string()))
        }
        Some(_) => Ok(()),
    }
}

impl Default for UploadDialog {
    fn default() -> Self {
        Self::new(AcceptList::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::workflow::types::{BlockType, Position};

    fn csv(name: &str) -> FileUpload {
        FileUpload::new(name, b"date,amount\n2024-01-01,10\n".to_vec())
    }

    #[tokio::test]
    async fn submit_without_choice_asks_for_a_file() {
        let backend = MemoryBackend::new();
        let mut store = WorkflowStore::new();
        let block = store.add_block(BlockType::File, Position::default());
        let mut dialog = UploadDialog::default();

        let err = dialog
            .submit(&backend, &PropertyInspector::new(), &mut store, &block)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::NoFileSelected));
        assert_eq!(dialog.state(), &UploadState::Failed("Please select a file".into()));
        assert!(backend.object_paths().is_empty());
    }

    #[test]
    fn rejected_extension_keeps_previous_choice() {
        let mut dialog = UploadDialog::default();
        dialog.choose(csv("q1.csv")).unwrap();

        assert!(dialog.choose(csv("notes.txt")).is_err());
        assert_eq!(dialog.chosen().map(|u| u.name.as_str()), Some("q1.csv"));
        assert!(matches!(dialog.state(), UploadState::Failed(_)));
    }

    #[tokio::test]
    async fn successful_upload_sets_file_id() {
        let backend = MemoryBackend::new();
        let inspector = PropertyInspector::new();
        let mut store = WorkflowStore::new();
        let block = store.add_block(BlockType::File, Position::default());
        let mut dialog = UploadDialog::default();

        dialog.choose(csv("q1.csv")).unwrap();
        let record = dialog
            .submit(&backend, &inspector, &mut store, &block)
            .await
            .unwrap();

        assert_eq!(store.block(&block).unwrap().config.file_id(), Some(record.id.as_str()));
        assert_eq!(dialog.state(), &UploadState::Done(record.id.clone()));
        assert!(dialog.chosen().is_none());
    }

    #[tokio::test]
    async fn failed_upload_leaves_block_and_choice_alone() {
        let backend = MemoryBackend::new();
        backend.set_fail_row_insert(true);
        let inspector = PropertyInspector::new();
        let mut store = WorkflowStore::new();
        let block = store.add_block(BlockType::File, Position::default());
        let mut dialog = UploadDialog::default();

        dialog.choose(csv("q1.csv")).unwrap();
        let err = dialog
            .submit(&backend, &inspector, &mut store, &block)
            .await
            .unwrap_err();

        assert!(!err.is_validation());
        assert_eq!(
            dialog.state(),
            &UploadState::Failed("Failed to upload file. Please try again.".into())
        );
        assert!(dialog.chosen().is_some());
        assert!(store.block(&block).unwrap().config.file_id().is_none());
    }

    #[tokio::test]
    async fn upload_for_wrong_block_never_reaches_backend() {
        let backend = MemoryBackend::new();
        let inspector = PropertyInspector::new();
        let mut store = WorkflowStore::new();
        let api = store.add_block(BlockType::Api, Position::default());
        let mut dialog = UploadDialog::default();
        dialog.choose(csv("q1.csv")).unwrap();

        let err = dialog
            .submit(&backend, &inspector, &mut store, "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::BlockNotFound(_)));

        let err = dialog
            .submit(&backend, &inspector, &mut store, &api)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::NotAFileBlock(_)));

        assert!(backend.object_paths().is_empty());
        assert!(dialog.chosen().is_some());
        assert!(store.block(&api).unwrap().config.is_empty());
    }

    #[tokio::test]
    async fn block_removed_mid_upload_is_reported() {
        let backend = MemoryBackend::new();
        let inspector = PropertyInspector::new();
        let mut store = WorkflowStore::new();
        let block = store.add_block(BlockType::File, Position::default());
        let mut dialog = UploadDialog::default();
        dialog.choose(csv("q1.csv")).unwrap();

        let upload = dialog.begin(&store, &block).unwrap();
        assert_eq!(dialog.state(), &UploadState::Uploading);
        let result = upload_file(&backend, upload).await;
        store.remove_block(&block);

        let err = dialog.finish(result, &inspector, &mut store, &block).unwrap_err();
        assert!(matches!(err, UploadError::BlockNotFound(_)));
        assert_eq!(dialog.state(), &UploadState::Failed("Block not found".into()));
    }

    #[tokio::test]
    async fn recorded_upload_becomes_selectable() {
        let backend = MemoryBackend::new();
        upload_file(&backend, csv("old.csv")).await.unwrap();
        let mut picker = FilePicker::new();
        picker.refresh(&backend).await;

        let fresh = upload_file(&backend, csv("q1.csv")).await.unwrap();
        assert!(!picker.contains(&fresh.id));
        picker.record_upload(fresh.clone());

        assert_eq!(picker.files()[0].id, fresh.id);
        assert_eq!(picker.files().len(), 2);
    }

    #[test]
    fn record_upload_waits_for_first_load() {
        let mut picker = FilePicker::new();
        picker.record_upload(FileRecord {
            id: "f-1".into(),
            name: "q1.csv".into(),
            path: "1-abcdef12-q1.csv".into(),
            mime_type: None,
            size: None,
            created_at: None,
            updated_at: None,
            created_by: None,
        });
        assert_eq!(picker.state(), &FileListState::Loading);
    }

    #[tokio::test]
    async fn picker_reports_load_failure() {
        let backend = MemoryBackend::new();
        backend.set_fail_listing(true);
        let mut picker = FilePicker::new();

        let state = picker.refresh(&backend).await;
        assert_eq!(state, &FileListState::Failed(LOAD_FAILED_MESSAGE.to_string()));
        assert!(picker.files().is_empty());
    }

    #[tokio::test]
    async fn picker_selects_only_listed_files() {
        let backend = MemoryBackend::new();
        let record = upload_file(&backend, csv("q1.csv")).await.unwrap();
        let inspector = PropertyInspector::new();
        let mut store = WorkflowStore::new();
        let block = store.add_block(BlockType::File, Position::default());
        let mut picker = FilePicker::new();
        picker.refresh(&backend).await;

        assert!(!picker.select(&inspector, &mut store, &block, "missing"));
        assert!(picker.select(&inspector, &mut store, &block, &record.id));
        assert_eq!(store.block(&block).unwrap().config.file_id(), Some(record.id.as_str()));
    }
}
