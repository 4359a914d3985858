/// Property inspector
///
/// Renders the configuration of the selected block as collapsible sections
/// and writes edits back through `WorkflowStore::update_block_config`.
/// Collapsing is view state only; nothing here is persisted.

use crate::workflow::store::WorkflowStore;
use crate::workflow::types::{Block, BlockType};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

// File list and upload dialog state for `file` blocks
pub mod files;

pub use files::{FileListState, FilePicker, UploadDialog, UploadState};

/// Collapsible section of the inspector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionId {
    General,
    File,
    Api,
    Database,
    Sheets,
    Clean,
    Transform,
    Merge,
}

impl SectionId {
    /// Type-specific section shown below "General"
    pub fn for_block_type(block_type: BlockType) -> SectionId {
        match block_type {
            BlockType::Api => SectionId::Api,
            BlockType::File => SectionId::File,
            BlockType::Database => SectionId::Database,
            BlockType::Sheets => SectionId::Sheets,
            BlockType::Clean => SectionId::Clean,
            BlockType::Transform => SectionId::Transform,
            BlockType::Merge => SectionId::Merge,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SectionId::General => "General",
            SectionId::File => "File Settings",
            SectionId::Api => "API Settings",
            SectionId::Database => "Database Settings",
            SectionId::Sheets => "Sheet Settings",
            SectionId::Clean => "Cleaning Rules",
            SectionId::Transform => "Transformations",
            SectionId::Merge => "Merge Settings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea,
    Select,
    KeyValue,
    List,
    FileReference,
}

/// One editable field bound to a config key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    /// Allowed values for `Select` fields
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub id: SectionId,
    pub title: &'static str,
    pub expanded: bool,
    /// Empty while collapsed
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorView {
    pub block_id: String,
    pub title: String,
    pub sections: Vec<SectionView>,
}

/// Inspector view state: which sections are expanded
#[derive(Debug, Clone)]
pub struct PropertyInspector {
    expanded: HashSet<SectionId>,
}

impl Default for PropertyInspector {
    fn default() -> Self {
        Self {
            expanded: HashSet::from([SectionId::General]),
        }
    }
}

impl PropertyInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, section: SectionId) -> bool {
        self.expanded.contains(&section)
    }

    /// Flip a section open or closed, returning the new state
    pub fn toggle(&mut self, section: SectionId) -> bool {
        if !self.expanded.remove(&section) {
            self.expanded.insert(section);
            return true;
        }
        false
    }

    /// Sections for the selected block, `None` when nothing is selected
    pub fn view(&self, store: &WorkflowStore) -> Option<InspectorView> {
        let block = store.selected_block()?;
        let sections = [SectionId::General, SectionId::for_block_type(block.block_type)]
            .into_iter()
            .map(|id| {
                let expanded = self.is_expanded(id);
                SectionView {
                    id,
                    title: id.title(),
                    expanded,
                    fields: if expanded { fields_for(id, block) } else { Vec::new() },
                }
            })
            .collect();

        Some(InspectorView {
            block_id: block.id.clone(),
            title: format!("{} Properties", block.label),
            sections,
        })
    }

    /// Rename the block; travels as a `{label}` config update
    pub fn set_label(&self, store: &mut WorkflowStore, block_id: &str, label: &str) -> bool {
        store.update_block_config(block_id, single("label", json!(label)))
    }

    pub fn set_field(
        &self,
        store: &mut WorkflowStore,
        block_id: &str,
        key: &str,
        value: Value,
    ) -> bool {
        store.update_block_config(block_id, single(key, value))
    }

    /// Point a `file` block at an uploaded file, whether picked or just uploaded
    pub fn attach_file(&self, store: &mut WorkflowStore, block_id: &str, file_id: &str) -> bool {
        match store.block(block_id) {
            Some(block) if block.block_type == BlockType::File => {
                store.update_block_config(block_id, single("fileId", json!(file_id)))
            }
            _ => false,
        }
    }
}

fn single(key: &str, value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    map
}

fn field(block: &Block, key: &'static str, label: &'static str, kind: FieldKind) -> FieldView {
    FieldView {
        key,
        label,
        kind,
        options: Vec::new(),
        value: block.config.get(key).cloned().unwrap_or(Value::Null),
    }
}

/// Select field showing the typed reading of its key; values outside the
/// options read as unset
fn select<T: Serialize>(
    key: &'static str,
    label: &'static str,
    options: &[&'static str],
    value: Option<T>,
) -> FieldView {
    FieldView {
        key,
        label,
        kind: FieldKind::Select,
        options: options.to_vec(),
        value: typed(value),
    }
}

/// List field showing only the entries that parse
fn list<T: Serialize>(key: &'static str, label: &'static str, entries: Vec<T>) -> FieldView {
    FieldView {
        key,
        label,
        kind: FieldKind::List,
        options: Vec::new(),
        value: typed(Some(entries)),
    }
}

fn typed<T: Serialize>(value: Option<T>) -> Value {
    value
        .and_then(|v| serde_json::to_value(v).ok())
        .unwrap_or(Value::Null)
}

fn fields_for(section: SectionId, block: &Block) -> Vec<FieldView> {
    let config = &block.config;
    match section {
        SectionId::General => vec![FieldView {
            key: "label",
            label: "Block Name",
            kind: FieldKind::Text,
            options: Vec::new(),
            value: Value::String(block.label.clone()),
        }],
        SectionId::File => vec![
            field(block, "fileId", "Select File", FieldKind::FileReference),
            select("fileType", "File Type", &["csv", "xlsx", "json", "xml"], config.file_type()),
            field(block, "fileMapping", "Column Mapping", FieldKind::KeyValue),
        ],
        SectionId::Api => vec![
            field(block, "apiUrl", "URL", FieldKind::Text),
            select("apiMethod", "Method", &["GET", "POST", "PUT", "DELETE"], config.api_method()),
            field(block, "apiHeaders", "Headers", FieldKind::KeyValue),
            field(block, "apiBody", "Body", FieldKind::TextArea),
        ],
        SectionId::Database => vec![
            select(
                "dbType",
                "Database",
                &["postgresql", "mysql", "supabase"],
                config.db_type(),
            ),
            field(block, "dbConnection", "Connection", FieldKind::Text),
            field(block, "dbQuery", "Query", FieldKind::TextArea),
        ],
        SectionId::Sheets => vec![
            field(block, "sheetId", "Sheet ID", FieldKind::Text),
            field(block, "sheetRange", "Range", FieldKind::Text),
        ],
        SectionId::Clean => vec![list("cleaningRules", "Rules", config.cleaning_rules())],
        SectionId::Transform => vec![list("transformations", "Steps", config.transformations())],
        SectionId::Merge => vec![
            select(
                "mergeStrategy",
                "Strategy",
                &["inner", "left", "right", "full"],
                config.merge_strategy(),
            ),
            field(block, "mergeKey", "Join Key", FieldKind::Text),
        ],
    }
}
