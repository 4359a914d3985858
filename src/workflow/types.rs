/// Core workflow type definitions
///
/// Defines the records the editor manipulates: blocks placed on the canvas,
/// directed connections between them, and the saved workflow aggregate.
/// These types carry no behavior beyond small accessors; every mutation
/// goes through the `WorkflowStore`.

use crate::workflow::config::BlockConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of block kinds offered by the palette
///
/// The first four are data sources, the last three transform data flowing
/// through the workflow. Serialized in lowercase ("api", "file", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    /// REST API data source
    /// Config keys: apiUrl, apiMethod, apiHeaders, apiBody
    Api,

    /// Uploaded file data source
    /// Config keys: fileId, fileType, fileMapping
    File,

    /// SQL database data source
    /// Config keys: dbType, dbConnection, dbQuery
    Database,

    /// Google Sheets data source
    /// Config keys: sheetId, sheetRange
    Sheets,

    /// Row cleaning step
    /// Config keys: cleaningRules
    Clean,

    /// Formula/filter/aggregate step
    /// Config keys: transformations
    Transform,

    /// Join of two upstream inputs
    /// Config keys: mergeStrategy, mergeKey
    Merge,
}

impl BlockType {
    /// Every block type in palette order
    pub const ALL: [BlockType; 7] = [
        BlockType::Api,
        BlockType::File,
        BlockType::Database,
        BlockType::Sheets,
        BlockType::Clean,
        BlockType::Transform,
        BlockType::Merge,
    ];

    /// Label given to a freshly dropped block of this type
    pub fn default_label(self) -> &'static str {
        match self {
            BlockType::Api => "API Source",
            BlockType::File => "File Upload",
            BlockType::Database => "Database Source",
            BlockType::Sheets => "Google Sheets",
            BlockType::Clean => "Clean Data",
            BlockType::Transform => "Transform Data",
            BlockType::Merge => "Merge Data",
        }
    }

    /// Whether this block produces data rather than reshaping it
    pub fn is_data_source(self) -> bool {
        matches!(
            self,
            BlockType::Api | BlockType::File | BlockType::Database | BlockType::Sheets
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Api => "api",
            BlockType::File => "file",
            BlockType::Database => "database",
            BlockType::Sheets => "sheets",
            BlockType::Clean => "clean",
            BlockType::Transform => "transform",
            BlockType::Merge => "merge",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown block type: {}", s))
    }
}

/// Canvas-space coordinate of a block's top-left corner
///
/// No bounds are enforced; blocks may sit at negative or off-canvas positions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A single node on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Process-unique identifier, assigned by the store on creation
    pub id: String,
    /// Kind of block, fixed for the block's lifetime
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Top-left corner in canvas space
    pub position: Position,
    /// Type-specific settings, merged key by key on update
    pub config: BlockConfig,
    /// Display name shown in the block header and inspector title
    pub label: String,
}

/// Directed edge between two blocks
///
/// At most one connection exists per ordered (source, target) pair and a block
/// never connects to itself. Cycles are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source_id: String,
    pub target_id: String,
}

impl Connection {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
        }
    }

    /// Whether either endpoint is the given block
    pub fn touches(&self, block_id: &str) -> bool {
        self.source_id == block_id || self.target_id == block_id
    }
}

/// Saved snapshot of the editing session
///
/// Built only by `WorkflowStore::save_workflow`. A later save replaces it,
/// keeping `id` and `created_at` and refreshing `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Blocks in insertion order
    pub blocks: Vec<Block>,
    pub connections: Vec<Connection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Reference to the owning user
    pub owner_id: String,
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<WorkflowSchedule>,
}

/// Optional cron schedule attached to a workflow
///
/// Stored and round-tripped only; nothing in this crate fires it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSchedule {
    pub enabled: bool,
    /// Cron expression
    pub cron: String,
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
}
