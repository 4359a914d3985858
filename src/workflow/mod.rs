/// Workflow Management Layer
///
/// Handles the editor's data model, the in-memory state store that owns an
/// editing session, and SQLite persistence of saved snapshots:
/// - Type definitions (Block, Connection, Workflow)
/// - Open block configuration with typed read helpers
/// - Single-writer state store with observable changes
/// - SQLite snapshot storage with sqlx

// Core workflow type definitions
pub mod types;

// Block configuration map and typed config shapes
pub mod config;

// In-memory state store for the active editing session
pub mod store;

// SQLite persistence layer for saved workflow snapshots
pub mod storage;

// Re-export commonly used types
pub use config::BlockConfig;
pub use store::{RunRequest, StoreEvent, WorkflowStore};
pub use types::{Block, BlockType, Connection, Position, Workflow, WorkflowSchedule};
