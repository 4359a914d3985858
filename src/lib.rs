/// FlowFinance: headless core of a drag-and-drop data workflow editor
///
/// Blocks and connections live in a single-writer state store; pointer
/// gestures, connector geometry, block presentation and the property
/// inspector are layered on top. Uploaded files pass straight through to a
/// storage backend and saved snapshots go to SQLite.

// Core configuration and setup
pub mod config;

// Error types for the storage backend and uploads
pub mod error;

// Workflow data model, state store and snapshot storage
pub mod workflow;

// Canvas interaction: gestures, geometry and block rendering
pub mod canvas;

// Property inspector for the selected block
pub mod inspector;

// File storage backend and the upload flow
pub mod backend;

// Editing session tying store, canvas and inspector together
pub mod session;

// HTTP API layer - editor, file and snapshot endpoints
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use canvas::{CanvasController, Gesture, GestureOutcome, Point};
pub use inspector::PropertyInspector;
pub use session::EditorSession;
pub use server::start_server;
pub use workflow::{Block, BlockType, Connection, Position, Workflow, WorkflowStore};
