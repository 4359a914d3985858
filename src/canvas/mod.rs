/// Canvas layer
///
/// Pointer-gesture interpretation, block presentation and the geometry of
/// connectors drawn between blocks.

// Gesture protocol and ephemeral view state
pub mod controller;

// Anchors, connector curves and drop math
pub mod geometry;

// Block icons, colours, connector state and the palette
pub mod render;

pub use controller::{CanvasController, CanvasView, DragPayload, Gesture, GestureOutcome};
pub use geometry::{ConnectorPath, Point, PreviewLine};
pub use render::{BlockView, ConnectorState};
