/// Canvas interaction controller
///
/// Turns abstract pointer gestures into `WorkflowStore` operations. The
/// controller owns only ephemeral view state (drop-zone hover, the drag in
/// flight, the pending connection source and the canvas origin); everything
/// that outlives a gesture lives in the store it is handed.
///
/// Gesture protocol:
/// - drag: `*DragStart` → `DragOver`* → `Drop` | `DragLeave` | `DragCancel`
/// - connect: `ConnectorPress` → `ConnectorRelease` | `PointerRelease` | `BackgroundClick`
/// - select: `BlockClick` | `BackgroundClick`

use crate::canvas::geometry::{
    connector_paths, drop_position, grab_offset, preview_line, ConnectorPath, Point, PreviewLine,
};
use crate::canvas::render::BlockView;
use crate::workflow::store::WorkflowStore;
use crate::workflow::types::{BlockType, Connection};
use serde::{Deserialize, Serialize};

/// What a drag carries from its start to its drop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DragPayload {
    /// New block dragged out of the palette, grabbed with zero offset
    Palette { block_type: BlockType },
    /// Existing block, grabbed `offset` away from its top-left corner
    Block { block_id: String, offset: Point },
}

/// Pointer input, independent of any UI toolkit
///
/// Pointer coordinates are client-space; the controller maps them onto the
/// canvas using its current origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gesture {
    /// Canvas moved or scrolled; `origin` is its top-left in client space
    SetCanvasOrigin { origin: Point },
    PaletteDragStart { block_type: BlockType },
    BlockDragStart { block_id: String, pointer: Point },
    DragOver,
    DragLeave,
    /// Release of a drag over the canvas. An explicit payload wins over the
    /// drag started through this controller.
    Drop {
        pointer: Point,
        #[serde(default)]
        payload: Option<DragPayload>,
    },
    DragCancel,
    BlockClick { block_id: String },
    BlockRemove { block_id: String },
    ConnectorPress { block_id: String },
    ConnectorRelease { block_id: String },
    /// Pointer released anywhere but a connector
    PointerRelease,
    BackgroundClick,
}

/// Observable result of applying a gesture
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum GestureOutcome {
    BlockAdded(String),
    BlockMoved(String),
    BlockRemoved(String),
    Selected(String),
    Connected(Connection),
    ConnectionPending(String),
    DragStarted,
    Hovering,
    /// Transient state reset without touching the graph
    Cleared,
    /// Nothing applied: unknown id, no drag in flight, rejected connection
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct CanvasController {
    canvas_origin: Point,
    drag_hover: bool,
    active_drag: Option<DragPayload>,
    pending_source: Option<String>,
}

impl CanvasController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_origin(origin: Point) -> Self {
        Self {
            canvas_origin: origin,
            ..Self::default()
        }
    }

    pub fn canvas_origin(&self) -> Point {
        self.canvas_origin
    }

    /// Whether the drop zone should be highlighted
    pub fn drag_hover(&self) -> bool {
        self.drag_hover
    }

    pub fn active_drag(&self) -> Option<&DragPayload> {
        self.active_drag.as_ref()
    }

    pub fn pending_source(&self) -> Option<&str> {
        self.pending_source.as_deref()
    }

    /// Apply one gesture against the store
    pub fn apply(&mut self, store: &mut WorkflowStore, gesture: Gesture) -> GestureOutcome {
        tracing::debug!("Canvas gesture: {:?}", gesture);

        match gesture {
            Gesture::SetCanvasOrigin { origin } => {
                self.canvas_origin = origin;
                GestureOutcome::Cleared
            }
            Gesture::PaletteDragStart { block_type } => {
                self.active_drag = Some(DragPayload::Palette { block_type });
                GestureOutcome::DragStarted
            }
            Gesture::BlockDragStart { block_id, pointer } => {
                let Some(block) = store.block(&block_id) else {
                    return GestureOutcome::Ignored;
                };
                let offset = grab_offset(pointer, self.canvas_origin, block.position);
                self.active_drag = Some(DragPayload::Block { block_id, offset });
                GestureOutcome::DragStarted
            }
            Gesture::DragOver => {
                self.drag_hover = true;
                GestureOutcome::Hovering
            }
            Gesture::DragLeave => {
                self.drag_hover = false;
                GestureOutcome::Cleared
            }
            Gesture::Drop { pointer, payload } => {
                self.drag_hover = false;
                let payload = payload.or_else(|| self.active_drag.take());
                self.active_drag = None;
                self.drop(store, pointer, payload)
            }
            Gesture::DragCancel => {
                self.drag_hover = false;
                self.active_drag = None;
                GestureOutcome::Cleared
            }
            Gesture::BlockClick { block_id } => {
                if store.block(&block_id).is_none() {
                    return GestureOutcome::Ignored;
                }
                store.select_block(Some(block_id.as_str()));
                GestureOutcome::Selected(block_id)
            }
            Gesture::BlockRemove { block_id } => {
                if !store.remove_block(&block_id) {
                    return GestureOutcome::Ignored;
                }
                if self.pending_source.as_deref() == Some(block_id.as_str()) {
                    self.pending_source = None;
                }
                GestureOutcome::BlockRemoved(block_id)
            }
            Gesture::ConnectorPress { block_id } => {
                if store.block(&block_id).is_none() {
                    return GestureOutcome::Ignored;
                }
                self.pending_source = Some(block_id.clone());
                GestureOutcome::ConnectionPending(block_id)
            }
            Gesture::ConnectorRelease { block_id } => {
                let Some(source_id) = self.pending_source.take() else {
                    return GestureOutcome::Ignored;
                };
                if store.block(&block_id).is_some() && store.add_connection(&source_id, &block_id) {
                    tracing::debug!("Connected {} -> {}", source_id, block_id);
                    GestureOutcome::Connected(Connection::new(source_id, block_id))
                } else {
                    GestureOutcome::Cleared
                }
            }
            Gesture::PointerRelease => match self.pending_source.take() {
                Some(_) => GestureOutcome::Cleared,
                None => GestureOutcome::Ignored,
            },
            Gesture::BackgroundClick => {
                store.select_block(None);
                self.pending_source = None;
                GestureOutcome::Cleared
            }
        }
    }

    fn drop(
        &self,
        store: &mut WorkflowStore,
        pointer: Point,
        payload: Option<DragPayload>,
    ) -> GestureOutcome {
        match payload {
            Some(DragPayload::Block { block_id, offset }) => {
                let pos = drop_position(pointer, self.canvas_origin, offset);
                if store.update_block_position(&block_id, pos.x, pos.y) {
                    GestureOutcome::BlockMoved(block_id)
                } else {
                    GestureOutcome::Ignored
                }
            }
            Some(DragPayload::Palette { block_type }) => {
                let pos = drop_position(pointer, self.canvas_origin, Point::default());
                GestureOutcome::BlockAdded(store.add_block(block_type, pos))
            }
            None => GestureOutcome::Ignored,
        }
    }

    /// Everything the canvas draws, derived from the store and view state
    pub fn view(&self, store: &WorkflowStore) -> CanvasView {
        let selected = store.selected_block_id();
        let pending = self.pending_source();

        let blocks = store
            .blocks()
            .iter()
            .map(|b| BlockView::render(b, selected, pending))
            .collect::<Vec<_>>();
        let connections = connector_paths(store.blocks(), store.connections())
            .into_iter()
            .map(ConnectorView::from)
            .collect();
        let preview = pending.and_then(|id| store.block(id)).map(preview_line);

        CanvasView {
            show_empty_hint: blocks.is_empty() && !self.drag_hover,
            blocks,
            connections,
            preview,
            drag_hover: self.drag_hover,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorView {
    #[serde(flatten)]
    pub path: ConnectorPath,
    /// SVG path data
    pub d: String,
}

impl From<ConnectorPath> for ConnectorView {
    fn from(path: ConnectorPath) -> Self {
        let d = path.svg();
        Self { path, d }
    }
}

/// Render model of the whole canvas
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasView {
    pub blocks: Vec<BlockView>,
    pub connections: Vec<ConnectorView>,
    pub preview: Option<PreviewLine>,
    pub drag_hover: bool,
    /// "Drag and drop blocks from the sidebar" hint on an empty canvas
    pub show_empty_hint: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::Position;

    fn setup() -> (WorkflowStore, CanvasController) {
        (WorkflowStore::new(), CanvasController::with_origin(Point::new(20.0, 40.0)))
    }

    #[test]
    fn palette_drop_places_block_under_pointer() {
        let (mut store, mut canvas) = setup();

        canvas.apply(&mut store, Gesture::PaletteDragStart { block_type: BlockType::File });
        assert_eq!(canvas.apply(&mut store, Gesture::DragOver), GestureOutcome::Hovering);
        assert!(canvas.drag_hover());

        let outcome = canvas.apply(
            &mut store,
            Gesture::Drop { pointer: Point::new(140.0, 260.0), payload: None },
        );
        let GestureOutcome::BlockAdded(id) = outcome else {
            panic!("expected a new block, got {:?}", outcome);
        };

        let block = store.block(&id).unwrap();
        assert_eq!(block.block_type, BlockType::File);
        assert_eq!(block.label, "File Upload");
        assert_eq!(block.position, Position::new(120.0, 220.0));
        assert!(block.config.is_empty());
        assert_eq!(store.selected_block_id(), Some(id.as_str()));
        assert!(!canvas.drag_hover());
        assert!(canvas.active_drag().is_none());
    }

    #[test]
    fn block_drag_keeps_grab_offset() {
        let (mut store, mut canvas) = setup();
        let id = store.add_block(BlockType::Api, Position::new(100.0, 100.0));

        // Grabbed 30,15 inside the block (client = origin + position + offset).
        canvas.apply(
            &mut store,
            Gesture::BlockDragStart { block_id: id.clone(), pointer: Point::new(150.0, 155.0) },
        );
        let outcome = canvas.apply(
            &mut store,
            Gesture::Drop { pointer: Point::new(350.0, 455.0), payload: None },
        );

        assert_eq!(outcome, GestureOutcome::BlockMoved(id.clone()));
        assert_eq!(store.block(&id).unwrap().position, Position::new(300.0, 400.0));
    }

    #[test]
    fn drop_without_payload_is_ignored() {
        let (mut store, mut canvas) = setup();
        canvas.apply(&mut store, Gesture::DragOver);

        let outcome = canvas.apply(
            &mut store,
            Gesture::Drop { pointer: Point::new(1.0, 1.0), payload: None },
        );
        assert_eq!(outcome, GestureOutcome::Ignored);
        assert!(store.blocks().is_empty());
        assert!(!canvas.drag_hover());
    }

    #[test]
    fn explicit_payload_overrides_started_drag() {
        let (mut store, mut canvas) = setup();
        canvas.apply(&mut store, Gesture::PaletteDragStart { block_type: BlockType::Api });

        let outcome = canvas.apply(
            &mut store,
            Gesture::Drop {
                pointer: Point::new(20.0, 40.0),
                payload: Some(DragPayload::Palette { block_type: BlockType::Merge }),
            },
        );
        assert!(matches!(outcome, GestureOutcome::BlockAdded(_)));
        assert_eq!(store.blocks()[0].block_type, BlockType::Merge);
        assert_eq!(store.blocks()[0].position, Position::new(0.0, 0.0));
    }

    #[test]
    fn drag_leave_clears_hover() {
        let (mut store, mut canvas) = setup();
        canvas.apply(&mut store, Gesture::DragOver);
        canvas.apply(&mut store, Gesture::DragLeave);
        assert!(!canvas.drag_hover());
    }

    #[test]
    fn connect_gesture_adds_one_connection() {
        let (mut store, mut canvas) = setup();
        let a = store.add_block(BlockType::Api, Position::default());
        let b = store.add_block(BlockType::Clean, Position::new(0.0, 200.0));

        for _ in 0..2 {
            canvas.apply(&mut store, Gesture::BlockClick { block_id: a.clone() });
            canvas.apply(&mut store, Gesture::ConnectorPress { block_id: a.clone() });
            assert_eq!(canvas.pending_source(), Some(a.as_str()));
            canvas.apply(&mut store, Gesture::ConnectorRelease { block_id: b.clone() });
            assert_eq!(canvas.pending_source(), None);
        }

        assert_eq!(store.connections(), &[Connection::new(&a, &b)]);
    }

    #[test]
    fn release_on_self_or_without_source_commits_nothing() {
        let (mut store, mut canvas) = setup();
        let a = store.add_block(BlockType::Api, Position::default());

        assert_eq!(
            canvas.apply(&mut store, Gesture::ConnectorRelease { block_id: a.clone() }),
            GestureOutcome::Ignored
        );

        canvas.apply(&mut store, Gesture::ConnectorPress { block_id: a.clone() });
        assert_eq!(
            canvas.apply(&mut store, Gesture::ConnectorRelease { block_id: a.clone() }),
            GestureOutcome::Cleared
        );
        assert!(store.connections().is_empty());
        assert_eq!(canvas.pending_source(), None);
    }

    #[test]
    fn pointer_release_abandons_pending_connection() {
        let (mut store, mut canvas) = setup();
        let a = store.add_block(BlockType::Api, Position::default());

        canvas.apply(&mut store, Gesture::ConnectorPress { block_id: a });
        assert_eq!(canvas.apply(&mut store, Gesture::PointerRelease), GestureOutcome::Cleared);
        assert_eq!(canvas.pending_source(), None);
    }

    #[test]
    fn background_click_clears_selection_and_pending() {
        let (mut store, mut canvas) = setup();
        let a = store.add_block(BlockType::Sheets, Position::default());
        canvas.apply(&mut store, Gesture::ConnectorPress { block_id: a });

        canvas.apply(&mut store, Gesture::BackgroundClick);
        assert_eq!(store.selected_block_id(), None);
        assert_eq!(canvas.pending_source(), None);
    }

    #[test]
    fn removing_pending_source_drops_preview() {
        let (mut store, mut canvas) = setup();
        let a = store.add_block(BlockType::Api, Position::default());
        canvas.apply(&mut store, Gesture::ConnectorPress { block_id: a.clone() });
        assert!(canvas.view(&store).preview.is_some());

        canvas.apply(&mut store, Gesture::BlockRemove { block_id: a });
        let view = canvas.view(&store);
        assert!(view.preview.is_none());
        assert!(view.show_empty_hint);
    }

    #[test]
    fn view_renders_paths_and_pending_connector() {
        let (mut store, mut canvas) = setup();
        let a = store.add_block(BlockType::Api, Position::new(0.0, 0.0));
        let b = store.add_block(BlockType::Merge, Position::new(300.0, 200.0));
        store.add_connection(&a, &b);
        canvas.apply(&mut store, Gesture::ConnectorPress { block_id: b.clone() });

        let view = canvas.view(&store);
        assert_eq!(view.connections.len(), 1);
        assert_eq!(view.connections[0].d, "M150,100 C150,150 450,150 450,200");
        assert!(view.blocks.iter().any(|v| v.id == b && v.selected));
        assert_eq!(view.preview.unwrap().to, Point::new(450.0, 400.0));
        assert!(!view.show_empty_hint);
    }

    #[test]
    fn gestures_parse_from_tagged_json() {
        let gesture: Gesture = serde_json::from_str(
            r#"{ "kind": "drop", "pointer": { "x": 140, "y": 260 },
                 "payload": { "source": "palette", "block_type": "file" } }"#,
        )
        .unwrap();
        assert_eq!(
            gesture,
            Gesture::Drop {
                pointer: Point::new(140.0, 260.0),
                payload: Some(DragPayload::Palette { block_type: BlockType::File }),
            }
        );

        let gesture: Gesture = serde_json::from_str(r#"{ "kind": "background_click" }"#).unwrap();
        assert_eq!(gesture, Gesture::BackgroundClick);
    }
}
