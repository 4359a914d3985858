/// Block presentation
///
/// Pure mapping from a block to what the canvas shows for it: icon, colour
/// classes, selection and connector state, plus the gestures each affordance
/// emits. Also describes the palette the user drags new blocks from.

use crate::canvas::controller::Gesture;
use crate::canvas::geometry::Point;
use crate::workflow::types::{Block, BlockType, Position};
use serde::Serialize;

/// Icon names shown in block headers and palette entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockIcon {
    Database,
    FileUp,
    FileSpreadsheet,
    Table,
    Layers,
}

pub fn icon_for(block_type: BlockType) -> BlockIcon {
    match block_type {
        BlockType::Api | BlockType::Database => BlockIcon::Database,
        BlockType::File => BlockIcon::FileUp,
        BlockType::Sheets => BlockIcon::FileSpreadsheet,
        BlockType::Clean => BlockIcon::Table,
        BlockType::Transform | BlockType::Merge => BlockIcon::Layers,
    }
}

/// Colour classes for the block body
pub fn color_class_for(block_type: BlockType) -> &'static str {
    match block_type {
        BlockType::Api | BlockType::File | BlockType::Database | BlockType::Sheets => {
            "bg-blue-50 border-blue-200 dark:bg-blue-900/30 dark:border-blue-800"
        }
        BlockType::Clean => "bg-green-50 border-green-200 dark:bg-green-900/30 dark:border-green-800",
        BlockType::Transform => {
            "bg-purple-50 border-purple-200 dark:bg-purple-900/30 dark:border-purple-800"
        }
        BlockType::Merge => "bg-amber-50 border-amber-200 dark:bg-amber-900/30 dark:border-amber-800",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorState {
    Idle,
    /// This block is the pending source of a connection
    Connecting,
}

/// Everything needed to draw one block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockView {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub label: String,
    pub icon: BlockIcon,
    pub color_class: &'static str,
    pub position: Position,
    pub selected: bool,
    pub connector: ConnectorState,
}

impl BlockView {
    pub fn render(block: &Block, selected_id: Option<&str>, pending_source: Option<&str>) -> Self {
        let connector = if pending_source == Some(block.id.as_str()) {
            ConnectorState::Connecting
        } else {
            ConnectorState::Idle
        };

        Self {
            id: block.id.clone(),
            block_type: block.block_type,
            label: block.label.clone(),
            icon: icon_for(block.block_type),
            color_class: color_class_for(block.block_type),
            position: block.position,
            selected: selected_id == Some(block.id.as_str()),
            connector,
        }
    }

    /// Header grabbed at `pointer` (client coordinates)
    pub fn drag_start(&self, pointer: Point) -> Gesture {
        Gesture::BlockDragStart {
            block_id: self.id.clone(),
            pointer,
        }
    }

    pub fn click(&self) -> Gesture {
        Gesture::BlockClick {
            block_id: self.id.clone(),
        }
    }

    pub fn remove(&self) -> Gesture {
        Gesture::BlockRemove {
            block_id: self.id.clone(),
        }
    }

    pub fn connector_press(&self) -> Gesture {
        Gesture::ConnectorPress {
            block_id: self.id.clone(),
        }
    }

    pub fn connector_release(&self) -> Gesture {
        Gesture::ConnectorRelease {
            block_id: self.id.clone(),
        }
    }
}

/// One draggable entry of the block palette
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteEntry {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub label: &'static str,
    pub icon: BlockIcon,
}

impl PaletteEntry {
    pub fn drag_start(&self) -> Gesture {
        Gesture::PaletteDragStart {
            block_type: self.block_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaletteGroup {
    pub title: &'static str,
    pub entries: Vec<PaletteEntry>,
}

/// Palette grouped into data sources and transformations
pub fn palette() -> Vec<PaletteGroup> {
    let entry = |block_type: BlockType| PaletteEntry {
        block_type,
        label: palette_label(block_type),
        icon: icon_for(block_type),
    };

    vec![
        PaletteGroup {
            title: "Data Sources",
            entries: BlockType::ALL
                .into_iter()
                .filter(|t| t.is_data_source())
                .map(entry)
                .collect(),
        },
        PaletteGroup {
            title: "Transformations",
            entries: BlockType::ALL
                .into_iter()
                .filter(|t| !t.is_data_source())
                .map(entry)
                .collect(),
        },
    ]
}

fn palette_label(block_type: BlockType) -> &'static str {
    match block_type {
        BlockType::Api => "API",
        BlockType::File => "File Upload",
        BlockType::Database => "Database",
        BlockType::Sheets => "Google Sheets",
        BlockType::Clean => "Clean Data",
        BlockType::Transform => "Transform",
        BlockType::Merge => "Merge Data",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::controller::{CanvasController, GestureOutcome};
    use crate::workflow::config::BlockConfig;
    use crate::workflow::store::WorkflowStore;
    use crate::workflow::types::Connection;

    fn block(id: &str, block_type: BlockType) -> Block {
        Block {
            id: id.to_string(),
            block_type,
            position: Position::new(5.0, 6.0),
            config: BlockConfig::default(),
            label: block_type.default_label().to_string(),
        }
    }

    #[test]
    fn icons_and_colors_follow_type() {
        assert_eq!(icon_for(BlockType::Api), BlockIcon::Database);
        assert_eq!(icon_for(BlockType::Merge), BlockIcon::Layers);
        assert_eq!(color_class_for(BlockType::File), color_class_for(BlockType::Sheets));
        assert!(color_class_for(BlockType::Clean).starts_with("bg-green-50"));
        assert!(color_class_for(BlockType::Merge).starts_with("bg-amber-50"));
    }

    #[test]
    fn connector_lights_up_only_for_pending_source() {
        let a = block("a", BlockType::Api);

        let idle = BlockView::render(&a, None, Some("b"));
        assert_eq!(idle.connector, ConnectorState::Idle);
        assert!(!idle.selected);

        let active = BlockView::render(&a, Some("a"), Some("a"));
        assert_eq!(active.connector, ConnectorState::Connecting);
        assert!(active.selected);
    }

    #[test]
    fn block_affordances_drive_the_controller() {
        let mut store = WorkflowStore::new();
        let mut canvas = CanvasController::new();
        let a = store.add_block(BlockType::Api, Position::new(0.0, 0.0));
        let b = store.add_block(BlockType::Clean, Position::new(300.0, 0.0));
        let view_of = |canvas: &CanvasController, store: &WorkflowStore, id: &str| {
            canvas
                .view(store)
                .blocks
                .into_iter()
                .find(|v| v.id == id)
                .unwrap()
        };

        let va = view_of(&canvas, &store, &a);
        assert_eq!(canvas.apply(&mut store, va.click()), GestureOutcome::Selected(a.clone()));
        assert!(view_of(&canvas, &store, &a).selected);

        canvas.apply(&mut store, va.connector_press());
        assert_eq!(view_of(&canvas, &store, &a).connector, ConnectorState::Connecting);

        let vb = view_of(&canvas, &store, &b);
        assert_eq!(
            canvas.apply(&mut store, vb.connector_release()),
            GestureOutcome::Connected(Connection::new(a.clone(), b.clone()))
        );
        assert_eq!(store.connections().len(), 1);
        assert!(canvas.pending_source().is_none());

        let va = view_of(&canvas, &store, &a);
        assert_eq!(
            canvas.apply(&mut store, va.drag_start(Point::new(40.0, 20.0))),
            GestureOutcome::DragStarted
        );
        canvas.apply(
            &mut store,
            Gesture::Drop { pointer: Point::new(140.0, 70.0), payload: None },
        );
        assert_eq!(store.block(&a).unwrap().position, Position::new(100.0, 50.0));

        assert_eq!(canvas.apply(&mut store, vb.remove()), GestureOutcome::BlockRemoved(b.clone()));
        assert!(store.connections().is_empty());
        assert_eq!(canvas.apply(&mut store, vb.click()), GestureOutcome::Ignored);
    }

    #[test]
    fn palette_splits_sources_from_transforms() {
        let groups = palette();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].entries.len(), 4);
        assert_eq!(groups[1].entries.len(), 3);
        assert_eq!(groups[0].entries[1].label, "File Upload");
        assert_eq!(
            groups[1].entries[0].drag_start(),
            Gesture::PaletteDragStart { block_type: BlockType::Clean }
        );
    }
}
