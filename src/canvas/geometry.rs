/// Connection geometry
///
/// Everything drawn between blocks is derived from block positions at render
/// time and never stored: anchors, the cubic connector curve, the dashed
/// preview line of a pending connection, and the drop position math.

use crate::workflow::types::{Block, Connection, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rendered block width in canvas units
pub const BLOCK_WIDTH: f64 = 300.0;

/// Height used for the bottom anchor of a block
pub const BLOCK_HEIGHT: f64 = 100.0;

/// Length of the dashed line shown while a connection is pending
pub const PREVIEW_LENGTH: f64 = 100.0;

/// Point in client or canvas space depending on context
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<Position> for Point {
    fn from(pos: Position) -> Self {
        Self { x: pos.x, y: pos.y }
    }
}

/// Where a connection leaves its source block
pub fn source_anchor(position: Position) -> Point {
    Point::new(position.x + BLOCK_WIDTH / 2.0, position.y + BLOCK_HEIGHT)
}

/// Where a connection enters its target block
pub fn target_anchor(position: Position) -> Point {
    Point::new(position.x + BLOCK_WIDTH / 2.0, position.y)
}

/// Block position for a drop: pointer minus canvas origin minus grab offset
pub fn drop_position(pointer: Point, canvas_origin: Point, offset: Point) -> Position {
    Position::new(
        pointer.x - canvas_origin.x - offset.x,
        pointer.y - canvas_origin.y - offset.y,
    )
}

/// Offset of the pointer from a block's top-left corner, in canvas units
pub fn grab_offset(pointer: Point, canvas_origin: Point, block_position: Position) -> Point {
    Point::new(
        pointer.x - canvas_origin.x - block_position.x,
        pointer.y - canvas_origin.y - block_position.y,
    )
}

/// Cubic curve from a source anchor to a target anchor
///
/// Both control points sit at the vertical midpoint, so the curve leaves the
/// source straight down and enters the target straight down.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorPath {
    pub source_id: String,
    pub target_id: String,
    pub start: Point,
    pub control_start: Point,
    pub control_end: Point,
    pub end: Point,
}

impl ConnectorPath {
    pub fn between(source: &Block, target: &Block) -> Self {
        let start = source_anchor(source.position);
        let end = target_anchor(target.position);
        let mid_y = (start.y + end.y) / 2.0;

        Self {
            source_id: source.id.clone(),
            target_id: target.id.clone(),
            start,
            control_start: Point::new(start.x, mid_y),
            control_end: Point::new(end.x, mid_y),
            end,
        }
    }

    /// SVG path data, e.g. `M150,100 C150,150 450,150 450,200`
    pub fn svg(&self) -> String {
        format!(
            "M{},{} C{},{} {},{} {},{}",
            self.start.x,
            self.start.y,
            self.control_start.x,
            self.control_start.y,
            self.control_end.x,
            self.control_end.y,
            self.end.x,
            self.end.y
        )
    }

    /// Point on the curve for `t` in [0, 1]
    pub fn point_at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
        Point::new(
            a * self.start.x + b * self.control_start.x + c * self.control_end.x + d * self.end.x,
            a * self.start.y + b * self.control_start.y + c * self.control_end.y + d * self.end.y,
        )
    }
}

/// Paths for every connection whose endpoints both exist
pub fn connector_paths(blocks: &[Block], connections: &[Connection]) -> Vec<ConnectorPath> {
    let by_id: HashMap<&str, &Block> = blocks.iter().map(|b| (b.id.as_str(), b)).collect();

    connections
        .iter()
        .filter_map(|conn| {
            let source = by_id.get(conn.source_id.as_str())?;
            let target = by_id.get(conn.target_id.as_str())?;
            Some(ConnectorPath::between(source, target))
        })
        .collect()
}

/// Dashed line hanging below the pending source
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreviewLine {
    pub from: Point,
    pub to: Point,
}

pub fn preview_line(source: &Block) -> PreviewLine {
    let from = source_anchor(source.position);
    PreviewLine {
        from,
        to: Point::new(from.x, from.y + PREVIEW_LENGTH),
    }
}
