/// In-memory workflow state store
///
/// The single authoritative state of an editing session: blocks, connections,
/// selection and the last saved snapshot. Every mutation happens through the
/// operations below, synchronously, and is announced on a broadcast channel so
/// renderers, the inspector and the HTTP layer observe the latest value.
///
/// Operations on unknown ids are silent no-ops. They still report whether
/// anything changed (`bool` / `Option`) so callers and tests can tell a
/// deliberate no-op apart from a mutation.

use crate::workflow::config::BlockConfig;
use crate::workflow::types::{Block, BlockType, Connection, Position, Workflow};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Name given to a session that has not been renamed
pub const DEFAULT_WORKFLOW_NAME: &str = "New Workflow";

/// Owner recorded on snapshots when no authenticated user is known
pub const ANONYMOUS_OWNER: &str = "anonymous";

const EVENT_CAPACITY: usize = 64;

/// Source of timestamps for saved snapshots
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Change notifications published by the store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    BlockAdded(String),
    BlockMoved(String),
    BlockRemoved(String),
    ConnectionAdded(Connection),
    ConnectionRemoved(Connection),
    ConfigUpdated(String),
    SelectionChanged(Option<String>),
    Renamed(String),
    Saved(Workflow),
    RunRequested(RunRequest),
}

/// Graph handed to a future executor when the user presses run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRequest {
    pub blocks: Vec<Block>,
    pub connections: Vec<Connection>,
}

pub struct WorkflowStore {
    name: String,
    owner_id: String,
    blocks: Vec<Block>,
    connections: Vec<Connection>,
    selected_block_id: Option<String>,
    last_saved: Option<Workflow>,
    events: broadcast::Sender<StoreEvent>,
    clock: Clock,
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowStore {
    /// Empty session named "New Workflow", owned by no one in particular
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            name: DEFAULT_WORKFLOW_NAME.to_string(),
            owner_id: ANONYMOUS_OWNER.to_string(),
            blocks: Vec::new(),
            connections: Vec::new(),
            selected_block_id: None,
            last_saved: None,
            events,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = owner_id.into();
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Receive every event published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn selected_block_id(&self) -> Option<&str> {
        self.selected_block_id.as_deref()
    }

    pub fn selected_block(&self) -> Option<&Block> {
        self.selected_block_id.as_deref().and_then(|id| self.block(id))
    }

    pub fn last_saved(&self) -> Option<&Workflow> {
        self.last_saved.as_ref()
    }

    /// Place a new block and select it, returning its id
    pub fn add_block(&mut self, block_type: BlockType, position: Position) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.blocks.push(Block {
            id: id.clone(),
            block_type,
            position,
            config: BlockConfig::new(),
            label: block_type.default_label().to_string(),
        });

        tracing::debug!("Added {} block {} at ({}, {})", block_type, id, position.x, position.y);
        self.publish(StoreEvent::BlockAdded(id.clone()));
        self.select_block(Some(id.as_str()));
        id
    }

    pub fn update_block_position(&mut self, id: &str, x: f64, y: f64) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        block.position = Position::new(x, y);
        self.publish(StoreEvent::BlockMoved(id.to_string()));
        true
    }

    /// Delete a block together with every connection touching it
    pub fn remove_block(&mut self, id: &str) -> bool {
        let Some(index) = self.blocks.iter().position(|b| b.id == id) else {
            return false;
        };
        self.blocks.remove(index);

        let mut dropped = Vec::new();
        self.connections.retain(|conn| {
            if conn.touches(id) {
                dropped.push(conn.clone());
                false
            } else {
                true
            }
        });
        for conn in dropped {
            self.publish(StoreEvent::ConnectionRemoved(conn));
        }

        self.publish(StoreEvent::BlockRemoved(id.to_string()));
        if self.selected_block_id.as_deref() == Some(id) {
            self.select_block(None);
        }
        true
    }

    /// Connect two blocks; self-loops and duplicate pairs are dropped
    pub fn add_connection(&mut self, source_id: &str, target_id: &str) -> bool {
        if source_id == target_id {
            return false;
        }
        let conn = Connection::new(source_id, target_id);
        if self.connections.contains(&conn) {
            return false;
        }

        self.connections.push(conn.clone());
        self.publish(StoreEvent::ConnectionAdded(conn));
        true
    }

    pub fn remove_connection(&mut self, source_id: &str, target_id: &str) -> bool {
        let Some(index) = self
            .connections
            .iter()
            .position(|c| c.source_id == source_id && c.target_id == target_id)
        else {
            return false;
        };

        let conn = self.connections.remove(index);
        self.publish(StoreEvent::ConnectionRemoved(conn));
        true
    }

    /// Shallow-merge `partial` into the block's config
    ///
    /// A string `label` entry also renames the block.
    pub fn update_block_config(&mut self, id: &str, partial: Map<String, Value>) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) else {
            return false;
        };

        if let Some(label) = partial.get("label").and_then(Value::as_str) {
            block.label = label.to_string();
        }
        block.config.merge(partial);

        self.publish(StoreEvent::ConfigUpdated(id.to_string()));
        true
    }

    /// Set or clear the selection; selecting an unknown id is ignored
    pub fn select_block(&mut self, id: Option<&str>) -> bool {
        if let Some(id) = id {
            if self.block(id).is_none() {
                return false;
            }
        }
        if self.selected_block_id.as_deref() == id {
            return false;
        }

        self.selected_block_id = id.map(str::to_string);
        self.publish(StoreEvent::SelectionChanged(self.selected_block_id.clone()));
        true
    }

    pub fn rename_workflow(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.publish(StoreEvent::Renamed(self.name.clone()));
    }

    /// Snapshot the current graph as the "last saved" workflow
    ///
    /// Reuses the previous snapshot's id and creation time when one exists.
    pub fn save_workflow(&mut self) -> &Workflow {
        let now = (self.clock)();
        let (id, created_at, description, schedule) = match &self.last_saved {
            Some(prev) => (
                prev.id.clone(),
                prev.created_at,
                prev.description.clone(),
                prev.schedule.clone(),
            ),
            None => (uuid::Uuid::new_v4().to_string(), now, None, None),
        };

        let workflow = Workflow {
            id,
            name: self.name.clone(),
            description,
            blocks: self.blocks.clone(),
            connections: self.connections.clone(),
            created_at,
            updated_at: now,
            owner_id: self.owner_id.clone(),
            is_published: false,
            schedule,
        };

        tracing::info!(
            "Workflow saved: {} ({}) with {} blocks and {} connections",
            workflow.id,
            workflow.name,
            workflow.blocks.len(),
            workflow.connections.len()
        );
        self.publish(StoreEvent::Saved(workflow.clone()));
        self.last_saved.insert(workflow)
    }

    /// Announce the current graph for a future executor; nothing runs here
    pub fn run_workflow(&self) -> RunRequest {
        let request = RunRequest {
            blocks: self.blocks.clone(),
            connections: self.connections.clone(),
        };
        tracing::info!(
            "Running workflow: {} blocks, {} connections",
            request.blocks.len(),
            request.connections.len()
        );
        self.publish(StoreEvent::RunRequested(request.clone()));
        request
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is fine: the store is observable, not observed.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicI64, Ordering};

    fn partial(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    fn ticking_clock() -> Clock {
        let tick = Arc::new(AtomicI64::new(0));
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        Arc::new(move || start + Duration::seconds(tick.fetch_add(1, Ordering::SeqCst)))
    }

    #[test]
    fn add_block_assigns_distinct_ids_and_selects() {
        let mut store = WorkflowStore::new();
        let ids: Vec<String> = (0..50)
            .map(|i| store.add_block(BlockType::ALL[i % 7], Position::new(i as f64, 0.0)))
            .collect();

        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert_eq!(store.selected_block_id(), ids.last().map(String::as_str));
        assert_eq!(store.blocks()[0].label, "API Source");
        assert!(store.blocks()[0].config.is_empty());
    }

    #[test]
    fn remove_block_cascades_and_is_idempotent() {
        let mut store = WorkflowStore::new();
        let a = store.add_block(BlockType::Api, Position::default());
        let b = store.add_block(BlockType::Clean, Position::default());
        let c = store.add_block(BlockType::Merge, Position::default());
        store.add_connection(&a, &b);
        store.add_connection(&b, &c);
        store.add_connection(&a, &c);

        assert!(store.remove_block(&b));
        assert!(store.connections().iter().all(|conn| !conn.touches(&b)));
        assert_eq!(store.connections(), &[Connection::new(&a, &c)]);

        let blocks_before = store.blocks().to_vec();
        let connections_before = store.connections().to_vec();
        assert!(!store.remove_block(&b));
        assert_eq!(store.blocks(), blocks_before.as_slice());
        assert_eq!(store.connections(), connections_before.as_slice());
    }

    #[test]
    fn removing_selected_block_clears_selection() {
        let mut store = WorkflowStore::new();
        let a = store.add_block(BlockType::File, Position::default());
        let b = store.add_block(BlockType::File, Position::default());
        store.select_block(Some(a.as_str()));

        store.remove_block(&b);
        assert_eq!(store.selected_block_id(), Some(a.as_str()));
        store.remove_block(&a);
        assert_eq!(store.selected_block_id(), None);
    }

    #[test]
    fn connections_reject_duplicates_and_self_loops() {
        let mut store = WorkflowStore::new();
        let a = store.add_block(BlockType::Api, Position::default());
        let b = store.add_block(BlockType::Transform, Position::default());

        assert!(store.add_connection(&a, &b));
        assert!(!store.add_connection(&a, &b));
        assert!(!store.add_connection(&a, &a));
        assert!(store.add_connection(&b, &a));
        assert_eq!(store.connections().len(), 2);

        assert!(store.remove_connection(&a, &b));
        assert!(!store.remove_connection(&a, &b));
        assert_eq!(store.connections(), &[Connection::new(&b, &a)]);
    }

    #[test]
    fn update_position_ignores_unknown_ids() {
        let mut store = WorkflowStore::new();
        let a = store.add_block(BlockType::Sheets, Position::new(1.0, 2.0));

        assert!(store.update_block_position(&a, -30.0, 45.5));
        assert!(!store.update_block_position("missing", 0.0, 0.0));
        assert_eq!(store.block(&a).unwrap().position, Position::new(-30.0, 45.5));
    }

    #[test]
    fn config_update_merges_by_key() {
        let mut store = WorkflowStore::new();
        let a = store.add_block(BlockType::Database, Position::default());

        store.update_block_config(&a, partial(json!({ "dbType": "mysql", "dbQuery": "select 1" })));
        store.update_block_config(&a, partial(json!({ "dbQuery": "select 2" })));

        let config = &store.block(&a).unwrap().config;
        assert_eq!(config.get_str("dbType"), Some("mysql"));
        assert_eq!(config.get_str("dbQuery"), Some("select 2"));
        assert!(!store.update_block_config("missing", partial(json!({ "k": 1 }))));
    }

    #[test]
    fn label_edit_renames_block() {
        let mut store = WorkflowStore::new();
        let a = store.add_block(BlockType::Clean, Position::default());

        store.update_block_config(&a, partial(json!({ "label": "Strip blanks" })));
        assert_eq!(store.block(&a).unwrap().label, "Strip blanks");
    }

    #[test]
    fn select_unknown_block_is_ignored() {
        let mut store = WorkflowStore::new();
        let a = store.add_block(BlockType::Api, Position::default());

        assert!(!store.select_block(Some("missing")));
        assert_eq!(store.selected_block_id(), Some(a.as_str()));
        assert!(store.select_block(None));
        assert_eq!(store.selected_block_id(), None);
    }

    #[test]
    fn save_twice_keeps_identity_and_refreshes_update_time() {
        let mut store = WorkflowStore::new().with_owner("user-1").with_clock(ticking_clock());
        store.add_block(BlockType::File, Position::default());

        let first = store.save_workflow().clone();
        let second = store.save_workflow().clone();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.owner_id, "user-1");
        assert!(!second.is_published);
        assert_eq!(store.last_saved(), Some(&second));
    }

    #[test]
    fn save_snapshots_are_replaced_not_merged() {
        let mut store = WorkflowStore::new();
        let a = store.add_block(BlockType::Api, Position::default());
        store.save_workflow();

        store.remove_block(&a);
        store.rename_workflow("Quarterly close");
        let saved = store.save_workflow();
        assert!(saved.blocks.is_empty());
        assert_eq!(saved.name, "Quarterly close");
    }

    #[tokio::test]
    async fn run_and_save_are_observable() {
        let mut store = WorkflowStore::new();
        let mut events = store.subscribe();

        let a = store.add_block(BlockType::Api, Position::default());
        let request = store.run_workflow();
        store.save_workflow();

        assert_eq!(events.recv().await.unwrap(), StoreEvent::BlockAdded(a.clone()));
        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::SelectionChanged(Some(a.clone()))
        );
        assert_eq!(events.recv().await.unwrap(), StoreEvent::RunRequested(request));
        assert!(matches!(events.recv().await.unwrap(), StoreEvent::Saved(_)));
    }
}
