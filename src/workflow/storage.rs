/// SQLite persistence layer for saved workflow snapshots
///
/// The store's save is in-memory only; the HTTP layer hands each saved
/// snapshot to this storage afterwards. Workflows are stored as JSON for
/// flexibility while id, name, owner and timestamps stay queryable columns.

use crate::workflow::types::Workflow;
use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool},
    Row,
};
use std::path::Path;

/// SQLite-based workflow snapshot storage
#[derive(Debug, Clone)]
pub struct WorkflowStorage {
    /// SQLite connection pool for the workflow database
    pool: SqlitePool,
}

impl WorkflowStorage {
    /// Create new storage instance with database connection
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database file and initialize the schema
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        tracing::info!("Opening workflow database: {}", db_path.display());

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Initialize the workflow storage schema
    ///
    /// Safe to call multiple times (uses IF NOT EXISTS).
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workflows (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                definition JSON NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_workflows_updated_at
            ON workflows(updated_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a new snapshot or replace the existing one with the same id
    ///
    /// The snapshot's own timestamps are kept so `created_at` survives re-saves.
    pub async fn save_workflow(&self, workflow: &Workflow) -> Result<()> {
        let definition_json = serde_json::to_string(workflow)?;

        sqlx::query(
            r#"
            INSERT INTO workflows (id, name, owner_id, definition, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                owner_id = excluded.owner_id,
                definition = excluded.definition,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&workflow.id)
        .bind(&workflow.name)
        .bind(&workflow.owner_id)
        .bind(&definition_json)
        .bind(workflow.created_at.to_rfc3339())
        .bind(workflow.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Retrieve a workflow by ID
    pub async fn get_workflow(&self, id: &str) -> Result<Option<Workflow>> {
        let row = sqlx::query("SELECT definition FROM workflows WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let definition_json: String = row.get("definition");
                let workflow: Workflow = serde_json::from_str(&definition_json)?;
                Ok(Some(workflow))
            }
            None => Ok(None),
        }
    }

    /// List all workflows, most recently updated first
    pub async fn list_workflows(&self) -> Result<Vec<WorkflowMetadata>> {
        let rows = sqlx::query(
            "SELECT id, name, owner_id, created_at, updated_at FROM workflows ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut workflows = Vec::new();
        for row in rows {
            workflows.push(WorkflowMetadata {
                id: row.get("id"),
                name: row.get("name"),
                owner_id: row.get("owner_id"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            });
        }

        Ok(workflows)
    }

    /// Delete a workflow by ID
    pub async fn delete_workflow(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Basic workflow metadata for listing operations
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMetadata {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::store::WorkflowStore;
    use crate::workflow::types::{BlockType, Position};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_storage() -> WorkflowStorage {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let storage = WorkflowStorage::new(pool);
        storage.init_schema().await.unwrap();
        storage
    }

    #[tokio::test]
    async fn saved_snapshot_round_trips() {
        let storage = memory_storage().await;
        let mut store = WorkflowStore::new();
        let a = store.add_block(BlockType::Api, Position::new(4.0, 8.0));
        let b = store.add_block(BlockType::Clean, Position::new(4.0, 208.0));
        store.add_connection(&a, &b);
        let saved = store.save_workflow().clone();

        storage.save_workflow(&saved).await.unwrap();
        let loaded = storage.get_workflow(&saved.id).await.unwrap();
        assert_eq!(loaded, Some(saved));
        assert_eq!(storage.get_workflow("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn resave_replaces_row_and_keeps_creation_time() {
        let storage = memory_storage().await;
        let mut store = WorkflowStore::new();
        let first = store.save_workflow().clone();
        storage.save_workflow(&first).await.unwrap();

        store.rename_workflow("Renamed");
        store.add_block(BlockType::Merge, Position::default());
        let second = store.save_workflow().clone();
        storage.save_workflow(&second).await.unwrap();

        let listed = storage.list_workflows().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Renamed");
        assert_eq!(listed[0].created_at, first.created_at.to_rfc3339());

        assert!(storage.delete_workflow(&first.id).await.unwrap());
        assert!(!storage.delete_workflow(&first.id).await.unwrap());
    }
}
