use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

use hireflow_core::error::{HireflowError, Result};
use hireflow_core::traits::WorkflowStore;
use hireflow_core::types::{CampaignId, WorkflowDocument};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS workflows (
    campaign_id TEXT PRIMARY KEY,
    document TEXT NOT NULL,
    saved_at TEXT NOT NULL
);";

/// Summary row for listing saved workflows.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredWorkflow {
    pub campaign_id: CampaignId,
    pub saved_at: DateTime<Utc>,
}

/// SQLite-backed workflow store, one row per campaign.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

fn db_err(e: impl std::fmt::Display) -> HireflowError {
    HireflowError::Database(e.to_string())
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                HireflowError::Database(format!("Failed to create db directory: {}", e))
            })?;
        }

        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;

        debug!(path = %path.display(), "Workflow store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Saved campaigns, most recently saved first.
    pub fn list_campaigns(&self) -> Result<Vec<StoredWorkflow>> {
        let conn = self.conn.lock().map_err(db_err)?;
        let mut stmt = conn
            .prepare("SELECT campaign_id, saved_at FROM workflows ORDER BY saved_at DESC, campaign_id")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(db_err)?;

        let mut out = Vec::new();
        for row in rows {
            let (campaign, saved_at) = row.map_err(db_err)?;
            let saved_at = DateTime::parse_from_rfc3339(&saved_at)
                .map(|t| t.with_timezone(&Utc))
                .map_err(db_err)?;
            out.push(StoredWorkflow {
                campaign_id: CampaignId::new(campaign),
                saved_at,
            });
        }
        Ok(out)
    }

    /// Remove a campaign's workflow. Returns false if nothing was stored.
    pub fn delete(&self, campaign: &CampaignId) -> Result<bool> {
        let conn = self.conn.lock().map_err(db_err)?;
        let removed = conn
            .execute(
                "DELETE FROM workflows WHERE campaign_id = ?1",
                params![campaign.as_str()],
            )
            .map_err(db_err)?;
        debug!(campaign_id = %campaign, removed, "Workflow deleted");
        Ok(removed > 0)
    }
}

impl WorkflowStore for SqliteStore {
    fn load(&self, campaign: &CampaignId) -> BoxFuture<'_, Result<Option<WorkflowDocument>>> {
        let campaign = campaign.clone();

        Box::pin(async move {
            let conn = self.conn.lock().map_err(db_err)?;
            let raw: Option<String> = conn
                .query_row(
                    "SELECT document FROM workflows WHERE campaign_id = ?1",
                    params![campaign.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_err)?;

            match raw {
                Some(json) => {
                    let doc: WorkflowDocument = serde_json::from_str(&json)?;
                    debug!(campaign_id = %campaign, nodes = doc.nodes.len(), "Workflow loaded");
                    Ok(Some(doc))
                }
                None => Ok(None),
            }
        })
    }

    fn save(&self, document: &WorkflowDocument) -> BoxFuture<'_, Result<()>> {
        let mut document = document.clone();
        let saved_at = Utc::now();
        document.saved_at = Some(saved_at);

        Box::pin(async move {
            let json = serde_json::to_string(&document)?;
            let conn = self.conn.lock().map_err(db_err)?;
            conn.execute(
                "INSERT INTO workflows (campaign_id, document, saved_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(campaign_id) DO UPDATE SET
                     document = excluded.document,
                     saved_at = excluded.saved_at",
                params![document.campaign_id.as_str(), json, saved_at.to_rfc3339()],
            )
            .map_err(db_err)?;
            debug!(campaign_id = %document.campaign_id, "Workflow saved");
            Ok(())
        })
    }
}
