//! SQLite heuristic store
//!
//! Average-price documents persisted in a single SQLite table. A "document"
//! is the set of rows sharing a source id; an "entry" is one
//! (source, target) row. The store only ever materializes zero defaults -
//! the running-average writer that fills in real prices is a separate
//! process sharing the same database file.

use super::{Average, AverageLookup, HeuristicStore};
use crate::config::HeuristicStoreConfig;
use crate::graph::NodeId;
use crate::{FarepathError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// [`HeuristicStore`] implementation over a SQLite database
pub struct SqliteHeuristicStore {
    conn: Mutex<Connection>,
}

impl SqliteHeuristicStore {
    /// Open or create the averages database
    pub fn new(config: &HeuristicStoreConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!(path = %config.path.display(), "Opening averages database");

        let conn = Connection::open(&config.path)?;

        // WAL lets the average-price writer and this reader coexist
        if config.wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }

        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, for tests and dry runs
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Initialize database schema
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS averages (
                source_id INTEGER NOT NULL,
                target_id INTEGER NOT NULL,
                avg REAL NOT NULL,
                samples INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (source_id, target_id)
            );

            CREATE INDEX IF NOT EXISTS idx_averages_source ON averages(source_id);
            "#,
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| FarepathError::Storage("averages connection poisoned".to_string()))
    }

    /// Insert a zero entry for (source, target), tolerating a concurrent
    /// creator having won the race
    fn insert_zero_entry(&self, source: NodeId, target: NodeId) -> Result<Average> {
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT OR IGNORE INTO averages (source_id, target_id, avg, samples, created_at, updated_at)
            VALUES (?1, ?2, 0.0, 0, ?3, ?3)
            "#,
            params![source.as_i64(), target.as_i64(), now],
        )?;
        Ok(Average::zero())
    }
}

#[async_trait]
impl HeuristicStore for SqliteHeuristicStore {
    async fn find_average(&self, source: NodeId, target: NodeId) -> Result<AverageLookup> {
        let conn = self.lock()?;

        let avg: Option<f64> = conn
            .query_row(
                "SELECT avg FROM averages WHERE source_id = ?1 AND target_id = ?2",
                params![source.as_i64(), target.as_i64()],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(avg) = avg {
            return Ok(AverageLookup::Found(avg));
        }

        let document_rows: i64 = conn.query_row(
            "SELECT COUNT(*) FROM averages WHERE source_id = ?1",
            params![source.as_i64()],
            |row| row.get(0),
        )?;

        if document_rows == 0 {
            Ok(AverageLookup::DocumentMissing)
        } else {
            Ok(AverageLookup::EntryMissing)
        }
    }

    async fn create_document(&self, source: NodeId, target: NodeId) -> Result<Average> {
        debug!(%source, %target, "creating averages document");
        self.insert_zero_entry(source, target)
    }

    async fn add_entry(&self, source: NodeId, target: NodeId) -> Result<Average> {
        debug!(%source, %target, "adding averages entry");
        self.insert_zero_entry(source, target)
    }
}
