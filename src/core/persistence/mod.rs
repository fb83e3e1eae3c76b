mod notes;
mod reports;
pub mod types;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::lifecycle::LifecycleComponent;
use crate::platform::{NativePlatform, Platform};

pub const DB_FILE: &str = "reconlab.db";

/// Durable store for finished scan results and notes.
///
/// The connection is dropped on shutdown; later calls fail instead of
/// reopening the database.
#[derive(Clone)]
pub struct ReportStore {
    db: Arc<Mutex<Option<Connection>>>,
}

impl ReportStore {
    pub async fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        tokio::fs::create_dir_all(data_dir)
            .await
            .with_context(|| format!("creating {}", data_dir.display()))?;
        NativePlatform::restrict_dir_permissions(data_dir);

        let db_path = data_dir.join(DB_FILE);
        let db = Connection::open(&db_path)
            .with_context(|| format!("opening {}", db_path.display()))?;
        NativePlatform::restrict_file_permissions(&db_path);

        Self::from_connection(db)
    }

    pub fn from_connection(db: Connection) -> Result<Self> {
        db.execute(
            "CREATE TABLE IF NOT EXISTS scan_results (
                id TEXT PRIMARY KEY,
                scan_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                tool TEXT NOT NULL,
                target TEXT NOT NULL,
                command TEXT NOT NULL,
                output TEXT NOT NULL,
                status TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT,
                created_at TEXT NOT NULL,
                title TEXT NOT NULL
            )",
            [],
        )?;

        db.execute(
            "CREATE INDEX IF NOT EXISTS idx_scan_results_user_created ON scan_results(user_id, created_at)",
            [],
        )?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                title TEXT,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            db: Arc::new(Mutex::new(Some(db))),
        })
    }

    pub async fn close(&self) {
        if let Some(db) = self.db.lock().await.take()
            && let Err((_, e)) = db.close()
        {
            warn!("Report store did not close cleanly: {}", e);
        }
    }

    /// Runs `f` with the live connection, or fails if the store was closed.
    async fn with_db<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.db.lock().await;
        let db = guard
            .as_ref()
            .ok_or_else(|| anyhow!("report store is closed"))?;
        f(db)
    }
}

#[async_trait]
impl LifecycleComponent for ReportStore {
    async fn on_init(&mut self) -> Result<()> {
        info!("Report store (SQLite) initializing...");
        Ok(())
    }

    async fn on_shutdown(&mut self) -> Result<()> {
        info!("Report store shutting down...");
        self.close().await;
        Ok(())
    }
}

/// In-memory store for tests.
#[cfg(test)]
pub fn test_report_store() -> ReportStore {
    let db = Connection::open_in_memory().expect("open in-memory db");
    ReportStore::from_connection(db).expect("init schema")
}
