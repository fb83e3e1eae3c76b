use anyhow::Result;
use rusqlite::params;

use super::ReportStore;
use super::types::NoteRecord;

impl ReportStore {
    pub async fn save_note(&self, title: Option<&str>, content: &str) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = chrono::Local::now().to_rfc3339();
        self.with_db(|db| {
            db.execute(
                "INSERT INTO notes (id, title, content, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, title, content, created_at],
            )?;
            Ok(())
        })
        .await?;
        Ok(id)
    }

    pub async fn list_notes(&self) -> Result<Vec<NoteRecord>> {
        self.with_db(|db| {
            let mut stmt = db.prepare(
                "SELECT id, title, content, created_at FROM notes ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(NoteRecord {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    content: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?;

            let mut results = Vec::new();
            for row in rows {
                results.push(row?);
            }
            Ok(results)
        })
        .await
    }
}
