use anyhow::Result;
use rusqlite::params;
use tracing::info;

use super::ReportStore;
use super::types::{StoredReport, StoredScan};
use crate::core::scan::types::ScanRecord;

/// "nmap" + "10.0.0.5" -> "Nmap Scan - 10.0.0.5". Every alphabetic run in the
/// tool name is capitalised, the rest lowercased.
pub fn auto_title(tool: &str, target: &str) -> String {
    let mut name = String::with_capacity(tool.len());
    let mut prev_alpha = false;
    for ch in tool.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                name.extend(ch.to_lowercase());
            } else {
                name.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            name.push(ch);
            prev_alpha = false;
        }
    }
    format!("{} Scan - {}", name, target)
}

impl ReportStore {
    pub async fn store_scan(
        &self,
        record: &ScanRecord,
        user_id: &str,
        title: Option<&str>,
    ) -> Result<StoredScan> {
        let title = match title.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => auto_title(&record.tool, &record.target),
        };
        let stored_id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Local::now().to_rfc3339();
        let end_time = record.end_time.clone().unwrap_or_else(|| now.clone());

        self.with_db(|db| {
            db.execute(
                "INSERT INTO scan_results
                    (id, scan_id, user_id, tool, target, command, output, status, start_time, end_time, created_at, title)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    stored_id,
                    record.scan_id,
                    user_id,
                    record.tool,
                    record.target,
                    record.command_line(),
                    record.output,
                    record.status.as_str(),
                    record.start_time,
                    end_time,
                    now,
                    title
                ],
            )?;
            Ok(())
        })
        .await?;

        info!(
            "Stored scan [{}] for user [{}] as {}",
            record.scan_id, user_id, stored_id
        );
        Ok(StoredScan { stored_id, title })
    }

    /// Newest first. Without an owner every stored report is listed.
    pub async fn list_reports(&self, user_id: Option<&str>) -> Result<Vec<StoredReport>> {
        self.with_db(|db| {
            let mut stmt = db.prepare(
                "SELECT id, scan_id, title, output, tool, target, created_at, status, command
                 FROM scan_results
                 WHERE ?1 IS NULL OR user_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok(StoredReport {
                    id: row.get(0)?,
                    scan_id: row.get(1)?,
                    title: row.get(2)?,
                    content: row.get(3)?,
                    module: row.get(4)?,
                    target: row.get(5)?,
                    date: row.get(6)?,
                    status: row.get(7)?,
                    command: row.get(8)?,
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

    /// Returns false when nothing matched, including another owner's report.
    pub async fn delete_report(&self, report_id: &str, user_id: Option<&str>) -> Result<bool> {
        self.with_db(|db| {
            let rows_deleted = db.execute(
                "DELETE FROM scan_results WHERE id = ?1 AND (?2 IS NULL OR user_id = ?2)",
                params![report_id, user_id],
            )?;
            Ok(rows_deleted > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::persistence::test_report_store;
    use crate::core::scan::types::{ExecutionMode, ScanStatus};

    fn record(tool: &str, target: &str) -> ScanRecord {
        ScanRecord {
            scan_id: uuid::Uuid::new_v4().to_string(),
            status: ScanStatus::Completed,
            output: "22/tcp open ssh\n".to_string(),
            command: vec!["nmap".to_string(), "-sS".to_string(), target.to_string()],
            requested_command: String::new(),
            mode: ExecutionMode::Streamed,
            tool: tool.to_string(),
            target: target.to_string(),
            start_time: chrono::Local::now().to_rfc3339(),
            end_time: None,
            progress: None,
            report: None,
        }
    }

    #[test]
    fn auto_title_capitalises_tool() {
        assert_eq!(auto_title("nmap", "10.0.0.5"), "Nmap Scan - 10.0.0.5");
        assert_eq!(auto_title("SUBFINDER", "a.io"), "Subfinder Scan - a.io");
        assert_eq!(auto_title("wafw00f", "a.io"), "Wafw00F Scan - a.io");
    }

    #[tokio::test]
    async fn store_then_list_by_owner() {
        let store = test_report_store();
        let first = store
            .store_scan(&record("nmap", "10.0.0.5"), "alice", None)
            .await
            .unwrap();
        let second = store
            .store_scan(&record("subfinder", "a.io"), "alice", Some("Weekly recon"))
            .await
            .unwrap();
        store
            .store_scan(&record("arjun", "b.io"), "bob", None)
            .await
            .unwrap();

        assert_eq!(first.title, "Nmap Scan - 10.0.0.5");
        assert_eq!(second.title, "Weekly recon");

        let alice = store.list_reports(Some("alice")).await.unwrap();
        assert_eq!(alice.len(), 2);
        assert_eq!(alice[0].id, second.stored_id);
        assert_eq!(alice[1].module, "nmap");
        assert_eq!(alice[1].command, "nmap -sS 10.0.0.5");
        assert_eq!(alice[1].status, "completed");

        assert_eq!(store.list_reports(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn delete_is_scoped_to_owner() {
        let store = test_report_store();
        let stored = store
            .store_scan(&record("nmap", "10.0.0.5"), "alice", None)
            .await
            .unwrap();

        assert!(!store.delete_report(&stored.stored_id, Some("bob")).await.unwrap());
        assert!(store.delete_report(&stored.stored_id, Some("alice")).await.unwrap());
        assert!(!store.delete_report(&stored.stored_id, Some("alice")).await.unwrap());
        assert!(store.list_reports(Some("alice")).await.unwrap().is_empty());
    }
}
