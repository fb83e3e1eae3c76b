use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use super::types::{ExecutionPlan, ScanRecord, ScanRequest, ScanStatus, can_transition};

/// In-memory scan records, keyed by scan id.
///
/// Readers get cloned snapshots. Every record has exactly one [`ScanWriter`],
/// handed to the background unit that executes it; the writer is not `Clone`,
/// so no second task can mutate the output buffer. The only mutation outside
/// the writer is the report cache, which readers fill once a record is
/// terminal.
#[derive(Clone, Default)]
pub struct ScanStore {
    records: Arc<RwLock<HashMap<String, ScanRecord>>>,
}

impl ScanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fresh `running` record and returns its sole writer together
    /// with the plan built for the new id.
    pub async fn create(
        &self,
        request: &ScanRequest,
        plan_for: impl FnOnce(&str) -> ExecutionPlan,
    ) -> (ScanWriter, ExecutionPlan) {
        let scan_id = uuid::Uuid::new_v4().to_string();
        let plan = plan_for(&scan_id);
        let record = ScanRecord {
            scan_id: scan_id.clone(),
            status: ScanStatus::Running,
            output: format!("Starting {} scan...\n", request.tool),
            command: plan.command(),
            requested_command: request.command.clone(),
            mode: plan.mode(),
            tool: request.tool.clone(),
            target: request.target.clone(),
            start_time: chrono::Local::now().to_rfc3339(),
            end_time: None,
            progress: None,
            report: None,
        };
        self.records.write().await.insert(scan_id.clone(), record);
        let writer = ScanWriter {
            scan_id,
            store: self.clone(),
        };
        (writer, plan)
    }

    pub async fn get(&self, scan_id: &str) -> Option<ScanRecord> {
        self.records.read().await.get(scan_id).cloned()
    }

    pub async fn contains(&self, scan_id: &str) -> bool {
        self.records.read().await.contains_key(scan_id)
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Runs `f` against the record under the write lock. Returns `None` when
    /// the id is unknown. `f` must not block.
    pub(super) async fn with_record<T>(
        &self,
        scan_id: &str,
        f: impl FnOnce(&mut ScanRecord) -> T,
    ) -> Option<T> {
        let mut records = self.records.write().await;
        records.get_mut(scan_id).map(f)
    }
}

/// Exclusive mutation handle for one scan record.
pub struct ScanWriter {
    scan_id: String,
    store: ScanStore,
}

impl ScanWriter {
    pub fn scan_id(&self) -> &str {
        &self.scan_id
    }

    pub async fn append(&self, text: &str) {
        self.store
            .with_record(&self.scan_id, |r| r.output.push_str(text))
            .await;
    }

    /// Wholesale replacement, only used when results live in a file.
    pub async fn replace_output(&self, text: String) {
        self.store
            .with_record(&self.scan_id, |r| r.output = text)
            .await;
    }

    pub async fn set_progress(&self, progress: u8) {
        self.store
            .with_record(&self.scan_id, |r| r.progress = Some(progress.min(100)))
            .await;
    }

    /// Appends `line` (if any) and moves the record to `status`. Returns false
    /// and leaves the record alone when the transition is not allowed.
    pub async fn finish(&self, status: ScanStatus, line: Option<&str>) -> bool {
        let applied = self
            .store
            .with_record(&self.scan_id, |r| {
                if !can_transition(r.status, status) {
                    return false;
                }
                if let Some(line) = line {
                    r.output.push_str(line);
                }
                r.status = status;
                r.end_time = Some(chrono::Local::now().to_rfc3339());
                true
            })
            .await
            .unwrap_or(false);
        if !applied {
            warn!(
                "Ignored transition to {} for scan [{}]",
                status.as_str(),
                self.scan_id
            );
        }
        applied
    }

    /// Rebuilds the cached report from the final output.
    pub async fn refresh_report(&self) {
        self.store
            .with_record(&self.scan_id, |r| {
                r.report = Some(super::report::derive_report(&r.output))
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(tool: &str) -> ScanRequest {
        ScanRequest {
            tool: tool.to_string(),
            target: "example.com".to_string(),
            command: format!("{} example.com", tool),
            scan_type: None,
        }
    }

    async fn create(store: &ScanStore, tool: &str) -> ScanWriter {
        let (writer, _) = store
            .create(&request(tool), |_| ExecutionPlan::Streamed {
                argv: vec!["subfinder".to_string(), "-d".to_string()],
                announce: false,
            })
            .await;
        writer
    }

    #[tokio::test]
    async fn create_inserts_running_record_with_banner() {
        let store = ScanStore::new();
        let writer = create(&store, "subfinder").await;
        let rec = store.get(writer.scan_id()).await.unwrap();
        assert_eq!(rec.status, ScanStatus::Running);
        assert_eq!(rec.output, "Starting subfinder scan...\n");
        assert_eq!(rec.command, vec!["subfinder", "-d"]);
        assert_eq!(rec.requested_command, "subfinder example.com");
        assert!(rec.report.is_none());
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let store = ScanStore::new();
        let a = create(&store, "a").await;
        let b = create(&store, "b").await;
        assert_ne!(a.scan_id(), b.scan_id());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn finish_is_one_way() {
        let store = ScanStore::new();
        let writer = create(&store, "nmap").await;
        assert!(writer.finish(ScanStatus::Completed, Some("done\n")).await);
        assert!(!writer.finish(ScanStatus::Failed, Some("nope\n")).await);

        let rec = store.get(writer.scan_id()).await.unwrap();
        assert_eq!(rec.status, ScanStatus::Completed);
        assert!(rec.output.ends_with("done\n"));
        assert!(!rec.output.contains("nope"));
        assert!(rec.end_time.is_some());
    }

    #[tokio::test]
    async fn progress_is_clamped() {
        let store = ScanStore::new();
        let writer = create(&store, "dirsearch").await;
        writer.set_progress(250).await;
        assert_eq!(store.get(writer.scan_id()).await.unwrap().progress, Some(100));
    }
}
