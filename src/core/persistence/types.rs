/// A persisted scan result as listed to clients.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredReport {
    pub id: String,
    pub scan_id: String,
    pub title: String,
    pub content: String,
    pub module: String,
    pub target: String,
    pub date: String,
    pub status: String,
    pub command: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredScan {
    pub stored_id: String,
    pub title: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct NoteRecord {
    pub id: String,
    pub title: Option<String>,
    pub content: String,
    pub created_at: String,
}
