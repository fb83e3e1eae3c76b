pub mod chat;
pub mod notes;
pub mod reports;
pub mod scans;

use axum::Json;

pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "ReconLab API is running" }))
}
