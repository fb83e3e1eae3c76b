use axum::{Json, extract::State};
use tracing::error;

use crate::interfaces::web::AppState;
use crate::interfaces::web::error::{ApiError, ApiResult};

#[derive(serde::Deserialize)]
pub struct NoteRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
}

pub async fn save_note(
    State(state): State<AppState>,
    Json(payload): Json<NoteRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    // Without a database the note is acknowledged but not kept.
    let id = match state.reports.as_ref() {
        Some(reports) => reports
            .save_note(payload.title.as_deref(), &payload.content)
            .await
            .map_err(|e| {
                error!("Error saving note: {}", e);
                ApiError::Persistence("Failed to save note".to_string())
            })?,
        None => uuid::Uuid::new_v4().to_string(),
    };
    Ok(Json(serde_json::json!({
        "message": "Note saved successfully",
        "id": id
    })))
}

pub async fn list_notes(State(state): State<AppState>) -> Json<serde_json::Value> {
    let notes = match state.reports.as_ref() {
        Some(reports) => reports.list_notes().await.unwrap_or_else(|e| {
            error!("Error fetching notes: {}", e);
            Vec::new()
        }),
        None => Vec::new(),
    };
    Json(serde_json::json!({ "notes": notes }))
}
