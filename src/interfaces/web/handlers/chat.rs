use axum::{Json, extract::State};

use crate::core::chat::{ChatReply, ChatRequest};
use crate::interfaces::web::AppState;
use crate::interfaces::web::error::{ApiError, ApiResult};

pub async fn ai_chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> ApiResult<Json<ChatReply>> {
    state
        .chat
        .chat(&payload)
        .await
        .map(Json)
        .map_err(|e| ApiError::Chat(e.to_string()))
}
