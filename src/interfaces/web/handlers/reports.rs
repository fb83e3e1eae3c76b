use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::error;

use crate::interfaces::web::AppState;
use crate::interfaces::web::error::{ApiError, ApiResult};

#[derive(serde::Deserialize)]
pub struct StoreResultRequest {
    pub scan_id: String,
    pub user_id: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct OwnerQuery {
    pub user_id: Option<String>,
}

pub async fn store_result(
    State(state): State<AppState>,
    Json(payload): Json<StoreResultRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let reports = state
        .reports
        .as_ref()
        .ok_or(ApiError::PersistenceUnavailable)?;
    let record = state
        .engine
        .get(&payload.scan_id)
        .await
        .ok_or(ApiError::ScanNotFound)?;

    match reports
        .store_scan(&record, &payload.user_id, payload.title.as_deref())
        .await
    {
        Ok(stored) => Ok(Json(serde_json::json!({
            "message": "Scan result stored successfully",
            "stored_id": stored.stored_id,
            "title": stored.title
        }))),
        Err(e) => {
            error!("Error storing scan result: {}", e);
            Err(ApiError::Persistence(
                "Failed to store scan result".to_string(),
            ))
        }
    }
}

pub async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Json<serde_json::Value> {
    let Some(reports) = state.reports.as_ref() else {
        return Json(serde_json::json!({ "reports": [] }));
    };
    let owner = query.user_id.as_deref().filter(|u| !u.is_empty());
    match reports.list_reports(owner).await {
        Ok(list) => Json(serde_json::json!({ "reports": list })),
        Err(e) => {
            error!("Error fetching reports: {}", e);
            Json(serde_json::json!({ "reports": [] }))
        }
    }
}

pub async fn delete_report(
    Path(report_id): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let reports = state
        .reports
        .as_ref()
        .ok_or(ApiError::PersistenceUnavailable)?;
    let owner = query.user_id.as_deref().filter(|u| !u.is_empty());
    match reports.delete_report(&report_id, owner).await {
        Ok(true) => Ok(Json(
            serde_json::json!({ "message": "Report deleted successfully" }),
        )),
        Ok(false) => Err(ApiError::ReportNotFound),
        Err(e) => {
            error!("Error deleting report: {}", e);
            Err(ApiError::Persistence("Failed to delete report".to_string()))
        }
    }
}
