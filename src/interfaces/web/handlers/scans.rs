use axum::{
    Json,
    extract::{Path, State},
};
use tracing::warn;

use crate::core::scan::ScanAccepted;
use crate::core::scan::report::ReportLookup;
use crate::core::scan::supervisor::TerminateOutcome;
use crate::core::scan::types::{ExecutionMode, ScanRecord, ScanRequest, ScanStatus};
use crate::interfaces::web::AppState;
use crate::interfaces::web::error::{ApiError, ApiResult};

#[derive(Debug, serde::Serialize)]
pub struct ResultResponse {
    pub scan_id: String,
    pub status: ScanStatus,
    pub output: String,
    pub command: String,
    pub mode: ExecutionMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

impl ResultResponse {
    fn from_record(record: ScanRecord, output: Option<String>) -> Self {
        Self {
            command: record.command_line(),
            output: output.unwrap_or(record.output),
            scan_id: record.scan_id,
            status: record.status,
            mode: record.mode,
            progress: record.progress,
        }
    }
}

pub async fn run_tool(
    State(state): State<AppState>,
    Json(payload): Json<ScanRequest>,
) -> ApiResult<Json<ScanAccepted>> {
    if payload.tool.trim().is_empty() || payload.target.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Both tool and target are required".to_string(),
        ));
    }
    Ok(Json(state.engine.submit(payload).await))
}

pub async fn get_result(
    Path(scan_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<ResultResponse>> {
    let record = state
        .engine
        .get(&scan_id)
        .await
        .ok_or(ApiError::ScanNotFound)?;
    Ok(Json(ResultResponse::from_record(record, None)))
}

/// Serves the tool's result file in place of the streamed output. The scan
/// record itself is left untouched.
pub async fn get_file_result(
    Path(scan_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<ResultResponse>> {
    // Only issued ids reach the filesystem.
    let record = state
        .engine
        .get(&scan_id)
        .await
        .ok_or(ApiError::ScanNotFound)?;

    let path = state.file_output_dir.join(format!("{}.txt", scan_id));
    let contents = match tokio::fs::read(&path).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Could not read {}: {}", path.display(), e);
            }
            return Err(ApiError::OutputFileNotFound);
        }
    };
    Ok(Json(ResultResponse::from_record(record, Some(contents))))
}

pub async fn get_report(
    Path(scan_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<serde_json::Value>> {
    match state.engine.materialize_report(&scan_id).await {
        ReportLookup::Ready(report) => Ok(Json(
            serde_json::json!({ "scan_id": scan_id, "report": report }),
        )),
        ReportLookup::UnknownScan => Err(ApiError::ScanNotFound),
        ReportLookup::NotAvailable => Err(ApiError::ReportNotAvailable),
    }
}

pub async fn cancel_scan(
    Path(scan_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<serde_json::Value>> {
    match state.engine.cancel(&scan_id).await {
        None => Err(ApiError::ScanNotFound),
        Some(TerminateOutcome::NotRunning) => Ok(Json(
            serde_json::json!({ "scan_id": scan_id, "terminated": false }),
        )),
        Some(outcome) => Ok(Json(serde_json::json!({
            "scan_id": scan_id,
            "terminated": true,
            "outcome": outcome
        }))),
    }
}
