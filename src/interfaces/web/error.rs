use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Failures surfaced to HTTP clients as `{ "detail": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Scan not found")]
    ScanNotFound,
    #[error("File not found")]
    OutputFileNotFound,
    #[error("Report not available yet")]
    ReportNotAvailable,
    #[error("Report not found or access denied")]
    ReportNotFound,
    #[error("Database not available")]
    PersistenceUnavailable,
    #[error("{0}")]
    Persistence(String),
    #[error("AI chat failed: {0}")]
    Chat(String),
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ScanNotFound
            | ApiError::OutputFileNotFound
            | ApiError::ReportNotAvailable
            | ApiError::ReportNotFound => StatusCode::NOT_FOUND,
            ApiError::PersistenceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Persistence(_) | ApiError::Chat(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(serde_json::json!({ "detail": self.to_string() })),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
