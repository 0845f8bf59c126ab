use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// No response reached us (DNS, connection refused, reset mid-body)
    #[error("Transport failed: {0}")]
    TransportFailed(String),

    /// The backend answered with a non-success status
    #[error("HTTP {status}{}", format_body(.body))]
    RequestFailed { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_body(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {}", body)
    }
}

impl AppError {
    /// Classifies a reqwest failure. Decode failures mean a response did arrive.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::InvalidResponse(err.to_string())
        } else {
            AppError::TransportFailed(err.to_string())
        }
    }

    /// Whether the failure came from talking to the recommendation backend
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::TransportFailed(_)
                | AppError::RequestFailed { .. }
                | AppError::InvalidResponse(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::TransportFailed(_)
            | AppError::RequestFailed { .. }
            | AppError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
