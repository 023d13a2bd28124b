use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(sqlx::Error),

    #[error("Storage write failed: {0}")]
    StorageWrite(sqlx::Error),

    #[error("Upstream request failed with status {status}")]
    Upstream { status: u16 },

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) | Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Upstream { .. } | Error::Reqwest(_) | Error::Json(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_) | Error::StorageUnavailable(_) | Error::StorageWrite(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let error_message = match &self {
            Error::InvalidInput(msg) => msg.clone(),
            Error::Validation(err) => err.to_string(),
            Error::Upstream { status } => {
                format!("API request failed with status {}", status)
            }
            Error::Reqwest(err) => format!("External service error: {}", err),
            Error::Json(err) => format!("External service returned invalid JSON: {}", err),
            Error::StorageUnavailable(err) | Error::StorageWrite(err) => err.to_string(),
            Error::Config(msg) => msg.clone(),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::StorageUnavailable(err)
    }
}
