use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use upstream::{FetchError, PolicyError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    MalformedPayload(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upstream client error: {0}")]
    Upstream(#[from] FetchError),

    #[error("Retry policy error: {0}")]
    Policy(#[from] PolicyError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
            AppError::Config { .. }
            | AppError::Io { .. }
            | AppError::Upstream { .. }
            | AppError::Policy { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
