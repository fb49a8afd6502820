use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    InvalidProfile(#[from] crate::zone_model::InvalidProfile),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Upstream activity source error: {0}")]
    Upstream(#[from] crate::strava::SourceError),

    #[error("Publish error: {0}")]
    Publish(#[from] object_store::Error),

    #[error("Queue error: {0}")]
    Queue(#[from] anyhow::Error),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InvalidProfile(e) => {
                let body = Json(json!({
                    "error": e.to_string(),
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            _ => {
                let (status, error_message) = match &self {
                    AppError::Database(e) => {
                        error!("Database error: {e}");
                        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    }
                    AppError::Serialization(e) => {
                        error!("Serialization error: {e}");
                        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    }
                    AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
                    AppError::NotFound => (StatusCode::NOT_FOUND, "Not found"),
                    AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
                    AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
                    AppError::Upstream(e) => {
                        error!("Upstream activity source error: {e}");
                        (StatusCode::BAD_GATEWAY, "Upstream activity source error")
                    }
                    AppError::Publish(e) => {
                        error!("Publish error: {e}");
                        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    }
                    AppError::Queue(e) => {
                        error!("Queue error: {e}");
                        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    }
                    AppError::Internal => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    }
                    AppError::InvalidProfile(_) => unreachable!(),
                };

                let body = Json(json!({
                    "error": error_message,
                }));

                (status, body).into_response()
            }
        }
    }
}
