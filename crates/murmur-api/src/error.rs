use axum::{
    Json,
    extract::multipart::MultipartError,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::multipart::MultipartRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use murmur_types::api::ErrorBody;

/// Failure of a REST request. Rendered as `{"error": "..."}`, including
/// axum's own extractor rejections, which keep their status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Authentication error")]
    Unauthorized,

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    MultipartRejection(#[from] MultipartRejection),

    #[error(transparent)]
    Json(#[from] JsonRejection),

    #[error(transparent)]
    Query(#[from] QueryRejection),

    #[error(transparent)]
    Path(#[from] PathRejection),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Multipart(e) => (e.status(), e.body_text()),
            ApiError::MultipartRejection(e) => (e.status(), e.body_text()),
            ApiError::Json(e) => (e.status(), e.body_text()),
            ApiError::Query(e) => (e.status(), e.body_text()),
            ApiError::Path(e) => (e.status(), e.body_text()),
            ApiError::Internal(e) => {
                error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
