use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

/// GET /api/channels/{channel_id}/messages — top-level messages with their
/// replies and senders attached, oldest first. Unknown channels are simply
/// empty.
pub async fn list_messages(
    State(state): State<AppState>,
    channel_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(channel_id) = channel_id?;
    let threads = murmur_db::blocking(state.db.clone(), move |db| db.list_threads(channel_id)).await?;
    Ok(Json(threads))
}
