use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use murmur_types::api::CreateChannelRequest;

use crate::AppState;
use crate::error::ApiError;

/// GET /api/channels — oldest first.
pub async fn list_channels(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let channels = murmur_db::blocking(state.db.clone(), |db| db.list_channels()).await?;
    Ok(Json(channels))
}

pub async fn create_channel(
    State(state): State<AppState>,
    payload: Result<Json<CreateChannelRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Channel name is required".into()));
    }

    let channel = murmur_db::blocking(state.db.clone(), move |db| db.create_channel(&name)).await?;
    info!("Created channel {} ({})", channel.name, channel.id);

    Ok((StatusCode::CREATED, Json(channel)))
}
