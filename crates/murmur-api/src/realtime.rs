use axum::{
    extract::{Query, State, WebSocketUpgrade, rejection::QueryRejection},
    http::{HeaderMap, header},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::warn;

use murmur_gateway::connection;
use murmur_types::token::{DemoClaims, decode_demo_token};

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct HandshakeQuery {
    pub token: Option<String>,
}

/// GET /ws — realtime gateway. The demo token is checked before the upgrade,
/// so an unauthenticated client never gets a connection.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    query: Result<Query<HandshakeQuery>, QueryRejection>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let user = authenticate_handshake(&headers, query.token.as_deref())?;

    Ok(ws.on_upgrade(move |socket| {
        connection::handle_connection(socket, state.dispatcher.clone(), state.db.clone(), user)
    }))
}

/// Resolve the connecting user from `Authorization: Bearer <token>`, falling
/// back to the `token` query parameter.
pub fn authenticate_handshake(
    headers: &HeaderMap,
    query_token: Option<&str>,
) -> Result<DemoClaims, ApiError> {
    let header_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let token = header_token.or(query_token).ok_or_else(|| {
        warn!("Gateway handshake without token");
        ApiError::Unauthorized
    })?;

    decode_demo_token(token).map_err(|e| {
        warn!("Gateway handshake with bad token: {}", e);
        ApiError::Unauthorized
    })
}
