use axum::{Json, body::Bytes, extract::State};
use rand::Rng;
use tracing::info;

use murmur_types::api::{LoginRequest, LoginResponse};
use murmur_types::token::{DemoClaims, encode_demo_token};

use crate::AppState;
use crate::error::ApiError;

/// POST /api/auth/login — demo login.
///
/// Every call creates a new user row, even for a name seen before, and hands
/// back an unsigned demo token. Not an authentication scheme; see
/// `murmur_types::token`.
pub async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<LoginResponse>, ApiError> {
    // The body is optional; `{}` and an empty body both mean "guest"
    let req: LoginRequest = if body.iter().all(u8::is_ascii_whitespace) {
        LoginRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid login body: {}", e)))?
    };

    let name = req
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(guest_name);

    let user = murmur_db::blocking(state.db.clone(), move |db| db.create_user(&name)).await?;

    let token = encode_demo_token(&DemoClaims {
        id: user.id,
        name: user.name.clone(),
    });

    info!("{} ({}) logged in", user.name, user.id);
    Ok(Json(LoginResponse { token, user }))
}

fn guest_name() -> String {
    format!("guest-{}", rand::rng().random_range(0..10_000))
}
