use serde::{Deserialize, Serialize};

use crate::models::User;

// -- Auth --

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

// -- Channels --

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateChannelRequest {
    #[serde(default)]
    pub name: String,
}

// -- Media --

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

// -- Misc --

/// Body returned with every non-2xx REST response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub now: chrono::DateTime<chrono::Utc>,
}
