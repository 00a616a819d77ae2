//! Demo session token.
//!
//! The token is `base64(JSON {id, name})` with no signature and no expiry.
//! Anyone can forge one for any user id. It exists so that clients have
//! something to pass during the realtime handshake and must be replaced by a
//! signed credential before this server faces untrusted users.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identity carried inside a demo token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoClaims {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is empty")]
    Empty,
    #[error("token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("token payload is not valid claims JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn encode_demo_token(claims: &DemoClaims) -> String {
    // Serializing a struct of a Uuid and a String cannot fail.
    let json = serde_json::to_vec(claims).unwrap_or_default();
    B64.encode(json)
}

pub fn decode_demo_token(token: &str) -> Result<DemoClaims, TokenError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TokenError::Empty);
    }
    let bytes = B64.decode(token)?;
    Ok(serde_json::from_slice(&bytes)?)
}
