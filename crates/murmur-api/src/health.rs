use axum::Json;

use murmur_types::api::HealthResponse;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        now: chrono::Utc::now(),
    })
}
