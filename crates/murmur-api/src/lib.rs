pub mod auth;
pub mod channels;
pub mod error;
pub mod health;
pub mod media;
pub mod messages;
pub mod realtime;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use murmur_db::Database;
use murmur_gateway::dispatcher::Dispatcher;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub dispatcher: Dispatcher,
    /// Where uploads are written and served from under `/uploads/`
    pub upload_dir: PathBuf,
}

/// The full HTTP surface: REST API, realtime gateway and uploaded files.
pub fn router(state: AppState) -> Router {
    let upload_dir = state.upload_dir.clone();

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route(
            "/api/channels",
            get(channels::list_channels).post(channels::create_channel),
        )
        .route("/api/channels/{channel_id}/messages", get(messages::list_messages))
        .route(
            "/api/media/upload",
            post(media::upload).layer(DefaultBodyLimit::max(media::MAX_FILE_SIZE)),
        )
        .route("/health", get(health::health))
        .route("/ws", get(realtime::ws_upgrade))
        .with_state(state)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
