#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use uuid::Uuid;

use murmur_api::{AppState, AppStateInner, router};
use murmur_db::Database;
use murmur_gateway::dispatcher::Dispatcher;

pub struct TestServer {
    pub state: AppState,
    pub app: Router,
}

impl TestServer {
    pub fn new() -> Self {
        let upload_dir = temp_upload_dir();
        let state: AppState = Arc::new(AppStateInner {
            db: Arc::new(Database::open_in_memory().expect("in-memory database")),
            dispatcher: Dispatcher::new(),
            upload_dir,
        });
        let app = router(state.clone());
        Self { state, app }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.state.upload_dir);
    }
}

fn temp_upload_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("murmur-uploads-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp upload dir");
    dir
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
