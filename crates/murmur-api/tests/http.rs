mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use murmur_db::queries::NewMessage;
use murmur_types::api::LoginResponse;
use murmur_types::token::decode_demo_token;

use common::{TestServer, body_bytes, body_json, get, json_request};

const BOUNDARY: &str = "murmur-test-boundary";

fn multipart_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let disposition = match filename {
            Some(f) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                name, f
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name),
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/media/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let server = TestServer::new();
    let response = server.app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["now"].as_str().unwrap().parse::<chrono::DateTime<chrono::Utc>>().is_ok());
}

#[tokio::test]
async fn login_twice_with_same_name_creates_two_users() {
    let server = TestServer::new();

    let mut users = Vec::new();
    for _ in 0..2 {
        let response = server
            .app
            .clone()
            .oneshot(json_request("POST", "/api/auth/login", json!({ "name": "Alice" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let login: LoginResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();

        let claims = decode_demo_token(&login.token).unwrap();
        assert_eq!(claims.id, login.user.id);
        assert_eq!(claims.name, "Alice");
        users.push(login.user);
    }

    assert_eq!(users[0].name, users[1].name);
    assert_ne!(users[0].id, users[1].id);
}

#[tokio::test]
async fn login_without_name_gets_guest() {
    let server = TestServer::new();

    let empty = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .body(Body::empty())
        .unwrap();
    for request in [empty, json_request("POST", "/api/auth/login", json!({ "name": "  " }))] {
        let response = server.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["user"]["name"].as_str().unwrap().starts_with("guest-"));
    }
}

#[tokio::test]
async fn login_with_garbage_body_is_rejected() {
    let server = TestServer::new();
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .body(Body::from("{name"))
        .unwrap();
    let response = server.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn channels_created_and_listed_in_order() {
    let server = TestServer::new();

    for name in ["general", "random"] {
        let response = server
            .app
            .clone()
            .oneshot(json_request("POST", "/api/channels", json!({ "name": name })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["name"], name);
        assert!(body["id"].as_str().unwrap().parse::<Uuid>().is_ok());
        assert!(body["createdAt"].is_string());
    }

    let response = server.app.clone().oneshot(get("/api/channels")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["general", "random"]);
}

#[tokio::test]
async fn channel_without_name_is_rejected() {
    let server = TestServer::new();
    let response = server
        .app
        .clone()
        .oneshot(json_request("POST", "/api/channels", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Channel name is required");
}

#[tokio::test]
async fn messages_nested_by_thread() {
    let server = TestServer::new();
    let db = &server.state.db;
    let alice = db.create_user("Alice").unwrap();
    let bob = db.create_user("Bob").unwrap();
    let channel = db.create_channel("general").unwrap();

    let post = |sender: Uuid, body: &str, parent: Option<Uuid>| {
        db.insert_message(&NewMessage {
            channel_id: channel.id,
            sender_id: sender,
            body: Some(body.into()),
            parent_id: parent,
            ..Default::default()
        })
        .unwrap()
    };
    let root = post(alice.id, "root", None);
    post(bob.id, "second root", None);
    post(bob.id, "first reply", Some(root.id));
    post(alice.id, "second reply", Some(root.id));

    let response = server
        .app
        .clone()
        .oneshot(get(&format!("/api/channels/{}/messages", channel.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let threads = body.as_array().unwrap();

    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0]["body"], "root");
    assert_eq!(threads[0]["parentId"], serde_json::Value::Null);
    assert_eq!(threads[0]["sender"]["name"], "Alice");
    assert_eq!(threads[1]["body"], "second root");
    assert_eq!(threads[1]["replies"], json!([]));

    let replies = threads[0]["replies"].as_array().unwrap();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["body"], "first reply");
    assert_eq!(replies[0]["sender"]["name"], "Bob");
    assert_eq!(replies[1]["body"], "second reply");
    assert_eq!(replies[1]["parentId"], root.id.to_string());
}

#[tokio::test]
async fn messages_of_bad_channel_id_is_client_error() {
    let server = TestServer::new();
    let response = server
        .app
        .clone()
        .oneshot(get("/api/channels/not-a-uuid/messages"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].as_str().unwrap().contains("channel_id"));
}

#[tokio::test]
async fn malformed_channel_body_gets_json_error() {
    let server = TestServer::new();

    let bad_json = Request::builder()
        .method("POST")
        .uri("/api/channels")
        .header("content-type", "application/json")
        .body(Body::from("{bad"))
        .unwrap();
    let response = server.app.clone().oneshot(bad_json).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());

    let no_content_type = Request::builder()
        .method("POST")
        .uri("/api/channels")
        .body(Body::from("{bad"))
        .unwrap();
    let response = server.app.clone().oneshot(no_content_type).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let server = TestServer::new();
    let request = multipart_request(&[("caption", None, b"no file here".as_slice())]);
    let response = server.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No file uploaded");
}

#[tokio::test]
async fn upload_stores_file_under_new_name_and_serves_it() {
    let server = TestServer::new();
    let contents: &[u8] = b"\x89PNG fake image bytes";
    let request = multipart_request(&[
        ("caption", None, b"holiday".as_slice()),
        ("file", Some("beach.png"), contents),
    ]);
    let response = server.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let url = body_json(response).await["url"].as_str().unwrap().to_string();
    let stored = url.strip_prefix("/uploads/").expect("url under /uploads/");
    assert!(stored.ends_with(".png"));
    assert_ne!(stored, "beach.png");
    assert!(stored.trim_end_matches(".png").parse::<Uuid>().is_ok());

    let on_disk = std::fs::read(server.state.upload_dir.join(stored)).unwrap();
    assert_eq!(on_disk, contents);

    let response = server.app.clone().oneshot(get(&url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, contents);
}

#[tokio::test]
async fn upload_with_two_files_is_rejected() {
    let server = TestServer::new();
    let request = multipart_request(&[
        ("file", Some("one.txt"), b"first".as_slice()),
        ("file", Some("two.txt"), b"second".as_slice()),
    ]);
    let response = server.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Only one file may be uploaded");
    let stored = std::fs::read_dir(&server.state.upload_dir).unwrap().count();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn upload_that_is_not_multipart_gets_json_error() {
    let server = TestServer::new();
    let response = server
        .app
        .clone()
        .oneshot(json_request("POST", "/api/media/upload", json!({ "file": "x" })))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn two_uploads_of_same_file_get_different_urls() {
    let server = TestServer::new();
    let mut urls = Vec::new();
    for _ in 0..2 {
        let request = multipart_request(&[("file", Some("notes.txt"), b"same".as_slice())]);
        let response = server.app.clone().oneshot(request).await.unwrap();
        urls.push(body_json(response).await["url"].as_str().unwrap().to_string());
    }
    assert_ne!(urls[0], urls[1]);
}
