#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use studydesk::{db::Db, router, services::auth::TokenTtl, AppState};
use tower::ServiceExt;

pub async fn create_test_db() -> Db {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path =
        std::env::temp_dir().join(format!("studydesk_test_{}_{}.db", std::process::id(), id));
    // Clean up leftover files from previous runs
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
    let url = format!("sqlite://{}", path.display());
    Db::new(url).await.expect("failed to create test database")
}

pub fn app(db: Db) -> Router {
    router(AppState::new(db, TokenTtl::default()))
}

pub async fn test_app() -> Router {
    app(create_test_db().await)
}

/// Send one request through the router and decode the JSON envelope.
/// Bodiless responses decode to `Value::Null`.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let resp = app
        .clone()
        .oneshot(req.body(body).expect("request build should succeed"))
        .await
        .expect("router should respond");

    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be JSON")
    };
    (status, json)
}

/// Register `username` and return its access token.
pub async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/auth/register/",
        None,
        Some(serde_json::json!({ "username": username, "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["data"]["access"]
        .as_str()
        .expect("access token in response")
        .to_string()
}
