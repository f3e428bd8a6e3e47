mod common;

use axum::http::{Method, StatusCode};
use common::{register, send, test_app};
use serde_json::json;

#[tokio::test]
async fn register_login_and_refresh() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register/",
        None,
        Some(json!({
            "username": "alice",
            "password": "password123",
            "email": "alice@example.com",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], 201);
    assert!(body["data"]["access"].is_string());
    assert!(body["data"]["refresh"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/token/",
        None,
        Some(json!({ "username": "alice", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let refresh = body["data"]["refresh"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/token/refresh/",
        None,
        Some(json!({ "refresh": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["data"]["access"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/api/v1/auth/manage/", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "alice@example.com");
}

#[tokio::test]
async fn register_validation_errors() {
    let app = test_app().await;
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register/",
        None,
        Some(json!({ "username": "alice", "password": "short" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["username"], json!(["Username already exists."]));
    assert!(body["errors"]["password"].is_array());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_of_one_username() {
    let app = test_app().await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            send(
                &app,
                Method::POST,
                "/api/v1/auth/register/",
                None,
                Some(json!({ "username": "dup", "password": "password123" })),
            )
            .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        if status == StatusCode::CREATED {
            created += 1;
        } else {
            assert_eq!(status, StatusCode::BAD_REQUEST, "unexpected response: {body}");
            assert_eq!(body["errors"]["username"], json!(["Username already exists."]));
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test]
async fn malformed_json_uses_the_envelope() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/token/",
        None,
        Some(json!("not an object")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["errors"]["detail"].is_array());
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
    let app = test_app().await;
    register(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/token/",
        None,
        Some(json!({ "username": "alice", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/token/refresh/",
        None,
        Some(json!({ "refresh": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn account_update_and_soft_delete() {
    let app = test_app().await;
    let alice = register(&app, "alice").await;
    register(&app, "bob").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/auth/manage/",
        Some(&alice),
        Some(json!({ "username": "bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["username"], json!(["Username already exists."]));

    // Keeping one's own username is not a conflict.
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/auth/manage/",
        Some(&alice),
        Some(json!({ "username": "alice", "first_name": "Alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["first_name"], "Alice");

    let (status, body) =
        send(&app, Method::DELETE, "/api/v1/auth/manage/", Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = send(&app, Method::GET, "/api/v1/auth/manage/", Some(&alice), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/token/",
        None,
        Some(json!({ "username": "alice", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
