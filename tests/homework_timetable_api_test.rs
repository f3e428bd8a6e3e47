mod common;

use axum::http::{Method, StatusCode};
use common::{register, send, test_app};
use serde_json::json;

#[tokio::test]
async fn homework_lifecycle() {
    let app = test_app().await;
    let token = register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/homeworks/create/",
        Some(&token),
        Some(json!({ "title": "Essay", "due_date": "2024-05-01", "subject_name": "english" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    assert_eq!(body["data"]["subject"], "English");
    assert_eq!(body["data"]["is_completed"], false);
    assert_eq!(body["data"]["due_date"], "2024-05-01");
    let essay = body["data"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/homeworks/create/",
        Some(&token),
        Some(json!({ "title": "Worksheet", "due_date": "2024-05-02" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/homeworks/manage/?due_date=2024-05-01",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Homeworks fetched successfully.");
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/homeworks/manage/",
        Some(&token),
        Some(json!({ "id": essay })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_completed"], true);

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/v1/homeworks/manage/?is_completed=false",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["data"][0]["title"], "Worksheet");

    let (status, body) = send(
        &app,
        Method::DELETE,
        "/api/v1/homeworks/manage/",
        Some(&token),
        Some(json!({ "id": essay })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Homework deleted successfully.");
    assert_eq!(body["data"], json!({ "id": essay }));

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/homeworks/manage/",
        Some(&token),
        Some(json!({ "id": essay })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/api/v1/homeworks/manage/", Some(&token), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn homework_id_is_required() {
    let app = test_app().await;
    let token = register(&app, "alice").await;

    for method in [Method::PUT, Method::DELETE] {
        let (status, body) = send(
            &app,
            method,
            "/api/v1/homeworks/manage/",
            Some(&token),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Homework ID is required.");
    }
}

#[tokio::test]
async fn homeworks_are_private() {
    let app = test_app().await;
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/v1/homeworks/create/",
        Some(&alice),
        Some(json!({ "title": "Essay", "due_date": "2024-05-01" })),
    )
    .await;
    let essay = body["data"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/api/v1/homeworks/manage/",
        Some(&bob),
        Some(json!({ "id": essay })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/api/v1/homeworks/manage/", Some(&bob), None).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn timetable_lifecycle() {
    let app = test_app().await;
    let token = register(&app, "alice").await;

    let (status, _) = send(&app, Method::GET, "/api/v1/timetable/manage/", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/timetable/create/",
        Some(&token),
        Some(json!({
            "name": "Term 1",
            "days": [
                { "id": 1, "periods": [
                    { "order": 1, "subject": "math" },
                    { "order": 2, "subject": "computer science" },
                ] },
                { "id": 3, "periods": [{ "order": 1, "subject": "Art" }] },
            ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    assert_eq!(body["data"]["name"], "Term 1");
    assert_eq!(body["data"]["days"][0]["name"], "Monday");
    assert_eq!(body["data"]["days"][0]["periods"][1]["subject"], "Computer Science");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/timetable/manage/",
        Some(&token),
        Some(json!({
            "name": "Term 2",
            "days": [{ "id": 1, "periods": [{ "order": 1, "subject": "physics" }] }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Term 2");
    assert_eq!(body["data"]["days"][0]["periods"][0]["subject"], "Physics");
    assert_eq!(body["data"]["days"][0]["periods"].as_array().unwrap().len(), 2);

    let (status, body) = send(&app, Method::GET, "/api/v1/timetable/manage/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["days"].as_array().unwrap().len(), 2);

    let (status, body) =
        send(&app, Method::DELETE, "/api/v1/timetable/manage/", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = send(&app, Method::GET, "/api/v1/timetable/manage/", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn timetable_rejects_unknown_day() {
    let app = test_app().await;
    let token = register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/timetable/create/",
        Some(&token),
        Some(json!({
            "name": "Term 1",
            "days": [
                { "id": 1, "periods": [{ "order": 1, "subject": "Math" }] },
                { "id": 9, "periods": [] },
            ],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Day with id 9 does not exist");

    let (status, _) = send(&app, Method::GET, "/api/v1/timetable/manage/", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
