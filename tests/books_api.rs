//! Book endpoints driven through the router

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use common::{app, app_with, send, DownStore};

fn timestamp(value: &Value) -> DateTime<Utc> {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_book_lifecycle() {
    let (app, _) = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": "1984", "author": "Orwell" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["book"]["title"], "1984");
    assert_eq!(body["book"]["created_at"], body["book"]["updated_at"]);
    let id = body["book"]["id"].as_i64().unwrap();
    let created_at = timestamp(&body["book"]["created_at"]);

    let (status, body) = send(&app, Method::GET, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "1984");
    assert_eq!(body["data"]["author"], "Orwell");

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/books/{}", id),
        Some(json!({ "title": "Animal Farm", "author": "Orwell" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Animal Farm");
    assert_eq!(timestamp(&body["data"]["created_at"]), created_at);
    assert!(timestamp(&body["data"]["updated_at"]) > created_at);

    let (status, body) = send(&app, Method::DELETE, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book deleted successfully");

    let (status, body) = send(&app, Method::GET, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("bookid: {} not found", id));
}

#[tokio::test]
async fn test_create_stores_trimmed_values() {
    let (app, store) = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": "  Dune  ", "author": "\tFrank Herbert\n" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["book"]["title"], "Dune");
    assert_eq!(body["book"]["author"], "Frank Herbert");
    assert_eq!(store.book_count(), 1);
}

#[tokio::test]
async fn test_length_limit_applies_before_escaping() {
    let (app, store) = app();
    let title = format!("{}&", "a".repeat(149));

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": title, "author": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["book"]["title"], format!("{}&amp;", "a".repeat(149)));

    let (status, _) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": format!("{}&", "a".repeat(150)), "author": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.book_count(), 1);
}

#[tokio::test]
async fn test_list_returns_all_books_in_order() {
    let (app, _) = app();
    for title in ["A", "B", "C"] {
        send(&app, Method::POST, "/books", Some(json!({ "title": title, "author": "X" }))).await;
    }

    let (status, body) = send(&app, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_create_validation_errors() {
    let (app, store) = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": "", "author": "a".repeat(151) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Validation errors, Please check the error message below"
    );
    assert_eq!(
        body["errors"],
        json!([
            { "field": "title", "message": "Title is required" },
            { "field": "author", "message": "Author must not exceed 150 characters long" }
        ])
    );
    assert_eq!(store.book_count(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, _) = app();
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/books")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{ not json"))
        .unwrap();

    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_id_is_bad_request() {
    let (app, _) = app();

    for uri in ["/books/abc", "/books/0", "/books/-1"] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["errors"][0]["field"], "bookid");
        assert_eq!(body["errors"][0]["message"], "bookid must be positive integer");
    }

    let (status, _) = send(&app, Method::DELETE, "/books/x1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_ids_are_not_found() {
    let (app, _) = app();

    let (status, body) = send(&app, Method::GET, "/books/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "bookid: 404 not found");

    let (status, _) = send(&app, Method::DELETE, "/books/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/books/404",
        Some(json!({ "title": "Ghost", "author": "Nobody" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "bookid: 404 not found");
}

#[tokio::test]
async fn test_delete_twice_is_not_found() {
    let (app, _) = app();
    let (_, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": "Emma", "author": "Austen" })),
    )
    .await;
    let uri = format!("/books/{}", body["book"]["id"]);

    let (first, _) = send(&app, Method::DELETE, &uri, None).await;
    let (second, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_reports_body_and_id_errors() {
    let (app, _) = app();

    let (status, body) = send(&app, Method::PUT, "/books/zero", Some(json!({ "author": "A" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "bookid"]);
}

#[tokio::test]
async fn test_store_failure_is_generic_500() {
    let app = app_with(Arc::new(DownStore));

    let (status, body) = send(&app, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Server could not find the collection");
    assert!(!body.to_string().contains("pool timed out"));

    let (status, _) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": "1984", "author": "Orwell" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // Validation still short-circuits before the store
    let (status, _) = send(&app, Method::GET, "/books/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_readiness() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");

    let down = app_with(Arc::new(DownStore));
    let (status, _) = send(&down, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/books/{bookid}"].is_object());
}
