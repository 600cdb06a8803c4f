//! Raw media endpoints and admin authentication.

use axum::http::{Method, StatusCode};
use serde_json::json;

use vitrine_integration_tests::{FormBody, TestApp};

#[tokio::test]
async fn test_writes_require_admin_token() {
    let app = TestApp::new();

    let anonymous = app
        .send(
            FormBody::new()
                .text("name", "Mug")
                .text("description", "Stoneware")
                .into_request(Method::POST, "/api/products", None),
        )
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let wrong = app
        .send(
            FormBody::new()
                .png("file", "a.png")
                .into_request(Method::POST, "/api/upload", Some("guess")),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    assert!(app.assets.calls().is_empty());
    assert_eq!(app.records.writes(), 0);
}

#[tokio::test]
async fn test_upload_then_delete_by_url() {
    let app = TestApp::new();

    let stored = app
        .multipart(
            Method::POST,
            "/api/upload",
            FormBody::new().png("file", "hero.png").text("folder", "banners"),
        )
        .await
        .json();
    assert_eq!(stored["publicId"], "banners/hero-1");

    let deleted = app
        .json(Method::DELETE, "/api/upload", &json!({ "url": stored["url"] }))
        .await
        .json();
    assert_eq!(deleted["result"], "ok");

    let again = app
        .json(
            Method::DELETE,
            "/api/upload",
            &json!({ "publicId": "banners/hero-1" }),
        )
        .await
        .json();
    assert_eq!(again["result"], "not found");
}

#[tokio::test]
async fn test_upload_rejects_missing_or_non_image_file() {
    let app = TestApp::new();

    let missing = app
        .multipart(Method::POST, "/api/upload", FormBody::new().text("folder", "x"))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.json()["error"], "No file uploaded");

    let text = app
        .multipart(
            Method::POST,
            "/api/upload",
            FormBody::new().file("file", "notes.txt", "text/plain", b"hello"),
        )
        .await;
    assert_eq!(text.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_without_resolvable_target_is_bad_request() {
    let app = TestApp::new();

    for body in [
        json!({}),
        json!({ "url": "  " }),
        json!({ "url": "https://legacy.test/images/logo.png" }),
    ] {
        let response = app.json(Method::DELETE, "/api/upload", &body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{body}");
    }
    assert!(app.assets.calls().is_empty());
}
