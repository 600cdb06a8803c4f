//! Product CRUD over HTTP, including the image lifecycle.

use axum::http::{Method, StatusCode};
use serde_json::Value;

use vitrine_integration_tests::{FormBody, TestApp};
use vitrine_server::media::FakeAssetStore;

async fn create(app: &TestApp, form: FormBody) -> Value {
    let response = app.multipart(Method::POST, "/api/products", form).await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.json()
}

#[tokio::test]
async fn test_create_then_list_in_insertion_order() {
    let app = TestApp::new();

    let first = create(
        &app,
        FormBody::new()
            .text("name", "Mug")
            .text("description", "Stoneware")
            .png("image", "mug.png"),
    )
    .await;
    create(
        &app,
        FormBody::new()
            .text("name", "Lamp")
            .text("description", "Brass")
            .text("categoryContext", "Home"),
    )
    .await;

    assert_eq!(first["category"], "General");
    assert_eq!(first["imageUrl"].as_str().map(|u| u.contains("/upload/")), Some(true));
    assert!(app.assets.is_live("shop-products/mug-1"));

    let list = app.get("/api/products").await.json();
    let names: Vec<_> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Mug", "Lamp"]);
    assert_eq!(list[1]["category"], "Home");
    assert!(list[1].get("imageUrl").is_none());
}

#[tokio::test]
async fn test_create_without_required_fields_is_rejected_before_upload() {
    let app = TestApp::new();

    let response = app
        .multipart(
            Method::POST,
            "/api/products",
            FormBody::new().text("name", "  ").png("image", "mug.png"),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["error"].as_str().unwrap().contains("name"));
    assert!(app.assets.calls().is_empty());
    assert_eq!(app.records.writes(), 0);
}

#[tokio::test]
async fn test_replacing_image_deletes_previous_after_save() {
    let app = TestApp::new();
    let product = create(
        &app,
        FormBody::new()
            .text("name", "Mug")
            .text("description", "Stoneware")
            .png("image", "mug.png"),
    )
    .await;
    let uri = format!("/api/products/{}", product["id"].as_str().unwrap());

    let response = app
        .multipart(
            Method::PUT,
            &uri,
            FormBody::new()
                .text("name", "Mug")
                .text("description", "Glazed")
                .png("image", "mug-v2.png"),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    let updated = response.json();
    assert_eq!(updated["description"], "Glazed");
    assert_eq!(app.assets.destroyed(), ["shop-products/mug-1"]);
    assert!(app.assets.is_live("shop-products/mug-v2-2"));
    assert!(updated["imageUrl"].as_str().unwrap().contains("mug-v2-2"));
}

#[tokio::test]
async fn test_update_without_image_fields_keeps_image() {
    let app = TestApp::new();
    let product = create(
        &app,
        FormBody::new()
            .text("name", "Mug")
            .text("description", "Stoneware")
            .png("image", "mug.png"),
    )
    .await;
    let uri = format!("/api/products/{}", product["id"].as_str().unwrap());

    let updated = app
        .multipart(
            Method::PUT,
            &uri,
            FormBody::new().text("name", "Big Mug").text("description", "Stoneware"),
        )
        .await
        .json();

    assert_eq!(updated["name"], "Big Mug");
    assert_eq!(updated["imageUrl"], product["imageUrl"]);
    assert!(app.assets.destroyed().is_empty());
}

#[tokio::test]
async fn test_clearing_image_deletes_it() {
    let app = TestApp::new();
    let product = create(
        &app,
        FormBody::new()
            .text("name", "Mug")
            .text("description", "Stoneware")
            .png("image", "mug.png"),
    )
    .await;
    let uri = format!("/api/products/{}", product["id"].as_str().unwrap());

    let updated = app
        .multipart(
            Method::PUT,
            &uri,
            FormBody::new()
                .text("name", "Mug")
                .text("description", "Stoneware")
                .text("clearImage", "true"),
        )
        .await
        .json();

    assert!(updated.get("imageUrl").is_none());
    assert!(!app.assets.is_live("shop-products/mug-1"));
}

#[tokio::test]
async fn test_failed_upload_leaves_product_untouched() {
    let app = TestApp::with_assets(FakeAssetStore::new().failing_upload("broken.png"));
    let product = create(
        &app,
        FormBody::new()
            .text("name", "Mug")
            .text("description", "Stoneware")
            .png("image", "mug.png"),
    )
    .await;
    let uri = format!("/api/products/{}", product["id"].as_str().unwrap());

    let response = app
        .multipart(
            Method::PUT,
            &uri,
            FormBody::new()
                .text("name", "Renamed")
                .text("description", "Stoneware")
                .png("image", "broken.png"),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    let list = app.get("/api/products").await.json();
    assert_eq!(list[0]["name"], "Mug");
    assert_eq!(list[0]["imageUrl"], product["imageUrl"]);
    assert!(app.assets.destroyed().is_empty());
}

#[tokio::test]
async fn test_category_cannot_change_after_creation() {
    let app = TestApp::new();
    let product = create(
        &app,
        FormBody::new()
            .text("name", "Mug")
            .text("description", "Stoneware")
            .text("category", "Home"),
    )
    .await;
    let uri = format!("/api/products/{}", product["id"].as_str().unwrap());

    let response = app
        .multipart(
            Method::PUT,
            &uri,
            FormBody::new()
                .text("name", "Mug")
                .text("description", "Stoneware")
                .text("category", "Art"),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_removes_product_and_image() {
    let app = TestApp::new();
    let product = create(
        &app,
        FormBody::new()
            .text("name", "Mug")
            .text("description", "Stoneware")
            .png("image", "mug.png"),
    )
    .await;
    let uri = format!("/api/products/{}", product["id"].as_str().unwrap());

    assert_eq!(app.admin(Method::DELETE, &uri).await.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get("/api/products").await.json(), serde_json::json!([]));
    assert_eq!(app.assets.destroyed(), ["shop-products/mug-1"]);

    assert_eq!(app.admin(Method::DELETE, &uri).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_product_update_is_not_found() {
    let app = TestApp::new();

    let response = app
        .multipart(
            Method::PUT,
            "/api/products/missing",
            FormBody::new().text("name", "Mug").text("description", "Stoneware"),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
