//! Catalog views, health and crawler routes.

use axum::http::{Method, StatusCode};
use serde_json::json;

use vitrine_integration_tests::{FormBody, TestApp};

async fn seed_product(app: &TestApp, name: &str, category: &str) {
    let response = app
        .multipart(
            Method::POST,
            "/api/products",
            FormBody::new()
                .text("name", name)
                .text("description", "-")
                .text("category", category),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
}

#[tokio::test]
async fn test_shoppers_only_see_filled_categories() {
    let app = TestApp::new();
    seed_product(&app, "Lamp", "Home").await;
    seed_product(&app, "Rug", "Home").await;

    let public = app.get("/api/catalog").await.json();
    assert_eq!(
        public["categories"],
        json!([{ "name": "Home", "productCount": 2 }])
    );

    let admin = app.get_as_admin("/api/catalog").await.json();
    assert_eq!(admin["categories"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_category_view_lists_its_products() {
    let app = TestApp::new();
    seed_product(&app, "Lamp", "Home").await;
    seed_product(&app, "Phone", "Electronics").await;

    let view = app.get("/api/catalog?category=Home").await.json();

    assert_eq!(view["category"], "Home");
    let products = view["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Lamp");
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let live = app.get("/health").await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, "ok");

    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_robots_and_sitemap_use_public_origin() {
    let app = TestApp::new();

    let robots = app.get("/robots.txt").await;
    assert_eq!(robots.status, StatusCode::OK);
    assert!(robots.body.contains("Disallow: /api/"));
    assert!(
        robots
            .body
            .contains("Sitemap: https://shop.example.test/sitemap.xml")
    );

    let sitemap = app.get("/sitemap.xml").await;
    assert!(sitemap.body.contains("<loc>https://shop.example.test/</loc>"));
    assert!(sitemap.body.contains("<changefreq>daily</changefreq>"));
}
