//! Integration tests for Vitrine.
//!
//! The full router runs in-process against [`MemoryRecordStore`] and
//! [`FakeAssetStore`], so no database or media host is needed:
//!
//! ```bash
//! cargo test -p vitrine-integration-tests
//! ```
//!
//! # Test Files
//!
//! - `products` - Product CRUD and image lifecycle over HTTP
//! - `settings` - Appearance, social, slides and categories
//! - `catalog` - Public and admin catalog views, crawler routes
//! - `upload` - Raw media endpoints and auth

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use vitrine_server::db::MemoryRecordStore;
use vitrine_server::media::FakeAssetStore;
use vitrine_server::routes;
use vitrine_server::state::{AppState, ServiceConfig};

/// Token accepted by the test app's admin routes.
pub const ADMIN_TOKEN: &str = "integration-admin-token";

/// Public origin of the test app.
pub const BASE_URL: &str = "https://shop.example.test";

const BOUNDARY: &str = "vitrine-test-boundary";

/// The router plus handles on its stores.
pub struct TestApp {
    router: Router,
    pub records: Arc<MemoryRecordStore>,
    pub assets: Arc<FakeAssetStore>,
}

impl TestApp {
    /// App with empty stores.
    #[must_use]
    pub fn new() -> Self {
        Self::with_assets(FakeAssetStore::new())
    }

    /// App with a preconfigured asset store.
    #[must_use]
    pub fn with_assets(assets: FakeAssetStore) -> Self {
        let records = Arc::new(MemoryRecordStore::new());
        let assets = Arc::new(assets);
        let config = ServiceConfig::new(
            Url::parse(BASE_URL).unwrap(),
            SecretString::from(ADMIN_TOKEN),
        );
        let state = AppState::new(config, records.clone(), assets.clone());

        Self {
            router: routes::app(state),
            records,
            assets,
        }
    }

    /// Send one request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// Public GET.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// GET with the admin token.
    pub async fn get_as_admin(&self, uri: &str) -> TestResponse {
        self.send(
            Request::get(uri)
                .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Admin request with a JSON body.
    pub async fn json(&self, method: Method, uri: &str, body: &Value) -> TestResponse {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Admin request without a body.
    pub async fn admin(&self, method: Method, uri: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Admin multipart request.
    pub async fn multipart(&self, method: Method, uri: &str, form: FormBody) -> TestResponse {
        self.send(form.into_request(method, uri, Some(ADMIN_TOKEN)))
            .await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: String,
}

impl TestResponse {
    /// Body parsed as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("body is not JSON ({e}): {}", self.body))
    }
}

/// Multipart body builder.
#[derive(Debug, Default)]
pub struct FormBody {
    body: Vec<u8>,
}

impl FormBody {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    #[must_use]
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    /// Add a PNG file field.
    #[must_use]
    pub fn png(self, name: &str, filename: &str) -> Self {
        self.file(name, filename, "image/png", b"\x89PNG\r\n\x1a\nfake")
    }

    /// Add a file field.
    #[must_use]
    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Finish the body and wrap it in a request.
    #[must_use]
    pub fn into_request(mut self, method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(self.body)).unwrap()
    }
}
