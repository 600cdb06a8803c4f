//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                       - Liveness
//! GET    /health/ready                 - Record store reachable
//! GET    /robots.txt                   - Crawler rules
//! GET    /sitemap.xml                  - Sitemap
//!
//! # Public reads
//! GET    /api/products                 - All products, insertion order
//! GET    /api/settings                 - Settings with defaults
//! GET    /api/catalog?category=        - Category overview or one category
//!
//! # Admin (bearer token)
//! POST   /api/products                 - Create product (multipart)
//! PUT    /api/products/{id}            - Update product (multipart)
//! DELETE /api/products/{id}            - Delete product and image
//! POST   /api/settings/appearance      - Name, theme, logo, banner (multipart)
//! POST   /api/settings/social          - Social links and map embed (JSON)
//! POST   /api/settings/slides          - Slide gallery (multipart)
//! POST   /api/settings/categories      - Add category (JSON)
//! DELETE /api/settings/categories/{n}  - Remove unused category
//! POST   /api/upload                   - Raw image upload (multipart)
//! DELETE /api/upload                   - Raw image delete (JSON)
//! ```

pub mod catalog;
pub mod form;
pub mod products;
pub mod seo;
pub mod settings;
pub mod upload;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/{id}", put(products::update).delete(products::delete))
}

/// Create the settings routes router.
pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(settings::show))
        .route("/appearance", post(settings::update_appearance))
        .route("/social", post(settings::update_social))
        .route("/slides", post(settings::update_slides))
        .route("/categories", post(settings::add_category))
        .route("/categories/{name}", delete(settings::remove_category))
}

/// Create all API and crawler routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .nest("/api/settings", settings_routes())
        .route("/api/catalog", get(catalog::show))
        .route("/api/upload", post(upload::upload).delete(upload::delete))
        .route("/robots.txt", get(seo::robots))
        .route("/sitemap.xml", get(seo::sitemap))
}

/// The full application: health checks, routes, body limit and request tracing.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let max_upload_bytes = state.config().max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the record store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.records().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
