//! Crawler endpoints.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use chrono::Utc;

use crate::state::AppState;

/// GET /robots.txt
pub async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        robots_txt(state.config().base_url.as_str()),
    )
}

/// GET /sitemap.xml
pub async fn sitemap(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        sitemap_xml(
            state.config().base_url.as_str(),
            &Utc::now().format("%Y-%m-%d").to_string(),
        ),
    )
}

fn robots_txt(base_url: &str) -> String {
    let sitemap = format!("{}/sitemap.xml", base_url.trim_end_matches('/'));
    format!("User-Agent: *\nAllow: /\nDisallow: /api/\n\nSitemap: {sitemap}\n")
}

fn sitemap_xml(base_url: &str, last_modified: &str) -> String {
    let loc = escape_xml(base_url);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>{loc}</loc>
    <lastmod>{last_modified}</lastmod>
    <changefreq>daily</changefreq>
    <priority>1</priority>
  </url>
</urlset>
"#
    )
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
