//! Media-host asset identifier resolution.
//!
//! The media host addresses stored objects by a *public id* (folder path
//! without extension), but the records only keep the delivery URL. This module
//! recovers the id from a URL of the shape
//! `.../upload/{optional v<digits>}/{path}.{extension}`.

use std::sync::LazyLock;

use regex::Regex;

/// Matches the trailing `/upload/[v123/]path.ext` structure of a delivery URL.
static UPLOAD_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/upload/(?:v\d+/)?(.+)\.[^./]+$").expect("Invalid regex")
});

/// Resolve the media-host identifier for a delivery URL.
///
/// Returns `None` when the URL does not carry an `/upload/` segment followed by
/// a path with an extension. Query strings and fragments are ignored.
///
/// # Examples
///
/// ```
/// use vitrine_core::asset_id::resolve;
///
/// assert_eq!(
///     resolve("https://res.cloudinary.com/demo/image/upload/v123/shop-products/mug.jpg").as_deref(),
///     Some("shop-products/mug"),
/// );
/// assert_eq!(resolve("https://example.com/images/mug.jpg"), None);
/// ```
#[must_use]
pub fn resolve(url: &str) -> Option<String> {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    UPLOAD_PATH_RE
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
        .filter(|id| !id.is_empty())
}
