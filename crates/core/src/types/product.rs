//! Catalog products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::asset::Asset;
use super::id::ProductId;

/// Category assigned when a product has none.
pub const DEFAULT_CATEGORY: &str = "General";

/// A catalog product as persisted in the `products` collection.
///
/// Field names follow the stored document shape (`imageUrl`, `createdAt`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// The category used for grouping; absent categories count as [`DEFAULT_CATEGORY`].
    #[must_use]
    pub fn effective_category(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }

    /// Whether this product belongs to `category` (case-sensitive).
    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        self.effective_category() == category
    }

    /// The bound image, if any.
    #[must_use]
    pub fn image(&self) -> Option<Asset> {
        self.image_url.as_deref().map(Asset::new)
    }
}

/// Text fields submitted from the product form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl ProductDraft {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        missing
    }

    /// Pick the category for a new product: explicit value, else the
    /// category the admin was browsing, else [`DEFAULT_CATEGORY`].
    #[must_use]
    pub fn resolve_category(&self, context: Option<&str>) -> String {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .or_else(|| context.map(str::trim).filter(|c| !c.is_empty()))
            .unwrap_or(DEFAULT_CATEGORY)
            .to_owned()
    }
}

/// Treat `""` the way the stored documents use it: as "no value".
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_document_with_empty_strings() {
        let json = serde_json::json!({
            "id": "abc",
            "name": "Mug",
            "description": "Ceramic",
            "imageUrl": "",
            "category": "",
            "createdAt": "2025-01-02T03:04:05.000Z"
        });
        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.image_url, None);
        assert_eq!(product.effective_category(), DEFAULT_CATEGORY);
        assert!(product.created_at.is_some());
    }

    #[test]
    fn test_in_category_is_case_sensitive() {
        let product = Product {
            id: ProductId::new("p"),
            name: "n".into(),
            description: "d".into(),
            category: Some("Art".into()),
            image_url: None,
            created_at: None,
            updated_at: None,
        };
        assert!(product.in_category("Art"));
        assert!(!product.in_category("art"));
    }

    #[test]
    fn test_missing_fields() {
        let draft = ProductDraft {
            name: "  ".into(),
            description: String::new(),
            category: None,
        };
        assert_eq!(draft.missing_fields(), ["name", "description"]);
    }

    #[test]
    fn test_resolve_category_precedence() {
        let mut draft = ProductDraft::default();
        assert_eq!(draft.resolve_category(None), "General");
        assert_eq!(draft.resolve_category(Some("Home")), "Home");
        draft.category = Some("Art".into());
        assert_eq!(draft.resolve_category(Some("Home")), "Art");
    }
}
