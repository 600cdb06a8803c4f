//! Read-only catalog grouping over products and the configured categories.

use serde::Serialize;

use crate::types::Product;

/// One category tile on the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub name: String,
    pub product_count: usize,
}

/// Count products per configured category, in configured order.
///
/// Categories without products are hidden from shoppers; admins see them so
/// they can fill or remove them.
#[must_use]
pub fn summarize(
    categories: &[String],
    products: &[Product],
    include_empty: bool,
) -> Vec<CategorySummary> {
    categories
        .iter()
        .map(|name| CategorySummary {
            name: name.clone(),
            product_count: products.iter().filter(|p| p.in_category(name)).count(),
        })
        .filter(|summary| include_empty || summary.product_count > 0)
        .collect()
}

/// Products of one category, keeping catalog order.
#[must_use]
pub fn products_in<'a>(products: &'a [Product], category: &str) -> Vec<&'a Product> {
    products.iter().filter(|p| p.in_category(category)).collect()
}
