//! Catalog product records.

use serde::{Deserialize, Deserializer, Serialize};

use super::{Cents, ProductId};

/// A product in the catalog.
///
/// Products are immutable once the catalog is loaded. `sizes` and
/// `categories` behave as sets (duplicates are dropped on load) but keep
/// their file order for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique catalog id.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price in cents.
    pub unit_price_cents: Cents,
    /// Available sizes (e.g. `XS`, `M`).
    #[serde(default, alias = "size", deserialize_with = "one_or_many")]
    pub sizes: Vec<String>,
    /// Categories (e.g. `Medical`, `Chemo Rated`).
    #[serde(default, alias = "category", deserialize_with = "one_or_many")]
    pub categories: Vec<String>,
    /// Brand name.
    #[serde(default)]
    pub brand: String,
    /// Whether the product is featured as a bestseller.
    #[serde(default)]
    pub bestseller: bool,
    /// Glove material, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    /// Image paths, first one is the primary image.
    #[serde(default, deserialize_with = "one_or_many")]
    pub images: Vec<String>,
}

impl Product {
    /// Whether the product comes in `size` (case-insensitive).
    #[must_use]
    pub fn has_size(&self, size: &str) -> bool {
        self.sizes.iter().any(|s| s.eq_ignore_ascii_case(size))
    }

    /// Whether the product is in `category` (case-insensitive).
    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }

    /// The primary image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Accept either a single string or a list of strings.
///
/// Blank entries are skipped and duplicates removed, keeping first-seen order.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let raw = match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    };

    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for value in raw {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|seen| seen == value) {
            out.push(value.to_owned());
        }
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_as_string() {
        let json = r#"{
            "id": "us-2000-pro-3.5-ice-blue",
            "name": "Ultra Stretch Pro 3.5 (Ice Blue)",
            "unit_price_cents": 14499,
            "size": ["XS", "S", "M", "L", "XL"],
            "category": "Medical",
            "brand": "Ultra Stretch",
            "bestseller": true,
            "images": "assets/ice-blue.png"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.categories, vec!["Medical".to_string()]);
        assert_eq!(product.sizes.len(), 5);
        assert_eq!(product.primary_image(), Some("assets/ice-blue.png"));
        assert!(product.bestseller);
    }

    #[test]
    fn test_lists_dedup_and_skip_blank() {
        let json = r#"{
            "id": "a",
            "name": "A",
            "unit_price_cents": 1000,
            "categories": ["Medical", "", "Medical", "Chemo Rated"],
            "images": ""
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.categories, vec!["Medical", "Chemo Rated"]);
        assert!(product.images.is_empty());
        assert!(product.sizes.is_empty());
        assert!(!product.bestseller);
    }

    #[test]
    fn test_case_insensitive_matching() {
        let json = r#"{"id":"a","name":"A","unit_price_cents":1,"sizes":["XL"],"categories":["Chemo Rated"]}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.has_size("xl"));
        assert!(product.in_category("chemo rated"));
        assert!(!product.in_category("medical"));
    }
}
