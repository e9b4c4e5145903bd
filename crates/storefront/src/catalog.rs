//! Read-only product catalog.
//!
//! The catalog is plain data: a JSON array of [`Product`] records loaded once
//! at startup. Lookups are by [`ProductId`]; listing pages use
//! [`CatalogQuery`] for the search box, facet filters and sort order.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::{info, instrument};

use seattle_trading_core::{Product, ProductId};

/// Errors that can occur when loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("Failed to read catalog {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The catalog is not valid JSON for a product list.
    #[error("Invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two products share an id.
    #[error("Duplicate product id in catalog: {0}")]
    DuplicateId(ProductId),

    /// A product has a negative price.
    #[error("Negative price for product {0}")]
    NegativePrice(ProductId),
}

/// The in-memory product list.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
}

impl Catalog {
    /// Build a catalog, validating ids and prices.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate ids or negative prices.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(products.len());
        for (i, product) in products.iter().enumerate() {
            if product.unit_price_cents.as_i64() < 0 {
                return Err(CatalogError::NegativePrice(product.id.clone()));
            }
            if index.insert(product.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
        }
        Ok(Self { products, index })
    }

    /// Parse a catalog from a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or fails validation.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::new(products)
    }

    /// Load a catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json(&json)?;
        info!(products = catalog.len(), "Catalog loaded");
        Ok(catalog)
    }

    /// Look up a product.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.index.get(id).and_then(|&i| self.products.get(i))
    }

    /// Whether a product exists.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.index.contains_key(id)
    }

    /// All products in file order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Products flagged as bestsellers, in file order.
    pub fn bestsellers(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.bestseller)
    }

    /// Filter and sort products for a listing page.
    #[must_use]
    pub fn search(&self, query: &CatalogQuery) -> Vec<&Product> {
        let text = query.text.as_deref().map(str::trim).unwrap_or_default();
        let text = text.to_lowercase();

        let mut list: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| text.is_empty() || p.name.to_lowercase().contains(&text))
            .filter(|p| facet(query.size.as_deref()).is_none_or(|s| p.has_size(s)))
            .filter(|p| facet(query.category.as_deref()).is_none_or(|c| p.in_category(c)))
            .filter(|p| {
                facet(query.brand.as_deref()).is_none_or(|b| p.brand.eq_ignore_ascii_case(b))
            })
            .filter(|p| {
                facet(query.material.as_deref()).is_none_or(|m| {
                    p.material
                        .as_deref()
                        .is_some_and(|pm| pm.eq_ignore_ascii_case(m))
                })
            })
            .collect();

        // Stable sorts keep file order within ties.
        match query.sort {
            SortOrder::Popular => list.sort_by_key(|p| !p.bestseller),
            SortOrder::PriceAsc => list.sort_by_key(|p| p.unit_price_cents),
            SortOrder::PriceDesc => list.sort_by_key(|p| std::cmp::Reverse(p.unit_price_cents)),
        }

        list
    }
}

/// A facet value, with blank and `all` meaning "no filter".
fn facet(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

/// Listing filters. `None`, blank, or `all` disables a facet.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    /// Case-insensitive substring of the product name.
    pub text: Option<String>,
    pub size: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub material: Option<String>,
    pub sort: SortOrder,
}

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Bestsellers first.
    #[default]
    Popular,
    PriceAsc,
    PriceDesc,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pop" | "popular" => Ok(Self::Popular),
            "price-asc" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            _ => Err(format!("invalid sort order: {s}")),
        }
    }
}
