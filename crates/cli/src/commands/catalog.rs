//! Catalog browsing.
//!
//! # Usage
//!
//! ```bash
//! st-cli catalog list --category "Chemo Rated" --sort price-asc
//! st-cli catalog bestsellers
//! st-cli catalog show us-2000-pro-3.5-ice-blue
//! ```

use tracing::info;

use seattle_trading_core::Product;
use seattle_trading_storefront::catalog::CatalogQuery;

use super::{CommandError, Storefront};

fn print_product(product: &Product) {
    let tag = if product.bestseller { " [bestseller]" } else { "" };
    info!(
        "{:<24} {:>10}  {}{}",
        product.id.as_str(),
        product.unit_price_cents.to_string(),
        product.name,
        tag
    );
}

/// List products matching `query`.
pub fn list(storefront: &Storefront, query: &CatalogQuery) {
    let products = storefront.catalog.search(query);
    if products.is_empty() {
        info!("No products match.");
        return;
    }
    for product in &products {
        print_product(product);
    }
    info!("{} of {} products", products.len(), storefront.catalog.len());
}

/// List bestsellers in catalog order.
pub fn bestsellers(storefront: &Storefront) {
    for product in storefront.catalog.bestsellers() {
        print_product(product);
    }
}

/// Show one product in full.
///
/// # Errors
///
/// Returns an error if the id is malformed or unknown.
pub fn show(storefront: &Storefront, id: &str) -> Result<(), CommandError> {
    let id = storefront.product_id(id)?;
    let Some(product) = storefront.catalog.get(&id) else {
        return Err(CommandError::UnknownProduct(id.into_inner()));
    };

    info!("{}", product.name);
    info!("  id:         {}", product.id);
    info!("  price:      {}", product.unit_price_cents);
    info!("  brand:      {}", product.brand);
    info!("  categories: {}", product.categories.join(", "));
    info!("  sizes:      {}", product.sizes.join(", "));
    if let Some(material) = &product.material {
        info!("  material:   {material}");
    }
    if let Some(image) = product.primary_image() {
        info!("  image:      {image}");
    }
    Ok(())
}
