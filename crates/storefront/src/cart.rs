//! Persisted cart store.
//!
//! The cart is a list of [`CartLine`]s stored under [`keys::CART`]. Each
//! operation loads the list, applies the change, and writes the full list
//! back before returning. There is no in-memory copy, so every handle over
//! the same storage sees the same cart.
//!
//! Lines whose product has left the catalog are excluded from totals and
//! pruned from storage the next time the cart is listed against a catalog.

use tracing::{debug, info, instrument, warn};

use seattle_trading_core::{CartLine, Cents, Product, ProductId};

use crate::catalog::Catalog;
use crate::storage::{KeyValueStore, StorageError, keys, read_json_lenient, write_json};

/// Result of [`CartStore::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line with quantity 1 was appended.
    Added,
    /// An existing line was incremented to `quantity`.
    Incremented { quantity: u32 },
    /// The product is not in the catalog; the cart is unchanged.
    UnknownProduct,
}

/// A cart line joined with its catalog product.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedLine<'a> {
    pub product: &'a Product,
    pub quantity: u32,
}

impl ResolvedLine<'_> {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Cents {
        self.product.unit_price_cents * self.quantity
    }
}

/// Cart operations over a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct CartStore<S> {
    store: S,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Create a cart store over `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The stored lines, in insertion order.
    ///
    /// Duplicate lines for one product (written by older builds) are merged.
    /// A corrupt cart reads as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn lines(&self) -> Result<Vec<CartLine>, StorageError> {
        let raw: Vec<CartLine> = read_json_lenient(&self.store, keys::CART)?.unwrap_or_default();

        let mut merged: Vec<CartLine> = Vec::with_capacity(raw.len());
        for line in raw {
            if let Some(existing) = merged.iter_mut().find(|l| l.product_id == line.product_id) {
                let sum = i64::from(existing.quantity()) + i64::from(line.quantity());
                existing.set_quantity(sum);
            } else {
                merged.push(line);
            }
        }
        Ok(merged)
    }

    fn save(&self, lines: &[CartLine]) -> Result<(), StorageError> {
        write_json(&self.store, keys::CART, lines)
    }

    /// Add one unit of a product.
    ///
    /// Unknown products are reported through [`AddOutcome::UnknownProduct`]
    /// and leave the cart untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    #[instrument(skip(self, catalog), fields(product_id = %product_id))]
    pub fn add(&self, catalog: &Catalog, product_id: &ProductId) -> Result<AddOutcome, StorageError> {
        if !catalog.contains(product_id) {
            warn!("Ignoring add for unknown product");
            return Ok(AddOutcome::UnknownProduct);
        }

        let mut lines = self.lines()?;
        let outcome = if let Some(line) = lines.iter_mut().find(|l| &l.product_id == product_id) {
            line.increment();
            AddOutcome::Incremented {
                quantity: line.quantity(),
            }
        } else {
            lines.push(CartLine::new(product_id.clone(), 1));
            AddOutcome::Added
        };

        self.save(&lines)?;
        info!(?outcome, "Added to cart");
        Ok(outcome)
    }

    /// Replace the quantity of a line, clamping to at least 1.
    ///
    /// Returns `false` (and writes nothing) if the product is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn set_quantity(&self, product_id: &ProductId, quantity: i64) -> Result<bool, StorageError> {
        let mut lines = self.lines()?;
        let Some(line) = lines.iter_mut().find(|l| &l.product_id == product_id) else {
            debug!("Quantity change for product not in cart");
            return Ok(false);
        };

        line.set_quantity(quantity);
        self.save(&lines)?;
        Ok(true)
    }

    /// Remove a line. Returns whether a line was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn remove(&self, product_id: &ProductId) -> Result<bool, StorageError> {
        let mut lines = self.lines()?;
        let before = lines.len();
        lines.retain(|l| &l.product_id != product_id);
        if lines.len() == before {
            return Ok(false);
        }
        self.save(&lines)?;
        Ok(true)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.save(&[])
    }

    /// Stored lines that reference existing products.
    ///
    /// Stale lines are dropped from storage as a side effect.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn current_lines(&self, catalog: &Catalog) -> Result<Vec<CartLine>, StorageError> {
        let lines = self.lines()?;
        let before = lines.len();
        let live: Vec<CartLine> = lines
            .into_iter()
            .filter(|l| catalog.contains(&l.product_id))
            .collect();

        if live.len() != before {
            warn!(
                dropped = before - live.len(),
                "Pruning cart lines for products no longer in the catalog"
            );
            self.save(&live)?;
        }
        Ok(live)
    }

    /// Lines joined with their products, in cart order.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn list<'c>(&self, catalog: &'c Catalog) -> Result<Vec<ResolvedLine<'c>>, StorageError> {
        Ok(self
            .current_lines(catalog)?
            .into_iter()
            .filter_map(|l| {
                catalog.get(&l.product_id).map(|product| ResolvedLine {
                    product,
                    quantity: l.quantity(),
                })
            })
            .collect())
    }

    /// Sum of stored quantities, for the header badge.
    ///
    /// Counts every stored line, resolvable or not.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn item_count(&self) -> Result<u64, StorageError> {
        Ok(self.lines()?.iter().map(|l| u64::from(l.quantity())).sum())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::tests::fixture;
    use crate::storage::MemoryStore;

    fn id(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    #[test]
    fn test_add_twice_increments() {
        let store = MemoryStore::new();
        let cart = CartStore::new(&store);
        let catalog = fixture();

        assert_eq!(cart.add(&catalog, &id("A")).unwrap(), AddOutcome::Added);
        assert_eq!(
            cart.add(&catalog, &id("A")).unwrap(),
            AddOutcome::Incremented { quantity: 2 }
        );

        let lines = cart.lines().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity(), 2);
    }

    #[test]
    fn test_add_unknown_is_noop() {
        let store = MemoryStore::new();
        let cart = CartStore::new(&store);
        assert_eq!(
            cart.add(&fixture(), &id("nope")).unwrap(),
            AddOutcome::UnknownProduct
        );
        assert!(store.get(keys::CART).unwrap().is_none());
    }

    #[test]
    fn test_set_quantity_clamps() {
        let store = MemoryStore::new();
        let cart = CartStore::new(&store);
        let catalog = fixture();
        cart.add(&catalog, &id("A")).unwrap();

        assert!(cart.set_quantity(&id("A"), 0).unwrap());
        assert_eq!(cart.lines().unwrap()[0].quantity(), 1);
        assert!(cart.set_quantity(&id("A"), -7).unwrap());
        assert_eq!(cart.lines().unwrap()[0].quantity(), 1);
        assert!(cart.set_quantity(&id("A"), 5).unwrap());
        assert_eq!(cart.lines().unwrap()[0].quantity(), 5);

        assert!(!cart.set_quantity(&id("B"), 3).unwrap());
    }

    #[test]
    fn test_remove_and_clear() {
        let store = MemoryStore::new();
        let cart = CartStore::new(&store);
        let catalog = fixture();
        cart.add(&catalog, &id("A")).unwrap();
        cart.add(&catalog, &id("B")).unwrap();

        assert!(cart.remove(&id("A")).unwrap());
        assert!(!cart.remove(&id("A")).unwrap());
        assert_eq!(cart.lines().unwrap().len(), 1);

        cart.clear().unwrap();
        assert!(cart.lines().unwrap().is_empty());
        assert_eq!(store.get(keys::CART).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_order_is_insertion_order() {
        let store = MemoryStore::new();
        let cart = CartStore::new(&store);
        let catalog = fixture();
        for p in ["C", "A", "B", "A"] {
            cart.add(&catalog, &id(p)).unwrap();
        }
        let order: Vec<String> = cart
            .lines()
            .unwrap()
            .iter()
            .map(|l| l.product_id.to_string())
            .collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_list_prunes_stale_lines() {
        let store = MemoryStore::new();
        store
            .set(keys::CART, r#"[{"id":"A","qty":2},{"id":"gone","qty":4}]"#)
            .unwrap();
        let cart = CartStore::new(&store);

        assert_eq!(cart.item_count().unwrap(), 6);

        let catalog = fixture();
        let list = cart.list(&catalog).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].line_total(), Cents::new(2000));

        assert_eq!(cart.lines().unwrap().len(), 1);
        assert_eq!(cart.item_count().unwrap(), 2);
    }

    #[test]
    fn test_duplicate_stored_lines_merge() {
        let store = MemoryStore::new();
        store
            .set(keys::CART, r#"[{"id":"A","qty":2},{"id":"A","qty":3}]"#)
            .unwrap();
        let lines = CartStore::new(&store).lines().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity(), 5);
    }

    #[test]
    fn test_corrupt_cart_reads_empty_and_recovers() {
        let store = MemoryStore::new();
        store.set(keys::CART, "not json").unwrap();
        let cart = CartStore::new(&store);
        assert!(cart.lines().unwrap().is_empty());

        cart.add(&fixture(), &id("A")).unwrap();
        assert_eq!(cart.lines().unwrap().len(), 1);
    }
}
