//! The cart store: the storefront's single owner of cart state.
//!
//! [`CartStore`] is held by the top-level controller and lent to views by
//! reference. Every mutation is written through to [`CartStorage`]
//! best-effort; a failing store is never fatal, it degrades the session to
//! in-memory only and leaves a warning for the UI to show.

use woolery_core::{Cart, CartFingerprint, CartLine, Cents, Product, ProductId, Size};

use crate::storage::{CartStorage, MemoryStorage, PersistenceError};

/// Whether cart changes are reaching durable storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceStatus {
    /// Changes are being saved.
    Durable,
    /// Storage failed; the cart only lives in memory for this session.
    Degraded {
        /// Why persistence was abandoned.
        reason: String,
    },
}

impl PersistenceStatus {
    /// Returns `true` while changes are still being saved.
    #[must_use]
    pub const fn is_durable(&self) -> bool {
        matches!(self, Self::Durable)
    }
}

/// Cart state container.
pub struct CartStore {
    cart: Cart,
    panel_open: bool,
    storage: Box<dyn CartStorage>,
    status: PersistenceStatus,
    warnings: Vec<String>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .field("panel_open", &self.panel_open)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Open a store, restoring any cart previously saved in `storage`.
    ///
    /// A corrupt saved cart is discarded with a warning; later saves overwrite
    /// it. Storage that cannot be read at all degrades the session.
    pub fn open(storage: impl CartStorage + 'static) -> Self {
        let mut store = Self {
            cart: Cart::new(),
            panel_open: false,
            storage: Box::new(storage),
            status: PersistenceStatus::Durable,
            warnings: Vec::new(),
        };

        match store.storage.load() {
            Ok(Some(cart)) => {
                tracing::debug!(lines = cart.line_count(), "Restored saved cart");
                store.cart = cart;
            }
            Ok(None) => {}
            Err(e) if e.is_corrupt() => {
                tracing::warn!(error = %e, "Discarding unreadable saved cart");
                store
                    .warnings
                    .push("Your saved cart could not be read and was reset.".to_string());
            }
            Err(e) => store.degrade(&e),
        }

        store
    }

    /// A store that never touches durable storage.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::open(MemoryStorage::new())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The current cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The current lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        self.cart.lines()
    }

    /// Returns `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Sum of quantities, for the cart badge.
    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.cart.total_item_count()
    }

    /// Grand total in cents, recomputed from the lines.
    #[must_use]
    pub fn total_price(&self) -> Cents {
        self.cart.total_price()
    }

    /// Identity of the current contents.
    #[must_use]
    pub fn fingerprint(&self) -> CartFingerprint {
        self.cart.fingerprint()
    }

    /// Current persistence status.
    #[must_use]
    pub const fn persistence(&self) -> &PersistenceStatus {
        &self.status
    }

    /// Take the warnings raised since the last call, oldest first.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    // =========================================================================
    // Panel
    // =========================================================================

    /// Whether the slide-out cart panel is showing.
    #[must_use]
    pub const fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    /// Show the cart panel.
    pub const fn open_panel(&mut self) {
        self.panel_open = true;
    }

    /// Hide the cart panel.
    pub const fn close_panel(&mut self) {
        self.panel_open = false;
    }

    /// Show the cart panel if hidden, hide it if showing.
    pub const fn toggle_panel(&mut self) {
        self.panel_open = !self.panel_open;
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of `product` and open the cart panel.
    pub fn add_item(&mut self, product: &Product, size: Option<Size>) {
        let quantity = self.cart.add(product, size);
        tracing::debug!(product_id = %product.id, ?size, quantity, "Added to cart");
        self.panel_open = true;
        self.persist();
    }

    /// Set a line's quantity; below one removes the line.
    ///
    /// Returns `false` (and changes nothing) when no line matches.
    pub fn update_quantity(&mut self, product_id: &ProductId, size: Option<Size>, quantity: u32) -> bool {
        let changed = self.cart.set_quantity(product_id, size, quantity);
        if changed {
            tracing::debug!(%product_id, ?size, quantity, "Updated cart quantity");
            self.persist();
        }
        changed
    }

    /// Remove a line. Removing a missing line is a no-op returning `false`.
    pub fn remove_item(&mut self, product_id: &ProductId, size: Option<Size>) -> bool {
        let removed = self.cart.remove(product_id, size);
        if removed {
            tracing::debug!(%product_id, ?size, "Removed from cart");
            self.persist();
        }
        removed
    }

    /// Empty the cart, close the panel and delete the saved cart.
    ///
    /// Removal is attempted even when the session is degraded, so a paid cart
    /// is not restored on the next visit.
    pub fn clear(&mut self) {
        self.cart.clear();
        self.panel_open = false;
        tracing::debug!("Cleared cart");

        if let Err(e) = self.storage.remove() {
            self.degrade(&e);
        }
    }

    fn persist(&mut self) {
        if !self.status.is_durable() {
            return;
        }
        if let Err(e) = self.storage.save(&self.cart) {
            self.degrade(&e);
        }
    }

    fn degrade(&mut self, error: &PersistenceError) {
        tracing::warn!(error = %error, "Cart persistence failed, continuing in memory");
        if self.status.is_durable() {
            self.warnings.push(
                "Your cart can't be saved on this device; it will be kept until you leave."
                    .to_string(),
            );
        }
        self.status = PersistenceStatus::Degraded {
            reason: error.to_string(),
        };
    }
}

#[cfg(test)]
mod tests {
    use woolery_core::Catalog;

    use super::*;

    fn product(id: &str) -> Product {
        Catalog::standard()
            .get(&ProductId::new(id))
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_add_merges_and_opens_panel() {
        let socks = product("2");
        let mut store = CartStore::in_memory();
        assert!(!store.is_panel_open());

        for _ in 0..4 {
            store.add_item(&socks, Some(Size::S));
        }

        assert!(store.is_panel_open());
        assert_eq!(store.lines().len(), 1);
        assert_eq!(store.lines()[0].quantity(), 4);
        assert_eq!(store.total_item_count(), 4);
    }

    #[test]
    fn test_badge_counts_quantities_not_lines() {
        let mut store = CartStore::in_memory();
        store.add_item(&product("2"), Some(Size::S));
        store.add_item(&product("2"), Some(Size::S));
        store.add_item(&product("3"), None);

        assert_eq!(store.lines().len(), 2);
        assert_eq!(store.total_item_count(), 3);
    }

    #[test]
    fn test_quantity_scenario() {
        let socks = product("2");
        let mut store = CartStore::in_memory();
        store.add_item(&socks, Some(Size::M));
        assert!(store.update_quantity(&socks.id, Some(Size::M), 3));
        assert_eq!(store.total_price(), Cents::new(5997));

        assert!(store.remove_item(&socks.id, Some(Size::M)));
        assert!(store.is_empty());
        assert_eq!(store.total_price(), Cents::ZERO);
        assert!(!store.remove_item(&socks.id, Some(Size::M)));
    }

    #[test]
    fn test_update_to_zero_removes_and_missing_is_noop() {
        let socks = product("2");
        let mut store = CartStore::in_memory();
        store.add_item(&socks, Some(Size::M));

        assert!(!store.update_quantity(&socks.id, Some(Size::Xl), 0));
        assert_eq!(store.total_item_count(), 1);

        assert!(store.update_quantity(&socks.id, Some(Size::M), 0));
        assert!(store.is_empty());
    }

    #[test]
    fn test_every_mutation_is_saved() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage.clone());
        let scarf = product("3");

        store.add_item(&scarf, None);
        store.update_quantity(&scarf.id, None, 5);

        let restored = CartStore::open(storage);
        assert_eq!(restored.total_item_count(), 5);
        assert_eq!(restored.cart(), store.cart());
    }

    #[test]
    fn test_clear_empties_and_removes_saved_cart() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage.clone());
        store.add_item(&product("1"), Some(Size::L));

        store.clear();

        assert_eq!(store.total_item_count(), 0);
        assert_eq!(store.total_price(), Cents::ZERO);
        assert!(!store.is_panel_open());
        assert!(storage.raw().is_none());
        assert_eq!(storage.removals(), 1);
    }

    #[test]
    fn test_write_failure_degrades_once() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage.clone());
        storage.fail_writes(true);

        store.add_item(&product("4"), None);
        store.add_item(&product("5"), None);

        assert_eq!(store.total_item_count(), 2);
        assert!(matches!(
            store.persistence(),
            PersistenceStatus::Degraded { .. }
        ));
        assert_eq!(store.take_warnings().len(), 1);
        assert!(store.take_warnings().is_empty());

        // Writes stay off for the session even once storage recovers
        storage.fail_writes(false);
        store.add_item(&product("4"), None);
        assert!(storage.raw().is_none());
    }

    #[test]
    fn test_corrupt_saved_cart_starts_empty_and_stays_durable() {
        let storage = MemoryStorage::with_raw("definitely not a cart");
        let mut store = CartStore::open(storage.clone());

        assert!(store.is_empty());
        assert!(store.persistence().is_durable());
        assert_eq!(store.take_warnings().len(), 1);

        store.add_item(&product("3"), None);
        assert!(storage.raw().is_some());
    }

    #[test]
    fn test_panel_controls() {
        let mut store = CartStore::in_memory();
        store.toggle_panel();
        assert!(store.is_panel_open());
        store.close_panel();
        assert!(!store.is_panel_open());
        store.open_panel();
        assert!(store.is_panel_open());
    }
}
