//! Shopping cart entity and its derived totals.
//!
//! A [`Cart`] is an ordered list of [`CartLine`]s, unique by
//! `(product id, size)`. Totals are pure functions over the lines and are
//! recomputed on every call.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::{Cents, Product, ProductId, Size};
use crate::wire::ChargeItem;

/// Errors raised when rebuilding a cart from stored lines.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Two stored lines share the same product and size.
    #[error("duplicate cart line for product {product_id} (size {size:?})")]
    DuplicateLine {
        /// Product of the duplicated line.
        product_id: ProductId,
        /// Size of the duplicated line.
        size: Option<Size>,
    },
}

/// One distinct (product, size) pairing with a quantity of at least one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Snapshot of the product when it was added.
    pub product: Product,
    /// Size discriminator; `None` for products without sizes.
    pub size: Option<Size>,
    quantity: NonZeroU32,
}

impl CartLine {
    /// Create a line with quantity one.
    #[must_use]
    pub const fn new(product: Product, size: Option<Size>) -> Self {
        Self {
            product,
            size,
            quantity: NonZeroU32::MIN,
        }
    }

    /// Number of units on this line (always at least one).
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity.get()
    }

    /// Returns `true` if this line is keyed by the given product and size.
    #[must_use]
    pub fn is_keyed_by(&self, product_id: &ProductId, size: Option<Size>) -> bool {
        self.product.id == *product_id && self.size == size
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Cents {
        self.product
            .price
            .checked_mul(self.quantity())
            .unwrap_or(Cents::new(u64::MAX))
    }
}

/// Identity of a cart's contents.
///
/// Two carts with the same lines, sizes and quantities in the same order have
/// equal fingerprints. Checkout uses it to decide when a fresh payment intent
/// is needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CartFingerprint(Vec<(ProductId, Option<Size>, u32)>);

/// An ordered collection of cart lines, unique by product id and size.
///
/// Serializes as a plain JSON array of lines; deserialization rejects
/// duplicate keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// The lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Find the line keyed by the given product and size.
    #[must_use]
    pub fn line(&self, product_id: &ProductId, size: Option<Size>) -> Option<&CartLine> {
        self.lines
            .iter()
            .find(|line| line.is_keyed_by(product_id, size))
    }

    /// Add one unit of a product.
    ///
    /// The size is normalised with [`Product::resolve_size`]. An existing line
    /// with the same key is incremented; otherwise a new line is appended.
    /// Returns the line's resulting quantity.
    pub fn add(&mut self, product: &Product, size: Option<Size>) -> u32 {
        let size = product.resolve_size(size);
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.is_keyed_by(&product.id, size))
        {
            line.quantity = line.quantity.saturating_add(1);
            return line.quantity();
        }

        self.lines.push(CartLine::new(product.clone(), size));
        1
    }

    /// Set the quantity of a line, removing it when `quantity` is zero.
    ///
    /// Returns `true` if a matching line existed.
    pub fn set_quantity(&mut self, product_id: &ProductId, size: Option<Size>, quantity: u32) -> bool {
        let Some(quantity) = NonZeroU32::new(quantity) else {
            return self.remove(product_id, size);
        };

        match self
            .lines
            .iter_mut()
            .find(|line| line.is_keyed_by(product_id, size))
        {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove the line keyed by the given product and size.
    ///
    /// Returns `true` if a line was removed.
    pub fn remove(&mut self, product_id: &ProductId, size: Option<Size>) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| !line.is_keyed_by(product_id, size));
        self.lines.len() != before
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of quantities across all lines (the badge count).
    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity())).sum()
    }

    /// Sum of unit price times quantity across all lines.
    #[must_use]
    pub fn total_price(&self) -> Cents {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Identity of the current contents.
    #[must_use]
    pub fn fingerprint(&self) -> CartFingerprint {
        CartFingerprint(
            self.lines
                .iter()
                .map(|line| (line.product.id.clone(), line.size, line.quantity()))
                .collect(),
        )
    }

    /// The `(product id, quantity)` pairs sent to the backend for pricing.
    ///
    /// Prices are deliberately absent.
    #[must_use]
    pub fn charge_items(&self) -> Vec<ChargeItem> {
        self.lines
            .iter()
            .map(|line| ChargeItem {
                id: line.product.id.clone(),
                quantity: line.quantity(),
            })
            .collect()
    }
}

impl TryFrom<Vec<CartLine>> for Cart {
    type Error = CartError;

    fn try_from(lines: Vec<CartLine>) -> Result<Self, Self::Error> {
        for (i, line) in lines.iter().enumerate() {
            if lines
                .iter()
                .skip(i + 1)
                .any(|other| other.is_keyed_by(&line.product.id, line.size))
            {
                return Err(CartError::DuplicateLine {
                    product_id: line.product.id.clone(),
                    size: line.size,
                });
            }
        }
        Ok(Self { lines })
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}
