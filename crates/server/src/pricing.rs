//! Server-side order pricing.
//!
//! The backend is the only authority on price. Totals are recomputed from the
//! server-held catalog for every payment intent; whatever the client believes
//! an item costs is never read.

use std::str::FromStr;

use woolery_core::wire::ChargeItem;
use woolery_core::{Catalog, Cents, ProductId};

/// How to price an item whose id is not in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownProductPolicy {
    /// Refuse the whole order.
    #[default]
    Reject,
    /// Price the item at zero and continue. This under-charges when a client
    /// sends a forged id; only kept for compatibility with older storefronts.
    ContributeZero,
}

impl FromStr for UnknownProductPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "zero" | "contribute-zero" => Ok(Self::ContributeZero),
            other => Err(format!("expected 'reject' or 'zero', got '{other}'")),
        }
    }
}

/// Reasons an order cannot be priced.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("Order has no items")]
    EmptyOrder,

    #[error("Quantity for product {0} must be at least 1")]
    InvalidQuantity(ProductId),

    #[error("Unknown product: {0}")]
    UnknownProduct(ProductId),

    #[error("Order total is zero")]
    ZeroTotal,

    #[error("Order total is too large")]
    Overflow,
}

impl PricingError {
    /// Whether the client may be told what was wrong.
    ///
    /// Only a rejected unknown product is reported back; every other pricing
    /// failure is malformed input and answers with the generic server error.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownProduct(_))
    }
}

/// Compute the authoritative total for a list of charge items.
///
/// Each item contributes `catalog price × quantity`. Items with an unknown id
/// are handled according to `policy`.
///
/// # Errors
///
/// Returns a [`PricingError`] if the order is empty, has a zero quantity,
/// names an unknown product under [`UnknownProductPolicy::Reject`], sums to
/// zero, or overflows.
pub fn price_order(
    catalog: &Catalog,
    items: &[ChargeItem],
    policy: UnknownProductPolicy,
) -> Result<Cents, PricingError> {
    if items.is_empty() {
        return Err(PricingError::EmptyOrder);
    }

    let mut total = Cents::ZERO;
    for item in items {
        if item.quantity == 0 {
            return Err(PricingError::InvalidQuantity(item.id.clone()));
        }

        let unit_price = match (catalog.get(&item.id), policy) {
            (Some(product), _) => product.price,
            (None, UnknownProductPolicy::ContributeZero) => {
                tracing::warn!(product_id = %item.id, "Unknown product priced at zero");
                Cents::ZERO
            }
            (None, UnknownProductPolicy::Reject) => {
                return Err(PricingError::UnknownProduct(item.id.clone()));
            }
        };

        let line_total = unit_price
            .checked_mul(item.quantity)
            .ok_or(PricingError::Overflow)?;
        total = total
            .checked_add(line_total)
            .ok_or(PricingError::Overflow)?;
    }

    if total.is_zero() {
        return Err(PricingError::ZeroTotal);
    }

    Ok(total)
}
