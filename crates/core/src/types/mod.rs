//! Core types for Woolery.
//!
//! This module provides type-safe wrappers for the storefront's domain concepts.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{Cart, CartError, CartFingerprint, CartLine};
pub use id::{ProductId, ProductIdError};
pub use price::Cents;
pub use product::{Category, Product, Size, UnknownCategory, UnknownSize};
