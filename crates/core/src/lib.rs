//! Woolery Core - Shared types library.
//!
//! This crate provides the types shared by every Woolery component:
//! - `server` - Backend pricing authority (catalog + payment intents)
//! - `client` - Cart store and checkout coordinator
//! - `cli` - Terminal storefront built on the client
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no storage. Cart totals live here so that every collaborator
//! computes them the same way.
//!
//! # Modules
//!
//! - [`types`] - Product ids, sizes, prices, products and carts
//! - [`catalog`] - The fixed product catalog and browsing helpers
//! - [`wire`] - Request and response bodies shared by server and client

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod types;
pub mod wire;

pub use catalog::Catalog;
pub use types::*;
