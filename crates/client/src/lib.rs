//! Woolery storefront client.
//!
//! Everything the storefront needs apart from drawing: the cart store and its
//! persistence, the backend API client, checkout coordination, payment
//! confirmation and the confirmation screen's redirect.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod confirmation;
pub mod payment;
pub mod storage;
pub mod store;

pub use api::{BackendClient, IntentSource, NetworkError};
pub use checkout::{Checkout, CheckoutCoordinator, CheckoutError, CheckoutState, OrderSummary};
pub use config::ClientConfig;
pub use confirmation::{Confirmation, OrderReference, RedirectTimer};
pub use payment::{PaymentConfirmer, PaymentError, StripeConfirmer};
pub use storage::{CartStorage, FileStorage, MemoryStorage, PersistenceError};
pub use store::{CartStore, PersistenceStatus};
