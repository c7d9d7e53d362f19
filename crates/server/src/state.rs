//! Application state shared across handlers.

use std::sync::Arc;

use woolery_core::Catalog;

use crate::config::ServerConfig;
use crate::payments::{PaymentProcessor, StripeClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Everything inside is
/// immutable, so handlers never lock.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    catalog: Catalog,
    processor: Arc<dyn PaymentProcessor>,
}

impl AppState {
    /// Create application state backed by Stripe and the standard catalog.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let processor = Arc::new(StripeClient::new(&config.stripe));
        Self::with_parts(config, Catalog::standard(), processor)
    }

    /// Create application state from explicit parts.
    #[must_use]
    pub fn with_parts(
        config: ServerConfig,
        catalog: Catalog,
        processor: Arc<dyn PaymentProcessor>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                processor,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the authoritative product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the payment processor.
    #[must_use]
    pub fn processor(&self) -> &dyn PaymentProcessor {
        self.inner.processor.as_ref()
    }
}
