//! The top-level storefront controller.
//!
//! [`Shop`] owns the one [`CartStore`] for the run and lends it to each
//! screen. Screens that talk to the backend or the payment processor report
//! failures inline and carry on.

use thiserror::Error;
use tokio::sync::oneshot;
use woolery_client::checkout::CheckoutState;
use woolery_client::config::ConfigError;
use woolery_client::{
    BackendClient, CartStore, CheckoutCoordinator, ClientConfig, Confirmation, FileStorage,
    NetworkError, OrderSummary, StripeConfirmer,
};
use woolery_core::{Catalog, Category, Product, ProductId, Size};

use crate::render;

/// Errors that fail a command.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The product id is not in the catalog.
    #[error("No product with id {0}")]
    UnknownProduct(ProductId),

    /// No cart line matches the id and size.
    #[error("Nothing in your cart matches {}", describe_line(.0, .1))]
    NotInCart(ProductId, Option<Size>),

    /// Paying needs a publishable key.
    #[error("Missing environment variable: STRIPE_PUBLISHABLE_KEY (required to pay)")]
    MissingPublishableKey,
}

/// Storefront controller for one CLI run.
#[derive(Debug)]
pub struct Shop {
    config: ClientConfig,
    store: CartStore,
    backend: BackendClient,
}

impl Shop {
    /// Open the shop with the cart saved in the configured data directory.
    pub fn open(config: ClientConfig) -> Self {
        let store = CartStore::open(FileStorage::new(&config.data_dir));
        let backend = BackendClient::new(config.api_url.clone());
        Self::with_parts(config, store, backend)
    }

    pub const fn with_parts(config: ClientConfig, store: CartStore, backend: BackendClient) -> Self {
        Self {
            config,
            store,
            backend,
        }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Print the products matching the filters.
    pub async fn list_products(&self, category: Option<Category>, search: Option<&str>) {
        let Some(catalog) = self.fetch_catalog().await else {
            return;
        };
        let products = catalog.browse(category, search);
        render::out(&render::product_list(&products));
    }

    async fn fetch_catalog(&self) -> Option<Catalog> {
        match self.backend.products().await {
            Ok(products) => Some(Catalog::from(products)),
            Err(e) => {
                render::error(&catalog_unavailable(&e));
                None
            }
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    pub fn show_cart(&self) {
        render::out(&render::cart_panel(self.store.cart()));
    }

    /// Add one unit, show the panel the add opened, then close it.
    pub async fn add_to_cart(&mut self, id: &ProductId, size: Option<Size>) -> Result<(), ShopError> {
        let Some(catalog) = self.fetch_catalog().await else {
            return Ok(());
        };
        let product = catalog
            .get(id)
            .ok_or_else(|| ShopError::UnknownProduct(id.clone()))?;

        if size.is_some() && !product.has_sizes {
            render::notice(&format!("{} comes in one size; ignoring --size.", product.name));
        }

        self.store.add_item(product, size);
        if self.store.is_panel_open() {
            render::out(&render::cart_panel(self.store.cart()));
            self.store.close_panel();
        }
        Ok(())
    }

    pub fn update_quantity(&mut self, id: &ProductId, size: Option<Size>, quantity: u32) -> Result<(), ShopError> {
        let size = self.line_size(id, size);
        if !self.store.update_quantity(id, size, quantity) {
            return Err(ShopError::NotInCart(id.clone(), size));
        }
        self.show_cart();
        Ok(())
    }

    pub fn remove_from_cart(&mut self, id: &ProductId, size: Option<Size>) -> Result<(), ShopError> {
        let size = self.line_size(id, size);
        if !self.store.remove_item(id, size) {
            return Err(ShopError::NotInCart(id.clone(), size));
        }
        self.show_cart();
        Ok(())
    }

    pub fn clear_cart(&mut self) {
        self.store.clear();
        render::out("Your cart is empty.");
    }

    /// Lines are keyed by the normalised size, so an omitted `--size` on a
    /// sized product means the default size.
    fn line_size(&self, id: &ProductId, size: Option<Size>) -> Option<Size> {
        self.product_in_cart(id)
            .map_or(size, |product| product.resolve_size(size))
    }

    fn product_in_cart(&self, id: &ProductId) -> Option<&Product> {
        self.store
            .lines()
            .iter()
            .find(|line| line.product.id == *id)
            .map(|line| &line.product)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Show the order summary and, with a payment method, pay.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::MissingPublishableKey`] when paying without a
    /// publishable key.
    pub async fn checkout(&mut self, payment_method: Option<&str>) -> Result<(), ShopError> {
        if payment_method.is_some() && self.config.publishable_key.is_none() {
            return Err(ShopError::MissingPublishableKey);
        }

        // Without --pay the confirmer is never called
        let confirmer = StripeConfirmer::new(
            self.config.stripe_api_base.clone(),
            self.config.publishable_key.clone().unwrap_or_default(),
        );
        let mut coordinator =
            CheckoutCoordinator::new(self.backend.clone(), confirmer, self.config.return_url());

        match coordinator.refresh(self.store.cart()).await {
            CheckoutState::Empty => {
                render::out("Your cart is empty. Add something with `woolery cart add <id>`.");
                return Ok(());
            }
            CheckoutState::IntentUnavailable { message } => {
                render::out(&render::order_summary(&OrderSummary::from_cart(self.store.cart())));
                render::error(&format!("{message}\nRun `woolery checkout` again to retry."));
                return Ok(());
            }
            _ => {}
        }

        let summary = OrderSummary::from_cart(self.store.cart());
        render::out(&render::order_summary(&summary));

        let Some(payment_method) = payment_method else {
            render::out(&format!(
                "\n{} with `woolery checkout --pay <payment_method>`.",
                summary.pay_label()
            ));
            return Ok(());
        };

        render::out("Processing...");
        match coordinator.pay(payment_method).await {
            Ok(CheckoutState::Redirecting { destination }) => {
                tracing::debug!(%destination, "Payment complete");
                self.confirm().await;
            }
            Ok(CheckoutState::AwaitingPayment { error: Some(message), .. }) => {
                render::error(message);
            }
            Ok(state) => tracing::warn!(?state, "Unexpected checkout state after payment"),
            Err(e) => render::error(&e.to_string()),
        }
        Ok(())
    }

    /// The confirmation screen: clears the cart, then returns to the catalog
    /// after the redirect delay unless interrupted.
    async fn confirm(&mut self) {
        let (redirect_tx, redirect_rx) = oneshot::channel();
        let confirmation = Confirmation::enter(&mut self.store, move || {
            let _ = redirect_tx.send(());
        });
        render::out(&render::confirmation(&confirmation.render()));

        tokio::select! {
            _ = redirect_rx => {
                self.list_products(None, None).await;
            }
            _ = tokio::signal::ctrl_c() => {
                confirmation.leave();
            }
        }
    }

    /// Print any persistence warnings raised during the command.
    pub fn flush_warnings(&mut self) {
        for warning in self.store.take_warnings() {
            render::notice(&warning);
        }
    }

    /// Flush warnings, then hand back the command's outcome.
    ///
    /// # Errors
    ///
    /// Returns `result` unchanged if the command failed.
    pub fn finish<T>(&mut self, result: Result<T, ShopError>) -> Result<T, ShopError> {
        self.flush_warnings();
        result
    }
}

fn describe_line(id: &ProductId, size: &Option<Size>) -> String {
    match size {
        Some(size) => format!("product {id} (size {size})"),
        None => format!("product {id}"),
    }
}

fn catalog_unavailable(error: &NetworkError) -> String {
    format!("Could not load products. {error}")
}
