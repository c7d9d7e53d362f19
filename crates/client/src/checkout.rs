//! Checkout coordination.
//!
//! # States
//!
//! ```text
//!            cart empty
//!   ┌──────────────────────────► Empty
//!   │
//!   │  cart changed         intent ok              submit
//!   ├──► RequestingIntent ───────────► AwaitingPayment ───► Processing
//!   │          │                          ▲                    │   │
//!   │          │ request failed           └─── payment failed ─┘   │ payment ok
//!   │          ▼                                                   ▼
//!   │    IntentUnavailable ── retry ──► RequestingIntent       Redirecting
//! ```
//!
//! [`Checkout`] is the pure state machine; [`CheckoutCoordinator`] drives it
//! against the backend and the payment processor. An intent is requested at
//! most once per distinct cart content: re-syncing with an unchanged cart is a
//! no-op, and a response for a cart that has since changed is dropped.

use secrecy::SecretString;
use thiserror::Error;
use woolery_core::wire::CreatePaymentIntentRequest;
use woolery_core::{Cart, CartFingerprint, Cents, Size};

use crate::api::IntentSource;
use crate::payment::PaymentConfirmer;

/// Errors from driving checkout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// Payment was submitted while no intent was ready (or one is in flight).
    #[error("Checkout is not ready for payment")]
    NotReady,
}

/// A client secret bound to the cart it was requested for.
#[derive(Debug, Clone)]
pub struct PaymentIntentHandle {
    client_secret: SecretString,
}

impl PaymentIntentHandle {
    /// The secret used to confirm the payment.
    #[must_use]
    pub const fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }
}

/// Where a checkout visit currently is.
#[derive(Debug, Clone)]
pub enum CheckoutState {
    /// Nothing to pay for.
    Empty,
    /// Waiting for the backend to create an intent.
    RequestingIntent,
    /// The intent request failed; `retry` requests again.
    IntentUnavailable {
        /// Message to show inline.
        message: String,
    },
    /// Payment form is ready.
    AwaitingPayment {
        /// Intent the form is bound to.
        intent: PaymentIntentHandle,
        /// Message from the last failed attempt, if any.
        error: Option<String>,
    },
    /// A payment submission is in flight.
    Processing {
        /// Intent being confirmed.
        intent: PaymentIntentHandle,
    },
    /// Payment succeeded; navigate to the confirmation page.
    Redirecting {
        /// Confirmation page URL.
        destination: String,
    },
}

impl CheckoutState {
    /// Whether the pay button accepts a submission.
    #[must_use]
    pub const fn can_submit(&self) -> bool {
        matches!(self, Self::AwaitingPayment { .. })
    }
}

/// A payment intent request the caller must send.
#[derive(Debug, Clone)]
pub struct IntentRequest {
    /// Cart content the request was built from.
    pub fingerprint: CartFingerprint,
    /// Body for `POST /create-payment-intent`.
    pub body: CreatePaymentIntentRequest,
}

/// The checkout state machine for one visit to the checkout screen.
#[derive(Debug)]
pub struct Checkout {
    state: CheckoutState,
    requested_for: Option<CartFingerprint>,
    return_url: String,
}

impl Checkout {
    /// Start a visit. `return_url` is the confirmation page.
    #[must_use]
    pub fn new(return_url: impl Into<String>) -> Self {
        Self {
            state: CheckoutState::Empty,
            requested_for: None,
            return_url: return_url.into(),
        }
    }

    /// Current state of the checkout screen.
    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Where the processor sends the shopper after a successful payment.
    #[must_use]
    pub fn return_url(&self) -> &str {
        &self.return_url
    }

    /// Bring the machine in line with the cart.
    ///
    /// Returns a request to send when the cart's content differs from the
    /// content the last request was made for. Changes while a payment is in
    /// flight or after it succeeded are ignored.
    pub fn sync(&mut self, cart: &Cart) -> Option<IntentRequest> {
        if matches!(
            self.state,
            CheckoutState::Processing { .. } | CheckoutState::Redirecting { .. }
        ) {
            return None;
        }

        if cart.is_empty() {
            self.state = CheckoutState::Empty;
            self.requested_for = None;
            return None;
        }

        let fingerprint = cart.fingerprint();
        if self.requested_for.as_ref() == Some(&fingerprint) {
            return None;
        }

        self.requested_for = Some(fingerprint.clone());
        self.state = CheckoutState::RequestingIntent;
        Some(IntentRequest {
            fingerprint,
            body: CreatePaymentIntentRequest {
                items: cart.charge_items(),
            },
        })
    }

    /// Record a created intent. Returns `false` if the response is stale.
    pub fn intent_received(&mut self, fingerprint: &CartFingerprint, client_secret: SecretString) -> bool {
        if !self.is_current(fingerprint) {
            return false;
        }
        self.state = CheckoutState::AwaitingPayment {
            intent: PaymentIntentHandle { client_secret },
            error: None,
        };
        true
    }

    /// Record a failed intent request. Returns `false` if the response is
    /// stale.
    pub fn intent_failed(&mut self, fingerprint: &CartFingerprint, message: impl Into<String>) -> bool {
        if !self.is_current(fingerprint) {
            return false;
        }
        self.state = CheckoutState::IntentUnavailable {
            message: message.into(),
        };
        true
    }

    /// Explicitly ask for a new intent after a failed request.
    pub fn retry(&mut self, cart: &Cart) -> Option<IntentRequest> {
        if !matches!(self.state, CheckoutState::IntentUnavailable { .. }) {
            return None;
        }
        self.requested_for = None;
        self.sync(cart)
    }

    /// Submit the payment form, moving to `Processing`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NotReady`] unless the form is awaiting
    /// payment, which is what keeps double submissions out.
    pub fn submit(&mut self) -> Result<PaymentIntentHandle, CheckoutError> {
        let CheckoutState::AwaitingPayment { intent, .. } = &self.state else {
            return Err(CheckoutError::NotReady);
        };
        let intent = intent.clone();
        self.state = CheckoutState::Processing {
            intent: intent.clone(),
        };
        Ok(intent)
    }

    /// The processor rejected the payment; show `message` and allow another
    /// attempt with the same intent.
    pub fn payment_failed(&mut self, message: impl Into<String>) {
        if let CheckoutState::Processing { intent } = &self.state {
            self.state = CheckoutState::AwaitingPayment {
                intent: intent.clone(),
                error: Some(message.into()),
            };
        }
    }

    /// The payment went through; head to the confirmation page.
    pub fn payment_succeeded(&mut self) {
        if matches!(self.state, CheckoutState::Processing { .. }) {
            self.state = CheckoutState::Redirecting {
                destination: self.return_url.clone(),
            };
        }
    }

    fn is_current(&self, fingerprint: &CartFingerprint) -> bool {
        matches!(self.state, CheckoutState::RequestingIntent)
            && self.requested_for.as_ref() == Some(fingerprint)
    }
}

// =============================================================================
// Order summary
// =============================================================================

/// One row of the order summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    /// Product name.
    pub name: String,
    /// Chosen size, for sized products.
    pub size: Option<Size>,
    pub quantity: u32,
    /// Catalog price of one unit, formatted for display.
    pub unit_price: String,
    /// Unit price times quantity, formatted for display.
    pub line_total: String,
}

/// Display data for the checkout screen's order summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    /// One entry per cart line, in cart order.
    pub lines: Vec<SummaryLine>,
    /// Sum of quantities across all lines.
    pub item_count: u64,
    /// Display total; the backend computes the amount actually charged.
    pub total: Cents,
}

impl OrderSummary {
    /// Summarize `cart` for display.
    #[must_use]
    pub fn from_cart(cart: &Cart) -> Self {
        Self {
            lines: cart
                .lines()
                .iter()
                .map(|line| SummaryLine {
                    name: line.product.name.clone(),
                    size: line.size,
                    quantity: line.quantity(),
                    unit_price: line.product.price.display(),
                    line_total: line.line_total().display(),
                })
                .collect(),
            item_count: cart.total_item_count(),
            total: cart.total_price(),
        }
    }

    /// Label for the pay button, e.g. `Pay $59.97`.
    #[must_use]
    pub fn pay_label(&self) -> String {
        format!("Pay {}", self.total.display())
    }
}

// =============================================================================
// CheckoutCoordinator
// =============================================================================

/// Drives a [`Checkout`] against the backend and the payment processor.
#[derive(Debug)]
pub struct CheckoutCoordinator<S, P> {
    checkout: Checkout,
    intents: S,
    payments: P,
}

impl<S: IntentSource, P: PaymentConfirmer> CheckoutCoordinator<S, P> {
    /// A coordinator starting from an empty checkout.
    #[must_use]
    pub fn new(intents: S, payments: P, return_url: impl Into<String>) -> Self {
        Self {
            checkout: Checkout::new(return_url),
            intents,
            payments,
        }
    }

    /// Current state of the underlying checkout.
    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        self.checkout.state()
    }

    /// Re-render with the current cart, requesting an intent if its content
    /// changed since the last request.
    pub async fn refresh(&mut self, cart: &Cart) -> &CheckoutState {
        if let Some(request) = self.checkout.sync(cart) {
            self.request_intent(request).await;
        }
        self.checkout.state()
    }

    /// User asked to try again after a failed intent request.
    pub async fn retry(&mut self, cart: &Cart) -> &CheckoutState {
        if let Some(request) = self.checkout.retry(cart) {
            self.request_intent(request).await;
        }
        self.checkout.state()
    }

    /// Submit payment with `payment_method`.
    ///
    /// A declined payment is not an error here: the state returns to
    /// `AwaitingPayment` carrying the processor's message.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NotReady`] if no intent is awaiting payment.
    pub async fn pay(&mut self, payment_method: &str) -> Result<&CheckoutState, CheckoutError> {
        let intent = self.checkout.submit()?;

        match self
            .payments
            .confirm(intent.client_secret(), payment_method, self.checkout.return_url())
            .await
        {
            Ok(()) => {
                tracing::info!("Payment confirmed");
                self.checkout.payment_succeeded();
            }
            Err(e) => {
                tracing::info!(error = %e, "Payment attempt failed");
                self.checkout.payment_failed(e.to_string());
            }
        }

        Ok(self.checkout.state())
    }

    async fn request_intent(&mut self, request: IntentRequest) {
        match self.intents.create_payment_intent(&request.body).await {
            Ok(secret) => {
                self.checkout.intent_received(&request.fingerprint, secret);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Payment intent request failed");
                self.checkout.intent_failed(&request.fingerprint, e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use secrecy::ExposeSecret;
    use woolery_core::{Catalog, ProductId};

    use super::*;
    use crate::api::NetworkError;
    use crate::payment::PaymentError;

    /// Counts requests; fails while `fail` is set.
    #[derive(Default)]
    struct FakeBackend {
        requests: Mutex<Vec<CreatePaymentIntentRequest>>,
        fail: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl<'a> IntentSource for &'a FakeBackend {
        async fn create_payment_intent(
            &self,
            request: &CreatePaymentIntentRequest,
        ) -> Result<SecretString, NetworkError> {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            if self.fail.load(Ordering::SeqCst) {
                return Err(NetworkError::Status {
                    status: 500,
                    message: "Internal Server Error".to_string(),
                });
            }
            Ok(SecretString::from(format!("pi_{}_secret_x", requests.len())))
        }
    }

    /// Declines the first `declines` attempts, then succeeds.
    struct FakeProcessor {
        declines: usize,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl<'a> PaymentConfirmer for &'a FakeProcessor {
        async fn confirm(
            &self,
            _client_secret: &SecretString,
            _payment_method: &str,
            _return_url: &str,
        ) -> Result<(), PaymentError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.declines {
                return Err(PaymentError::Declined {
                    message: "Your card was declined.".to_string(),
                });
            }
            Ok(())
        }
    }

    fn cart_with(ids: &[&str]) -> Cart {
        let catalog = Catalog::standard();
        let mut cart = Cart::new();
        for id in ids {
            cart.add(catalog.get(&ProductId::new(*id)).unwrap(), None);
        }
        cart
    }

    #[test]
    fn test_empty_cart_makes_no_request() {
        let mut checkout = Checkout::new("/completion");
        assert!(checkout.sync(&Cart::new()).is_none());
        assert!(matches!(checkout.state(), CheckoutState::Empty));
    }

    #[test]
    fn test_request_once_per_cart_content() {
        let mut checkout = Checkout::new("/completion");
        let mut cart = cart_with(&["3"]);

        let request = checkout.sync(&cart).unwrap();
        assert_eq!(request.body.items.len(), 1);
        assert!(checkout.sync(&cart).is_none());
        assert!(checkout.sync(&cart.clone()).is_none());

        cart.add(&Catalog::standard().get(&ProductId::new("3")).cloned().unwrap(), None);
        let request = checkout.sync(&cart).unwrap();
        assert_eq!(request.body.items[0].quantity, 2);
    }

    #[test]
    fn test_stale_intent_is_dropped() {
        let mut checkout = Checkout::new("/completion");
        let first = checkout.sync(&cart_with(&["3"])).unwrap();
        let second = checkout.sync(&cart_with(&["3", "4"])).unwrap();

        assert!(!checkout.intent_received(&first.fingerprint, SecretString::from("pi_1_secret_a")));
        assert!(matches!(checkout.state(), CheckoutState::RequestingIntent));

        assert!(checkout.intent_received(&second.fingerprint, SecretString::from("pi_2_secret_b")));
        assert!(checkout.state().can_submit());
    }

    #[test]
    fn test_submit_only_when_awaiting_payment() {
        let mut checkout = Checkout::new("/completion");
        assert_eq!(checkout.submit().unwrap_err(), CheckoutError::NotReady);

        let request = checkout.sync(&cart_with(&["5"])).unwrap();
        assert_eq!(checkout.submit().unwrap_err(), CheckoutError::NotReady);

        checkout.intent_received(&request.fingerprint, SecretString::from("pi_1_secret_a"));
        checkout.submit().unwrap();
        assert_eq!(checkout.submit().unwrap_err(), CheckoutError::NotReady);
    }

    #[test]
    fn test_cart_changes_ignored_while_processing() {
        let mut checkout = Checkout::new("/completion");
        let request = checkout.sync(&cart_with(&["5"])).unwrap();
        checkout.intent_received(&request.fingerprint, SecretString::from("pi_1_secret_a"));
        checkout.submit().unwrap();

        assert!(checkout.sync(&cart_with(&["5", "4"])).is_none());
        assert!(matches!(checkout.state(), CheckoutState::Processing { .. }));
    }

    #[test]
    fn test_order_summary_counts_quantities() {
        let mut cart = Cart::new();
        let socks = Catalog::standard().get(&ProductId::new("2")).cloned().unwrap();
        cart.add(&socks, Some(Size::M));
        cart.set_quantity(&socks.id, Some(Size::M), 3);

        let summary = OrderSummary::from_cart(&cart);
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.lines[0].line_total, "$59.97");
        assert_eq!(summary.lines[0].unit_price, "$19.99");
        assert_eq!(summary.pay_label(), "Pay $59.97");
    }

    #[tokio::test]
    async fn test_coordinator_happy_path() {
        let backend = FakeBackend::default();
        let processor = FakeProcessor {
            declines: 0,
            attempts: AtomicUsize::new(0),
        };
        let mut coordinator = CheckoutCoordinator::new(&backend, &processor, "/completion");
        let cart = cart_with(&["1", "3"]);

        assert!(coordinator.refresh(&cart).await.can_submit());
        coordinator.refresh(&cart).await;
        assert_eq!(backend.requests.lock().unwrap().len(), 1);

        let state = coordinator.pay("pm_card_visa").await.unwrap();
        assert!(matches!(
            state,
            CheckoutState::Redirecting { destination } if destination == "/completion"
        ));
    }

    #[tokio::test]
    async fn test_coordinator_decline_then_retry_payment() {
        let backend = FakeBackend::default();
        let processor = FakeProcessor {
            declines: 2,
            attempts: AtomicUsize::new(0),
        };
        let mut coordinator = CheckoutCoordinator::new(&backend, &processor, "/completion");
        coordinator.refresh(&cart_with(&["2"])).await;

        for _ in 0..2 {
            let state = coordinator.pay("pm_card_chargeDeclined").await.unwrap();
            let CheckoutState::AwaitingPayment { intent, error } = state else {
                panic!("expected AwaitingPayment, got {state:?}");
            };
            assert_eq!(error.as_deref(), Some("Your card was declined."));
            assert_eq!(intent.client_secret().expose_secret(), "pi_1_secret_x");
        }

        let state = coordinator.pay("pm_card_visa").await.unwrap();
        assert!(matches!(state, CheckoutState::Redirecting { .. }));
        assert_eq!(backend.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_coordinator_intent_failure_needs_explicit_retry() {
        let backend = FakeBackend::default();
        backend.fail.store(true, Ordering::SeqCst);
        let processor = FakeProcessor {
            declines: 0,
            attempts: AtomicUsize::new(0),
        };
        let mut coordinator = CheckoutCoordinator::new(&backend, &processor, "/completion");
        let cart = cart_with(&["4"]);

        let state = coordinator.refresh(&cart).await;
        assert!(matches!(state, CheckoutState::IntentUnavailable { .. }));

        // Re-rendering does not retry on its own
        coordinator.refresh(&cart).await;
        assert_eq!(backend.requests.lock().unwrap().len(), 1);
        assert_eq!(
            coordinator.pay("pm_card_visa").await.unwrap_err(),
            CheckoutError::NotReady
        );

        backend.fail.store(false, Ordering::SeqCst);
        assert!(coordinator.retry(&cart).await.can_submit());
        assert_eq!(backend.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_requests_never_carry_prices() {
        let backend = FakeBackend::default();
        let processor = FakeProcessor {
            declines: 0,
            attempts: AtomicUsize::new(0),
        };
        let mut coordinator = CheckoutCoordinator::new(&backend, &processor, "/completion");
        coordinator.refresh(&cart_with(&["1", "1", "6"])).await;

        let requests = backend.requests.lock().unwrap();
        let json = serde_json::to_value(&requests[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "items": [
                { "id": "1", "quantity": 2 },
                { "id": "6", "quantity": 1 }
            ]})
        );
    }
}
