//! The order confirmation screen.
//!
//! Entering confirmation is the one place the cart is cleared. The screen then
//! sends the shopper back to the catalog after [`REDIRECT_DELAY`] unless they
//! leave first.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::task::JoinHandle;

use crate::store::CartStore;

/// How long the confirmation screen waits before returning to the catalog.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(10);

const REFERENCE_LEN: usize = 8;
const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Short reference shown to the shopper, e.g. `K7Q2ZP4M`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderReference(String);

impl OrderReference {
    /// Generate a random 8-character uppercase alphanumeric reference.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let reference = (0..REFERENCE_LEN)
            .map(|_| char::from(REFERENCE_ALPHABET[rng.random_range(0..REFERENCE_ALPHABET.len())]))
            .collect();
        Self(reference)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A one-shot delayed callback that can be called off.
///
/// Dropping the timer cancels it.
#[derive(Debug)]
pub struct RedirectTimer {
    handle: JoinHandle<()>,
}

impl RedirectTimer {
    /// Run `on_fire` after `delay` on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(delay: Duration, on_fire: impl FnOnce() + Send + 'static) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire();
        });
        Self { handle }
    }

    /// Stop the timer if it has not fired yet.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Whether the timer fired or was cancelled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RedirectTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// What the confirmation screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationView {
    pub reference: OrderReference,
    pub confirmed_at: DateTime<Utc>,
    pub redirect_in: Duration,
}

/// A visit to the confirmation screen.
#[derive(Debug)]
pub struct Confirmation {
    reference: OrderReference,
    confirmed_at: DateTime<Utc>,
    delay: Duration,
    timer: RedirectTimer,
}

impl Confirmation {
    /// Enter the confirmation screen: clear the cart and start the redirect
    /// back to the catalog.
    pub fn enter(store: &mut CartStore, on_redirect: impl FnOnce() + Send + 'static) -> Self {
        Self::enter_with_delay(store, REDIRECT_DELAY, on_redirect)
    }

    /// Like [`enter`](Self::enter) with a custom redirect delay.
    pub fn enter_with_delay(
        store: &mut CartStore,
        delay: Duration,
        on_redirect: impl FnOnce() + Send + 'static,
    ) -> Self {
        store.clear();

        let reference = OrderReference::generate();
        tracing::info!(%reference, "Order confirmed");

        Self {
            reference,
            confirmed_at: Utc::now(),
            delay,
            timer: RedirectTimer::start(delay, on_redirect),
        }
    }

    #[must_use]
    pub const fn reference(&self) -> &OrderReference {
        &self.reference
    }

    /// Data for (re-)drawing the screen. Never touches the cart.
    #[must_use]
    pub fn render(&self) -> ConfirmationView {
        ConfirmationView {
            reference: self.reference.clone(),
            confirmed_at: self.confirmed_at,
            redirect_in: self.delay,
        }
    }

    /// The shopper navigated away; the redirect will not fire.
    pub fn leave(self) {
        self.timer.cancel();
    }
}
