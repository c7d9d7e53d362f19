//! Payment processor integration.
//!
//! # Architecture
//!
//! - The backend only ever creates payment intents; confirmation happens on
//!   the client with the publishable key and the intent's client secret
//! - [`PaymentProcessor`] is the seam between routes and the processor so the
//!   HTTP layer can be exercised without network access
//! - [`StripeClient`] is the production implementation

mod stripe;

pub use stripe::StripeClient;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;
use woolery_core::Cents;

/// Errors that can occur when talking to the payment processor.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The processor refused the request.
    #[error("Processor rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status returned by the processor.
        status: u16,
        /// Processor-provided message.
        message: String,
    },

    /// The processor answered with something we could not read.
    #[error("Unexpected processor response: {0}")]
    Malformed(String),
}

/// A freshly created payment intent.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct PaymentIntent {
    /// Processor-side intent id (e.g. `pi_...`).
    pub id: String,
    /// Amount the intent was created for.
    pub amount: Cents,
    /// Secret handed to the client so it can confirm the payment.
    pub client_secret: SecretString,
}

impl std::fmt::Debug for PaymentIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentIntent")
            .field("id", &self.id)
            .field("amount", &self.amount)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Something that can create payment intents for a server-computed amount.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create an intent charging `amount` in `currency`.
    async fn create_intent(
        &self,
        amount: Cents,
        currency: &str,
    ) -> Result<PaymentIntent, ProcessorError>;
}
