//! Client-side payment confirmation.
//!
//! The backend creates the intent; the storefront confirms it with the
//! publishable key and the intent's client secret. Processor messages are
//! surfaced verbatim so shoppers see exactly why a card was declined.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

/// Errors confirming a payment.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The processor declined or rejected the payment; message is verbatim.
    #[error("{message}")]
    Declined {
        /// Processor-provided message.
        message: String,
    },

    /// The payment needs a browser-based authentication step.
    #[error("This payment needs additional authentication. Please complete it in a browser.")]
    ActionRequired,

    /// The client secret is not shaped like a payment intent secret.
    #[error("The payment session is invalid. Please reload checkout.")]
    InvalidSecret,

    /// The processor could not be reached.
    #[error("Could not reach the payment processor: {0}")]
    Network(#[from] reqwest::Error),
}

/// Something that can confirm a payment intent.
#[async_trait]
pub trait PaymentConfirmer: Send + Sync {
    /// Confirm the intent identified by `client_secret` with
    /// `payment_method`, returning to `return_url` after any redirect.
    async fn confirm(
        &self,
        client_secret: &SecretString,
        payment_method: &str,
        return_url: &str,
    ) -> Result<(), PaymentError>;
}

/// Confirms intents against the Stripe API with a publishable key.
#[derive(Debug, Clone)]
pub struct StripeConfirmer {
    http: reqwest::Client,
    api_base: String,
    publishable_key: String,
}

#[derive(Deserialize)]
struct ConfirmedIntent {
    status: String,
    last_payment_error: Option<StripeErrorDetail>,
}

#[derive(Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeConfirmer {
    /// Create a confirmer for the Stripe API at `api_base`.
    #[must_use]
    pub fn new(api_base: impl Into<String>, publishable_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            publishable_key: publishable_key.into(),
        }
    }
}

#[async_trait]
impl PaymentConfirmer for StripeConfirmer {
    #[instrument(skip(self, client_secret))]
    async fn confirm(
        &self,
        client_secret: &SecretString,
        payment_method: &str,
        return_url: &str,
    ) -> Result<(), PaymentError> {
        let secret = client_secret.expose_secret();
        let intent_id = intent_id(secret).ok_or(PaymentError::InvalidSecret)?;

        let response = self
            .http
            .post(format!(
                "{}/v1/payment_intents/{intent_id}/confirm",
                self.api_base
            ))
            .bearer_auth(&self.publishable_key)
            .form(&[
                ("client_secret", secret),
                ("payment_method", payment_method),
                ("return_url", return_url),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<StripeErrorEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.error.message)
                .unwrap_or_else(|| format!("Payment failed ({status})"));
            tracing::info!(%message, "Payment declined");
            return Err(PaymentError::Declined { message });
        }

        let intent: ConfirmedIntent =
            serde_json::from_str(&body).map_err(|e| PaymentError::Declined {
                message: format!("Unexpected response from the payment processor: {e}"),
            })?;

        interpret_status(intent)
    }
}

/// The intent id is the part of the client secret before `_secret_`.
fn intent_id(client_secret: &str) -> Option<&str> {
    client_secret
        .split_once("_secret_")
        .map(|(id, _)| id)
        .filter(|id| id.starts_with("pi_"))
}

fn interpret_status(intent: ConfirmedIntent) -> Result<(), PaymentError> {
    match intent.status.as_str() {
        "succeeded" | "processing" | "requires_capture" => Ok(()),
        "requires_action" => Err(PaymentError::ActionRequired),
        other => Err(PaymentError::Declined {
            message: intent
                .last_payment_error
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("Payment not completed (status: {other})")),
        }),
    }
}
