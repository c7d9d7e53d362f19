//! Stripe payment intents API client.
//!
//! Uses `reqwest` with form-encoded bodies, as the Stripe REST API expects.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;
use woolery_core::Cents;

use super::{PaymentIntent, PaymentProcessor, ProcessorError};
use crate::config::StripeConfig;

/// Client for the Stripe payment intents API.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    endpoint: String,
    secret_key: SecretString,
}

/// The fields we read from a Stripe `PaymentIntent` object.
#[derive(Deserialize)]
struct StripePaymentIntent {
    id: String,
    amount: u64,
    client_secret: Option<String>,
}

/// Stripe's error envelope: `{ "error": { "message": ..., "type": ... } }`.
#[derive(Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl StripeClient {
    /// Create a new Stripe client.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            inner: Arc::new(StripeClientInner {
                client: reqwest::Client::new(),
                endpoint: format!("{}/v1/payment_intents", config.api_base),
                secret_key: config.secret_key.clone(),
            }),
        }
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    #[instrument(skip(self))]
    async fn create_intent(
        &self,
        amount: Cents,
        currency: &str,
    ) -> Result<PaymentIntent, ProcessorError> {
        let amount_param = amount.as_u64().to_string();
        let form = [
            ("amount", amount_param.as_str()),
            ("currency", currency),
            ("automatic_payment_methods[enabled]", "true"),
        ];

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .bearer_auth(self.inner.secret_key.expose_secret())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = parse_error_message(&body);
            tracing::error!(status = %status, message = %message, "Stripe rejected payment intent");
            return Err(ProcessorError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let intent: StripePaymentIntent = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Stripe payment intent"
            );
            ProcessorError::Malformed(e.to_string())
        })?;

        let client_secret = intent
            .client_secret
            .ok_or_else(|| ProcessorError::Malformed("missing client_secret".to_string()))?;

        tracing::debug!(intent_id = %intent.id, "Stripe payment intent created");

        Ok(PaymentIntent {
            id: intent.id,
            amount: Cents::new(intent.amount),
            client_secret: SecretString::from(client_secret),
        })
    }
}

/// Pull a human-readable message out of a Stripe error body.
fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<StripeErrorEnvelope>(body).map_or_else(
        |_| body.chars().take(200).collect(),
        |envelope| {
            envelope
                .error
                .message
                .or(envelope.error.kind)
                .unwrap_or_else(|| "(no error details provided)".to_string())
        },
    )
}
