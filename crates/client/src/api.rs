//! HTTP client for the Woolery backend.
//!
//! Two calls, each a single in-flight request with no automatic retry:
//! fetching the catalog and creating a payment intent.

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;
use tracing::instrument;
use url::Url;
use woolery_core::Product;
use woolery_core::wire::{CreatePaymentIntentRequest, CreatePaymentIntentResponse, ErrorBody};

/// Errors talking to the backend.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The request never produced a response.
    #[error("Could not reach the store: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error status.
    #[error("The store returned an error ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the backend's error body.
        message: String,
    },

    /// The configured backend URL cannot be joined with an API path.
    #[error("Invalid store URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Source of payment intents for a cart snapshot.
#[async_trait]
pub trait IntentSource: Send + Sync {
    /// Ask the backend to price `request` and create an intent for it,
    /// returning the intent's client secret.
    async fn create_payment_intent(
        &self,
        request: &CreatePaymentIntentRequest,
    ) -> Result<SecretString, NetworkError>;
}

/// Client for the backend's JSON API.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a client for the backend at `base_url`.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// The backend base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the full product catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError`] if the backend is unreachable or responds
    /// with an error.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn products(&self) -> Result<Vec<Product>, NetworkError> {
        let response = self.http.get(self.endpoint("products")?).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    fn endpoint(&self, path: &str) -> Result<Url, NetworkError> {
        // Keep any path prefix on the base URL (e.g. https://host/api/)
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        Ok(base.join(path)?)
    }
}

#[async_trait]
impl IntentSource for BackendClient {
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    async fn create_payment_intent(
        &self,
        request: &CreatePaymentIntentRequest,
    ) -> Result<SecretString, NetworkError> {
        let response = self
            .http
            .post(self.endpoint("create-payment-intent")?)
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: CreatePaymentIntentResponse = response.json().await?;
        Ok(SecretString::from(body.client_secret))
    }
}

/// Turn a non-success response into [`NetworkError::Status`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, NetworkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Unknown error").to_string());

    tracing::warn!(status = %status, message = %message, "Backend request failed");
    Err(NetworkError::Status {
        status: status.as_u16(),
        message,
    })
}
