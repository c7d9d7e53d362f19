//! Integration tests for Woolery.
//!
//! [`TestServer`] runs the real backend router on an ephemeral port with a
//! [`RecordingProcessor`] standing in for Stripe, so the storefront client can
//! be driven end to end without network access.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p woolery-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::task::JoinHandle;
use url::Url;
use woolery_core::{Catalog, Cents};
use woolery_server::config::{ServerConfig, StripeConfig};
use woolery_server::payments::{PaymentIntent, PaymentProcessor, ProcessorError};
use woolery_server::pricing::UnknownProductPolicy;
use woolery_server::{AppState, app};

/// Payment processor that records every amount it is asked to charge.
#[derive(Debug, Default)]
pub struct RecordingProcessor {
    amounts: Mutex<Vec<Cents>>,
    failing: AtomicBool,
}

impl RecordingProcessor {
    /// Amounts of every intent created so far, oldest first.
    #[must_use]
    pub fn amounts(&self) -> Vec<Cents> {
        self.amounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make intent creation fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentProcessor for RecordingProcessor {
    async fn create_intent(
        &self,
        amount: Cents,
        _currency: &str,
    ) -> Result<PaymentIntent, ProcessorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProcessorError::Rejected {
                status: 401,
                message: "Invalid API Key provided: sk_test_****".to_string(),
            });
        }

        let mut amounts = self.amounts.lock().unwrap_or_else(PoisonError::into_inner);
        amounts.push(amount);
        let id = format!("pi_test{}", amounts.len());
        Ok(PaymentIntent {
            client_secret: SecretString::from(format!("{id}_secret_{}", amount.as_u64())),
            id,
            amount,
        })
    }
}

/// A backend served on `127.0.0.1:0` for the duration of a test.
#[derive(Debug)]
pub struct TestServer {
    addr: SocketAddr,
    processor: Arc<RecordingProcessor>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Serve the standard catalog, rejecting unknown products.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        Self::spawn_with(Catalog::standard(), UnknownProductPolicy::Reject).await
    }

    /// Serve `catalog` with the given unknown-product policy.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn_with(catalog: Catalog, policy: UnknownProductPolicy) -> Self {
        let processor = Arc::new(RecordingProcessor::default());
        let state = AppState::with_parts(test_config(policy), catalog, processor.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app(state)).await {
                tracing_error(&e);
            }
        });

        Self {
            addr,
            processor,
            handle,
        }
    }

    /// Base URL of the running backend.
    ///
    /// # Panics
    ///
    /// Never in practice; the address always forms a valid URL.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("Socket address is a valid URL")
    }

    /// The processor standing in for Stripe.
    #[must_use]
    pub fn processor(&self) -> &RecordingProcessor {
        &self.processor
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn test_config(policy: UnknownProductPolicy) -> ServerConfig {
    ServerConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        stripe: StripeConfig {
            secret_key: SecretString::from("sk_test_unused"),
            api_base: "http://127.0.0.1:9".to_string(),
        },
        currency: "usd".to_string(),
        unknown_product_policy: policy,
        allowed_origin: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_traces_sample_rate: 0.0,
    }
}

#[allow(clippy::print_stderr)]
fn tracing_error(error: &std::io::Error) {
    eprintln!("test server stopped: {error}");
}
