//! HTTP route handlers for the backend.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /products               - Full product catalog (JSON)
//! POST /create-payment-intent  - Server-priced Stripe payment intent
//! ```

pub mod payment_intent;
pub mod products;

use axum::{
    Router,
    body::Body,
    http::{Request, Uri},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::middleware;
use crate::state::AppState;

/// Create the API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/create-payment-intent", post(payment_intent::create))
}

/// Build the complete application: routes, health check and middleware.
///
/// Sentry layers are added by the binary so tests can build the app without
/// an initialised Sentry client.
pub fn app(state: AppState) -> Router {
    let cors = middleware::cors_layer(state.config().allowed_origin.as_deref());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .fallback(not_found)
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .layer(cors)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. The backend has no dependencies
/// worth probing: the catalog is in memory and Stripe is called per request.
async fn health() -> &'static str {
    "ok"
}

/// JSON 404 for unknown paths.
async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::http::{StatusCode, header};
    use secrecy::SecretString;
    use tower::ServiceExt;
    use woolery_core::wire::ErrorBody;
    use woolery_core::{Catalog, Cents, Product};

    use super::*;
    use crate::config::{ServerConfig, StripeConfig};
    use crate::payments::{PaymentIntent, PaymentProcessor, ProcessorError};
    use crate::pricing::UnknownProductPolicy;

    /// Records every amount it is asked to charge.
    #[derive(Default)]
    struct RecordingProcessor {
        amounts: Mutex<Vec<Cents>>,
        fail: bool,
    }

    #[async_trait]
    impl PaymentProcessor for RecordingProcessor {
        async fn create_intent(
            &self,
            amount: Cents,
            _currency: &str,
        ) -> Result<PaymentIntent, ProcessorError> {
            if self.fail {
                return Err(ProcessorError::Rejected {
                    status: 401,
                    message: "Invalid API Key provided".to_string(),
                });
            }
            self.amounts.lock().unwrap().push(amount);
            Ok(PaymentIntent {
                id: "pi_test".to_string(),
                amount,
                client_secret: SecretString::from(format!("pi_test_secret_{}", amount.as_u64())),
            })
        }
    }

    fn test_config(policy: UnknownProductPolicy) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".parse().unwrap(),
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

    fn test_app(processor: Arc<RecordingProcessor>, policy: UnknownProductPolicy) -> Router {
        let mut products = Catalog::standard().into_products();
        if let Some(sweater) = products.first_mut() {
            sweater.price = Cents::new(6999);
        }
        app(AppState::with_parts(
            test_config(policy),
            Catalog::new(products),
            processor,
        ))
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/create-payment-intent")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_products_returns_catalog() {
        let app = test_app(Arc::default(), UnknownProductPolicy::Reject);
        let response = app
            .oneshot(Request::builder().uri("/products").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let products: Vec<Product> = read_json(response).await;
        assert_eq!(products.len(), 8);
    }

    #[tokio::test]
    async fn test_intent_total_ignores_client_price() {
        let processor = Arc::new(RecordingProcessor::default());
        let app = test_app(processor.clone(), UnknownProductPolicy::Reject);

        let response = app
            .oneshot(post_json(r#"{"items":[{"id":"1","quantity":2,"price":1}]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["clientSecret"], "pi_test_secret_13998");
        assert_eq!(*processor.amounts.lock().unwrap(), vec![Cents::new(13998)]);
    }

    #[tokio::test]
    async fn test_unknown_product_rejected() {
        let processor = Arc::new(RecordingProcessor::default());
        let app = test_app(processor.clone(), UnknownProductPolicy::Reject);

        let response = app
            .oneshot(post_json(r#"{"items":[{"id":"1","quantity":1},{"id":"999","quantity":4}]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = read_json(response).await;
        assert_eq!(body.error, "Unknown product: 999");
        assert!(processor.amounts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_contributes_zero_under_legacy_policy() {
        let processor = Arc::new(RecordingProcessor::default());
        let app = test_app(processor.clone(), UnknownProductPolicy::ContributeZero);

        let response = app
            .oneshot(post_json(r#"{"items":[{"id":"2","quantity":1},{"id":"999","quantity":4}]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*processor.amounts.lock().unwrap(), vec![Cents::new(1999)]);
    }

    #[tokio::test]
    async fn test_malformed_body_is_generic_server_error() {
        let processor = Arc::new(RecordingProcessor::default());
        let app = test_app(processor.clone(), UnknownProductPolicy::Reject);

        let response = app.oneshot(post_json(r#"{"cart":[]}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = read_json(response).await;
        assert_eq!(body.error, crate::error::GENERIC_ERROR);
        assert!(processor.amounts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_orders_are_generic_server_errors() {
        let processor = Arc::new(RecordingProcessor::default());
        let app = test_app(processor.clone(), UnknownProductPolicy::ContributeZero);

        for body in [
            r#"{"items":[]}"#,
            r#"{"items":[{"id":"1","quantity":0}]}"#,
            r#"{"items":[{"id":"1","quantity":-1}]}"#,
            r#"{"items":[{"id":"zz","quantity":1}]}"#,
        ] {
            let response = app.clone().oneshot(post_json(body)).await.unwrap();

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{body}");
            let error: ErrorBody = read_json(response).await;
            assert_eq!(error.error, crate::error::GENERIC_ERROR, "{body}");
        }
        assert!(processor.amounts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_processor_failure_is_generic_server_error() {
        let processor = Arc::new(RecordingProcessor {
            fail: true,
            ..RecordingProcessor::default()
        });
        let app = test_app(processor, UnknownProductPolicy::Reject);

        let response = app
            .oneshot(post_json(r#"{"items":[{"id":"1","quantity":1}]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = read_json(response).await;
        assert_eq!(body.error, crate::error::GENERIC_ERROR);
    }

    #[tokio::test]
    async fn test_health_and_not_found() {
        let app = test_app(Arc::default(), UnknownProductPolicy::Reject);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/orders").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
