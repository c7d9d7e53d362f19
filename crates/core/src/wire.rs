//! Request and response bodies exchanged between the client and the backend.
//!
//! ```text
//! GET  /products               -> [Product]
//! POST /create-payment-intent  { items: [{ id, quantity }] }
//!                              -> { clientSecret } | { error }
//! ```

use serde::{Deserialize, Serialize};

use crate::ProductId;

/// One `(product id, quantity)` pair to be priced by the backend.
///
/// Unknown fields (such as a client-supplied `price`) are ignored on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeItem {
    pub id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /create-payment-intent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub items: Vec<ChargeItem>,
}

/// Successful response of `POST /create-payment-intent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentResponse {
    pub client_secret: String,
}

/// Error body returned by every failing backend endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ignores_client_prices() {
        let body = r#"{"items":[{"id":"1","quantity":2,"price":1}]}"#;
        let request: CreatePaymentIntentRequest = serde_json::from_str(body).unwrap();
        assert_eq!(
            request.items,
            vec![ChargeItem {
                id: ProductId::new("1"),
                quantity: 2
            }]
        );
    }

    #[test]
    fn test_response_uses_client_secret_key() {
        let response = CreatePaymentIntentResponse {
            client_secret: "pi_1_secret_2".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"clientSecret":"pi_1_secret_2"}"#);
    }
}
