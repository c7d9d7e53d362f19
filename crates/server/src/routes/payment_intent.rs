//! Payment intent creation.
//!
//! The client sends `(product id, quantity)` pairs only. The total is
//! recomputed here from the server catalog before Stripe is asked for an
//! intent, so a tampered client can never lower the price it is charged.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use secrecy::ExposeSecret;
use tracing::instrument;
use woolery_core::wire::{CreatePaymentIntentRequest, CreatePaymentIntentResponse};

use crate::error::{AppError, Result};
use crate::pricing;
use crate::state::AppState;

/// Create a payment intent for a server-priced order.
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreatePaymentIntentRequest>, JsonRejection>,
) -> Result<Json<CreatePaymentIntentResponse>> {
    let Json(request) = payload.map_err(|e| AppError::MalformedRequest(e.body_text()))?;

    let amount = pricing::price_order(
        state.catalog(),
        &request.items,
        state.config().unknown_product_policy,
    )
    .inspect_err(|e| tracing::info!(error = %e, "Order rejected by pricing"))?;

    let intent = state
        .processor()
        .create_intent(amount, &state.config().currency)
        .await?;

    tracing::info!(
        intent_id = %intent.id,
        amount = %amount,
        items = request.items.len(),
        "Payment intent created"
    );

    Ok(Json(CreatePaymentIntentResponse {
        client_secret: intent.client_secret.expose_secret().to_owned(),
    }))
}
