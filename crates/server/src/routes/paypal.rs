//! PayPal checkout route handlers.
//!
//! The backend constructs the Orders v2 request and relays PayPal's result;
//! the SPA drives the approval flow and calls `/orders/confirm-payment`
//! once the capture completes.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Payload for creating a PayPal order.
#[derive(Debug, Deserialize)]
pub struct CreatePayPalOrderRequest {
    pub amount: Decimal,
}

/// Payload for capturing a PayPal order.
#[derive(Debug, Deserialize)]
pub struct CapturePayPalOrderRequest {
    pub paypal_order_id: String,
}

/// Create a PayPal checkout order for an amount.
#[instrument(skip(state, body))]
pub async fn create_order(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<CreatePayPalOrderRequest>,
) -> Result<Json<Value>> {
    if body.amount <= Decimal::ZERO {
        return Err(AppError::BadRequest(
            "El monto debe ser mayor que cero".to_owned(),
        ));
    }

    let frontend = &state.config().frontend_url;
    let return_url = format!("{frontend}/checkout/success");
    let cancel_url = format!("{frontend}/checkout/cancel");

    let order = state
        .paypal()
        .create_order(body.amount, &return_url, &cancel_url)
        .await?;

    Ok(Json(json!({
        "id": order.id,
        "status": order.status,
        "approve_url": order.approve_url(),
    })))
}

/// Capture an approved PayPal order and relay the result.
#[instrument(skip(state, body))]
pub async fn capture_order(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<CapturePayPalOrderRequest>,
) -> Result<Json<Value>> {
    let capture = state.paypal().capture_order(&body.paypal_order_id).await?;

    Ok(Json(json!({
        "id": capture.id,
        "status": capture.status,
        "completed": capture.is_completed(),
    })))
}
