//! Cart route handlers.
//!
//! Every quantity the cart persists is clamped to the variant's current
//! stock; the add endpoint reports how much of the request actually landed.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use telar_core::{CartItemId, VariantId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::cart::CartItemDetail;
use crate::services::cart::{CartService, GuestItem};
use crate::state::AppState;

/// Add-to-cart payload.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub variant_id: VariantId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

/// Sync payload: the guest cart held in browser storage.
#[derive(Debug, Deserialize)]
pub struct SyncCartRequest {
    #[serde(default)]
    pub items: Vec<GuestItem>,
}

/// Update payload for one cart line.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// Get the authenticated user's cart.
#[instrument(skip(state))]
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<CartItemDetail>>> {
    let carts = CartService::new(state.pool());
    let items = carts.items(user.id).await?;
    Ok(Json(items))
}

/// Add a variant to the cart, clamping the resulting quantity to stock.
///
/// The response reports the quantity actually added, which is less than
/// requested when stock runs short.
#[instrument(skip(state))]
pub async fn add(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<AddToCartRequest>,
) -> Result<Json<Value>> {
    let carts = CartService::new(state.pool());
    let outcome = carts.add(user.id, body.variant_id, body.quantity).await?;

    let message = if outcome.added == 0 {
        "Sin stock disponible"
    } else {
        "Item agregado al carrito"
    };

    Ok(Json(json!({
        "message": message,
        "added": outcome.added,
        "quantity": outcome.quantity,
    })))
}

/// Merge the guest cart into the server cart (login sync).
///
/// Per variant the persisted quantity is the maximum of the local and server
/// quantities (not the sum), clamped to stock.
#[instrument(skip(state, body))]
pub async fn sync(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<SyncCartRequest>,
) -> Result<Json<Vec<CartItemDetail>>> {
    let carts = CartService::new(state.pool());
    let items = carts.sync(user.id, &body.items).await?;
    Ok(Json(items))
}

/// Set the quantity of a cart line (0 removes it).
#[instrument(skip(state))]
pub async fn update_item(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(item_id): Path<CartItemId>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<Value>> {
    let carts = CartService::new(state.pool());
    let quantity = carts.set_quantity(user.id, item_id, body.quantity).await?;

    Ok(Json(json!({
        "message": "Carrito actualizado",
        "quantity": quantity,
    })))
}

/// Remove a cart line.
#[instrument(skip(state))]
pub async fn remove_item(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<Value>> {
    let carts = CartService::new(state.pool());
    carts.remove(user.id, item_id).await?;

    Ok(Json(json!({ "message": "Item eliminado del carrito" })))
}

/// Remove every line in the cart.
#[instrument(skip(state))]
pub async fn clear(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Value>> {
    let carts = CartService::new(state.pool());
    carts.clear(user.id).await?;

    Ok(Json(json!({ "message": "Carrito vaciado" })))
}
