//! Order route handlers.
//!
//! Checkout runs inside one database transaction (order row + items + stock
//! decrements); the confirmation email happens after commit and never fails
//! the request.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use telar_core::{OrderId, OrderStatus};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::NewOrder;
use crate::models::order::OrderWithItems;
use crate::state::AppState;

/// Payload for confirming payment of an order.
#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub order_id: OrderId,
}

/// Payload for an admin status update.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Query parameters for the admin order listing.
#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub status: Option<String>,
}

/// Create an order from the checkout payload.
///
/// Requires a non-empty item list. The order, its items, the stock
/// decrements and the sales counters persist atomically; insufficient stock
/// rolls everything back with 409.
#[instrument(skip(state, body))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<NewOrder>,
) -> Result<(StatusCode, Json<Value>)> {
    if body.items.is_empty() {
        return Err(AppError::BadRequest(
            "El pedido no tiene productos".to_owned(),
        ));
    }
    if body.items.iter().any(|item| item.quantity <= 0) {
        return Err(AppError::BadRequest(
            "Las cantidades deben ser mayores que cero".to_owned(),
        ));
    }

    let orders = OrderRepository::new(state.pool());
    let order_id = orders.create(user.id, &body).await?;

    // Best-effort confirmation email, outside the transaction
    if let Some(email) = state.email() {
        match orders.get_with_items(order_id).await {
            Ok(Some(order)) => {
                if let Err(e) = email
                    .send_order_confirmation(&user.email, order_id, &order.items, order.total)
                    .await
                {
                    tracing::warn!(order_id = %order_id, "Confirmation email failed: {e}");
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(order_id = %order_id, "Could not load order for email: {e}");
            }
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Pedido creado",
            "order_id": order_id,
        })),
    ))
}

/// Mark an order as paid after the payment provider confirms capture.
#[instrument(skip(state))]
pub async fn confirm_payment(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<ConfirmPaymentRequest>,
) -> Result<Json<Value>> {
    let orders = OrderRepository::new(state.pool());

    // Customers may only confirm their own orders
    let order = orders
        .get_with_items(body.order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Pedido no encontrado".to_owned()))?;

    if order.order.user_id != user.id && !user.role.is_admin() {
        return Err(AppError::Forbidden("El pedido no te pertenece".to_owned()));
    }

    orders.mark_paid(body.order_id).await?;

    Ok(Json(json!({ "message": "Pago confirmado" })))
}

/// List the authenticated user's orders.
#[instrument(skip(state))]
pub async fn my_orders(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderWithItems>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// List all orders, optionally filtered by status (admin).
#[instrument(skip(state))]
pub async fn admin_index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Vec<OrderWithItems>>> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let orders = OrderRepository::new(state.pool()).list_all(status).await?;
    Ok(Json(orders))
}

/// Get one order with items (admin).
#[instrument(skip(state))]
pub async fn admin_show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderWithItems>> {
    let order = OrderRepository::new(state.pool())
        .get_with_items(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Pedido no encontrado".to_owned()))?;

    Ok(Json(order))
}

/// Set an order's status (admin).
///
/// Any status in the allow-list may follow any other; there is no state
/// machine.
#[instrument(skip(state))]
pub async fn admin_update_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Value>> {
    let status: OrderStatus = body
        .status
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Estado inválido: {}", body.status)))?;

    OrderRepository::new(state.pool())
        .update_status(id, status)
        .await?;

    Ok(Json(json!({ "message": "Estado actualizado" })))
}
