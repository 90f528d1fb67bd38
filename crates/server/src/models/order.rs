//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use telar_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId, VariantId};

/// An order header.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub street: String,
    pub region: String,
    pub commune: String,
    pub postal_code: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An order line with the price captured at purchase time.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub variant_id: VariantId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// An order line joined with product/variant detail for display.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemDetail {
    pub id: OrderItemId,
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_name: String,
    pub color_name: String,
    pub size: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// An order with its lines and total.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
    pub total: Decimal,
}

/// Checkout payload for creating an order.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub street: String,
    pub region: String,
    pub commune: String,
    pub postal_code: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
}

/// One purchased line in a checkout payload.
///
/// The unit price is looked up server-side inside the order transaction;
/// clients never supply prices.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderItem {
    pub variant_id: VariantId,
    pub quantity: i32,
}
