//! Cart domain types.

use rust_decimal::Decimal;
use serde::Serialize;

use telar_core::{CartId, CartItemId, ProductId, UserId, VariantId};

/// A user's cart (one per account).
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
}

/// A cart line as stored.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: i32,
}

/// A cart line joined with product/variant detail for display.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemDetail {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub product_name: String,
    pub color_name: String,
    pub size: String,
    pub price: Decimal,
    /// Current variant stock, so the client can cap its quantity selector.
    pub stock: i32,
    pub quantity: i32,
    /// Main image for the item's (product, color), when one exists.
    pub image_url: Option<String>,
    pub line_total: Decimal,
}
