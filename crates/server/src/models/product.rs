//! Product, variant and image domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use telar_core::{BrandId, CategoryId, ColorId, ImageId, ProductId, SupplierId, VariantId};

/// A product (domain type).
///
/// Products own their variants; stock and price live on the variant, not
/// here.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub category_id: CategoryId,
    pub brand_id: BrandId,
    pub supplier_id: Option<SupplierId>,
    pub main_color_id: Option<ColorId>,
    /// Target audience label, free-form ("Hombre", "Mujer", "Unisex").
    pub gender: String,
    pub is_active: bool,
    /// Units sold across all orders.
    pub total_sales: i32,
    pub created_at: DateTime<Utc>,
}

/// A specific (color, size) combination of a product, with its own
/// price/stock/SKU.
#[derive(Debug, Clone, Serialize)]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub color_id: ColorId,
    pub size: String,
    pub price: Decimal,
    pub stock: i32,
    pub sku: Option<String>,
    pub is_active: bool,
}

/// An uploaded product image, grouped by color.
///
/// At most one image per (product, color) carries `is_main`; it is used as
/// the representative thumbnail.
#[derive(Debug, Clone, Serialize)]
pub struct ProductImage {
    pub id: ImageId,
    pub product_id: ProductId,
    pub color_id: ColorId,
    pub image_url: String,
    pub is_main: bool,
}

/// A product with reference names, variants and images attached, as served
/// by the catalog endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub category_name: String,
    pub brand_name: String,
    pub variants: Vec<ProductVariant>,
    pub images: Vec<ProductImage>,
}

/// Fields for creating a new product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category_id: CategoryId,
    pub brand_id: BrandId,
    pub supplier_id: Option<SupplierId>,
    pub main_color_id: Option<ColorId>,
    pub gender: String,
}

/// A variant as submitted by the admin UI on product create/update.
///
/// Carries a `variant_id` when the row already exists; new variants omit it
/// and are matched against stored rows by (color, size).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmittedVariant {
    pub variant_id: Option<VariantId>,
    pub color_id: ColorId,
    pub size: String,
    pub price: Decimal,
    pub stock: i32,
    pub sku: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

impl SubmittedVariant {
    /// Whether persisting this submission over `stored` would change anything.
    #[must_use]
    pub fn differs_from(&self, stored: &ProductVariant) -> bool {
        self.color_id != stored.color_id
            || self.size != stored.size
            || self.price != stored.price
            || self.stock != stored.stock
            || self.sku != stored.sku
            || self.is_active != stored.is_active
    }
}
