//! Reference table domain types: colors, categories, brands, suppliers.

use serde::Serialize;

use telar_core::{BrandId, CategoryId, ColorId, SupplierId};

/// A garment color.
#[derive(Debug, Clone, Serialize)]
pub struct Color {
    pub id: ColorId,
    pub name: String,
}

/// A product category (e.g. "Poleras", "Pantalones").
///
/// `size_type` selects which size chart applies to variants in the category
/// (letter sizes, numeric sizes, shoe sizes).
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub size_type: String,
}

/// A clothing brand.
#[derive(Debug, Clone, Serialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
}

/// A garment supplier.
#[derive(Debug, Clone, Serialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}
