//! Reference table route handlers: colors, categories, brands, suppliers.
//!
//! Reads are public; writes require an admin. Deleting a row that catalog
//! data still references fails with 400 and a count in the message.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use telar_core::{BrandId, CategoryId, ColorId, SupplierId};

use crate::db::{BrandRepository, CategoryRepository, ColorRepository, SupplierRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Brand, Category, Color, Supplier};
use crate::state::AppState;

/// Payload for colors and brands (name only).
#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

/// Payload for categories.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    pub size_type: String,
}

/// Payload for suppliers.
#[derive(Debug, Deserialize)]
pub struct SupplierRequest {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("El nombre es obligatorio".to_owned()));
    }
    Ok(())
}

// =============================================================================
// Colors
// =============================================================================

/// List colors.
#[instrument(skip(state))]
pub async fn list_colors(State(state): State<AppState>) -> Result<Json<Vec<Color>>> {
    Ok(Json(ColorRepository::new(state.pool()).list().await?))
}

/// Create a color (admin).
#[instrument(skip(state))]
pub async fn create_color(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<NameRequest>,
) -> Result<Json<Color>> {
    validate_name(&body.name)?;
    let color = ColorRepository::new(state.pool())
        .create(body.name.trim())
        .await?;
    Ok(Json(color))
}

/// Rename a color (admin).
#[instrument(skip(state))]
pub async fn update_color(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ColorId>,
    Json(body): Json<NameRequest>,
) -> Result<Json<Value>> {
    validate_name(&body.name)?;
    ColorRepository::new(state.pool())
        .update(id, body.name.trim())
        .await?;
    Ok(Json(json!({ "message": "Color actualizado" })))
}

/// Delete a color (admin). Refused while variants reference it.
#[instrument(skip(state))]
pub async fn delete_color(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ColorId>,
) -> Result<Json<Value>> {
    let repo = ColorRepository::new(state.pool());

    let usage = repo.usage_count(id).await?;
    if usage > 0 {
        return Err(AppError::BadRequest(format!(
            "No se puede eliminar: el color está siendo usado por {usage} variante(s)"
        )));
    }

    repo.delete(id).await?;
    Ok(Json(json!({ "message": "Color eliminado" })))
}

// =============================================================================
// Categories
// =============================================================================

/// List categories.
#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(CategoryRepository::new(state.pool()).list().await?))
}

/// Create a category (admin).
#[instrument(skip(state))]
pub async fn create_category(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<Category>> {
    validate_name(&body.name)?;
    let category = CategoryRepository::new(state.pool())
        .create(body.name.trim(), &body.size_type)
        .await?;
    Ok(Json(category))
}

/// Update a category (admin).
#[instrument(skip(state))]
pub async fn update_category(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<Value>> {
    validate_name(&body.name)?;
    CategoryRepository::new(state.pool())
        .update(id, body.name.trim(), &body.size_type)
        .await?;
    Ok(Json(json!({ "message": "Categoría actualizada" })))
}

/// Delete a category (admin). Refused while products reference it.
#[instrument(skip(state))]
pub async fn delete_category(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Value>> {
    let repo = CategoryRepository::new(state.pool());

    let usage = repo.usage_count(id).await?;
    if usage > 0 {
        return Err(AppError::BadRequest(format!(
            "No se puede eliminar: la categoría está siendo usada por {usage} producto(s)"
        )));
    }

    repo.delete(id).await?;
    Ok(Json(json!({ "message": "Categoría eliminada" })))
}

// =============================================================================
// Brands
// =============================================================================

/// List brands.
#[instrument(skip(state))]
pub async fn list_brands(State(state): State<AppState>) -> Result<Json<Vec<Brand>>> {
    Ok(Json(BrandRepository::new(state.pool()).list().await?))
}

/// Create a brand (admin).
#[instrument(skip(state))]
pub async fn create_brand(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<NameRequest>,
) -> Result<Json<Brand>> {
    validate_name(&body.name)?;
    let brand = BrandRepository::new(state.pool())
        .create(body.name.trim())
        .await?;
    Ok(Json(brand))
}

/// Rename a brand (admin).
#[instrument(skip(state))]
pub async fn update_brand(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<BrandId>,
    Json(body): Json<NameRequest>,
) -> Result<Json<Value>> {
    validate_name(&body.name)?;
    BrandRepository::new(state.pool())
        .update(id, body.name.trim())
        .await?;
    Ok(Json(json!({ "message": "Marca actualizada" })))
}

/// Delete a brand (admin). Refused while products reference it.
#[instrument(skip(state))]
pub async fn delete_brand(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<BrandId>,
) -> Result<Json<Value>> {
    let repo = BrandRepository::new(state.pool());

    let usage = repo.usage_count(id).await?;
    if usage > 0 {
        return Err(AppError::BadRequest(format!(
            "No se puede eliminar: la marca está siendo usada por {usage} producto(s)"
        )));
    }

    repo.delete(id).await?;
    Ok(Json(json!({ "message": "Marca eliminada" })))
}

// =============================================================================
// Suppliers
// =============================================================================

/// List suppliers (admin only; supplier contact data is back-office data).
#[instrument(skip(state))]
pub async fn list_suppliers(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Supplier>>> {
    Ok(Json(SupplierRepository::new(state.pool()).list().await?))
}

/// Create a supplier (admin).
#[instrument(skip(state))]
pub async fn create_supplier(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<SupplierRequest>,
) -> Result<Json<Supplier>> {
    validate_name(&body.name)?;
    let supplier = SupplierRepository::new(state.pool())
        .create(body.name.trim(), body.phone.as_deref(), body.email.as_deref())
        .await?;
    Ok(Json(supplier))
}

/// Update a supplier (admin).
#[instrument(skip(state))]
pub async fn update_supplier(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<SupplierId>,
    Json(body): Json<SupplierRequest>,
) -> Result<Json<Value>> {
    validate_name(&body.name)?;
    SupplierRepository::new(state.pool())
        .update(
            id,
            body.name.trim(),
            body.phone.as_deref(),
            body.email.as_deref(),
        )
        .await?;
    Ok(Json(json!({ "message": "Proveedor actualizado" })))
}

/// Delete a supplier (admin). Refused while products reference it.
#[instrument(skip(state))]
pub async fn delete_supplier(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<SupplierId>,
) -> Result<Json<Value>> {
    let repo = SupplierRepository::new(state.pool());

    let usage = repo.usage_count(id).await?;
    if usage > 0 {
        return Err(AppError::BadRequest(format!(
            "No se puede eliminar: el proveedor está siendo usado por {usage} producto(s)"
        )));
    }

    repo.delete(id).await?;
    Ok(Json(json!({ "message": "Proveedor eliminado" })))
}
