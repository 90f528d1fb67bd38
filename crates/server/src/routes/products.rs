//! Product route handlers.
//!
//! Public reads serve active products only; admin endpoints see everything
//! and drive the multipart create/update flow with variant reconciliation.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use telar_core::{CategoryId, ImageId, ProductId};

use crate::db::ProductRepository;
use crate::db::products::ProductFilter;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::ProductDetail;
use crate::services::products::{
    ProductPayload, ProductService, UploadedImage, parse_image_field,
};
use crate::state::AppState;

/// Query parameters for the public product listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<CategoryId>,
    pub gender: Option<String>,
    pub q: Option<String>,
}

/// List active products with variants and images.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProductDetail>>> {
    let filter = ProductFilter {
        include_inactive: false,
        category_id: query.category,
        gender: query.gender,
        query: query.q,
    };

    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(products))
}

/// Get one active product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    let product = ProductRepository::new(state.pool())
        .get_detail(id, false)
        .await?
        .ok_or_else(|| AppError::NotFound("Producto no encontrado".to_owned()))?;

    Ok(Json(product))
}

/// List all products including inactive ones (admin).
#[instrument(skip(state))]
pub async fn admin_index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductDetail>>> {
    let filter = ProductFilter {
        include_inactive: true,
        ..ProductFilter::default()
    };

    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(products))
}

/// Create a product from a multipart request (admin).
///
/// Expects a `payload` JSON part plus image file parts named
/// `variants[i][images][j]`.
#[instrument(skip(state, multipart))]
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>)> {
    let (payload, files) = read_product_multipart(multipart).await?;

    let service = product_service(&state);
    let product_id = service.create(&payload, files).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Producto creado",
            "product_id": product_id,
        })),
    ))
}

/// Update a product from a multipart request, reconciling variants (admin).
#[instrument(skip(state, multipart))]
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Json<Value>> {
    let (payload, files) = read_product_multipart(multipart).await?;

    let service = product_service(&state);
    service.update(id, &payload, files).await?;

    Ok(Json(json!({ "message": "Producto actualizado" })))
}

/// Deactivate a product (admin soft delete).
#[instrument(skip(state))]
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Value>> {
    let service = product_service(&state);
    service.deactivate(id).await?;

    Ok(Json(json!({ "message": "Producto desactivado" })))
}

/// Delete one product image: the database row and the file on disk (admin).
#[instrument(skip(state))]
pub async fn remove_image(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path((product_id, image_id)): Path<(ProductId, ImageId)>,
) -> Result<Json<Value>> {
    let service = product_service(&state);
    service.delete_image(product_id, image_id).await?;

    Ok(Json(json!({ "message": "Imagen eliminada" })))
}

/// Build the product service from request state.
fn product_service(state: &AppState) -> ProductService<'_> {
    ProductService::new(
        state.pool(),
        state.email(),
        &state.config().upload_dir,
        &state.config().admin_email,
        state.config().low_stock_threshold,
    )
}

/// Pull the `payload` JSON part and the `variants[i][images][j]` file parts
/// out of a multipart request.
async fn read_product_multipart(
    mut multipart: Multipart,
) -> Result<(ProductPayload, Vec<UploadedImage>)> {
    let mut payload: Option<ProductPayload> = None;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("multipart inválido: {e}")))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == "payload" {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("payload ilegible: {e}")))?;
            payload = Some(
                serde_json::from_str(&text)
                    .map_err(|e| AppError::BadRequest(format!("payload inválido: {e}")))?,
            );
        } else if let Some((variant_index, _image_index)) = parse_image_field(&name) {
            let file_name = field
                .file_name()
                .map_or_else(|| "image".to_owned(), str::to_owned);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("archivo ilegible: {e}")))?;

            files.push(UploadedImage {
                variant_index,
                file_name,
                bytes: bytes.to_vec(),
            });
        }
        // Unknown fields are ignored
    }

    let payload =
        payload.ok_or_else(|| AppError::BadRequest("Falta la parte 'payload'".to_owned()))?;

    Ok((payload, files))
}
