//! Catalog search endpoint.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::ProductDetail;
use crate::state::AppState;

/// Query parameters for `/search`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Search active products.
///
/// Matches `%q%` case-insensitively against name, description, brand,
/// category and gender; results carry their active variants.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ProductDetail>>> {
    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("Falta el parámetro de búsqueda q".to_owned()))?;

    let products = ProductRepository::new(state.pool()).search(q).await?;
    Ok(Json(products))
}
