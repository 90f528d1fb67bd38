//! Admin reporting route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use crate::db::ReportsRepository;
use crate::db::reports::{
    DashboardMetrics, Granularity, LowStockVariant, PeriodSales, RegionSales, StatusCount,
    TopProduct,
};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Query parameters for the top-products report.
#[derive(Debug, Deserialize)]
pub struct TopProductsQuery {
    pub limit: Option<i64>,
}

/// Query parameters for the sales-by-period report.
#[derive(Debug, Deserialize)]
pub struct SalesByPeriodQuery {
    pub from: String,
    pub to: String,
    pub granularity: Option<String>,
}

/// Query parameters for the low-stock report.
#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i32>,
}

/// Headline dashboard metrics.
#[instrument(skip(state))]
pub async fn dashboard(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<DashboardMetrics>> {
    Ok(Json(ReportsRepository::new(state.pool()).dashboard().await?))
}

/// Best-selling products.
#[instrument(skip(state))]
pub async fn top_products(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<TopProductsQuery>,
) -> Result<Json<Vec<TopProduct>>> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let rows = ReportsRepository::new(state.pool())
        .top_products(limit)
        .await?;
    Ok(Json(rows))
}

/// Revenue bucketed by day or month.
#[instrument(skip(state))]
pub async fn sales_by_period(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<SalesByPeriodQuery>,
) -> Result<Json<Vec<PeriodSales>>> {
    let from = parse_date(&query.from)?;
    let to = parse_date(&query.to)?;
    if from > to {
        return Err(AppError::BadRequest(
            "El rango de fechas está invertido".to_owned(),
        ));
    }

    let granularity = query
        .granularity
        .as_deref()
        .unwrap_or("day")
        .parse::<Granularity>()
        .map_err(AppError::BadRequest)?;

    let rows = ReportsRepository::new(state.pool())
        .sales_by_period(from, to, granularity)
        .await?;
    Ok(Json(rows))
}

/// Revenue grouped by shipping region.
#[instrument(skip(state))]
pub async fn sales_by_region(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<RegionSales>>> {
    let rows = ReportsRepository::new(state.pool()).sales_by_region().await?;
    Ok(Json(rows))
}

/// Variants at or below the stock threshold.
#[instrument(skip(state))]
pub async fn low_stock(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<LowStockQuery>,
) -> Result<Json<Vec<LowStockVariant>>> {
    let threshold = query
        .threshold
        .unwrap_or(state.config().low_stock_threshold);

    let rows = ReportsRepository::new(state.pool())
        .low_stock(threshold)
        .await?;
    Ok(Json(rows))
}

/// Order counts per status.
#[instrument(skip(state))]
pub async fn orders_by_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<StatusCount>>> {
    let rows = ReportsRepository::new(state.pool())
        .orders_by_status()
        .await?;
    Ok(Json(rows))
}

/// Parse a `YYYY-MM-DD` date query parameter.
fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Fecha inválida: {s}")))
}
