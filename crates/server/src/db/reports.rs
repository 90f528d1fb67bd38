//! Reporting queries for the admin dashboard.
//!
//! Revenue figures count orders that reached payment (`pagado`, `enviado`,
//! `entregado`); `pendiente` and `cancelado` orders are excluded.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::MySqlPool;

use telar_core::{OrderStatus, ProductId, VariantId};

use super::RepositoryError;

/// Statuses that count toward revenue.
const REVENUE_STATUSES: &str = "('pagado', 'enviado', 'entregado')";

/// Headline dashboard metrics.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetrics {
    pub total_revenue: Decimal,
    pub orders_count: i64,
    pub customers_count: i64,
    pub pending_orders: i64,
}

/// One row of the top-products report.
#[derive(Debug, Clone, Serialize)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub name: String,
    pub units_sold: i64,
    pub revenue: Decimal,
}

/// Aggregated sales for one period bucket.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodSales {
    pub period: String,
    pub orders: i64,
    pub revenue: Decimal,
}

/// Aggregated sales for one shipping region.
#[derive(Debug, Clone, Serialize)]
pub struct RegionSales {
    pub region: String,
    pub orders: i64,
    pub revenue: Decimal,
}

/// A variant at or below the low-stock threshold.
#[derive(Debug, Clone, Serialize)]
pub struct LowStockVariant {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_name: String,
    pub color_name: String,
    pub size: String,
    pub stock: i32,
}

/// Order counts per status.
#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// Period granularity for the sales-by-period report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Month,
}

impl Granularity {
    /// MySQL `DATE_FORMAT` pattern for this granularity.
    const fn date_format(self) -> &'static str {
        match self {
            Self::Day => "%Y-%m-%d",
            Self::Month => "%Y-%m",
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "month" => Ok(Self::Month),
            _ => Err(format!("invalid granularity: {s}")),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for dashboard reporting queries.
pub struct ReportsRepository<'a> {
    pool: &'a MySqlPool,
}

impl<'a> ReportsRepository<'a> {
    /// Create a new reports repository.
    #[must_use]
    pub const fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// Headline metrics for the dashboard landing page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn dashboard(&self) -> Result<DashboardMetrics, RepositoryError> {
        let (total_revenue,): (Option<Decimal>,) = sqlx::query_as(&format!(
            "SELECT SUM(oi.quantity * oi.unit_price) \
             FROM order_items oi JOIN orders o ON o.id = oi.order_id \
             WHERE o.status IN {REVENUE_STATUSES}"
        ))
        .fetch_one(self.pool)
        .await?;

        let (orders_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(self.pool)
            .await?;

        let (customers_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'customer'")
                .fetch_one(self.pool)
                .await?;

        let (pending_orders,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM orders WHERE status = 'pendiente'")
                .fetch_one(self.pool)
                .await?;

        Ok(DashboardMetrics {
            total_revenue: total_revenue.unwrap_or(Decimal::ZERO),
            orders_count,
            customers_count,
            pending_orders,
        })
    }

    /// Best-selling products by units sold.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_products(&self, limit: i64) -> Result<Vec<TopProduct>, RepositoryError> {
        // SUM over INT yields DECIMAL in MySQL; cast back for an i64 decode
        let rows: Vec<(i32, String, Option<i64>, Option<Decimal>)> = sqlx::query_as(&format!(
            "SELECT p.id, p.name, CAST(SUM(oi.quantity) AS SIGNED) AS units, \
                    SUM(oi.quantity * oi.unit_price) AS revenue \
             FROM order_items oi \
             JOIN orders o ON o.id = oi.order_id \
             JOIN product_variants v ON v.id = oi.variant_id \
             JOIN products p ON p.id = v.product_id \
             WHERE o.status IN {REVENUE_STATUSES} \
             GROUP BY p.id, p.name \
             ORDER BY units DESC \
             LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, units, revenue)| TopProduct {
                product_id: ProductId::new(id),
                name,
                units_sold: units.unwrap_or(0),
                revenue: revenue.unwrap_or(Decimal::ZERO),
            })
            .collect())
    }

    /// Revenue bucketed by day or month over a date range.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sales_by_period(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<PeriodSales>, RepositoryError> {
        let rows: Vec<(String, i64, Option<Decimal>)> = sqlx::query_as(&format!(
            "SELECT DATE_FORMAT(o.created_at, '{}') AS period, \
                    COUNT(DISTINCT o.id) AS orders, \
                    SUM(oi.quantity * oi.unit_price) AS revenue \
             FROM orders o JOIN order_items oi ON oi.order_id = o.id \
             WHERE o.status IN {REVENUE_STATUSES} \
               AND DATE(o.created_at) BETWEEN ? AND ? \
             GROUP BY period \
             ORDER BY period ASC",
            granularity.date_format()
        ))
        .bind(from)
        .bind(to)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(period, orders, revenue)| PeriodSales {
                period,
                orders,
                revenue: revenue.unwrap_or(Decimal::ZERO),
            })
            .collect())
    }

    /// Revenue grouped by shipping region.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sales_by_region(&self) -> Result<Vec<RegionSales>, RepositoryError> {
        let rows: Vec<(String, i64, Option<Decimal>)> = sqlx::query_as(&format!(
            "SELECT o.region, COUNT(DISTINCT o.id) AS orders, \
                    SUM(oi.quantity * oi.unit_price) AS revenue \
             FROM orders o JOIN order_items oi ON oi.order_id = o.id \
             WHERE o.status IN {REVENUE_STATUSES} \
             GROUP BY o.region \
             ORDER BY revenue DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(region, orders, revenue)| RegionSales {
                region,
                orders,
                revenue: revenue.unwrap_or(Decimal::ZERO),
            })
            .collect())
    }

    /// Active variants at or below a stock threshold, lowest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(
        &self,
        threshold: i32,
    ) -> Result<Vec<LowStockVariant>, RepositoryError> {
        let rows: Vec<(i32, i32, String, String, String, i32)> = sqlx::query_as(
            "SELECT v.id, p.id, p.name, co.name, v.size, v.stock \
             FROM product_variants v \
             JOIN products p ON p.id = v.product_id \
             JOIN colors co ON co.id = v.color_id \
             WHERE v.is_active = 1 AND p.is_active = 1 AND v.stock <= ? \
             ORDER BY v.stock ASC, p.name ASC",
        )
        .bind(threshold)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(variant_id, product_id, product_name, color_name, size, stock)| {
                    LowStockVariant {
                        variant_id: VariantId::new(variant_id),
                        product_id: ProductId::new(product_id),
                        product_name,
                        color_name,
                        size,
                        stock,
                    }
                },
            )
            .collect())
    }

    /// Order counts per status, covering every allow-listed status even when
    /// its count is zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored status is
    /// outside the allow-list.
    pub async fn orders_by_status(&self) -> Result<Vec<StatusCount>, RepositoryError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
                .fetch_all(self.pool)
                .await?;

        let mut counts = Vec::with_capacity(OrderStatus::ALL.len());
        for status in OrderStatus::ALL {
            let count = rows
                .iter()
                .find(|(s, _)| s == status.as_str())
                .map_or(0, |(_, c)| *c);
            counts.push(StatusCount { status, count });
        }

        // Any status string outside the allow-list indicates corruption
        for (s, _) in &rows {
            s.parse::<OrderStatus>()
                .map_err(RepositoryError::DataCorruption)?;
        }

        Ok(counts)
    }
}
