//! Order repository.
//!
//! Order creation is the one multi-statement transaction in the system: the
//! order row, its items, the stock decrements and the sales counters either
//! all persist or none do.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use telar_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId, VariantId};

use super::{RepositoryError, insert_id};
use crate::models::order::{NewOrder, Order, OrderItemDetail, OrderWithItems};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    status: String,
    street: String,
    region: String,
    commune: String,
    postal_code: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid status: {e}")))?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            status,
            street: row.street,
            region: row.region,
            commune: row.commune,
            postal_code: row.postal_code,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemDetailRow {
    id: i32,
    variant_id: i32,
    product_id: i32,
    product_name: String,
    color_name: String,
    size: String,
    quantity: i32,
    unit_price: Decimal,
}

impl From<OrderItemDetailRow> for OrderItemDetail {
    fn from(row: OrderItemDetailRow) -> Self {
        let line_total = row.unit_price * Decimal::from(row.quantity);
        Self {
            id: OrderItemId::new(row.id),
            variant_id: VariantId::new(row.variant_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            color_name: row.color_name,
            size: row.size,
            quantity: row.quantity,
            unit_price: row.unit_price,
            line_total,
        }
    }
}

const ORDER_COLUMNS: &str =
    "id, user_id, status, street, region, commune, postal_code, notes, created_at";

const ITEM_DETAIL_SELECT: &str = "SELECT oi.id, oi.variant_id, v.product_id, \
     p.name AS product_name, co.name AS color_name, v.size, oi.quantity, oi.unit_price \
     FROM order_items oi \
     JOIN product_variants v ON v.id = oi.variant_id \
     JOIN products p ON p.id = v.product_id \
     JOIN colors co ON co.id = v.color_id";

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a MySqlPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// Create an order atomically.
    ///
    /// Inside one transaction: insert the order row with status
    /// `pendiente`, then for each item look up the current price, insert the
    /// order line with that price, and decrement the variant's stock guarded
    /// by `stock >= quantity`. Any failure rolls the whole order back.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` when a variant has insufficient
    /// stock, `RepositoryError::NotFound` when a variant does not exist or
    /// is inactive, and `RepositoryError::Database` for other failures.
    pub async fn create(
        &self,
        user_id: UserId,
        order: &NewOrder,
    ) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO orders (user_id, status, street, region, commune, postal_code, notes) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id.as_i32())
        .bind(OrderStatus::Pendiente.as_str())
        .bind(&order.street)
        .bind(&order.region)
        .bind(&order.commune)
        .bind(&order.postal_code)
        .bind(&order.notes)
        .execute(&mut *tx)
        .await?;

        let order_id = OrderId::new(insert_id(result.last_insert_id())?);

        for item in &order.items {
            let price: Option<(Decimal,)> = sqlx::query_as(
                "SELECT price FROM product_variants WHERE id = ? AND is_active = 1",
            )
            .bind(item.variant_id.as_i32())
            .fetch_optional(&mut *tx)
            .await?;

            let Some((unit_price,)) = price else {
                tx.rollback().await?;
                return Err(RepositoryError::NotFound);
            };

            sqlx::query(
                "INSERT INTO order_items (order_id, variant_id, quantity, unit_price) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(order_id.as_i32())
            .bind(item.variant_id.as_i32())
            .bind(item.quantity)
            .bind(unit_price)
            .execute(&mut *tx)
            .await?;

            // Guarded decrement: zero rows affected means the remaining
            // stock is below the purchased quantity
            let decremented = sqlx::query(
                "UPDATE product_variants SET stock = stock - ? WHERE id = ? AND stock >= ?",
            )
            .bind(item.quantity)
            .bind(item.variant_id.as_i32())
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(RepositoryError::Conflict(format!(
                    "insufficient stock for variant {}",
                    item.variant_id
                )));
            }

            sqlx::query(
                "UPDATE products p \
                 JOIN product_variants v ON v.product_id = p.id \
                 SET p.total_sales = p.total_sales + ? \
                 WHERE v.id = ?",
            )
            .bind(item.quantity)
            .bind(item.variant_id.as_i32())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(order_id)
    }

    /// Mark an order as paid.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn mark_paid(&self, order_id: OrderId) -> Result<(), RepositoryError> {
        self.update_status(order_id, OrderStatus::Pagado).await
    }

    /// Set an order's status. Any allow-listed status may follow any other.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(order_id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            // The status may already match; only report missing rows
            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE id = ?")
                .bind(order_id.as_i32())
                .fetch_one(self.pool)
                .await?;
            if count == 0 {
                return Err(RepositoryError::NotFound);
            }
        }
        Ok(())
    }

    /// Get one order with items, without ownership checks (admin path).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_with_items(
        &self,
        order_id: OrderId,
    ) -> Result<Option<OrderWithItems>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
        ))
        .bind(order_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let order: Order = row.try_into()?;
        let items = self.items_of(order_id).await?;
        Ok(Some(with_total(order, items)))
    }

    /// List a user's orders with items, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY created_at DESC"
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// List all orders with items, optionally filtered by status, newest
    /// first (admin listing).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE status = ? \
                     ORDER BY created_at DESC"
                ))
                .bind(status.as_str())
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
                ))
                .fetch_all(self.pool)
                .await?
            }
        };

        self.assemble(rows).await
    }

    /// Fetch the detailed items of one order.
    async fn items_of(&self, order_id: OrderId) -> Result<Vec<OrderItemDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemDetailRow>(&format!(
            "{ITEM_DETAIL_SELECT} WHERE oi.order_id = ? ORDER BY oi.id ASC"
        ))
        .bind(order_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Attach items to a page of order rows.
    async fn assemble(&self, rows: Vec<OrderRow>) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let order: Order = row.try_into()?;
            let items = self.items_of(order.id).await?;
            orders.push(with_total(order, items));
        }
        Ok(orders)
    }
}

/// Attach items and compute the order total.
fn with_total(order: Order, items: Vec<OrderItemDetail>) -> OrderWithItems {
    let total = items.iter().map(|i| i.line_total).sum();
    OrderWithItems {
        order,
        items,
        total,
    }
}
