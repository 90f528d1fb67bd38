//! Cart repository.
//!
//! Each user owns at most one cart; lines are unique per (cart, variant).
//! Quantity clamping is decided by the cart service; this module only moves
//! rows.

use rust_decimal::Decimal;
use sqlx::MySqlPool;

use telar_core::{CartId, CartItemId, ProductId, UserId, VariantId};

use super::{RepositoryError, insert_id};
use crate::models::cart::{CartItem, CartItemDetail};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    cart_id: i32,
    product_id: i32,
    variant_id: i32,
    quantity: i32,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(row.id),
            cart_id: CartId::new(row.cart_id),
            product_id: ProductId::new(row.product_id),
            variant_id: VariantId::new(row.variant_id),
            quantity: row.quantity,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemDetailRow {
    id: i32,
    product_id: i32,
    variant_id: i32,
    product_name: String,
    color_name: String,
    size: String,
    price: Decimal,
    stock: i32,
    quantity: i32,
    image_url: Option<String>,
}

impl From<CartItemDetailRow> for CartItemDetail {
    fn from(row: CartItemDetailRow) -> Self {
        let line_total = row.price * Decimal::from(row.quantity);
        Self {
            id: CartItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            variant_id: VariantId::new(row.variant_id),
            product_name: row.product_name,
            color_name: row.color_name,
            size: row.size,
            price: row.price,
            stock: row.stock,
            quantity: row.quantity,
            image_url: row.image_url,
            line_total,
        }
    }
}

/// Snapshot of a variant used when adding to a cart.
#[derive(Debug, Clone, Copy)]
pub struct VariantStock {
    pub product_id: ProductId,
    pub stock: i32,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a MySqlPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart id, creating the cart on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<CartId, RepositoryError> {
        let existing: Option<(i32,)> = sqlx::query_as("SELECT id FROM carts WHERE user_id = ?")
            .bind(user_id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        if let Some((id,)) = existing {
            return Ok(CartId::new(id));
        }

        let result = sqlx::query("INSERT INTO carts (user_id) VALUES (?)")
            .bind(user_id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| {
                // Concurrent first-add for the same user can race on the
                // unique user_id key; treat it as "already created"
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict("cart already exists".to_owned());
                }
                RepositoryError::Database(e)
            });

        match result {
            Ok(r) => Ok(CartId::new(insert_id(r.last_insert_id())?)),
            Err(RepositoryError::Conflict(_)) => {
                let (id,): (i32,) = sqlx::query_as("SELECT id FROM carts WHERE user_id = ?")
                    .bind(user_id.as_i32())
                    .fetch_one(self.pool)
                    .await?;
                Ok(CartId::new(id))
            }
            Err(e) => Err(e),
        }
    }

    /// Look up an active variant's product and current stock.
    ///
    /// Returns `None` for unknown or inactive variants.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variant_stock(
        &self,
        variant_id: VariantId,
    ) -> Result<Option<VariantStock>, RepositoryError> {
        let row: Option<(i32, i32)> = sqlx::query_as(
            "SELECT product_id, stock FROM product_variants WHERE id = ? AND is_active = 1",
        )
        .bind(variant_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(product_id, stock)| VariantStock {
            product_id: ProductId::new(product_id),
            stock,
        }))
    }

    /// Find a cart line by (cart, variant).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_item(
        &self,
        cart_id: CartId,
        variant_id: VariantId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            "SELECT id, cart_id, product_id, variant_id, quantity \
             FROM cart_items WHERE cart_id = ? AND variant_id = ?",
        )
        .bind(cart_id.as_i32())
        .bind(variant_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get a cart line by id, scoped to a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_item(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            "SELECT id, cart_id, product_id, variant_id, quantity \
             FROM cart_items WHERE id = ? AND cart_id = ?",
        )
        .bind(item_id.as_i32())
        .bind(cart_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Insert a new cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        variant_id: VariantId,
        quantity: i32,
    ) -> Result<CartItemId, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO cart_items (cart_id, product_id, variant_id, quantity) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(cart_id.as_i32())
        .bind(product_id.as_i32())
        .bind(variant_id.as_i32())
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(CartItemId::new(insert_id(result.last_insert_id())?))
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist.
    pub async fn update_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE cart_items SET quantity = ? WHERE id = ?")
            .bind(quantity)
            .bind(item_id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist.
    pub async fn delete_item(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = ? AND cart_id = ?")
            .bind(item_id.as_i32())
            .bind(cart_id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove every line in a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?")
            .bind(cart_id.as_i32())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Fetch all cart lines with product/variant/image detail.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_detailed(
        &self,
        cart_id: CartId,
    ) -> Result<Vec<CartItemDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemDetailRow>(
            "SELECT ci.id, ci.product_id, ci.variant_id, \
                    p.name AS product_name, co.name AS color_name, \
                    v.size, v.price, v.stock, ci.quantity, \
                    (SELECT pi.image_url FROM product_images pi \
                     WHERE pi.product_id = ci.product_id AND pi.color_id = v.color_id \
                     ORDER BY pi.is_main DESC, pi.id ASC LIMIT 1) AS image_url \
             FROM cart_items ci \
             JOIN product_variants v ON v.id = ci.variant_id \
             JOIN products p ON p.id = ci.product_id \
             JOIN colors co ON co.id = v.color_id \
             WHERE ci.cart_id = ? \
             ORDER BY ci.id ASC",
        )
        .bind(cart_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
