//! Cart service.
//!
//! Owns the quantity rules: a line's quantity never exceeds the variant's
//! current stock at write time, and the login merge takes the maximum of the
//! guest and server quantities per variant (not the sum).

use sqlx::MySqlPool;
use thiserror::Error;

use telar_core::{CartItemId, UserId, VariantId};

use crate::db::RepositoryError;
use crate::db::carts::CartRepository;
use crate::models::cart::CartItemDetail;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Variant unknown or inactive.
    #[error("variant not found")]
    VariantNotFound,

    /// Cart line unknown or not owned by the user.
    #[error("cart item not found")]
    ItemNotFound,

    /// Requested quantity is not positive.
    #[error("quantity must be positive")]
    InvalidQuantity,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Result of an add-to-cart operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    /// Quantity persisted on the line after clamping.
    pub quantity: i32,
    /// How much of the request was actually added (0 when out of stock).
    pub added: i32,
}

/// One line of a guest cart submitted on login sync.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct GuestItem {
    pub variant_id: VariantId,
    pub quantity: i32,
}

// =============================================================================
// Quantity rules (pure)
// =============================================================================

/// Clamp an add request against the variant's current stock.
///
/// The resulting line quantity is `min(existing + requested, stock)`; the
/// reported `added` is how much the line actually grew, never negative even
/// when stock dropped below the already-held quantity.
#[must_use]
pub fn clamped_add(existing: i32, requested: i32, stock: i32) -> AddOutcome {
    let quantity = (existing + requested).min(stock).max(0);
    AddOutcome {
        quantity,
        added: (quantity - existing).max(0),
    }
}

/// Merge a guest quantity with the server quantity on login.
///
/// Takes the maximum of the two (not the sum), clamped to stock.
#[must_use]
pub fn merged_quantity(local: i32, server: i32, stock: i32) -> i32 {
    local.max(server).min(stock).max(0)
}

// =============================================================================
// Service
// =============================================================================

/// Cart service.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a MySqlPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
        }
    }

    /// Fetch the user's cart lines with detail.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    pub async fn items(&self, user_id: UserId) -> Result<Vec<CartItemDetail>, CartError> {
        let cart_id = self.carts.get_or_create(user_id).await?;
        Ok(self.carts.items_detailed(cart_id).await?)
    }

    /// Add a quantity of a variant to the user's cart.
    ///
    /// Resolves or creates the cart; if the (cart, variant) line exists the
    /// requested quantity is added on top, clamping the resulting total to
    /// the variant's current stock.
    ///
    /// # Errors
    ///
    /// Returns `CartError::VariantNotFound` for unknown/inactive variants
    /// and `CartError::InvalidQuantity` for non-positive requests.
    pub async fn add(
        &self,
        user_id: UserId,
        variant_id: VariantId,
        requested: i32,
    ) -> Result<AddOutcome, CartError> {
        if requested <= 0 {
            return Err(CartError::InvalidQuantity);
        }

        let variant = self
            .carts
            .variant_stock(variant_id)
            .await?
            .ok_or(CartError::VariantNotFound)?;

        let cart_id = self.carts.get_or_create(user_id).await?;

        match self.carts.find_item(cart_id, variant_id).await? {
            Some(item) => {
                let outcome = clamped_add(item.quantity, requested, variant.stock);
                if outcome.quantity != item.quantity {
                    self.carts
                        .update_item_quantity(item.id, outcome.quantity)
                        .await?;
                }
                Ok(outcome)
            }
            None => {
                let outcome = clamped_add(0, requested, variant.stock);
                if outcome.quantity > 0 {
                    self.carts
                        .insert_item(cart_id, variant.product_id, variant_id, outcome.quantity)
                        .await?;
                }
                Ok(outcome)
            }
        }
    }

    /// Merge a guest cart into the server cart on login.
    ///
    /// Per variant the persisted quantity becomes
    /// `min(max(local, server), stock)`. Unknown or inactive variants in the
    /// guest payload are skipped silently. Returns the merged cart detail.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    pub async fn sync(
        &self,
        user_id: UserId,
        guest_items: &[GuestItem],
    ) -> Result<Vec<CartItemDetail>, CartError> {
        let cart_id = self.carts.get_or_create(user_id).await?;

        for guest in guest_items {
            if guest.quantity <= 0 {
                continue;
            }

            let Some(variant) = self.carts.variant_stock(guest.variant_id).await? else {
                continue;
            };

            match self.carts.find_item(cart_id, guest.variant_id).await? {
                Some(item) => {
                    let quantity = merged_quantity(guest.quantity, item.quantity, variant.stock);
                    if quantity != item.quantity {
                        self.carts.update_item_quantity(item.id, quantity).await?;
                    }
                }
                None => {
                    let quantity = merged_quantity(guest.quantity, 0, variant.stock);
                    if quantity > 0 {
                        self.carts
                            .insert_item(cart_id, variant.product_id, guest.variant_id, quantity)
                            .await?;
                    }
                }
            }
        }

        Ok(self.carts.items_detailed(cart_id).await?)
    }

    /// Set the quantity of a cart line, clamped to stock. Zero removes the
    /// line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the line isn't in the user's
    /// cart.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<i32, CartError> {
        if quantity < 0 {
            return Err(CartError::InvalidQuantity);
        }

        let cart_id = self.carts.get_or_create(user_id).await?;
        let item = self
            .carts
            .get_item(cart_id, item_id)
            .await?
            .ok_or(CartError::ItemNotFound)?;

        if quantity == 0 {
            self.carts.delete_item(cart_id, item_id).await?;
            return Ok(0);
        }

        let stock = self
            .carts
            .variant_stock(item.variant_id)
            .await?
            .map_or(0, |v| v.stock);

        let clamped = quantity.min(stock).max(0);
        if clamped == 0 {
            self.carts.delete_item(cart_id, item_id).await?;
        } else if clamped != item.quantity {
            self.carts.update_item_quantity(item_id, clamped).await?;
        }

        Ok(clamped)
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the line isn't in the user's
    /// cart.
    pub async fn remove(&self, user_id: UserId, item_id: CartItemId) -> Result<(), CartError> {
        let cart_id = self.carts.get_or_create(user_id).await?;
        self.carts
            .delete_item(cart_id, item_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::ItemNotFound,
                other => CartError::Repository(other),
            })
    }

    /// Remove every line in the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), CartError> {
        let cart_id = self.carts.get_or_create(user_id).await?;
        Ok(self.carts.clear(cart_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_add_within_stock() {
        let outcome = clamped_add(1, 2, 10);
        assert_eq!(outcome.quantity, 3);
        assert_eq!(outcome.added, 2);
    }

    #[test]
    fn test_clamped_add_partial() {
        // stock=2, empty cart, request 3 -> only 2 added
        let outcome = clamped_add(0, 3, 2);
        assert_eq!(outcome.quantity, 2);
        assert_eq!(outcome.added, 2);
    }

    #[test]
    fn test_clamped_add_already_at_stock() {
        let outcome = clamped_add(2, 5, 2);
        assert_eq!(outcome.quantity, 2);
        assert_eq!(outcome.added, 0);
    }

    #[test]
    fn test_clamped_add_out_of_stock() {
        let outcome = clamped_add(0, 4, 0);
        assert_eq!(outcome.quantity, 0);
        assert_eq!(outcome.added, 0);
    }

    #[test]
    fn test_clamped_add_stock_dropped_below_existing() {
        // Stock shrank to 1 while the cart held 3: the line is clamped down
        // and nothing counts as added
        let outcome = clamped_add(3, 2, 1);
        assert_eq!(outcome.quantity, 1);
        assert_eq!(outcome.added, 0);
    }

    #[test]
    fn test_merged_quantity_takes_max_not_sum() {
        assert_eq!(merged_quantity(2, 3, 10), 3);
        assert_eq!(merged_quantity(4, 1, 10), 4);
        assert_eq!(merged_quantity(2, 2, 10), 2);
    }

    #[test]
    fn test_merged_quantity_clamps_to_stock() {
        assert_eq!(merged_quantity(7, 3, 5), 5);
        assert_eq!(merged_quantity(1, 9, 4), 4);
    }

    #[test]
    fn test_merged_quantity_zero_stock() {
        assert_eq!(merged_quantity(3, 2, 0), 0);
    }
}
