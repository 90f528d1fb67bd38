//! Database operations for the Telar MySQL database.
//!
//! ## Tables
//!
//! - `users` - Customer and admin accounts
//! - `categories`, `brands`, `colors`, `suppliers` - Reference tables
//! - `products`, `product_variants`, `product_images` - Catalog
//! - `carts`, `cart_items` - Per-user carts
//! - `orders`, `order_items` - Orders with price-at-purchase
//! - `password_reset_codes` - Single-use 6-digit reset codes
//! - `sessions` - Tower-sessions storage
//!
//! All queries use the sqlx runtime API with `FromRow` row structs that are
//! converted to domain types at the repository boundary.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p telar-cli -- migrate
//! ```

pub mod carts;
pub mod catalog;
pub mod orders;
pub mod password_resets;
pub mod products;
pub mod reports;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use catalog::{BrandRepository, CategoryRepository, ColorRepository, SupplierRepository};
pub use orders::OrderRepository;
pub use password_resets::PasswordResetRepository;
pub use products::ProductRepository;
pub use reports::ReportsRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email, insufficient stock).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a MySQL connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - MySQL connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Convert a MySQL `LAST_INSERT_ID()` into an `i32` entity id.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if the id does not fit in `i32`.
pub(crate) fn insert_id(id: u64) -> Result<i32, RepositoryError> {
    i32::try_from(id)
        .map_err(|_| RepositoryError::DataCorruption(format!("insert id {id} out of i32 range")))
}
