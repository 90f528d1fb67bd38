//! Repositories for the reference tables: colors, categories, brands,
//! suppliers.
//!
//! All four share the same contract: plain CRUD plus a usage count that
//! guards deletion while the row is referenced by catalog data.

use sqlx::MySqlPool;

use telar_core::{BrandId, CategoryId, ColorId, SupplierId};

use super::{RepositoryError, insert_id};
use crate::models::catalog::{Brand, Category, Color, Supplier};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ColorRow {
    id: i32,
    name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    size_type: String,
}

#[derive(Debug, sqlx::FromRow)]
struct BrandRow {
    id: i32,
    name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct SupplierRow {
    id: i32,
    name: String,
    phone: Option<String>,
    email: Option<String>,
}

impl From<ColorRow> for Color {
    fn from(row: ColorRow) -> Self {
        Self {
            id: ColorId::new(row.id),
            name: row.name,
        }
    }
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            size_type: row.size_type,
        }
    }
}

impl From<BrandRow> for Brand {
    fn from(row: BrandRow) -> Self {
        Self {
            id: BrandId::new(row.id),
            name: row.name,
        }
    }
}

impl From<SupplierRow> for Supplier {
    fn from(row: SupplierRow) -> Self {
        Self {
            id: SupplierId::new(row.id),
            name: row.name,
            phone: row.phone,
            email: row.email,
        }
    }
}

/// Map a unique-key violation to `Conflict`, everything else to `Database`.
fn map_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

// =============================================================================
// Colors
// =============================================================================

/// Repository for color reference data.
pub struct ColorRepository<'a> {
    pool: &'a MySqlPool,
}

impl<'a> ColorRepository<'a> {
    /// Create a new color repository.
    #[must_use]
    pub const fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// List all colors, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Color>, RepositoryError> {
        let rows =
            sqlx::query_as::<_, ColorRow>("SELECT id, name FROM colors ORDER BY name ASC")
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a new color.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists.
    pub async fn create(&self, name: &str) -> Result<Color, RepositoryError> {
        let result = sqlx::query("INSERT INTO colors (name) VALUES (?)")
            .bind(name)
            .execute(self.pool)
            .await
            .map_err(|e| map_unique(e, "color"))?;

        Ok(Color {
            id: ColorId::new(insert_id(result.last_insert_id())?),
            name: name.to_owned(),
        })
    }

    /// Rename a color.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the color doesn't exist.
    pub async fn update(&self, id: ColorId, name: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE colors SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| map_unique(e, "color"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Count variants that reference a color.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn usage_count(&self, id: ColorId) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM product_variants WHERE color_id = ?")
                .bind(id.as_i32())
                .fetch_one(self.pool)
                .await?;

        Ok(count)
    }

    /// Delete a color. Callers must check [`Self::usage_count`] first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the color doesn't exist.
    pub async fn delete(&self, id: ColorId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM colors WHERE id = ?")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

// =============================================================================
// Categories
// =============================================================================

/// Repository for category reference data.
pub struct CategoryRepository<'a> {
    pool: &'a MySqlPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// List all categories, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, size_type FROM categories ORDER BY name ASC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a new category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists.
    pub async fn create(&self, name: &str, size_type: &str) -> Result<Category, RepositoryError> {
        let result = sqlx::query("INSERT INTO categories (name, size_type) VALUES (?, ?)")
            .bind(name)
            .bind(size_type)
            .execute(self.pool)
            .await
            .map_err(|e| map_unique(e, "category"))?;

        Ok(Category {
            id: CategoryId::new(insert_id(result.last_insert_id())?),
            name: name.to_owned(),
            size_type: size_type.to_owned(),
        })
    }

    /// Update a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn update(
        &self,
        id: CategoryId,
        name: &str,
        size_type: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE categories SET name = ?, size_type = ? WHERE id = ?")
            .bind(name)
            .bind(size_type)
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| map_unique(e, "category"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Count products that reference a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn usage_count(&self, id: CategoryId) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM products WHERE category_id = ?")
                .bind(id.as_i32())
                .fetch_one(self.pool)
                .await?;

        Ok(count)
    }

    /// Delete a category. Callers must check [`Self::usage_count`] first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

// =============================================================================
// Brands
// =============================================================================

/// Repository for brand reference data.
pub struct BrandRepository<'a> {
    pool: &'a MySqlPool,
}

impl<'a> BrandRepository<'a> {
    /// Create a new brand repository.
    #[must_use]
    pub const fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// List all brands, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Brand>, RepositoryError> {
        let rows =
            sqlx::query_as::<_, BrandRow>("SELECT id, name FROM brands ORDER BY name ASC")
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a new brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists.
    pub async fn create(&self, name: &str) -> Result<Brand, RepositoryError> {
        let result = sqlx::query("INSERT INTO brands (name) VALUES (?)")
            .bind(name)
            .execute(self.pool)
            .await
            .map_err(|e| map_unique(e, "brand"))?;

        Ok(Brand {
            id: BrandId::new(insert_id(result.last_insert_id())?),
            name: name.to_owned(),
        })
    }

    /// Rename a brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the brand doesn't exist.
    pub async fn update(&self, id: BrandId, name: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE brands SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| map_unique(e, "brand"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Count products that reference a brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn usage_count(&self, id: BrandId) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE brand_id = ?")
            .bind(id.as_i32())
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Delete a brand. Callers must check [`Self::usage_count`] first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the brand doesn't exist.
    pub async fn delete(&self, id: BrandId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM brands WHERE id = ?")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

// =============================================================================
// Suppliers
// =============================================================================

/// Repository for supplier reference data.
pub struct SupplierRepository<'a> {
    pool: &'a MySqlPool,
}

impl<'a> SupplierRepository<'a> {
    /// Create a new supplier repository.
    #[must_use]
    pub const fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// List all suppliers, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Supplier>, RepositoryError> {
        let rows = sqlx::query_as::<_, SupplierRow>(
            "SELECT id, name, phone, email FROM suppliers ORDER BY name ASC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a new supplier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists.
    pub async fn create(
        &self,
        name: &str,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<Supplier, RepositoryError> {
        let result = sqlx::query("INSERT INTO suppliers (name, phone, email) VALUES (?, ?, ?)")
            .bind(name)
            .bind(phone)
            .bind(email)
            .execute(self.pool)
            .await
            .map_err(|e| map_unique(e, "supplier"))?;

        Ok(Supplier {
            id: SupplierId::new(insert_id(result.last_insert_id())?),
            name: name.to_owned(),
            phone: phone.map(str::to_owned),
            email: email.map(str::to_owned),
        })
    }

    /// Update a supplier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the supplier doesn't exist.
    pub async fn update(
        &self,
        id: SupplierId,
        name: &str,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE suppliers SET name = ?, phone = ?, email = ? WHERE id = ?")
                .bind(name)
                .bind(phone)
                .bind(email)
                .bind(id.as_i32())
                .execute(self.pool)
                .await
                .map_err(|e| map_unique(e, "supplier"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Count products that reference a supplier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn usage_count(&self, id: SupplierId) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM products WHERE supplier_id = ?")
                .bind(id.as_i32())
                .fetch_one(self.pool)
                .await?;

        Ok(count)
    }

    /// Delete a supplier. Callers must check [`Self::usage_count`] first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the supplier doesn't exist.
    pub async fn delete(&self, id: SupplierId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
