//! Product, variant and image repository.
//!
//! Catalog reads return [`ProductDetail`] aggregates (product + reference
//! names + variants + images) assembled from three queries; writes are
//! row-level operations the reconciliation service composes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{MySqlPool, QueryBuilder};

use telar_core::{BrandId, CategoryId, ColorId, ImageId, ProductId, SupplierId, VariantId};

use super::{RepositoryError, insert_id};
use crate::models::product::{
    NewProduct, Product, ProductDetail, ProductImage, ProductVariant, SubmittedVariant,
};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for product queries joined with reference names.
#[derive(Debug, sqlx::FromRow)]
struct ProductDetailRow {
    id: i32,
    name: String,
    description: Option<String>,
    category_id: i32,
    brand_id: i32,
    supplier_id: Option<i32>,
    main_color_id: Option<i32>,
    gender: String,
    is_active: bool,
    total_sales: i32,
    created_at: DateTime<Utc>,
    category_name: String,
    brand_name: String,
}

impl From<ProductDetailRow> for (Product, String, String) {
    fn from(row: ProductDetailRow) -> Self {
        (
            Product {
                id: ProductId::new(row.id),
                name: row.name,
                description: row.description,
                category_id: CategoryId::new(row.category_id),
                brand_id: BrandId::new(row.brand_id),
                supplier_id: row.supplier_id.map(SupplierId::new),
                main_color_id: row.main_color_id.map(ColorId::new),
                gender: row.gender,
                is_active: row.is_active,
                total_sales: row.total_sales,
                created_at: row.created_at,
            },
            row.category_name,
            row.brand_name,
        )
    }
}

/// Internal row type for variant queries.
#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: i32,
    product_id: i32,
    color_id: i32,
    size: String,
    price: Decimal,
    stock: i32,
    sku: Option<String>,
    is_active: bool,
}

impl From<VariantRow> for ProductVariant {
    fn from(row: VariantRow) -> Self {
        Self {
            id: VariantId::new(row.id),
            product_id: ProductId::new(row.product_id),
            color_id: ColorId::new(row.color_id),
            size: row.size,
            price: row.price,
            stock: row.stock,
            sku: row.sku,
            is_active: row.is_active,
        }
    }
}

/// Internal row type for image queries.
#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    id: i32,
    product_id: i32,
    color_id: i32,
    image_url: String,
    is_main: bool,
}

impl From<ImageRow> for ProductImage {
    fn from(row: ImageRow) -> Self {
        Self {
            id: ImageId::new(row.id),
            product_id: ProductId::new(row.product_id),
            color_id: ColorId::new(row.color_id),
            image_url: row.image_url,
            is_main: row.is_main,
        }
    }
}

const DETAIL_SELECT: &str = "SELECT p.id, p.name, p.description, p.category_id, p.brand_id, \
     p.supplier_id, p.main_color_id, p.gender, p.is_active, p.total_sales, p.created_at, \
     c.name AS category_name, b.name AS brand_name \
     FROM products p \
     JOIN categories c ON c.id = p.category_id \
     JOIN brands b ON b.id = p.brand_id";

/// Catalog list filters. `Default` means: active products only, no filters.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Include inactive products (admin listings).
    pub include_inactive: bool,
    /// Restrict to a category.
    pub category_id: Option<CategoryId>,
    /// Restrict to a gender label.
    pub gender: Option<String>,
    /// Case-insensitive substring over name/description/brand/category/gender.
    pub query: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a MySqlPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// List products with variants and images attached.
    ///
    /// Unless `filter.include_inactive` is set, only active products and
    /// active variants are returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<ProductDetail>, RepositoryError> {
        let mut qb = QueryBuilder::<sqlx::MySql>::new(DETAIL_SELECT);
        qb.push(" WHERE 1 = 1");

        if !filter.include_inactive {
            qb.push(" AND p.is_active = 1");
        }
        if let Some(category_id) = filter.category_id {
            qb.push(" AND p.category_id = ").push_bind(category_id.as_i32());
        }
        if let Some(ref gender) = filter.gender {
            qb.push(" AND p.gender = ").push_bind(gender.clone());
        }
        if let Some(ref q) = filter.query {
            let pattern = like_pattern(q);
            qb.push(" AND (LOWER(p.name) LIKE ").push_bind(pattern.clone());
            qb.push(" OR LOWER(p.description) LIKE ").push_bind(pattern.clone());
            qb.push(" OR LOWER(b.name) LIKE ").push_bind(pattern.clone());
            qb.push(" OR LOWER(c.name) LIKE ").push_bind(pattern.clone());
            qb.push(" OR LOWER(p.gender) LIKE ").push_bind(pattern);
            qb.push(")");
        }
        qb.push(" ORDER BY p.created_at DESC");

        let rows = qb
            .build_query_as::<ProductDetailRow>()
            .fetch_all(self.pool)
            .await?;

        self.assemble_details(rows, filter.include_inactive).await
    }

    /// Get one product with variants and images attached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(
        &self,
        id: ProductId,
        include_inactive: bool,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        let mut sql = format!("{DETAIL_SELECT} WHERE p.id = ?");
        if !include_inactive {
            sql.push_str(" AND p.is_active = 1");
        }

        let row = sqlx::query_as::<_, ProductDetailRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut details = self.assemble_details(vec![row], include_inactive).await?;
        Ok(details.pop())
    }

    /// Search active products matching `%q%` (case-insensitive) across
    /// name, description, brand, category and gender, with active variants
    /// attached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search(&self, q: &str) -> Result<Vec<ProductDetail>, RepositoryError> {
        let filter = ProductFilter {
            query: Some(q.to_owned()),
            ..ProductFilter::default()
        };
        self.list(&filter).await
    }

    /// Attach variants and images to a page of product rows.
    async fn assemble_details(
        &self,
        rows: Vec<ProductDetailRow>,
        include_inactive: bool,
    ) -> Result<Vec<ProductDetail>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let variants = self.variants_for(&ids, include_inactive).await?;
        let images = self.images_for(&ids).await?;

        let mut details = Vec::with_capacity(rows.len());
        for row in rows {
            let product_id = row.id;
            let (product, category_name, brand_name): (Product, String, String) = row.into();
            details.push(ProductDetail {
                product,
                category_name,
                brand_name,
                variants: variants
                    .iter()
                    .filter(|v| v.product_id.as_i32() == product_id)
                    .cloned()
                    .collect(),
                images: images
                    .iter()
                    .filter(|i| i.product_id.as_i32() == product_id)
                    .cloned()
                    .collect(),
            });
        }

        Ok(details)
    }

    /// Fetch variants for a set of product ids.
    async fn variants_for(
        &self,
        product_ids: &[i32],
        include_inactive: bool,
    ) -> Result<Vec<ProductVariant>, RepositoryError> {
        let mut qb = QueryBuilder::<sqlx::MySql>::new(
            "SELECT id, product_id, color_id, size, price, stock, sku, is_active \
             FROM product_variants WHERE product_id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in product_ids {
            separated.push_bind(*id);
        }
        qb.push(")");
        if !include_inactive {
            qb.push(" AND is_active = 1");
        }
        qb.push(" ORDER BY id ASC");

        let rows = qb.build_query_as::<VariantRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Fetch images for a set of product ids.
    async fn images_for(&self, product_ids: &[i32]) -> Result<Vec<ProductImage>, RepositoryError> {
        let mut qb = QueryBuilder::<sqlx::MySql>::new(
            "SELECT id, product_id, color_id, image_url, is_main \
             FROM product_images WHERE product_id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in product_ids {
            separated.push_bind(*id);
        }
        qb.push(") ORDER BY is_main DESC, id ASC");

        let rows = qb.build_query_as::<ImageRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert a product row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, product: &NewProduct) -> Result<ProductId, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO products \
             (name, description, category_id, brand_id, supplier_id, main_color_id, gender) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category_id.as_i32())
        .bind(product.brand_id.as_i32())
        .bind(product.supplier_id.map(|s| s.as_i32()))
        .bind(product.main_color_id.map(|c| c.as_i32()))
        .bind(&product.gender)
        .execute(self.pool)
        .await?;

        Ok(ProductId::new(insert_id(result.last_insert_id())?))
    }

    /// Update the product-level fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET name = ?, description = ?, category_id = ?, brand_id = ?, \
             supplier_id = ?, main_color_id = ?, gender = ? WHERE id = ?",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category_id.as_i32())
        .bind(product.brand_id.as_i32())
        .bind(product.supplier_id.map(|s| s.as_i32()))
        .bind(product.main_color_id.map(|c| c.as_i32()))
        .bind(&product.gender)
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 && !self.exists(id).await? {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Whether a product row exists (active or not).
    async fn exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE id = ?")
            .bind(id.as_i32())
            .fetch_one(self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Activate or deactivate a product (soft delete).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn set_active(&self, id: ProductId, active: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE products SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 && !self.exists(id).await? {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Variants
    // =========================================================================

    /// Fetch all variants of a product (active and inactive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variants_of(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductVariant>, RepositoryError> {
        let rows = sqlx::query_as::<_, VariantRow>(
            "SELECT id, product_id, color_id, size, price, stock, sku, is_active \
             FROM product_variants WHERE product_id = ? ORDER BY id ASC",
        )
        .bind(product_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert a new variant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` when (product, color, size)
    /// already exists.
    pub async fn insert_variant(
        &self,
        product_id: ProductId,
        variant: &SubmittedVariant,
    ) -> Result<VariantId, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO product_variants (product_id, color_id, size, price, stock, sku, is_active) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(product_id.as_i32())
        .bind(variant.color_id.as_i32())
        .bind(&variant.size)
        .bind(variant.price)
        .bind(variant.stock)
        .bind(&variant.sku)
        .bind(variant.is_active)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(
                    "variant with this color and size already exists".to_owned(),
                );
            }
            RepositoryError::Database(e)
        })?;

        Ok(VariantId::new(insert_id(result.last_insert_id())?))
    }

    /// Update an existing variant in place.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant doesn't exist.
    pub async fn update_variant(
        &self,
        variant_id: VariantId,
        variant: &SubmittedVariant,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE product_variants SET color_id = ?, size = ?, price = ?, stock = ?, \
             sku = ?, is_active = ? WHERE id = ?",
        )
        .bind(variant.color_id.as_i32())
        .bind(&variant.size)
        .bind(variant.price)
        .bind(variant.stock)
        .bind(&variant.sku)
        .bind(variant.is_active)
        .bind(variant_id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a variant row.
    ///
    /// A variant referenced by order items cannot be hard-deleted without
    /// losing order history, so those fall back to deactivation. Images of
    /// the variant's color are intentionally left in place; only the
    /// dedicated image endpoint removes image rows and files.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_variant(&self, variant_id: VariantId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product_variants WHERE id = ?")
            .bind(variant_id.as_i32())
            .execute(self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                sqlx::query("UPDATE product_variants SET is_active = 0 WHERE id = ?")
                    .bind(variant_id.as_i32())
                    .execute(self.pool)
                    .await?;
                Ok(())
            }
            Err(e) => Err(RepositoryError::Database(e)),
        }
    }

    // =========================================================================
    // Images
    // =========================================================================

    /// Whether an identical (product, color, url) image row already exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_image(
        &self,
        product_id: ProductId,
        color_id: ColorId,
        image_url: &str,
    ) -> Result<bool, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM product_images \
             WHERE product_id = ? AND color_id = ? AND image_url = ?",
        )
        .bind(product_id.as_i32())
        .bind(color_id.as_i32())
        .bind(image_url)
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Whether a (product, color) already has a main image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_main_image(
        &self,
        product_id: ProductId,
        color_id: ColorId,
    ) -> Result<bool, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM product_images \
             WHERE product_id = ? AND color_id = ? AND is_main = 1",
        )
        .bind(product_id.as_i32())
        .bind(color_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Insert an image row.
    ///
    /// When `is_main` is set, any previous main image for the same
    /// (product, color) is demoted first so at most one main remains.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_image(
        &self,
        product_id: ProductId,
        color_id: ColorId,
        image_url: &str,
        is_main: bool,
    ) -> Result<ImageId, RepositoryError> {
        if is_main {
            sqlx::query(
                "UPDATE product_images SET is_main = 0 WHERE product_id = ? AND color_id = ?",
            )
            .bind(product_id.as_i32())
            .bind(color_id.as_i32())
            .execute(self.pool)
            .await?;
        }

        let result = sqlx::query(
            "INSERT INTO product_images (product_id, color_id, image_url, is_main) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(product_id.as_i32())
        .bind(color_id.as_i32())
        .bind(image_url)
        .bind(is_main)
        .execute(self.pool)
        .await?;

        Ok(ImageId::new(insert_id(result.last_insert_id())?))
    }

    /// Get an image row by id, scoped to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_image(
        &self,
        product_id: ProductId,
        image_id: ImageId,
    ) -> Result<Option<ProductImage>, RepositoryError> {
        let row = sqlx::query_as::<_, ImageRow>(
            "SELECT id, product_id, color_id, image_url, is_main \
             FROM product_images WHERE id = ? AND product_id = ?",
        )
        .bind(image_id.as_i32())
        .bind(product_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Delete an image row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the image doesn't exist.
    pub async fn delete_image(&self, image_id: ImageId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product_images WHERE id = ?")
            .bind(image_id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Build a `%q%` LIKE pattern, lowercased, with LIKE metacharacters escaped.
fn like_pattern(q: &str) -> String {
    let escaped = q
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_wraps_and_lowercases() {
        assert_eq!(like_pattern("Za"), "%za%");
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("100%_algodon"), "%100\\%\\_algodon%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
