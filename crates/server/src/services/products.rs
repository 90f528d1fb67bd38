//! Product service: variant/image reconciliation on the admin write path.
//!
//! The diff between submitted and stored variants is computed by a pure
//! planning step ([`plan_variant_changes`]) and then applied row by row.
//! Submitting the same variant list twice yields an empty second plan, so
//! repeated saves produce no extra writes.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sqlx::MySqlPool;
use thiserror::Error;
use uuid::Uuid;

use telar_core::{ImageId, ProductId, VariantId};

use crate::db::RepositoryError;
use crate::db::products::ProductRepository;
use crate::db::reports::ReportsRepository;
use crate::models::product::{NewProduct, ProductVariant, SubmittedVariant};
use crate::services::email::EmailService;

/// Errors that can occur during product write operations.
#[derive(Debug, Error)]
pub enum ProductError {
    /// Product unknown.
    #[error("product not found")]
    NotFound,

    /// Image row unknown.
    #[error("image not found")]
    ImageNotFound,

    /// Submitted payload is invalid.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Writing an uploaded file failed.
    #[error("file storage error: {0}")]
    FileStorage(#[from] std::io::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// The JSON part of a multipart product create/update request.
#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    #[serde(flatten)]
    pub product: NewProduct,
    #[serde(default)]
    pub variants: Vec<SubmittedVariant>,
}

/// An uploaded image file, already pulled out of the multipart stream.
///
/// `variant_index` comes from the `variants[i][images][j]` field name and
/// selects which submitted variant (and therefore which color) the image
/// belongs to.
#[derive(Debug)]
pub struct UploadedImage {
    pub variant_index: usize,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

// =============================================================================
// Reconciliation plan (pure)
// =============================================================================

/// The writes needed to bring stored variants in line with a submission.
#[derive(Debug, Default, PartialEq)]
pub struct VariantPlan {
    /// Variants updated in place (dirty rows only).
    pub updates: Vec<(VariantId, SubmittedVariant)>,
    /// Brand new variants.
    pub inserts: Vec<SubmittedVariant>,
    /// Stored variants absent from the submission.
    pub deletes: Vec<VariantId>,
}

impl VariantPlan {
    /// Whether applying this plan would write anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty() && self.deletes.is_empty()
    }
}

/// Diff a submitted variant list against the stored set.
///
/// - Submissions carrying a `variant_id` match the stored row by id and are
///   updated only when a field differs.
/// - Submissions without an id are matched by (color, size); unmatched ones
///   become inserts.
/// - Stored variants not covered by either rule are deleted.
#[must_use]
pub fn plan_variant_changes(
    existing: &[ProductVariant],
    submitted: &[SubmittedVariant],
) -> VariantPlan {
    let mut plan = VariantPlan::default();
    let mut retained: Vec<VariantId> = Vec::with_capacity(submitted.len());

    for entry in submitted {
        let matched = match entry.variant_id {
            Some(id) => existing.iter().find(|v| v.id == id),
            None => existing
                .iter()
                .find(|v| v.color_id == entry.color_id && v.size == entry.size),
        };

        match matched {
            Some(stored) => {
                retained.push(stored.id);
                if entry.differs_from(stored) {
                    plan.updates.push((stored.id, entry.clone()));
                }
            }
            None => plan.inserts.push(entry.clone()),
        }
    }

    for stored in existing {
        if !retained.contains(&stored.id) {
            plan.deletes.push(stored.id);
        }
    }

    plan
}

/// Parse an image field name of the form `variants[i][images][j]`.
///
/// Returns `(variant_index, image_index)`, or `None` for any other shape.
#[must_use]
pub fn parse_image_field(name: &str) -> Option<(usize, usize)> {
    let rest = name.strip_prefix("variants[")?;
    let (variant_index, rest) = rest.split_once(']')?;
    let rest = rest.strip_prefix("[images][")?;
    let image_index = rest.strip_suffix(']')?;

    Some((variant_index.parse().ok()?, image_index.parse().ok()?))
}

/// Reduce an uploaded file name to a safe on-disk suffix.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

// =============================================================================
// Service
// =============================================================================

/// Product write-path service.
pub struct ProductService<'a> {
    products: ProductRepository<'a>,
    reports: ReportsRepository<'a>,
    email: Option<&'a EmailService>,
    upload_dir: &'a Path,
    admin_email: &'a str,
    low_stock_threshold: i32,
}

impl<'a> ProductService<'a> {
    /// Create a new product service.
    #[must_use]
    pub fn new(
        pool: &'a MySqlPool,
        email: Option<&'a EmailService>,
        upload_dir: &'a Path,
        admin_email: &'a str,
        low_stock_threshold: i32,
    ) -> Self {
        Self {
            products: ProductRepository::new(pool),
            reports: ReportsRepository::new(pool),
            email,
            upload_dir,
            admin_email,
            low_stock_threshold,
        }
    }

    /// Create a product with its variants and uploaded images.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::InvalidPayload` when no variants are
    /// submitted, and repository/storage errors otherwise.
    pub async fn create(
        &self,
        payload: &ProductPayload,
        files: Vec<UploadedImage>,
    ) -> Result<ProductId, ProductError> {
        if payload.variants.is_empty() {
            return Err(ProductError::InvalidPayload(
                "a product needs at least one variant".to_owned(),
            ));
        }

        let product_id = self.products.create(&payload.product).await?;

        for variant in &payload.variants {
            self.products.insert_variant(product_id, variant).await?;
        }

        self.store_images(product_id, &payload.variants, files)
            .await?;
        self.alert_low_stock(product_id).await;

        Ok(product_id)
    }

    /// Reconcile a product against a submitted payload.
    ///
    /// See [`plan_variant_changes`] for the diff rules. Deleting a variant
    /// here does not remove its images; only the dedicated image endpoint
    /// unlinks files.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` for unknown products and
    /// repository/storage errors otherwise.
    pub async fn update(
        &self,
        product_id: ProductId,
        payload: &ProductPayload,
        files: Vec<UploadedImage>,
    ) -> Result<(), ProductError> {
        let existing = self.products.variants_of(product_id).await?;

        self.products
            .update(product_id, &payload.product)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ProductError::NotFound,
                other => ProductError::Repository(other),
            })?;

        let plan = plan_variant_changes(&existing, &payload.variants);

        for (variant_id, variant) in &plan.updates {
            self.products.update_variant(*variant_id, variant).await?;
        }
        for variant_id in &plan.deletes {
            self.products.delete_variant(*variant_id).await?;
        }
        for variant in &plan.inserts {
            self.products.insert_variant(product_id, variant).await?;
        }

        self.store_images(product_id, &payload.variants, files)
            .await?;
        self.alert_low_stock(product_id).await;

        Ok(())
    }

    /// Deactivate a product (soft delete).
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` for unknown products.
    pub async fn deactivate(&self, product_id: ProductId) -> Result<(), ProductError> {
        self.products
            .set_active(product_id, false)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ProductError::NotFound,
                other => ProductError::Repository(other),
            })
    }

    /// Delete an image row and its file on disk.
    ///
    /// The file removal is best-effort: a missing file is logged, not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::ImageNotFound` for unknown images.
    pub async fn delete_image(
        &self,
        product_id: ProductId,
        image_id: ImageId,
    ) -> Result<(), ProductError> {
        let image = self
            .products
            .get_image(product_id, image_id)
            .await?
            .ok_or(ProductError::ImageNotFound)?;

        self.products.delete_image(image_id).await?;

        if let Some(path) = self.file_path_for(&image.image_url) {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), "Failed to remove image file: {e}");
            }
        }

        Ok(())
    }

    /// Map uploaded files to variants by index, persist them to disk, and
    /// insert non-duplicate image rows.
    ///
    /// Files whose index resolves to no submitted variant are dropped
    /// silently; duplicate (product, color, url) triples are skipped.
    async fn store_images(
        &self,
        product_id: ProductId,
        variants: &[SubmittedVariant],
        files: Vec<UploadedImage>,
    ) -> Result<(), ProductError> {
        if files.is_empty() {
            return Ok(());
        }

        tokio::fs::create_dir_all(self.upload_dir).await?;

        for file in files {
            let Some(variant) = variants.get(file.variant_index) else {
                tracing::debug!(
                    variant_index = file.variant_index,
                    "Dropping image with no matching variant"
                );
                continue;
            };

            let stored_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(&file.file_name));
            let image_url = format!("/uploads/{stored_name}");

            if self
                .products
                .has_image(product_id, variant.color_id, &image_url)
                .await?
            {
                continue;
            }

            tokio::fs::write(self.upload_dir.join(&stored_name), &file.bytes).await?;

            let is_main = !self
                .products
                .has_main_image(product_id, variant.color_id)
                .await?;

            self.products
                .insert_image(product_id, variant.color_id, &image_url, is_main)
                .await?;
        }

        Ok(())
    }

    /// Best-effort low-stock alert for one product's variants.
    ///
    /// Email failure never fails the request that triggered the alert.
    async fn alert_low_stock(&self, product_id: ProductId) {
        let Some(email) = self.email else {
            return;
        };

        let low = match self.reports.low_stock(self.low_stock_threshold).await {
            Ok(all) => all
                .into_iter()
                .filter(|v| v.product_id == product_id)
                .collect::<Vec<_>>(),
            Err(e) => {
                tracing::warn!("Low-stock query failed: {e}");
                return;
            }
        };

        if low.is_empty() {
            return;
        }

        if let Err(e) = email
            .send_low_stock_alert(self.admin_email, self.low_stock_threshold, &low)
            .await
        {
            tracing::warn!("Low-stock alert email failed: {e}");
        }
    }

    /// Resolve an `/uploads/<name>` URL back to a path in the upload dir.
    ///
    /// Returns `None` for URLs outside the upload dir (nothing to unlink).
    fn file_path_for(&self, image_url: &str) -> Option<PathBuf> {
        let name = image_url.strip_prefix("/uploads/")?;
        // Reject anything that could escape the upload dir
        if name.contains('/') || name.contains("..") {
            return None;
        }
        Some(self.upload_dir.join(name))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use telar_core::ColorId;

    fn stored(id: i32, color: i32, size: &str, price: i64, stock: i32) -> ProductVariant {
        ProductVariant {
            id: VariantId::new(id),
            product_id: ProductId::new(1),
            color_id: ColorId::new(color),
            size: size.to_string(),
            price: Decimal::new(price, 2),
            stock,
            sku: None,
            is_active: true,
        }
    }

    fn submitted(
        id: Option<i32>,
        color: i32,
        size: &str,
        price: i64,
        stock: i32,
    ) -> SubmittedVariant {
        SubmittedVariant {
            variant_id: id.map(VariantId::new),
            color_id: ColorId::new(color),
            size: size.to_string(),
            price: Decimal::new(price, 2),
            stock,
            sku: None,
            is_active: true,
        }
    }

    #[test]
    fn test_plan_identical_submission_is_empty() {
        let existing = vec![stored(1, 10, "M", 19_990, 5), stored(2, 11, "L", 19_990, 3)];
        let same = vec![
            submitted(Some(1), 10, "M", 19_990, 5),
            submitted(Some(2), 11, "L", 19_990, 3),
        ];

        let plan = plan_variant_changes(&existing, &same);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_is_idempotent_after_apply() {
        // Simulate applying a plan, then re-submitting the same list
        let existing = vec![stored(1, 10, "M", 19_990, 5)];
        let submission = vec![submitted(Some(1), 10, "M", 19_990, 2)];

        let first = plan_variant_changes(&existing, &submission);
        assert_eq!(first.updates.len(), 1);

        // After persistence the stored row matches the submission
        let applied = vec![stored(1, 10, "M", 19_990, 2)];
        let second = plan_variant_changes(&applied, &submission);
        assert!(second.is_empty());
    }

    #[test]
    fn test_plan_dirty_check_updates_only_changed_rows() {
        let existing = vec![stored(1, 10, "M", 19_990, 5), stored(2, 11, "L", 19_990, 3)];
        let submission = vec![
            submitted(Some(1), 10, "M", 19_990, 5), // unchanged
            submitted(Some(2), 11, "L", 17_990, 3), // price changed
        ];

        let plan = plan_variant_changes(&existing, &submission);
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates.first().unwrap().0, VariantId::new(2));
        assert!(plan.inserts.is_empty());
        assert!(plan.deletes.is_empty());
    }

    #[test]
    fn test_plan_matches_by_color_and_size_without_id() {
        let existing = vec![stored(1, 10, "M", 19_990, 5)];
        // Same (color, size), no id, new stock
        let submission = vec![submitted(None, 10, "M", 19_990, 8)];

        let plan = plan_variant_changes(&existing, &submission);
        assert_eq!(plan.updates.len(), 1);
        assert!(plan.inserts.is_empty());
        // Matched rows must not be deleted
        assert!(plan.deletes.is_empty());
    }

    #[test]
    fn test_plan_inserts_unmatched_submissions() {
        let existing = vec![stored(1, 10, "M", 19_990, 5)];
        let submission = vec![
            submitted(Some(1), 10, "M", 19_990, 5),
            submitted(None, 10, "XL", 19_990, 2),
        ];

        let plan = plan_variant_changes(&existing, &submission);
        assert!(plan.updates.is_empty());
        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts.first().unwrap().size, "XL");
        assert!(plan.deletes.is_empty());
    }

    #[test]
    fn test_plan_deletes_stored_rows_missing_from_submission() {
        let existing = vec![stored(1, 10, "M", 19_990, 5), stored(2, 11, "L", 19_990, 3)];
        let submission = vec![submitted(Some(1), 10, "M", 19_990, 5)];

        let plan = plan_variant_changes(&existing, &submission);
        assert!(plan.updates.is_empty());
        assert!(plan.inserts.is_empty());
        assert_eq!(plan.deletes, vec![VariantId::new(2)]);
    }

    #[test]
    fn test_plan_empty_submission_deletes_everything() {
        let existing = vec![stored(1, 10, "M", 19_990, 5), stored(2, 11, "L", 19_990, 3)];

        let plan = plan_variant_changes(&existing, &[]);
        assert_eq!(plan.deletes.len(), 2);
    }

    #[test]
    fn test_parse_image_field() {
        assert_eq!(parse_image_field("variants[0][images][0]"), Some((0, 0)));
        assert_eq!(parse_image_field("variants[2][images][13]"), Some((2, 13)));
    }

    #[test]
    fn test_parse_image_field_rejects_other_shapes() {
        assert_eq!(parse_image_field("variants[0][sku]"), None);
        assert_eq!(parse_image_field("images[0]"), None);
        assert_eq!(parse_image_field("variants[a][images][0]"), None);
        assert_eq!(parse_image_field("variants[0][images][b]"), None);
        assert_eq!(parse_image_field(""), None);
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("polera azul.png"), "polera_azul.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name(""), "image");
    }
}
