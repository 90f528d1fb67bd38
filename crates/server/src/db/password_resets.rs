//! Password reset code repository.
//!
//! One active code per email: issuing a new code deletes every prior row for
//! the address, so older codes are superseded even before they expire.

use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use telar_core::Email;

use super::RepositoryError;

/// A stored reset code.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResetCodeRow {
    pub id: i32,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

/// Repository for password reset codes.
pub struct PasswordResetRepository<'a> {
    pool: &'a MySqlPool,
}

impl<'a> PasswordResetRepository<'a> {
    /// Create a new password reset repository.
    #[must_use]
    pub const fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// Store a fresh code for an email, superseding any previous codes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn issue(
        &self,
        email: &Email,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM password_reset_codes WHERE email = ?")
            .bind(email.as_str())
            .execute(self.pool)
            .await?;

        sqlx::query(
            "INSERT INTO password_reset_codes (email, code, expires_at, used) \
             VALUES (?, ?, ?, 0)",
        )
        .bind(email.as_str())
        .bind(code)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Find the stored code row for an (email, code) pair.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(
        &self,
        email: &Email,
        code: &str,
    ) -> Result<Option<ResetCodeRow>, RepositoryError> {
        let row = sqlx::query_as::<_, ResetCodeRow>(
            "SELECT id, email, code, expires_at, used \
             FROM password_reset_codes WHERE email = ? AND code = ?",
        )
        .bind(email.as_str())
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Flip a code to used. The flag never flips back.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row doesn't exist or was
    /// already consumed.
    pub async fn mark_used(&self, id: i32) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE password_reset_codes SET used = 1 WHERE id = ? AND used = 0")
                .bind(id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
