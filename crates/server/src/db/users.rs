//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use telar_core::{Email, UserId, UserRole};

use super::{RepositoryError, insert_id};
use crate::models::user::{NewUser, UpdateUser, User};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    rut: String,
    email: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    address: Option<String>,
    region: Option<String>,
    commune: Option<String>,
    postal_code: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        let role: UserRole = row
            .role
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid role: {e}")))?;

        Ok(Self {
            id: UserId::new(row.id),
            rut: row.rut,
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            address: row.address,
            region: row.region,
            commune: row.commune,
            postal_code: row.postal_code,
            role,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, rut, email, first_name, last_name, phone, address, \
                            region, commune, postal_code, role, created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a MySqlPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// List all users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user together with their password hash by email.
    ///
    /// Returns `None` if no account exists for the address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct HashRow {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, HashRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        Ok(Some((r.user.try_into()?, r.password_hash)))
    }

    /// Create a new user with the given (already hashed) password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        new_user: &NewUser,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO users \
             (rut, email, password_hash, first_name, last_name, phone, address, \
              region, commune, postal_code, role) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_user.rut)
        .bind(new_user.email.as_str())
        .bind(password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.phone)
        .bind(&new_user.address)
        .bind(&new_user.region)
        .bind(&new_user.commune)
        .bind(&new_user.postal_code)
        .bind(new_user.role.to_string())
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        let id = UserId::new(insert_id(result.last_insert_id())?);

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Update profile fields on an existing user.
    ///
    /// Fields left as `None` in `changes` keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(&self, id: UserId, changes: &UpdateUser) -> Result<User, RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET \
             first_name = COALESCE(?, first_name), \
             last_name = COALESCE(?, last_name), \
             phone = COALESCE(?, phone), \
             address = COALESCE(?, address), \
             region = COALESCE(?, region), \
             commune = COALESCE(?, commune), \
             postal_code = COALESCE(?, postal_code), \
             role = COALESCE(?, role) \
             WHERE id = ?",
        )
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.phone)
        .bind(&changes.address)
        .bind(&changes.region)
        .bind(&changes.commune)
        .bind(&changes.postal_code)
        .bind(changes.role.map(|r| r.to_string()))
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // COALESCE updates may be no-ops; distinguish a missing row
            if self.get_by_id(id).await?.is_none() {
                return Err(RepositoryError::NotFound);
            }
        }

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Replace the password hash for the account with the given email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no account exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_password_by_email(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE email = ?")
            .bind(password_hash)
            .bind(email.as_str())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Count orders and carts that reference a user.
    ///
    /// Deletion is refused while either count is non-zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reference_count(&self, id: UserId) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT (SELECT COUNT(*) FROM orders WHERE user_id = ?) \
                  + (SELECT COUNT(*) FROM carts WHERE user_id = ?)",
        )
        .bind(id.as_i32())
        .bind(id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Delete a user.
    ///
    /// Callers must check [`Self::reference_count`] first; the foreign keys
    /// will reject the delete otherwise.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
