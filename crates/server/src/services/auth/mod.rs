//! Authentication service.
//!
//! Password registration/login plus the 6-digit password reset flow.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use sqlx::MySqlPool;

use telar_core::{Email, UserId};

use crate::db::password_resets::{PasswordResetRepository, ResetCodeRow};
use crate::db::users::UserRepository;
use crate::db::RepositoryError;
use crate::models::user::{NewUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// How long a password reset code stays valid.
pub const RESET_CODE_TTL_MINUTES: i64 = 15;

/// Authentication service.
///
/// Handles registration, login, password changes and the reset-code flow.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    resets: PasswordResetRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a MySqlPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            resets: PasswordResetRepository::new(pool),
        }
    }

    // =========================================================================
    // Registration & Login
    // =========================================================================

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password doesn't meet
    /// requirements, `AuthError::UserAlreadyExists` if the email is taken.
    pub async fn register(&self, new_user: &NewUser, password: &str) -> Result<User, AuthError> {
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(new_user, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Change the password of an authenticated user.
    ///
    /// The current password is verified first.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the current password is
    /// wrong, `AuthError::WeakPassword` if the new one is too weak.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let (_, password_hash) = self
            .users
            .get_with_password_hash(&user.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(current_password, &password_hash)?;
        validate_password(new_password)?;

        let new_hash = hash_password(new_password)?;
        self.users.update_password(user_id, &new_hash).await?;

        Ok(())
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Issue a fresh reset code for an email.
    ///
    /// Prior codes for the address are superseded. Returns `None` when no
    /// account exists, so callers can respond identically either way and not
    /// leak which addresses are registered.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for malformed addresses and
    /// `AuthError::Repository` for database failures.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AuthError> {
        let email = Email::parse(email)?;

        if self.users.get_by_email(&email).await?.is_none() {
            return Ok(None);
        }

        let code = generate_reset_code();
        let expires_at = Utc::now() + Duration::minutes(RESET_CODE_TTL_MINUTES);
        self.resets.issue(&email, &code, expires_at).await?;

        Ok(Some(code))
    }

    /// Consume a reset code and set a new password.
    ///
    /// A code is usable at most once; the `used` flag flips irreversibly.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetCode` for unknown/used/superseded
    /// codes and `AuthError::ExpiredResetCode` past the TTL.
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        validate_password(new_password)?;

        let row = self.resets.find(&email, code).await?;
        let row = validate_reset_code(row, Utc::now())?;

        let new_hash = hash_password(new_password)?;
        self.users
            .update_password_by_email(&email, &new_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        self.resets.mark_used(row.id).await.map_err(|e| match e {
            // Lost the race with a concurrent consumption of the same code
            RepositoryError::NotFound => AuthError::InvalidResetCode,
            other => AuthError::Repository(other),
        })?;

        Ok(())
    }
}

/// Check a stored reset code row against the clock and the `used` flag.
fn validate_reset_code(
    row: Option<ResetCodeRow>,
    now: DateTime<Utc>,
) -> Result<ResetCodeRow, AuthError> {
    let Some(row) = row else {
        return Err(AuthError::InvalidResetCode);
    };

    if row.used {
        return Err(AuthError::InvalidResetCode);
    }

    if row.expires_at < now {
        return Err(AuthError::ExpiredResetCode);
    }

    Ok(row)
}

/// Generate a 6-digit numeric reset code.
#[must_use]
pub fn generate_reset_code() -> String {
    use rand::Rng;
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn code_row(used: bool, expires_in_minutes: i64) -> ResetCodeRow {
        ResetCodeRow {
            id: 1,
            email: "cliente@example.com".to_string(),
            code: "123456".to_string(),
            expires_at: Utc::now() + Duration::minutes(expires_in_minutes),
            used,
        }
    }

    #[test]
    fn test_generate_reset_code_format() {
        let code = generate_reset_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_reset_code_range() {
        for _ in 0..100 {
            let code: u32 = generate_reset_code().parse().expect("valid number");
            assert!(code >= 100_000);
            assert!(code < 1_000_000);
        }
    }

    #[test]
    fn test_validate_reset_code_ok() {
        let row = validate_reset_code(Some(code_row(false, 10)), Utc::now());
        assert!(row.is_ok());
    }

    #[test]
    fn test_validate_reset_code_missing() {
        assert!(matches!(
            validate_reset_code(None, Utc::now()),
            Err(AuthError::InvalidResetCode)
        ));
    }

    #[test]
    fn test_validate_reset_code_used_is_rejected() {
        assert!(matches!(
            validate_reset_code(Some(code_row(true, 10)), Utc::now()),
            Err(AuthError::InvalidResetCode)
        ));
    }

    #[test]
    fn test_validate_reset_code_expired() {
        assert!(matches!(
            validate_reset_code(Some(code_row(false, -1)), Utc::now()),
            Err(AuthError::ExpiredResetCode)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("corta").is_err());
        assert!(validate_password("suficientemente-larga").is_ok());
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(verify_password("hunter2hunter2", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
