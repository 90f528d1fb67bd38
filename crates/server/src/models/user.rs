//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use telar_core::{Email, UserId, UserRole};

/// A registered account (domain type).
///
/// The password hash never leaves the repository layer; it is not part of
/// this type.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Chilean tax identifier (RUT), as entered at registration.
    pub rut: String,
    /// User's email address.
    pub email: Email,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// Region (first-level division).
    pub region: Option<String>,
    /// Commune (second-level division).
    pub commune: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// Account role.
    pub role: UserRole,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub rut: String,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub region: Option<String>,
    pub commune: Option<String>,
    pub postal_code: Option<String>,
    pub role: UserRole,
}

/// Fields an admin (or the user) may change on an existing account.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub region: Option<String>,
    pub commune: Option<String>,
    pub postal_code: Option<String>,
    pub role: Option<UserRole>,
}
