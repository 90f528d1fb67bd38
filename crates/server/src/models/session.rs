//! Session state types and keys.

use serde::{Deserialize, Serialize};

use telar_core::{UserId, UserRole};

use super::user::User;

/// Session storage keys.
pub mod session_keys {
    /// The authenticated user snapshot.
    pub const CURRENT_USER: &str = "current_user";
}

/// Snapshot of the authenticated user stored in the session.
///
/// Kept small on purpose: routes that need the full profile load it from the
/// database by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User id.
    pub id: UserId,
    /// Email at login time.
    pub email: String,
    /// Role at login time.
    pub role: UserRole,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.as_str().to_owned(),
            role: user.role,
        }
    }
}
