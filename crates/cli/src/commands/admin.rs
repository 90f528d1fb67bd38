//! Admin user management command.

use telar_core::{Email, UserRole};
use telar_server::db::UserRepository;
use telar_server::models::NewUser;
use telar_server::services::auth::hash_password;

/// Create an admin user.
///
/// # Errors
///
/// Returns an error if the email is invalid, the password cannot be hashed,
/// or the insert fails (e.g. the email is taken).
pub async fn create_user(
    email: &str,
    rut: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    let email = Email::parse(email)?;
    let password_hash = hash_password(password).map_err(|e| e.to_string())?;

    let new_user = NewUser {
        rut: rut.to_owned(),
        email,
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        phone: None,
        address: None,
        region: None,
        commune: None,
        postal_code: None,
        role: UserRole::Admin,
    };

    let user = UserRepository::new(&pool)
        .create(&new_user, &password_hash)
        .await?;

    tracing::info!(id = %user.id, email = %user.email, "Admin user created");
    Ok(())
}
