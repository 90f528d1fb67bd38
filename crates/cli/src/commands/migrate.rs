//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! telar migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - MySQL connection string

use super::CommandError;

/// Run the server's embedded migrations.
///
/// # Errors
///
/// Returns `CommandError` when the database is unreachable or a migration
/// fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
