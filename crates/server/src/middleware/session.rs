//! Session middleware configuration.
//!
//! Sets up MySQL-backed sessions using tower-sessions.

use sqlx::MySqlPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::MySqlStore;

use crate::config::ServerConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "telar_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with a MySQL store.
///
/// The store's own schema migration runs here; it is idempotent and owns
/// only the `sessions` table.
///
/// # Errors
///
/// Returns the store's migration error if the sessions table cannot be
/// created.
pub async fn create_session_layer(
    pool: &MySqlPool,
    config: &ServerConfig,
) -> Result<SessionManagerLayer<MySqlStore>, sqlx::Error> {
    let store = MySqlStore::new(pool.clone());
    store.migrate().await?;

    // Determine if we're in production (HTTPS)
    let is_secure = config.base_url.starts_with("https://");

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/"))
}
