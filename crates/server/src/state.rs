//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::MySqlPool;

use crate::config::ServerConfig;
use crate::paypal::PayPalClient;
use crate::services::email::EmailService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: MySqlPool,
    paypal: PayPalClient,
    email: Option<EmailService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// A broken SMTP configuration only disables email (all sends are
    /// best-effort anyway); it does not prevent startup.
    #[must_use]
    pub fn new(config: ServerConfig, pool: MySqlPool) -> Self {
        let paypal = PayPalClient::new(&config.paypal);

        let email = match EmailService::new(&config.email) {
            Ok(service) => Some(service),
            Err(e) => {
                tracing::warn!("Email disabled, SMTP configuration rejected: {e}");
                None
            }
        };

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                paypal,
                email,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &MySqlPool {
        &self.inner.pool
    }

    /// Get a reference to the PayPal client.
    #[must_use]
    pub fn paypal(&self) -> &PayPalClient {
        &self.inner.paypal
    }

    /// Get the email service, when SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }
}
