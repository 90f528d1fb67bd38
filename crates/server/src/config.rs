//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - MySQL connection string
//! - `TELAR_BASE_URL` - Public URL the API is served from
//! - `TELAR_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `FRONTEND_URL` - SPA origin allowed by CORS and used in PayPal return URLs
//! - `EMAIL_HOST` - SMTP relay hostname
//! - `EMAIL_USER` - SMTP username (also the From address)
//! - `EMAIL_PASSWORD` - SMTP password
//! - `ADMIN_EMAIL` - Recipient for low-stock alerts
//! - `PAYPAL_CLIENT_ID` - PayPal REST client id
//! - `PAYPAL_CLIENT_SECRET` - PayPal REST client secret
//!
//! ## Optional
//! - `TELAR_HOST` - Bind address (default: 127.0.0.1)
//! - `TELAR_PORT` - Listen port (default: 3000)
//! - `EMAIL_PORT` - SMTP port (default: 587)
//! - `PAYPAL_ENVIRONMENT` - `sandbox` (default) or `live`
//! - `PAYPAL_CURRENCY` - Checkout currency code (default: USD)
//! - `UPLOAD_DIR` - Product image directory (default: uploads)
//! - `LOW_STOCK_THRESHOLD` - Stock level that triggers alerts (default: 5)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use telar_core::CurrencyCode;
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// MySQL database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the API
    pub base_url: String,
    /// SPA origin for CORS and payment return URLs
    pub frontend_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// SMTP configuration
    pub email: EmailConfig,
    /// PayPal REST API configuration
    pub paypal: PayPalConfig,
    /// Directory where uploaded product images are stored
    pub upload_dir: PathBuf,
    /// Recipient address for low-stock alerts
    pub admin_email: String,
    /// Stock level at or below which an alert is raised
    pub low_stock_threshold: i32,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// SMTP relay configuration for transactional email.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP relay hostname
    pub smtp_host: String,
    /// SMTP relay port
    pub smtp_port: u16,
    /// SMTP username, also used as the From address
    pub smtp_username: String,
    /// SMTP password
    pub smtp_password: SecretString,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .finish()
    }
}

/// PayPal REST API configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct PayPalConfig {
    /// REST client id
    pub client_id: String,
    /// REST client secret
    pub client_secret: SecretString,
    /// Target environment (sandbox or live)
    pub environment: PayPalEnvironment,
    /// Currency used for checkout
    pub currency: CurrencyCode,
}

impl std::fmt::Debug for PayPalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayPalConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("environment", &self.environment)
            .field("currency", &self.currency)
            .finish()
    }
}

/// PayPal API environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayPalEnvironment {
    Sandbox,
    Live,
}

impl PayPalEnvironment {
    /// Base URL of the REST API for this environment.
    #[must_use]
    pub const fn base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://api-m.sandbox.paypal.com",
            Self::Live => "https://api-m.paypal.com",
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_required_secret("DATABASE_URL")?;
        let host = get_env_or_default("TELAR_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("TELAR_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("TELAR_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("TELAR_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("TELAR_BASE_URL")?;
        let frontend_url = get_required_env("FRONTEND_URL")?;
        let session_secret = get_validated_secret("TELAR_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "TELAR_SESSION_SECRET")?;

        let email = EmailConfig::from_env()?;
        let paypal = PayPalConfig::from_env()?;

        let upload_dir = PathBuf::from(get_env_or_default("UPLOAD_DIR", "uploads"));
        let admin_email = get_required_env("ADMIN_EMAIL")?;
        let low_stock_threshold = get_env_or_default("LOW_STOCK_THRESHOLD", "5")
            .parse::<i32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("LOW_STOCK_THRESHOLD".to_string(), e.to_string())
            })?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            frontend_url,
            session_secret,
            email,
            paypal,
            upload_dir,
            admin_email,
            low_stock_threshold,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            smtp_host: get_required_env("EMAIL_HOST")?,
            smtp_port: get_env_or_default("EMAIL_PORT", "587")
                .parse::<u16>()
                .map_err(|e| {
                    ConfigError::InvalidEnvVar("EMAIL_PORT".to_string(), e.to_string())
                })?,
            smtp_username: get_required_env("EMAIL_USER")?,
            smtp_password: get_required_secret("EMAIL_PASSWORD")?,
        })
    }
}

impl PayPalConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let environment = match get_env_or_default("PAYPAL_ENVIRONMENT", "sandbox").as_str() {
            "sandbox" => PayPalEnvironment::Sandbox,
            "live" => PayPalEnvironment::Live,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "PAYPAL_ENVIRONMENT".to_string(),
                    format!("expected 'sandbox' or 'live', got '{other}'"),
                ));
            }
        };

        let currency = get_env_or_default("PAYPAL_CURRENCY", "USD")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("PAYPAL_CURRENCY".to_string(), e))?;

        Ok(Self {
            client_id: get_required_env("PAYPAL_CLIENT_ID")?,
            client_secret: get_validated_secret("PAYPAL_CLIENT_SECRET")?,
            environment,
            currency,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_changeme() {
        let result = validate_secret_strength("changeme123", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_session_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_ok());
    }

    #[test]
    fn test_paypal_environment_base_urls() {
        assert!(
            PayPalEnvironment::Sandbox
                .base_url()
                .contains("sandbox.paypal.com")
        );
        assert_eq!(
            PayPalEnvironment::Live.base_url(),
            "https://api-m.paypal.com"
        );
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: SecretString::from("mysql://localhost/telar"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            email: EmailConfig {
                smtp_host: "smtp.test".to_string(),
                smtp_port: 587,
                smtp_username: "tienda@telar.cl".to_string(),
                smtp_password: SecretString::from("pw"),
            },
            paypal: PayPalConfig {
                client_id: "client-id".to_string(),
                client_secret: SecretString::from("cs"),
                environment: PayPalEnvironment::Sandbox,
                currency: CurrencyCode::USD,
            },
            upload_dir: PathBuf::from("uploads"),
            admin_email: "admin@telar.cl".to_string(),
            low_stock_threshold: 5,
            sentry_dsn: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_email_config_debug_redacts_password() {
        let config = EmailConfig {
            smtp_host: "smtp.test".to_string(),
            smtp_port: 587,
            smtp_username: "tienda@telar.cl".to_string(),
            smtp_password: SecretString::from("super_secret_smtp_password"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("smtp.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_smtp_password"));
    }

    #[test]
    fn test_paypal_config_debug_redacts_secret() {
        let config = PayPalConfig {
            client_id: "visible-client-id".to_string(),
            client_secret: SecretString::from("super_secret_client_secret"),
            environment: PayPalEnvironment::Sandbox,
            currency: CurrencyCode::USD,
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("visible-client-id"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_client_secret"));
    }
}
