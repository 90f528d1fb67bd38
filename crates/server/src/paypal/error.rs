//! PayPal client error types.

use thiserror::Error;

/// Errors that can occur talking to the PayPal REST API.
#[derive(Debug, Error)]
pub enum PayPalError {
    /// Network-level error from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// OAuth token request was rejected.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The API returned a non-success status.
    #[error("PayPal API error (HTTP {status}): {body}")]
    Api {
        /// HTTP status returned by the API.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },

    /// The API response did not have the expected shape.
    #[error("invalid PayPal response: {0}")]
    InvalidResponse(String),
}
