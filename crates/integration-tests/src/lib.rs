//! Integration tests for Telar.
//!
//! # Running Tests
//!
//! These tests drive a running server over HTTP and are `#[ignore]`-gated;
//! they require:
//!
//! - A running MySQL database with migrations applied
//!   (`cargo run -p telar-cli -- migrate && cargo run -p telar-cli -- seed`)
//! - The server running (`cargo run -p telar-server`)
//! - An admin account (`cargo run -p telar-cli -- admin create ...`) with
//!   its credentials in `TEST_ADMIN_EMAIL` / `TEST_ADMIN_PASSWORD`
//!
//! ```bash
//! cargo test -p telar-integration-tests -- --ignored
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::Client;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("TELAR_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Create an HTTP client with a cookie store (sessions are cookie-based).
///
/// # Panics
///
/// Panics if the client cannot be constructed.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A unique email address for registration tests.
#[must_use]
pub fn unique_email() -> String {
    format!("test-{}@example.com", uuid::Uuid::new_v4())
}
