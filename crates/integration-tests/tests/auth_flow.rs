//! Integration tests for registration, login and session handling.
//!
//! These tests require a running server and database; see the crate docs.
//! Run with: `cargo test -p telar-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use telar_integration_tests::{base_url, client, unique_email};

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_register_login_me_logout() {
    let http = client();
    let base = base_url();
    let email = unique_email();

    // Register
    let resp = http
        .post(format!("{base}/auth/register"))
        .json(&json!({
            "rut": "12345678-5",
            "email": email,
            "password": "contraseña-segura",
            "first_name": "Prueba",
            "last_name": "Integración",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // The session cookie from registration authenticates /auth/me
    let resp = http.get(format!("{base}/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["email"], email.as_str());

    // Logout drops the session
    let resp = http
        .post(format!("{base}/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = http.get(format!("{base}/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_duplicate_registration_conflicts() {
    let http = client();
    let base = base_url();
    let email = unique_email();

    let payload = json!({
        "rut": "12345678-5",
        "email": email,
        "password": "contraseña-segura",
        "first_name": "Prueba",
        "last_name": "Duplicada",
    });

    let resp = http
        .post(format!("{base}/auth/register"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client()
        .post(format!("{base}/auth/register"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_login_with_wrong_password_is_unauthorized() {
    let http = client();
    let base = base_url();

    let resp = http
        .post(format!("{base}/auth/login"))
        .json(&json!({
            "email": unique_email(),
            "password": "definitivamente-incorrecta",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_admin_routes_reject_customers() {
    let http = client();
    let base = base_url();
    let email = unique_email();

    let resp = http
        .post(format!("{base}/auth/register"))
        .json(&json!({
            "rut": "12345678-5",
            "email": email,
            "password": "contraseña-segura",
            "first_name": "Cliente",
            "last_name": "Normal",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // A plain customer must not reach the back-office
    let resp = http
        .get(format!("{base}/admin/users"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // And a guest gets 401
    let resp = client()
        .get(format!("{base}/admin/users"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
