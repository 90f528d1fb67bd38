//! Authentication route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use telar_core::{Email, UserRole};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, NewUser, User};
use crate::services::AuthService;
use crate::services::cart::{CartService, GuestItem};
use crate::state::AppState;

/// Registration payload.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub rut: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub region: Option<String>,
    pub commune: Option<String>,
    pub postal_code: Option<String>,
}

/// Login payload. `guest_cart` carries the browser-held cart for the
/// merge-on-login flow.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub guest_cart: Vec<GuestItem>,
}

/// Forgot-password payload.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Reset-password payload.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// Change-password payload.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Register a new customer account and start a session.
#[instrument(skip(state, session, body))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<Value>> {
    let email =
        Email::parse(&body.email).map_err(crate::services::auth::AuthError::InvalidEmail)?;

    if body.rut.trim().is_empty() {
        return Err(AppError::BadRequest("El RUT es obligatorio".to_owned()));
    }

    let new_user = NewUser {
        rut: body.rut,
        email,
        first_name: body.first_name,
        last_name: body.last_name,
        phone: body.phone,
        address: body.address,
        region: body.region,
        commune: body.commune,
        postal_code: body.postal_code,
        role: UserRole::Customer,
    };

    let auth = AuthService::new(state.pool());
    let user = auth.register(&new_user, &body.password).await?;

    start_session(&session, &user).await?;

    Ok(Json(json!({
        "message": "Cuenta creada con éxito",
        "user": user,
    })))
}

/// Login with email and password.
///
/// A guest cart submitted alongside the credentials is merged into the
/// server cart: per variant the greater of the two quantities wins, clamped
/// to stock.
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool());
    let user = auth.login(&body.email, &body.password).await?;

    start_session(&session, &user).await?;

    if !body.guest_cart.is_empty() {
        let carts = CartService::new(state.pool());
        if let Err(e) = carts.sync(user.id, &body.guest_cart).await {
            // The login itself succeeded; a failed merge only loses the
            // guest lines
            tracing::warn!(user_id = %user.id, "Guest cart merge failed: {e}");
        }
    }

    Ok(Json(json!({
        "message": "Sesión iniciada",
        "user": user,
    })))
}

/// Log out and clear the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<Value>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();

    Ok(Json(json!({ "message": "Sesión cerrada" })))
}

/// Return the authenticated user's profile.
#[instrument(skip(state))]
pub async fn me(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<User>> {
    let user = crate::db::UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuario no encontrado".to_owned()))?;

    Ok(Json(user))
}

/// Issue a password reset code.
///
/// Responds 200 whether or not the account exists, so the endpoint does not
/// reveal which addresses are registered. The code email is best-effort.
#[instrument(skip(state, body))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool());

    if let Some(code) = auth.request_password_reset(&body.email).await? {
        if let Some(email) = state.email() {
            if let Err(e) = email.send_reset_code(&body.email, &code).await {
                tracing::warn!("Reset code email failed: {e}");
            }
        }
    }

    Ok(Json(json!({
        "message": "Si el correo está registrado, enviamos un código de recuperación",
    })))
}

/// Consume a reset code and set a new password.
#[instrument(skip(state, body))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool());
    auth.reset_password(&body.email, &body.code, &body.new_password)
        .await?;

    Ok(Json(json!({ "message": "Contraseña actualizada" })))
}

/// Change the password of the authenticated user.
#[instrument(skip(state, body))]
pub async fn change_password(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool());
    auth.change_password(current.id, &body.current_password, &body.new_password)
        .await?;

    Ok(Json(json!({ "message": "Contraseña actualizada" })))
}

/// Store the user snapshot in the session and tag Sentry.
async fn start_session(session: &Session, user: &User) -> Result<()> {
    // Rotate the session id on privilege change
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}
