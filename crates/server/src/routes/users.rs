//! Admin user management route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use telar_core::{UserId, UserRole};

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{UpdateUser, User};
use crate::state::AppState;

/// Payload for an admin user update.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub region: Option<String>,
    pub commune: Option<String>,
    pub postal_code: Option<String>,
    pub role: Option<String>,
}

/// List all users (admin).
#[instrument(skip(state))]
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>> {
    Ok(Json(UserRepository::new(state.pool()).list().await?))
}

/// Get one user (admin).
#[instrument(skip(state))]
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<User>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuario no encontrado".to_owned()))?;

    Ok(Json(user))
}

/// Update a user's profile or role (admin).
#[instrument(skip(state, body))]
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    let role = body
        .role
        .as_deref()
        .map(str::parse::<UserRole>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let changes = UpdateUser {
        first_name: body.first_name,
        last_name: body.last_name,
        phone: body.phone,
        address: body.address,
        region: body.region,
        commune: body.commune,
        postal_code: body.postal_code,
        role,
    };

    let user = UserRepository::new(state.pool()).update(id, &changes).await?;
    Ok(Json(user))
}

/// Delete a user (admin). Refused while orders or a cart reference them.
#[instrument(skip(state))]
pub async fn remove(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<Value>> {
    if admin.id == id {
        return Err(AppError::BadRequest(
            "No puedes eliminar tu propia cuenta".to_owned(),
        ));
    }

    let repo = UserRepository::new(state.pool());

    let references = repo.reference_count(id).await?;
    if references > 0 {
        return Err(AppError::BadRequest(format!(
            "No se puede eliminar: el usuario tiene {references} pedido(s) o carrito(s) asociados"
        )));
    }

    repo.delete(id).await?;
    Ok(Json(json!({ "message": "Usuario eliminado" })))
}
