//! Admin login.
//!
//! `POST /api/admin/login`: exchange username + password for a bearer
//! session. Password derivation is CPU-bound and runs off the async workers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::accounts;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::AdminProfile;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub admin: AdminProfile,
}

/// `POST /api/admin/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest("Username and password are required".into()));
    }

    let core = ctx.core.clone();
    let session = tokio::task::spawn_blocking(move || {
        let conn = core.open_db()?;
        accounts::authenticate(
            &conn,
            &request.username,
            &request.password,
            &core.config,
            core.now(),
        )
        .map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Login task failed: {e}")))??;

    Ok(Json(LoginResponse {
        success: true,
        token: session.token,
        admin: session.admin,
    }))
}
