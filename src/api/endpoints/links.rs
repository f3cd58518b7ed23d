//! Share link issuance.
//!
//! - `POST /api/admin/generate-url`: link that creates a new record
//! - `POST /api/admin/generate-edit-url/:id`: link that edits record `id`

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{AdminContext, ApiContext};
use crate::models::FormToken;
use crate::tokens;

use super::parse_record_id;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    pub success: bool,
    pub token: String,
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Uuid>,
}

/// `POST /api/admin/generate-url`
pub async fn generate(
    State(ctx): State<ApiContext>,
    Extension(admin): Extension<AdminContext>,
) -> Result<Json<LinkResponse>, ApiError> {
    let token = issue_link(&ctx, &admin, None)?;
    Ok(Json(link_response(&ctx, token)))
}

/// `POST /api/admin/generate-edit-url/:id`
pub async fn generate_edit(
    State(ctx): State<ApiContext>,
    Extension(admin): Extension<AdminContext>,
    Path(id): Path<String>,
) -> Result<Json<LinkResponse>, ApiError> {
    let record_id = parse_record_id(&id)?;
    let token = issue_link(&ctx, &admin, Some(record_id))?;
    Ok(Json(link_response(&ctx, token)))
}

fn issue_link(
    ctx: &ApiContext,
    admin: &AdminContext,
    record_id: Option<Uuid>,
) -> Result<FormToken, ApiError> {
    let conn = ctx.core.open_db()?;
    let token = tokens::issue(
        &conn,
        admin.admin_id,
        record_id,
        ctx.core.config.token_expiration,
        ctx.core.now(),
    )?;
    tracing::debug!(admin = %admin.username, token_id = %token.id, "Share link issued");
    Ok(token)
}

fn link_response(ctx: &ApiContext, token: FormToken) -> LinkResponse {
    LinkResponse {
        success: true,
        url: tokens::build_url(&ctx.core.config.frontend_url, &token.token),
        expires_at: token.expires_at,
        record_id: token.record_id,
        token: token.token,
    }
}
