//! `GET /api/admin/tokens`: newest share links, optionally by status.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::{TokenStatus, TokenSummary};

pub const TOKEN_LIST_LIMIT: u32 = 50;

#[derive(Deserialize, Default)]
pub struct TokenListQuery {
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct TokenListResponse {
    pub success: bool,
    pub tokens: Vec<TokenSummary>,
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<TokenListQuery>,
) -> Result<Json<TokenListResponse>, ApiError> {
    // Unknown values list everything.
    let status = query
        .status
        .and_then(|s| s.trim().parse::<TokenStatus>().ok());

    let conn = ctx.core.open_db()?;
    let tokens = db::list_tokens(&conn, status, TOKEN_LIST_LIMIT)?;
    Ok(Json(TokenListResponse {
        success: true,
        tokens,
    }))
}
