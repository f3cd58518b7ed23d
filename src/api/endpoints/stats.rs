//! `GET /api/admin/stats`: dashboard counters.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::{self, IntakeStats};

#[derive(Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: IntakeStats,
}

pub async fn summary(State(ctx): State<ApiContext>) -> Result<Json<StatsResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let stats = db::collect_stats(&conn, ctx.core.now())?;
    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}
