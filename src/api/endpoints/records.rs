//! Record administration.
//!
//! - `GET /api/admin/records`: paginated listing with optional name search
//! - `GET /api/admin/records/:id`: one record
//! - `DELETE /api/admin/records/:id`: delete a record and its tokens

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::MedicalRecord;
use crate::records::{self, RecordPage};

use super::parse_record_id;

/// Query values are kept as text so a bad number falls back to its default
/// instead of rejecting the request.
#[derive(Deserialize, Default)]
pub struct RecordListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
}

#[derive(Serialize)]
pub struct RecordListResponse {
    pub success: bool,
    #[serde(flatten)]
    pub page: RecordPage,
}

/// `GET /api/admin/records`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<RecordListQuery>,
) -> Result<Json<RecordListResponse>, ApiError> {
    let page = query.page.and_then(|p| p.trim().parse::<u32>().ok());
    let limit = query.limit.and_then(|l| l.trim().parse::<u32>().ok());
    let search = query
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let conn = ctx.core.open_db()?;
    let page = records::list_page(&conn, page, limit, search)?;
    Ok(Json(RecordListResponse {
        success: true,
        page,
    }))
}

#[derive(Serialize)]
pub struct RecordResponse {
    pub success: bool,
    pub record: MedicalRecord,
}

/// `GET /api/admin/records/:id`
pub async fn get(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<RecordResponse>, ApiError> {
    let id = parse_record_id(&id)?;
    let conn = ctx.core.open_db()?;
    let record = db::get_record(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Record not found".into()))?;
    Ok(Json(RecordResponse {
        success: true,
        record,
    }))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `DELETE /api/admin/records/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_record_id(&id)?;
    let conn = ctx.core.open_db()?;
    if !records::delete_cascade(&conn, &id)? {
        return Err(ApiError::NotFound("Record not found".into()));
    }
    Ok(Json(DeleteResponse {
        success: true,
        message: "Record deleted successfully",
    }))
}
