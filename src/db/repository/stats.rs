use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;

use super::{count_records, count_records_since, count_tokens};
use crate::db::DatabaseError;
use crate::models::*;

/// Window used for the "recent records" counter.
pub const RECENT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeStats {
    pub total_records: i64,
    pub total_tokens: i64,
    pub pending_tokens: i64,
    pub submitted_tokens: i64,
    pub expired_tokens: i64,
    pub recent_records: i64,
}

pub fn collect_stats(conn: &Connection, now: DateTime<Utc>) -> Result<IntakeStats, DatabaseError> {
    Ok(IntakeStats {
        total_records: count_records(conn, &RecordFilter::default())?,
        total_tokens: count_tokens(conn, None)?,
        pending_tokens: count_tokens(conn, Some(TokenStatus::Pending))?,
        submitted_tokens: count_tokens(conn, Some(TokenStatus::Submitted))?,
        expired_tokens: count_tokens(conn, Some(TokenStatus::Expired))?,
        recent_records: count_records_since(conn, now - Duration::days(RECENT_WINDOW_DAYS))?,
    })
}
