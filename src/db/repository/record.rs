use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::{format_timestamp, parse_timestamp, parse_uuid, DatabaseError};
use crate::models::*;

const RECORD_COLUMNS: &str =
    "id, data, last_token_used, submission_count, created_at, updated_at";

pub fn insert_record(conn: &Connection, record: &MedicalRecord) -> Result<(), DatabaseError> {
    let data = serde_json::to_string(&record.fields)?;
    conn.execute(
        "INSERT INTO medical_records
         (id, nombre, data, last_token_used, submission_count, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id.to_string(),
            record.fields.nombre,
            data,
            record.last_token_used,
            record.submission_count,
            format_timestamp(&record.created_at),
            format_timestamp(&record.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_record(conn: &Connection, id: &Uuid) -> Result<Option<MedicalRecord>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM medical_records WHERE id = ?1"),
            params![id.to_string()],
            read_row,
        )
        .optional()?;
    row.map(record_from_row).transpose()
}

pub fn record_exists(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM medical_records WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Overwrite a record's answers in place and count one more submission.
///
/// Returns `false` when no record has that id.
pub fn apply_record_update(
    conn: &Connection,
    id: &Uuid,
    fields: &RecordFields,
    token: &str,
    now: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    let data = serde_json::to_string(fields)?;
    let changed = conn.execute(
        "UPDATE medical_records
         SET nombre = ?2, data = ?3, last_token_used = ?4,
             submission_count = submission_count + 1, updated_at = ?5
         WHERE id = ?1",
        params![id.to_string(), fields.nombre, data, token, format_timestamp(&now)],
    )?;
    Ok(changed == 1)
}

/// Newest-first page of records. `page` is 1-based.
pub fn list_records(
    conn: &Connection,
    filter: &RecordFilter,
    page: u32,
    limit: u32,
) -> Result<Vec<MedicalRecord>, DatabaseError> {
    let offset = i64::from(page.saturating_sub(1)) * i64::from(limit);
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM medical_records
         WHERE (?1 IS NULL OR instr(lower(nombre), lower(?1)) > 0)
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?2 OFFSET ?3"
    ))?;

    let rows = stmt.query_map(params![search_term(filter), limit, offset], read_row)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(record_from_row(row?)?);
    }
    Ok(records)
}

pub fn count_records(conn: &Connection, filter: &RecordFilter) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM medical_records
         WHERE (?1 IS NULL OR instr(lower(nombre), lower(?1)) > 0)",
        params![search_term(filter)],
        |row| row.get(0),
    )?)
}

pub fn count_records_since(conn: &Connection, since: DateTime<Utc>) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM medical_records WHERE created_at >= ?1",
        params![format_timestamp(&since)],
        |row| row.get(0),
    )?)
}

/// Delete a record row only. Callers remove dependent tokens first.
pub fn delete_record(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM medical_records WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(changed == 1)
}

fn search_term(filter: &RecordFilter) -> Option<&str> {
    filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

// Internal row type for MedicalRecord mapping
struct RecordRow {
    id: String,
    data: String,
    last_token_used: Option<String>,
    submission_count: u32,
    created_at: String,
    updated_at: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordRow> {
    Ok(RecordRow {
        id: row.get(0)?,
        data: row.get(1)?,
        last_token_used: row.get(2)?,
        submission_count: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn record_from_row(row: RecordRow) -> Result<MedicalRecord, DatabaseError> {
    Ok(MedicalRecord {
        id: parse_uuid(&row.id)?,
        fields: serde_json::from_str(&row.data)?,
        last_token_used: row.last_token_used,
        submission_count: row.submission_count,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}
