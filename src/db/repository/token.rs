use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::{format_timestamp, parse_timestamp, parse_uuid, DatabaseError};
use crate::models::*;

const TOKEN_COLUMNS: &str = "t.id, t.token, t.status, t.record_id, t.generated_by, t.expires_at,
     t.submitted_at, t.created_at, t.updated_at";

pub fn insert_token(conn: &Connection, token: &FormToken) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO form_tokens
         (id, token, status, record_id, generated_by, expires_at, submitted_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            token.id.to_string(),
            token.token,
            token.status.as_str(),
            token.record_id.map(|id| id.to_string()),
            token.generated_by.to_string(),
            token.expires_at.as_ref().map(format_timestamp),
            token.submitted_at.as_ref().map(format_timestamp),
            format_timestamp(&token.created_at),
            format_timestamp(&token.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_token(conn: &Connection, token: &str) -> Result<Option<FormToken>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {TOKEN_COLUMNS} FROM form_tokens t WHERE t.token = ?1"),
            params![token],
            read_row,
        )
        .optional()?;
    row.map(token_from_row).transpose()
}

/// `pending → expired`. Returns whether a transition happened.
pub fn expire_token(conn: &Connection, token: &str, now: DateTime<Utc>) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE form_tokens SET status = 'expired', updated_at = ?2
         WHERE token = ?1 AND status = 'pending'",
        params![token, format_timestamp(&now)],
    )?;
    Ok(changed == 1)
}

/// `pending → submitted`, stamping the submission time.
///
/// Guarded on the current status: returns `false` (and changes nothing) when
/// the token is no longer pending.
pub fn mark_token_submitted(conn: &Connection, token: &str, now: DateTime<Utc>) -> Result<bool, DatabaseError> {
    let ts = format_timestamp(&now);
    let changed = conn.execute(
        "UPDATE form_tokens SET status = 'submitted', submitted_at = ?2, updated_at = ?2
         WHERE token = ?1 AND status = 'pending'",
        params![token, ts],
    )?;
    Ok(changed == 1)
}

/// Expire every pending token whose deadline is at or before `now`.
pub fn expire_overdue_tokens(conn: &Connection, now: DateTime<Utc>) -> Result<usize, DatabaseError> {
    let ts = format_timestamp(&now);
    Ok(conn.execute(
        "UPDATE form_tokens SET status = 'expired', updated_at = ?1
         WHERE status = 'pending' AND expires_at IS NOT NULL AND expires_at <= ?1",
        params![ts],
    )?)
}

pub fn delete_tokens_for_record(conn: &Connection, record_id: &Uuid) -> Result<usize, DatabaseError> {
    Ok(conn.execute(
        "DELETE FROM form_tokens WHERE record_id = ?1",
        params![record_id.to_string()],
    )?)
}

pub fn count_tokens_for_record(conn: &Connection, record_id: &Uuid) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM form_tokens WHERE record_id = ?1",
        params![record_id.to_string()],
        |row| row.get(0),
    )?)
}

/// Newest-first tokens with the bound record's name and the issuer's username.
pub fn list_tokens(
    conn: &Connection,
    status: Option<TokenStatus>,
    limit: u32,
) -> Result<Vec<TokenSummary>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TOKEN_COLUMNS}, r.nombre, a.username
         FROM form_tokens t
         LEFT JOIN medical_records r ON r.id = t.record_id
         LEFT JOIN admins a ON a.id = t.generated_by
         WHERE (?1 IS NULL OR t.status = ?1)
         ORDER BY t.created_at DESC, t.rowid DESC
         LIMIT ?2"
    ))?;

    let rows = stmt.query_map(params![status.map(|s| s.as_str()), limit], |row| {
        Ok((
            read_row(row)?,
            row.get::<_, Option<String>>(9)?,
            row.get::<_, Option<String>>(10)?,
        ))
    })?;

    let mut tokens = Vec::new();
    for row in rows {
        let (token_row, record_nombre, generated_by_username) = row?;
        tokens.push(TokenSummary {
            token: token_from_row(token_row)?,
            record_nombre,
            generated_by_username,
        });
    }
    Ok(tokens)
}

pub fn count_tokens(conn: &Connection, status: Option<TokenStatus>) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM form_tokens WHERE (?1 IS NULL OR status = ?1)",
        params![status.map(|s| s.as_str())],
        |row| row.get(0),
    )?)
}

// Internal row type for FormToken mapping
struct TokenRow {
    id: String,
    token: String,
    status: String,
    record_id: Option<String>,
    generated_by: String,
    expires_at: Option<String>,
    submitted_at: Option<String>,
    created_at: String,
    updated_at: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TokenRow> {
    Ok(TokenRow {
        id: row.get(0)?,
        token: row.get(1)?,
        status: row.get(2)?,
        record_id: row.get(3)?,
        generated_by: row.get(4)?,
        expires_at: row.get(5)?,
        submitted_at: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn token_from_row(row: TokenRow) -> Result<FormToken, DatabaseError> {
    Ok(FormToken {
        id: parse_uuid(&row.id)?,
        token: row.token,
        status: TokenStatus::from_str(&row.status)?,
        record_id: row.record_id.as_deref().map(parse_uuid).transpose()?,
        generated_by: parse_uuid(&row.generated_by)?,
        expires_at: row.expires_at.as_deref().map(parse_timestamp).transpose()?,
        submitted_at: row.submitted_at.as_deref().map(parse_timestamp).transpose()?,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}
