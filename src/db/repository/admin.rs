use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::{format_timestamp, parse_timestamp, parse_uuid, DatabaseError};
use crate::models::*;

pub fn insert_admin(conn: &Connection, admin: &Admin) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO admins (id, username, password_hash, email, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            admin.id.to_string(),
            admin.username,
            admin.password_hash,
            admin.email,
            format_timestamp(&admin.created_at),
            format_timestamp(&admin.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_admin_by_username(conn: &Connection, username: &str) -> Result<Option<Admin>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, username, password_hash, email, created_at, updated_at
             FROM admins WHERE username = ?1",
            params![username],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, username, password_hash, email, created_at, updated_at)| {
        Ok(Admin {
            id: parse_uuid(&id)?,
            username,
            password_hash,
            email,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    })
    .transpose()
}

pub fn count_admins(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))?)
}

/// Replace an admin's password hash, and email when given.
pub fn update_admin_credentials(
    conn: &Connection,
    id: &Uuid,
    password_hash: &str,
    email: Option<&str>,
) -> Result<(), DatabaseError> {
    let now = format_timestamp(&chrono::Utc::now());
    let changed = conn.execute(
        "UPDATE admins
         SET password_hash = ?2, email = COALESCE(?3, email), updated_at = ?4
         WHERE id = ?1",
        params![id.to_string(), password_hash, email, now],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "admin".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
