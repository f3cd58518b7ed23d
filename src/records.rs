//! Admin-side record operations: paging, lookup, and cascading delete.

use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::{MedicalRecord, RecordFilter};

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordPage {
    pub records: Vec<MedicalRecord>,
    pub pagination: Pagination,
}

/// Newest-first page of records. Page defaults to 1, limit to 20 (clamped to 1..=100).
pub fn list_page(
    conn: &Connection,
    page: Option<u32>,
    limit: Option<u32>,
    search: Option<String>,
) -> Result<RecordPage, DatabaseError> {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    let filter = RecordFilter { search };

    let total = db::count_records(conn, &filter)?;
    let records = db::list_records(conn, &filter, page, limit)?;
    let pages = (total + i64::from(limit) - 1) / i64::from(limit);

    Ok(RecordPage {
        records,
        pagination: Pagination {
            page,
            limit,
            total,
            pages,
        },
    })
}

/// Delete a record together with every token that references it.
///
/// Returns `false` when the record does not exist.
pub fn delete_cascade(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let tokens_removed = db::delete_tokens_for_record(&tx, id)?;
    if !db::delete_record(&tx, id)? {
        return Ok(false);
    }
    tx.commit()?;
    tracing::info!(record_id = %id, tokens_removed, "Record deleted");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::models::{Admin, RecordFields, TokenStatus};
    use crate::tokens;
    use chrono::{Duration, Utc};

    fn seed_records(conn: &Connection, count: i64) -> Vec<MedicalRecord> {
        let base = Utc::now() - Duration::days(1);
        (1..=count)
            .map(|i| {
                let fields = RecordFields {
                    nombre: format!("Paciente {i:02}"),
                    ..Default::default()
                };
                let record = MedicalRecord::from_submission(fields, "seed", base + Duration::minutes(i));
                db::insert_record(conn, &record).unwrap();
                record
            })
            .collect()
    }

    #[test]
    fn second_page_of_five_over_twelve() {
        let conn = open_memory_database().unwrap();
        seed_records(&conn, 12);

        let page = list_page(&conn, Some(2), Some(5), None).unwrap();
        assert_eq!(page.pagination, Pagination { page: 2, limit: 5, total: 12, pages: 3 });
        let names: Vec<_> = page.records.iter().map(|r| r.fields.nombre.as_str()).collect();
        assert_eq!(
            names,
            vec!["Paciente 07", "Paciente 06", "Paciente 05", "Paciente 04", "Paciente 03"]
        );
    }

    #[test]
    fn defaults_and_clamping() {
        let conn = open_memory_database().unwrap();
        seed_records(&conn, 3);

        let page = list_page(&conn, None, None, None).unwrap();
        assert_eq!(page.pagination.page, 1);
        assert_eq!(page.pagination.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(page.pagination.pages, 1);

        let page = list_page(&conn, Some(0), Some(1_000), None).unwrap();
        assert_eq!(page.pagination.page, 1);
        assert_eq!(page.pagination.limit, MAX_PAGE_LIMIT);

        let page = list_page(&conn, Some(4), Some(0), None).unwrap();
        assert_eq!(page.pagination.limit, 1);
        assert_eq!(page.pagination.pages, 3);
        assert!(page.records.is_empty());
    }

    #[test]
    fn empty_store_has_zero_pages() {
        let conn = open_memory_database().unwrap();
        let page = list_page(&conn, None, None, None).unwrap();
        assert_eq!(page.pagination.total, 0);
        assert_eq!(page.pagination.pages, 0);
    }

    #[test]
    fn search_narrows_total() {
        let conn = open_memory_database().unwrap();
        seed_records(&conn, 12);
        let page = list_page(&conn, None, None, Some("paciente 1".into())).unwrap();
        assert_eq!(page.pagination.total, 3);
    }

    #[test]
    fn delete_cascade_removes_record_and_tokens() {
        let conn = open_memory_database().unwrap();
        let now = Utc::now();
        let admin = Admin {
            id: Uuid::new_v4(),
            username: "admin".into(),
            password_hash: "x".into(),
            email: None,
            created_at: now,
            updated_at: now,
        };
        db::insert_admin(&conn, &admin).unwrap();
        let record = seed_records(&conn, 1).remove(0);
        let edit = tokens::issue(&conn, admin.id, Some(record.id), Duration::hours(1), now).unwrap();
        let unrelated = tokens::issue(&conn, admin.id, None, Duration::hours(1), now).unwrap();

        assert!(delete_cascade(&conn, &record.id).unwrap());
        assert!(db::get_record(&conn, &record.id).unwrap().is_none());
        assert!(db::get_token(&conn, &edit.token).unwrap().is_none());
        assert_eq!(
            db::get_token(&conn, &unrelated.token).unwrap().unwrap().status,
            TokenStatus::Pending
        );

        assert!(!delete_cascade(&conn, &record.id).unwrap());
    }
}
