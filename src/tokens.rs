//! Form token service: generation, share links, and the token state machine.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use regex::Regex;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::{FormToken, TokenStatus, TokenValidity};

pub const TOKEN_LENGTH: usize = 21;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{21}$").expect("static token regex"));

/// New random token: 21 symbols over the URL-safe alphabet (126 bits).
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Shareable link for a token: `{base}/form/{token}`.
pub fn build_url(base: &str, token: &str) -> String {
    format!("{}/form/{token}", base.trim_end_matches('/'))
}

/// Cheap shape check done before any store lookup.
pub fn is_well_formed(token: &str) -> bool {
    TOKEN_PATTERN.is_match(token)
}

/// Explicit `pending → expired` transition. No-op for other states.
///
/// Returns whether the stored token changed. When another writer got there
/// first, `token` is refreshed from the store instead.
pub fn expire(conn: &Connection, token: &mut FormToken, now: DateTime<Utc>) -> Result<bool, DatabaseError> {
    if token.status != TokenStatus::Pending {
        return Ok(false);
    }
    if db::expire_token(conn, &token.token, now)? {
        token.status = TokenStatus::Expired;
        token.updated_at = now;
        return Ok(true);
    }
    if let Some(stored) = db::get_token(conn, &token.token)? {
        *token = stored;
    }
    Ok(false)
}

/// Validity check used by the public form.
///
/// Pure check first; a pending token found past its deadline is expired
/// in the store before `Expired` is reported.
pub fn check_validity(
    conn: &Connection,
    token: &mut FormToken,
    now: DateTime<Utc>,
) -> Result<TokenValidity, DatabaseError> {
    let validity = token.validity(now);
    if validity == TokenValidity::Expired && token.status == TokenStatus::Pending {
        if expire(conn, token, now)? {
            tracing::info!(token_id = %token.id, "Form token expired on access");
        } else {
            return Ok(token.validity(now));
        }
    }
    Ok(validity)
}

/// Create a pending token valid for `horizon`.
///
/// With `record_id` the token is an edit link and the record must exist.
pub fn issue(
    conn: &Connection,
    generated_by: Uuid,
    record_id: Option<Uuid>,
    horizon: Duration,
    now: DateTime<Utc>,
) -> Result<FormToken, DatabaseError> {
    if let Some(id) = record_id {
        if !db::record_exists(conn, &id)? {
            return Err(DatabaseError::NotFound {
                entity_type: "MedicalRecord".into(),
                id: id.to_string(),
            });
        }
    }

    let expires_at = now
        .checked_add_signed(horizon)
        .ok_or_else(|| DatabaseError::ConstraintViolation("token expiry out of range".into()))?;

    let token = FormToken {
        id: Uuid::new_v4(),
        token: generate(),
        status: TokenStatus::Pending,
        record_id,
        generated_by,
        expires_at: Some(expires_at),
        submitted_at: None,
        created_at: now,
        updated_at: now,
    };
    db::insert_token(conn, &token)?;
    tracing::info!(token_id = %token.id, edit = token.is_edit(), "Form token issued");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::models::{Admin, MedicalRecord, RecordFields};

    fn setup() -> (Connection, Uuid) {
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
        (conn, admin.id)
    }

    #[test]
    fn generated_tokens_are_well_formed_and_distinct() {
        let a = generate();
        let b = generate();
        assert_eq!(a.len(), TOKEN_LENGTH);
        assert!(is_well_formed(&a));
        assert!(is_well_formed(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn well_formed_rejects_bad_shapes() {
        assert!(is_well_formed("abcdefghij_klmnop-123"));
        assert!(!is_well_formed("abc"));
        assert!(!is_well_formed("abcdefghij_klmnop-1234"));
        assert!(!is_well_formed("abcdefghij klmnop-123"));
        assert!(!is_well_formed("abcdefghij.klmnop-123"));
        assert!(!is_well_formed(""));
    }

    #[test]
    fn build_url_joins_base_and_token() {
        assert_eq!(build_url("http://localhost:4200", "tok"), "http://localhost:4200/form/tok");
        assert_eq!(build_url("https://x.org/", "tok"), "https://x.org/form/tok");
    }

    #[test]
    fn issue_creates_pending_token_with_deadline() {
        let (conn, admin_id) = setup();
        let now = Utc::now();
        let token = issue(&conn, admin_id, None, Duration::hours(72), now).unwrap();
        assert_eq!(token.status, TokenStatus::Pending);
        assert_eq!(token.expires_at, Some(now + Duration::hours(72)));
        assert!(!token.is_edit());

        let stored = db::get_token(&conn, &token.token).unwrap().unwrap();
        assert_eq!(stored.id, token.id);
    }

    #[test]
    fn issue_for_missing_record_creates_nothing() {
        let (conn, admin_id) = setup();
        let err = issue(&conn, admin_id, Some(Uuid::new_v4()), Duration::hours(1), Utc::now()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
        assert_eq!(db::count_tokens(&conn, None).unwrap(), 0);
    }

    #[test]
    fn issue_edit_token_for_existing_record() {
        let (conn, admin_id) = setup();
        let fields = RecordFields {
            nombre: "Ana".into(),
            ..Default::default()
        };
        let record = MedicalRecord::from_submission(fields, "seed", Utc::now());
        db::insert_record(&conn, &record).unwrap();

        let token = issue(&conn, admin_id, Some(record.id), Duration::hours(1), Utc::now()).unwrap();
        assert!(token.is_edit());
        assert_eq!(token.record_id, Some(record.id));
    }

    #[test]
    fn check_validity_expires_overdue_token_once() {
        let (conn, admin_id) = setup();
        let issued_at = Utc::now() - Duration::hours(2);
        let mut token = issue(&conn, admin_id, None, Duration::hours(1), issued_at).unwrap();
        let now = Utc::now();

        assert_eq!(check_validity(&conn, &mut token, now).unwrap(), TokenValidity::Expired);
        assert_eq!(token.status, TokenStatus::Expired);

        let mut reread = db::get_token(&conn, &token.token).unwrap().unwrap();
        assert_eq!(reread.status, TokenStatus::Expired);
        assert_eq!(check_validity(&conn, &mut reread, now).unwrap(), TokenValidity::Expired);
        assert!(!expire(&conn, &mut reread, now).unwrap());
    }

    #[test]
    fn check_validity_leaves_live_token_untouched() {
        let (conn, admin_id) = setup();
        let now = Utc::now();
        let mut token = issue(&conn, admin_id, None, Duration::hours(1), now).unwrap();
        assert_eq!(check_validity(&conn, &mut token, now).unwrap(), TokenValidity::Valid);
        let stored = db::get_token(&conn, &token.token).unwrap().unwrap();
        assert_eq!(stored.status, TokenStatus::Pending);
    }

    #[test]
    fn submitted_token_reports_already_used() {
        let (conn, admin_id) = setup();
        let now = Utc::now();
        let token = issue(&conn, admin_id, None, Duration::hours(1), now).unwrap();
        assert!(db::mark_token_submitted(&conn, &token.token, now).unwrap());

        let mut stored = db::get_token(&conn, &token.token).unwrap().unwrap();
        let later = now + Duration::hours(5);
        assert_eq!(check_validity(&conn, &mut stored, later).unwrap(), TokenValidity::AlreadyUsed);
        assert_eq!(stored.status, TokenStatus::Submitted);
    }

    #[test]
    fn issue_rejects_unrepresentable_deadline() {
        let (conn, admin_id) = setup();
        let err = issue(&conn, admin_id, None, Duration::MAX, Utc::now()).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
        assert_eq!(db::count_tokens(&conn, None).unwrap(), 0);
    }

    #[test]
    fn stale_copy_picks_up_concurrent_submission() {
        let (conn, admin_id) = setup();
        let issued_at = Utc::now() - Duration::hours(2);
        let token = issue(&conn, admin_id, None, Duration::hours(1), issued_at).unwrap();
        let mut stale = db::get_token(&conn, &token.token).unwrap().unwrap();
        assert!(db::mark_token_submitted(&conn, &token.token, Utc::now()).unwrap());

        let now = Utc::now();
        assert_eq!(check_validity(&conn, &mut stale, now).unwrap(), TokenValidity::AlreadyUsed);
        assert_eq!(stale.status, TokenStatus::Submitted);
        let stored = db::get_token(&conn, &token.token).unwrap().unwrap();
        assert_eq!(stored.status, TokenStatus::Submitted);
    }
}
