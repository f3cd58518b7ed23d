//! Public form flows: resolving a token and submitting a form through it.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::{FormToken, MedicalRecord, RecordFields, TokenValidity};
use crate::{tokens, validation};

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Invalid token format")]
    MalformedToken,

    #[error("Token not found")]
    TokenNotFound,

    #[error("This link has already been used")]
    AlreadyUsed,

    #[error("This link has expired")]
    Expired,

    #[error("Record not found")]
    RecordNotFound,

    #[error("Invalid form data")]
    Invalid(Vec<String>),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for IntakeError {
    fn from(e: rusqlite::Error) -> Self {
        IntakeError::Database(DatabaseError::Sqlite(e))
    }
}

/// What the form page needs to render for a token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub is_edit: bool,
    /// Current answers, present for edit links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<MedicalRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub record_id: Uuid,
    pub is_edit: bool,
}

/// Resolve a token for display, expiring it if its deadline has passed.
pub fn resolve_token(conn: &Connection, raw: &str, now: DateTime<Utc>) -> Result<FormView, IntakeError> {
    let token = load_usable_token(conn, raw, now)?;
    match token.record_id {
        None => Ok(FormView {
            is_edit: false,
            data: None,
        }),
        Some(record_id) => {
            let record = db::get_record(conn, &record_id)?.ok_or(IntakeError::RecordNotFound)?;
            Ok(FormView {
                is_edit: true,
                data: Some(record),
            })
        }
    }
}

/// Validate and persist a submission, consuming the token.
pub fn submit_form(
    conn: &Connection,
    raw: &str,
    payload: &Value,
    now: DateTime<Utc>,
) -> Result<SubmissionOutcome, IntakeError> {
    let token = load_usable_token(conn, raw, now)?;

    let errors = validation::validate(payload);
    if !errors.is_empty() {
        return Err(IntakeError::Invalid(errors));
    }
    let fields = validation::sanitize(payload);

    let outcome = commit_submission(conn, &token, &fields, now)?;
    tracing::info!(
        record_id = %outcome.record_id,
        edit = outcome.is_edit,
        "Form submission stored"
    );
    Ok(outcome)
}

/// Record write and token transition as one unit of work.
///
/// The token transition is guarded on `pending`; when another submission got
/// there first the record write is rolled back with it.
pub(crate) fn commit_submission(
    conn: &Connection,
    token: &FormToken,
    fields: &RecordFields,
    now: DateTime<Utc>,
) -> Result<SubmissionOutcome, IntakeError> {
    let tx = conn.unchecked_transaction()?;

    let record_id = match token.record_id {
        Some(id) => {
            if !db::apply_record_update(&tx, &id, fields, &token.token, now)? {
                return Err(IntakeError::RecordNotFound);
            }
            id
        }
        None => {
            let record = MedicalRecord::from_submission(fields.clone(), &token.token, now);
            db::insert_record(&tx, &record)?;
            record.id
        }
    };

    if !db::mark_token_submitted(&tx, &token.token, now)? {
        tracing::warn!(token_id = %token.id, "Concurrent submission lost the race");
        return Err(IntakeError::AlreadyUsed);
    }

    tx.commit()?;
    Ok(SubmissionOutcome {
        record_id,
        is_edit: token.is_edit(),
    })
}

fn load_usable_token(conn: &Connection, raw: &str, now: DateTime<Utc>) -> Result<FormToken, IntakeError> {
    if !tokens::is_well_formed(raw) {
        return Err(IntakeError::MalformedToken);
    }
    let mut token = db::get_token(conn, raw)?.ok_or(IntakeError::TokenNotFound)?;
    match tokens::check_validity(conn, &mut token, now)? {
        TokenValidity::Valid => Ok(token),
        TokenValidity::AlreadyUsed => Err(IntakeError::AlreadyUsed),
        TokenValidity::Expired => Err(IntakeError::Expired),
    }
}
