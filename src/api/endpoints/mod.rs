//! Endpoint handlers, one module per resource.
//!
//! Public: `health`, `form`, `auth` (login).
//! Admin (bearer session): `links`, `records`, `tokens`, `stats`.

pub mod auth;
pub mod form;
pub mod health;
pub mod links;
pub mod records;
pub mod stats;
pub mod tokens;

use uuid::Uuid;

use crate::api::error::ApiError;

/// Parse a record id from the path. A malformed id cannot name a record.
pub(crate) fn parse_record_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Record not found".into()))
}
