//! Public form endpoints, addressed by link token.
//!
//! - `GET /api/form/validate/:token`: token state and current data for edits
//! - `POST /api/form/:token`: create or update a record, consuming the token

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::intake::{self, FormView};

#[derive(Serialize)]
pub struct ValidateResponse {
    pub success: bool,
    #[serde(flatten)]
    pub view: FormView,
}

/// `GET /api/form/validate/:token`
pub async fn validate(
    State(ctx): State<ApiContext>,
    Path(token): Path<String>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let view = intake::resolve_token(&conn, &token, ctx.core.now())?;
    Ok(Json(ValidateResponse {
        success: true,
        view,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub message: &'static str,
    pub record_id: Uuid,
}

/// `POST /api/form/:token`
///
/// Token checks run before the body is looked at; an unreadable body is
/// reported by validation like any other non-object payload.
pub async fn submit(
    State(ctx): State<ApiContext>,
    Path(token): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let payload = match payload {
        Ok(Json(value)) => value,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable form body");
            Value::Null
        }
    };

    let conn = ctx.core.open_db()?;
    let outcome = intake::submit_form(&conn, &token, &payload, ctx.core.now())?;

    Ok(Json(SubmitResponse {
        success: true,
        message: if outcome.is_edit {
            "Record updated successfully"
        } else {
            "Record created successfully"
        },
        record_id: outcome.record_id,
    }))
}
