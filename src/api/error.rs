//! API error type with structured JSON responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::accounts::AccountError;
use crate::crypto::CryptoError;
use crate::db::DatabaseError;
use crate::intake::IntakeError;

/// Error body: `{success: false, code, message, errors?}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Invalid form data")]
    Validation(Vec<String>),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, errors) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Unauthorized".to_string(),
                None,
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid credentials".to_string(),
                None,
            ),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail, None),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                "Invalid form data".to_string(),
                Some(errors),
            ),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, "FORBIDDEN", detail, None),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail, None),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            success: false,
            code,
            message,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::MalformedToken => ApiError::BadRequest(err.to_string()),
            IntakeError::TokenNotFound | IntakeError::RecordNotFound => ApiError::NotFound(err.to_string()),
            IntakeError::AlreadyUsed | IntakeError::Expired => ApiError::Forbidden(err.to_string()),
            IntakeError::Invalid(errors) => ApiError::Validation(errors),
            IntakeError::Database(e) => ApiError::from(e),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidCredentials => ApiError::InvalidCredentials,
            AccountError::UsernameTooShort | AccountError::PasswordTooShort => {
                ApiError::BadRequest(err.to_string())
            }
            AccountError::UsernameTaken(_) => ApiError::BadRequest(err.to_string()),
            AccountError::Database(e) => ApiError::from(e),
            AccountError::Crypto(e) => ApiError::from(e),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { .. } => ApiError::NotFound("Record not found".into()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        tracing::debug!(error = %err, "Rejected request body");
        ApiError::BadRequest("Invalid input data".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn unauthorized_returns_401() {
        let (status, json) = body_json(ApiError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "UNAUTHORIZED");
        assert_eq!(json["message"], "Unauthorized");
        assert!(json.get("errors").is_none());
    }

    #[tokio::test]
    async fn validation_carries_field_errors() {
        let (status, json) = body_json(ApiError::Validation(vec!["nombre is required".into()])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["errors"][0], "nombre is required");
    }

    #[tokio::test]
    async fn internal_hides_detail() {
        let (status, json) = body_json(ApiError::Internal("disk on fire".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn intake_errors_map_to_statuses() {
        let cases = [
            (IntakeError::MalformedToken, StatusCode::BAD_REQUEST),
            (IntakeError::TokenNotFound, StatusCode::NOT_FOUND),
            (IntakeError::RecordNotFound, StatusCode::NOT_FOUND),
            (IntakeError::AlreadyUsed, StatusCode::FORBIDDEN),
            (IntakeError::Expired, StatusCode::FORBIDDEN),
            (IntakeError::Invalid(vec![]), StatusCode::BAD_REQUEST),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn used_and_expired_have_distinct_messages() {
        let (_, used) = body_json(IntakeError::AlreadyUsed.into()).await;
        let (_, expired) = body_json(IntakeError::Expired.into()).await;
        assert_ne!(used["message"], expired["message"]);
    }

    #[test]
    fn database_not_found_maps_to_404() {
        let err = ApiError::from(DatabaseError::NotFound {
            entity_type: "MedicalRecord".into(),
            id: "x".into(),
        });
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
