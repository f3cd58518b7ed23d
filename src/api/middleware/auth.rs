//! Bearer session authentication for admin routes.
//!
//! Extracts `Authorization: Bearer <jwt>`, verifies signature and expiry,
//! and injects `AdminContext` into request extensions. Every failure is
//! the same 401.

use axum::http::{header, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{AdminContext, ApiContext};
use crate::crypto;

/// Require a valid admin session.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
/// On success: injects `AdminContext` into the request and the response,
/// and marks the response `no-store`.
pub async fn require_admin(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_admin_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_admin_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let claims = crypto::verify_session(ctx.core.jwt_secret(), token.trim(), ctx.core.now())
        .map_err(|e| {
            tracing::debug!(error = %e, "Admin session rejected");
            ApiError::Unauthorized
        })?;

    let admin = AdminContext {
        admin_id: claims.sub,
        username: claims.username,
    };
    req.extensions_mut().insert(admin.clone());

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    // Read back by the access log, which wraps this layer.
    response.extensions_mut().insert(admin);
    Ok(response)
}
