//! Access log middleware.
//!
//! Logs every API request with method, path, response status, latency,
//! and the admin username when the auth middleware has run.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::AdminContext;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let admin = response
        .extensions()
        .get::<AdminContext>()
        .map(|a| a.username.clone());
    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;

    match admin {
        Some(admin) => tracing::info!(%method, path, status, latency_ms, admin, "API request"),
        None => tracing::info!(%method, path, status, latency_ms, "API request"),
    }
    response
}
