//! HTTP router.
//!
//! Returns a composable `Router` with every endpoint under `/api/`.
//!
//! Middleware stack on admin routes (outermost → innermost):
//! 1. Extension(ApiContext) → 2. Access log → 3. Session auth → Handler
//!
//! Public routes (health, form, login) only get the access log.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router for a prepared `CoreState`.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let static_dir = core.config.static_dir.clone();
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/form/validate/:token", get(endpoints::form::validate))
        .route("/form/:token", post(endpoints::form::submit))
        .route("/admin/login", post(endpoints::auth::login))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access));

    let admin = Router::new()
        .route("/admin/generate-url", post(endpoints::links::generate))
        .route(
            "/admin/generate-edit-url/:id",
            post(endpoints::links::generate_edit),
        )
        .route("/admin/records", get(endpoints::records::list))
        .route(
            "/admin/records/:id",
            get(endpoints::records::get).delete(endpoints::records::delete),
        )
        .route("/admin/tokens", get(endpoints::tokens::list))
        .route("/admin/stats", get(endpoints::stats::summary))
        .with_state(ctx.clone())
        // Innermost first, outermost last:
        .layer(axum::middleware::from_fn(middleware::auth::require_admin))
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx));

    let router = Router::new().nest("/api", public.merge(admin));

    let router = match static_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "Serving static front-end");
            router.fallback_service(ServeDir::new(dir))
        }
        None => router.fallback(route_not_found),
    };

    router.layer(CorsLayer::very_permissive())
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".into())
}
