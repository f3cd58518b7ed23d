//! HTTP surface.
//!
//! Public form routes addressed by link token, plus an admin API behind a
//! bearer session. `api_router()` returns a composable `Router`;
//! `start_api_server()` binds and serves it.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::{start_api_server, ApiServer};
pub use types::ApiContext;
