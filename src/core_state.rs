//! Shared service state.
//!
//! `CoreState` is created once at startup, wrapped in `Arc`, and shared by
//! the HTTP handlers, the expiry sweeper, and the CLI commands.

use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::db::{self, DatabaseError};

pub struct CoreState {
    pub config: AppConfig,
}

impl CoreState {
    /// Prepare the database (create + migrate) and build the state.
    pub fn initialize(config: AppConfig) -> Result<Self, DatabaseError> {
        db::open_database(&config.database_path)?;
        tracing::debug!(path = %config.database_path.display(), "Database ready");
        Ok(Self { config })
    }

    /// Open a connection for one unit of work.
    ///
    /// Connections are short-lived; SQLite's busy timeout serializes writers.
    pub fn open_db(&self) -> Result<rusqlite::Connection, DatabaseError> {
        db::connect(&self.config.database_path)
    }

    pub fn jwt_secret(&self) -> &[u8] {
        self.config.jwt_secret.as_bytes()
    }

    /// Wall clock used by every request. Single seam for time.
    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
