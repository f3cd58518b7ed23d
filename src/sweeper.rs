//! Background token expiry sweeper.
//!
//! Periodically marks pending tokens whose deadline has passed as expired,
//! so listings and stats stay accurate even for links nobody opens again.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::core_state::CoreState;
use crate::db::{self, DatabaseError};

/// Handle for the sweeper task.
///
/// `stop()` shuts down and waits; dropping the handle only signals shutdown.
pub struct SweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Signal shutdown and wait for the task to finish its current pass.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Run one expiry pass. Returns how many tokens were expired.
pub fn sweep_once(core: &CoreState) -> Result<usize, DatabaseError> {
    let conn = core.open_db()?;
    let expired = db::expire_overdue_tokens(&conn, core.now())?;
    if expired > 0 {
        tracing::info!(expired, "Expired overdue form tokens");
    }
    Ok(expired)
}

/// Start the sweeper on the current tokio runtime.
///
/// Returns `None` when `interval_secs` is 0 (sweeping disabled).
pub fn start_sweeper(core: Arc<CoreState>, interval_secs: u64) -> Option<SweeperHandle> {
    if interval_secs == 0 {
        tracing::info!("Token expiry sweeper disabled");
        return None;
    }

    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        tracing::info!("Token expiry sweeper started (every {interval_secs}s)");
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {
                    if let Err(e) = sweep_once(&core) {
                        tracing::error!(error = %e, "Token expiry sweep failed");
                    }
                }
            }
        }
        tracing::info!("Token expiry sweeper shutting down");
    });

    Some(SweeperHandle {
        shutdown: Some(shutdown_tx),
        task: Some(task),
    })
}
