//! Background reclamation of expired sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::store::MAX_RECLAIM_INTERVAL;
use super::SessionStore;

/// Shortest period the loop accepts; a zero interval would spin.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Lifecycle handle for a running reclamation loop.
///
/// Dropping the handle cancels the loop. Use [`shutdown`](Self::shutdown)
/// to cancel and wait for the task to finish.
#[derive(Debug)]
pub struct ReclaimerHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ReclaimerHandle {
    /// Signal the loop to stop without waiting for it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the background task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop the loop and wait until it has exited.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "session reclaimer task ended abnormally");
            }
        }
    }
}

impl Drop for ReclaimerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Spawn the reclamation loop for `store`, ticking every `interval`.
///
/// The first pass runs one full interval after start. The interval is
/// clamped to `MIN_INTERVAL..=MAX_RECLAIM_INTERVAL`.
pub(crate) fn spawn(store: Arc<SessionStore>, interval: Duration) -> ReclaimerHandle {
    let interval = interval.clamp(MIN_INTERVAL, MAX_RECLAIM_INTERVAL);
    let token = CancellationToken::new();
    let cancelled = token.clone();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(?interval, "session reclaimer started");

        loop {
            tokio::select! {
                _ = cancelled.cancelled() => break,
                _ = ticker.tick() => run_pass(&store).await,
            }
        }

        info!("session reclaimer stopped");
    });

    ReclaimerHandle {
        token,
        task: Some(task),
    }
}

async fn run_pass(store: &Arc<SessionStore>) {
    // The pass may rewrite the snapshot, keep it off the async workers
    let store = Arc::clone(store);
    match tokio::task::spawn_blocking(move || {
        let removed = store.reclaim_expired();
        (removed, store.len())
    })
    .await
    {
        Ok((0, _)) => {}
        Ok((removed, remaining)) => {
            debug!(removed, remaining, "reclaimed expired sessions");
        }
        Err(e) => {
            warn!(error = %e, "session reclamation pass failed");
        }
    }
}
