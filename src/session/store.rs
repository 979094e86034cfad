//! Session table and its public operations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use super::durable::DurableLog;
use super::reclaimer::{self, ReclaimerHandle};
use super::SessionEntry;

/// Default reclamation period: 15 minutes.
pub const DEFAULT_RECLAIM_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Longest reclamation period accepted: one year.
pub const MAX_RECLAIM_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Default durable log location, relative to the working directory.
pub const DEFAULT_LOG_PATH: &str = "sessions.log";

/// TTLs above this are clamped so expiries stay within RFC 3339 range.
const MAX_TTL_SECS: i64 = 100 * 365 * 24 * 60 * 60;

type Table = HashMap<String, SessionEntry>;

/// Construction-time settings for a [`SessionStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Snapshot file owned by the store.
    pub log_path: PathBuf,
    /// How often the reclaimer scans for expired entries.
    pub reclaim_interval: Duration,
    /// Rewrite the snapshot after a reclamation pass that removed entries.
    pub persist_on_reclaim: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            reclaim_interval: DEFAULT_RECLAIM_INTERVAL,
            persist_on_reclaim: true,
        }
    }
}

impl StoreConfig {
    /// Config with a custom snapshot path and default timings.
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            ..Default::default()
        }
    }

    /// Set the reclamation period.
    pub fn with_reclaim_interval(mut self, interval: Duration) -> Self {
        self.reclaim_interval = interval;
        self
    }

    /// Leave the snapshot untouched when the reclaimer prunes entries.
    pub fn without_persist_on_reclaim(mut self) -> Self {
        self.persist_on_reclaim = false;
        self
    }
}

/// Thread-safe session table backed by a durable snapshot.
///
/// All operations take one lock for their whole duration, including the
/// snapshot rewrite done by [`create`](Self::create) and
/// [`remove_session`](Self::remove_session). None of them fail: absence and
/// expiry are reported through the return value and persistence errors are
/// logged while the in-memory table stays authoritative.
pub struct SessionStore {
    table: Mutex<Table>,
    log: DurableLog,
    config: StoreConfig,
}

impl SessionStore {
    /// Open the store, replaying the durable log at `config.log_path`.
    ///
    /// Entries that have already expired are loaded as well; reads treat
    /// them as absent and the next reclamation pass drops them. A missing
    /// or unreadable log starts the store empty.
    pub fn open(config: StoreConfig) -> Self {
        let log = DurableLog::new(&config.log_path);

        let table: Table = match log.load() {
            Ok(loaded) => {
                if loaded.skipped > 0 {
                    warn!(
                        path = %log.path().display(),
                        skipped = loaded.skipped,
                        "durable log contained malformed lines"
                    );
                }
                loaded
                    .entries
                    .into_iter()
                    .map(|entry| (entry.id.clone(), entry))
                    .collect()
            }
            Err(e) => {
                warn!(
                    path = %log.path().display(),
                    error = %e,
                    "failed to read durable log, starting empty"
                );
                Table::new()
            }
        };

        info!(
            path = %log.path().display(),
            entries = table.len(),
            "session table recovered"
        );

        Self {
            table: Mutex::new(table),
            log,
            config,
        }
    }

    /// Insert or replace the session `id`, valid for `ttl` from now.
    ///
    /// Returns the computed expiry. An existing entry with the same id is
    /// overwritten. The snapshot is rewritten before this returns.
    pub fn create(
        &self,
        id: impl Into<String>,
        ttl: Duration,
        payload: impl Into<String>,
    ) -> DateTime<Utc> {
        let mut table = self.table();

        let expiry = expiry_after(Utc::now(), ttl);
        let entry = SessionEntry::new(id, expiry, payload);
        debug!(session_id = %entry.id, ?ttl, "session created");
        table.insert(entry.id.clone(), entry);

        self.persist(&table, "create");
        expiry
    }

    /// Whether `id` names a session that has not yet expired.
    pub fn validate_session(&self, id: &str) -> bool {
        let now = Utc::now();
        self.table().get(id).is_some_and(|entry| entry.is_live(now))
    }

    /// Payload of a live session, with a found flag.
    ///
    /// Returns an empty payload and `false` when the session is absent or
    /// expired.
    pub fn get_session_data(&self, id: &str) -> (String, bool) {
        match self.session_data(id) {
            Some(payload) => (payload, true),
            None => (String::new(), false),
        }
    }

    /// Payload of a live session.
    pub fn session_data(&self, id: &str) -> Option<String> {
        let now = Utc::now();
        self.table()
            .get(id)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.payload.clone())
    }

    /// Delete the session `id` if present. Idempotent.
    ///
    /// The snapshot is rewritten before this returns.
    pub fn remove_session(&self, id: &str) {
        let mut table = self.table();

        if table.remove(id).is_some() {
            debug!(session_id = %id, "session removed");
        }

        self.persist(&table, "remove");
    }

    /// Drop every expired entry from the table.
    ///
    /// Returns the number of entries removed. When anything was removed and
    /// `persist_on_reclaim` is set, the snapshot is rewritten too.
    pub fn reclaim_expired(&self) -> usize {
        let mut table = self.table();

        let now = Utc::now();
        let before = table.len();
        table.retain(|_, entry| entry.is_live(now));
        let removed = before - table.len();

        if removed > 0 && self.config.persist_on_reclaim {
            self.persist(&table, "reclaim");
        }
        removed
    }

    /// Start the background reclamation loop for this store.
    ///
    /// The loop runs every `reclaim_interval` until the returned handle is
    /// shut down or dropped. Must be called from within a tokio runtime.
    pub fn spawn_reclaimer(self: &Arc<Self>) -> ReclaimerHandle {
        reclaimer::spawn(Arc::clone(self), self.config.reclaim_interval)
    }

    /// Number of entries physically present, expired ones included.
    pub fn len(&self) -> usize {
        self.table().len()
    }

    /// Whether the table holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    /// Whether an entry for `id` is physically present, live or not.
    pub fn contains_entry(&self, id: &str) -> bool {
        self.table().contains_key(id)
    }

    /// Number of entries that have not expired.
    pub fn live_count(&self) -> usize {
        let now = Utc::now();
        self.table()
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    /// Path of the durable snapshot.
    pub fn log_path(&self) -> &Path {
        self.log.path()
    }

    /// Settings the store was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        // Every mutation is a single map call, so a poisoned table is intact
        self.table.lock().unwrap_or_else(|poisoned| {
            warn!("session table lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn persist(&self, table: &Table, op: &'static str) {
        if let Err(e) = self.log.write_snapshot(table.values()) {
            warn!(
                op,
                path = %self.log.path().display(),
                error = %e,
                "failed to persist session table, keeping in-memory state"
            );
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("entries", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    let max = TimeDelta::seconds(MAX_TTL_SECS);
    let delta = TimeDelta::from_std(ttl).map_or(max, |d| d.min(max));
    now + delta
}
