//! Session management module.
//!
//! This module provides the in-process session table with per-entry
//! expiry, its durable snapshot file, and the background loop that
//! reclaims expired entries.

mod durable;
mod entry;
mod reclaimer;
mod store;

pub use durable::{DurableLog, LoadedLog};
pub use entry::{format_expiry, parse_expiry, SessionEntry};
pub use reclaimer::ReclaimerHandle;
pub use store::{
    SessionStore, StoreConfig, DEFAULT_LOG_PATH, DEFAULT_RECLAIM_INTERVAL, MAX_RECLAIM_INTERVAL,
};
