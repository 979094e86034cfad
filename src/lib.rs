//! # outcome-sessions
//!
//! In-process session store for the outcome-tracking backend.
//!
//! The store maps caller-supplied session ids to opaque payloads with a
//! per-entry time-to-live. A background loop reclaims expired entries and
//! every mutation rewrites a durable snapshot file that is replayed when
//! the store is opened again after a restart.
//!
//! ## Features
//!
//! - **Expiring sessions**: reads treat expired entries as absent
//! - **Crash recovery**: synchronous snapshot rewrite on create/remove
//! - **Background reclamation**: tokio task with an explicit shutdown handle
//! - **Request authorization**: axum middleware backed by the store
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use outcome_sessions::{SessionStore, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     outcome_sessions::logging::try_init().ok();
//!
//!     let store = Arc::new(SessionStore::open(StoreConfig::new("sessions.log")));
//!     let reclaimer = store.spawn_reclaimer();
//!
//!     store.create("s1", Duration::from_secs(3600), "user=alice");
//!     assert!(store.validate_session("s1"));
//!
//!     reclaimer.shutdown().await;
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod security;
pub mod session;

// Re-export commonly used types
pub use error::{Result, SessionStoreError};
pub use security::{session_middleware, SessionAuth, SessionAuthConfig, SessionPayload};
pub use session::{DurableLog, ReclaimerHandle, SessionEntry, SessionStore, StoreConfig};
