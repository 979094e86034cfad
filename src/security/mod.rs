//! Security module for outcome-sessions.
//!
//! Request authorization backed by the session store: an axum middleware
//! that admits requests presenting a live session id and exposes the
//! session payload to handlers.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use axum::{middleware, routing::get, Router};
//! use outcome_sessions::security::{session_middleware, SessionAuth};
//! use outcome_sessions::{SessionStore, StoreConfig};
//!
//! let store = Arc::new(SessionStore::open(StoreConfig::default()));
//! let auth = SessionAuth::new(store);
//!
//! let app: Router = Router::new()
//!     .route("/outcomes", get(|| async { "ok" }))
//!     .layer(middleware::from_fn_with_state(auth, session_middleware));
//! ```

pub mod auth;

pub use auth::{session_middleware, SessionAuth, SessionAuthConfig, SessionPayload};
