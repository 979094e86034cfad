//! Session-based request authorization.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap, StatusCode,
    },
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::session::SessionStore;

/// How the middleware finds the session id on a request.
#[derive(Debug, Clone)]
pub struct SessionAuthConfig {
    /// Cookie carrying the session id (default: "session_id").
    pub cookie_name: String,
    /// Prefix of the Authorization header value (default: "Bearer ").
    pub prefix: String,
    /// Paths served without a session.
    pub exempt_paths: Vec<String>,
}

impl Default for SessionAuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session_id".to_string(),
            prefix: "Bearer ".to_string(),
            exempt_paths: vec!["/health".to_string()],
        }
    }
}

impl SessionAuthConfig {
    /// Config reading the session id from a custom cookie.
    pub fn with_cookie(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            ..Default::default()
        }
    }

    /// Add a path that skips the session check.
    pub fn exempt(mut self, path: impl Into<String>) -> Self {
        self.exempt_paths.push(path.into());
        self
    }
}

/// Live session attached to an authorized request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPayload {
    /// Session id the request presented.
    pub session_id: String,
    /// Payload stored with the session.
    pub payload: String,
}

/// Middleware state: the store plus extraction settings.
#[derive(Debug, Clone)]
pub struct SessionAuth {
    store: Arc<SessionStore>,
    config: Arc<SessionAuthConfig>,
}

impl SessionAuth {
    /// Authorize requests against `store` with default settings.
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self::with_config(store, SessionAuthConfig::default())
    }

    /// Authorize requests against `store` with custom settings.
    pub fn with_config(store: Arc<SessionStore>, config: SessionAuthConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Whether `path` is served without a session.
    pub fn is_exempt(&self, path: &str) -> bool {
        self.config.exempt_paths.iter().any(|p| p == path)
    }

    /// Pull the session id from the Authorization header, falling back to
    /// the session cookie.
    pub fn extract_session_id(&self, headers: &HeaderMap) -> Option<String> {
        let from_header = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix(self.config.prefix.as_str()))
            .map(str::trim)
            .filter(|id| !id.is_empty());

        if let Some(id) = from_header {
            return Some(id.to_string());
        }

        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == self.config.cookie_name && !value.is_empty())
            .map(|(_, value)| value.to_string())
    }

    /// Resolve the live session behind a request, if any.
    pub fn authorize(&self, headers: &HeaderMap) -> Option<SessionPayload> {
        let session_id = self.extract_session_id(headers)?;
        let (payload, found) = self.store.get_session_data(&session_id);
        found.then_some(SessionPayload {
            session_id,
            payload,
        })
    }
}

/// Session authorization middleware for axum.
///
/// Requests carrying a live session continue with a [`SessionPayload`]
/// extension; all others get `401 Unauthorized`.
pub async fn session_middleware(
    State(auth): State<SessionAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth.is_exempt(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    match auth.authorize(request.headers()) {
        Some(session) => {
            request.extensions_mut().insert(session);
            Ok(next.run(request).await)
        }
        None => {
            debug!(path = %request.uri().path(), "rejected request without live session");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
