//! Server-side session storage.
//!
//! Sessions are keyed by an opaque random id carried in a cookie. The store is
//! an explicit key-value abstraction so handlers stay backend-agnostic; the
//! default backend is an in-memory map with TTL expiry and a background
//! cleanup task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Cleanup interval for expired sessions: 5 minutes.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Per-browser session record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionData {
    /// Bearer credential from the last successful token exchange.
    pub access_token: Option<String>,

    /// Refresh token from the last successful token exchange.
    pub refresh_token: Option<String>,

    /// Single-use anti-forgery value, set at authorization initiation and
    /// consumed by the matching callback.
    pub oauth_state: Option<String>,
}

/// Errors from the session backend.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// Backend failure while destroying a session
    #[error("session backend error: {0}")]
    Backend(String),
}

/// Key-value session store, addressable by opaque session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session for an id, if one exists and has not expired.
    async fn load(&self, session_id: &str) -> Option<SessionData>;

    /// Store (or replace) the session for an id.
    async fn save(&self, session_id: &str, data: SessionData);

    /// Destroy the session for an id. Destroying an unknown id is not an error.
    async fn destroy(&self, session_id: &str) -> Result<(), SessionError>;
}

/// Generate an opaque random token using two UUIDs (256 bits from the OS CSPRNG).
///
/// Used for both session ids and anti-forgery state values; the simple format
/// keeps the result URL- and cookie-safe.
#[must_use]
pub fn generate_token() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}

struct SessionEntry {
    data: SessionData,
    last_seen: Instant,
}

/// In-memory session store with inactivity-based expiry.
pub struct MemorySessionStore {
    entries: Arc<RwLock<HashMap<String, SessionEntry>>>,
    ttl: Duration,
}

impl MemorySessionStore {
    /// Create a store whose sessions expire after `ttl` of inactivity.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { entries: Arc::new(RwLock::new(HashMap::new())), ttl }
    }

    /// Start the background cleanup task for expired sessions.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                self.cleanup_expired().await;
            }
        });
    }

    async fn cleanup_expired(&self) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.last_seen.elapsed() <= self.ttl);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(count = removed, "Cleaned up expired sessions");
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> Option<SessionData> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(session_id)?;
        if entry.last_seen.elapsed() > self.ttl {
            entries.remove(session_id);
            return None;
        }
        entry.last_seen = Instant::now();
        Some(entry.data.clone())
    }

    async fn save(&self, session_id: &str, data: SessionData) {
        let mut entries = self.entries.write().await;
        entries
            .insert(session_id.to_owned(), SessionEntry { data, last_seen: Instant::now() });
    }

    async fn destroy(&self, session_id: &str) -> Result<(), SessionError> {
        self.entries.write().await.remove(session_id);
        Ok(())
    }
}

impl std::fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySessionStore").field("ttl", &self.ttl).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_is_unique_and_urlsafe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_session_roundtrip() {
        let store = MemorySessionStore::new(Duration::from_secs(60));

        assert!(store.load("sid1").await.is_none());

        let data = SessionData {
            access_token: Some("a".into()),
            refresh_token: Some("b".into()),
            oauth_state: None,
        };
        store.save("sid1", data).await;

        let loaded = store.load("sid1").await.expect("session should exist");
        assert_eq!(loaded.access_token.as_deref(), Some("a"));
        assert_eq!(loaded.refresh_token.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        store.save("sid1", SessionData::default()).await;

        assert!(store.destroy("sid1").await.is_ok());
        assert!(store.load("sid1").await.is_none());

        // Destroying an already-destroyed session is fine
        assert!(store.destroy("sid1").await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_session_is_gone() {
        let store = MemorySessionStore::new(Duration::from_millis(10));
        store.save("sid1", SessionData::default()).await;

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(store.load("sid1").await.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_removes_expired_entries() {
        let store = MemorySessionStore::new(Duration::from_millis(10));
        store.save("sid1", SessionData::default()).await;
        store.save("sid2", SessionData::default()).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        store.cleanup_expired().await;

        assert!(store.entries.read().await.is_empty());
    }
}
