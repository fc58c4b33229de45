//! In-memory session store with expiry and a hard size bound.
//!
//! Expired sessions are evicted lazily: a lookup that finds an expired entry
//! removes it. When the store is full, creating a session first purges every
//! expired entry and, if that frees nothing, evicts the session closest to
//! expiry.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::models::Session;

/// Default session lifetime (24 hours)
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Default maximum number of live sessions
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Random bytes per token (hex-encoded, so tokens are twice as long)
const TOKEN_BYTES: usize = 32;

#[derive(Debug)]
struct Entry {
    session: Session,
    /// Creation order, breaks ties between equal expiry times.
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    next_seq: u64,
}

/// Token → session map
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    max_entries: usize,
    inner: RwLock<Inner>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(
            Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            DEFAULT_MAX_SESSIONS,
        )
    }
}

impl SessionStore {
    /// Create a store
    ///
    /// # Arguments
    ///
    /// * `ttl` - Lifetime of each session
    /// * `max_entries` - Upper bound on stored sessions (at least 1)
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a new session for `username`
    pub async fn create(&self, username: &str) -> Session {
        let now = Utc::now();
        let session = Session {
            token: generate_token(),
            username: username.to_string(),
            created_at: now,
            expires_at: now + self.ttl,
        };

        let mut inner = self.inner.write().await;
        if inner.entries.len() >= self.max_entries {
            let purged = purge(&mut inner.entries, now);
            if purged == 0 {
                evict_oldest(&mut inner.entries);
            }
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            session.token.clone(),
            Entry {
                session: session.clone(),
                seq,
            },
        );

        session
    }

    /// Username behind `token`, or `None` if the token is unknown or expired
    pub async fn resolve(&self, token: &str) -> Option<String> {
        let now = Utc::now();
        {
            let inner = self.inner.read().await;
            match inner.entries.get(token) {
                None => return None,
                Some(entry) if !entry.session.is_expired_at(now) => {
                    return Some(entry.session.username.clone());
                }
                Some(_) => {}
            }
        }

        // Expired: drop it, re-checking under the write lock.
        let mut inner = self.inner.write().await;
        if inner
            .entries
            .get(token)
            .is_some_and(|entry| entry.session.is_expired_at(now))
        {
            inner.entries.remove(token);
        }
        None
    }

    /// Remove a session. Returns whether it existed.
    pub async fn revoke(&self, token: &str) -> bool {
        let mut inner = self.inner.write().await;
        inner.entries.remove(token).is_some()
    }

    /// Remove all expired sessions, returning how many were dropped
    pub async fn purge_expired(&self) -> usize {
        let mut inner = self.inner.write().await;
        purge(&mut inner.entries, Utc::now())
    }

    /// Number of stored sessions, expired ones included until evicted
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    hex::encode(bytes)
}

fn purge(entries: &mut HashMap<String, Entry>, now: DateTime<Utc>) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| !entry.session.is_expired_at(now));
    before - entries.len()
}

fn evict_oldest(entries: &mut HashMap<String, Entry>) {
    let oldest = entries
        .iter()
        .min_by_key(|(_, entry)| (entry.session.expires_at, entry.seq))
        .map(|(token, _)| token.clone());

    if let Some(token) = oldest {
        entries.remove(&token);
    }
}
