//! Session cache with owner tracking, lazy TTL expiry and bounded history.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use lru::LruCache;
use parking_lot::Mutex;
use studydesk_types::ChatMessage;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;

/// Why a session left the cache.
#[derive(Debug, Clone, Copy)]
enum PurgeReason {
    OwnerSwitched,
    Expired,
    OwnerCollision,
    Evicted,
    Ended,
}

/// A single cached conversation.
#[derive(Debug)]
struct SessionRecord {
    owner_id: String,
    history: Vec<ChatMessage>,
    last_access: Instant,
}

/// Both mappings live behind the same lock and are always updated together.
struct CacheInner {
    /// session id -> record, least recently used evicted first.
    sessions: LruCache<String, SessionRecord>,

    /// owner id -> that owner's current session id.
    owners: HashMap<String, String>,
}

impl CacheInner {
    /// Remove a session and the owner pointer to it, if that pointer is still current.
    fn purge(&mut self, session_id: &str, reason: PurgeReason) -> Option<SessionRecord> {
        let record = self.sessions.pop(session_id)?;
        self.release_owner(&record.owner_id, session_id);
        debug!(
            session_id = %session_id,
            owner_id = %record.owner_id,
            reason = ?reason,
            "Session purged"
        );
        Some(record)
    }

    fn release_owner(&mut self, owner_id: &str, session_id: &str) {
        if self
            .owners
            .get(owner_id)
            .is_some_and(|current| current == session_id)
        {
            self.owners.remove(owner_id);
        }
    }
}

/// Ephemeral, in-process chat session cache.
///
/// Cloning is cheap; clones share the same underlying state. Every public
/// operation takes the lock once and holds it for its full duration, so the
/// one-session-per-owner invariant holds under concurrent callers.
pub struct SessionCache {
    inner: Arc<Mutex<CacheInner>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl SessionCache {
    /// Create a new cache using the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Create a new cache reading time from `clock`.
    pub fn with_clock(config: CacheConfig, clock: impl Clock + 'static) -> Self {
        let cap = NonZeroUsize::new(config.max_sessions).unwrap_or(NonZeroUsize::MIN);

        let inner = CacheInner {
            sessions: LruCache::new(cap),
            owners: HashMap::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
            config,
            clock: Arc::new(clock),
        }
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn is_expired(&self, last_access: Instant, now: Instant) -> bool {
        now.saturating_duration_since(last_access) > self.config.ttl
    }

    /// Return the history for `session_id`, creating the session if needed.
    ///
    /// Any other session held by `owner_id` is purged first. An expired
    /// session, or one recorded under a different owner, is discarded and
    /// replaced by a fresh, empty one. Never fails.
    ///
    /// The returned vector is a snapshot; use [`add_messages`](Self::add_messages)
    /// to extend the stored history.
    pub fn get_or_create_history(&self, session_id: &str, owner_id: &str) -> Vec<ChatMessage> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if let Some(previous) = inner.owners.get(owner_id).cloned()
            && previous != session_id
        {
            inner.purge(&previous, PurgeReason::OwnerSwitched);
            inner.owners.remove(owner_id);
        }

        let existing = inner
            .sessions
            .peek(session_id)
            .map(|record| (self.is_expired(record.last_access, now), record.owner_id == owner_id));

        match existing {
            Some((true, _)) => {
                inner.purge(session_id, PurgeReason::Expired);
            }
            Some((false, false)) => {
                inner.purge(session_id, PurgeReason::OwnerCollision);
            }
            Some((false, true)) => {
                // Purges above may have dropped the pointer, so always re-record it.
                inner
                    .owners
                    .insert(owner_id.to_string(), session_id.to_string());
                if let Some(record) = inner.sessions.get_mut(session_id) {
                    record.last_access = now;
                    trace!(
                        session_id = %session_id,
                        entries = record.history.len(),
                        "Session found in cache"
                    );
                    return record.history.clone();
                }
            }
            None => {}
        }

        inner
            .owners
            .insert(owner_id.to_string(), session_id.to_string());
        let record = SessionRecord {
            owner_id: owner_id.to_string(),
            history: Vec::new(),
            last_access: now,
        };
        if let Some((evicted_id, evicted)) = inner.sessions.push(session_id.to_string(), record) {
            inner.release_owner(&evicted.owner_id, &evicted_id);
            debug!(
                session_id = %evicted_id,
                owner_id = %evicted.owner_id,
                reason = ?PurgeReason::Evicted,
                "Session purged"
            );
        }

        debug!(
            session_id = %session_id,
            owner_id = %owner_id,
            cache_size = inner.sessions.len(),
            "Session created"
        );

        Vec::new()
    }

    /// Append messages to an existing session and trim to the newest entries.
    ///
    /// Silently does nothing if the session is unknown. An expired session
    /// is purged and the messages dropped.
    pub fn add_messages<I>(&self, session_id: &str, messages: I)
    where
        I: IntoIterator<Item = ChatMessage>,
    {
        let now = self.clock.now();
        let max_entries = self.config.max_history_entries();
        let mut inner = self.inner.lock();

        let expired = match inner.sessions.peek(session_id) {
            Some(record) => self.is_expired(record.last_access, now),
            None => {
                trace!(session_id = %session_id, "Append to unknown session ignored");
                return;
            }
        };

        if expired {
            inner.purge(session_id, PurgeReason::Expired);
            return;
        }

        if let Some(record) = inner.sessions.get_mut(session_id) {
            record.history.extend(messages);
            let len = record.history.len();
            if len > max_entries {
                record.history.drain(..len - max_entries);
                trace!(
                    session_id = %session_id,
                    dropped = len - max_entries,
                    "History trimmed"
                );
            }
            record.last_access = now;
        }
    }

    /// Read a session's history without refreshing its TTL or LRU position.
    pub fn peek_history(&self, session_id: &str) -> Option<Vec<ChatMessage>> {
        let now = self.clock.now();
        let inner = self.inner.lock();
        inner
            .sessions
            .peek(session_id)
            .filter(|record| !self.is_expired(record.last_access, now))
            .map(|record| record.history.clone())
    }

    /// Check if a live session exists (without touching it).
    pub fn contains(&self, session_id: &str) -> bool {
        let now = self.clock.now();
        let inner = self.inner.lock();
        inner
            .sessions
            .peek(session_id)
            .is_some_and(|record| !self.is_expired(record.last_access, now))
    }

    /// The live session currently held by `owner_id`, if any.
    pub fn session_for_owner(&self, owner_id: &str) -> Option<String> {
        let now = self.clock.now();
        let inner = self.inner.lock();
        let session_id = inner.owners.get(owner_id)?;
        inner
            .sessions
            .peek(session_id)
            .filter(|record| !self.is_expired(record.last_access, now))
            .map(|_| session_id.clone())
    }

    /// Explicitly end a session. Returns whether one was removed.
    pub fn end_session(&self, session_id: &str) -> bool {
        self.inner
            .lock()
            .purge(session_id, PurgeReason::Ended)
            .is_some()
    }

    /// Remove every expired session now.
    ///
    /// Expiry is otherwise only checked lazily on access; this is never run
    /// on a timer.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let expired: Vec<String> = inner
            .sessions
            .iter()
            .filter(|(_, record)| self.is_expired(record.last_access, now))
            .map(|(id, _)| id.clone())
            .collect();

        for session_id in &expired {
            inner.purge(session_id, PurgeReason::Expired);
        }

        if !expired.is_empty() {
            debug!(count = expired.len(), "Purged expired sessions");
        }

        expired.len()
    }

    /// Number of stored sessions, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.inner.lock().sessions.len()
    }

    /// Check if the cache holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().sessions.is_empty()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            sessions: inner.sessions.len(),
            owners: inner.owners.len(),
            capacity: inner.sessions.cap().get(),
            max_history_entries: self.config.max_history_entries(),
        }
    }
}

impl Clone for SessionCache {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl std::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Stored sessions, including expired ones not yet purged.
    pub sessions: usize,

    /// Owners with a recorded current session.
    pub owners: usize,

    /// Maximum number of sessions before LRU eviction.
    pub capacity: usize,

    /// Per-session history bound.
    pub max_history_entries: usize,
}
