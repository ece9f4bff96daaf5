//! Configuration for the session cache.

use std::time::Duration;

use studydesk_types::{HasSessionConfig, config_defaults as defaults};

/// Configuration for the session cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Idle time after which a session is treated as absent.
    pub ttl: Duration,

    /// Number of user/assistant pairs kept per session.
    pub max_history_pairs: usize,

    /// Maximum number of sessions before the least recently used is evicted.
    pub max_sessions: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: defaults::session_ttl(),
            max_history_pairs: defaults::MAX_HISTORY_PAIRS,
            max_sessions: defaults::MAX_SESSIONS,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from any session config provider.
    pub fn from_provider(provider: &impl HasSessionConfig) -> Self {
        Self {
            ttl: provider.session_ttl(),
            max_history_pairs: provider.max_history_pairs(),
            max_sessions: provider.max_sessions(),
        }
    }

    /// Set the idle TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the number of retained user/assistant pairs.
    pub fn with_max_history_pairs(mut self, pairs: usize) -> Self {
        self.max_history_pairs = pairs;
        self
    }

    /// Set the maximum number of cached sessions.
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    /// Maximum number of history entries kept per session.
    ///
    /// Zero pairs is clamped to one so a session always holds the last turn.
    pub fn max_history_entries(&self) -> usize {
        self.max_history_pairs.max(1) * 2
    }
}
