//! Configuration traits for decoupled config passing between crates.
//!
//! The session cache depends on these capabilities rather than on the
//! full configuration schema in `studydesk-config`.

use std::time::Duration;

/// Base trait for all configuration types.
pub trait ConfigProvider: Clone + Send + Sync + 'static {}

/// Session cache configuration.
pub trait HasSessionConfig: ConfigProvider {
    /// Idle time after which a session is treated as absent.
    fn session_ttl(&self) -> Duration;

    /// Number of user/assistant pairs retained per session.
    fn max_history_pairs(&self) -> usize;

    /// Upper bound on live sessions before LRU eviction.
    fn max_sessions(&self) -> usize {
        defaults::MAX_SESSIONS
    }
}

/// Default configuration values.
pub mod defaults {
    use std::time::Duration;

    /// 6 hours.
    pub const SESSION_TTL_SECS: u64 = 6 * 60 * 60;
    /// 5 pairs, 10 entries.
    pub const MAX_HISTORY_PAIRS: usize = 5;
    pub const MAX_SESSIONS: usize = 10_000;
    pub const RETRIEVAL_TOP_K: usize = 3;
    pub const CHUNK_CHARS: usize = 1200;
    pub const LLM_TIMEOUT_SECS: u64 = 120;
    pub const LLM_BASE_URL: &str = "https://api.openai.com/v1";
    pub const LLM_MODEL: &str = "gpt-4o-mini";
    pub const LLM_API_KEY_ENV: &str = "OPENAI_API_KEY";

    pub fn session_ttl() -> Duration {
        Duration::from_secs(SESSION_TTL_SECS)
    }
}
