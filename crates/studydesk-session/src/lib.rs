//! Ephemeral chat session cache for document chat.
//!
//! Each session maps a caller-supplied id to a short conversation history:
//! - at most one live session per owner; switching sessions purges the old one
//! - history bounded to the most recent N user/assistant pairs
//! - lazy TTL expiry, checked on access (no background sweeper)
//! - an LRU cap on the number of sessions as a memory safety valve
//!
//! Nothing is persisted; a process restart clears every session.
//!
//! # Example
//!
//! ```rust
//! use studydesk_session::{CacheConfig, SessionCache};
//! use studydesk_types::ChatMessage;
//!
//! let cache = SessionCache::new(CacheConfig::default());
//!
//! let history = cache.get_or_create_history("s1", "u1");
//! assert!(history.is_empty());
//!
//! cache.add_messages("s1", [ChatMessage::user("hi"), ChatMessage::assistant("hello")]);
//! assert_eq!(cache.get_or_create_history("s1", "u1").len(), 2);
//! ```

mod cache;
mod clock;
mod config;

pub use cache::{CacheStats, SessionCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
