//! Shared types for the studydesk document chat system.

pub mod config;
pub mod message;

pub use config::{ConfigProvider, HasSessionConfig, defaults as config_defaults};
pub use message::{ChatMessage, Role};
