//! Configuration system for studydesk.
//!
//! Provides TOML-based configuration with:
//! - Session cache tuning (`[session]`)
//! - The chat model endpoint (`[llm]`)
//! - Context retrieval limits (`[retrieval]`)
//! - Log output (`[logging]`)
//! - Config file layering (user config dir + project-local overrides)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    Layer, LayerReport, LayerStatus, LoadedConfig, discover, read_file, user_config_dir,
    user_config_file, write_file,
};
pub use error::{ConfigError, Result};
pub use types::*;
