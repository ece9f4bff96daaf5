//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [session]      # ephemeral chat session cache
//! [llm]          # chat model endpoint
//! [retrieval]    # document context retrieval
//! [logging]      # log level and JSON file output
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use studydesk_types::{ConfigProvider, HasSessionConfig, config_defaults as defaults};

/// Placeholder printed in place of secrets.
pub const REDACTED: &str = "***";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudydeskConfig {
    /// Session cache configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionConfig>,

    /// Chat model configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,

    /// Context retrieval configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval: Option<RetrievalConfig>,

    /// Logging configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl StudydeskConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// A config with every section filled in with defaults.
    pub fn with_defaults() -> Self {
        Self {
            session: Some(SessionConfig::default()),
            llm: Some(LlmConfig::default()),
            retrieval: Some(RetrievalConfig::default()),
            logging: Some(LoggingConfig::default()),
        }
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced whole, not field by field.
    pub fn merge(&mut self, other: StudydeskConfig) {
        if other.session.is_some() {
            self.session = other.session;
        }

        if other.llm.is_some() {
            self.llm = other.llm;
        }

        if other.retrieval.is_some() {
            self.retrieval = other.retrieval;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// A copy safe to print: an inline API key is replaced by [`REDACTED`].
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(llm) = copy.llm.as_mut()
            && llm.api_key.is_some()
        {
            llm.api_key = Some(REDACTED.to_string());
        }
        copy
    }

    /// Effective session settings.
    pub fn session(&self) -> SessionConfig {
        self.session.clone().unwrap_or_default()
    }

    /// Effective chat model settings.
    pub fn llm(&self) -> LlmConfig {
        self.llm.clone().unwrap_or_default()
    }

    /// Effective retrieval settings.
    pub fn retrieval(&self) -> RetrievalConfig {
        self.retrieval.clone().unwrap_or_default()
    }

    /// Effective logging settings.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Session cache configuration.
///
/// ```toml
/// [session]
/// ttl_secs = 21600
/// max_history_pairs = 5
/// max_sessions = 10000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle seconds before a session expires.
    pub ttl_secs: u64,
    /// User/assistant pairs kept per session.
    pub max_history_pairs: usize,
    /// Sessions kept before least-recently-used eviction.
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: defaults::SESSION_TTL_SECS,
            max_history_pairs: defaults::MAX_HISTORY_PAIRS,
            max_sessions: defaults::MAX_SESSIONS,
        }
    }
}

impl ConfigProvider for SessionConfig {}

impl HasSessionConfig for SessionConfig {
    fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    fn max_history_pairs(&self) -> usize {
        self.max_history_pairs
    }

    fn max_sessions(&self) -> usize {
        self.max_sessions
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Chat model endpoint (any OpenAI-compatible chat completions API).
///
/// ```toml
/// [llm]
/// base_url = "https://api.openai.com/v1"
/// model = "gpt-4o-mini"
/// api_key_env = "OPENAI_API_KEY"
/// timeout_secs = 120
/// temperature = 0.2   # optional, server default when absent
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Inline API key. Prefer `api_key_env`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::LLM_BASE_URL.to_string(),
            model: defaults::LLM_MODEL.to_string(),
            api_key: None,
            api_key_env: defaults::LLM_API_KEY_ENV.to_string(),
            timeout_secs: defaults::LLM_TIMEOUT_SECS,
            temperature: None,
        }
    }
}

impl LlmConfig {
    /// Whether an API key is stored directly in the config file.
    pub fn has_plaintext_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Resolve the API key: inline value first, then the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Some(key.clone());
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Retrieval Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Document context retrieval settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks of context passed to the model per turn.
    pub top_k: usize,
    /// Target chunk size when splitting a local document.
    pub chunk_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: defaults::RETRIEVAL_TOP_K,
            chunk_chars: defaults::CHUNK_CHARS,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Console filter level for studydesk crates.
    pub level: String,
    /// Also write JSON logs to a daily-rolling file.
    pub json_file: bool,
    /// Directory for log files (defaults to `<config dir>/logs`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_file: true,
            directory: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let config = StudydeskConfig::from_toml("").unwrap();
        assert!(config.session.is_none());
        assert!(config.llm.is_none());
        assert_eq!(config.session(), SessionConfig::default());
    }

    #[test]
    fn test_parse_session_partial() {
        let config = StudydeskConfig::from_toml(
            r#"
[session]
ttl_secs = 60
"#,
        )
        .unwrap();

        let session = config.session();
        assert_eq!(session.session_ttl(), Duration::from_secs(60));
        assert_eq!(session.max_history_pairs, 5);
        assert_eq!(session.max_sessions, 10_000);
    }

    #[test]
    fn test_parse_full_example() {
        let config = StudydeskConfig::from_toml(
            r#"
[session]
ttl_secs = 3600
max_history_pairs = 3
max_sessions = 500

[llm]
base_url = "http://localhost:11434/v1"
model = "llama3"
api_key_env = "LOCAL_KEY"
timeout_secs = 30

[retrieval]
top_k = 5
chunk_chars = 800

[logging]
level = "debug"
json_file = false
"#,
        )
        .unwrap();

        assert_eq!(config.session().max_history_pairs, 3);
        assert_eq!(config.llm().model, "llama3");
        assert_eq!(config.llm().timeout(), Duration::from_secs(30));
        assert_eq!(config.retrieval().top_k, 5);
        assert!(!config.logging().json_file);
    }

    #[test]
    fn test_merge_override() {
        let mut base = StudydeskConfig::from_toml(
            r#"
[session]
ttl_secs = 100

[llm]
model = "base-model"
"#,
        )
        .unwrap();
        let overlay = StudydeskConfig::from_toml(
            r#"
[llm]
model = "project-model"
"#,
        )
        .unwrap();

        base.merge(overlay);

        assert_eq!(base.llm().model, "project-model");
        assert_eq!(base.session().ttl_secs, 100);
    }

    #[test]
    fn test_roundtrip_toml() {
        let config = StudydeskConfig::with_defaults();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[session]"));
        assert!(!text.contains("api_key ="));

        let parsed = StudydeskConfig::from_toml(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_plaintext_api_key_detection() {
        let mut llm = LlmConfig::default();
        assert!(!llm.has_plaintext_api_key());

        llm.api_key = Some("sk-inline".to_string());
        assert!(llm.has_plaintext_api_key());
        assert_eq!(llm.resolve_api_key().as_deref(), Some("sk-inline"));
    }

    #[test]
    fn test_resolve_api_key_missing_env() {
        let llm = LlmConfig {
            api_key_env: "STUDYDESK_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(llm.resolve_api_key(), None);
    }

    #[test]
    fn test_redacted_masks_inline_key_only() {
        let mut config = StudydeskConfig::with_defaults();
        config.llm.as_mut().unwrap().api_key = Some("sk-inline".to_string());

        let shown = config.redacted();

        assert_eq!(shown.llm().api_key.as_deref(), Some(REDACTED));
        assert_eq!(shown.llm().model, config.llm().model);
        assert!(!shown.to_toml().unwrap().contains("sk-inline"));
        assert_eq!(config.llm().api_key.as_deref(), Some("sk-inline"));

        let keyless = StudydeskConfig::with_defaults();
        assert_eq!(keyless.redacted(), keyless);
    }

    #[test]
    fn test_parse_temperature() {
        let config = StudydeskConfig::from_toml("[llm]\ntemperature = 0.25\n").unwrap();
        assert_eq!(config.llm().temperature, Some(0.25));
        assert_eq!(LlmConfig::default().temperature, None);
    }
}
