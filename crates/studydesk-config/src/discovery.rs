//! Finding the user and project config files and folding them together.
//!
//! The user file is read first and `studydesk.toml` in the project
//! directory second; a section present in the project file replaces the
//! user's section wholesale.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{ConfigError, Result, StudydeskConfig};

/// Project-local config file name.
pub const PROJECT_FILE: &str = "studydesk.toml";

/// Config file name inside the user config directory.
pub const USER_FILE: &str = "config.toml";

/// Overrides the user config directory when set and non-empty.
pub const CONFIG_DIR_ENV: &str = "STUDYDESK_CONFIG_DIR";

/// Which layer a config file belongs to, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    User,
    Project,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.pad("user"),
            Self::Project => f.pad("project"),
        }
    }
}

/// Outcome of reading one layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerStatus {
    /// No file at the path.
    Missing,
    /// Parsed and merged.
    Loaded,
    /// Present but unreadable or malformed; skipped.
    Rejected(String),
}

/// What discovery found for one layer.
#[derive(Debug, Clone)]
pub struct LayerReport {
    pub layer: Layer,
    pub path: PathBuf,
    pub status: LayerStatus,
    /// Problems with the values in this file that did not stop it loading.
    pub warnings: Vec<String>,
}

impl LayerReport {
    pub fn is_loaded(&self) -> bool {
        self.status == LayerStatus::Loaded
    }
}

/// The merged configuration plus a report per layer.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: StudydeskConfig,
    pub layers: Vec<LayerReport>,
}

impl LoadedConfig {
    /// Paths of the files that contributed to `config`.
    pub fn loaded_paths(&self) -> Vec<&Path> {
        self.layers
            .iter()
            .filter(|r| r.is_loaded())
            .map(|r| r.path.as_path())
            .collect()
    }

    /// Every warning across all layers, rejected files included.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        for report in &self.layers {
            if let LayerStatus::Rejected(reason) = &report.status {
                out.push(format!(
                    "skipped {} config {}: {}",
                    report.layer,
                    report.path.display(),
                    reason
                ));
            }
            out.extend(
                report
                    .warnings
                    .iter()
                    .map(|w| format!("{} ({} config)", w, report.layer)),
            );
        }
        out
    }
}

/// Read and merge the user and project layers.
///
/// `user_dir` replaces the [`user_config_dir`] lookup and `project_dir`
/// defaults to the working directory. Bad files never fail discovery;
/// they show up as [`LayerStatus::Rejected`].
pub fn discover(project_dir: Option<&Path>, user_dir: Option<&Path>) -> LoadedConfig {
    let user_path = user_dir
        .map(Path::to_path_buf)
        .or_else(user_config_dir)
        .map(|d| d.join(USER_FILE));
    let project_path = project_dir.unwrap_or(Path::new(".")).join(PROJECT_FILE);

    let candidates = user_path
        .map(|p| (Layer::User, p))
        .into_iter()
        .chain([(Layer::Project, project_path)]);

    let mut config = StudydeskConfig::new();
    let mut layers = Vec::new();
    for (layer, path) in candidates {
        let (status, warnings) = match path.is_file().then(|| read_file(&path)) {
            None => (LayerStatus::Missing, Vec::new()),
            Some(Err(e)) => (LayerStatus::Rejected(e.to_string()), Vec::new()),
            Some(Ok(file)) => {
                let warnings = value_warnings(&file);
                config.merge(file);
                (LayerStatus::Loaded, warnings)
            }
        };
        layers.push(LayerReport {
            layer,
            path,
            status,
            warnings,
        });
    }

    LoadedConfig { config, layers }
}

/// Settings that load fine but are probably not what the user meant.
fn value_warnings(file: &StudydeskConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    if let Some(llm) = &file.llm
        && llm.has_plaintext_api_key()
    {
        warnings.push(format!(
            "[llm] api_key is stored in plain text; set api_key_env = \"{}\" and export the key instead",
            llm.api_key_env
        ));
    }
    if let Some(session) = &file.session {
        if session.ttl_secs == 0 {
            warnings.push("[session] ttl_secs = 0 expires every session on its next access".into());
        }
        if session.max_history_pairs == 0 {
            warnings.push("[session] max_history_pairs = 0 is raised to 1".into());
        }
        if session.max_sessions == 0 {
            warnings.push("[session] max_sessions = 0 is raised to 1".into());
        }
    }
    warnings
}

/// Parse a single config file.
pub fn read_file(path: &Path) -> Result<StudydeskConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    StudydeskConfig::from_toml(&text)
}

/// Write `config` as TOML, creating missing parent directories.
pub fn write_file(config: &StudydeskConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source,
        })?;
    }
    std::fs::write(path, config.to_toml()?).map_err(|source| ConfigError::WriteFile {
        path: path.display().to_string(),
        source,
    })
}

/// `$STUDYDESK_CONFIG_DIR`, else `<platform config dir>/studydesk`.
pub fn user_config_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join("studydesk")),
    }
}

/// Full path of the user config file.
pub fn user_config_file() -> Option<PathBuf> {
    user_config_dir().map(|d| d.join(USER_FILE))
}
