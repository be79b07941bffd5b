//! Configuration loading.
//!
//! Handles:
//! - directory index roots (depth -> paths) and the exclusion denylist
//! - the window template applied to freshly created sessions
//! - picker and launcher commands

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SessionizerError;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "MUXPICK_CONFIG";

/// Path components that never show up in the index.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    ".venv",
    "venv",
    "__pycache__",
    ".mypy_cache",
];

static RE_ENV_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub index: IndexConfig,
    pub bootstrap: BootstrapTemplate,
    pub picker: PickerConfig,
    pub launcher: LauncherConfig,
    pub ambiguity: AmbiguityPolicy,
    /// Path to the tmux binary
    pub tmux: TmuxBinary,
}

/// Roots to scan for project directories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub roots: Vec<RootEntry>,
    pub exclude: Vec<String>,
}

/// A set of roots scanned at one depth.
///
/// Depth 0 lists the root itself; depth N lists subdirectories 1..=N levels down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootEntry {
    pub depth: usize,
    pub paths: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            roots: vec![
                RootEntry {
                    depth: 1,
                    paths: vec!["~/projects".to_string()],
                },
                RootEntry {
                    depth: 2,
                    paths: vec!["~/work".to_string()],
                },
                RootEntry {
                    depth: 0,
                    paths: vec!["~".to_string()],
                },
            ],
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Windows created in every new session, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapTemplate {
    pub windows: Vec<WindowSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub name: String,
    /// Command to run in the window; `None` leaves a plain shell
    #[serde(default)]
    pub command: Option<String>,
}

impl WindowSpec {
    pub fn shell(name: &str) -> Self {
        Self {
            name: name.to_string(),
            command: None,
        }
    }
}

impl Default for BootstrapTemplate {
    fn default() -> Self {
        let editor = std::env::var("EDITOR")
            .ok()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "nvim".to_string());
        Self {
            windows: vec![
                WindowSpec {
                    name: "code".to_string(),
                    command: Some(editor),
                },
                WindowSpec::shell("bash"),
                WindowSpec::shell("server"),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickerKind {
    #[default]
    External,
    Builtin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    pub kind: PickerKind,
    /// Program and arguments of the external picker
    pub command: Vec<String>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            kind: PickerKind::External,
            command: vec!["fzf".to_string(), "--reverse".to_string()],
        }
    }
}

/// How a selection made in the graphical menu is handed to a terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Process name killed before the terminal is spawned
    pub menu_process: String,
    /// Terminal program and the flag that introduces the command to run
    pub terminal: Vec<String>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            menu_process: "rofi".to_string(),
            terminal: vec!["alacritty".to_string(), "-e".to_string()],
        }
    }
}

/// What happens when a candidate is both a live session and an indexed directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityPolicy {
    #[default]
    SessionWins,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TmuxBinary(pub String);

impl Default for TmuxBinary {
    fn default() -> Self {
        Self("tmux".to_string())
    }
}

/// Returns the default config file location (`<config_dir>/muxpick/config.json`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("muxpick").join("config.json"))
}

impl Config {
    /// Load the configuration.
    ///
    /// An explicit path (flag or environment) must exist. The default location
    /// falls back to built-in defaults when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SessionizerError> {
        let from_env = std::env::var_os(CONFIG_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    tracing::debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, SessionizerError> {
        let content = std::fs::read_to_string(path).map_err(|e| SessionizerError::Config {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;
        let config = Self::from_json(&content).map_err(|details| SessionizerError::Config {
            path: path.to_path_buf(),
            details,
        })?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, String> {
        let config: Config = serde_json::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.bootstrap.windows.is_empty() {
            return Err("bootstrap.windows must name at least one window".to_string());
        }
        if let Some(w) = self.bootstrap.windows.iter().find(|w| w.name.trim().is_empty()) {
            return Err(format!("bootstrap window with empty name: {:?}", w));
        }
        if self.picker.kind == PickerKind::External && self.picker.command.is_empty() {
            return Err("picker.command is empty".to_string());
        }
        if self.launcher.terminal.is_empty() {
            return Err("launcher.terminal is empty".to_string());
        }
        Ok(())
    }
}

/// Expand a leading `~` and any `$VAR` / `${VAR}` references.
///
/// Unset variables expand to the empty string.
pub fn expand_path(raw: &str) -> PathBuf {
    let with_vars = RE_ENV_VAR.replace_all(raw, |caps: &regex::Captures| {
        let name = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()).unwrap_or("");
        std::env::var(name).unwrap_or_default()
    });

    match with_vars.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            let home = dirs::home_dir().unwrap_or_default();
            let rest = rest.trim_start_matches('/');
            if rest.is_empty() {
                home
            } else {
                home.join(rest)
            }
        }
        _ => PathBuf::from(with_vars.as_ref()),
    }
}
