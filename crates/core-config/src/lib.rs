//! Configuration loading and host settings.
//!
//! Two layers feed the notebook core:
//! * `notebook.toml` (or an override path supplied by the binary) carrying
//!   process-level knobs: `[history] depth`, the `[notebook]` defaults used
//!   before the host sends its first settings payload, and whether the
//!   interactive trailing edit cell exists (`[interactive] edit_cell`).
//! * The host settings payload (`settings::NotebookSettings`), a JSON document
//!   decoded on every settings update.
//!
//! The raw history depth is retained so the clamp can be re-applied if limits
//! change. Unknown TOML fields are ignored to allow forward evolution.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub mod settings;
pub use settings::{
    EditorOptions, ExtraSettings, FontSettings, NotebookSettings, compute_editor_options,
};

/// Snapshot depth used when the config file does not specify one.
pub const DEFAULT_HISTORY_DEPTH: usize = 50;
/// Upper bound on retained snapshots per stack.
pub const MAX_HISTORY_DEPTH: usize = 500;

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "HistoryConfig::default_depth")]
    pub depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            depth: Self::default_depth(),
        }
    }
}

impl HistoryConfig {
    const fn default_depth() -> usize {
        DEFAULT_HISTORY_DEPTH
    }
}

/// Settings used until the host pushes its own.
#[derive(Debug, Deserialize, Clone)]
pub struct NotebookDefaults {
    #[serde(default = "NotebookDefaults::default_true")]
    pub show_cell_input_code: bool,
    #[serde(default = "NotebookDefaults::default_true")]
    pub collapse_cell_input_code_by_default: bool,
    #[serde(default)]
    pub code_regular_expression: Option<String>,
    #[serde(default)]
    pub markdown_regular_expression: Option<String>,
}

impl Default for NotebookDefaults {
    fn default() -> Self {
        Self {
            show_cell_input_code: true,
            collapse_cell_input_code_by_default: true,
            code_regular_expression: None,
            markdown_regular_expression: None,
        }
    }
}

impl NotebookDefaults {
    const fn default_true() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct InteractiveConfig {
    #[serde(default)]
    pub edit_cell: bool,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub notebook: NotebookDefaults,
    #[serde(default)]
    pub interactive: InteractiveConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub raw: Option<String>,             // original file string (optional)
    pub file: ConfigFile,                // parsed (or default) data
    pub effective_history_depth: usize,  // clamped to 1..=MAX_HISTORY_DEPTH
}

impl Default for Config {
    fn default() -> Self {
        Self {
            raw: None,
            file: ConfigFile::default(),
            effective_history_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

/// Config path following platform conventions: local `notebook.toml` first,
/// then the platform config directory.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("notebook.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("nbcore").join("notebook.toml");
    }
    PathBuf::from("notebook.toml")
}

/// Load configuration from `path` (or the discovered location). A missing or
/// unparsable file yields defaults; the effective history depth is computed
/// before returning.
pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let mut cfg = match fs::read_to_string(&path) {
        Ok(content) => match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => Config {
                raw: Some(content),
                file,
                effective_history_depth: DEFAULT_HISTORY_DEPTH,
            },
            Err(e) => {
                warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
                Config::default()
            }
        },
        Err(_) => Config::default(),
    };
    cfg.apply_limits();
    Ok(cfg)
}

impl Config {
    /// Clamp the configured history depth into `1..=MAX_HISTORY_DEPTH`.
    /// Returns the effective value.
    pub fn apply_limits(&mut self) -> usize {
        let raw = self.file.history.depth;
        let clamped = raw.clamp(1, MAX_HISTORY_DEPTH);
        if clamped != raw {
            info!(
                target: "config",
                raw,
                clamped,
                max = MAX_HISTORY_DEPTH,
                "history_depth_clamped"
            );
        }
        self.effective_history_depth = clamped;
        clamped
    }

    /// Settings in effect before the host sends its first payload.
    pub fn initial_settings(&self) -> NotebookSettings {
        let d = &self.file.notebook;
        NotebookSettings {
            show_cell_input_code: d.show_cell_input_code,
            collapse_cell_input_code_by_default: d.collapse_cell_input_code_by_default,
            code_regular_expression: d.code_regular_expression.clone(),
            markdown_regular_expression: d.markdown_regular_expression.clone(),
            ..NotebookSettings::default()
        }
    }

    pub fn edit_cell_enabled(&self) -> bool {
        self.file.interactive.edit_cell
    }
}
