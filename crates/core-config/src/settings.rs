//! Host settings payload.
//!
//! The host pushes its data science settings as a JSON document (camelCase
//! keys). Everything here is opaque to the reducer except the few fields that
//! drive input visibility, collapse defaults, marker patterns and theming.

use serde::{Deserialize, Serialize};

/// Default monospace font family used until the host says otherwise.
pub const DEFAULT_FONT_FAMILY: &str = "Consolas, 'Courier New', monospace";
pub const DEFAULT_FONT_SIZE: u16 = 14;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotebookSettings {
    pub show_cell_input_code: bool,
    pub collapse_cell_input_code_by_default: bool,
    pub code_regular_expression: Option<String>,
    pub markdown_regular_expression: Option<String>,
    pub ignore_vscode_theme: bool,
    pub enable_gather: bool,
    pub extra_settings: Option<ExtraSettings>,
}

impl Default for NotebookSettings {
    fn default() -> Self {
        Self {
            show_cell_input_code: true,
            collapse_cell_input_code_by_default: true,
            code_regular_expression: None,
            markdown_regular_expression: None,
            ignore_vscode_theme: false,
            enable_gather: false,
            extra_settings: None,
        }
    }
}

impl NotebookSettings {
    /// Decode a settings document sent by the host.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Theme name requested by the host, if any.
    pub fn theme(&self) -> Option<&str> {
        self.extra_settings.as_ref().map(|e| e.theme.as_str())
    }

    /// Whether the active theme should be treated as dark.
    pub fn known_dark(&self) -> bool {
        if self.ignore_vscode_theme {
            return false;
        }
        self.theme()
            .map(|t| t.to_ascii_lowercase().contains("dark"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtraSettings {
    pub font_family: String,
    pub font_size: u16,
    pub theme: String,
    pub editor: EditorSettings,
}

impl Default for ExtraSettings {
    fn default() -> Self {
        Self {
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            font_size: DEFAULT_FONT_SIZE,
            theme: String::new(),
            editor: EditorSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorSettings {
    pub cursor_style: String,
    pub cursor_blink: String,
    pub auto_closing_brackets: String,
    pub auto_indent: bool,
    pub font_ligatures: bool,
    pub word_wrap: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            cursor_style: "line".to_owned(),
            cursor_blink: "blink".to_owned(),
            auto_closing_brackets: "languageDefined".to_owned(),
            auto_indent: true,
            font_ligatures: false,
            word_wrap: false,
        }
    }
}

/// Options handed to the embedded editor widget. Derived, never edited directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorOptions {
    pub cursor_style: String,
    pub cursor_blinking: String,
    pub auto_closing_brackets: String,
    pub auto_indent: bool,
    pub font_ligatures: bool,
    pub word_wrap: bool,
    pub line_numbers: bool,
    pub minimap: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        compute_editor_options(&NotebookSettings::default())
    }
}

pub fn compute_editor_options(settings: &NotebookSettings) -> EditorOptions {
    let defaults = EditorSettings::default();
    let editor = settings
        .extra_settings
        .as_ref()
        .map(|e| &e.editor)
        .unwrap_or(&defaults);
    EditorOptions {
        cursor_style: editor.cursor_style.clone(),
        cursor_blinking: editor.cursor_blink.clone(),
        auto_closing_brackets: editor.auto_closing_brackets.clone(),
        auto_indent: editor.auto_indent,
        font_ligatures: editor.font_ligatures,
        word_wrap: editor.word_wrap,
        line_numbers: false,
        minimap: false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontSettings {
    pub family: String,
    pub size: u16,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            family: DEFAULT_FONT_FAMILY.to_owned(),
            size: DEFAULT_FONT_SIZE,
        }
    }
}

impl FontSettings {
    /// Font from settings, keeping `current` when the host sent no extra settings.
    pub fn from_settings(settings: &NotebookSettings, current: &FontSettings) -> Self {
        match &settings.extra_settings {
            Some(extra) => Self {
                family: extra.font_family.clone(),
                size: extra.font_size,
            },
            None => current.clone(),
        }
    }
}
