//! Cell marker recognition (`# %%` style separators).
//!
//! A marker may only appear on the first line of a cell's submitted code. When
//! the code consists of nothing but a marker the submission is treated as empty
//! by the execution engine.

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Default pattern recognising a code cell marker at line start.
pub const DEFAULT_CODE_MARKER: &str = r"^(#\s*%%|#\s*<codecell>|#\s*In\[\d*?\]|#\s*In\[ \])";
/// Default pattern recognising a markdown cell marker at line start.
pub const DEFAULT_MARKDOWN_MARKER: &str = r"^(#\s*%%\s*\[markdown\]|#\s*<markdowncell>)";

static DEFAULT_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_CODE_MARKER).expect("default code marker compiles"));
static DEFAULT_MARKDOWN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(DEFAULT_MARKDOWN_MARKER).expect("default markdown marker compiles")
});

/// Compiled code and markdown marker patterns. Cloning shares the compiled
/// programs; equality compares the pattern text.
#[derive(Debug, Clone)]
pub struct CellMatcher {
    code: Regex,
    markdown: Regex,
}

impl Default for CellMatcher {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl CellMatcher {
    /// Build a matcher from optional user overrides. An override that fails to
    /// compile (or is blank) falls back to the default pattern.
    pub fn new(code_pattern: Option<&str>, markdown_pattern: Option<&str>) -> Self {
        Self {
            code: compile_or_default(code_pattern, &DEFAULT_CODE_RE),
            markdown: compile_or_default(markdown_pattern, &DEFAULT_MARKDOWN_RE),
        }
    }

    pub fn code_pattern(&self) -> &str {
        self.code.as_str()
    }

    pub fn markdown_pattern(&self) -> &str {
        self.markdown.as_str()
    }

    pub fn is_markdown(&self, line: &str) -> bool {
        self.markdown.is_match(line)
    }

    pub fn is_code(&self, line: &str) -> bool {
        self.code.is_match(line) && !self.is_markdown(line)
    }

    pub fn is_cell(&self, line: &str) -> bool {
        self.code.is_match(line) || self.is_markdown(line)
    }

    /// True when `line` is a marker with nothing but whitespace after it.
    pub fn is_bare_marker(&self, line: &str) -> bool {
        let trimmed = line.trim();
        [&self.code, &self.markdown].iter().any(|re| {
            re.find(trimmed)
                .map(|m| trimmed[m.end()..].trim().is_empty())
                .unwrap_or(false)
        })
    }

    /// Remove the first line of `code` when it is a cell marker. Markers on
    /// later lines are left in place.
    pub fn strip_first_marker(&self, code: &str) -> String {
        let lines = crate::split_multiline(code);
        match lines.first() {
            Some(first) if self.is_cell(first) => crate::concat_multiline(&lines[1..]),
            _ => code.to_owned(),
        }
    }
}

impl PartialEq for CellMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.code_pattern() == other.code_pattern()
            && self.markdown_pattern() == other.markdown_pattern()
    }
}

impl Eq for CellMatcher {}

fn compile_or_default(pattern: Option<&str>, default: &LazyLock<Regex>) -> Regex {
    if let Some(p) = pattern.filter(|p| !p.trim().is_empty()) {
        match Regex::new(p) {
            Ok(re) => return re,
            Err(e) => {
                warn!(target: "text.marker", error = %e, "invalid_marker_pattern_fallback");
            }
        }
    }
    Regex::clone(default)
}
