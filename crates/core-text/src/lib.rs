//! Multi-line source text helpers shared by the notebook crates.
//!
//! Cell source travels in two shapes: as an ordered list of lines (each line
//! except possibly the last keeps its trailing `\n`) and as one joined string.
//! The helpers here convert between the two without loss so that
//! `concat_multiline(&split_multiline(s)) == s` for every input.
//!
//! Nothing in this crate parses source beyond line splitting and recognising a
//! leading cell marker.

pub mod marker;
pub mod preview;

pub use marker::CellMatcher;
pub use preview::{PREVIEW_MAX_GRAPHEMES, collapsed_preview};

/// Split text into lines, keeping the `\n` terminator on every line that had one.
///
/// An empty string yields no lines; a trailing newline does not produce a
/// trailing empty line.
pub fn split_multiline(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_owned).collect()
}

/// Join lines produced by [`split_multiline`] (or received from the host) back
/// into a single string.
pub fn concat_multiline<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.as_ref().len()).sum());
    for line in lines {
        out.push_str(line.as_ref());
    }
    out
}

/// Number of display lines in `text` (a trailing newline counts as starting a new, empty line).
/// Empty text has zero lines.
pub fn line_count(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        text.split('\n').count()
    }
}

/// First line of `text` without its terminator.
pub fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or("")
}
