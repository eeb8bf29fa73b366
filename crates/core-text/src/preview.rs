//! Collapsed input preview.
//!
//! A collapsed input block shows only the first line of its source followed by
//! an ellipsis. Long first lines are cut at a grapheme boundary so the preview
//! never splits a user-perceived character.

use unicode_segmentation::UnicodeSegmentation;

/// Maximum graphemes of the first line kept before the ellipsis.
pub const PREVIEW_MAX_GRAPHEMES: usize = 255;

const ELLIPSIS: &str = "...";

/// Build the single-line preview shown for a collapsed input block.
///
/// Empty input stays empty (no ellipsis).
pub fn collapsed_preview(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let line = crate::first_line(text);
    let cut = line
        .grapheme_indices(true)
        .nth(PREVIEW_MAX_GRAPHEMES)
        .map(|(byte, _)| byte)
        .unwrap_or(line.len());
    let mut out = String::with_capacity(cut + ELLIPSIS.len());
    out.push_str(&line[..cut]);
    out.push_str(ELLIPSIS);
    out
}
