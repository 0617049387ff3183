//! The Text Surface: a mutable character buffer with a selection range.
//!
//! All public offsets are **character offsets** (Unicode scalar values) and
//! all ranges are half-open. The built-in [`TextBuffer`] is rope-backed;
//! hosts embedding a platform text widget can implement [`TextSurface`] over
//! it instead and drive the same undo engine.

use std::ops::Range;

use ropey::Rope;

/// A 1-based (row, column) position derived from a character offset.
///
/// `row == 0` means "unknown" (e.g. queried against an empty line index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextPosition {
    /// 1-based line number, or 0 if unknown.
    pub row: usize,
    /// 1-based column within the line.
    pub col: usize,
}

impl TextPosition {
    /// The "unknown" position.
    pub const ZERO: Self = Self { row: 0, col: 0 };

    /// Create a position.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// The mutable character buffer an editor operates on.
///
/// Implementations must clamp out-of-range inputs rather than panic.
pub trait TextSurface {
    /// The full buffer content.
    fn text(&self) -> String;
    /// Replace the full buffer content. Collapses the selection to the end of
    /// the new text if it no longer fits.
    fn set_text(&mut self, text: &str);
    /// Total character count.
    fn char_count(&self) -> usize;
    /// Current selection (possibly empty).
    fn selection(&self) -> Range<usize>;
    /// Move the selection, clamping it into the document.
    fn set_selection(&mut self, range: Range<usize>);
    /// Replace `range` with `text`, returning the replaced text.
    fn replace_range(&mut self, range: Range<usize>, text: &str) -> String;
    /// The text inside `range` (clamped).
    fn text_in_range(&self, range: Range<usize>) -> String;
}

/// Rope-backed [`TextSurface`] implementation with a line index.
pub struct TextBuffer {
    rope: Rope,
    selection: Range<usize>,
}

impl TextBuffer {
    /// Create a buffer from initial text.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            selection: 0..0,
        }
    }

    /// Create an empty buffer.
    pub fn empty() -> Self {
        Self::new("")
    }

    /// Total line count (an empty document has one line).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Character range of line `row` (0-based), excluding the trailing
    /// newline. Clamps to the last line.
    pub fn line_range(&self, row: usize) -> Range<usize> {
        let row = row.min(self.line_count().saturating_sub(1));
        let start = self.rope.line_to_char(row);
        let end = if row + 1 < self.rope.len_lines() {
            self.rope.line_to_char(row + 1).saturating_sub(1)
        } else {
            self.rope.len_chars()
        };
        start..end.max(start)
    }

    /// The 1-based position of a character offset.
    pub fn position_at(&self, offset: usize) -> TextPosition {
        let offset = offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(offset);
        let line_start = self.rope.line_to_char(line);
        TextPosition::new(line + 1, offset - line_start + 1)
    }

    /// Text of line `row` (0-based), excluding the trailing newline.
    pub fn line_text(&self, row: usize) -> Option<String> {
        if row >= self.line_count() {
            return None;
        }
        let mut text = self.rope.line(row).to_string();
        if text.ends_with('\n') {
            text.pop();
        }
        if text.ends_with('\r') {
            text.pop();
        }
        Some(text)
    }

    fn clamp_range(&self, range: Range<usize>) -> Range<usize> {
        let len = self.rope.len_chars();
        let start = range.start.min(len);
        let end = range.end.min(len).max(start);
        start..end
    }
}

impl TextSurface for TextBuffer {
    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.selection = self.clamp_range(self.selection.clone());
    }

    fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    fn set_selection(&mut self, range: Range<usize>) {
        self.selection = self.clamp_range(range);
    }

    fn replace_range(&mut self, range: Range<usize>, text: &str) -> String {
        let range = self.clamp_range(range);
        let old = self.rope.slice(range.clone()).to_string();
        self.rope.remove(range.clone());
        self.rope.insert(range.start, text);
        self.selection = self.clamp_range(self.selection.clone());
        old
    }

    fn text_in_range(&self, range: Range<usize>) -> String {
        let range = self.clamp_range(range);
        self.rope.slice(range).to_string()
    }
}
