//! Undo engine: an explicit command-pattern stack of invertible edit records.
//!
//! Every user-visible edit is captured as an [`EditRecord`] holding the
//! affected ranges and the old/new text, so it can be replayed in either
//! direction against any [`TextSurface`]:
//!
//! - undo = replace `new_range` with `old_text`, restore selection to
//!   `old_range`
//! - redo = replace `old_range` with `new_text`, restore selection to
//!   `new_range`
//!
//! Undoing a record moves it to the redo stack and vice versa, so undo and
//! redo generate each other. Recording is disabled while an application is in
//! flight; the guard also forces `can_undo`/`can_redo` to report false so
//! rapid input cannot trigger re-entrant replay.

use std::ops::Range;
use std::time::Instant;

use tracing::debug;

use crate::buffer::TextSurface;

const MAX_UNDO_DEPTH: usize = 1000;

/// The user-visible action an edit record was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// Typed or programmatic insertion (replaces the selection).
    Insert,
    /// Backward delete of the selection or the character before the caret.
    Delete,
    /// Replacement of an arbitrary range (e.g. search replace).
    Replace,
    /// Cut of the selection.
    Cut,
    /// Clipboard paste, captured in two phases.
    Paste,
}

/// One invertible edit.
#[derive(Debug, Clone)]
pub struct EditRecord {
    /// The action that produced this record.
    pub kind: EditKind,
    /// Range the edit replaced (pre-edit offsets).
    pub old_range: Range<usize>,
    /// Range the new text occupies (post-edit offsets).
    pub new_range: Range<usize>,
    /// Text that was replaced.
    pub old_text: String,
    /// Text that replaced it.
    pub new_text: String,
    /// When the edit was recorded.
    pub at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Idle,
    ApplyingUndo,
    ApplyingRedo,
}

#[derive(Debug)]
struct PendingCapture {
    kind: EditKind,
    old_range: Range<usize>,
    old_text: String,
    char_count: usize,
}

/// Records edits and replays them as inverse operations.
///
/// The engine owns the history; the surface it mutates is passed per call
/// (ownership flows one direction only: the editor owns both).
pub struct UndoEngine {
    undo_stack: Vec<EditRecord>,
    redo_stack: Vec<EditRecord>,
    state: EngineState,
    pending: Option<PendingCapture>,
}

impl UndoEngine {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            state: EngineState::Idle,
            pending: None,
        }
    }

    /// Whether an undo is possible. False while an undo/redo is in flight.
    pub fn can_undo(&self) -> bool {
        self.state == EngineState::Idle && !self.undo_stack.is_empty()
    }

    /// Whether a redo is possible. False while an undo/redo is in flight.
    pub fn can_redo(&self) -> bool {
        self.state == EngineState::Idle && !self.redo_stack.is_empty()
    }

    /// Undo stack depth.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Redo stack depth.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drop all history (e.g. after `set_text` from the host).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.pending = None;
    }

    fn push(&mut self, record: EditRecord) {
        self.redo_stack.clear();
        if self.undo_stack.len() >= MAX_UNDO_DEPTH {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(record);
    }

    fn recording_enabled(&self) -> bool {
        if self.state != EngineState::Idle {
            debug!("edit recording suppressed while applying undo/redo");
            return false;
        }
        true
    }

    /// Replace the current selection with `text` and record the edit.
    ///
    /// Returns the range now occupied by `text`, or `None` when recording is
    /// suppressed.
    pub fn record_insert(
        &mut self,
        surface: &mut dyn TextSurface,
        text: &str,
        kind: EditKind,
    ) -> Option<Range<usize>> {
        if !self.recording_enabled() {
            return None;
        }

        let old_range = surface.selection();
        let new_len = text.chars().count();
        let new_range = old_range.start..old_range.start + new_len;

        let old_text = surface.replace_range(old_range.clone(), text);
        surface.set_selection(new_range.end..new_range.end);

        self.push(EditRecord {
            kind,
            old_range,
            new_range: new_range.clone(),
            old_text,
            new_text: text.to_string(),
            at: Instant::now(),
        });
        Some(new_range)
    }

    /// Delete the selection, or the character before the caret when the
    /// selection is empty. No-op at document start.
    ///
    /// Returns the collapsed range at the delete point, or `None` when
    /// nothing was deleted.
    pub fn record_delete(&mut self, surface: &mut dyn TextSurface) -> Option<Range<usize>> {
        if !self.recording_enabled() {
            return None;
        }

        let mut old_range = surface.selection();
        if old_range.is_empty() {
            if old_range.start == 0 {
                return None;
            }
            old_range = old_range.start - 1..old_range.start;
        }

        let new_range = old_range.start..old_range.start;
        let old_text = surface.replace_range(old_range.clone(), "");
        surface.set_selection(new_range.clone());

        self.push(EditRecord {
            kind: EditKind::Delete,
            old_range,
            new_range: new_range.clone(),
            old_text,
            new_text: String::new(),
            at: Instant::now(),
        });
        Some(new_range)
    }

    /// Replace an explicit range (not necessarily the selection) and record
    /// the edit. Used by search replace.
    pub fn record_replace(
        &mut self,
        surface: &mut dyn TextSurface,
        range: Range<usize>,
        text: &str,
        kind: EditKind,
    ) -> Option<Range<usize>> {
        if !self.recording_enabled() {
            return None;
        }

        let new_len = text.chars().count();
        let new_range = range.start..range.start + new_len;
        let old_text = surface.replace_range(range.clone(), text);
        surface.set_selection(new_range.end..new_range.end);

        self.push(EditRecord {
            kind,
            old_range: range,
            new_range: new_range.clone(),
            old_text,
            new_text: text.to_string(),
            at: Instant::now(),
        });
        Some(new_range)
    }

    /// Replace the whole buffer in one step and record a single entry.
    ///
    /// Used by replace-all: undo restores the entire old document rather than
    /// reverting matches one by one.
    pub fn record_bulk_replace(
        &mut self,
        surface: &mut dyn TextSurface,
        new_text: &str,
    ) -> Option<Range<usize>> {
        if !self.recording_enabled() {
            return None;
        }

        let old_text = surface.text();
        let old_range = 0..surface.char_count();
        let new_range = 0..new_text.chars().count();

        surface.set_text(new_text);
        surface.set_selection(0..0);

        self.push(EditRecord {
            kind: EditKind::Replace,
            old_range,
            new_range: new_range.clone(),
            old_text,
            new_text: new_text.to_string(),
            at: Instant::now(),
        });
        Some(new_range)
    }

    /// First phase of paste/replace capture: snapshot the pre-edit selection
    /// and length before the platform mutates the buffer.
    ///
    /// The inserted content's length is not known until the platform
    /// completes the operation, so the record is finished by
    /// [`UndoEngine::complete_pending_capture`] on the next text-changed
    /// notification.
    pub fn begin_pending_capture(&mut self, surface: &dyn TextSurface, kind: EditKind) {
        if !self.recording_enabled() {
            return;
        }

        let old_range = surface.selection();
        self.pending = Some(PendingCapture {
            kind,
            old_text: surface.text_in_range(old_range.clone()),
            old_range,
            char_count: surface.char_count(),
        });
    }

    /// Second phase of paste/replace capture: compute the actually-inserted
    /// text by length delta and retroactively record the edit.
    ///
    /// Returns the range occupied by the inserted text, or `None` when no
    /// capture was pending or the buffer did not change.
    pub fn complete_pending_capture(&mut self, surface: &dyn TextSurface) -> Option<Range<usize>> {
        let pending = self.pending.take()?;

        let old_len = pending.old_range.end - pending.old_range.start;
        let base = pending.char_count - old_len;
        let inserted_len = surface.char_count().checked_sub(base)?;

        let new_range = pending.old_range.start..pending.old_range.start + inserted_len;
        let new_text = surface.text_in_range(new_range.clone());

        if new_text == pending.old_text {
            return None;
        }

        self.push(EditRecord {
            kind: pending.kind,
            old_range: pending.old_range,
            new_range: new_range.clone(),
            old_text: pending.old_text,
            new_text,
            at: Instant::now(),
        });
        Some(new_range)
    }

    /// Discard a pending capture without recording.
    pub fn cancel_pending_capture(&mut self) {
        self.pending = None;
    }

    /// Apply the inverse of the most recent edit.
    ///
    /// Returns the restored selection range, or `None` when the stack is
    /// empty or another application is in flight.
    pub fn undo(&mut self, surface: &mut dyn TextSurface) -> Option<Range<usize>> {
        if !self.can_undo() {
            return None;
        }

        self.state = EngineState::ApplyingUndo;
        let Some(record) = self.undo_stack.pop() else {
            self.state = EngineState::Idle;
            return None;
        };

        surface.replace_range(record.new_range.clone(), &record.old_text);
        surface.set_selection(record.old_range.clone());
        let restored = record.old_range.clone();

        self.redo_stack.push(record);
        self.state = EngineState::Idle;
        Some(restored)
    }

    /// Re-apply the most recently undone edit.
    pub fn redo(&mut self, surface: &mut dyn TextSurface) -> Option<Range<usize>> {
        if !self.can_redo() {
            return None;
        }

        self.state = EngineState::ApplyingRedo;
        let Some(record) = self.redo_stack.pop() else {
            self.state = EngineState::Idle;
            return None;
        };

        surface.replace_range(record.old_range.clone(), &record.new_text);
        surface.set_selection(record.new_range.clone());
        let restored = record.new_range.clone();

        self.undo_stack.push(record);
        self.state = EngineState::Idle;
        Some(restored)
    }
}

impl Default for UndoEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;

    #[test]
    fn test_insert_undo_redo() {
        let mut buffer = TextBuffer::new("ab");
        let mut engine = UndoEngine::new();

        buffer.set_selection(0..0);
        engine.record_insert(&mut buffer, "x", EditKind::Insert);
        assert_eq!(buffer.text(), "xab");
        assert_eq!(buffer.selection(), 1..1);

        engine.undo(&mut buffer);
        assert_eq!(buffer.text(), "ab");
        assert_eq!(buffer.selection(), 0..0);

        engine.redo(&mut buffer);
        assert_eq!(buffer.text(), "xab");
        assert_eq!(buffer.selection(), 0..1);
    }

    #[test]
    fn test_insert_replaces_selection() {
        let mut buffer = TextBuffer::new("hello world");
        let mut engine = UndoEngine::new();

        buffer.set_selection(6..11);
        engine.record_insert(&mut buffer, "rust", EditKind::Insert);
        assert_eq!(buffer.text(), "hello rust");

        engine.undo(&mut buffer);
        assert_eq!(buffer.text(), "hello world");
        assert_eq!(buffer.selection(), 6..11);
    }

    #[test]
    fn test_delete_extends_backward() {
        let mut buffer = TextBuffer::new("abc");
        let mut engine = UndoEngine::new();

        buffer.set_selection(2..2);
        engine.record_delete(&mut buffer);
        assert_eq!(buffer.text(), "ac");
        assert_eq!(buffer.selection(), 1..1);

        engine.undo(&mut buffer);
        assert_eq!(buffer.text(), "abc");
        assert_eq!(buffer.selection(), 1..2);
    }

    #[test]
    fn test_delete_at_document_start_is_noop() {
        let mut buffer = TextBuffer::new("abc");
        let mut engine = UndoEngine::new();

        buffer.set_selection(0..0);
        assert!(engine.record_delete(&mut buffer).is_none());
        assert_eq!(buffer.text(), "abc");
        assert!(!engine.can_undo());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut buffer = TextBuffer::empty();
        let mut engine = UndoEngine::new();

        engine.record_insert(&mut buffer, "a", EditKind::Insert);
        engine.undo(&mut buffer);
        assert!(engine.can_redo());

        engine.record_insert(&mut buffer, "b", EditKind::Insert);
        assert!(!engine.can_redo());
        assert_eq!(buffer.text(), "b");
    }

    #[test]
    fn test_pending_capture_computes_length_delta() {
        let mut buffer = TextBuffer::new("hello world");
        let mut engine = UndoEngine::new();

        // Platform paste replaces "world" with "pasted-content" outside our
        // control; the engine only sees the before/after surfaces.
        buffer.set_selection(6..11);
        engine.begin_pending_capture(&buffer, EditKind::Paste);
        buffer.replace_range(6..11, "pasted-content");

        let new_range = engine.complete_pending_capture(&buffer).unwrap();
        assert_eq!(new_range, 6..20);

        engine.undo(&mut buffer);
        assert_eq!(buffer.text(), "hello world");
        assert_eq!(buffer.selection(), 6..11);

        engine.redo(&mut buffer);
        assert_eq!(buffer.text(), "hello pasted-content");
    }

    #[test]
    fn test_bulk_replace_single_entry() {
        let mut buffer = TextBuffer::new("aaa");
        let mut engine = UndoEngine::new();

        engine.record_bulk_replace(&mut buffer, "bbbbbb");
        assert_eq!(buffer.text(), "bbbbbb");
        assert_eq!(engine.undo_depth(), 1);

        engine.undo(&mut buffer);
        assert_eq!(buffer.text(), "aaa");
    }

    #[test]
    fn test_inverse_law_over_edit_sequence() {
        let mut buffer = TextBuffer::new("base");
        let mut engine = UndoEngine::new();

        buffer.set_selection(4..4);
        engine.record_insert(&mut buffer, " one", EditKind::Insert);
        engine.record_insert(&mut buffer, " two", EditKind::Insert);
        buffer.set_selection(0..4);
        engine.record_insert(&mut buffer, "BASE", EditKind::Insert);
        let final_text = buffer.text();

        for _ in 0..3 {
            engine.undo(&mut buffer);
        }
        assert_eq!(buffer.text(), "base");

        for _ in 0..3 {
            engine.redo(&mut buffer);
        }
        assert_eq!(buffer.text(), final_text);
    }
}
