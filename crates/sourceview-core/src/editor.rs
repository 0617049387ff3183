//! The embeddable editor component.
//!
//! [`SourceEditor`] ties the pieces together: a rope-backed text surface, the
//! undo engine, the debounced coloring pipeline and the search state. It is
//! headless; a host embeds it, forwards input to the edit operations, drives
//! [`SourceEditor::pump`] from its interaction loop and draws
//! [`SourceEditor::paint`].
//!
//! Hosts observe the editor through [`EditorDelegate`]; every method has a
//! default no-op body so implementors override only what they need.

use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Instant;

use crate::buffer::{TextBuffer, TextPosition, TextSurface};
use crate::debounce::Debouncer;
use crate::lexer::Lexer;
use crate::pipeline::{ColoringPipeline, PaintBatch};
use crate::search::{self, SearchOptions, SearchState};
use crate::theme::Theme;
use crate::token::Token;
use crate::undo::{EditKind, UndoEngine};

/// Host-side observer of editor activity.
pub trait EditorDelegate {
    /// The document text changed (typing, paste, undo, replace, `set_text`).
    fn did_change_text(&mut self, _text: &str) {}

    /// The selection moved. `position` is the 1-based location of the
    /// selection start.
    fn did_change_selection(&mut self, _range: Range<usize>, _position: TextPosition) {}

    /// The user started an editing interaction.
    fn did_begin_editing(&mut self) {}

    /// Supply a lexer for the current source. Consulted when no explicit
    /// lexer is set; return `None` to fall back to the empty lexer.
    fn lexer_for_source(&mut self, _source: &str) -> Option<Lexer> {
        None
    }
}

struct SearchScan {
    key: String,
    matches: Vec<Range<usize>>,
}

/// A source-code text editor core: buffer, undo, coloring, search.
pub struct SourceEditor {
    buffer: TextBuffer,
    undo: UndoEngine,
    pipeline: ColoringPipeline,
    search: SearchState,
    search_enabled: bool,
    search_debouncer: Debouncer,
    pending_search: Option<(String, SearchOptions)>,
    search_sender: Sender<SearchScan>,
    search_receiver: Receiver<SearchScan>,
    lexer: Option<Lexer>,
    delegate: Option<Box<dyn EditorDelegate>>,
}

impl SourceEditor {
    /// Create an editor over initial text with the default theme.
    pub fn new(text: &str) -> Self {
        let (search_sender, search_receiver) = mpsc::channel();
        let mut editor = Self {
            buffer: TextBuffer::new(text),
            undo: UndoEngine::new(),
            pipeline: ColoringPipeline::new(Debouncer::default(), Theme::default()),
            search: SearchState::new(),
            search_enabled: true,
            search_debouncer: Debouncer::default(),
            pending_search: None,
            search_sender,
            search_receiver,
            lexer: None,
            delegate: None,
        };
        editor.recolor_now();
        editor
    }

    /// Install the delegate.
    pub fn set_delegate(&mut self, delegate: Box<dyn EditorDelegate>) {
        self.delegate = Some(delegate);
    }

    // --- text and selection ---

    /// The full document text.
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Replace the document wholesale. Clears undo history and recolors
    /// synchronously.
    pub fn set_text(&mut self, text: &str) {
        self.buffer.set_text(text);
        self.undo.clear();
        self.search.clear();
        self.recolor_now();
        self.notify_text_changed();
        self.notify_selection_changed();
    }

    /// The current selection (possibly empty).
    pub fn selected_range(&self) -> Range<usize> {
        self.buffer.selection()
    }

    /// Move the selection. Placeholder activity and the active search
    /// highlight refresh from cached tokens; no retokenize.
    pub fn set_selected_range(&mut self, range: Range<usize>) {
        self.buffer.set_selection(range);
        self.pipeline
            .update_selection(self.buffer.selection(), &self.search);
        self.notify_selection_changed();
    }

    /// 1-based position of the selection start.
    pub fn selected_position(&self) -> TextPosition {
        self.buffer.position_at(self.buffer.selection().start)
    }

    // --- editing operations ---

    /// Replace the selection with `text` as a single undoable edit.
    pub fn insert(&mut self, text: &str) {
        self.begin_editing();
        if self.undo.record_insert(&mut self.buffer, text, EditKind::Insert).is_some() {
            self.after_edit();
        }
    }

    /// Insert a newline, copying the current line's leading whitespace
    /// (auto-indent). One undoable edit.
    pub fn insert_newline(&mut self) {
        let row = self.selected_position().row.saturating_sub(1);
        let indent: String = self
            .buffer
            .line_text(row)
            .unwrap_or_default()
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        self.insert(&format!("\n{indent}"));
    }

    /// Delete the selection, or the character before the caret. No-op at
    /// document start.
    pub fn delete_backward(&mut self) {
        self.begin_editing();
        if self.undo.record_delete(&mut self.buffer).is_some() {
            self.after_edit();
        }
    }

    /// Remove and return the selected text as a single undoable edit.
    /// Returns `None` when the selection is empty.
    pub fn cut(&mut self) -> Option<String> {
        let selection = self.buffer.selection();
        if selection.is_empty() {
            return None;
        }
        self.begin_editing();
        let removed = self.buffer.text_in_range(selection);
        self.undo.record_insert(&mut self.buffer, "", EditKind::Cut)?;
        self.after_edit();
        Some(removed)
    }

    /// Replace the selection with clipboard text as a single undoable edit.
    pub fn paste(&mut self, text: &str) {
        self.begin_editing();
        if self.undo.record_insert(&mut self.buffer, text, EditKind::Paste).is_some() {
            self.after_edit();
        }
    }

    /// First phase of an externally-applied edit (e.g. a platform paste the
    /// host performs directly on [`SourceEditor::buffer_mut`]). Snapshot the
    /// pre-edit state; finish with
    /// [`SourceEditor::complete_external_capture`].
    pub fn begin_external_capture(&mut self, kind: EditKind) {
        self.undo.begin_pending_capture(&self.buffer, kind);
    }

    /// Second phase of an externally-applied edit: reconstruct and record it,
    /// then run the normal post-edit path.
    pub fn complete_external_capture(&mut self) {
        if self.undo.complete_pending_capture(&self.buffer).is_some() {
            self.after_edit();
        }
    }

    /// Direct access to the text surface for externally-applied edits.
    ///
    /// Mutations made here bypass undo recording; bracket them with
    /// [`SourceEditor::begin_external_capture`] and
    /// [`SourceEditor::complete_external_capture`].
    pub fn buffer_mut(&mut self) -> &mut dyn TextSurface {
        &mut self.buffer
    }

    // --- navigation ---

    /// Collapse the selection to the start of 1-based line `line` (clamped).
    pub fn go_to_line(&mut self, line: usize) {
        let row = line.saturating_sub(1);
        let start = self.buffer.line_range(row).start;
        self.set_selected_range(start..start);
    }

    /// Reveal `range`. With `focus` the range becomes the selection; without
    /// it only the position is reported for the host to scroll to.
    pub fn go_to_range(&mut self, range: Range<usize>, focus: bool) -> TextPosition {
        if focus {
            self.set_selected_range(range.clone());
        }
        self.buffer.position_at(range.start)
    }

    // --- configuration ---

    /// Set (or with `None` clear) the explicit lexer and recolor.
    pub fn set_lexer(&mut self, lexer: Option<Lexer>) {
        self.lexer = lexer;
        self.pipeline.invalidate();
        self.recolor_now();
    }

    /// Replace the theme. Restyles without retokenizing.
    pub fn set_theme(&mut self, theme: Theme) {
        self.pipeline
            .set_theme(theme, self.buffer.selection(), &self.search);
    }

    /// The active theme.
    pub fn theme(&self) -> &Theme {
        self.pipeline.theme()
    }

    // --- search and replace ---

    /// Enable or disable search. Disabling clears results and highlights.
    pub fn set_search_enabled(&mut self, enabled: bool) {
        self.search_enabled = enabled;
        if !enabled {
            self.clear_search();
        }
    }

    /// Begin a (debounced, background) search for `key`. An empty key clears
    /// results synchronously.
    pub fn search(&mut self, key: &str, options: SearchOptions) {
        if !self.search_enabled {
            return;
        }
        if key.is_empty() {
            self.clear_search();
            return;
        }
        self.search.begin(key, options);
        self.pending_search = Some((key.to_string(), options));
        self.search_debouncer.trigger(Instant::now());
    }

    /// All current match ranges, ascending.
    pub fn search_matches(&self) -> &[Range<usize>] {
        self.search.matches()
    }

    /// Range of the active search match.
    pub fn active_search_match(&self) -> Option<Range<usize>> {
        self.search.active()
    }

    /// Make match `index` (clamped) active. With `focus` it also becomes the
    /// selection. Only the highlight overlay is rebuilt.
    pub fn jump_to_search_result(&mut self, index: usize, focus: bool) -> Option<Range<usize>> {
        let count = self.search.matches().len();
        if count == 0 {
            return None;
        }
        let range = self.search.set_active(index.min(count - 1))?;
        if focus {
            self.set_selected_range(range.clone());
        } else {
            self.pipeline
                .update_selection(self.buffer.selection(), &self.search);
        }
        Some(range)
    }

    /// Advance the active match, wrapping. With `focus` it becomes the
    /// selection.
    pub fn next_search_match(&mut self, focus: bool) -> Option<Range<usize>> {
        let range = self.search.next_match()?;
        if focus {
            self.set_selected_range(range.clone());
        } else {
            self.pipeline
                .update_selection(self.buffer.selection(), &self.search);
        }
        Some(range)
    }

    /// Replace match `index` with `text` as one undoable edit. Later match
    /// offsets shift by the length delta; no re-search.
    pub fn replace(&mut self, index: usize, text: &str) -> bool {
        let Some(range) = self.search.matches().get(index).cloned() else {
            return false;
        };
        if self
            .undo
            .record_replace(&mut self.buffer, range, text, EditKind::Replace)
            .is_none()
        {
            return false;
        }
        self.search.apply_replacement(index, text.chars().count());
        self.recolor_now();
        self.notify_text_changed();
        self.notify_selection_changed();
        true
    }

    /// Replace every match of `key` with `text` in one buffer mutation and
    /// one undo entry. Returns the replacement count.
    pub fn replace_all(&mut self, key: &str, text: &str, options: SearchOptions) -> usize {
        let source = self.buffer.text();
        let Some((replaced, count)) = search::replace_all_text(&source, key, text, options) else {
            return 0;
        };
        if self.undo.record_bulk_replace(&mut self.buffer, &replaced).is_none() {
            return 0;
        }
        self.search.clear();
        self.pending_search = None;
        self.search_debouncer.cancel();
        self.recolor_now();
        self.notify_text_changed();
        self.notify_selection_changed();
        count
    }

    // --- undo and redo ---

    /// Whether an undo is available (false while one is being applied).
    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    /// Whether a redo is available (false while one is being applied).
    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// Revert the most recent edit. Recolors synchronously.
    pub fn undo(&mut self) -> bool {
        let Some(_) = self.undo.undo(&mut self.buffer) else {
            return false;
        };
        self.after_history_change();
        true
    }

    /// Re-apply the most recently undone edit. Recolors synchronously.
    pub fn redo(&mut self) -> bool {
        let Some(_) = self.undo.redo(&mut self.buffer) else {
            return false;
        };
        self.after_history_change();
        true
    }

    // --- pipeline ---

    /// Interaction-thread tick: fire debouncers, hand work to background
    /// threads and commit their results. Returns `true` when the paint batch
    /// changed.
    pub fn pump(&mut self, now: Instant) -> bool {
        let mut changed = false;

        if self.search_debouncer.fire_ready(now) {
            if let Some((key, options)) = self.pending_search.take() {
                self.spawn_search(key, options);
            }
        }

        let mut committed_search = false;
        while let Ok(scan) = self.search_receiver.try_recv() {
            committed_search |= self.search.commit(&scan.key, scan.matches);
        }
        if committed_search {
            self.pipeline
                .update_selection(self.buffer.selection(), &self.search);
            changed = true;
        }

        let source = self.buffer.text();
        let lexer = self.resolve_lexer(&source);
        changed |= self
            .pipeline
            .pump(now, &source, &lexer, self.buffer.selection(), &self.search);
        changed
    }

    /// The committed attribute batch for the host renderer.
    pub fn paint(&self) -> &PaintBatch {
        self.pipeline.paint()
    }

    /// The committed token set.
    pub fn tokens(&self) -> &[Token] {
        self.pipeline.tokens()
    }

    // --- internals ---

    fn resolve_lexer(&mut self, source: &str) -> Lexer {
        if let Some(lexer) = &self.lexer {
            return lexer.clone();
        }
        if let Some(delegate) = self.delegate.as_mut() {
            if let Some(lexer) = delegate.lexer_for_source(source) {
                return lexer;
            }
        }
        Lexer::empty()
    }

    fn recolor_now(&mut self) {
        let source = self.buffer.text();
        let lexer = self.resolve_lexer(&source);
        self.pipeline
            .recolor_now(&source, &lexer, self.buffer.selection(), &self.search);
    }

    fn begin_editing(&mut self) {
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.did_begin_editing();
        }
    }

    fn after_edit(&mut self) {
        self.pipeline.note_edit(Instant::now());
        self.refresh_search_after_edit();
        self.notify_text_changed();
        self.notify_selection_changed();
    }

    fn after_history_change(&mut self) {
        self.refresh_search_after_edit();
        self.recolor_now();
        self.notify_text_changed();
        self.notify_selection_changed();
    }

    /// Text changed under live search results; rescan for the same key.
    fn refresh_search_after_edit(&mut self) {
        if self.search.key().is_empty() {
            return;
        }
        let key = self.search.key().to_string();
        let options = self.search.options();
        self.pending_search = Some((key, options));
        self.search_debouncer.trigger(Instant::now());
    }

    fn clear_search(&mut self) {
        self.search.clear();
        self.pending_search = None;
        self.search_debouncer.cancel();
        self.pipeline
            .update_selection(self.buffer.selection(), &self.search);
    }

    fn spawn_search(&mut self, key: String, options: SearchOptions) {
        let source = self.buffer.text();
        let sender = self.search_sender.clone();
        thread::spawn(move || {
            let matches = search::find_matches(&source, &key, options);
            let _ = sender.send(SearchScan { key, matches });
        });
    }

    fn notify_text_changed(&mut self) {
        if self.delegate.is_some() {
            let text = self.buffer.text();
            if let Some(delegate) = self.delegate.as_mut() {
                delegate.did_change_text(&text);
            }
        }
    }

    fn notify_selection_changed(&mut self) {
        let range = self.buffer.selection();
        let position = self.buffer.position_at(range.start);
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.did_change_selection(range, position);
        }
    }
}
