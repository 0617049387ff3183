#![warn(missing_docs)]
//! Sourceview Core - Embeddable Source-Code Editor Component
//!
//! # Overview
//!
//! `sourceview-core` is a headless source-code editor core: a text buffer
//! with syntax coloring, undo/redo, and search/replace, designed to sit
//! behind a host-provided view. The host forwards input to the edit
//! operations, drives [`SourceEditor::pump`] from its interaction loop and
//! renders the [`PaintBatch`] returned by [`SourceEditor::paint`].
//!
//! # Core Features
//!
//! - **Regex/keyword lexing**: ordered token generators, compiled once,
//!   with comment-range suppression of nested matches
//! - **Debounced async coloring**: background tokenization with
//!   generation-counter staleness, committed on the interaction thread
//! - **Explicit undo/redo**: two-stack engine of invertible edit records,
//!   including two-phase capture of externally-applied edits
//! - **Search/replace**: literal, whole-word, anchored and regex modes with
//!   live match highlighting and single-entry bulk replace
//! - **Editor placeholders**: `<#name#>` fill-in fields with hidden
//!   delimiters and selection-driven activity
//!
//! # Quick Start
//!
//! ```rust
//! use sourceview_core::{
//!     KeywordGenerator, Lexer, SourceEditor, TokenGenerator, TokenKind,
//! };
//!
//! let mut editor = SourceEditor::new("let x = 1;");
//! editor.set_lexer(Some(Lexer::new(vec![TokenGenerator::Keywords(
//!     KeywordGenerator::new(["let"], TokenKind::Keyword),
//! )])));
//!
//! assert_eq!(editor.tokens()[0].range, 0..3);
//!
//! editor.set_selected_range(10..10);
//! editor.insert(" // done");
//! assert!(editor.can_undo());
//! ```
//!
//! # Module Description
//!
//! - [`token`] - token model (kind + half-open character range)
//! - [`lexer`] - generator engine and lexer composition
//! - [`buffer`] - the text surface trait and the rope-backed buffer
//! - [`undo`] - the two-stack undo engine
//! - [`pipeline`] - the debounced asynchronous coloring pipeline
//! - [`debounce`] - deadline-based debouncing utility
//! - [`theme`] - themes and color parsing
//! - [`search`] - search and replace
//! - [`editor`] - the top-level [`SourceEditor`] component
//!
//! # Offsets
//!
//! All public offsets are character offsets (Unicode scalar values) and all
//! ranges are half-open. Byte offsets never cross the public API.

pub mod buffer;
pub mod debounce;
pub mod editor;
pub mod lexer;
pub mod pipeline;
pub mod search;
pub mod theme;
mod text;
pub mod token;
pub mod undo;

pub use buffer::{TextBuffer, TextPosition, TextSurface};
pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use editor::{EditorDelegate, SourceEditor};
pub use lexer::{KeywordGenerator, Lexer, PatternGenerator, RegexFlags, TokenGenerator};
pub use pipeline::{ColoringPipeline, PaintBatch, PlaceholderSpan, StyledSpan};
pub use search::{MatchMode, SearchOptions, SearchState};
pub use theme::{Color, ColorParseError, FontSpec, GutterStyle, LineNumberStyle, Theme};
pub use token::{Token, TokenKind};
pub use undo::{EditKind, EditRecord, UndoEngine};
