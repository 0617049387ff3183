//! Generator engine and lexer composition.
//!
//! A lexer owns an ordered list of token generators. Each generator is either
//! a keyword-set matcher or a compiled-pattern matcher with a selectable
//! capture group. Running a lexer produces a flat token list, then removes
//! every non-comment token whose boundary falls inside a comment token's
//! range, so that e.g. a keyword appearing inside a comment is not separately
//! colored as a keyword.
//!
//! Generator order has no effect on the final token set; it only determines
//! internal iteration order.

use std::collections::HashSet;
use std::ops::Range;

use regex::{Regex, RegexBuilder};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::text::OffsetMap;
use crate::token::{Token, TokenKind};

/// Compile options for a [`PatternGenerator`].
///
/// Mirrors the flag set accepted by data-driven rule files. Flags with no
/// `regex`-crate equivalent are accepted and ignored so that rule files
/// written against other engines still load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegexFlags {
    /// Case-insensitive matching.
    pub case_insensitive: bool,
    /// `.` also matches `\n`.
    pub dot_matches_newline: bool,
    /// `^`/`$` match at line boundaries.
    pub multi_line: bool,
    /// Whitespace and `#` comments in the pattern are ignored.
    pub ignore_whitespace: bool,
}

/// Matches whole words against a fixed keyword set.
#[derive(Debug, Clone)]
pub struct KeywordGenerator {
    keywords: HashSet<String>,
    kind: TokenKind,
}

impl KeywordGenerator {
    /// Create a keyword generator producing tokens of `kind`.
    pub fn new<I, S>(keywords: I, kind: TokenKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            kind,
        }
    }

    /// The token kind this generator emits.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    fn run(&self, source: &str, index: &OffsetMap, out: &mut Vec<Token>) {
        for (byte_offset, word) in source.unicode_word_indices() {
            if self.keywords.contains(word) {
                let start = index.char_at(byte_offset);
                let end = index.char_at(byte_offset + word.len());
                out.push(Token::new(self.kind, start..end));
            }
        }
    }
}

/// Matches a compiled pattern, emitting a token over one capture group of
/// each match.
///
/// `capture_group` 0 (the default) tags the whole match. A non-zero group
/// enables "match the whole construct but tag only a sub-span"; matches where
/// that group did not participate are skipped silently.
#[derive(Debug, Clone)]
pub struct PatternGenerator {
    regex: Regex,
    capture_group: usize,
    kind: TokenKind,
}

impl PatternGenerator {
    /// Compile `pattern` into a generator producing tokens of `kind`.
    ///
    /// Returns `None` when the pattern fails to compile; a lexer built from
    /// rule data simply drops such generators instead of failing at run time.
    pub fn new(pattern: &str, flags: RegexFlags, kind: TokenKind) -> Option<Self> {
        Self::with_capture_group(pattern, flags, 0, kind)
    }

    /// Like [`PatternGenerator::new`] but tagging only `capture_group`.
    pub fn with_capture_group(
        pattern: &str,
        flags: RegexFlags,
        capture_group: usize,
        kind: TokenKind,
    ) -> Option<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(flags.case_insensitive)
            .dot_matches_new_line(flags.dot_matches_newline)
            .multi_line(flags.multi_line)
            .ignore_whitespace(flags.ignore_whitespace)
            .build();

        match regex {
            Ok(regex) => Some(Self {
                regex,
                capture_group,
                kind,
            }),
            Err(err) => {
                debug!(pattern, %err, "dropping uncompilable lexer pattern");
                None
            }
        }
    }

    /// The token kind this generator emits.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The capture group whose span is tagged (0 = whole match).
    pub fn capture_group(&self) -> usize {
        self.capture_group
    }

    fn run(&self, source: &str, index: &OffsetMap, out: &mut Vec<Token>) {
        if self.capture_group == 0 {
            for m in self.regex.find_iter(source) {
                let start = index.char_at(m.start());
                let end = index.char_at(m.end());
                out.push(Token::new(self.kind, start..end));
            }
        } else {
            for caps in self.regex.captures_iter(source) {
                let Some(m) = caps.get(self.capture_group) else {
                    continue;
                };
                let start = index.char_at(m.start());
                let end = index.char_at(m.end());
                out.push(Token::new(self.kind, start..end));
            }
        }
    }
}

/// A token-producing rule: keyword set or compiled pattern.
#[derive(Debug, Clone)]
pub enum TokenGenerator {
    /// Whole-word keyword matching.
    Keywords(KeywordGenerator),
    /// Compiled-pattern matching with a selectable capture group.
    Pattern(PatternGenerator),
}

/// A lexer: an ordered list of token generators.
///
/// The empty lexer is a valid variant producing zero tokens (no coloring).
#[derive(Debug, Clone, Default)]
pub struct Lexer {
    generators: Vec<TokenGenerator>,
}

impl Lexer {
    /// Create a lexer from a generator list.
    pub fn new(generators: Vec<TokenGenerator>) -> Self {
        Self { generators }
    }

    /// Create the empty lexer (identity: no tokens).
    pub fn empty() -> Self {
        Self::default()
    }

    /// The generators this lexer runs, in iteration order.
    pub fn generators(&self) -> &[TokenGenerator] {
        &self.generators
    }

    /// Run every generator over `source` and return the comment-filtered
    /// token set.
    ///
    /// For fixed `(lexer, source)` the result is deterministic; compare as a
    /// set since generator iteration order is not meaningful.
    pub fn tokenize(&self, source: &str) -> Vec<Token> {
        let index = OffsetMap::build(source);
        let mut tokens = Vec::new();

        for generator in &self.generators {
            match generator {
                TokenGenerator::Keywords(keywords) => keywords.run(source, &index, &mut tokens),
                TokenGenerator::Pattern(pattern) => pattern.run(source, &index, &mut tokens),
            }
        }

        filter_tokens_in_comments(tokens)
    }
}

/// Remove non-comment tokens whose boundary falls inside a comment range.
///
/// Containment is boundary-inclusive: a token endpoint exactly equal to a
/// comment boundary counts as inside.
fn filter_tokens_in_comments(tokens: Vec<Token>) -> Vec<Token> {
    let mut comment_ranges: Vec<Range<usize>> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Comment)
        .map(|t| t.range.clone())
        .collect();

    if comment_ranges.is_empty() {
        return tokens;
    }

    comment_ranges.sort_unstable_by_key(|r| (r.start, r.end));

    // Comment ranges can overlap (a line comment matched inside a block
    // comment), so the nearest-preceding start is not necessarily the range
    // reaching farthest right. Store a running maximum of `end` per start so
    // one binary search answers "does any range starting at or before this
    // offset still cover it".
    let mut coverage: Vec<(usize, usize)> = Vec::with_capacity(comment_ranges.len());
    let mut max_end = 0;
    for range in &comment_ranges {
        max_end = max_end.max(range.end);
        coverage.push((range.start, max_end));
    }

    tokens
        .into_iter()
        .filter(|token| {
            token.kind == TokenKind::Comment
                || (!endpoint_in_comment(&coverage, token.range.start)
                    && !endpoint_in_comment(&coverage, token.range.end))
        })
        .collect()
}

/// Binary search over `(start, running max end)` pairs sorted by start.
fn endpoint_in_comment(coverage: &[(usize, usize)], offset: usize) -> bool {
    let idx = coverage.partition_point(|(start, _)| *start <= offset);
    idx > 0 && offset <= coverage[idx - 1].1
}
