//! Search and replace over a source snapshot.
//!
//! Every search mode is lowered to a compiled [`Regex`]: the literal modes
//! escape the term and wrap it in word-boundary assertions (both sides for
//! whole-word, one side for prefix/suffix), the regex mode passes the term
//! through. Match ranges are character offsets, converted
//! from the engine's byte offsets via [`OffsetMap`].
//!
//! [`SearchState`] carries the match list between the search pass and the
//! navigation/replace operations, keyed by the search term so results from a
//! superseded search are discarded instead of committed.

use std::ops::Range;

use regex::{NoExpand, Regex, RegexBuilder};
use tracing::debug;

use crate::text::OffsetMap;

/// How the search term matches against the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Term appears anywhere (literal).
    #[default]
    Contains,
    /// Term matches a whole word (literal, word-boundary delimited).
    MatchesWord,
    /// Term is a word prefix (literal, word boundary on the left only).
    StartsWith,
    /// Term is a word suffix (literal, word boundary on the right only).
    EndsWith,
    /// Term is a regular expression.
    Regex,
}

/// Search configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOptions {
    /// Exact-case matching; off by default.
    pub case_sensitive: bool,
    /// How the term matches.
    pub mode: MatchMode,
}

/// Compile a search term into a regex according to the options.
///
/// Literal modes never fail; the regex mode surfaces the engine's error.
pub fn compile_pattern(term: &str, options: SearchOptions) -> Result<Regex, regex::Error> {
    let pattern = match options.mode {
        MatchMode::Contains => regex::escape(term),
        MatchMode::MatchesWord => format!(r"\b{}\b", regex::escape(term)),
        MatchMode::StartsWith => format!(r"\b{}", regex::escape(term)),
        MatchMode::EndsWith => format!(r"{}\b", regex::escape(term)),
        MatchMode::Regex => term.to_string(),
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .build()
}

/// Find all matches of `term` in `text` as ascending, non-overlapping
/// character ranges. Empty matches are skipped. An empty term or a pattern
/// that fails to compile yields no matches.
pub fn find_matches(text: &str, term: &str, options: SearchOptions) -> Vec<Range<usize>> {
    if term.is_empty() {
        return Vec::new();
    }
    let regex = match compile_pattern(term, options) {
        Ok(regex) => regex,
        Err(err) => {
            debug!(term, %err, "search pattern failed to compile");
            return Vec::new();
        }
    };
    let index = OffsetMap::build(text);
    regex
        .find_iter(text)
        .filter(|m| !m.range().is_empty())
        .map(|m| index.char_at(m.start())..index.char_at(m.end()))
        .collect()
}

/// Replace every match of `term` in `text`, returning the new text and the
/// number of replacements. Returns `None` when the term is empty, the
/// pattern fails to compile, or nothing matched.
///
/// In [`MatchMode::Regex`] the replacement may reference capture groups
/// (`$1`); in the literal modes it is taken verbatim.
pub fn replace_all_text(
    text: &str,
    term: &str,
    replacement: &str,
    options: SearchOptions,
) -> Option<(String, usize)> {
    if term.is_empty() {
        return None;
    }
    let regex = match compile_pattern(term, options) {
        Ok(regex) => regex,
        Err(err) => {
            debug!(term, %err, "replace pattern failed to compile");
            return None;
        }
    };
    let count = regex.find_iter(text).filter(|m| !m.range().is_empty()).count();
    if count == 0 {
        return None;
    }
    let replaced = match options.mode {
        MatchMode::Regex => regex.replace_all(text, replacement).into_owned(),
        _ => regex.replace_all(text, NoExpand(replacement)).into_owned(),
    };
    Some((replaced, count))
}

/// Match list for the current search term, with an active-match cursor.
#[derive(Debug, Default)]
pub struct SearchState {
    key: String,
    options: SearchOptions,
    matches: Vec<Range<usize>>,
    active_index: Option<usize>,
}

impl SearchState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The term the current results belong to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Options the current results were computed with.
    pub fn options(&self) -> SearchOptions {
        self.options
    }

    /// All match ranges, ascending.
    pub fn matches(&self) -> &[Range<usize>] {
        &self.matches
    }

    /// Range of the active match, if any.
    pub fn active(&self) -> Option<Range<usize>> {
        self.active_index.map(|i| self.matches[i].clone())
    }

    /// Index of the active match, if any.
    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    /// Begin a new search: remember the key and drop stale results.
    pub fn begin(&mut self, key: &str, options: SearchOptions) {
        self.key = key.to_string();
        self.options = options;
        self.matches.clear();
        self.active_index = None;
    }

    /// Commit results computed for `key`. Results for a superseded key are
    /// discarded; returns whether the commit was applied.
    pub fn commit(&mut self, key: &str, matches: Vec<Range<usize>>) -> bool {
        if key != self.key {
            debug!(
                stale = key,
                current = %self.key,
                "discarding search results for superseded term"
            );
            return false;
        }
        self.matches = matches;
        self.active_index = if self.matches.is_empty() { None } else { Some(0) };
        true
    }

    /// Clear the term and all results.
    pub fn clear(&mut self) {
        self.key.clear();
        self.matches.clear();
        self.active_index = None;
    }

    /// Advance the active match, wrapping at the end.
    pub fn next_match(&mut self) -> Option<Range<usize>> {
        if self.matches.is_empty() {
            return None;
        }
        let next = match self.active_index {
            Some(i) => (i + 1) % self.matches.len(),
            None => 0,
        };
        self.active_index = Some(next);
        Some(self.matches[next].clone())
    }

    /// Step the active match backward, wrapping at the start.
    pub fn prev_match(&mut self) -> Option<Range<usize>> {
        if self.matches.is_empty() {
            return None;
        }
        let prev = match self.active_index {
            Some(0) | None => self.matches.len() - 1,
            Some(i) => i - 1,
        };
        self.active_index = Some(prev);
        Some(self.matches[prev].clone())
    }

    /// Make the match at `index` active.
    pub fn set_active(&mut self, index: usize) -> Option<Range<usize>> {
        if index >= self.matches.len() {
            return None;
        }
        self.active_index = Some(index);
        Some(self.matches[index].clone())
    }

    /// Account for a single-match replacement without re-searching.
    ///
    /// Removes the match at `index` and shifts every later match by the
    /// replacement's length delta. The active cursor moves to the next
    /// surviving match after the replacement point.
    pub fn apply_replacement(&mut self, index: usize, new_len: usize) {
        if index >= self.matches.len() {
            return;
        }
        let replaced = self.matches.remove(index);
        let old_len = replaced.end - replaced.start;

        for range in self.matches.iter_mut().skip(index) {
            if new_len >= old_len {
                let delta = new_len - old_len;
                range.start += delta;
                range.end += delta;
            } else {
                let delta = old_len - new_len;
                range.start -= delta;
                range.end -= delta;
            }
        }

        self.active_index = if self.matches.is_empty() {
            None
        } else {
            Some(index % self.matches.len())
        };
    }
}
