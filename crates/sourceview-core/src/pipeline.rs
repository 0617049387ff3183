//! Debounced asynchronous coloring pipeline.
//!
//! Text edits arm a [`Debouncer`]; when it fires, a background worker
//! tokenizes a snapshot of the source tagged with a generation number,
//! lowers the tokens into theme-colored spans, and sends the result over a
//! channel. The interaction thread drains the channel from
//! [`ColoringPipeline::pump`], discards results from superseded generations,
//! and commits the newest result in a single assignment. There is no shared
//! mutable state between the worker and the interaction thread; a worker
//! whose generation has been superseded finishes and its result is simply
//! dropped.
//!
//! Only the selection- and search-dependent parts of the [`PaintBatch`]
//! (placeholder activity, match highlights) are computed at commit time, so
//! selection-only changes refresh them from the cached lowering without
//! retokenizing or restyling.

use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Instant;

use tracing::debug;

use crate::debounce::Debouncer;
use crate::lexer::Lexer;
use crate::search::SearchState;
use crate::theme::{Color, FontSpec, Theme};
use crate::token::{Token, TokenKind};

/// Length of each placeholder delimiter (`<#` and `#>`).
const PLACEHOLDER_DELIMITER: usize = 2;

/// One styled run for the renderer. Spans may overlap; later spans composite
/// over earlier ones (token colors first, then search overlays).
#[derive(Debug, Clone, PartialEq)]
pub struct StyledSpan {
    /// Half-open character range.
    pub range: Range<usize>,
    /// Foreground override, or `None` to keep the underlying color.
    pub foreground: Option<Color>,
    /// Background override, or `None` for the document background.
    pub background: Option<Color>,
    /// Render at zero advance (placeholder delimiters).
    pub hidden: bool,
}

/// An editor placeholder occurrence with its selection-derived state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderSpan {
    /// Full placeholder range, delimiters included.
    pub range: Range<usize>,
    /// Whether the selection currently sits inside this placeholder.
    pub active: bool,
}

/// Everything the host needs to draw one frame of styled text.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintBatch {
    /// Document font.
    pub font: FontSpec,
    /// Document background color.
    pub background: Color,
    /// Color for text not covered by any span.
    pub foreground: Color,
    /// Styled runs, in compositing order.
    pub spans: Vec<StyledSpan>,
    /// Placeholder occurrences with activity state.
    pub placeholders: Vec<PlaceholderSpan>,
}

impl PaintBatch {
    fn empty(theme: &Theme) -> Self {
        Self {
            font: theme.font.clone(),
            background: theme.background_color,
            foreground: theme.foreground_color,
            spans: Vec::new(),
            placeholders: Vec::new(),
        }
    }
}

/// Selection-independent styling derived from one token set and one theme.
#[derive(Debug, Clone, Default)]
struct Lowered {
    spans: Vec<StyledSpan>,
    placeholder_ranges: Vec<Range<usize>>,
}

/// The committed result of one tokenization pass.
#[derive(Debug)]
struct CachedTokenSet {
    generation: u64,
    tokens: Vec<Token>,
    lowered: Lowered,
}

struct TokenizeResult {
    generation: u64,
    tokens: Vec<Token>,
    lowered: Lowered,
}

/// Owns the debounce timer, the worker hand-off and the committed tokens.
pub struct ColoringPipeline {
    generation: u64,
    debouncer: Debouncer,
    theme: Theme,
    sender: Sender<TokenizeResult>,
    receiver: Receiver<TokenizeResult>,
    cached: Option<CachedTokenSet>,
    batch: PaintBatch,
}

impl ColoringPipeline {
    /// Create a pipeline with the given debouncer and theme.
    pub fn new(debouncer: Debouncer, theme: Theme) -> Self {
        let (sender, receiver) = mpsc::channel();
        let batch = PaintBatch::empty(&theme);
        Self {
            generation: 0,
            debouncer,
            theme,
            sender,
            receiver,
            cached: None,
            batch,
        }
    }

    /// The active theme.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Replace the theme. Restyles cached tokens without retokenizing.
    pub fn set_theme(&mut self, theme: Theme, selection: Range<usize>, search: &SearchState) {
        self.theme = theme;
        if let Some(cached) = self.cached.as_mut() {
            cached.lowered = lower_tokens(&cached.tokens, &self.theme);
        }
        self.rebuild_batch(selection, search);
    }

    /// The committed token set, empty before the first pass completes.
    pub fn tokens(&self) -> &[Token] {
        self.cached.as_ref().map(|c| c.tokens.as_slice()).unwrap_or(&[])
    }

    /// The committed attribute batch for the host renderer.
    pub fn paint(&self) -> &PaintBatch {
        &self.batch
    }

    /// Whether a recolor is armed or a worker may still be in flight.
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
            || self.generation != self.cached.as_ref().map(|c| c.generation).unwrap_or(0)
    }

    /// Note a text edit: arm (or re-arm) the debounce timer.
    pub fn note_edit(&mut self, now: Instant) {
        self.debouncer.trigger(now);
    }

    /// Interaction-thread tick: fire the debouncer and commit worker results.
    ///
    /// Returns `true` when a new token set was committed.
    pub fn pump(
        &mut self,
        now: Instant,
        source: &str,
        lexer: &Lexer,
        selection: Range<usize>,
        search: &SearchState,
    ) -> bool {
        if self.debouncer.fire_ready(now) {
            self.spawn_worker(source, lexer);
        }

        let mut newest: Option<TokenizeResult> = None;
        while let Ok(result) = self.receiver.try_recv() {
            if result.generation != self.generation {
                debug!(
                    generation = result.generation,
                    current = self.generation,
                    "discarding stale tokenization result"
                );
                continue;
            }
            newest = Some(result);
        }

        match newest {
            Some(result) => {
                self.commit(result, selection, search);
                true
            }
            None => false,
        }
    }

    /// Tokenize and lower synchronously and commit, bypassing debounce and
    /// the worker.
    ///
    /// Supersedes any in-flight worker. Used after undo, redo and replace,
    /// where the result must be visible before the call returns.
    pub fn recolor_now(
        &mut self,
        source: &str,
        lexer: &Lexer,
        selection: Range<usize>,
        search: &SearchState,
    ) {
        self.debouncer.cancel();
        self.generation += 1;
        let tokens = lexer.tokenize(source);
        let lowered = lower_tokens(&tokens, &self.theme);
        let result = TokenizeResult {
            generation: self.generation,
            tokens,
            lowered,
        };
        self.commit(result, selection, search);
    }

    /// Rebuild placeholder activity and search highlights from the cached
    /// lowering.
    ///
    /// The cheap path for selection-only changes: no tokenization, no
    /// restyling.
    pub fn update_selection(&mut self, selection: Range<usize>, search: &SearchState) {
        self.rebuild_batch(selection, search);
    }

    /// Drop cached tokens and the batch (e.g. when the lexer changes).
    pub fn invalidate(&mut self) {
        self.debouncer.cancel();
        self.generation += 1;
        self.cached = None;
        self.batch = PaintBatch::empty(&self.theme);
    }

    fn spawn_worker(&mut self, source: &str, lexer: &Lexer) {
        self.generation += 1;
        let generation = self.generation;
        let source = source.to_string();
        let lexer = lexer.clone();
        let theme = self.theme.clone();
        let sender = self.sender.clone();

        thread::spawn(move || {
            let tokens = lexer.tokenize(&source);
            let lowered = lower_tokens(&tokens, &theme);
            // The receiver outlives workers; a send failure means the
            // pipeline was dropped and the result is moot.
            let _ = sender.send(TokenizeResult {
                generation,
                tokens,
                lowered,
            });
        });
    }

    fn commit(&mut self, result: TokenizeResult, selection: Range<usize>, search: &SearchState) {
        self.cached = Some(CachedTokenSet {
            generation: result.generation,
            tokens: result.tokens,
            lowered: result.lowered,
        });
        self.rebuild_batch(selection, search);
    }

    fn rebuild_batch(&mut self, selection: Range<usize>, search: &SearchState) {
        let mut batch = PaintBatch::empty(&self.theme);

        if let Some(cached) = &self.cached {
            batch.spans.extend(cached.lowered.spans.iter().cloned());
            for range in &cached.lowered.placeholder_ranges {
                // Active while the selection sits strictly inside the
                // placeholder.
                let active = selection.start > range.start && selection.end < range.end;
                batch.placeholders.push(PlaceholderSpan {
                    range: range.clone(),
                    active,
                });
            }
        }

        let active = search.active_index();
        for (i, range) in search.matches().iter().enumerate() {
            let background = if Some(i) == active {
                self.theme.active_match_background
            } else {
                self.theme.match_background
            };
            batch.spans.push(StyledSpan {
                range: range.clone(),
                foreground: None,
                background: Some(background),
                hidden: false,
            });
        }

        self.batch = batch;
    }
}

/// Lower a token set into theme-colored spans and placeholder ranges.
///
/// Runs on the worker thread for background passes and inline for
/// [`ColoringPipeline::recolor_now`]. Placeholder tokens emit hidden spans
/// for the outer delimiters and a styled interior; tokens shorter than both
/// delimiters are styled whole, nothing hidden.
fn lower_tokens(tokens: &[Token], theme: &Theme) -> Lowered {
    let mut lowered = Lowered::default();

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        if token.is_editor_placeholder() {
            lower_placeholder(&mut lowered, token, theme);
        } else if !token.is_plain() {
            lowered.spans.push(StyledSpan {
                range: token.range.clone(),
                foreground: Some(theme.color(token.kind)),
                background: None,
                hidden: false,
            });
        }
    }

    lowered
}

fn lower_placeholder(lowered: &mut Lowered, token: &Token, theme: &Theme) {
    let color = theme.color(TokenKind::EditorPlaceholder);
    let range = token.range.clone();

    if token.len() >= 2 * PLACEHOLDER_DELIMITER {
        let interior = range.start + PLACEHOLDER_DELIMITER..range.end - PLACEHOLDER_DELIMITER;
        lowered.spans.push(StyledSpan {
            range: range.start..interior.start,
            foreground: None,
            background: None,
            hidden: true,
        });
        lowered.spans.push(StyledSpan {
            range: interior.clone(),
            foreground: Some(color),
            background: None,
            hidden: false,
        });
        lowered.spans.push(StyledSpan {
            range: interior.end..range.end,
            foreground: None,
            background: None,
            hidden: true,
        });
    } else {
        lowered.spans.push(StyledSpan {
            range: range.clone(),
            foreground: Some(color),
            background: None,
            hidden: false,
        });
    }

    lowered.placeholder_ranges.push(range);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{KeywordGenerator, PatternGenerator, RegexFlags, TokenGenerator};
    use crate::search::SearchOptions;

    fn keyword_lexer() -> Lexer {
        Lexer::new(vec![TokenGenerator::Keywords(KeywordGenerator::new(
            ["let"],
            TokenKind::Keyword,
        ))])
    }

    fn pipeline() -> ColoringPipeline {
        ColoringPipeline::new(Debouncer::default(), Theme::default())
    }

    fn result_for(generation: u64, tokens: Vec<Token>) -> TokenizeResult {
        let lowered = lower_tokens(&tokens, &Theme::default());
        TokenizeResult {
            generation,
            tokens,
            lowered,
        }
    }

    #[test]
    fn test_recolor_now_commits_synchronously() {
        let mut pipeline = pipeline();
        let search = SearchState::new();

        pipeline.recolor_now("let x", &keyword_lexer(), 0..0, &search);
        assert_eq!(pipeline.tokens(), &[Token::new(TokenKind::Keyword, 0..3)]);

        let span = &pipeline.paint().spans[0];
        assert_eq!(span.range, 0..3);
        assert_eq!(span.foreground, Some(Theme::default().color(TokenKind::Keyword)));
    }

    #[test]
    fn test_lower_tokens_styles_and_placeholder_ranges() {
        let tokens = vec![
            Token::new(TokenKind::Keyword, 0..3),
            Token::new(TokenKind::Plain, 3..4),
            Token::new(TokenKind::EditorPlaceholder, 4..13),
        ];
        let theme = Theme::default();
        let lowered = lower_tokens(&tokens, &theme);

        // Plain tokens carry no span; the placeholder contributes three.
        assert_eq!(lowered.spans.len(), 4);
        assert_eq!(lowered.spans[0].foreground, Some(theme.color(TokenKind::Keyword)));
        assert!(lowered.spans[1].hidden);
        assert_eq!(lowered.spans[2].range, 6..11);
        assert!(lowered.spans[3].hidden);
        assert_eq!(lowered.placeholder_ranges, vec![4..13]);
    }

    #[test]
    fn test_stale_generation_discarded() {
        let mut pipeline = pipeline();
        let search = SearchState::new();

        pipeline.recolor_now("let x", &keyword_lexer(), 0..0, &search);
        let committed = pipeline.generation;

        // A worker from a superseded generation reports late.
        pipeline
            .sender
            .clone()
            .send(result_for(
                committed - 1,
                vec![Token::new(TokenKind::Number, 0..1)],
            ))
            .unwrap();

        let committed_new =
            pipeline.pump(Instant::now(), "let x", &keyword_lexer(), 0..0, &search);
        assert!(!committed_new);
        assert_eq!(pipeline.tokens(), &[Token::new(TokenKind::Keyword, 0..3)]);
    }

    #[test]
    fn test_newest_result_wins() {
        let mut pipeline = pipeline();
        let search = SearchState::new();
        pipeline.generation = 5;

        for generation in [3, 5] {
            pipeline
                .sender
                .clone()
                .send(result_for(
                    generation,
                    vec![Token::new(TokenKind::Number, 0..generation as usize)],
                ))
                .unwrap();
        }

        assert!(pipeline.pump(Instant::now(), "", &Lexer::empty(), 0..0, &search));
        assert_eq!(pipeline.tokens(), &[Token::new(TokenKind::Number, 0..5)]);
    }

    #[test]
    fn test_pump_spawns_worker_after_debounce() {
        let mut pipeline =
            ColoringPipeline::new(Debouncer::new(std::time::Duration::ZERO), Theme::default());
        let search = SearchState::new();
        let lexer = keyword_lexer();

        pipeline.note_edit(Instant::now());
        pipeline.pump(Instant::now(), "let x", &lexer, 0..0, &search);

        // The worker runs on a real thread; poll until its result lands.
        let deadline = Instant::now() + std::time::Duration::from_secs(5);
        while pipeline.tokens().is_empty() && Instant::now() < deadline {
            pipeline.pump(Instant::now(), "let x", &lexer, 0..0, &search);
            thread::yield_now();
        }
        assert_eq!(pipeline.tokens(), &[Token::new(TokenKind::Keyword, 0..3)]);
        // The worker delivered colored spans along with the tokens.
        assert_eq!(
            pipeline.paint().spans[0].foreground,
            Some(Theme::default().color(TokenKind::Keyword))
        );
    }

    #[test]
    fn test_placeholder_delimiters_hidden_and_activity() {
        let lexer = Lexer::new(vec![TokenGenerator::Pattern(
            PatternGenerator::new(
                r"<#[^#]+#>",
                RegexFlags::default(),
                TokenKind::EditorPlaceholder,
            )
            .unwrap(),
        )]);
        let mut pipeline = pipeline();
        let search = SearchState::new();

        // Placeholder at 4..13.
        pipeline.recolor_now("let <#name#> = 1", &lexer, 0..0, &search);

        let hidden: Vec<Range<usize>> = pipeline
            .paint()
            .spans
            .iter()
            .filter(|s| s.hidden)
            .map(|s| s.range.clone())
            .collect();
        assert_eq!(hidden, vec![4..6, 11..13]);

        let placeholder = &pipeline.paint().placeholders[0];
        assert_eq!(placeholder.range, 4..13);
        assert!(!placeholder.active);

        // Caret inside the interior activates it without retokenizing.
        pipeline.update_selection(7..7, &search);
        assert!(pipeline.paint().placeholders[0].active);

        // Caret at the outer boundary does not.
        pipeline.update_selection(4..4, &search);
        assert!(!pipeline.paint().placeholders[0].active);
    }

    #[test]
    fn test_search_overlay_highlights_active_match() {
        let mut pipeline = pipeline();
        let mut search = SearchState::new();
        search.begin("x", SearchOptions::default());
        search.commit("x", vec![0..1, 2..3]);
        search.set_active(1);

        pipeline.recolor_now("x x", &Lexer::empty(), 0..0, &search);

        let theme = Theme::default();
        let backgrounds: Vec<Option<Color>> = pipeline
            .paint()
            .spans
            .iter()
            .map(|s| s.background)
            .collect();
        assert_eq!(
            backgrounds,
            vec![
                Some(theme.match_background),
                Some(theme.active_match_background),
            ]
        );
    }

    #[test]
    fn test_set_theme_restyles_cached_tokens() {
        let mut pipeline = pipeline();
        let search = SearchState::new();
        pipeline.recolor_now("let x", &keyword_lexer(), 0..0, &search);

        let mut theme = Theme::default();
        theme.set_color(TokenKind::Keyword, Color::rgb(1, 2, 3));
        pipeline.set_theme(theme, 0..0, &search);

        assert_eq!(
            pipeline.paint().spans[0].foreground,
            Some(Color::rgb(1, 2, 3))
        );
        // Tokens themselves are untouched.
        assert_eq!(pipeline.tokens(), &[Token::new(TokenKind::Keyword, 0..3)]);
    }

    #[test]
    fn test_invalidate_clears_tokens() {
        let mut pipeline = pipeline();
        let search = SearchState::new();

        pipeline.recolor_now("let x", &keyword_lexer(), 0..0, &search);
        assert!(!pipeline.tokens().is_empty());

        pipeline.invalidate();
        assert!(pipeline.tokens().is_empty());
        assert!(pipeline.paint().spans.is_empty());
    }
}
