//! Token model.
//!
//! A token is an immutable classification of a sub-range of the source text.
//! Ranges are half-open **character offsets** (`start..end`, Unicode scalar
//! values), the same convention the rest of the crate uses for text
//! addressing. Tokens are snapshots of one tokenization pass; they are never
//! mutated in place, only replaced wholesale by the next pass.

use std::ops::Range;

/// The classification assigned to a token by a lexer rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    /// Unclassified text rendered with the theme's foreground color.
    Plain,
    /// Numeric literal.
    Number,
    /// String literal.
    String,
    /// Identifier.
    Identifier,
    /// Language keyword.
    Keyword,
    /// Line or block comment. Comment tokens suppress other tokens that fall
    /// inside their range (see [`crate::lexer::Lexer::tokenize`]).
    Comment,
    /// An inline fill-in field (`<#name#>`) with active/inactive selection
    /// state and near-invisible delimiters.
    EditorPlaceholder,
    /// Function name.
    Function,
    /// Type name.
    Type,
}

/// A classified sub-range of the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token classification.
    pub kind: TokenKind,
    /// Half-open character range into the source this token was produced from.
    pub range: Range<usize>,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, range: Range<usize>) -> Self {
        Self { kind, range }
    }

    /// Returns `true` for [`TokenKind::Plain`] tokens, which carry no styling
    /// of their own.
    pub fn is_plain(&self) -> bool {
        self.kind == TokenKind::Plain
    }

    /// Returns `true` for editor placeholder tokens.
    pub fn is_editor_placeholder(&self) -> bool {
        self.kind == TokenKind::EditorPlaceholder
    }

    /// Length of the token range in characters.
    pub fn len(&self) -> usize {
        self.range.end.saturating_sub(self.range.start)
    }

    /// Returns `true` if the token covers no characters.
    pub fn is_empty(&self) -> bool {
        self.range.start >= self.range.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_predicates() {
        let plain = Token::new(TokenKind::Plain, 0..4);
        assert!(plain.is_plain());
        assert!(!plain.is_editor_placeholder());
        assert_eq!(plain.len(), 4);

        let placeholder = Token::new(TokenKind::EditorPlaceholder, 2..9);
        assert!(placeholder.is_editor_placeholder());
        assert!(!placeholder.is_empty());
    }

    #[test]
    fn test_empty_token() {
        let token = Token::new(TokenKind::Keyword, 3..3);
        assert!(token.is_empty());
        assert_eq!(token.len(), 0);
    }
}
