//! Data-driven lexer definitions.
//!
//! A lexer is described as an ordered JSON list of rules:
//!
//! ```json
//! [
//!   { "type": "words", "content": "let fn if else", "tokenType": "keyword" },
//!   { "type": "regex", "content": "\\d+", "tokenType": "number" },
//!   { "type": "regex", "content": "fn\\s+(\\w+)", "matchGroup": 1,
//!     "tokenType": "function", "options": ["caseInsensitive"] }
//! ]
//! ```
//!
//! Loading is total: a malformed document yields the empty lexer, an
//! individually invalid rule (bad regex, unknown token type) is dropped, and
//! both are logged. Config problems never surface as errors at edit time.

use serde::Deserialize;
use tracing::debug;

use sourceview_core::{KeywordGenerator, Lexer, PatternGenerator, RegexFlags, TokenGenerator, TokenKind};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuleSpec {
    #[serde(rename = "type")]
    kind: String,
    content: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    match_group: usize,
    token_type: String,
}

/// Build a lexer from a JSON rule list.
///
/// Never fails: a document that does not parse produces the empty lexer and
/// a debug log entry.
pub fn lexer_from_json(json: &str) -> Lexer {
    let specs: Vec<RuleSpec> = match serde_json::from_str(json) {
        Ok(specs) => specs,
        Err(err) => {
            debug!(%err, "malformed lexer definition, using empty lexer");
            return Lexer::empty();
        }
    };

    let generators = specs.into_iter().filter_map(build_generator).collect();
    Lexer::new(generators)
}

fn build_generator(spec: RuleSpec) -> Option<TokenGenerator> {
    let Some(kind) = token_kind(&spec.token_type) else {
        debug!(token_type = %spec.token_type, "dropping rule with unknown token type");
        return None;
    };

    match spec.kind.as_str() {
        "words" => Some(TokenGenerator::Keywords(KeywordGenerator::new(
            spec.content.split_whitespace(),
            kind,
        ))),
        "regex" => {
            let flags = regex_flags(&spec.options);
            PatternGenerator::with_capture_group(&spec.content, flags, spec.match_group, kind)
                .map(TokenGenerator::Pattern)
        }
        other => {
            debug!(rule_type = other, "dropping rule with unknown type");
            None
        }
    }
}

fn token_kind(name: &str) -> Option<TokenKind> {
    let kind = match name {
        "plain" => TokenKind::Plain,
        "number" => TokenKind::Number,
        "string" => TokenKind::String,
        "identifier" | "id" => TokenKind::Identifier,
        "keyword" => TokenKind::Keyword,
        "comment" => TokenKind::Comment,
        "placeholder" | "editorPlaceholder" => TokenKind::EditorPlaceholder,
        "function" => TokenKind::Function,
        "type" => TokenKind::Type,
        _ => return None,
    };
    Some(kind)
}

/// Map option names onto regex build flags. Names from other engines that
/// have no equivalent here are accepted and ignored.
fn regex_flags(options: &[String]) -> RegexFlags {
    let mut flags = RegexFlags::default();
    for option in options {
        match option.as_str() {
            "caseInsensitive" => flags.case_insensitive = true,
            "dotMatchesLineSeparators" => flags.dot_matches_newline = true,
            "anchorsMatchLines" => flags.multi_line = true,
            "allowCommentsAndWhitespace" => flags.ignore_whitespace = true,
            other => {
                debug!(option = other, "ignoring unsupported regex option");
            }
        }
    }
    flags
}
