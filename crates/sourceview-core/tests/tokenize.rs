//! End-to-end tokenization over a realistic language definition.

use sourceview_core::{
    KeywordGenerator, Lexer, PatternGenerator, RegexFlags, Token, TokenGenerator, TokenKind,
};

/// A small C-family lexer: keywords, numbers, strings, line and block
/// comments, function names and editor placeholders.
fn demo_lexer() -> Lexer {
    let pattern = |p: &str, kind| {
        TokenGenerator::Pattern(
            PatternGenerator::new(p, RegexFlags::default(), kind).expect("pattern compiles"),
        )
    };
    let dotall = RegexFlags {
        dot_matches_newline: true,
        ..RegexFlags::default()
    };

    Lexer::new(vec![
        TokenGenerator::Keywords(KeywordGenerator::new(
            ["fn", "let", "if", "else", "return", "while"],
            TokenKind::Keyword,
        )),
        pattern(r"\b\d+(\.\d+)?\b", TokenKind::Number),
        pattern(r#""[^"\n]*""#, TokenKind::String),
        TokenGenerator::Pattern(
            PatternGenerator::with_capture_group(
                r"fn\s+([A-Za-z_][A-Za-z0-9_]*)",
                RegexFlags::default(),
                1,
                TokenKind::Function,
            )
            .expect("pattern compiles"),
        ),
        pattern(r"//[^\n]*", TokenKind::Comment),
        TokenGenerator::Pattern(
            PatternGenerator::new(r"/\*.*?\*/", dotall, TokenKind::Comment)
                .expect("pattern compiles"),
        ),
        pattern(r"<#[^#]+#>", TokenKind::EditorPlaceholder),
    ])
}

fn kinds(tokens: &[Token], kind: TokenKind) -> Vec<std::ops::Range<usize>> {
    let mut ranges: Vec<_> = tokens
        .iter()
        .filter(|t| t.kind == kind)
        .map(|t| t.range.clone())
        .collect();
    ranges.sort_by_key(|r| r.start);
    ranges
}

#[test]
fn test_full_program_tokenizes() {
    let source = "fn add(a, b) {\n    let total = a + 40.5;\n    return total;\n}";
    let tokens = demo_lexer().tokenize(source);

    assert_eq!(kinds(&tokens, TokenKind::Keyword), vec![0..2, 19..22, 45..51]);
    assert_eq!(kinds(&tokens, TokenKind::Function), vec![3..6]);
    assert_eq!(kinds(&tokens, TokenKind::Number), vec![35..39]);
}

#[test]
fn test_line_comment_swallows_code() {
    let source = "let x = 1; // let y = \"s\" 99\nlet z = 2;";
    let tokens = demo_lexer().tokenize(source);

    // Everything after `//` belongs to the comment, nothing else survives
    // inside it.
    assert_eq!(kinds(&tokens, TokenKind::Comment), vec![11..28]);
    assert_eq!(kinds(&tokens, TokenKind::Keyword), vec![0..3, 29..32]);
    assert_eq!(kinds(&tokens, TokenKind::Number), vec![8..9, 37..38]);
    assert!(kinds(&tokens, TokenKind::String).is_empty());
}

#[test]
fn test_block_comment_spans_lines() {
    let source = "let a = 1;\n/* if 2\n   while 3 */\nlet b = 4;";
    let tokens = demo_lexer().tokenize(source);

    assert_eq!(kinds(&tokens, TokenKind::Comment), vec![11..32]);
    // Keywords and numbers inside the block comment are suppressed.
    assert_eq!(kinds(&tokens, TokenKind::Keyword), vec![0..3, 33..36]);
    assert_eq!(kinds(&tokens, TokenKind::Number), vec![8..9, 41..42]);
}

#[test]
fn test_line_comment_inside_block_comment() {
    // The line-comment rule also fires inside the block comment and its
    // range ends before the block does; code after it is still commented.
    let source = "/* a\n// b\nlet x */";
    let tokens = demo_lexer().tokenize(source);

    assert_eq!(kinds(&tokens, TokenKind::Comment), vec![0..18, 5..9]);
    assert!(kinds(&tokens, TokenKind::Keyword).is_empty());
}

#[test]
fn test_token_straddling_comment_boundary_is_dropped() {
    // The string opens before the line comment starts and its match crosses
    // into the comment range.
    let source = "\"abc // def\" x";
    let tokens = demo_lexer().tokenize(source);

    // `//` inside the quotes still matches the comment rule and wins.
    assert!(!kinds(&tokens, TokenKind::Comment).is_empty());
    assert!(kinds(&tokens, TokenKind::String).is_empty());
}

#[test]
fn test_placeholder_recognized() {
    let source = "let <#name#> = <#value#>;";
    let tokens = demo_lexer().tokenize(source);

    assert_eq!(
        kinds(&tokens, TokenKind::EditorPlaceholder),
        vec![4..12, 15..24]
    );
}

#[test]
fn test_tokenize_is_pure() {
    let source = "fn main() { let x = 1; // done\n}";
    let lexer = demo_lexer();

    let mut runs: Vec<Vec<Token>> = (0..3).map(|_| lexer.tokenize(source)).collect();
    for run in &mut runs {
        run.sort_by_key(|t| (t.range.start, t.range.end, t.kind));
    }
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[1], runs[2]);
}

#[test]
fn test_multibyte_source() {
    let source = "let 名前 = \"値\"; // コメント 1";
    let tokens = demo_lexer().tokenize(source);

    assert_eq!(kinds(&tokens, TokenKind::Keyword), vec![0..3]);
    assert_eq!(kinds(&tokens, TokenKind::String), vec![9..12]);
    // The trailing digit sits inside the comment.
    assert_eq!(kinds(&tokens, TokenKind::Comment), vec![14..23]);
    assert!(kinds(&tokens, TokenKind::Number).is_empty());
}
