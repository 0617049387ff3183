//! Tokenization and search throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sourceview_core::{
    search, KeywordGenerator, Lexer, MatchMode, PatternGenerator, RegexFlags, SearchOptions,
    TokenGenerator, TokenKind,
};

fn demo_lexer() -> Lexer {
    Lexer::new(vec![
        TokenGenerator::Keywords(KeywordGenerator::new(
            ["fn", "let", "if", "else", "return", "while", "for", "match"],
            TokenKind::Keyword,
        )),
        TokenGenerator::Pattern(
            PatternGenerator::new(r"\b\d+(\.\d+)?\b", RegexFlags::default(), TokenKind::Number)
                .unwrap(),
        ),
        TokenGenerator::Pattern(
            PatternGenerator::new(r#""[^"\n]*""#, RegexFlags::default(), TokenKind::String)
                .unwrap(),
        ),
        TokenGenerator::Pattern(
            PatternGenerator::new(r"//[^\n]*", RegexFlags::default(), TokenKind::Comment).unwrap(),
        ),
    ])
}

fn sample_source(lines: usize) -> String {
    let mut source = String::new();
    for i in 0..lines {
        source.push_str(&format!(
            "fn handler_{i}(x) {{ let y = x + {i}; return \"value\"; }} // line {i}\n"
        ));
    }
    source
}

fn bench_tokenize(c: &mut Criterion) {
    let lexer = demo_lexer();
    let source = sample_source(1000);

    c.bench_function("tokenize_1000_lines", |b| {
        b.iter(|| black_box(lexer.tokenize(black_box(&source))))
    });
}

fn bench_search(c: &mut Criterion) {
    let source = sample_source(1000);
    let options = SearchOptions {
        case_sensitive: true,
        mode: MatchMode::Contains,
    };

    c.bench_function("search_1000_lines", |b| {
        b.iter(|| black_box(search::find_matches(black_box(&source), "return", options)))
    });
}

fn bench_replace_all(c: &mut Criterion) {
    let source = sample_source(1000);
    let options = SearchOptions {
        case_sensitive: true,
        mode: MatchMode::Contains,
    };

    c.bench_function("replace_all_1000_lines", |b| {
        b.iter(|| black_box(search::replace_all_text(black_box(&source), "return", "yield", options)))
    });
}

criterion_group!(benches, bench_tokenize, bench_search, bench_replace_all);
criterion_main!(benches);
